//! # Validation
//!
//! Campaign spec checks run at the start of every reconcile.

use crate::crd::SafeEvictSpec;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// AKS agent pool names: lowercase alphanumeric, starting with a letter, at most 12 characters
static POOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]{0,11}$").expect("pool name pattern is valid"));

pub fn is_valid_pool_name(name: &str) -> bool {
    POOL_NAME.is_match(name)
}

/// # Errors
///
/// Returns a validation error describing the first problem found.
pub fn validate(spec: &SafeEvictSpec) -> Result<()> {
    let base = &spec.base_for_backup_pool_name;
    if base.is_empty() {
        return Err(Error::Validation(
            "baseForBackupPoolName must be set".to_string(),
        ));
    }
    if !is_valid_pool_name(base) {
        return Err(Error::Validation(format!(
            "baseForBackupPoolName '{base}' is not a valid agent pool name"
        )));
    }

    if let Some(invalid) = spec.nodepools.iter().find(|p| !is_valid_pool_name(p)) {
        return Err(Error::Validation(format!(
            "nodepools entry '{invalid}' is not a valid agent pool name"
        )));
    }

    let surge = spec.surge_pool_name();
    if spec.nodepools.contains(&surge) {
        return Err(Error::Validation(format!(
            "nodepools must not include the surge pool '{surge}'"
        )));
    }

    if spec.last_log_lines.is_empty() {
        return Err(Error::Validation(
            "lastLogLines must contain at least one entry".to_string(),
        ));
    }
    if spec.last_log_lines.iter().any(|line| line.trim().is_empty()) {
        return Err(Error::Validation(
            "lastLogLines must not contain empty entries".to_string(),
        ));
    }

    Ok(())
}
