//! # SafeEvict Status
//!
//! The status subresource is registered so `kubectl` and RBAC treat it normally, but the
//! controller reports progress through logs and metrics rather than writing it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SafeEvictStatus {
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
