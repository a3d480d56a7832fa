//! # Reconcile Pacing
//!
//! The requeue delay is the only pacing mechanism the controller has, so the three
//! intervals are tunable.

use super::env_var_or_default;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Delay before retrying a failed reconcile
    pub error_requeue_secs: u64,
    /// Delay while surge capacity, drains or upgrades are in flight
    pub progress_requeue_secs: u64,
    /// Delay once every pool is current and no surge pool exists
    pub steady_state_requeue_secs: u64,
    /// Upper bound on one reconcile invocation
    pub reconcile_timeout_secs: u64,
    /// Restrict the watch to one namespace (all namespaces when unset)
    pub watch_namespace: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
            progress_requeue_secs: DEFAULT_PROGRESS_REQUEUE_SECS,
            steady_state_requeue_secs: DEFAULT_STEADY_STATE_REQUEUE_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            watch_namespace: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            error_requeue_secs: env_var_or_default(
                "ERROR_REQUEUE_SECS",
                DEFAULT_ERROR_REQUEUE_SECS,
            ),
            progress_requeue_secs: env_var_or_default(
                "PROGRESS_REQUEUE_SECS",
                DEFAULT_PROGRESS_REQUEUE_SECS,
            ),
            steady_state_requeue_secs: env_var_or_default(
                "STEADY_STATE_REQUEUE_SECS",
                DEFAULT_STEADY_STATE_REQUEUE_SECS,
            ),
            reconcile_timeout_secs: env_var_or_default(
                "RECONCILE_TIMEOUT_SECS",
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            ),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty()),
        }
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn progress_requeue(&self) -> Duration {
        Duration::from_secs(self.progress_requeue_secs)
    }

    pub fn steady_state_requeue(&self) -> Duration {
        Duration::from_secs(self.steady_state_requeue_secs)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }
}
