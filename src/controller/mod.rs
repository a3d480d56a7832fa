//! # Controller Module
//!
//! The reconciliation engine and the subsystems it composes.
//!
//! ## Sub-modules
//!
//! - `inventory` - Nodes grouped by agent pool, guarded pod counting
//! - `staleness` - Which pools run an outdated node image or are busy
//! - `surge` - Temporary pool lifecycle
//! - `scaling_state` - Pre-upgrade scaling settings, persisted and restored
//! - `eviction` - Idle agent selection and the drain sequence
//! - `validation` - Campaign spec checks
//! - `reconciler` - Observe, plan and execute one reconcile pass
//! - `server` - Metrics and health probes

pub mod eviction;
pub mod inventory;
pub mod reconciler;
pub mod scaling_state;
pub mod server;
pub mod staleness;
pub mod surge;
pub mod validation;
