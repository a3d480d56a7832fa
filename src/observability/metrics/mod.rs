//! # Metrics Module
//!
//! Prometheus metrics for monitoring the controller, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup and registration
//! - `controller_metrics` - Reconciliations, errors, durations and requeues
//! - `pool_metrics` - Surge pool operations, upgrades, restores and evictions

pub mod controller_metrics;
pub mod pool_metrics;
pub mod registry;

pub use controller_metrics::*;
pub use pool_metrics::*;
pub use registry::*;
