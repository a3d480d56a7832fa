//! # Observability
//!
//! Prometheus metrics. Logging is plain `tracing`, configured in
//! [`crate::runtime::initialization`].

pub mod metrics;
