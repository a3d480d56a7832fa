//! # Node Image Updater
//!
//! A Kubernetes operator that keeps AKS node pools on the latest node image without
//! interrupting running build agents.
//!
//! ## Overview
//!
//! Each `SafeEvict` resource describes one upgrade campaign:
//!
//! 1. **Detect staleness** - compares node image labels against each pool's upgrade profile
//! 2. **Provision surge capacity** - clones a base pool into a temporary pool
//! 3. **Persist scaling state** - records each pool's autoscaling settings before touching it
//! 4. **Drain safely** - cordons stale pools and evicts only agents whose logs prove they are idle
//! 5. **Upgrade and restore** - triggers the image upgrade, then restores scaling and uncordons
//! 6. **Tear down** - drains and deletes the temporary pool once nothing is stale
//!
//! Every reconcile re-derives the campaign's position from the cluster and the cloud
//! control plane; the only persisted state is the scaling-state ConfigMap.

pub mod cluster;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod provider;
pub mod runtime;

pub use crd::*;
pub use error::{Error, ErrorKind, Result};
