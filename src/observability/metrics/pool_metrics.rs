//! # Pool Metrics
//!
//! Counters for the changes the controller makes to pools and agent pods.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec};
use std::sync::LazyLock;

static SURGE_POOL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "node_image_updater_surge_pool_operations_total",
            "Surge pool create and delete requests submitted",
        ),
        &["operation"],
    )
    .expect("Failed to create SURGE_POOL_OPERATIONS_TOTAL metric - this should never happen")
});

static NODE_IMAGE_UPGRADES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "node_image_updater_node_image_upgrades_total",
        "Node image upgrades triggered",
    )
    .expect("Failed to create NODE_IMAGE_UPGRADES_TOTAL metric - this should never happen")
});

static POOL_RESTORES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "node_image_updater_pool_restores_total",
        "Pools whose recorded scaling settings were re-applied",
    )
    .expect("Failed to create POOL_RESTORES_TOTAL metric - this should never happen")
});

static PODS_EVICTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "node_image_updater_pods_evicted_total",
        "Idle agent pods deregistered and deleted",
    )
    .expect("Failed to create PODS_EVICTED_TOTAL metric - this should never happen")
});

pub(crate) fn register_pool_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SURGE_POOL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NODE_IMAGE_UPGRADES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(POOL_RESTORES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PODS_EVICTED_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_surge_operations(operation: &str) {
    SURGE_POOL_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_node_image_upgrades() {
    NODE_IMAGE_UPGRADES_TOTAL.inc();
}

pub fn increment_pool_restores() {
    POOL_RESTORES_TOTAL.inc();
}

pub fn increment_pods_evicted() {
    PODS_EVICTED_TOTAL.inc();
}
