//! # Eviction Candidate Selection
//!
//! Pure predicates deciding whether a pod may be considered for eviction. Whether it is
//! actually idle is decided from its log by [`is_idle_log`].
//!
//! The log heuristic is racy: an agent can print its idle line and pick up a job a moment
//! later. Eviction deregisters the agent first, which narrows but does not close that window.

use crate::controller::inventory::{is_running, node_of};
use crate::crd::SafeEvictSpec;
use k8s_openapi::api::core::v1::Pod;
use std::collections::{BTreeMap, BTreeSet};

/// Whether the pod carries every label in `selector`
///
/// An empty selector never marks a pod done.
pub fn satisfies_done_labels(pod: &Pod, selector: &BTreeMap<String, String>) -> bool {
    if selector.is_empty() {
        return false;
    }
    let labels = pod.metadata.labels.as_ref();
    selector
        .iter()
        .all(|(key, value)| labels.and_then(|l| l.get(key)) == Some(value))
}

/// A pod whose log is worth fetching
pub fn is_candidate(pod: &Pod, spec: &SafeEvictSpec) -> bool {
    let in_scope = pod
        .metadata
        .namespace
        .as_deref()
        .is_some_and(|ns| spec.monitors_namespace(ns));
    in_scope && !satisfies_done_labels(pod, &spec.label_selector) && is_running(pod)
}

/// Whether the log ends with one of the idle sentinels
pub fn is_idle_log(log: &str, sentinels: &[String]) -> bool {
    let tail = log.trim_end();
    sentinels
        .iter()
        .filter(|sentinel| !sentinel.is_empty())
        .any(|sentinel| tail.ends_with(sentinel.trim_end()))
}

/// Pods scheduled on one of `nodes`
pub fn restrict_to_nodes(pods: &[Pod], nodes: &BTreeSet<String>) -> Vec<Pod> {
    pods.iter()
        .filter(|pod| node_of(pod).is_some_and(|node| nodes.contains(node)))
        .cloned()
        .collect()
}
