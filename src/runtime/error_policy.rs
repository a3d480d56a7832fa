//! # Error Policy
//!
//! Every failed reconcile is retried after the configured error delay. Partial progress is
//! kept; the next pass re-derives what is left to do.

use crate::controller::reconciler::Reconciler;
use crate::crd::SafeEvict;
use crate::error::Error;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

pub fn handle_reconciliation_error(
    obj: Arc<SafeEvict>,
    error: &Error,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.campaign_namespace();
    let kind = error.kind();

    if error.is_retryable() {
        warn!(
            resource.name = %name,
            resource.namespace = %namespace,
            error = %error,
            "reconciliation.conflict"
        );
    } else {
        error!(
            resource.name = %name,
            resource.namespace = %namespace,
            error.kind = kind.as_str(),
            error = %error,
            "reconciliation.error"
        );
    }
    observability::metrics::increment_reconciliation_errors(kind.as_str());

    let delay = ctx.config.error_requeue();
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::seconds(10));
    info!(
        "📅 Next retry scheduled: {} (in {}s, trigger source: error)",
        next_trigger_time.to_rfc3339(),
        delay.as_secs()
    );

    observability::metrics::increment_requeues_total("error");
    Action::requeue(delay)
}
