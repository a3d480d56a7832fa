//! # Reconciler
//!
//! One reconcile pass is split three ways:
//!
//! - `world` - read the cluster and the management plane into a [`WorldState`]
//! - `plan` - decide the next [`Step`] from a `WorldState` alone
//! - `execute` - carry the step out
//!
//! Nothing about a campaign's progress is stored besides the scaling-state record; every pass
//! re-derives where the campaign is from what it observes.

mod execute;
mod plan;
mod reconcile;
mod types;
mod world;

pub use execute::{execute, Outcome};
pub use plan::{plan, PlannedAction, Step};
pub use reconcile::reconcile;
pub use types::Reconciler;
pub use world::{observe, WorldState};
