//! # Planning
//!
//! Decides the next step of a campaign from a [`WorldState`] alone. No I/O happens here.
//!
//! ```text
//! no surge pool, nothing outdated  -> Steady (clear scaling record)
//! no surge pool, something outdated -> CreateSurge
//! surge pool Creating / Deleting    -> AwaitSurge
//! otherwise                         -> Converge:
//!     record scaling (if not yet recorded)
//!     drain every outdated pool
//!     upgrade stale pools with no guarded pods left
//!     restore recorded pools that are no longer outdated
//!     nothing outdated: drain the surge pool, remove it once clear
//! ```

use super::world::WorldState;
use crate::controller::scaling_state::{self, ScalingConfig, ScalingSnapshot};
use crate::error::Result;
use crate::provider::ProvisioningState;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Every pool is current and no surge pool exists
    Steady,
    CreateSurge,
    /// The surge pool is mid-provisioning or mid-deletion
    AwaitSurge(ProvisioningState),
    Converge(Vec<PlannedAction>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    /// Persist pre-upgrade scaling settings unless already recorded
    RecordScaling(ScalingSnapshot),
    /// Freeze, cordon and evict idle agents from an outdated pool
    Drain(String),
    UpgradeNodeImage(String),
    /// Put recorded scaling settings back and uncordon
    Restore { pool: String, config: ScalingConfig },
    /// Freeze, cordon and evict idle agents from the surge pool
    DrainSurge,
    /// Delete the surge pool and the scaling record
    RemoveSurge,
}

/// Decide what to do next
///
/// # Errors
///
/// Fails when an outdated pool's scaling settings cannot be captured.
pub fn plan(world: &WorldState) -> Result<Step> {
    let Some(surge_state) = &world.surge else {
        return Ok(if world.outdated.is_empty() {
            Step::Steady
        } else {
            Step::CreateSurge
        });
    };

    if matches!(
        surge_state,
        ProvisioningState::Creating | ProvisioningState::Deleting
    ) {
        return Ok(Step::AwaitSurge(surge_state.clone()));
    }

    let mut actions = Vec::new();

    if world.scaling_record.is_none() && !world.outdated.pools.is_empty() {
        actions.push(PlannedAction::RecordScaling(scaling_state::capture(
            &world.outdated.pools,
        )?));
    }

    actions.extend(
        world
            .outdated
            .pools
            .keys()
            .map(|pool| PlannedAction::Drain(pool.clone())),
    );

    actions.extend(
        world
            .stale_pools
            .iter()
            .filter(|pool| world.is_clear(pool) && world.state_of(pool).accepts_operations())
            .map(|pool| PlannedAction::UpgradeNodeImage(pool.clone())),
    );

    if let Some(record) = &world.scaling_record {
        actions.extend(
            record
                .iter()
                .filter(|(pool, _)| !world.outdated.pools.contains_key(*pool))
                .map(|(pool, config)| PlannedAction::Restore {
                    pool: pool.clone(),
                    config: *config,
                }),
        );
    }

    if world.outdated.is_empty() {
        actions.push(PlannedAction::DrainSurge);
        if world.is_clear(&world.surge_pool) {
            actions.push(PlannedAction::RemoveSurge);
        }
    }

    Ok(Step::Converge(actions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AgentPool;
    use std::collections::{BTreeMap, BTreeSet};

    const SURGE: &str = "tmppoolb";

    fn pool(state: &str, min: i32, max: i32) -> AgentPool {
        let mut pool = AgentPool::default();
        pool.properties.provisioning_state = Some(state.to_string());
        pool.properties.min_count = Some(min);
        pool.properties.max_count = Some(max);
        pool.properties.count = Some(min);
        pool.properties.enable_auto_scaling = Some(true);
        pool
    }

    fn world() -> WorldState {
        WorldState {
            surge_pool: SURGE.to_string(),
            ..Default::default()
        }
    }

    /// poola is on v1 while v2 is available
    fn stale_world(surge: Option<ProvisioningState>) -> WorldState {
        let mut world = world();
        world
            .outdated
            .pools
            .insert("poola".to_string(), pool("Succeeded", 2, 5));
        world.outdated.nodes = BTreeSet::from(["aks-poola-1".to_string()]);
        world.stale_pools.insert("poola".to_string());
        world
            .pool_states
            .insert("poola".to_string(), ProvisioningState::Succeeded);
        world.surge = surge;
        world
    }

    #[test]
    fn test_quiescent_world_is_steady() {
        assert_eq!(plan(&world()).unwrap(), Step::Steady);
    }

    #[test]
    fn test_outdated_without_surge_creates_surge() {
        assert_eq!(plan(&stale_world(None)).unwrap(), Step::CreateSurge);
    }

    #[test]
    fn test_busy_pool_without_surge_creates_surge() {
        let mut world = world();
        world
            .outdated
            .pools
            .insert("poola".to_string(), pool("Updating", 1, 3));
        assert_eq!(plan(&world).unwrap(), Step::CreateSurge);
    }

    #[test]
    fn test_waits_for_surge_provisioning() {
        let world = stale_world(Some(ProvisioningState::Creating));
        assert_eq!(
            plan(&world).unwrap(),
            Step::AwaitSurge(ProvisioningState::Creating)
        );
    }

    #[test]
    fn test_waits_for_surge_deletion() {
        let mut world = world();
        world.surge = Some(ProvisioningState::Deleting);
        assert_eq!(
            plan(&world).unwrap(),
            Step::AwaitSurge(ProvisioningState::Deleting)
        );
    }

    #[test]
    fn test_first_converge_records_and_drains() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world.guarded_pods.insert("poola".to_string(), 2);

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert_eq!(
            actions,
            vec![
                PlannedAction::RecordScaling(BTreeMap::from([(
                    "poola".to_string(),
                    ScalingConfig::Autoscaled {
                        min_count: 2,
                        max_count: 5
                    }
                )])),
                PlannedAction::Drain("poola".to_string()),
            ]
        );
    }

    #[test]
    fn test_existing_record_is_not_rewritten() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world.scaling_record = Some(BTreeMap::from([(
            "poola".to_string(),
            ScalingConfig::Fixed { count: 3 },
        )]));

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert!(!actions
            .iter()
            .any(|a| matches!(a, PlannedAction::RecordScaling(_))));
        // poola is still outdated, so it must not be restored yet
        assert!(!actions
            .iter()
            .any(|a| matches!(a, PlannedAction::Restore { .. })));
    }

    #[test]
    fn test_upgrade_once_guarded_pods_are_gone() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world.guarded_pods.insert("poola".to_string(), 0);

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert_eq!(
            actions.last(),
            Some(&PlannedAction::UpgradeNodeImage("poola".to_string()))
        );
    }

    #[test]
    fn test_no_upgrade_while_pool_is_busy() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world.guarded_pods.insert("poola".to_string(), 0);
        world.pool_states.insert(
            "poola".to_string(),
            ProvisioningState::UpgradingNodeImageVersion,
        );

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert!(actions.contains(&PlannedAction::Drain("poola".to_string())));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, PlannedAction::UpgradeNodeImage(_))));
    }

    #[test]
    fn test_no_upgrade_for_busy_but_current_pool() {
        let mut world = world();
        world.surge = Some(ProvisioningState::Succeeded);
        world
            .outdated
            .pools
            .insert("poolc".to_string(), pool("Updating", 1, 2));
        world
            .pool_states
            .insert("poolc".to_string(), ProvisioningState::Updating);
        world.guarded_pods.insert("poolc".to_string(), 0);
        world.scaling_record = Some(BTreeMap::new());

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert_eq!(actions, vec![PlannedAction::Drain("poolc".to_string())]);
    }

    #[test]
    fn test_upgraded_pool_is_restored_and_surge_drained() {
        let mut world = world();
        world.surge = Some(ProvisioningState::Succeeded);
        world.guarded_pods.insert(SURGE.to_string(), 1);
        world.scaling_record = Some(BTreeMap::from([(
            "poola".to_string(),
            ScalingConfig::Autoscaled {
                min_count: 2,
                max_count: 5,
            },
        )]));

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert_eq!(
            actions,
            vec![
                PlannedAction::Restore {
                    pool: "poola".to_string(),
                    config: ScalingConfig::Autoscaled {
                        min_count: 2,
                        max_count: 5
                    }
                },
                PlannedAction::DrainSurge,
            ]
        );
    }

    #[test]
    fn test_clear_surge_is_removed() {
        let mut world = world();
        world.surge = Some(ProvisioningState::Succeeded);
        world.guarded_pods.insert(SURGE.to_string(), 0);

        assert_eq!(
            plan(&world).unwrap(),
            Step::Converge(vec![PlannedAction::DrainSurge, PlannedAction::RemoveSurge])
        );
    }

    #[test]
    fn test_surge_is_kept_while_any_pool_is_outdated() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world.guarded_pods.insert(SURGE.to_string(), 0);
        world.guarded_pods.insert("poola".to_string(), 3);

        let Step::Converge(actions) = plan(&world).unwrap() else {
            panic!("expected converge");
        };
        assert!(!actions.contains(&PlannedAction::DrainSurge));
        assert!(!actions.contains(&PlannedAction::RemoveSurge));
    }

    #[test]
    fn test_uncapturable_pool_fails_the_plan() {
        let mut world = stale_world(Some(ProvisioningState::Succeeded));
        world
            .outdated
            .pools
            .insert("poola".to_string(), AgentPool::default());
        assert!(plan(&world).is_err());
    }
}
