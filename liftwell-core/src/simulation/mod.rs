//! Tick-driven elevator movement.
//!
//! One loop per building fetches the building's elevators, advances each
//! of them by a tick and writes back only the cars whose state changed.
//! A failed fetch backs the loop off; a failed write only affects that car.
//! Cancellation is checked between writes, so every car's update is either
//! issued whole or not at all.

use std::fmt;
use std::sync::Arc;

use liftwell_model::{BuildingID, ElevatorStatus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, TokioClock};
use crate::config::SimulationConfig;
use crate::error::{LiftError, Result};
use crate::registry::ElevatorRegistry;

mod step;

pub use step::advance;

/// Counters for one tick of one building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub examined: usize,
    pub skipped_inactive: usize,
    pub changed: usize,
    pub updated: usize,
    pub conflicts: usize,
    pub failed: usize,
}

pub struct SimulationEngine {
    registry: Arc<ElevatorRegistry>,
    clock: Arc<dyn Clock>,
    config: SimulationConfig,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish()
    }
}

impl SimulationEngine {
    pub fn new(registry: Arc<ElevatorRegistry>, config: SimulationConfig) -> Self {
        Self::with_clock(registry, config, Arc::new(TokioClock))
    }

    pub fn with_clock(
        registry: Arc<ElevatorRegistry>,
        config: SimulationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run exactly one tick for a building.
    pub async fn tick(
        &self,
        building_id: BuildingID,
        cancel: &CancellationToken,
    ) -> Result<TickReport> {
        let elevators = self.registry.get_all_by_building(building_id, cancel).await?;
        let mut report = TickReport {
            examined: elevators.len(),
            ..TickReport::default()
        };

        for mut elevator in elevators {
            if elevator.status != ElevatorStatus::Active {
                report.skipped_inactive += 1;
                continue;
            }
            if !advance(&mut elevator) {
                continue;
            }
            report.changed += 1;

            if cancel.is_cancelled() {
                debug!(
                    "Tick for building {} cancelled with {} updates issued",
                    building_id, report.updated
                );
                break;
            }

            debug!(
                "Elevator #{} now at floor {} heading {} (destination {}, door {})",
                elevator.number,
                elevator.current_floor,
                elevator.direction,
                elevator.destination_floor,
                elevator.door_status
            );
            let elevator_id = elevator.id;
            match self.registry.update(elevator).await {
                Ok(()) => report.updated += 1,
                Err(LiftError::Conflict(_)) => {
                    debug!(
                        "Elevator {} changed during tick, picking it up next tick",
                        elevator_id
                    );
                    report.conflicts += 1;
                }
                Err(e) => {
                    warn!("Failed to update elevator {}: {}", elevator_id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Tick a building until `cancel` fires. Returns the number of ticks
    /// that completed.
    pub async fn run(&self, building_id: BuildingID, cancel: CancellationToken) -> u64 {
        info!("Simulation started for building {}", building_id);
        let mut ticks = 0u64;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let wait = match self.tick(building_id, &cancel).await {
                Ok(report) => {
                    ticks += 1;
                    debug!("Tick {} for building {}: {:?}", ticks, building_id, report);
                    self.config.tick_interval
                }
                Err(LiftError::Cancelled(_)) => break,
                Err(e) => {
                    warn!(
                        "Tick for building {} failed, backing off for {:?}: {}",
                        building_id, self.config.failure_backoff, e
                    );
                    self.config.failure_backoff
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.clock.sleep(wait) => {}
            }
        }

        info!(
            "Simulation stopped for building {} after {} ticks",
            building_id, ticks
        );
        ticks
    }

    /// Start one independent loop per building.
    pub fn spawn(
        self: &Arc<Self>,
        buildings: impl IntoIterator<Item = BuildingID>,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<u64>> {
        buildings
            .into_iter()
            .map(|building_id| {
                let engine = Arc::clone(self);
                let cancel = cancel.child_token();
                tokio::spawn(async move { engine.run(building_id, cancel).await })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::store::InMemoryElevatorStore;
    use liftwell_model::{Building, Direction, DoorStatus, ElevatorRecord};

    async fn engine_for(elevators: Vec<ElevatorRecord>) -> (SimulationEngine, Arc<ElevatorRegistry>) {
        let registry = Arc::new(ElevatorRegistry::new(
            Arc::new(InMemoryElevatorStore::new()),
            RegistryConfig::default(),
        ));
        registry.seed(elevators).await.unwrap();
        let engine = SimulationEngine::new(Arc::clone(&registry), SimulationConfig::default());
        (engine, registry)
    }

    #[tokio::test]
    async fn tick_writes_back_only_changed_cars() {
        let building = Building::new("Tower", 10);
        let idle = ElevatorRecord::new(building.id, 1);
        let mut called = ElevatorRecord::new(building.id, 2);
        called.destination_queue.push_back(5);
        let mut parked = ElevatorRecord::new(building.id, 3);
        parked.status = ElevatorStatus::Maintenance;
        parked.destination_queue.push_back(5);

        let (engine, registry) = engine_for(vec![idle.clone(), called.clone(), parked]).await;
        let cancel = CancellationToken::new();

        let report = engine.tick(building.id, &cancel).await.unwrap();
        assert_eq!(
            report,
            TickReport {
                examined: 3,
                skipped_inactive: 1,
                changed: 1,
                updated: 1,
                conflicts: 0,
                failed: 0,
            }
        );

        let idle_after = registry.get_by_id(idle.id, &cancel).await.unwrap();
        assert_eq!(idle_after.revision, idle.revision);
        let called_after = registry.get_by_id(called.id, &cancel).await.unwrap();
        assert_eq!(called_after.direction, Direction::Up);
        assert_eq!(called_after.destination_floor, 5);
    }

    #[tokio::test]
    async fn rejected_write_does_not_stop_the_rest_of_the_tick() {
        let building = Building::new("Tower", 10);
        // Heading for a floor below the ground floor; its write is rejected.
        let mut broken = ElevatorRecord::new(building.id, 1);
        broken.current_floor = 2;
        broken.direction = Direction::Down;
        broken.door_status = DoorStatus::Closed;
        broken.floors_per_second = 3;
        let mut called = ElevatorRecord::new(building.id, 2);
        called.destination_queue.push_back(5);
        let mut moving = ElevatorRecord::new(building.id, 3);
        moving.current_floor = 3;
        moving.destination_floor = 6;
        moving.direction = Direction::Up;
        moving.door_status = DoorStatus::Closed;

        let (engine, registry) =
            engine_for(vec![broken.clone(), called.clone(), moving.clone()]).await;
        let cancel = CancellationToken::new();

        let report = engine.tick(building.id, &cancel).await.unwrap();
        assert_eq!(
            report,
            TickReport {
                examined: 3,
                skipped_inactive: 0,
                changed: 3,
                updated: 2,
                conflicts: 0,
                failed: 1,
            }
        );

        let broken_after = registry.get_by_id(broken.id, &cancel).await.unwrap();
        assert_eq!(broken_after, broken);
        let called_after = registry.get_by_id(called.id, &cancel).await.unwrap();
        assert_eq!(called_after.destination_floor, 5);
        let moving_after = registry.get_by_id(moving.id, &cancel).await.unwrap();
        assert_eq!(moving_after.current_floor, 4);
    }

    #[tokio::test]
    async fn cancelled_tick_issues_no_updates() {
        let building = Building::new("Tower", 10);
        let mut called = ElevatorRecord::new(building.id, 1);
        called.destination_queue.push_back(5);
        let (engine, registry) = engine_for(vec![called.clone()]).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = engine.tick(building.id, &cancel).await.unwrap();
        assert_eq!(report.changed, 1);
        assert_eq!(report.updated, 0);
        let after = registry.get_by_id(called.id, &cancel).await.unwrap();
        assert_eq!(after, called);
    }
}
