//! Request entry point: "send an elevator to floor F".

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use liftwell_model::{BuildingID, ElevatorID};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{LiftError, Result};
use crate::registry::ElevatorRegistry;
use crate::selection::SelectionPipeline;

/// Acknowledgement of an accepted floor request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub elevator_id: ElevatorID,
    pub elevator_number: i32,
    pub floor: i32,
    /// 1-based position of the floor in the elevator's queue.
    pub queue_position: usize,
    pub requested_at: DateTime<Utc>,
    pub message: String,
}

/// Bridges floor requests to registry state changes.
///
/// A lost compare-and-swap is returned as [`LiftError::Conflict`] and never
/// retried here: retrying would re-run selection on data that is already
/// known to be stale.
pub struct DispatchOrchestrator {
    registry: Arc<ElevatorRegistry>,
    pipeline: SelectionPipeline,
}

impl fmt::Debug for DispatchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOrchestrator")
            .field("pipeline", &self.pipeline.stages())
            .finish()
    }
}

impl DispatchOrchestrator {
    pub fn new(registry: Arc<ElevatorRegistry>) -> Self {
        Self::with_pipeline(registry, SelectionPipeline::standard())
    }

    pub fn with_pipeline(registry: Arc<ElevatorRegistry>, pipeline: SelectionPipeline) -> Self {
        Self { registry, pipeline }
    }

    pub fn registry(&self) -> &Arc<ElevatorRegistry> {
        &self.registry
    }

    pub async fn request_elevator(
        &self,
        building_id: BuildingID,
        floor: i32,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        info!("Elevator requested to floor {} in building {}", floor, building_id);
        self.validate_floor(building_id, floor, cancel).await?;

        let elevators = self.registry.get_all_by_building(building_id, cancel).await?;

        let mut chosen = self.pipeline.select(&elevators, floor).map_err(|cause| {
            warn!(
                "No elevator available for floor {} in building {}: {}",
                floor, building_id, cause
            );
            LiftError::NoElevatorsAvailable {
                building_id,
                floor,
                cause,
            }
        })?;

        chosen.destination_queue.push_back(floor);
        let queue_position = chosen.destination_queue.len();
        let elevator_id = chosen.id;
        let elevator_number = chosen.number;

        self.registry.update(chosen).await?;

        info!(
            "Elevator {} (#{}) assigned to floor {}, queue position {}",
            elevator_id, elevator_number, floor, queue_position
        );
        Ok(DispatchOutcome {
            elevator_id,
            elevator_number,
            floor,
            queue_position,
            requested_at: Utc::now(),
            message: format!("Elevator {elevator_number} ({elevator_id}) is on its way to floor {floor}"),
        })
    }

    /// Issue one request per floor, in order. Each floor gets its own
    /// result; a failure does not stop the remaining floors.
    pub async fn request_elevators(
        &self,
        building_id: BuildingID,
        floors: &[i32],
        cancel: &CancellationToken,
    ) -> Vec<(i32, Result<DispatchOutcome>)> {
        let mut results = Vec::with_capacity(floors.len());
        for &floor in floors {
            if cancel.is_cancelled() {
                results.push((floor, Err(LiftError::Cancelled(format!("request for floor {floor}")))));
                continue;
            }
            let result = self.request_elevator(building_id, floor, cancel).await;
            results.push((floor, result));
        }
        results
    }

    async fn validate_floor(
        &self,
        building_id: BuildingID,
        floor: i32,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if floor < 1 {
            return Err(LiftError::Validation(format!(
                "Floor must be greater than 0, got {floor}"
            )));
        }
        let building = self.registry.building(building_id, cancel).await?;
        if !building.contains_floor(floor) {
            return Err(LiftError::Validation(format!(
                "Floor {floor} is outside {} (floors 1 to {})",
                building.name, building.number_of_floors
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::error::ErrorKind;
    use crate::selection::SelectionError;
    use crate::store::InMemoryElevatorStore;
    use liftwell_model::{Building, ElevatorRecord, ElevatorStatus};

    fn orchestrator(elevators: Vec<ElevatorRecord>, building: &Building) -> DispatchOrchestrator {
        let store = Arc::new(InMemoryElevatorStore::with_data([building.clone()], elevators));
        let registry = Arc::new(ElevatorRegistry::new(store, RegistryConfig::default()));
        DispatchOrchestrator::new(registry)
    }

    #[tokio::test]
    async fn request_appends_floor_to_chosen_queue() {
        let building = Building::new("Tower", 10);
        let mut near = ElevatorRecord::new(building.id, 1);
        near.current_floor = 6;
        let far = ElevatorRecord::new(building.id, 2);
        let orchestrator = orchestrator(vec![near.clone(), far], &building);
        let cancel = CancellationToken::new();

        let outcome = orchestrator.request_elevator(building.id, 7, &cancel).await.unwrap();
        assert_eq!(outcome.elevator_id, near.id);
        assert_eq!(outcome.queue_position, 1);

        let stored = orchestrator.registry().get_by_id(near.id, &cancel).await.unwrap();
        assert_eq!(stored.destination_queue, [7]);
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn floors_outside_the_building_are_rejected() {
        let building = Building::new("Tower", 10);
        let orchestrator = orchestrator(vec![ElevatorRecord::new(building.id, 1)], &building);
        let cancel = CancellationToken::new();

        for floor in [0, -2, 11] {
            let err = orchestrator.request_elevator(building.id, floor, &cancel).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "floor {floor}");
        }

        let err = orchestrator
            .request_elevator(BuildingID::new(), 3, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn exhausted_selection_wraps_the_cause() {
        let building = Building::new("Tower", 10);
        let mut broken = ElevatorRecord::new(building.id, 1);
        broken.status = ElevatorStatus::OutOfService;
        let orchestrator = orchestrator(vec![broken], &building);

        let err = orchestrator
            .request_elevator(building.id, 4, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LiftError::NoElevatorsAvailable {
                floor: 4,
                cause: SelectionError::NoneInService,
                ..
            }
        ));
        assert_eq!(err.user_message(), "No elevator available, please try again");
    }

    #[tokio::test]
    async fn multi_floor_requests_are_answered_per_floor() {
        let building = Building::new("Tower", 10);
        let mut car = ElevatorRecord::new(building.id, 1);
        car.queue_capacity = 2;
        let orchestrator = orchestrator(vec![car], &building);

        let results = orchestrator
            .request_elevators(building.id, &[3, 12, 5, 8], &CancellationToken::new())
            .await;

        let floors: Vec<i32> = results.iter().map(|(floor, _)| *floor).collect();
        assert_eq!(floors, vec![3, 12, 5, 8]);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].1.as_ref().unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(results[2].1.as_ref().unwrap().queue_position, 2);
        assert_eq!(
            results[3].1.as_ref().unwrap_err().kind(),
            ErrorKind::NoElevatorsAvailable
        );
    }
}
