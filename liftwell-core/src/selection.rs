//! Two-stage elevator selection.
//!
//! Proximity is applied first and queue capacity second, each stage
//! narrowing and reordering the output of the previous one. Both sorts are
//! stable so ties keep the order they arrived in.

use liftwell_model::ElevatorRecord;
use thiserror::Error;

/// Why a selection run came up empty. Every variant surfaces to callers as
/// a "no elevator available" outcome; the distinction is kept for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("building has no elevators")]
    NoCandidates,

    #[error("no elevator is in service")]
    NoneInService,

    #[error("every in-service elevator has a full destination queue")]
    AllQueuesFull,
}

/// A single filter-and-order step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    /// Drops cars under maintenance or out of service and orders the rest
    /// by distance to the requested floor.
    ClosestFloor,
    /// Drops cars whose queue is full and orders the rest by queue length.
    QueueCapacity,
}

impl SelectionStage {
    fn apply(
        self,
        mut candidates: Vec<ElevatorRecord>,
        requested_floor: i32,
    ) -> Result<Vec<ElevatorRecord>, SelectionError> {
        match self {
            SelectionStage::ClosestFloor => {
                if candidates.is_empty() {
                    return Err(SelectionError::NoCandidates);
                }
                candidates.retain(ElevatorRecord::is_dispatchable);
                if candidates.is_empty() {
                    return Err(SelectionError::NoneInService);
                }
                candidates.sort_by_key(|e| (e.current_floor - requested_floor).abs());
                Ok(candidates)
            }
            SelectionStage::QueueCapacity => {
                candidates.retain(ElevatorRecord::has_queue_room);
                if candidates.is_empty() {
                    return Err(SelectionError::AllQueuesFull);
                }
                candidates.sort_by_key(|e| e.destination_queue.len());
                Ok(candidates)
            }
        }
    }
}

/// Ordered list of selection stages. The first survivor of the last stage
/// wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPipeline {
    stages: Vec<SelectionStage>,
}

impl Default for SelectionPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl SelectionPipeline {
    /// Closest floor, then queue capacity.
    pub fn standard() -> Self {
        Self {
            stages: vec![SelectionStage::ClosestFloor, SelectionStage::QueueCapacity],
        }
    }

    pub fn stages(&self) -> &[SelectionStage] {
        &self.stages
    }

    /// Pick one elevator for `requested_floor`. The floor must already be
    /// within the building. `elevators` is left untouched.
    pub fn select(
        &self,
        elevators: &[ElevatorRecord],
        requested_floor: i32,
    ) -> Result<ElevatorRecord, SelectionError> {
        let mut candidates = elevators.to_vec();
        for stage in &self.stages {
            candidates = stage.apply(candidates, requested_floor)?;
        }
        candidates
            .into_iter()
            .next()
            .ok_or(SelectionError::NoCandidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftwell_model::{BuildingID, ElevatorStatus};

    fn car(building_id: BuildingID, number: i32, floor: i32, queued: usize, capacity: usize) -> ElevatorRecord {
        let mut record = ElevatorRecord::new(building_id, number);
        record.current_floor = floor;
        record.queue_capacity = capacity;
        record.destination_queue.extend(std::iter::repeat_n(9, queued));
        record
    }

    #[test]
    fn idle_car_on_requested_floor_is_chosen() {
        let building = BuildingID::new();
        let here = car(building, 1, 3, 0, 10);
        let far = car(building, 2, 8, 0, 10);

        let chosen = SelectionPipeline::standard()
            .select(&[far, here.clone()], 3)
            .unwrap();
        assert_eq!(chosen.id, here.id);
    }

    #[test]
    fn closer_car_with_room_is_chosen() {
        let building = BuildingID::new();
        let a = car(building, 1, 1, 2, 3);
        let b = car(building, 2, 5, 0, 3);

        let chosen = SelectionPipeline::standard()
            .select(&[a, b.clone()], 4)
            .unwrap();
        assert_eq!(chosen.id, b.id);
    }

    #[test]
    fn queue_length_reorders_after_distance() {
        let building = BuildingID::new();
        let near_busy = car(building, 1, 4, 3, 10);
        let far_idle = car(building, 2, 9, 0, 10);

        let chosen = SelectionPipeline::standard()
            .select(&[near_busy, far_idle.clone()], 4)
            .unwrap();
        assert_eq!(chosen.id, far_idle.id);
    }

    #[test]
    fn ties_keep_input_order() {
        let building = BuildingID::new();
        let first = car(building, 1, 2, 1, 10);
        let second = car(building, 2, 6, 1, 10);

        let chosen = SelectionPipeline::standard()
            .select(&[first.clone(), second], 4)
            .unwrap();
        assert_eq!(chosen.id, first.id);
    }

    #[test]
    fn exhausted_candidates_report_the_reason() {
        let pipeline = SelectionPipeline::standard();
        let building = BuildingID::new();

        assert_eq!(pipeline.select(&[], 1), Err(SelectionError::NoCandidates));

        let mut maintenance = car(building, 1, 1, 0, 10);
        maintenance.status = ElevatorStatus::Maintenance;
        let mut out = car(building, 2, 1, 0, 10);
        out.status = ElevatorStatus::OutOfService;
        assert_eq!(
            pipeline.select(&[maintenance.clone(), out], 1),
            Err(SelectionError::NoneInService)
        );

        let full = car(building, 3, 1, 2, 2);
        assert_eq!(
            pipeline.select(&[maintenance, full], 1),
            Err(SelectionError::AllQueuesFull)
        );
    }

    #[test]
    fn input_snapshot_is_not_modified() {
        let building = BuildingID::new();
        let elevators = vec![car(building, 1, 7, 0, 10), car(building, 2, 1, 0, 10)];
        let before = elevators.clone();

        SelectionPipeline::standard().select(&elevators, 1).unwrap();
        assert_eq!(elevators, before);
    }
}
