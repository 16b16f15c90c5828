use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use liftwell_model::{Building, BuildingID, ElevatorID, ElevatorRecord};
use parking_lot::RwLock;

use super::ElevatorStore;
use crate::error::StoreError;

/// Process-local store used by the demo binary and by tests.
///
/// Mirrors what a database adapter would hold: buildings plus elevator rows
/// without the registry-owned `revision` token. It can be switched to an
/// unavailable mode to exercise degraded registry paths.
#[derive(Debug, Default)]
pub struct InMemoryElevatorStore {
    buildings: RwLock<HashMap<BuildingID, Building>>,
    elevators: RwLock<HashMap<ElevatorID, ElevatorRecord>>,
    unavailable: AtomicBool,
    persisted_writes: AtomicUsize,
    fetches: AtomicUsize,
}

impl InMemoryElevatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(
        buildings: impl IntoIterator<Item = Building>,
        elevators: impl IntoIterator<Item = ElevatorRecord>,
    ) -> Self {
        let store = Self::new();
        for building in buildings {
            store.insert_building(building);
        }
        for elevator in elevators {
            store.insert_elevator(elevator);
        }
        store
    }

    pub fn insert_building(&self, building: Building) {
        self.buildings.write().insert(building.id, building);
    }

    /// Inserts or replaces a row directly, bypassing the registry. Tests use
    /// this to simulate out-of-band changes to durable state.
    pub fn insert_elevator(&self, mut elevator: ElevatorRecord) {
        elevator.revision = 0;
        self.elevators.write().insert(elevator.id, elevator);
    }

    pub fn remove_elevator(&self, elevator_id: ElevatorID) {
        self.elevators.write().remove(&elevator_id);
    }

    pub fn elevator(&self, elevator_id: ElevatorID) -> Option<ElevatorRecord> {
        self.elevators.read().get(&elevator_id).cloned()
    }

    /// While unavailable every operation fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn persisted_writes(&self) -> usize {
        self.persisted_writes.load(Ordering::SeqCst)
    }

    /// Number of successful building-wide fetches.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "in-memory store switched off".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ElevatorStore for InMemoryElevatorStore {
    async fn fetch_elevators_for_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Vec<ElevatorRecord>, StoreError> {
        self.ensure_available()?;
        let mut elevators: Vec<ElevatorRecord> = self
            .elevators
            .read()
            .values()
            .filter(|elevator| elevator.building_id == building_id)
            .cloned()
            .collect();
        elevators.sort_by_key(|elevator| elevator.number);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(elevators)
    }

    async fn fetch_elevator_by_id(
        &self,
        elevator_id: ElevatorID,
    ) -> Result<Option<ElevatorRecord>, StoreError> {
        self.ensure_available()?;
        Ok(self.elevators.read().get(&elevator_id).cloned())
    }

    async fn persist_elevator_update(
        &self,
        record: &ElevatorRecord,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut elevators = self.elevators.write();
        match elevators.get_mut(&record.id) {
            Some(row) => {
                row.current_floor = record.current_floor;
                row.status = record.status;
                row.direction = record.direction;
                row.door_status = record.door_status;
                row.destination_floor = record.destination_floor;
                row.destination_queue = record.destination_queue.clone();
            }
            None => {
                let mut row = record.clone();
                row.revision = 0;
                elevators.insert(row.id, row);
            }
        }
        self.persisted_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Option<Building>, StoreError> {
        self.ensure_available()?;
        Ok(self.buildings.read().get(&building_id).cloned())
    }
}
