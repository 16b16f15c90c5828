//! Backing store port.
//!
//! The registry hydrates from and mirrors into an [`ElevatorStore`]. The
//! store is eventually consistent with the registry cache; the cache stays
//! authoritative for the duration of the staleness window.

use std::fmt;

use async_trait::async_trait;
use liftwell_model::{Building, BuildingID, ElevatorID, ElevatorRecord};

use crate::error::StoreError;

pub mod memory;
#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::InMemoryElevatorStore;
#[cfg(feature = "database")]
pub use postgres::PostgresElevatorStore;

/// Durable elevator state. Implementations must allow concurrent reads.
#[async_trait]
pub trait ElevatorStore: Send + Sync + fmt::Debug {
    async fn fetch_elevators_for_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Vec<ElevatorRecord>, StoreError>;

    async fn fetch_elevator_by_id(
        &self,
        elevator_id: ElevatorID,
    ) -> Result<Option<ElevatorRecord>, StoreError>;

    /// Writes the mutable runtime columns: floor, status, direction, door,
    /// destination floor and queue.
    async fn persist_elevator_update(
        &self,
        record: &ElevatorRecord,
    ) -> Result<(), StoreError>;

    async fn fetch_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Option<Building>, StoreError>;
}
