//! Core data model definitions shared across liftwell crates.
#![allow(missing_docs)]

pub mod building;
pub mod elevator;
pub mod error;
pub mod ids;

pub use building::Building;
pub use elevator::{
    Direction, DoorStatus, ElevatorRecord, ElevatorStatus, ElevatorType,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{BuildingID, ElevatorID};
