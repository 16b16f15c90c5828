//! Elevator dispatch core.
//!
//! - [`registry`]: the authoritative in-memory cache of elevator records,
//!   read through from and mirrored into an [`ElevatorStore`].
//! - [`selection`]: the two-stage pipeline choosing one elevator for a floor.
//! - [`dispatch`]: the request entry point tying selection to registry
//!   updates.
//! - [`simulation`]: per-building tick loops that move the cars.
//!
//! Every record crossing the registry boundary is a copy. Writes are
//! compare-and-swap on the record's `revision`, so concurrent writers to the
//! same elevator never overwrite each other silently; the loser gets
//! [`LiftError::Conflict`].
#![allow(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod seed;
pub mod selection;
pub mod simulation;
pub mod store;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{RegistryConfig, SimulationConfig};
pub use dispatch::{DispatchOrchestrator, DispatchOutcome};
pub use error::{ErrorKind, LiftError, Result, StoreError};
pub use registry::ElevatorRegistry;
pub use selection::{SelectionError, SelectionPipeline, SelectionStage};
pub use simulation::{SimulationEngine, TickReport};
pub use store::{ElevatorStore, InMemoryElevatorStore};
#[cfg(feature = "database")]
pub use store::PostgresElevatorStore;

pub use liftwell_model::{
    Building, BuildingID, Direction, DoorStatus, ElevatorID, ElevatorRecord,
    ElevatorStatus, ElevatorType,
};
pub use tokio_util::sync::CancellationToken;
