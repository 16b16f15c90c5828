use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};
use crate::ids::{BuildingID, ElevatorID};

/// Generates `as_str`, `Display` and `FromStr` for a fieldless enum with a
/// stable lowercase text form. The text form is what the persistent store
/// and the CLI use, so variants must never be renamed in place.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self> {
                let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(ModelError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Travel direction of an elevator car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

text_enum!(Direction, "direction", {
    Up => "up",
    Down => "down",
    None => "none",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DoorStatus {
    #[default]
    Open,
    Closed,
}

text_enum!(DoorStatus, "door status", {
    Open => "open",
    Closed => "closed",
});

/// Operational status. Only `Active` cars move; `Maintenance` and
/// `OutOfService` cars are never picked for new requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElevatorStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
    OutOfService,
}

text_enum!(ElevatorStatus, "elevator status", {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
    OutOfService => "out_of_service",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElevatorType {
    #[default]
    Passenger,
    Freight,
    Service,
    HighSpeed,
}

text_enum!(ElevatorType, "elevator type", {
    Passenger => "passenger",
    Freight => "freight",
    Service => "service",
    HighSpeed => "high_speed",
});

/// Runtime state of a single elevator.
///
/// Records are plain values: every copy handed out by the registry is
/// independent of the cached instance, so callers mutate their own copy and
/// hand it back through an update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevatorRecord {
    pub id: ElevatorID,
    /// Building-scoped number, unique per `(building_id, number)`.
    pub number: i32,
    pub building_id: BuildingID,
    pub current_floor: i32,
    /// Floor currently being travelled to; `0` when idle.
    pub destination_floor: i32,
    /// Pending floor requests in arrival order. Duplicates are allowed.
    pub destination_queue: VecDeque<i32>,
    pub direction: Direction,
    pub door_status: DoorStatus,
    pub status: ElevatorStatus,
    pub elevator_type: ElevatorType,
    /// Floors travelled per tick.
    pub floors_per_second: i32,
    /// Maximum number of pending destinations accepted at dispatch time.
    pub queue_capacity: usize,
    /// Optimistic concurrency token owned by the registry. Advances by one on
    /// every accepted update.
    #[cfg_attr(feature = "serde", serde(default))]
    pub revision: u64,
}

impl ElevatorRecord {
    /// An idle, active passenger car parked on the ground floor.
    pub fn new(building_id: BuildingID, number: i32) -> Self {
        Self {
            id: ElevatorID::new(),
            number,
            building_id,
            current_floor: 1,
            destination_floor: 0,
            destination_queue: VecDeque::new(),
            direction: Direction::None,
            door_status: DoorStatus::Open,
            status: ElevatorStatus::Active,
            elevator_type: ElevatorType::Passenger,
            floors_per_second: 1,
            queue_capacity: 10,
            revision: 0,
        }
    }

    /// Compares every field except `revision`.
    pub fn same_state(&self, other: &Self) -> bool {
        self.id == other.id
            && self.number == other.number
            && self.building_id == other.building_id
            && self.current_floor == other.current_floor
            && self.destination_floor == other.destination_floor
            && self.destination_queue == other.destination_queue
            && self.direction == other.direction
            && self.door_status == other.door_status
            && self.status == other.status
            && self.elevator_type == other.elevator_type
            && self.floors_per_second == other.floors_per_second
            && self.queue_capacity == other.queue_capacity
    }

    /// Maintenance and out-of-service cars never receive new requests.
    pub fn is_dispatchable(&self) -> bool {
        !matches!(
            self.status,
            ElevatorStatus::Maintenance | ElevatorStatus::OutOfService
        )
    }

    pub fn has_queue_room(&self) -> bool {
        self.destination_queue.len() < self.queue_capacity
    }

    pub fn validate(&self) -> Result<()> {
        if self.current_floor < 1 {
            return Err(ModelError::InvalidRecord(format!(
                "elevator {} is on floor {}, floors start at 1",
                self.id, self.current_floor
            )));
        }
        if self.floors_per_second < 1 {
            return Err(ModelError::InvalidRecord(format!(
                "elevator {} has non-positive speed {}",
                self.id, self.floors_per_second
            )));
        }
        if self.queue_capacity < 1 {
            return Err(ModelError::InvalidRecord(format!(
                "elevator {} has zero queue capacity",
                self.id
            )));
        }
        Ok(())
    }
}
