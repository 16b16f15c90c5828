use liftwell_model::{BuildingID, ElevatorID, ModelError};
use thiserror::Error;

use crate::selection::SelectionError;

/// Failures raised by a backing store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode stored elevator: {0}")]
    Decode(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Coarse classification of [`LiftError`] used for presentation and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    NoElevatorsAvailable,
    Validation,
    Cancelled,
    Failure,
}

#[derive(Error, Debug)]
pub enum LiftError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A compare-and-swap update lost against a concurrent writer. Callers
    /// should re-read and decide again.
    #[error("Elevator {0} was modified concurrently")]
    Conflict(ElevatorID),

    #[error("No elevator available for floor {floor} in building {building_id}: {cause}")]
    NoElevatorsAvailable {
        building_id: BuildingID,
        floor: i32,
        #[source]
        cause: SelectionError,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("{context}: {source}")]
    Failure {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl LiftError {
    pub fn failure(context: impl Into<String>, source: StoreError) -> Self {
        LiftError::Failure {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LiftError::NotFound(_) => ErrorKind::NotFound,
            LiftError::Conflict(_) => ErrorKind::Conflict,
            LiftError::NoElevatorsAvailable { .. } => {
                ErrorKind::NoElevatorsAvailable
            }
            LiftError::Validation(_) => ErrorKind::Validation,
            LiftError::Cancelled(_) => ErrorKind::Cancelled,
            LiftError::Failure { .. } => ErrorKind::Failure,
        }
    }

    /// Text safe to show to an end user. Selection exhaustion and lost
    /// races read the same; the variant itself stays distinct for logs.
    pub fn user_message(&self) -> String {
        match self {
            LiftError::NoElevatorsAvailable { .. } | LiftError::Conflict(_) => {
                "No elevator available, please try again".to_string()
            }
            LiftError::NotFound(what) => format!("Not found: {what}"),
            LiftError::Validation(msg) => msg.clone(),
            LiftError::Cancelled(_) => "Request cancelled".to_string(),
            LiftError::Failure { .. } => {
                "The request could not be completed".to_string()
            }
        }
    }
}

impl From<ModelError> for LiftError {
    fn from(err: ModelError) -> Self {
        LiftError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LiftError>;
