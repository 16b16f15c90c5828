//! Line-oriented request console.
//!
//! Each line is one command: a floor or comma-separated floors to dispatch,
//! `status` to print the building's elevators, `help`, or `quit`.

use std::fmt;

use liftwell_core::{
    BuildingID, CancellationToken, DispatchOrchestrator, DispatchOutcome, ElevatorRecord,
    LiftError,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Attempts per floor when the registry reports a lost race.
pub const CONFLICT_ATTEMPTS: usize = 3;

pub const HELP: &str = "Commands: <floor>[,<floor>...] | status | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<i32>),
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => return Ok(Command::Empty),
        "status" | "s" => return Ok(Command::Status),
        "help" | "h" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        _ => {}
    }

    let floors = trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| ParseError(format!("'{part}' is not a floor number. {HELP}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if floors.is_empty() {
        return Err(ParseError(format!("No floors given. {HELP}")));
    }
    Ok(Command::Dispatch(floors))
}

/// Request one floor, re-running the whole request when it loses a
/// compare-and-swap race. Any other outcome is returned as is.
pub async fn dispatch_with_retry(
    orchestrator: &DispatchOrchestrator,
    building_id: BuildingID,
    floor: i32,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome, LiftError> {
    let mut attempt = 1;
    loop {
        match orchestrator.request_elevator(building_id, floor, cancel).await {
            Err(LiftError::Conflict(elevator_id)) if attempt < CONFLICT_ATTEMPTS => {
                debug!(
                    "Request for floor {} lost a race on elevator {} (attempt {}/{})",
                    floor, elevator_id, attempt, CONFLICT_ATTEMPTS
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Dispatch every floor in order and render one line per floor.
pub async fn dispatch_floors(
    orchestrator: &DispatchOrchestrator,
    building_id: BuildingID,
    floors: &[i32],
    cancel: &CancellationToken,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(floors.len());
    for &floor in floors {
        let line = match dispatch_with_retry(orchestrator, building_id, floor, cancel).await {
            Ok(outcome) => outcome.message,
            Err(err) => {
                warn!("Request for floor {} failed: {}", floor, err);
                format!("Floor {floor}: {}", err.user_message())
            }
        };
        lines.push(line);
    }
    lines
}

#[derive(Debug, Serialize)]
struct StatusLine<'a> {
    number: i32,
    #[serde(rename = "type")]
    elevator_type: &'a str,
    status: &'a str,
    floor: i32,
    direction: &'a str,
    door: &'a str,
    destination: Option<i32>,
    queue: &'a std::collections::VecDeque<i32>,
}

/// One JSON object per elevator, ordered by elevator number.
pub fn render_status(elevators: &[ElevatorRecord]) -> serde_json::Result<Vec<String>> {
    elevators
        .iter()
        .map(|elevator| {
            serde_json::to_string(&StatusLine {
                number: elevator.number,
                elevator_type: elevator.elevator_type.as_str(),
                status: elevator.status.as_str(),
                floor: elevator.current_floor,
                direction: elevator.direction.as_str(),
                door: elevator.door_status.as_str(),
                destination: (elevator.destination_floor > 0).then_some(elevator.destination_floor),
                queue: &elevator.destination_queue,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use liftwell_core::seed::{DEMO_BUILDING_ID, demo_building, demo_elevators};
    use liftwell_core::{ElevatorRegistry, InMemoryElevatorStore, RegistryConfig};

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("  7 ").unwrap(), Command::Dispatch(vec![7]));
        assert_eq!(
            parse_command("3, 5,9").unwrap(),
            Command::Dispatch(vec![3, 5, 9])
        );
        assert_eq!(parse_command("STATUS").unwrap(), Command::Status);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("").unwrap(), Command::Empty);
        assert!(parse_command("up").is_err());
        assert!(parse_command(",,").is_err());
    }

    #[tokio::test]
    async fn demo_fleet_serves_console_requests() {
        let store = Arc::new(InMemoryElevatorStore::with_data(
            [demo_building()],
            demo_elevators(),
        ));
        let registry = Arc::new(ElevatorRegistry::new(store, RegistryConfig::default()));
        let orchestrator = DispatchOrchestrator::new(Arc::clone(&registry));
        let cancel = CancellationToken::new();

        let lines = dispatch_floors(&orchestrator, DEMO_BUILDING_ID, &[4, 0, 11], &cancel).await;
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("floor 4"));
        assert!(lines[1].starts_with("Floor 0:"));
        assert!(lines[2].contains("Floor 11"));

        let elevators = registry
            .get_all_by_building(DEMO_BUILDING_ID, &cancel)
            .await
            .unwrap();
        let status = render_status(&elevators).unwrap();
        assert_eq!(status.len(), 6);
        assert!(status[0].contains("\"queue\":[4]"));
        assert!(status[5].contains("\"type\":\"high_speed\""));
    }
}
