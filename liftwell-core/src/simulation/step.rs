use liftwell_model::{Direction, DoorStatus, ElevatorRecord, ElevatorStatus};

/// Advance one elevator by a single tick. Returns whether any field changed.
///
/// Only `Active` cars move. A moving car travels `floors_per_second` floors
/// toward its destination and stops there rather than passing it. An idle
/// car with pending requests takes the head of its queue as the new
/// destination and closes its doors without moving. Reaching the
/// destination stops the car and opens the doors, and an idle car always
/// has its doors open.
pub fn advance(elevator: &mut ElevatorRecord) -> bool {
    if elevator.status != ElevatorStatus::Active {
        return false;
    }

    let before = elevator.clone();

    match elevator.direction {
        Direction::Up => {
            elevator.current_floor =
                (elevator.current_floor + elevator.floors_per_second).min(elevator.destination_floor);
        }
        Direction::Down => {
            elevator.current_floor =
                (elevator.current_floor - elevator.floors_per_second).max(elevator.destination_floor);
        }
        Direction::None => {
            if let Some(next) = elevator.destination_queue.pop_front() {
                elevator.destination_floor = next;
                elevator.direction = if next > elevator.current_floor {
                    Direction::Up
                } else {
                    Direction::Down
                };
                elevator.door_status = DoorStatus::Closed;
            }
        }
    }

    if elevator.current_floor == elevator.destination_floor {
        elevator.direction = Direction::None;
        elevator.door_status = DoorStatus::Open;
    }
    if elevator.direction == Direction::None {
        elevator.door_status = DoorStatus::Open;
    }

    !before.same_state(elevator)
}
