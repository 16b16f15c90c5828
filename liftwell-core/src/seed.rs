//! Demo fleet: one ten-storey building with six cars.

use std::collections::VecDeque;

use liftwell_model::{
    Building, BuildingID, Direction, DoorStatus, ElevatorID, ElevatorRecord,
    ElevatorStatus, ElevatorType,
};
use uuid::uuid;

pub const DEMO_BUILDING_ID: BuildingID =
    BuildingID(uuid!("e16e32e7-8db0-4536-b86e-f53e53cd7a0d"));

pub fn demo_building() -> Building {
    Building {
        id: DEMO_BUILDING_ID,
        name: "Joe's Building".to_string(),
        number_of_floors: 10,
    }
}

pub fn demo_elevators() -> Vec<ElevatorRecord> {
    let fleet = [
        (uuid!("852bb6fa-1831-49ef-a0d9-5bfa5f567841"), ElevatorType::Passenger),
        (uuid!("14ef29a8-001e-4b70-93b6-bfdb00237d46"), ElevatorType::Passenger),
        (uuid!("966b1041-ff39-432b-917c-b0a14ddce0bd"), ElevatorType::Passenger),
        (uuid!("b8557436-6472-4ad7-b111-09c8a023c463"), ElevatorType::Passenger),
        (uuid!("bbfbdffa-f7cd-4241-a222-85a733098782"), ElevatorType::Service),
        (uuid!("82d562f7-f7d5-4088-b735-9a7b085968d3"), ElevatorType::HighSpeed),
    ];

    fleet
        .into_iter()
        .zip(1..)
        .map(|((id, elevator_type), number)| {
            let high_speed = elevator_type == ElevatorType::HighSpeed;
            ElevatorRecord {
                id: ElevatorID(id),
                number,
                building_id: DEMO_BUILDING_ID,
                current_floor: 1,
                destination_floor: 0,
                destination_queue: VecDeque::new(),
                direction: Direction::None,
                door_status: DoorStatus::Open,
                status: ElevatorStatus::Active,
                elevator_type,
                floors_per_second: if high_speed { 2 } else { 1 },
                queue_capacity: if high_speed { 5 } else { 10 },
                revision: 0,
            }
        })
        .collect()
}
