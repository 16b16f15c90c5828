#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use liftwell_core::{
    Building, ElevatorRecord, ElevatorRegistry, InMemoryElevatorStore, ManualClock,
    RegistryConfig,
};

pub struct Fixture {
    pub building: Building,
    pub elevators: Vec<ElevatorRecord>,
    pub store: Arc<InMemoryElevatorStore>,
    pub clock: ManualClock,
    pub registry: Arc<ElevatorRegistry>,
}

/// `count` idle passenger cars numbered from 1, all on the ground floor.
pub fn fleet(building: &Building, count: i32) -> Vec<ElevatorRecord> {
    (1..=count)
        .map(|number| ElevatorRecord::new(building.id, number))
        .collect()
}

pub fn fixture(floors: i32, cars: i32) -> Fixture {
    fixture_with_staleness(floors, cars, RegistryConfig::default().staleness_interval)
}

pub fn fixture_with_staleness(floors: i32, cars: i32, staleness: Duration) -> Fixture {
    let building = Building::new("Test Tower", floors);
    let elevators = fleet(&building, cars);
    let store = Arc::new(InMemoryElevatorStore::with_data(
        [building.clone()],
        elevators.clone(),
    ));
    let clock = ManualClock::new();
    let registry = Arc::new(ElevatorRegistry::with_clock(
        store.clone(),
        RegistryConfig {
            staleness_interval: staleness,
        },
        Arc::new(clock.clone()),
    ));
    Fixture {
        building,
        elevators,
        store,
        clock,
        registry,
    }
}

/// Poll `check` until it returns true or a second of real time passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
