#![cfg(feature = "database")]

use std::sync::Arc;

use liftwell_core::seed::{DEMO_BUILDING_ID, demo_building, demo_elevators};
use liftwell_core::{
    CancellationToken, Direction, DoorStatus, ElevatorRegistry, ElevatorStore,
    PostgresElevatorStore, RegistryConfig,
};
use sqlx::PgPool;

async fn seeded_store(pool: PgPool) -> PostgresElevatorStore {
    let store = PostgresElevatorStore::new(pool);
    store
        .upsert_building(&demo_building())
        .await
        .expect("seed building");
    for elevator in demo_elevators() {
        store
            .insert_elevator_if_absent(&elevator)
            .await
            .expect("seed elevator");
    }
    store
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn rows_round_trip_through_the_store(pool: PgPool) {
    let store = seeded_store(pool).await;

    let elevators = store
        .fetch_elevators_for_building(DEMO_BUILDING_ID)
        .await
        .expect("fetch fleet");
    assert_eq!(elevators.len(), 6);
    let numbers: Vec<i32> = elevators.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

    let mut moving = elevators[5].clone();
    moving.current_floor = 4;
    moving.destination_floor = 9;
    moving.destination_queue.extend([2, 7]);
    moving.direction = Direction::Up;
    moving.door_status = DoorStatus::Closed;
    store.persist_elevator_update(&moving).await.expect("persist");

    let fetched = store
        .fetch_elevator_by_id(moving.id)
        .await
        .expect("fetch by id")
        .expect("row exists");
    assert!(fetched.same_state(&moving));

    let building = store
        .fetch_building(DEMO_BUILDING_ID)
        .await
        .expect("fetch building")
        .expect("building exists");
    assert_eq!(building.number_of_floors, 10);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
async fn registry_mirrors_updates_into_postgres(pool: PgPool) {
    let store = Arc::new(seeded_store(pool).await);
    let registry = ElevatorRegistry::new(store.clone(), RegistryConfig::default());
    let cancel = CancellationToken::new();

    let mut fleet = registry
        .get_all_by_building(DEMO_BUILDING_ID, &cancel)
        .await
        .expect("hydrate");
    let mut car = fleet.remove(0);
    car.destination_queue.push_back(8);
    registry.update(car.clone()).await.expect("update");
    registry.flush().await;

    let row = store
        .fetch_elevator_by_id(car.id)
        .await
        .expect("fetch by id")
        .expect("row exists");
    assert_eq!(row.destination_queue, [8]);
}
