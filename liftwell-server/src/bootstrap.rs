use std::sync::Arc;

use anyhow::Context;
use liftwell_config::StoreConfig;
use liftwell_core::seed::{DEMO_BUILDING_ID, demo_building, demo_elevators};
use liftwell_core::{BuildingID, ElevatorStore, InMemoryElevatorStore, PostgresElevatorStore};
use tracing::info;

/// Build the configured backing store and make sure the demo building exists
/// in it.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn ElevatorStore>> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory store seeded with the demo building");
            Ok(Arc::new(InMemoryElevatorStore::with_data(
                [demo_building()],
                demo_elevators(),
            )))
        }
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let store = PostgresElevatorStore::connect(url, *max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .initialize_schema()
                .await
                .context("failed to apply database migrations")?;
            store
                .upsert_building(&demo_building())
                .await
                .context("failed to seed demo building")?;
            for elevator in demo_elevators() {
                store
                    .insert_elevator_if_absent(&elevator)
                    .await
                    .with_context(|| format!("failed to seed elevator {}", elevator.number))?;
            }
            Ok(Arc::new(store))
        }
    }
}

/// Configured buildings, or the demo building when none are configured.
pub fn simulated_buildings(configured: &[BuildingID]) -> Vec<BuildingID> {
    if configured.is_empty() {
        vec![DEMO_BUILDING_ID]
    } else {
        configured.to_vec()
    }
}
