use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use liftwell_model::{Building, BuildingID, ElevatorID, ElevatorRecord};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

use super::ElevatorStore;
use crate::error::StoreError;

/// Embedded schema migrations for the elevator tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const ELEVATOR_COLUMNS: &str = r#"
    id,
    building_id,
    number,
    current_floor,
    destination_floor,
    destination_floors,
    direction,
    door_status,
    status,
    elevator_type,
    floors_per_second,
    queue_capacity
"#;

/// PostgreSQL-backed [`ElevatorStore`].
#[derive(Debug, Clone)]
pub struct PostgresElevatorStore {
    pool: PgPool,
}

impl PostgresElevatorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // 10 min idle timeout
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        info!("Connected to PostgreSQL elevator store");
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Ok(())
    }

    /// Inserts or replaces a building row. Used for demo seeding.
    pub async fn upsert_building(
        &self,
        building: &Building,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO buildings (id, name, number_of_floors)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                number_of_floors = EXCLUDED.number_of_floors,
                updated_at = NOW()
            "#,
        )
        .bind(building.id.to_uuid())
        .bind(&building.name)
        .bind(building.number_of_floors)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts an elevator row unless one with the same id already exists.
    pub async fn insert_elevator_if_absent(
        &self,
        record: &ElevatorRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO elevators (
                id, building_id, number, current_floor, destination_floor,
                destination_floors, direction, door_status, status,
                elevator_type, floors_per_second, queue_capacity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id.to_uuid())
        .bind(record.building_id.to_uuid())
        .bind(record.number)
        .bind(record.current_floor)
        .bind(record.destination_floor)
        .bind(record.destination_queue.iter().copied().collect::<Vec<i32>>())
        .bind(record.direction.as_str())
        .bind(record.door_status.as_str())
        .bind(record.status.as_str())
        .bind(record.elevator_type.as_str())
        .bind(record.floors_per_second)
        .bind(capacity_to_sql(record.queue_capacity)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn capacity_to_sql(capacity: usize) -> Result<i32, StoreError> {
    i32::try_from(capacity).map_err(|_| {
        StoreError::Decode(format!("queue capacity {capacity} exceeds INTEGER"))
    })
}

fn decode<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Decode(format!("column {column}: {e}")))
}

fn parse_text<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr<Err = liftwell_model::ModelError>,
{
    let raw: String = decode(row, column)?;
    raw.parse()
        .map_err(|e| StoreError::Decode(format!("column {column}: {e}")))
}

fn map_elevator_row(row: &PgRow) -> Result<ElevatorRecord, StoreError> {
    let queue: Vec<i32> = decode(row, "destination_floors")?;
    let capacity: i32 = decode(row, "queue_capacity")?;

    Ok(ElevatorRecord {
        id: ElevatorID(decode(row, "id")?),
        number: decode(row, "number")?,
        building_id: BuildingID(decode(row, "building_id")?),
        current_floor: decode(row, "current_floor")?,
        destination_floor: decode(row, "destination_floor")?,
        destination_queue: VecDeque::from(queue),
        direction: parse_text(row, "direction")?,
        door_status: parse_text(row, "door_status")?,
        status: parse_text(row, "status")?,
        elevator_type: parse_text(row, "elevator_type")?,
        floors_per_second: decode(row, "floors_per_second")?,
        queue_capacity: usize::try_from(capacity).map_err(|_| {
            StoreError::Decode(format!("negative queue capacity {capacity}"))
        })?,
        revision: 0,
    })
}

#[async_trait]
impl ElevatorStore for PostgresElevatorStore {
    async fn fetch_elevators_for_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Vec<ElevatorRecord>, StoreError> {
        let query = format!(
            "SELECT {ELEVATOR_COLUMNS} FROM elevators WHERE building_id = $1 ORDER BY number"
        );
        let rows = sqlx::query(&query)
            .bind(building_id.to_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_elevator_row).collect()
    }

    async fn fetch_elevator_by_id(
        &self,
        elevator_id: ElevatorID,
    ) -> Result<Option<ElevatorRecord>, StoreError> {
        let query =
            format!("SELECT {ELEVATOR_COLUMNS} FROM elevators WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(elevator_id.to_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_elevator_row).transpose()
    }

    async fn persist_elevator_update(
        &self,
        record: &ElevatorRecord,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE elevators
            SET current_floor = $2,
                status = $3,
                direction = $4,
                door_status = $5,
                destination_floor = $6,
                destination_floors = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(record.id.to_uuid())
        .bind(record.current_floor)
        .bind(record.status.as_str())
        .bind(record.direction.as_str())
        .bind(record.door_status.as_str())
        .bind(record.destination_floor)
        .bind(record.destination_queue.iter().copied().collect::<Vec<i32>>())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Registry inserted a record the database has never seen.
            self.insert_elevator_if_absent(record).await?;
        }
        Ok(())
    }

    async fn fetch_building(
        &self,
        building_id: BuildingID,
    ) -> Result<Option<Building>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, number_of_floors
            FROM buildings
            WHERE id = $1
            "#,
        )
        .bind(building_id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Building {
                id: BuildingID(decode(&row, "id")?),
                name: decode(&row, "name")?,
                number_of_floors: decode(&row, "number_of_floors")?,
            })
        })
        .transpose()
    }
}
