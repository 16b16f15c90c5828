//! Authoritative in-memory elevator registry.
//!
//! The registry is the only owner of live [`ElevatorRecord`]s in the
//! process. Every read hands out a copy and every write goes through
//! [`ElevatorRegistry::update`], which serializes on a single mutation gate
//! and accepts a record only when its `revision` still matches the cached
//! one. Durable state is read through from an [`ElevatorStore`] on a cold
//! or stale cache and written back asynchronously by a mirror task.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use liftwell_model::{Building, BuildingID, ElevatorID, ElevatorRecord};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, TokioClock};
use crate::config::RegistryConfig;
use crate::error::{LiftError, Result, StoreError};
use crate::store::ElevatorStore;

mod mirror;

use mirror::MirrorWriter;

pub struct ElevatorRegistry {
    store: Arc<dyn ElevatorStore>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
    elevators: DashMap<ElevatorID, ElevatorRecord>,
    refreshed_at: DashMap<BuildingID, std::time::Instant>,
    buildings: DashMap<BuildingID, Building>,
    /// Single-writer gate covering every read-then-write on `elevators`.
    gate: Mutex<()>,
    mirror: MirrorWriter,
}

impl fmt::Debug for ElevatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevatorRegistry")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("cached_elevators", &self.elevators.len())
            .field("hydrated_buildings", &self.refreshed_at.len())
            .finish()
    }
}

impl ElevatorRegistry {
    /// Create a registry on the Tokio clock. Must be called from within a
    /// Tokio runtime because it spawns the mirror task.
    pub fn new(store: Arc<dyn ElevatorStore>, config: RegistryConfig) -> Self {
        Self::with_clock(store, config, Arc::new(TokioClock))
    }

    pub fn with_clock(
        store: Arc<dyn ElevatorStore>,
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mirror = MirrorWriter::spawn(Arc::clone(&store));
        Self {
            store,
            clock,
            config,
            elevators: DashMap::new(),
            refreshed_at: DashMap::new(),
            buildings: DashMap::new(),
            gate: Mutex::new(()),
            mirror,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Copy of one elevator, read through from the store on a cache miss.
    pub async fn get_by_id(
        &self,
        elevator_id: ElevatorID,
        cancel: &CancellationToken,
    ) -> Result<ElevatorRecord> {
        if let Some(cached) = self.elevators.get(&elevator_id) {
            return Ok(cached.value().clone());
        }

        let fetched = self
            .call_store(
                cancel,
                "failed to fetch elevator from backing store",
                self.store.fetch_elevator_by_id(elevator_id),
            )
            .await?;

        let Some(mut record) = fetched else {
            return Err(LiftError::NotFound(format!("elevator {elevator_id}")));
        };

        let _gate = self.gate.lock().await;
        record.revision = 0;
        // A concurrent hydration or update may have won while we were
        // fetching; the cached record is newer in that case.
        let cached = self.elevators.entry(elevator_id).or_insert(record);
        debug!("Hydrated elevator {} from backing store", elevator_id);
        Ok(cached.value().clone())
    }

    /// Copies of every elevator in a building, ordered by elevator number.
    ///
    /// Re-hydrates the building from the store when none of its elevators
    /// are cached or the last refresh is older than the staleness interval.
    /// If the store is unreachable but cached records exist, those are
    /// returned; with neither, the store failure is surfaced.
    pub async fn get_all_by_building(
        &self,
        building_id: BuildingID,
        cancel: &CancellationToken,
    ) -> Result<Vec<ElevatorRecord>> {
        if self.needs_refresh(building_id) {
            self.refresh_building(building_id, cancel).await?;
        }
        Ok(self.snapshot(building_id))
    }

    /// Compare-and-swap write of a caller's copy.
    ///
    /// An existing entry is replaced only if `record.revision` equals the
    /// cached revision; the stored revision then advances by one. A record
    /// the registry has never seen is inserted as is. Accepted writes are
    /// queued for the backing store before the gate is released.
    pub async fn update(&self, record: ElevatorRecord) -> Result<()> {
        record.validate()?;
        let elevator_id = record.id;

        let _gate = self.gate.lock().await;
        let stored = match self.elevators.entry(elevator_id) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().revision;
                if current != record.revision {
                    debug!(
                        "Rejected stale update for elevator {}: revision {} != {}",
                        elevator_id, record.revision, current
                    );
                    return Err(LiftError::Conflict(elevator_id));
                }
                let mut next = record;
                next.revision = current + 1;
                occupied.insert(next.clone());
                next
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                record
            }
        };
        self.mirror.persist(stored);
        Ok(())
    }

    /// Place known records into the cache and mark their buildings as
    /// freshly hydrated. Seeding does not write to the backing store.
    pub async fn seed(&self, records: impl IntoIterator<Item = ElevatorRecord>) -> Result<()> {
        let records: Vec<ElevatorRecord> = records.into_iter().collect();
        for record in &records {
            record.validate()?;
        }

        let now = self.clock.now();
        let _gate = self.gate.lock().await;
        for mut record in records {
            let building_id = record.building_id;
            match self.elevators.entry(record.id) {
                Entry::Occupied(mut occupied) => {
                    record.revision = occupied.get().revision + 1;
                    occupied.insert(record);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(record);
                }
            }
            self.refreshed_at.insert(building_id, now);
        }
        Ok(())
    }

    /// Building metadata, read through from the store and cached.
    pub async fn building(
        &self,
        building_id: BuildingID,
        cancel: &CancellationToken,
    ) -> Result<Building> {
        if let Some(cached) = self.buildings.get(&building_id) {
            return Ok(cached.value().clone());
        }

        let building = self
            .call_store(
                cancel,
                "failed to fetch building from backing store",
                self.store.fetch_building(building_id),
            )
            .await?
            .ok_or_else(|| LiftError::NotFound(format!("building {building_id}")))?;

        self.buildings.insert(building_id, building.clone());
        Ok(building)
    }

    /// Forget when a building was last refreshed so the next read goes to
    /// the store.
    pub fn invalidate(&self, building_id: BuildingID) {
        self.refreshed_at.remove(&building_id);
    }

    /// Wait until every update accepted so far has reached the store.
    pub async fn flush(&self) {
        self.mirror.flush().await;
    }

    pub fn cached_len(&self) -> usize {
        self.elevators.len()
    }

    /// A building refreshed within the staleness interval is served from
    /// the cache even when it has no elevators.
    fn needs_refresh(&self, building_id: BuildingID) -> bool {
        match self.refreshed_at.get(&building_id) {
            Some(at) => {
                self.clock.now().saturating_duration_since(*at.value())
                    >= self.config.staleness_interval
            }
            None => true,
        }
    }

    fn snapshot(&self, building_id: BuildingID) -> Vec<ElevatorRecord> {
        let mut records: Vec<ElevatorRecord> = self
            .elevators
            .iter()
            .filter(|entry| entry.value().building_id == building_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.number.cmp(&b.number).then(a.id.cmp(&b.id)));
        records
    }

    fn revisions(&self, building_id: BuildingID) -> HashMap<ElevatorID, u64> {
        self.elevators
            .iter()
            .filter(|entry| entry.value().building_id == building_id)
            .map(|entry| (*entry.key(), entry.value().revision))
            .collect()
    }

    async fn refresh_building(
        &self,
        building_id: BuildingID,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // Updates accepted before the baseline already sit in the mirror
        // queue ahead of the flush; later ones move the revision and are
        // skipped by the merge.
        let baseline = {
            let _gate = self.gate.lock().await;
            self.revisions(building_id)
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(LiftError::Cancelled(format!("refresh of building {building_id}")));
            }
            _ = self.mirror.flush() => {}
        }

        let fetched = self
            .call_store(
                cancel,
                "failed to fetch elevators from backing store",
                self.store.fetch_elevators_for_building(building_id),
            )
            .await;

        match fetched {
            Ok(records) => {
                self.merge_refresh(building_id, records, &baseline).await;
                Ok(())
            }
            Err(err @ LiftError::Cancelled(_)) => Err(err),
            Err(err) if !baseline.is_empty() => {
                warn!(
                    "Serving {} cached elevators for building {} without refresh: {}",
                    baseline.len(),
                    building_id,
                    err
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn merge_refresh(
        &self,
        building_id: BuildingID,
        records: Vec<ElevatorRecord>,
        baseline: &HashMap<ElevatorID, u64>,
    ) {
        let _gate = self.gate.lock().await;
        let mut seen = HashSet::with_capacity(records.len());
        let (mut hydrated, mut replaced) = (0usize, 0usize);

        for mut record in records {
            if record.building_id != building_id {
                warn!(
                    "Store returned elevator {} of building {} while refreshing {}",
                    record.id, record.building_id, building_id
                );
                continue;
            }
            seen.insert(record.id);

            match self.elevators.entry(record.id) {
                Entry::Occupied(mut occupied) => {
                    let cached = occupied.get();
                    // Updated while the fetch was in flight: the cache is newer.
                    if baseline.get(&record.id) != Some(&cached.revision) {
                        continue;
                    }
                    if !cached.same_state(&record) {
                        record.revision = cached.revision + 1;
                        occupied.insert(record);
                        replaced += 1;
                    }
                }
                Entry::Vacant(vacant) => {
                    record.revision = 0;
                    vacant.insert(record);
                    hydrated += 1;
                }
            }
        }

        let before = self.elevators.len();
        self.elevators.retain(|id, record| {
            record.building_id != building_id
                || seen.contains(id)
                || baseline.get(id) != Some(&record.revision)
        });
        let evicted = before - self.elevators.len();

        self.refreshed_at.insert(building_id, self.clock.now());
        info!(
            "Refreshed building {}: hydrated={} replaced={} evicted={}",
            building_id, hydrated, replaced, evicted
        );
    }

    async fn call_store<T>(
        &self,
        cancel: &CancellationToken,
        context: &str,
        fut: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LiftError::Cancelled(context.to_string())),
            result = fut => result.map_err(|e| LiftError::failure(context, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::InMemoryElevatorStore;
    use std::time::Duration;

    fn fixture() -> (Arc<InMemoryElevatorStore>, Building, Vec<ElevatorRecord>) {
        let building = Building::new("Tower", 12);
        let elevators = vec![
            ElevatorRecord::new(building.id, 2),
            ElevatorRecord::new(building.id, 1),
        ];
        let store = Arc::new(InMemoryElevatorStore::with_data(
            [building.clone()],
            elevators.clone(),
        ));
        (store, building, elevators)
    }

    #[tokio::test]
    async fn snapshot_is_ordered_by_number() {
        let (store, building, _) = fixture();
        let registry = ElevatorRegistry::new(store, RegistryConfig::default());
        let cancel = CancellationToken::new();

        let all = registry.get_all_by_building(building.id, &cancel).await.unwrap();
        let numbers: Vec<i32> = all.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn stale_cache_picks_up_out_of_band_changes() {
        let (store, building, elevators) = fixture();
        let clock = ManualClock::new();
        let registry = ElevatorRegistry::with_clock(
            store.clone(),
            RegistryConfig {
                staleness_interval: Duration::from_secs(60),
            },
            Arc::new(clock.clone()),
        );
        let cancel = CancellationToken::new();

        let first = registry.get_all_by_building(building.id, &cancel).await.unwrap();
        assert_eq!(store.fetches(), 1);

        let mut moved = elevators[0].clone();
        moved.status = liftwell_model::ElevatorStatus::Maintenance;
        store.insert_elevator(moved.clone());

        clock.advance(Duration::from_secs(30));
        let within = registry.get_all_by_building(building.id, &cancel).await.unwrap();
        assert_eq!(first, within);
        assert_eq!(store.fetches(), 1);

        clock.advance(Duration::from_secs(30));
        let after = registry.get_all_by_building(building.id, &cancel).await.unwrap();
        assert_eq!(store.fetches(), 2);
        let refreshed = after.iter().find(|e| e.id == moved.id).unwrap();
        assert_eq!(refreshed.status, liftwell_model::ElevatorStatus::Maintenance);
        // The replacement invalidates copies handed out before the refresh.
        let old_copy = first.iter().find(|e| e.id == moved.id).unwrap().clone();
        assert!(matches!(
            registry.update(old_copy).await,
            Err(LiftError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn refresh_evicts_elevators_removed_from_store() {
        let (store, building, elevators) = fixture();
        let registry = ElevatorRegistry::new(store.clone(), RegistryConfig::default());
        let cancel = CancellationToken::new();

        registry.get_all_by_building(building.id, &cancel).await.unwrap();
        store.remove_elevator(elevators[0].id);
        registry.invalidate(building.id);

        let all = registry.get_all_by_building(building.id, &cancel).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, elevators[1].id);
    }

    #[tokio::test]
    async fn cancelled_token_stops_cold_reads() {
        let (store, building, _) = fixture();
        let registry = ElevatorRegistry::new(store, RegistryConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = registry
            .get_all_by_building(building.id, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, LiftError::Cancelled(_)));
    }

    #[tokio::test]
    async fn seeded_records_skip_the_store() {
        let store = Arc::new(InMemoryElevatorStore::new());
        let registry = ElevatorRegistry::new(store.clone(), RegistryConfig::default());
        let building_id = BuildingID::new();
        let seeded = vec![ElevatorRecord::new(building_id, 1)];

        registry.seed(seeded.clone()).await.unwrap();
        let all = registry
            .get_all_by_building(building_id, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(all, seeded);
        assert_eq!(store.fetches(), 0);
    }

    #[tokio::test]
    async fn unknown_building_is_not_found() {
        let (store, _, _) = fixture();
        let registry = ElevatorRegistry::new(store, RegistryConfig::default());
        let err = registry
            .building(BuildingID::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LiftError::NotFound(_)));
    }
}
