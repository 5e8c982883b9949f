use crate::core::cost::{Clock, NewCost, StoredCost, SystemClock};
use crate::core::error::CostError;
use crate::core::store::{COSTS_COLLECTION, CostStore};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const META_COLLECTION: &str = "meta";
const SCHEMA_VERSION_KEY: &str = "schema_version";
const NEXT_ID_KEY: &str = "next_id";

/// Cost store persisted in a fjall keyspace.
///
/// Records are keyed by their big-endian id so a scan walks them in insertion
/// order. The id counter lives in a separate `meta` partition and is advanced
/// in the same batch that writes the record, so ids are never handed out
/// twice, even after deletes or restarts.
pub struct DiskCostStore {
    name: String,
    keyspace: Keyspace,
    costs: PartitionHandle,
    meta: PartitionHandle,
    open: AtomicBool,
    write_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
}

fn read_u64(partition: &PartitionHandle, key: &str) -> Result<Option<u64>, CostError> {
    match partition.get(key)? {
        Some(bytes) => {
            let raw = <[u8; 8]>::try_from(&*bytes)
                .map_err(|_| CostError::Storage(format!("Corrupt value for meta key {key}")))?;
            Ok(Some(u64::from_be_bytes(raw)))
        }
        None => Ok(None),
    }
}

/// A failed sync after a committed batch is logged, not returned. The write is
/// already visible, so the caller must not see it as failed and retry.
fn warn_on_failed_sync<E: Display>(result: Result<(), E>, operation: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, operation, "Cost store write committed but not synced to disk");
            false
        }
    }
}

fn record_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

impl DiskCostStore {
    /// Opens database `name` under `root`, creating the `costs` collection on
    /// first use.
    pub fn open(root: &Path, name: &str, schema_version: u64) -> Result<Self, CostError> {
        Self::open_with_clock(root, name, schema_version, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        root: &Path,
        name: &str,
        schema_version: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CostError> {
        if schema_version == 0 {
            return Err(CostError::Validation(
                "Schema version must be at least 1".to_string(),
            ));
        }
        let unavailable =
            |e: &dyn Display| CostError::StoreUnavailable(format!("{name}: {e}"));

        let path = root.join(name);
        std::fs::create_dir_all(&path).map_err(|e| unavailable(&e))?;
        let keyspace = Config::new(&path).open().map_err(|e| unavailable(&e))?;
        let meta = keyspace
            .open_partition(META_COLLECTION, PartitionCreateOptions::default())
            .map_err(|e| unavailable(&e))?;

        let stored_version = read_u64(&meta, SCHEMA_VERSION_KEY)?;
        if let Some(stored) = stored_version.filter(|v| *v > schema_version) {
            return Err(CostError::StoreUnavailable(format!(
                "{name} is at schema version {stored}, refusing to open it as version {schema_version}"
            )));
        }

        let costs = keyspace
            .open_partition(COSTS_COLLECTION, PartitionCreateOptions::default())
            .map_err(|e| unavailable(&e))?;

        if stored_version != Some(schema_version) {
            meta.insert(SCHEMA_VERSION_KEY, schema_version.to_be_bytes().to_vec())
                .map_err(|e| unavailable(&e))?;
            keyspace
                .persist(PersistMode::SyncAll)
                .map_err(|e| unavailable(&e))?;
            info!(
                database = name,
                from = ?stored_version,
                to = schema_version,
                "Upgraded store schema"
            );
        }
        debug!("Opened cost store at {}", path.display());

        Ok(Self {
            name: name.to_string(),
            keyspace,
            costs,
            meta,
            open: AtomicBool::new(true),
            write_lock: Mutex::new(()),
            clock,
        })
    }

    fn ensure_open(&self) -> Result<(), CostError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CostError::StoreUnavailable(format!(
                "{} is closed",
                self.name
            )))
        }
    }
}

#[async_trait]
impl CostStore for DiskCostStore {
    async fn insert(&self, cost: NewCost) -> Result<StoredCost, CostError> {
        self.ensure_open()?;
        cost.validate()?;

        let _guard = self.write_lock.lock().await;
        let id = read_u64(&self.meta, NEXT_ID_KEY)?.unwrap_or(1);
        let stored = StoredCost::stamp(id, cost, self.clock.now());

        let mut batch = self.keyspace.batch();
        batch.insert(&self.costs, record_key(id), serde_json::to_vec(&stored)?);
        batch.insert(&self.meta, NEXT_ID_KEY, (id + 1).to_be_bytes().to_vec());
        batch.commit()?;
        warn_on_failed_sync(self.keyspace.persist(PersistMode::SyncAll), "INSERT");

        debug!(id, "Cost store INSERT");
        Ok(stored)
    }

    async fn delete(&self, id: u64) -> Result<bool, CostError> {
        self.ensure_open()?;

        let _guard = self.write_lock.lock().await;
        let key = record_key(id);
        if !self.costs.contains_key(&key)? {
            debug!(id, "Cost store DELETE of missing id");
            return Ok(false);
        }
        self.costs.remove(key)?;
        warn_on_failed_sync(self.keyspace.persist(PersistMode::SyncAll), "DELETE");
        debug!(id, "Cost store DELETE");
        Ok(true)
    }

    async fn scan_all(&self) -> Result<Vec<StoredCost>, CostError> {
        self.ensure_open()?;

        let mut records = Vec::new();
        for item in self.costs.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice::<StoredCost>(&value)?);
        }
        debug!(count = records.len(), "Cost store SCAN");
        Ok(records)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        debug!(database = %self.name, "Cost store CLOSE");
    }
}
