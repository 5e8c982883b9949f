use crate::core::cost::{Clock, NewCost, StoredCost, SystemClock};
use crate::core::error::CostError;
use crate::core::store::CostStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

struct MemoryState {
    open: bool,
    next_id: u64,
    records: BTreeMap<u64, StoredCost>,
}

/// Cost store that lives only as long as the process.
pub struct MemoryCostStore {
    inner: Mutex<MemoryState>,
    clock: Arc<dyn Clock>,
}

impl MemoryCostStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                open: true,
                next_id: 1,
                records: BTreeMap::new(),
            }),
            clock,
        }
    }
}

impl Default for MemoryCostStore {
    fn default() -> Self {
        Self::new()
    }
}

fn closed() -> CostError {
    CostError::StoreUnavailable("memory store is closed".to_string())
}

#[async_trait]
impl CostStore for MemoryCostStore {
    async fn insert(&self, cost: NewCost) -> Result<StoredCost, CostError> {
        let mut state = self.inner.lock().await;
        if !state.open {
            return Err(closed());
        }
        cost.validate()?;

        let id = state.next_id;
        let stored = StoredCost::stamp(id, cost, self.clock.now());
        state.next_id += 1;
        state.records.insert(id, stored.clone());
        debug!(id, "Memory store INSERT");
        Ok(stored)
    }

    async fn delete(&self, id: u64) -> Result<bool, CostError> {
        let mut state = self.inner.lock().await;
        if !state.open {
            return Err(closed());
        }
        let removed = state.records.remove(&id).is_some();
        debug!(id, removed, "Memory store DELETE");
        Ok(removed)
    }

    async fn scan_all(&self) -> Result<Vec<StoredCost>, CostError> {
        let state = self.inner.lock().await;
        if !state.open {
            return Err(closed());
        }
        Ok(state.records.values().cloned().collect())
    }

    async fn close(&self) {
        let mut state = self.inner.lock().await;
        state.open = false;
        debug!("Memory store CLOSE");
    }
}
