//! Record store abstraction

use crate::core::cost::{NewCost, StoredCost};
use crate::core::error::CostError;
use async_trait::async_trait;

/// Name of the collection expense records live in.
pub const COSTS_COLLECTION: &str = "costs";

#[async_trait]
pub trait CostStore: Send + Sync {
    /// Validates `cost`, assigns it a fresh id and the current timestamp, and
    /// persists it.
    async fn insert(&self, cost: NewCost) -> Result<StoredCost, CostError>;

    /// Removes the record with `id`. Returns whether a record was removed;
    /// a missing id is not an error.
    async fn delete(&self, id: u64) -> Result<bool, CostError>;

    /// Every record in the store, in no particular order.
    async fn scan_all(&self) -> Result<Vec<StoredCost>, CostError>;

    /// Marks the handle closed. Later calls fail with
    /// [`CostError::StoreUnavailable`].
    async fn close(&self);

    async fn scan_by_year(&self, year: i32) -> Result<Vec<StoredCost>, CostError> {
        let all = self.scan_all().await?;
        Ok(all.into_iter().filter(|c| c.in_period(year, None)).collect())
    }

    async fn scan_by_year_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<StoredCost>, CostError> {
        let all = self.scan_all().await?;
        Ok(all
            .into_iter()
            .filter(|c| c.in_period(year, Some(month)))
            .collect())
    }
}
