//! Errors raised by the cost store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostError {
    /// The store is closed or its medium could not be opened.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// The caller handed in an entry the store refuses to persist.
    #[error("Invalid cost: {0}")]
    Validation(String),
    /// The store is open but a read or write against it failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CostError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CostError::StoreUnavailable(_))
    }
}

impl From<fjall::Error> for CostError {
    fn from(err: fjall::Error) -> Self {
        CostError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CostError {
    fn from(err: serde_json::Error) -> Self {
        CostError::Storage(format!("Record serialization failed: {err}"))
    }
}
