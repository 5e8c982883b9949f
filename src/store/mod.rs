pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::error::CostError;
use disk::DiskCostStore;

/// Opens the on-disk cost store described by `config`.
pub fn open_configured(config: &AppConfig) -> Result<DiskCostStore, CostError> {
    let root = config
        .data_path()
        .map_err(|e| CostError::StoreUnavailable(format!("{e:#}")))?;
    DiskCostStore::open(
        &root,
        &config.database.name,
        config.database.schema_version,
    )
}
