use std::path::PathBuf;

use crate::domain::entities::table::Table;
use crate::error::InventoryError;
use crate::infra::sqlite::queries::{fetch_inventory, load_catalog, replace_catalog};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::source::{CatalogStore, InventorySource};

pub struct SqliteInventorySource {
    pub db_path: PathBuf,
}

impl SqliteInventorySource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl InventorySource for SqliteInventorySource {
    fn fetch_inventory(&self) -> Result<Table, InventoryError> {
        init_db(&self.db_path).map_err(|err| InventoryError::Source(format!("{err:#}")))?;
        fetch_inventory(&self.db_path).map_err(|err| InventoryError::Source(format!("{err:#}")))
    }
}

pub struct SqliteCatalogStore {
    pub db_path: PathBuf,
}

impl SqliteCatalogStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn save_catalog(&self, catalog: &Table) -> Result<usize, InventoryError> {
        replace_catalog(&self.db_path, catalog)
            .map_err(|err| InventoryError::Source(format!("{err:#}")))
    }

    fn load_catalog(&self) -> Result<Option<Table>, InventoryError> {
        load_catalog(&self.db_path).map_err(|err| InventoryError::Source(format!("{err:#}")))
    }
}
