use crate::domain::entities::table::Table;
use crate::error::InventoryError;

/// Producer of the flattened inventory fact table.
pub trait InventorySource: Send + Sync {
    fn fetch_inventory(&self) -> Result<Table, InventoryError>;
}

/// Persisted copy of the discount catalog.
pub trait CatalogStore: Send + Sync {
    fn save_catalog(&self, catalog: &Table) -> Result<usize, InventoryError>;
    fn load_catalog(&self) -> Result<Option<Table>, InventoryError>;
}
