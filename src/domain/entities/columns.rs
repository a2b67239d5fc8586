//! Canonical inventory column names and the tolerant column resolver.

use crate::domain::entities::table::Table;

pub const REFERENCE_KEY: &str = "Concatenar";
pub const REFERENCE: &str = "Referencia";
pub const BRAND_CODE: &str = "CodigoMarca";
pub const BRAND_NAME: &str = "NombreMarca";
pub const PRODUCT_NAME: &str = "Nombre";
pub const MANUFACTURER: &str = "Fabricante";
pub const SUBLINE: &str = "NombreSubLinea";
pub const CATEGORY: &str = "NombreCategoria";
pub const DISCOUNT: &str = "Descuento";
pub const PROMOTION: &str = "Promocion";
pub const REGION: &str = "Region";
pub const STORE_NAME: &str = "NombreTienda";
pub const STORE_ID: &str = "dimID_Tienda";
pub const QUANTITY: &str = "Existencia_Por_Tienda";

pub const HQ_TOTAL: &str = "Casa_Matriz_Total";
pub const BRANCH_TOTAL: &str = "Sucursal_Total";
pub const GRAND_TOTAL: &str = "Total_Existencia";
pub const HQ_PERCENT: &str = "Porcentaje_CasaMatriz";
pub const BRANCH_PERCENT: &str = "Porcentaje_Sucursales";
pub const NO_DATA_MARKER: &str = "Sin datos";

pub const CATALOG_DISCOUNT: &str = "Descuento_Catalogo";
pub const DUPLICATE_TAG: &str = "_dup_desc";

/// Descriptive columns carried into every pivot, in output order.
pub const DESCRIPTIVE_COLUMNS: [&str; 10] = [
    REFERENCE_KEY,
    REFERENCE,
    BRAND_CODE,
    BRAND_NAME,
    PRODUCT_NAME,
    MANUFACTURER,
    SUBLINE,
    CATEGORY,
    DISCOUNT,
    PROMOTION,
];

/// Historical spellings renamed to their canonical name on ingest.
pub const INGEST_ALIASES: [(&str, &str); 2] =
    [("concatenado", REFERENCE_KEY), ("PorcentajeDescuento", DISCOUNT)];

pub const SUBLINE_CANDIDATES: [&str; 6] = [
    SUBLINE,
    "NombreSublinea",
    "SubLinea",
    "Sub_Linea",
    "Sub Linea",
    "Sublinea",
];

pub const YEAR_CANDIDATES: [&str; 5] = ["Año", "Anio", "Ano", "Year", "Periodo"];

pub const DATE_CANDIDATES: [&str; 6] = [
    "Fecha",
    "FechaIngreso",
    "FechaCreacion",
    "Fecha_Creacion",
    "FechaAlta",
    "Date",
];

pub const CATALOG_KEY_CANDIDATES: [&str; 1] = [REFERENCE_KEY];
pub const CATALOG_DISCOUNT_CANDIDATES: [&str; 2] = ["% Descuento", DISCOUNT];

/// Finds the first candidate present in `table`, comparing names
/// case-insensitively after trimming. Candidates are tried in order, so the
/// list doubles as a priority.
pub fn resolve_column(table: &Table, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        let wanted = candidate.trim().to_lowercase();
        table
            .columns()
            .iter()
            .position(|column| column.trim().to_lowercase() == wanted)
    })
}

/// Same as [`resolve_column`] but returns the column's actual name.
pub fn resolve_column_name(table: &Table, candidates: &[&str]) -> Option<String> {
    resolve_column(table, candidates).map(|idx| table.columns()[idx].clone())
}
