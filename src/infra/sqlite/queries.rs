use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value};
use tracing::{debug, info};

use crate::domain::entities::columns::{resolve_column, CATALOG_DISCOUNT, DISCOUNT, REFERENCE_KEY};
use crate::domain::entities::region::region_case_sql;
use crate::domain::entities::table::{CellValue, Table};
use crate::infra::sqlite::schema::{init_db, open_connection};

/// Flattened per-store inventory. Negative stock is discarded before
/// aggregation, and references without positive stock in any store are left
/// out entirely.
pub fn inventory_sql() -> String {
    let region = region_case_sql("dt.dimID_Tienda");
    format!(
        "
        WITH InvPorTienda AS (
            SELECT
                di.Referencia,
                di.CodigoMarca,
                di.Referencia || di.CodigoMarca AS Concatenar,
                di.NombreMarca,
                di.Nombre,
                di.Fabricante,
                dc.NombreSubLinea,
                di.NombreCategoria,
                dt.dimID_Tienda,
                dt.Nombre AS NombreTienda,
                {region} AS Region,
                SUM(hi.Existencia) AS Existencia,
                MAX(hi.PrecioDetal) AS PrecioDetal,
                MAX(hi.PrecioPromocion) AS PrecioPromocion,
                MAX(hi.Promocion) AS Promocion
            FROM tbDimInventario di
            JOIN tbHecInventario hi
                ON di.dimID_Inventario = hi.dimid_inventario
               AND hi.Existencia >= 0
            JOIN tbDimTiendas dt
                ON hi.dimid_tienda = dt.dimID_Tienda
            JOIN tbDimCategorias dc
                ON di.dimID_Categoria = dc.dimID_Categoria
            GROUP BY
                di.Referencia, di.CodigoMarca, di.NombreMarca, di.Nombre,
                di.Fabricante, dc.NombreSubLinea, di.NombreCategoria,
                dt.dimID_Tienda, dt.Nombre
        ),
        ReferenciasConPositivo AS (
            SELECT Referencia, CodigoMarca
            FROM InvPorTienda
            WHERE Existencia > 0
            GROUP BY Referencia, CodigoMarca
        )
        SELECT
            d.Concatenar,
            d.Referencia,
            d.CodigoMarca,
            d.NombreMarca,
            d.Nombre,
            d.Fabricante,
            d.NombreSubLinea,
            d.NombreCategoria,
            CAST(ROUND((1.0 - (d.PrecioPromocion / NULLIF(d.PrecioDetal, 0))) * 100, 0) AS INTEGER)
                || '%' AS Descuento,
            d.Promocion,
            d.Region,
            d.NombreTienda,
            d.dimID_Tienda,
            d.Existencia AS Existencia_Por_Tienda
        FROM InvPorTienda d
        JOIN ReferenciasConPositivo p
            ON p.Referencia = d.Referencia
           AND p.CodigoMarca = d.CodigoMarca
        ORDER BY d.Referencia, d.CodigoMarca, d.dimID_Tienda
        "
    )
}

pub fn fetch_inventory(db_path: &Path) -> Result<Table> {
    let conn = open_connection(db_path)?;
    let sql = inventory_sql();
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare inventory query")?;

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let rows_iter = stmt
        .query_map([], |row| {
            (0..width)
                .map(|idx| row.get::<_, Value>(idx).map(value_to_cell))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .context("failed to query inventory")?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.context("failed to read inventory row")?);
    }

    info!(db = %db_path.display(), rows = rows.len(), "inventory query finished");
    Ok(Table::from_rows(columns, rows))
}

fn value_to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Integer(v) => CellValue::Int(v),
        Value::Real(v) => CellValue::Float(v),
        Value::Text(v) => CellValue::Text(v),
        Value::Blob(v) => CellValue::Text(String::from_utf8_lossy(&v).into_owned()),
    }
}

/// Stores `catalog` as the only persisted catalog.
pub fn replace_catalog(db_path: &Path, catalog: &Table) -> Result<usize> {
    init_db(db_path)?;
    let key_idx = resolve_column(catalog, &[REFERENCE_KEY])
        .with_context(|| format!("catalog is missing column {REFERENCE_KEY}"))?;
    let discount_idx = resolve_column(catalog, &[CATALOG_DISCOUNT, DISCOUNT])
        .with_context(|| format!("catalog is missing column {DISCOUNT}"))?;

    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start catalog transaction")?;

    tx.execute("DELETE FROM catalogo_descuento", [])
        .context("failed to clear stored catalog")?;

    let mut insert_stmt = tx
        .prepare("INSERT OR IGNORE INTO catalogo_descuento(Concatenar, Descuento) VALUES (?1, ?2)")
        .context("failed to prepare catalog insert")?;

    let mut stored = 0_usize;
    for row in catalog.rows() {
        let Some(key) = row[key_idx].as_text() else {
            continue;
        };
        let discount = row[discount_idx].as_text().unwrap_or_default();
        stored += insert_stmt
            .execute(params![key, discount])
            .context("failed to insert catalog entry")?;
    }

    drop(insert_stmt);
    tx.commit().context("failed to commit catalog")?;
    debug!(stored, "catalog persisted");
    Ok(stored)
}

/// Returns `None` when no catalog has been stored yet. The table has the same
/// `Concatenar`/`Descuento` header as an imported catalog workbook.
pub fn load_catalog(db_path: &Path) -> Result<Option<Table>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare("SELECT Concatenar, Descuento FROM catalogo_descuento ORDER BY rowid ASC")
        .context("failed to prepare catalog query")?;

    let entries = stmt
        .query_map([], |row| {
            let key: String = row.get(0)?;
            let discount: String = row.get(1)?;
            Ok(vec![CellValue::Text(key), CellValue::Text(discount)])
        })
        .context("failed to query catalog")?;

    let mut rows = Vec::new();
    for entry in entries {
        rows.push(entry.context("failed to read catalog row")?);
    }

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(Table::from_rows(
        vec![REFERENCE_KEY.to_string(), DISCOUNT.to_string()],
        rows,
    )))
}
