use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

/// Creates the warehouse tables the inventory query reads, plus the
/// persisted discount catalog.
pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tbDimCategorias (
            dimID_Categoria INTEGER PRIMARY KEY,
            NombreSubLinea  TEXT,
            NombreCategoria TEXT
        );

        CREATE TABLE IF NOT EXISTS tbDimInventario (
            dimID_Inventario INTEGER PRIMARY KEY,
            Referencia       TEXT NOT NULL,
            CodigoMarca      TEXT NOT NULL,
            NombreMarca      TEXT,
            Nombre           TEXT,
            Fabricante       TEXT,
            NombreCategoria  TEXT,
            dimID_Categoria  INTEGER NOT NULL,
            FOREIGN KEY (dimID_Categoria) REFERENCES tbDimCategorias(dimID_Categoria)
        );

        CREATE TABLE IF NOT EXISTS tbDimTiendas (
            dimID_Tienda INTEGER PRIMARY KEY,
            Nombre       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tbHecInventario (
            dimid_inventario INTEGER NOT NULL,
            dimid_tienda     INTEGER NOT NULL,
            Existencia       REAL NOT NULL,
            PrecioDetal      REAL,
            PrecioPromocion  REAL,
            Promocion        INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (dimid_inventario) REFERENCES tbDimInventario(dimID_Inventario),
            FOREIGN KEY (dimid_tienda) REFERENCES tbDimTiendas(dimID_Tienda)
        );

        CREATE TABLE IF NOT EXISTS catalogo_descuento (
            Concatenar TEXT PRIMARY KEY,
            Descuento  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_hec_inventario_item
            ON tbHecInventario(dimid_inventario, dimid_tienda);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
