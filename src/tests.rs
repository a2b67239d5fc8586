use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use crate::app::{view_status, ViewSnapshot};
use crate::domain::entities::columns::{
    BRANCH_PERCENT, BRANCH_TOTAL, CATALOG_DISCOUNT, DISCOUNT, DUPLICATE_TAG, GRAND_TOTAL,
    HQ_PERCENT, HQ_TOTAL, PROMOTION, QUANTITY, REFERENCE, REFERENCE_KEY, REGION,
};
use crate::domain::entities::filter::{FilterConfig, MatchMode, PivotMode};
use crate::domain::entities::table::{CellValue, Table};
use crate::infra::export::report::export_table_xlsx;
use crate::infra::import::reader::{read_catalog_file, read_inventory_file};
use crate::infra::import::xlsx::read_workbook_table;
use crate::infra::sqlite::queries::inventory_sql;
use crate::infra::sqlite::repo::{SqliteCatalogStore, SqliteInventorySource};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::source::{CatalogStore, InventorySource};
use crate::usecase::services::inventory_service::InventoryService;
use crate::*;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("existencias-{prefix}-{nanos}"))
}

/// One reference stocked at a headquarters and a branch, plus one reference
/// whose only stock is zero or negative.
fn seed_warehouse(db_path: &std::path::Path) {
    init_db(db_path).expect("init_db should succeed");
    let conn = Connection::open(db_path).expect("should open sqlite db");
    conn.execute(
        "INSERT INTO tbDimCategorias(dimID_Categoria, NombreSubLinea, NombreCategoria) VALUES (1, 'Filtros', 'Motor')",
        [],
    )
    .expect("should insert category");
    for (id, reference, brand) in [(10_i64, "A1", "B1"), (11, "A2", "B2")] {
        conn.execute(
            "INSERT INTO tbDimInventario(dimID_Inventario, Referencia, CodigoMarca, NombreMarca, Nombre, Fabricante, NombreCategoria, dimID_Categoria)
             VALUES (?1, ?2, ?3, 'Marca', 'Filtro de aceite', 'Fabricante', 'Motor', 1)",
            params![id, reference, brand],
        )
        .expect("should insert item");
    }
    for (id, name) in [(2003_i64, "Valencia"), (1002, "Barcelona")] {
        conn.execute(
            "INSERT INTO tbDimTiendas(dimID_Tienda, Nombre) VALUES (?1, ?2)",
            params![id, name],
        )
        .expect("should insert store");
    }
    let facts: [(i64, i64, f64, f64, f64, i64); 5] = [
        (10, 2003, 5.0, 100.0, 80.0, 1),
        (10, 1002, 3.0, 100.0, 80.0, 1),
        (10, 1002, -4.0, 100.0, 80.0, 1),
        (11, 2003, 0.0, 50.0, 50.0, 0),
        (11, 1002, -2.0, 50.0, 50.0, 0),
    ];
    for (item, store, quantity, retail, promo, flag) in facts {
        conn.execute(
            "INSERT INTO tbHecInventario(dimid_inventario, dimid_tienda, Existencia, PrecioDetal, PrecioPromocion, Promocion)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![item, store, quantity, retail, promo, flag],
        )
        .expect("should insert fact");
    }
}

fn number(table: &Table, row: usize, column: &str) -> f64 {
    table
        .cell(row, column)
        .and_then(CellValue::as_f64)
        .unwrap_or_else(|| panic!("{column} should be numeric"))
}

fn text(table: &Table, row: usize, column: &str) -> String {
    table
        .cell(row, column)
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[test]
fn init_db_creates_warehouse_and_catalog_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("inventario.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
             ('tbDimCategorias','tbDimInventario','tbDimTiendas','tbHecInventario','catalogo_descuento')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 5, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn inventory_query_drops_negative_and_stockless_references() {
    let temp_dir = unique_test_dir("source");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("inventario.sqlite");
    seed_warehouse(&db_path);

    let table = SqliteInventorySource::new(&db_path)
        .fetch_inventory()
        .expect("inventory query should succeed");

    assert_eq!(table.len(), 2, "only A1 has positive stock");
    assert_eq!(text(&table, 0, REFERENCE_KEY), "A1B1");
    assert_eq!(text(&table, 0, REGION), "Oriente - Sucursales");
    assert_eq!(number(&table, 0, QUANTITY), 3.0, "negative row is not summed");
    assert_eq!(text(&table, 1, REGION), "Valencia Casa Matriz");
    assert_eq!(text(&table, 1, DISCOUNT), "20%");
    assert_eq!(table.cell(1, PROMOTION), Some(&CellValue::Int(1)));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn inventory_query_embeds_every_region() {
    let sql = inventory_sql();

    assert!(sql.contains("THEN 'Margarita - Sucursales'"));
    assert!(sql.contains("ELSE 'Sin region' END AS Region"));
}

#[test]
fn unreadable_database_surfaces_as_source_error() {
    let temp_dir = unique_test_dir("bad-source");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("not-a-db.sqlite");
    fs::write(&db_path, "plain text, not sqlite").expect("should write fixture");

    let mut service = InventoryService::new();
    let result = service.load_from_database(&SqliteInventorySource::new(&db_path));

    assert!(matches!(result, Err(crate::error::InventoryError::Source(_))));
    assert!(!service.has_data());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn database_load_feeds_the_all_regions_pivot() {
    let temp_dir = unique_test_dir("pipeline");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("inventario.sqlite");
    seed_warehouse(&db_path);

    let mut service = InventoryService::new();
    let loaded = service
        .load_from_database(&SqliteInventorySource::new(&db_path))
        .expect("load should succeed");
    let view = service
        .apply_filters(&FilterConfig::default())
        .expect("pipeline should succeed")
        .expect("data is loaded")
        .clone();

    assert_eq!(loaded, 2);
    assert_eq!(view.len(), 1);
    assert_eq!(number(&view, 0, "Valencia Casa Matriz"), 5.0);
    assert_eq!(number(&view, 0, "Oriente - Sucursales"), 3.0);
    assert_eq!(number(&view, 0, HQ_TOTAL), 5.0);
    assert_eq!(number(&view, 0, BRANCH_TOTAL), 3.0);
    assert_eq!(number(&view, 0, GRAND_TOTAL), 8.0);
    assert_eq!(text(&view, 0, HQ_PERCENT), "62.5%");
    assert_eq!(text(&view, 0, BRANCH_PERCENT), "37.5%");
    assert_eq!(text(&view, 0, CATALOG_DISCOUNT), "");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn stored_catalog_round_trips_into_the_service() {
    let temp_dir = unique_test_dir("catalog-store");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("inventario.sqlite");
    seed_warehouse(&db_path);

    let mut service = InventoryService::new();
    service
        .load_from_database(&SqliteInventorySource::new(&db_path))
        .expect("load should succeed");
    let raw_catalog = Table::from_rows(
        vec!["Concatenar".to_string(), "% Descuento".to_string()],
        vec![vec!["A1B1".into(), "25".into()]],
    );
    service
        .load_discount_catalog(raw_catalog)
        .expect("catalog should be accepted");

    let store = SqliteCatalogStore::new(&db_path);
    let stored = store
        .save_catalog(service.discount_catalog().expect("catalog is loaded"))
        .expect("catalog should persist");
    let reloaded = store
        .load_catalog()
        .expect("catalog should load")
        .expect("catalog was stored");

    let mut fresh = InventoryService::new();
    fresh
        .load_from_database(&SqliteInventorySource::new(&db_path))
        .expect("load should succeed");
    fresh
        .load_discount_catalog(reloaded)
        .expect("stored catalog should be accepted");
    let config = FilterConfig {
        match_mode: MatchMode::MismatchOnly,
        ..FilterConfig::default()
    };
    let view = fresh
        .apply_filters(&config)
        .expect("pipeline should succeed")
        .expect("data is loaded");

    assert_eq!(stored, 1);
    assert_eq!(view.len(), 1, "20% own discount differs from 25% catalog");
    assert_eq!(text(view, 0, CATALOG_DISCOUNT), "25%");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn empty_catalog_store_loads_none() {
    let temp_dir = unique_test_dir("catalog-empty");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("inventario.sqlite");

    let loaded = SqliteCatalogStore::new(&db_path)
        .load_catalog()
        .expect("empty store should load");

    assert!(loaded.is_none());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn csv_import_derives_region_from_store_id() {
    let temp_dir = unique_test_dir("csv-import");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("existencias.csv");
    fs::write(
        &csv_path,
        "\u{feff}Referencia,CodigoMarca,dimID_Tienda,NombreTienda,Existencia_Por_Tienda,PorcentajeDescuento\n\
         A1,B1,2003,Valencia,5,10%\n\
         ,,,,,\n\
         A1,B1,1032,Porlamar,2,10%\n",
    )
    .expect("should write csv fixture");

    let table = read_inventory_file(&csv_path).expect("csv should import");
    let mut service = InventoryService::new();
    let loaded = service.load_from_spreadsheet(table);
    let view = service
        .apply_filters(&FilterConfig::default())
        .expect("pipeline should succeed")
        .expect("data is loaded");

    assert_eq!(loaded, 2, "blank record is skipped");
    assert_eq!(text(view, 0, REFERENCE_KEY), "A1B1");
    assert_eq!(text(view, 0, REFERENCE), "A1");
    assert_eq!(text(view, 0, DISCOUNT), "10%");
    assert_eq!(number(view, 0, "Margarita - Sucursales"), 2.0);
    assert_eq!(text(view, 0, HQ_PERCENT), "71.43%");
    assert_eq!(text(view, 0, BRANCH_PERCENT), "28.57%");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn catalog_csv_header_is_found_below_title_rows() {
    let temp_dir = unique_test_dir("catalog-csv");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("catalogo.csv");
    fs::write(
        &csv_path,
        "CATALOGO DE DESCUENTOS,\nVigente desde marzo,\nConcatenar,% Descuento\nA1B1,30\nFECHA,\n",
    )
    .expect("should write csv fixture");

    let table = read_catalog_file(&csv_path).expect("catalog should import");
    let mut service = InventoryService::new();
    let entries = service
        .load_discount_catalog(table)
        .expect("catalog should be accepted");

    assert_eq!(entries, 1, "title and junk rows are ignored");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn unsupported_extension_is_rejected() {
    let result = read_inventory_file(std::path::Path::new("inventario.pdf"));

    assert!(result.is_err());
}

#[test]
fn exported_view_omits_duplicate_tag() {
    let temp_dir = unique_test_dir("export");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("existencias.csv");
    fs::write(
        &csv_path,
        "Concatenar,Referencia,CodigoMarca,Region,Existencia_Por_Tienda,Descuento\n\
         A1B1,A1,B1,Valencia Casa Matriz,4,10%\n",
    )
    .expect("should write csv fixture");

    let mut service = InventoryService::new();
    service.load_from_spreadsheet(read_inventory_file(&csv_path).expect("csv should import"));
    let config = FilterConfig {
        highlight_duplicates: true,
        ..FilterConfig::default()
    };
    let view = service
        .apply_filters(&config)
        .expect("pipeline should succeed")
        .expect("data is loaded")
        .clone();
    let out_path = temp_dir.join("salida").join("vista.xlsx");
    export_table_xlsx(&view, &out_path).expect("export should succeed");

    let exported = read_workbook_table(&out_path).expect("should read export back");
    assert!(view.has_column(DUPLICATE_TAG));
    assert!(!exported.has_column(DUPLICATE_TAG));
    assert_eq!(
        &exported.columns()[..5],
        &[REFERENCE_KEY, REFERENCE, "CodigoMarca", DISCOUNT, CATALOG_DISCOUNT]
    );
    assert_eq!(exported.len(), 1);
    assert_eq!(text(&exported, 0, REFERENCE_KEY), "A1B1");
    assert_eq!(number(&exported, 0, GRAND_TOTAL), 4.0);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn headquarters_mode_measures_against_subset_total() {
    let base = Table::from_rows(
        vec![
            REFERENCE.to_string(),
            "CodigoMarca".to_string(),
            REGION.to_string(),
            QUANTITY.to_string(),
        ],
        vec![
            vec!["A1".into(), "B1".into(), "Valencia Casa Matriz".into(), CellValue::Float(3.0)],
            vec!["A2".into(), "B1".into(), "Oriente - Casa Matriz".into(), CellValue::Float(1.0)],
            vec!["A2".into(), "B1".into(), "Oriente - Sucursales".into(), CellValue::Float(9.0)],
        ],
    );
    let mut service = InventoryService::new();
    service.load_from_spreadsheet(base);
    let config = FilterConfig {
        pivot_mode: PivotMode::HeadquartersOnly,
        ..FilterConfig::default()
    };

    let view = service
        .apply_filters(&config)
        .expect("pipeline should succeed")
        .expect("data is loaded");

    assert_eq!(text(view, 0, HQ_PERCENT), "75%");
    assert_eq!(text(view, 1, HQ_PERCENT), "25%");
}

#[test]
fn store_view_status_notes_an_unapplied_region() {
    let base = Table::from_rows(
        vec![
            REFERENCE.to_string(),
            "CodigoMarca".to_string(),
            REGION.to_string(),
            "NombreTienda".to_string(),
            QUANTITY.to_string(),
        ],
        vec![
            vec!["A1".into(), "B1".into(), "Oriente - Sucursales".into(), "Cumana".into(), CellValue::Float(2.0)],
            vec!["A2".into(), "B1".into(), "Occidente - Sucursales".into(), "Maracaibo".into(), CellValue::Float(5.0)],
        ],
    );
    let mut service = InventoryService::new();
    service.load_from_spreadsheet(base);
    let config = FilterConfig {
        pivot_mode: PivotMode::BranchesOnly,
        region: "Oriente - Sucursales".to_string(),
        ..FilterConfig::default()
    };

    let view = service
        .apply_filters(&config)
        .expect("pipeline should succeed")
        .expect("data is loaded");
    let status = view_status(&config, view);

    assert!(!view.has_column(REGION));
    assert_eq!(view.len(), 2);
    assert!(status.starts_with("2 filas"));
    assert!(status.contains("Oriente - Sucursales"));

    let all_regions = FilterConfig {
        region: "Todas".to_string(),
        ..config
    };
    assert_eq!(view_status(&all_regions, view), "2 filas");
}

#[test]
fn view_snapshot_turns_duplicate_tag_into_row_flags() {
    let view = Table::from_rows(
        vec![REFERENCE_KEY.to_string(), DUPLICATE_TAG.to_string()],
        vec![
            vec!["A1B1".into(), CellValue::Bool(true)],
            vec!["A2B2".into(), CellValue::Bool(false)],
        ],
    );

    let snapshot = ViewSnapshot::from_table(&view);

    assert_eq!(snapshot.columns, vec![REFERENCE_KEY.to_string()]);
    assert_eq!(snapshot.duplicate_rows, vec![true, false]);
    assert_eq!(snapshot.rows[1], vec!["A2B2".to_string()]);
}

#[test]
fn format_helpers_trim_trailing_zeros() {
    assert_eq!(format_f64(3.0), "3");
    assert_eq!(format_f64(0.125), "0.125");
    assert_eq!(format_f64(f64::NAN), "");
    assert_eq!(safe_div(1.0, 0.0), 0.0);
    assert_eq!(format_percent(1.0, 3.0), "33.33%");
    assert_eq!(format_percent(0.0, 0.0), "0%");
    assert_eq!(format_percent(4.0, 4.0), "100%");
}
