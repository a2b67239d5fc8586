use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::domain::entities::columns::{DUPLICATE_TAG, REFERENCE_KEY, REGION};
use crate::domain::entities::filter::{DuplicateMode, FilterConfig, PivotMode};
use crate::domain::entities::table::{CellValue, Table};
use crate::infra::export::report::{
    export_column_reports, export_combined_report, export_table_xlsx,
};
use crate::infra::import::reader::{read_catalog_file, read_inventory_file};
use crate::infra::sqlite::repo::{SqliteCatalogStore, SqliteInventorySource};
use crate::infra::sqlite::schema::init_db;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::{filter_config_from_inputs, AppState};
use crate::usecase::ports::source::CatalogStore;
use crate::usecase::services::inventory_service::InventoryService;
use crate::usecase::services::pivot_service::location_columns;

const COMBINED_REPORT_FILE: &str = "reporte_combinado.csv";
const VIEW_EXPORT_FILE: &str = "existencias.xlsx";

/// Grid data shown in the table. The duplicate tag becomes a per-row flag
/// instead of a visible column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub duplicate_rows: Vec<bool>,
}

impl ViewSnapshot {
    pub fn from_table(view: &Table) -> Self {
        let duplicate_rows = match view.column_index(DUPLICATE_TAG) {
            Some(idx) => view
                .rows()
                .iter()
                .map(|row| row[idx] == CellValue::Bool(true))
                .collect(),
            None => vec![false; view.len()],
        };
        let mut visible = view.clone();
        visible.drop_column(DUPLICATE_TAG);
        Self {
            columns: visible.columns().to_vec(),
            rows: visible.to_string_rows(),
            duplicate_rows,
        }
    }
}

/// Status line for a refreshed view. Notes when the selected region could not
/// narrow it because the view carries no `Region` column.
pub fn view_status(config: &FilterConfig, view: &Table) -> String {
    let rows = format!("{} filas", view.len());
    match (config.pivot_mode, config.active_region()) {
        (PivotMode::BranchesOnly, Some(region)) if !view.has_column(REGION) => {
            format!("{rows} (la vista por tienda no filtra por región \"{region}\")")
        }
        _ => rows,
    }
}

fn show_snapshot(mut state: AppState, snapshot: ViewSnapshot, status: String) {
    state.columns.set(snapshot.columns);
    state.rows.set(snapshot.rows);
    state.duplicate_rows.set(snapshot.duplicate_rows);
    state.status.set(status);
}

fn refresh_view(service: &RefCell<InventoryService>, mut state: AppState) {
    let config = filter_config_from_inputs(&state);
    let result = service
        .borrow_mut()
        .apply_filters(&config)
        .map(|view| view.map(|view| (ViewSnapshot::from_table(view), view_status(&config, view))));
    match result {
        Ok(Some((snapshot, status))) => show_snapshot(state, snapshot, status),
        Ok(None) => state
            .status
            .set("Cargue datos desde la base de datos o una hoja de cálculo".to_string()),
        Err(err) => {
            error!("view refresh failed: {err}");
            state.status.set(format!("Error al aplicar filtros: {err}"));
        }
    }
}

fn sync_options(service: &RefCell<InventoryService>, mut state: AppState) {
    let service = service.borrow();
    state.region_options.set(service.region_options());
    state.brand_options.set(service.brand_options());
}

/// Re-applies the stored catalog after a dataset load cleared it.
fn restore_catalog(service: &RefCell<InventoryService>, store: &dyn CatalogStore) -> Option<usize> {
    match store.load_catalog() {
        Ok(Some(catalog)) => match service.borrow_mut().load_discount_catalog(catalog) {
            Ok(entries) => Some(entries),
            Err(err) => {
                warn!("stored discount catalog rejected: {err}");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!("failed to read stored discount catalog: {err}");
            None
        }
    }
}

fn table_container_style() -> &'static str {
    "overflow: auto; max-height: calc(100vh - 260px); border: 1px solid #ccc;"
}

fn table_header_cell_style() -> &'static str {
    "border: 1px solid #bbb; padding: 4px 8px; background: #f3f3f3; position: sticky; top: 0; white-space: nowrap;"
}

#[component]
pub fn App() -> Element {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            return rsx! {
                div {
                    p { "No se pudo resolver la configuración: {err}" }
                }
            };
        }
    };

    let state = AppState::new();
    let AppState {
        mut pivot_mode,
        mut region,
        mut reference,
        mut brand,
        mut exclude_brands,
        mut exclude_default_brands,
        mut exclude_sublines,
        mut exclude_year,
        mut promo_only,
        mut match_only,
        mut mismatch_only,
        mut highlight_duplicates,
        region_options,
        brand_options,
        columns,
        rows,
        duplicate_rows,
        mut busy,
        mut status,
    } = state;

    let service = use_hook(|| Rc::new(RefCell::new(InventoryService::new())));
    let db_path = Arc::new(config.db_path.clone());
    let export_dir = Arc::new(config.export_dir.clone());

    let db_path_for_init = db_path.clone();
    use_effect(move || {
        if let Err(err) = run_blocking(|| init_db(&db_path_for_init)) {
            error!("database initialization failed: {err:#}");
            *status.write() = format!("No se pudo preparar la base de datos: {err}");
        }
    });

    let service_for_refresh = service.clone();
    let refresh = Rc::new(move || refresh_view(&service_for_refresh, state));

    let service_for_db = service.clone();
    let db_path_for_load = db_path.clone();
    let refresh_for_db = refresh.clone();
    let mut handle_load_database = move || {
        *busy.write() = true;
        *status.write() = "Consultando la base de datos...".to_string();
        let source = SqliteInventorySource::new((*db_path_for_load).clone());
        let store = SqliteCatalogStore::new((*db_path_for_load).clone());
        let result = run_blocking(|| service_for_db.borrow_mut().load_from_database(&source));
        match result {
            Ok(row_count) => {
                let catalog = run_blocking(|| restore_catalog(&service_for_db, &store));
                sync_options(&service_for_db, state);
                refresh_for_db();
                let catalog_note = catalog
                    .map(|entries| format!(", catálogo restaurado ({entries})"))
                    .unwrap_or_default();
                *status.write() = format!("{row_count} registros cargados{catalog_note}");
            }
            Err(err) => {
                error!("database load failed: {err}");
                *status.write() = format!("Error al cargar la base de datos: {err}");
            }
        }
        *busy.write() = false;
    };

    let service_for_import = service.clone();
    let refresh_for_import = refresh.clone();
    let mut handle_import_sheet = move || {
        let Some(file_path) = FileDialog::new()
            .add_filter("Excel", &["xlsx", "xls", "ods"])
            .add_filter("CSV", &["csv"])
            .add_filter("Todos los archivos", &["*"])
            .pick_file()
        else {
            return;
        };

        if service_for_import.borrow().has_data() {
            let confirm = MessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title("Importar hoja")
                .set_description("Se reemplazarán los datos cargados y el catálogo de descuentos. ¿Continuar?")
                .set_buttons(MessageButtons::YesNo)
                .show();
            if confirm != MessageDialogResult::Yes {
                return;
            }
        }

        *busy.write() = true;
        *status.write() = format!("Importando {}", file_path.display());
        match run_blocking(|| read_inventory_file(&file_path)) {
            Ok(table) => {
                let row_count = service_for_import.borrow_mut().load_from_spreadsheet(table);
                sync_options(&service_for_import, state);
                refresh_for_import();
                *status.write() = format!("{row_count} registros importados");
            }
            Err(err) => {
                error!("spreadsheet import failed: {err:#}");
                *status.write() = format!("Error al importar: {err}");
            }
        }
        *busy.write() = false;
    };

    let service_for_catalog = service.clone();
    let db_path_for_catalog = db_path.clone();
    let refresh_for_catalog = refresh.clone();
    let mut handle_load_catalog = move || {
        let Some(file_path) = FileDialog::new()
            .add_filter("Excel", &["xlsx", "xls", "ods"])
            .add_filter("CSV", &["csv"])
            .pick_file()
        else {
            return;
        };

        *busy.write() = true;
        let store = SqliteCatalogStore::new((*db_path_for_catalog).clone());
        let result = run_blocking(|| -> anyhow::Result<usize> {
            let table = read_catalog_file(&file_path)?;
            let entries = service_for_catalog.borrow_mut().load_discount_catalog(table)?;
            if let Some(catalog) = service_for_catalog.borrow().discount_catalog() {
                if let Err(err) = store.save_catalog(catalog) {
                    warn!("discount catalog not persisted: {err}");
                }
            }
            Ok(entries)
        });
        match result {
            Ok(entries) => {
                refresh_for_catalog();
                *status.write() = format!("Catálogo de descuentos cargado ({entries} referencias)");
            }
            Err(err) => {
                error!("catalog load failed: {err:#}");
                *status.write() = format!("Error en el catálogo: {err}");
            }
        }
        *busy.write() = false;
    };

    let service_for_unique = service.clone();
    let refresh_for_unique = refresh.clone();
    let service_for_duplicates = service.clone();
    let refresh_for_duplicates = refresh.clone();

    let service_for_export = service.clone();
    let export_dir_for_view = export_dir.clone();
    let mut handle_export_view = move || {
        let Some(view) = service_for_export.borrow().current_view().cloned() else {
            *status.write() = "No hay datos para exportar".to_string();
            return;
        };
        let Some(path) = FileDialog::new()
            .set_directory(export_dir_for_view.as_path())
            .set_file_name(VIEW_EXPORT_FILE)
            .add_filter("Excel", &["xlsx"])
            .save_file()
        else {
            return;
        };
        *busy.write() = true;
        match run_blocking(|| export_table_xlsx(&view, &path)) {
            Ok(path) => *status.write() = format!("Exportado a {}", path.display()),
            Err(err) => {
                error!("view export failed: {err}");
                *status.write() = format!("Error al exportar: {err}");
            }
        }
        *busy.write() = false;
    };

    let service_for_reports = service.clone();
    let export_dir_for_reports = export_dir.clone();
    let mut handle_export_reports = move || {
        let Some(view) = service_for_reports.borrow().current_view().cloned() else {
            *status.write() = "No hay datos para exportar".to_string();
            return;
        };
        let Some(dir) = FileDialog::new()
            .set_directory(export_dir_for_reports.as_path())
            .pick_folder()
        else {
            return;
        };
        *busy.write() = true;
        let result = run_blocking(|| -> anyhow::Result<(Vec<PathBuf>, PathBuf)> {
            let keys = vec![REFERENCE_KEY.to_string()];
            let data_columns = location_columns(&view);
            let reports = export_column_reports(&view, &keys, &data_columns, &dir)
                .context("per-column reports")?;
            let mut combined_columns = keys;
            combined_columns.extend(data_columns);
            let combined =
                export_combined_report(&view, &combined_columns, &dir.join(COMBINED_REPORT_FILE))
                    .context("combined report")?;
            Ok((reports, combined))
        });
        match result {
            Ok((reports, _combined)) => {
                *status.write() = format!(
                    "{} reportes exportados en {}",
                    reports.len() + 1,
                    dir.display()
                );
            }
            Err(err) => {
                error!("report export failed: {err:#}");
                *status.write() = format!("Error al exportar reportes: {err:#}");
            }
        }
        *busy.write() = false;
    };

    let refresh_for_apply = refresh.clone();
    let refresh_for_mode = refresh.clone();

    let current_mode = pivot_mode();
    let region_enabled = current_mode == PivotMode::BranchesOnly;
    let table_columns = columns();
    let table_rows = rows();
    let duplicate_flags = duplicate_rows();

    rsx! {
        div {
            style: "font-family: 'Segoe UI', sans-serif; padding: 12px; background: #fff; min-height: 100vh; height: 100vh; overflow: auto;",

            h2 { "Existencias por Región" }

            div {
                style: "display: flex; gap: 8px; align-items: center; margin-bottom: 12px; flex-wrap: wrap;",
                button { disabled: busy(), onclick: move |_| handle_load_database(), "Cargar base de datos" }
                button { disabled: busy(), onclick: move |_| handle_import_sheet(), "Importar hoja" }
                button { disabled: busy(), onclick: move |_| handle_load_catalog(), "Cargar catálogo" }
                button { disabled: busy(), onclick: move |_| handle_export_view(), "Exportar Excel" }
                button { disabled: busy(), onclick: move |_| handle_export_reports(), "Exportar reportes" }
            }

            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 8px; flex-wrap: wrap;",
                label { "Modo "
                    select {
                        onchange: move |event| {
                            pivot_mode.set(PivotMode::from_label(&event.value()).unwrap_or_default());
                            refresh_for_mode();
                        },
                        {PivotMode::ALL_MODES.iter().map(|mode| {
                            let label = mode.label();
                            rsx!( option { value: "{label}", selected: *mode == current_mode, "{label}" } )
                        })}
                    }
                }
                label { "Región "
                    select {
                        disabled: !region_enabled,
                        onchange: move |event| region.set(event.value()),
                        {region_options().into_iter().map(|choice| {
                            let selected = choice == region();
                            rsx!( option { value: "{choice}", selected: selected, "{choice}" } )
                        })}
                    }
                }
                label { "Referencia "
                    input {
                        value: "{reference}",
                        placeholder: "Referencia",
                        oninput: move |event| reference.set(event.value()),
                    }
                }
                label { "Marca "
                    input {
                        list: "marcas",
                        value: "{brand}",
                        oninput: move |event| brand.set(event.value()),
                    }
                    datalist { id: "marcas",
                        {brand_options().into_iter().map(|code| rsx!( option { value: "{code}" } ))}
                    }
                }
            }

            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 8px; flex-wrap: wrap;",
                label { "Excluir marcas "
                    input {
                        value: "{exclude_brands}",
                        placeholder: "ABC, XYZ",
                        oninput: move |event| exclude_brands.set(event.value()),
                    }
                }
                label {
                    input {
                        r#type: "checkbox",
                        checked: exclude_default_brands(),
                        onclick: move |_| {
                            let next = !exclude_default_brands();
                            exclude_default_brands.set(next);
                        }
                    }
                    " Excluir GRD, DNE, DIE"
                }
                label { "Excluir sublíneas "
                    input {
                        value: "{exclude_sublines}",
                        oninput: move |event| exclude_sublines.set(event.value()),
                    }
                }
                label { "Excluir año "
                    input {
                        style: "width: 70px;",
                        value: "{exclude_year}",
                        oninput: move |event| exclude_year.set(event.value()),
                    }
                }
            }

            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 12px; flex-wrap: wrap;",
                label {
                    input {
                        r#type: "checkbox",
                        checked: promo_only(),
                        onclick: move |_| {
                            let next = !promo_only();
                            promo_only.set(next);
                        }
                    }
                    " Solo promoción"
                }
                label {
                    input {
                        r#type: "checkbox",
                        checked: match_only(),
                        onclick: move |_| {
                            let next = !match_only();
                            match_only.set(next);
                        }
                    }
                    " Descuento coincide"
                }
                label {
                    input {
                        r#type: "checkbox",
                        checked: mismatch_only(),
                        onclick: move |_| {
                            let next = !mismatch_only();
                            mismatch_only.set(next);
                        }
                    }
                    " Descuento no coincide"
                }
                label {
                    input {
                        r#type: "checkbox",
                        checked: highlight_duplicates(),
                        onclick: move |_| {
                            let next = !highlight_duplicates();
                            highlight_duplicates.set(next);
                        }
                    }
                    " Resaltar duplicados"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| refresh_for_apply(),
                    "Aplicar filtros"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        service_for_unique.borrow_mut().set_duplicate_mode(DuplicateMode::UniqueOnly);
                        highlight_duplicates.set(true);
                        refresh_for_unique();
                    },
                    "Solo únicos"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        service_for_duplicates.borrow_mut().set_duplicate_mode(DuplicateMode::DuplicatesOnly);
                        highlight_duplicates.set(true);
                        refresh_for_duplicates();
                    },
                    "Solo duplicados"
                }
            }

            div { style: "margin-bottom: 8px; color: #555;", "{status}" }

            div {
                style: "{table_container_style()}",
                table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                    thead {
                        tr {
                            for header in table_columns.iter() {
                                th { style: "{table_header_cell_style()}", "{header}" }
                            }
                        }
                    }
                    tbody {
                        {table_rows.iter().enumerate().map(|(row_idx, row)| {
                            let is_duplicate = duplicate_flags.get(row_idx).copied().unwrap_or(false);
                            let row_style = if is_duplicate { "background: #fff3cd;" } else { "" };
                            let row = row.clone();
                            rsx!(
                                tr {
                                    style: "{row_style}",
                                    for value in row.iter() {
                                        td { style: "border: 1px solid #ddd; padding: 4px 8px; white-space: nowrap;", "{value}" }
                                    }
                                }
                            )
                        })}
                    }
                }
            }
        }
    }
}
