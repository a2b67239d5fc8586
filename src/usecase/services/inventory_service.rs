use std::borrow::Cow;
use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::entities::columns::{
    resolve_column, CATALOG_DISCOUNT, CATALOG_DISCOUNT_CANDIDATES, CATALOG_KEY_CANDIDATES,
    BRAND_CODE, DISCOUNT, DUPLICATE_TAG, INGEST_ALIASES, PROMOTION, REFERENCE, REFERENCE_KEY,
    REGION, STORE_ID,
};
use crate::domain::entities::filter::{DuplicateMode, FilterConfig, MatchMode, PivotMode, ALL_REGIONS};
use crate::domain::entities::region::{is_branch, region_for_store};
use crate::domain::entities::table::{CellValue, Table};
use crate::error::{InventoryError, Result};
use crate::usecase::ports::source::InventorySource;
use crate::usecase::services::filter_service::apply_filters;
use crate::usecase::services::pivot_service::PivotService;
use crate::usecase::services::year_filter::exclude_year;

/// Catalog keys that are notes or section titles rather than references.
const CATALOG_JUNK_KEYS: [&str; 7] = [
    "CREACION",
    "FECHA",
    "MARGARITA",
    "VALENCIA",
    "MARACAIBO",
    "NAN",
    "NONE",
];

/// Owns the loaded dataset and drives pivot, filters and enrichment.
#[derive(Debug, Default)]
pub struct InventoryService {
    base: Option<Table>,
    catalog: Option<Table>,
    duplicate_mode: Option<DuplicateMode>,
    pivot_service: PivotService,
    last_excluded_year: Option<i32>,
    current_view: Option<Table>,
}

impl InventoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dataset with the source's rows. On error nothing changes.
    pub fn load_from_database(&mut self, source: &dyn InventorySource) -> Result<usize> {
        let table = source.fetch_inventory()?;
        Ok(self.replace_base(table, "database"))
    }

    pub fn load_from_spreadsheet(&mut self, table: Table) -> usize {
        self.replace_base(table, "spreadsheet")
    }

    fn replace_base(&mut self, table: Table, origin: &str) -> usize {
        let table = normalize_inventory(table);
        let rows = table.len();
        info!(origin, rows, columns = table.columns().len(), "inventory loaded");
        self.base = Some(table);
        self.catalog = None;
        self.duplicate_mode = None;
        self.pivot_service.clear();
        self.last_excluded_year = None;
        self.current_view = None;
        rows
    }

    /// Validates and stores the discount catalog, replacing any previous one.
    pub fn load_discount_catalog(&mut self, table: Table) -> Result<usize> {
        let catalog = build_catalog(table)?;
        let entries = catalog.len();
        info!(entries, "discount catalog loaded");
        self.catalog = Some(catalog);
        Ok(entries)
    }

    pub fn discount_catalog(&self) -> Option<&Table> {
        self.catalog.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.base.is_some()
    }

    pub fn base(&self) -> Option<&Table> {
        self.base.as_ref()
    }

    pub fn current_view(&self) -> Option<&Table> {
        self.current_view.as_ref()
    }

    pub fn clear_cache(&mut self) {
        self.pivot_service.clear();
    }

    pub fn duplicate_mode(&self) -> Option<DuplicateMode> {
        self.duplicate_mode
    }

    /// Tri-state toggle: selecting the active mode again turns it off.
    pub fn set_duplicate_mode(&mut self, mode: DuplicateMode) {
        self.duplicate_mode = if self.duplicate_mode == Some(mode) {
            None
        } else {
            Some(mode)
        };
        debug!(mode = ?self.duplicate_mode, "duplicate mode changed");
    }

    /// `Todas` followed by every branch region of the loaded dataset.
    pub fn region_options(&self) -> Vec<String> {
        let mut options = vec![ALL_REGIONS.to_string()];
        if let Some(base) = &self.base {
            options.extend(
                base.distinct_text(REGION)
                    .into_iter()
                    .filter(|region| is_branch(region)),
            );
        }
        options
    }

    pub fn brand_options(&self) -> Vec<String> {
        self.base
            .as_ref()
            .map(|base| base.distinct_text(BRAND_CODE))
            .unwrap_or_default()
    }

    pub fn reference_options(&self) -> Vec<String> {
        self.base
            .as_ref()
            .map(|base| base.distinct_text(REFERENCE))
            .unwrap_or_default()
    }

    /// Runs the full view pipeline. Returns `Ok(None)` while nothing is loaded.
    pub fn apply_filters(&mut self, config: &FilterConfig) -> Result<Option<&Table>> {
        let Some(base) = self.base.as_ref() else {
            return Ok(None);
        };
        let mode = config.pivot_mode;

        // A different excluded year changes group membership, so every cached
        // pivot is stale.
        if config.exclude_year != self.last_excluded_year {
            debug!(
                previous = ?self.last_excluded_year,
                next = ?config.exclude_year,
                "excluded year changed"
            );
            self.pivot_service.clear();
            self.last_excluded_year = config.exclude_year;
        }

        let pivot = if self.pivot_service.is_cached(mode) {
            self.pivot_service.get_pivot(mode, base)?
        } else {
            let prepared = prepare_base(base, mode, config.exclude_year);
            self.pivot_service.get_pivot(mode, &prepared)?
        };

        let mut view = apply_filters(pivot, config).into_owned();
        merge_catalog(&mut view, self.catalog.as_ref());
        filter_by_match(&mut view, config.match_mode);
        normalize_promotion(&mut view);
        tag_duplicates(&mut view, config.highlight_duplicates);
        if let Some(mode) = config.duplicate_mode.or(self.duplicate_mode) {
            narrow_duplicates(&mut view, mode);
        }

        debug!(rows = view.len(), "view refreshed");
        self.current_view = Some(view);
        Ok(self.current_view.as_ref())
    }
}

/// Trims headers, applies historical aliases and derives `Region` from the
/// store id when the producer did not supply it.
pub fn normalize_inventory(mut table: Table) -> Table {
    table.trim_column_names();
    for (alias, canonical) in INGEST_ALIASES {
        if !table.has_column(canonical) {
            table.rename_column(alias, canonical);
        }
    }

    if !table.has_column(REGION) {
        if let Some(store_idx) = table.column_index(STORE_ID) {
            let regions = table
                .rows()
                .iter()
                .map(|row| match row[store_idx].as_f64() {
                    Some(id) => CellValue::text(region_for_store(id as i64)),
                    None => CellValue::Null,
                })
                .collect();
            table.set_column(REGION, regions);
        }
    }
    table
}

/// Restricts to the mode's region subset and applies the year exclusion.
fn prepare_base(base: &Table, mode: PivotMode, exclude: Option<i32>) -> Cow<'_, Table> {
    let narrowed = match (mode, base.column_index(REGION)) {
        (PivotMode::All, _) | (_, None) => Cow::Borrowed(base),
        (_, Some(idx)) => Cow::Owned(base.filter_rows(|row| {
            row[idx]
                .as_text()
                .map(|region| mode.includes_region(&region))
                .unwrap_or(false)
        })),
    };
    match exclude {
        Some(year) => exclude_year(narrowed, year),
        None => narrowed,
    }
}

fn build_catalog(mut table: Table) -> Result<Table> {
    table.trim_column_names();
    let key_idx = resolve_column(&table, &CATALOG_KEY_CANDIDATES);
    let discount_idx = resolve_column(&table, &CATALOG_DISCOUNT_CANDIDATES);
    let (Some(key_idx), Some(discount_idx)) = (key_idx, discount_idx) else {
        return Err(InventoryError::Validation(format!(
            "discount catalog must contain the columns '{}' and '{}'",
            CATALOG_KEY_CANDIDATES[0], CATALOG_DISCOUNT_CANDIDATES[0]
        )));
    };

    let mut catalog = Table::new(vec![REFERENCE_KEY.to_string(), CATALOG_DISCOUNT.to_string()]);
    let mut seen = std::collections::HashSet::new();
    for row in table.rows() {
        let key = row[key_idx].as_text().unwrap_or_default().trim().to_string();
        if key.is_empty() || CATALOG_JUNK_KEYS.contains(&key.to_uppercase().as_str()) {
            continue;
        }
        if !seen.insert(key.clone()) {
            continue;
        }
        catalog.push_row(vec![CellValue::Text(key), row[discount_idx].clone()]);
    }
    Ok(catalog)
}

/// Left-joins catalog discounts onto the view next to `Descuento`.
fn merge_catalog(view: &mut Table, catalog: Option<&Table>) {
    let key_idx = view.column_index(REFERENCE_KEY);
    let own_idx = view.column_index(DISCOUNT);

    let values: Vec<CellValue> = match (catalog, key_idx) {
        (Some(catalog), Some(key_idx)) => {
            let lookup: HashMap<String, &CellValue> = catalog
                .rows()
                .iter()
                .filter_map(|row| row[0].as_text().map(|key| (key, &row[1])))
                .collect();
            view.rows()
                .iter()
                .map(|row| {
                    let key = row[key_idx].as_text().unwrap_or_default();
                    let merged = lookup
                        .get(key.trim())
                        .copied()
                        .filter(|value| !is_missing(value))
                        .cloned()
                        .or_else(|| own_idx.map(|idx| row[idx].clone()))
                        .unwrap_or(CellValue::Null);
                    format_discount(merged)
                })
                .collect()
        }
        _ => vec![CellValue::text(""); view.len()],
    };

    view.set_column(CATALOG_DISCOUNT, values);
    view.move_column_after(CATALOG_DISCOUNT, DISCOUNT);
}

fn is_missing(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Float(number) => number.is_nan(),
        CellValue::Text(text) => {
            let text = text.trim();
            text.is_empty() || text.eq_ignore_ascii_case("nan")
        }
        _ => false,
    }
}

/// Numeric discounts become `"NN%"`; anything else is left as it was.
fn format_discount(value: CellValue) -> CellValue {
    let number = match &value {
        CellValue::Int(number) => Some(*number as f64),
        CellValue::Float(number) if number.is_finite() => Some(*number),
        CellValue::Text(text) => text.replace('%', "").trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(number) => CellValue::Text(format!("{}%", number.round_ties_even() as i64)),
        None => value,
    }
}

fn filter_by_match(view: &mut Table, mode: MatchMode) {
    if mode == MatchMode::None {
        return;
    }
    let own_idx = view.column_index(DISCOUNT);
    let catalog_idx = view.column_index(CATALOG_DISCOUNT);
    view.retain_rows(|row| {
        let own = own_idx.and_then(|idx| row[idx].as_text());
        let catalog = catalog_idx.and_then(|idx| row[idx].as_text());
        let matches = matches!((&own, &catalog), (Some(own), Some(catalog)) if own == catalog);
        match mode {
            MatchMode::MatchOnly => matches,
            MatchMode::MismatchOnly => !matches,
            MatchMode::None => true,
        }
    });
}

fn normalize_promotion(view: &mut Table) {
    let Some(idx) = view.column_index(PROMOTION) else {
        return;
    };
    let values = view
        .rows()
        .iter()
        .map(|row| promotion_flag(&row[idx]).unwrap_or_else(|| row[idx].clone()))
        .collect();
    view.set_column(PROMOTION, values);
}

fn promotion_flag(cell: &CellValue) -> Option<CellValue> {
    let flag = match cell {
        CellValue::Bool(flag) => *flag,
        CellValue::Int(0) => false,
        CellValue::Int(1) => true,
        CellValue::Float(number) if *number == 0.0 => false,
        CellValue::Float(number) if *number == 1.0 => true,
        CellValue::Text(text) => match text.trim() {
            "True" | "true" | "1" => true,
            "False" | "false" | "0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(CellValue::Int(i64::from(flag)))
}

/// Tags rows sharing a (`Concatenar`, `Descuento`) pair with another row.
fn tag_duplicates(view: &mut Table, highlight: bool) {
    let key_idx = view.column_index(REFERENCE_KEY);
    let own_idx = view.column_index(DISCOUNT);
    let tags = match (highlight, key_idx, own_idx) {
        (true, Some(key_idx), Some(own_idx)) => {
            let pair = |row: &[CellValue]| (row[key_idx].as_text(), row[own_idx].as_text());
            let mut counts: HashMap<(Option<String>, Option<String>), usize> = HashMap::new();
            for row in view.rows() {
                *counts.entry(pair(row.as_slice())).or_default() += 1;
            }
            view.rows()
                .iter()
                .map(|row| {
                    CellValue::Bool(counts.get(&pair(row.as_slice())).copied().unwrap_or(0) > 1)
                })
                .collect()
        }
        _ => vec![CellValue::Bool(false); view.len()],
    };
    view.set_column(DUPLICATE_TAG, tags);
}

fn narrow_duplicates(view: &mut Table, mode: DuplicateMode) {
    let Some(idx) = view.column_index(DUPLICATE_TAG) else {
        return;
    };
    let keep_duplicates = mode == DuplicateMode::DuplicatesOnly;
    view.retain_rows(|row| (row[idx] == CellValue::Bool(true)) == keep_duplicates);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::columns::{GRAND_TOTAL, QUANTITY, STORE_NAME};

    struct FixedSource(Result<Table, String>);

    impl InventorySource for FixedSource {
        fn fetch_inventory(&self) -> Result<Table> {
            self.0.clone().map_err(InventoryError::Source)
        }
    }

    fn inventory(rows: &[(&str, &str, &str, f64, &str)]) -> Table {
        let columns = [REFERENCE, BRAND_CODE, REGION, STORE_NAME, QUANTITY, DISCOUNT]
            .iter()
            .map(|c| c.to_string())
            .collect();
        Table::from_rows(
            columns,
            rows.iter()
                .map(|(reference, brand, region, qty, discount)| {
                    vec![
                        CellValue::from(*reference),
                        CellValue::from(*brand),
                        CellValue::from(*region),
                        CellValue::from("Tienda"),
                        CellValue::Float(*qty),
                        CellValue::from(*discount),
                    ]
                })
                .collect(),
        )
    }

    fn catalog(rows: &[(&str, &str)]) -> Table {
        Table::from_rows(
            vec![" Concatenar ".to_string(), "% Descuento".to_string()],
            rows.iter()
                .map(|(key, discount)| vec![CellValue::from(*key), CellValue::from(*discount)])
                .collect(),
        )
    }

    fn column_text(table: &Table, column: &str) -> Vec<String> {
        (0..table.len())
            .map(|row| table.cell(row, column).map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn nothing_loaded_returns_none() {
        let mut service = InventoryService::new();
        let view = service
            .apply_filters(&FilterConfig::default())
            .expect("should not fail");
        assert!(view.is_none());
    }

    #[test]
    fn catalog_miss_falls_back_to_own_discount_and_counts_as_match() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[("A1", "B1", "Valencia Casa Matriz", 5.0, "10%")]));
        service
            .load_discount_catalog(catalog(&[("ZZ99", "40")]))
            .expect("catalog should load");

        let config = FilterConfig {
            match_mode: MatchMode::MatchOnly,
            ..FilterConfig::default()
        };
        let view = service
            .apply_filters(&config)
            .expect("pipeline should succeed")
            .expect("data is loaded");

        assert_eq!(view.len(), 1);
        assert_eq!(column_text(view, CATALOG_DISCOUNT), vec!["10%"]);
        let discount_idx = view.column_index(DISCOUNT).expect("discount column");
        assert_eq!(view.columns()[discount_idx + 1], CATALOG_DISCOUNT);
    }

    #[test]
    fn catalog_values_are_normalized_and_mismatches_kept() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[
            ("A1", "B1", "Valencia Casa Matriz", 5.0, "10%"),
            ("A2", "B1", "Valencia Casa Matriz", 5.0, "20%"),
        ]));
        service
            .load_discount_catalog(catalog(&[("A1B1", " 10.2 % "), ("A2B1", "25")]))
            .expect("catalog should load");

        let config = FilterConfig {
            match_mode: MatchMode::MismatchOnly,
            ..FilterConfig::default()
        };
        let view = service
            .apply_filters(&config)
            .expect("pipeline should succeed")
            .expect("data is loaded");

        assert_eq!(column_text(view, REFERENCE), vec!["A2"]);
        assert_eq!(column_text(view, CATALOG_DISCOUNT), vec!["25%"]);
    }

    #[test]
    fn malformed_catalog_is_rejected_without_touching_state() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[("A1", "B1", "Valencia Casa Matriz", 5.0, "10%")]));
        service
            .load_discount_catalog(catalog(&[("A1B1", "15")]))
            .expect("catalog should load");

        let malformed = Table::new(vec!["Concatenar".to_string(), "Precio".to_string()]);
        let err = service
            .load_discount_catalog(malformed)
            .expect_err("catalog without discount column must fail");

        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(err.to_string().contains("% Descuento"));
        assert_eq!(service.discount_catalog().map(Table::len), Some(1));
    }

    #[test]
    fn failed_database_load_keeps_previous_dataset() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[("A1", "B1", "Valencia Casa Matriz", 5.0, "10%")]));

        let result = service.load_from_database(&FixedSource(Err("timeout".to_string())));

        assert!(result.is_err());
        assert_eq!(service.base().map(Table::len), Some(1));
    }

    #[test]
    fn new_import_clears_catalog_and_duplicate_mode() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[("A1", "B1", "Valencia Casa Matriz", 5.0, "10%")]));
        service
            .load_discount_catalog(catalog(&[("A1B1", "15")]))
            .expect("catalog should load");
        service.set_duplicate_mode(DuplicateMode::UniqueOnly);

        let loaded = service
            .load_from_database(&FixedSource(Ok(inventory(&[
                ("A1", "B1", "Valencia Casa Matriz", 1.0, "10%"),
                ("A2", "B1", "Valencia Casa Matriz", 1.0, "10%"),
            ]))))
            .expect("load should succeed");

        assert_eq!(loaded, 2);
        assert!(service.discount_catalog().is_none());
        assert_eq!(service.duplicate_mode(), None);
    }

    #[test]
    fn duplicate_mode_toggles_off_when_selected_twice() {
        let mut service = InventoryService::new();
        service.set_duplicate_mode(DuplicateMode::DuplicatesOnly);
        assert_eq!(service.duplicate_mode(), Some(DuplicateMode::DuplicatesOnly));
        service.set_duplicate_mode(DuplicateMode::UniqueOnly);
        assert_eq!(service.duplicate_mode(), Some(DuplicateMode::UniqueOnly));
        service.set_duplicate_mode(DuplicateMode::UniqueOnly);
        assert_eq!(service.duplicate_mode(), None);
    }

    #[test]
    fn duplicate_tags_partition_the_view() {
        let mut view = Table::from_rows(
            vec![REFERENCE_KEY.to_string(), DISCOUNT.to_string()],
            vec![
                vec!["A1B1".into(), "10%".into()],
                vec!["A1B1".into(), "10%".into()],
                vec!["A1B1".into(), "20%".into()],
                vec!["A2B1".into(), CellValue::Null],
            ],
        );
        tag_duplicates(&mut view, true);
        assert_eq!(
            column_text(&view, DUPLICATE_TAG),
            vec!["true", "true", "false", "false"]
        );

        let mut duplicates = view.clone();
        narrow_duplicates(&mut duplicates, DuplicateMode::DuplicatesOnly);
        let mut unique = view.clone();
        narrow_duplicates(&mut unique, DuplicateMode::UniqueOnly);

        assert_eq!(duplicates.len(), 2);
        assert_eq!(unique.len(), 2);
        assert_eq!(duplicates.len() + unique.len(), view.len());
    }

    fn with_promotions(mut table: Table, flags: &[i64]) -> Table {
        table.set_column(PROMOTION, flags.iter().map(|flag| CellValue::Int(*flag)).collect());
        table
    }

    #[test]
    fn duplicate_modes_split_the_pipeline_view() {
        let base = with_promotions(
            inventory(&[
                ("A1", "B1", "Valencia Casa Matriz", 5.0, "10%"),
                ("A1", "B1", "Oriente - Sucursales", 3.0, "10%"),
                ("A2", "B1", "Valencia Casa Matriz", 4.0, "10%"),
            ]),
            &[1, 0, 0],
        );
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(base);

        let mut view_for = |duplicate_mode: Option<DuplicateMode>| {
            let config = FilterConfig {
                highlight_duplicates: true,
                duplicate_mode,
                ..FilterConfig::default()
            };
            service
                .apply_filters(&config)
                .expect("pipeline should succeed")
                .expect("data is loaded")
                .clone()
        };

        let all = view_for(None);
        let duplicates = view_for(Some(DuplicateMode::DuplicatesOnly));
        let unique = view_for(Some(DuplicateMode::UniqueOnly));

        assert_eq!(all.len(), 3, "A1B1 keeps one row per promotion flag");
        assert_eq!(column_text(&all, DUPLICATE_TAG), vec!["true", "true", "false"]);
        assert_eq!(column_text(&duplicates, REFERENCE_KEY), vec!["A1B1", "A1B1"]);
        assert_eq!(column_text(&duplicates, PROMOTION), vec!["1", "0"]);
        assert_eq!(column_text(&unique, REFERENCE_KEY), vec!["A2B1"]);
        assert_eq!(duplicates.len() + unique.len(), all.len());
    }

    #[test]
    fn per_store_discounts_survive_the_pivot() {
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(inventory(&[
            ("A1", "B1", "Valencia Casa Matriz", 5.0, "10%"),
            ("A1", "B1", "Oriente - Sucursales", 3.0, "20%"),
        ]));
        service
            .load_discount_catalog(catalog(&[("A1B1", "20")]))
            .expect("catalog should load");

        let config = FilterConfig {
            match_mode: MatchMode::MismatchOnly,
            ..FilterConfig::default()
        };
        let view = service
            .apply_filters(&config)
            .expect("pipeline should succeed")
            .expect("data is loaded");

        assert_eq!(column_text(view, DISCOUNT), vec!["10%"]);
        assert_eq!(column_text(view, CATALOG_DISCOUNT), vec!["20%"]);
    }

    #[test]
    fn catalog_discounts_round_half_to_even() {
        assert_eq!(format_discount(CellValue::Float(12.5)), CellValue::from("12%"));
        assert_eq!(format_discount(CellValue::Float(13.5)), CellValue::from("14%"));
        assert_eq!(format_discount(CellValue::from("7.6 %")), CellValue::from("8%"));
    }

    #[test]
    fn promotion_is_normalized_to_integers() {
        let mut view = Table::from_rows(
            vec![PROMOTION.to_string()],
            vec![
                vec![CellValue::Bool(true)],
                vec!["false".into()],
                vec!["1".into()],
                vec![CellValue::Float(0.0)],
                vec!["quizas".into()],
            ],
        );

        normalize_promotion(&mut view);

        assert_eq!(
            view.rows().iter().map(|row| row[0].clone()).collect::<Vec<_>>(),
            vec![
                CellValue::Int(1),
                CellValue::Int(0),
                CellValue::Int(1),
                CellValue::Int(0),
                CellValue::from("quizas"),
            ]
        );
    }

    #[test]
    fn changing_excluded_year_invalidates_cached_pivot() {
        let mut base = inventory(&[
            ("A1", "B1", "Valencia Casa Matriz", 5.0, "10%"),
            ("A1", "B1", "Valencia Casa Matriz", 7.0, "10%"),
        ]);
        base.set_column(
            "Fecha",
            vec![CellValue::from("2023-01-10"), CellValue::from("2024-02-11")],
        );
        let mut service = InventoryService::new();
        service.load_from_spreadsheet(base);

        let total = |service: &mut InventoryService, year: Option<i32>| {
            let config = FilterConfig {
                exclude_year: year,
                ..FilterConfig::default()
            };
            service
                .apply_filters(&config)
                .expect("pipeline should succeed")
                .and_then(|view| view.cell(0, GRAND_TOTAL).and_then(CellValue::as_f64))
        };

        assert_eq!(total(&mut service, None), Some(12.0));
        assert_eq!(total(&mut service, Some(2023)), Some(7.0));
        assert_eq!(total(&mut service, None), Some(12.0));
    }

    #[test]
    fn region_is_derived_from_store_id_on_ingest() {
        let table = Table::from_rows(
            vec![" Referencia".to_string(), STORE_ID.to_string(), "concatenado".to_string()],
            vec![vec!["A1".into(), CellValue::Int(1033), "A1B1".into()]],
        );

        let normalized = normalize_inventory(table);

        assert!(normalized.has_column(REFERENCE));
        assert!(normalized.has_column(REFERENCE_KEY));
        assert_eq!(
            normalized.cell(0, REGION),
            Some(&CellValue::from("Margarita - Sucursales"))
        );
    }
}
