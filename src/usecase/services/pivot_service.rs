use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::entities::columns::{
    BRANCH_PERCENT, BRANCH_TOTAL, BRAND_CODE, CATALOG_DISCOUNT, DESCRIPTIVE_COLUMNS,
    DUPLICATE_TAG, GRAND_TOTAL, HQ_PERCENT, HQ_TOTAL, NO_DATA_MARKER, QUANTITY, REFERENCE,
    REFERENCE_KEY, REGION, STORE_NAME,
};
use crate::domain::entities::filter::PivotMode;
use crate::domain::entities::region::{is_branch, is_headquarters};
use crate::domain::entities::table::{CellValue, Table};
use crate::error::{InventoryError, Result};
use crate::format_percent;

const BASE_REQUIRED_COLUMNS: [&str; 4] = [REFERENCE, BRAND_CODE, REGION, QUANTITY];

const SUMMARY_COLUMNS: [&str; 8] = [
    HQ_TOTAL,
    BRANCH_TOTAL,
    GRAND_TOTAL,
    HQ_PERCENT,
    BRANCH_PERCENT,
    CATALOG_DISCOUNT,
    DUPLICATE_TAG,
    NO_DATA_MARKER,
];

/// Computes pivoted views and keeps the last result per mode.
///
/// The cache key is the mode alone. Callers must `clear` it whenever the base
/// dataset changes, otherwise a stale table is returned.
#[derive(Debug, Default)]
pub struct PivotService {
    cache: HashMap<PivotMode, Table>,
}

impl PivotService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_pivot(&mut self, mode: PivotMode, base: &Table) -> Result<&Table> {
        if self.cache.contains_key(&mode) {
            debug!(mode = mode.label(), "pivot cache hit");
        } else {
            let pivot = pivot_inventory(base, mode)?;
            debug!(
                mode = mode.label(),
                rows = pivot.len(),
                columns = pivot.columns().len(),
                "pivot computed"
            );
            self.cache.insert(mode, pivot);
        }
        self.cache
            .get(&mode)
            .ok_or_else(|| InventoryError::Validation("pivot cache lost its entry".to_string()))
    }

    pub fn is_cached(&self, mode: PivotMode) -> bool {
        self.cache.contains_key(&mode)
    }

    pub fn clear(&mut self) {
        if !self.cache.is_empty() {
            debug!(entries = self.cache.len(), "pivot cache cleared");
        }
        self.cache.clear();
    }
}

fn required_columns(mode: PivotMode) -> Vec<&'static str> {
    let mut required = BASE_REQUIRED_COLUMNS.to_vec();
    if mode == PivotMode::BranchesOnly {
        required.push(STORE_NAME);
    }
    required
}

/// Quantities of one Reference Key plus every distinct descriptive tuple seen
/// for it, in input order.
struct Group {
    variants: Vec<Vec<CellValue>>,
    sums: HashMap<String, f64>,
}

impl Group {
    fn total_where(&self, columns: &[String], matches: fn(&str) -> bool) -> f64 {
        columns
            .iter()
            .filter(|column| matches(column.as_str()))
            .map(|column| self.sums.get(column).copied().unwrap_or(0.0))
            .sum()
    }

    fn total(&self, columns: &[String]) -> f64 {
        self.total_where(columns, |_| true)
    }
}

/// Turns the long fact table into one row per distinct descriptive tuple.
///
/// Quantities are summed per Reference Key, so a key whose rows disagree on a
/// descriptive cell (a per-store `Descuento`, say) yields several rows that
/// carry the same totals.
pub fn pivot_inventory(base: &Table, mode: PivotMode) -> Result<Table> {
    let missing: Vec<&str> = required_columns(mode)
        .into_iter()
        .filter(|column| !base.has_column(column))
        .collect();
    if !missing.is_empty() {
        return Err(InventoryError::schema(missing));
    }

    let descriptive: Vec<&str> = DESCRIPTIVE_COLUMNS
        .iter()
        .copied()
        .filter(|column| *column == REFERENCE_KEY || base.has_column(column))
        .collect();
    let descriptive_idx: Vec<Option<usize>> = descriptive
        .iter()
        .map(|column| base.column_index(column))
        .collect();

    // Indices were validated above.
    let col = |name: &str| base.column_index(name).unwrap_or_default();
    let reference_idx = col(REFERENCE);
    let brand_idx = col(BRAND_CODE);
    let region_idx = col(REGION);
    let quantity_idx = col(QUANTITY);
    let key_idx = base.column_index(REFERENCE_KEY);
    let label_idx = match mode {
        PivotMode::BranchesOnly => col(STORE_NAME),
        PivotMode::All | PivotMode::HeadquartersOnly => region_idx,
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();
    let mut data_columns: BTreeSet<String> = BTreeSet::new();

    for row in base.rows() {
        let region = row[region_idx].as_text().unwrap_or_default();
        if !mode.includes_region(&region) {
            continue;
        }

        let key = key_idx
            .and_then(|idx| row[idx].as_text())
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{}{}",
                    row[reference_idx].as_text().unwrap_or_default(),
                    row[brand_idx].as_text().unwrap_or_default()
                )
            });

        let descriptive_row: Vec<CellValue> = descriptive_idx
            .iter()
            .map(|idx| match idx {
                Some(idx) => row[*idx].clone(),
                None => CellValue::Text(key.clone()),
            })
            .collect();
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Group {
                variants: Vec::new(),
                sums: HashMap::new(),
            }
        });
        if !group.variants.contains(&descriptive_row) {
            group.variants.push(descriptive_row);
        }

        let Some(label) = row[label_idx].as_text().filter(|label| !label.is_empty()) else {
            continue;
        };
        let quantity = row[quantity_idx].as_f64().unwrap_or(0.0);
        *group.sums.entry(label.clone()).or_insert(0.0) += quantity;
        data_columns.insert(label);
    }

    let mut columns: Vec<String> = descriptive.iter().map(|c| c.to_string()).collect();

    if mode != PivotMode::All && groups.is_empty() {
        columns.push(NO_DATA_MARKER.to_string());
        return Ok(Table::new(columns));
    }

    let data_columns: Vec<String> = data_columns.into_iter().collect();
    columns.extend(data_columns.iter().cloned());
    let trailing: &[&str] = match mode {
        PivotMode::All => &[HQ_TOTAL, BRANCH_TOTAL, GRAND_TOTAL, HQ_PERCENT, BRANCH_PERCENT],
        PivotMode::BranchesOnly => &[BRANCH_TOTAL, BRANCH_PERCENT],
        PivotMode::HeadquartersOnly => &[HQ_TOTAL, HQ_PERCENT],
    };
    columns.extend(trailing.iter().map(|c| c.to_string()));

    // Subset modes measure each row against the whole subset, summed over the
    // emitted rows before zero-stock rows are dropped.
    let subset_total: f64 = order
        .iter()
        .map(|key| {
            let group = &groups[key];
            group.total(&data_columns) * group.variants.len() as f64
        })
        .sum();

    let mut table = Table::new(columns);
    for key in &order {
        let group = &groups[key];
        let mut quantities: Vec<CellValue> = data_columns
            .iter()
            .map(|column| CellValue::Float(group.sums.get(column).copied().unwrap_or(0.0)))
            .collect();

        match mode {
            PivotMode::All => {
                let hq = group.total_where(&data_columns, is_headquarters);
                let branches = group.total_where(&data_columns, is_branch);
                let total = hq + branches;
                quantities.push(CellValue::Float(hq));
                quantities.push(CellValue::Float(branches));
                quantities.push(CellValue::Float(total));
                quantities.push(CellValue::Text(format_percent(hq, total)));
                quantities.push(CellValue::Text(format_percent(branches, total)));
            }
            PivotMode::BranchesOnly | PivotMode::HeadquartersOnly => {
                let total = group.total(&data_columns);
                if total == 0.0 {
                    continue;
                }
                quantities.push(CellValue::Float(total));
                quantities.push(CellValue::Text(format_percent(total, subset_total)));
            }
        }

        for descriptive in &group.variants {
            let mut row = descriptive.clone();
            row.extend(quantities.iter().cloned());
            table.push_row(row);
        }
    }

    Ok(table)
}

/// The per-region or per-store quantity columns of a pivoted view.
pub fn location_columns(view: &Table) -> Vec<String> {
    view.columns()
        .iter()
        .filter(|column| {
            !DESCRIPTIVE_COLUMNS.contains(&column.as_str())
                && !SUMMARY_COLUMNS.contains(&column.as_str())
        })
        .cloned()
        .collect()
}
