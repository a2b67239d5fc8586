use std::borrow::Cow;
use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::entities::columns::{
    resolve_column, BRAND_CODE, PROMOTION, REFERENCE, REGION, SUBLINE_CANDIDATES,
};
use crate::domain::entities::filter::{FilterConfig, PivotMode};
use crate::domain::entities::table::{CellValue, Table};

/// Applies the row filters of `config` to `table`.
///
/// Every filter is an identity when inactive or when its column is missing.
/// With nothing active the input is handed back borrowed.
pub fn apply_filters<'a>(table: &'a Table, config: &FilterConfig) -> Cow<'a, Table> {
    if config.filters_inactive() {
        return Cow::Borrowed(table);
    }

    let region = match (config.pivot_mode, config.active_region()) {
        (PivotMode::BranchesOnly, Some(region)) => table
            .column_index(REGION)
            .map(|idx| (idx, region.to_string())),
        _ => None,
    };
    let brand = config
        .active_brand()
        .and_then(|brand| table.column_index(BRAND_CODE).map(|idx| (idx, brand.to_string())));
    let reference = config.active_reference().and_then(|reference| {
        table
            .column_index(REFERENCE)
            .map(|idx| (idx, reference.to_lowercase()))
    });
    let excluded_brands = exclusion(table.column_index(BRAND_CODE), &config.exclude_brands);
    let excluded_sublines = exclusion(
        resolve_column(table, &SUBLINE_CANDIDATES),
        &config.exclude_sublines,
    );
    let promotion = if config.promo_only {
        table.column_index(PROMOTION)
    } else {
        None
    };

    let filtered = table.filter_rows(|row| {
        if let Some((idx, wanted)) = &region {
            if text_of(&row[*idx]) != *wanted {
                return false;
            }
        }
        if let Some((idx, wanted)) = &brand {
            if text_of(&row[*idx]) != *wanted {
                return false;
            }
        }
        if let Some((idx, wanted)) = &reference {
            if text_of(&row[*idx]).trim().to_lowercase() != *wanted {
                return false;
            }
        }
        if let Some((idx, excluded)) = &excluded_brands {
            if excluded.contains(&text_of(&row[*idx]).trim().to_uppercase()) {
                return false;
            }
        }
        if let Some((idx, excluded)) = &excluded_sublines {
            if excluded.contains(&text_of(&row[*idx]).trim().to_uppercase()) {
                return false;
            }
        }
        if let Some(idx) = promotion {
            if promotion_value(&row[idx]) != Some(1.0) {
                return false;
            }
        }
        true
    });

    debug!(before = table.len(), after = filtered.len(), "filters applied");
    Cow::Owned(filtered)
}

fn exclusion(idx: Option<usize>, values: &BTreeSet<String>) -> Option<(usize, BTreeSet<String>)> {
    if values.is_empty() {
        return None;
    }
    let idx = idx?;
    Some((
        idx,
        values
            .iter()
            .map(|value| value.trim().to_uppercase())
            .collect(),
    ))
}

fn text_of(cell: &CellValue) -> String {
    cell.as_text().unwrap_or_default()
}

/// Numeric view of a promotion flag. Booleans count as 0/1, unparseable
/// values have no number.
fn promotion_value(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}
