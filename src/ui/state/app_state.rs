use dioxus::prelude::*;

use crate::domain::entities::filter::{FilterConfig, MatchMode, PivotMode, ALL_REGIONS};

#[derive(Clone, Copy)]
pub struct AppState {
    pub pivot_mode: Signal<PivotMode>,
    pub region: Signal<String>,
    pub reference: Signal<String>,
    pub brand: Signal<String>,
    pub exclude_brands: Signal<String>,
    pub exclude_default_brands: Signal<bool>,
    pub exclude_sublines: Signal<String>,
    pub exclude_year: Signal<String>,
    pub promo_only: Signal<bool>,
    pub match_only: Signal<bool>,
    pub mismatch_only: Signal<bool>,
    pub highlight_duplicates: Signal<bool>,
    pub region_options: Signal<Vec<String>>,
    pub brand_options: Signal<Vec<String>>,
    pub columns: Signal<Vec<String>>,
    pub rows: Signal<Vec<Vec<String>>>,
    pub duplicate_rows: Signal<Vec<bool>>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            pivot_mode: use_signal(PivotMode::default),
            region: use_signal(|| ALL_REGIONS.to_string()),
            reference: use_signal(String::new),
            brand: use_signal(String::new),
            exclude_brands: use_signal(String::new),
            exclude_default_brands: use_signal(|| true),
            exclude_sublines: use_signal(String::new),
            exclude_year: use_signal(String::new),
            promo_only: use_signal(|| false),
            match_only: use_signal(|| false),
            mismatch_only: use_signal(|| false),
            highlight_duplicates: use_signal(|| false),
            region_options: use_signal(|| vec![ALL_REGIONS.to_string()]),
            brand_options: use_signal(Vec::<String>::new),
            columns: use_signal(Vec::<String>::new),
            rows: use_signal(Vec::<Vec<String>>::new),
            duplicate_rows: use_signal(Vec::<bool>::new),
            busy: use_signal(|| false),
            status: use_signal(|| "Listo".to_string()),
        }
    }
}

/// Snapshot of the filter inputs as a [`FilterConfig`].
pub fn filter_config_from_inputs(state: &AppState) -> FilterConfig {
    let config = FilterConfig {
        pivot_mode: *state.pivot_mode.read(),
        region: state.region.read().clone(),
        reference_query: state.reference.read().trim().to_string(),
        brand_exact: state.brand.read().trim().to_string(),
        exclude_brands: FilterConfig::parse_list(&state.exclude_brands.read()),
        exclude_sublines: FilterConfig::parse_list(&state.exclude_sublines.read()),
        exclude_year: FilterConfig::parse_exclude_year(&state.exclude_year.read()),
        promo_only: *state.promo_only.read(),
        match_mode: MatchMode::from_flags(*state.match_only.read(), *state.mismatch_only.read()),
        highlight_duplicates: *state.highlight_duplicates.read(),
        duplicate_mode: None,
    };
    if *state.exclude_default_brands.read() {
        config.with_default_brand_exclusions()
    } else {
        config
    }
}
