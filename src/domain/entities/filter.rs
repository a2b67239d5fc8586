use std::collections::BTreeSet;

use crate::domain::entities::region::{is_branch, is_headquarters};

pub const ALL_REGIONS: &str = "Todas";
pub const REFERENCE_PLACEHOLDER: &str = "Referencia";

/// Brand codes offered by the "exclude default codes" toggle.
pub const DEFAULT_EXCLUDED_BRANDS: [&str; 3] = ["GRD", "DNE", "DIE"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PivotMode {
    #[default]
    All,
    BranchesOnly,
    HeadquartersOnly,
}

impl PivotMode {
    pub const ALL_MODES: [PivotMode; 3] = [
        PivotMode::All,
        PivotMode::BranchesOnly,
        PivotMode::HeadquartersOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PivotMode::All => "Todo",
            PivotMode::BranchesOnly => "Solo Sucursales",
            PivotMode::HeadquartersOnly => "Solo Casa Matriz",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.label() == label.trim())
    }

    /// Whether a row with this region belongs to the mode's subset.
    pub fn includes_region(self, region: &str) -> bool {
        match self {
            PivotMode::All => true,
            PivotMode::BranchesOnly => is_branch(region),
            PivotMode::HeadquartersOnly => is_headquarters(region),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateMode {
    UniqueOnly,
    DuplicatesOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    None,
    MatchOnly,
    MismatchOnly,
}

impl MatchMode {
    /// Builds the mode from the two UI checkboxes. When both are ticked the
    /// match request is ignored.
    pub fn from_flags(match_only: bool, mismatch_only: bool) -> Self {
        match (match_only, mismatch_only) {
            (_, true) => MatchMode::MismatchOnly,
            (true, false) => MatchMode::MatchOnly,
            (false, false) => MatchMode::None,
        }
    }
}

/// Everything the view refresh needs, rebuilt from UI state each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub pivot_mode: PivotMode,
    pub region: String,
    pub brand_exact: String,
    pub reference_query: String,
    pub exclude_brands: BTreeSet<String>,
    pub exclude_sublines: BTreeSet<String>,
    pub promo_only: bool,
    pub exclude_year: Option<i32>,
    pub highlight_duplicates: bool,
    pub duplicate_mode: Option<DuplicateMode>,
    pub match_mode: MatchMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pivot_mode: PivotMode::All,
            region: ALL_REGIONS.to_string(),
            brand_exact: String::new(),
            reference_query: String::new(),
            exclude_brands: BTreeSet::new(),
            exclude_sublines: BTreeSet::new(),
            promo_only: false,
            exclude_year: None,
            highlight_duplicates: false,
            duplicate_mode: None,
            match_mode: MatchMode::None,
        }
    }
}

impl FilterConfig {
    /// Region value, or `None` when it selects every region.
    pub fn active_region(&self) -> Option<&str> {
        let region = self.region.trim();
        if region.is_empty() || region == ALL_REGIONS {
            None
        } else {
            Some(region)
        }
    }

    /// Reference query with the placeholder label treated as empty.
    pub fn active_reference(&self) -> Option<&str> {
        let reference = self.reference_query.trim();
        if reference.is_empty() || reference.eq_ignore_ascii_case(REFERENCE_PLACEHOLDER) {
            None
        } else {
            Some(reference)
        }
    }

    pub fn active_brand(&self) -> Option<&str> {
        let brand = self.brand_exact.trim();
        (!brand.is_empty()).then_some(brand)
    }

    /// True when no row-level filter would remove anything.
    pub fn filters_inactive(&self) -> bool {
        let region_active =
            self.pivot_mode == PivotMode::BranchesOnly && self.active_region().is_some();
        !region_active
            && self.active_brand().is_none()
            && self.active_reference().is_none()
            && self.exclude_brands.is_empty()
            && self.exclude_sublines.is_empty()
            && !self.promo_only
    }

    /// Parses the raw "exclude year" entry. Anything that is not a year is
    /// treated as no exclusion.
    pub fn parse_exclude_year(raw: &str) -> Option<i32> {
        raw.trim().parse::<i32>().ok()
    }

    /// Splits a comma separated list into a set, dropping blanks.
    pub fn parse_list(raw: &str) -> BTreeSet<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn with_default_brand_exclusions(mut self) -> Self {
        self.exclude_brands
            .extend(DEFAULT_EXCLUDED_BRANDS.iter().map(|code| code.to_string()));
        self
    }
}
