use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors produced at engine construction. Business data never errors; bad
/// rows degrade to zero allocations with a diagnostic rule instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The tracked window must name at least one calendar year.
    EmptyTrackedYears,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTrackedYears => write!(f, "tracked_years must not be empty"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Default CONCEPTION phasing thresholds, in euros.
pub const CONCEPTION_THRESHOLD_LOW: f64 = 15_000.0;
pub const CONCEPTION_THRESHOLD_HIGH: f64 = 30_000.0;

/// Tunable spreading parameters.
///
/// CONCEPTION bracket bounds are inclusive on the high end: an amount equal
/// to `conception_threshold_low` or `conception_threshold_high` phases with
/// the medium bracket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub conception_threshold_low: f64,
    pub conception_threshold_high: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conception_threshold_low: CONCEPTION_THRESHOLD_LOW,
            conception_threshold_high: CONCEPTION_THRESHOLD_HIGH,
        }
    }
}

// ---------------------------------------------------------------------------
// Date resolution diagnostics
// ---------------------------------------------------------------------------

/// Which date-resolution branch fired for a row.
///
/// Purely diagnostic: downstream reporting audits how much revenue was
/// allocated via fallback paths, but never branches on these values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRule {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "missing_all_dates")]
    MissingAllDates,
    #[serde(rename = "rule1_start_missing_maintenance")]
    StartMissingMaintenance,
    #[serde(rename = "rule1_start_missing_travaux")]
    StartMissingTravaux,
    #[serde(rename = "rule1_start_missing_conception")]
    StartMissingConception,
    #[serde(rename = "rule1_start_missing_default")]
    StartMissingDefault,
    #[serde(rename = "rule2_end_missing_maintenance")]
    EndMissingMaintenance,
    #[serde(rename = "rule2_end_missing_travaux")]
    EndMissingTravaux,
    #[serde(rename = "rule2_end_missing_default")]
    EndMissingDefault,
    #[serde(rename = "rule3_both_missing_maintenance")]
    BothMissingMaintenance,
    #[serde(rename = "rule3_both_missing_travaux")]
    BothMissingTravaux,
    #[serde(rename = "rule3_both_missing_conception")]
    BothMissingConception,
    #[serde(rename = "rule3_both_missing_default")]
    BothMissingDefault,
}

impl DateRule {
    pub fn label(&self) -> &'static str {
        match self {
            DateRule::None => "none",
            DateRule::MissingAllDates => "missing_all_dates",
            DateRule::StartMissingMaintenance => "rule1_start_missing_maintenance",
            DateRule::StartMissingTravaux => "rule1_start_missing_travaux",
            DateRule::StartMissingConception => "rule1_start_missing_conception",
            DateRule::StartMissingDefault => "rule1_start_missing_default",
            DateRule::EndMissingMaintenance => "rule2_end_missing_maintenance",
            DateRule::EndMissingTravaux => "rule2_end_missing_travaux",
            DateRule::EndMissingDefault => "rule2_end_missing_default",
            DateRule::BothMissingMaintenance => "rule3_both_missing_maintenance",
            DateRule::BothMissingTravaux => "rule3_both_missing_travaux",
            DateRule::BothMissingConception => "rule3_both_missing_conception",
            DateRule::BothMissingDefault => "rule3_both_missing_default",
        }
    }
}

/// Output of the date resolver for one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateResolution {
    pub effective_start: Option<NaiveDate>,
    pub effective_stop: Option<NaiveDate>,
    pub rule_applied: bool,
    pub rule: DateRule,
}

impl DateResolution {
    /// Both source dates present and consistent; returned unchanged.
    pub fn clean(start: NaiveDate, stop: NaiveDate) -> Self {
        Self {
            effective_start: Some(start),
            effective_stop: Some(stop),
            rule_applied: false,
            rule: DateRule::None,
        }
    }

    /// A fallback rule fired and produced the given effective dates.
    pub fn applied(
        start: NaiveDate,
        stop: Option<NaiveDate>,
        rule: DateRule,
    ) -> Self {
        Self {
            effective_start: Some(start),
            effective_stop: stop,
            rule_applied: true,
            rule,
        }
    }

    /// No date at all could be resolved. Not an error: the spreader turns
    /// this into an all-zero result.
    pub fn unresolved() -> Self {
        Self {
            effective_start: None,
            effective_stop: None,
            rule_applied: false,
            rule: DateRule::MissingAllDates,
        }
    }
}

// ---------------------------------------------------------------------------
// MonthlyAllocation
// ---------------------------------------------------------------------------

/// A transient fragment of revenue assigned to exactly one calendar month.
/// After clamping, `first_year <= year <= last_year` holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthlyAllocation {
    pub year: i32,
    /// Calendar month, 1..=12.
    pub month: u32,
    pub amount: f64,
}

impl MonthlyAllocation {
    pub fn new(year: i32, month: u32, amount: f64) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self {
            year,
            month,
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// AllocationResult
// ---------------------------------------------------------------------------

/// Per-year totals folded from one row's clamped fragments.
///
/// Year and quarter sums are built from the same fragment set, so
/// `total == quarter_total.iter().sum()` always holds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YearBreakdown {
    pub total: f64,
    pub weighted: f64,
    pub quarter_total: [f64; 4],
    pub quarter_weighted: [f64; 4],
}

/// The engine's output for a single proposal row.
///
/// `years` carries an entry for every tracked year (zeros included) so the
/// flat column schema is identical across rows. Never mutated after
/// construction; callers merge it into the row's permanent record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub years: BTreeMap<i32, YearBreakdown>,
    pub rule_applied: bool,
    pub rule: DateRule,
    /// The degenerate-duration fallback (`stop := start`) fired.
    pub fallback_one_month: bool,
    pub effective_start: Option<NaiveDate>,
    pub effective_stop: Option<NaiveDate>,
}

impl AllocationResult {
    /// All-zero result for the given tracked window, carrying the resolver's
    /// diagnostics.
    pub fn zeroed(tracked_years: &[i32], resolution: &DateResolution) -> Self {
        let mut years = BTreeMap::new();
        for &year in tracked_years {
            years.insert(year, YearBreakdown::default());
        }
        Self {
            years,
            rule_applied: resolution.rule_applied,
            rule: resolution.rule,
            fallback_one_month: false,
            effective_start: resolution.effective_start,
            effective_stop: resolution.effective_stop,
        }
    }

    /// Diagnostic label for the row, with the `_fallback_1month` suffix when
    /// the degenerate-duration fallback fired on top of a resolution rule.
    pub fn rule_name(&self) -> String {
        if self.fallback_one_month && self.rule_applied {
            format!("{}_fallback_1month", self.rule.label())
        } else {
            self.rule.label().to_string()
        }
    }

    pub fn total(&self, year: i32) -> f64 {
        self.years.get(&year).map(|y| y.total).unwrap_or(0.0)
    }

    pub fn weighted(&self, year: i32) -> f64 {
        self.years.get(&year).map(|y| y.weighted).unwrap_or(0.0)
    }

    /// Raw total for quarter `quarter` (1..=4) of `year`.
    pub fn quarter_total(&self, year: i32, quarter: u32) -> f64 {
        debug_assert!((1..=4).contains(&quarter));
        self.years
            .get(&year)
            .map(|y| y.quarter_total[(quarter - 1) as usize])
            .unwrap_or(0.0)
    }

    /// Weighted total for quarter `quarter` (1..=4) of `year`.
    pub fn quarter_weighted(&self, year: i32, quarter: u32) -> f64 {
        debug_assert!((1..=4).contains(&quarter));
        self.years
            .get(&year)
            .map(|y| y.quarter_weighted[(quarter - 1) as usize])
            .unwrap_or(0.0)
    }

    /// Sum of raw totals across every tracked year.
    pub fn grand_total(&self) -> f64 {
        self.years.values().map(|y| y.total).sum()
    }

    /// Flatten into the spreadsheet-facing column map. Every tracked year
    /// and quarter is present, zeros included.
    pub fn to_columns(&self) -> BTreeMap<String, f64> {
        let mut columns = BTreeMap::new();
        for (&year, breakdown) in &self.years {
            columns.insert(total_column(year), breakdown.total);
            columns.insert(weighted_column(year), breakdown.weighted);
            for quarter in 1..=4u32 {
                let q = (quarter - 1) as usize;
                columns.insert(
                    quarter_total_column(quarter, year),
                    breakdown.quarter_total[q],
                );
                columns.insert(
                    quarter_weighted_column(quarter, year),
                    breakdown.quarter_weighted[q],
                );
            }
        }
        columns
    }
}

// ---------------------------------------------------------------------------
// Column vocabulary
// ---------------------------------------------------------------------------

// Downstream spreadsheets keep the French reporting vocabulary.

pub fn total_column(year: i32) -> String {
    format!("Montant Total {year}")
}

pub fn weighted_column(year: i32) -> String {
    format!("Montant Pondéré {year}")
}

pub fn quarter_total_column(quarter: u32, year: i32) -> String {
    format!("Montant Total Q{quarter}_{year}")
}

pub fn quarter_weighted_column(quarter: u32, year: i32) -> String {
    format!("Montant Pondéré Q{quarter}_{year}")
}
