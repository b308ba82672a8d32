use tracing::{debug, info};

use rvf_schemas::{BusinessUnit, ProposalRecord};

use crate::resolver;
use crate::spreader::{self, quarter_of};
use crate::types::{
    quarter_total_column, quarter_weighted_column, total_column, weighted_column,
    AllocationResult, DateRule, EngineConfig, EngineError,
};

/// Revenue spreading engine over a fixed multi-year tracking window.
///
/// Construction fixes the window (sorted, deduplicated) and the spreading
/// thresholds; after that the engine is pure, stateless and row-wise, so a
/// batch run is a plain map over rows.
///
/// # Per-row algorithm
///
/// 1. Resolve effective dates (see [`crate::resolver`]).
/// 2. Zero amount or no effective start: return the pre-declared all-zero
///    result carrying the resolver diagnostics.
/// 3. CONCEPTION dispatches to phased spreading; other units fall back to a
///    1-month window when the stop date is unusable, then spread evenly.
/// 4. Clamp every fragment into `[first_year, last_year]`.
/// 5. Fold clamped fragments into year and quarter totals, raw and
///    probability-weighted, from the same fragment set.
#[derive(Debug)]
pub struct RevenueEngine {
    years: Vec<i32>,
    config: EngineConfig,
}

impl RevenueEngine {
    /// Build an engine over the given tracked years with default thresholds.
    pub fn new(tracked_years: &[i32]) -> Result<Self, EngineError> {
        Self::with_config(tracked_years, EngineConfig::default())
    }

    pub fn with_config(tracked_years: &[i32], config: EngineConfig) -> Result<Self, EngineError> {
        let mut years = tracked_years.to_vec();
        years.sort_unstable();
        years.dedup();
        if years.is_empty() {
            return Err(EngineError::EmptyTrackedYears);
        }
        Ok(Self { years, config })
    }

    pub fn tracked_years(&self) -> &[i32] {
        &self.years
    }

    pub fn first_year(&self) -> i32 {
        self.years[0]
    }

    pub fn last_year(&self) -> i32 {
        self.years[self.years.len() - 1]
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The full flat output schema, in window order: for every tracked year
    /// the raw/weighted annual pair, then the raw/weighted pair for each
    /// quarter. Stable across rows so spreadsheet writers can rely on it.
    pub fn financial_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.years.len() * 10);
        for &year in &self.years {
            columns.push(total_column(year));
            columns.push(weighted_column(year));
            for quarter in 1..=4 {
                columns.push(quarter_total_column(quarter, year));
                columns.push(quarter_weighted_column(quarter, year));
            }
        }
        columns
    }

    /// Compute the allocation result for a single proposal row.
    pub fn allocate(&self, row: &ProposalRecord) -> AllocationResult {
        let resolution = resolver::resolve(
            row.business_unit,
            row.project_start,
            row.project_stop,
            row.proposal_date,
        );
        let mut result = AllocationResult::zeroed(&self.years, &resolution);

        let Some(start) = resolution.effective_start else {
            return result;
        };
        if row.amount == 0.0 {
            return result;
        }

        let allocations = match row.business_unit {
            BusinessUnit::Conception => {
                spreader::spread_conception(row.amount, start, &self.config)
            }
            unit => {
                let stop = match resolution.effective_stop {
                    Some(stop) if stop >= start => stop,
                    // Unusable stop even after resolution: 1-month project.
                    _ => {
                        result.fallback_one_month = true;
                        start
                    }
                };
                match unit {
                    BusinessUnit::Maintenance => {
                        spreader::spread_maintenance(row.amount, start, stop)
                    }
                    _ => spreader::spread_travaux(row.amount, start, stop),
                }
            }
        };

        let (first_year, last_year) = (self.first_year(), self.last_year());
        for allocation in allocations {
            let clamped = spreader::clamp_to_window(allocation, first_year, last_year);
            // A clamped year outside the tracked set can only happen with a
            // non-contiguous window; such fragments are not reported.
            if let Some(breakdown) = result.years.get_mut(&clamped.year) {
                let quarter = (quarter_of(clamped.month) - 1) as usize;
                let weighted = clamped.amount * row.probability_factor;
                breakdown.total += clamped.amount;
                breakdown.quarter_total[quarter] += clamped.amount;
                breakdown.weighted += weighted;
                breakdown.quarter_weighted[quarter] += weighted;
            }
        }

        result
    }

    /// Map the engine over a batch of rows. No cross-row state.
    pub fn process(&self, rows: &[ProposalRecord]) -> Vec<AllocationResult> {
        let mut fallback_rows = 0usize;
        let mut unresolved_rows = 0usize;

        let results: Vec<AllocationResult> = rows
            .iter()
            .map(|row| {
                let result = self.allocate(row);
                if result.rule_applied {
                    fallback_rows += 1;
                    debug!(id = %row.id, rule = %result.rule_name(), "date fallback applied");
                }
                if result.rule == DateRule::MissingAllDates {
                    unresolved_rows += 1;
                }
                result
            })
            .collect();

        info!(
            rows = rows.len(),
            fallback_rows, unresolved_rows, "revenue allocation batch complete"
        );
        results
    }
}
