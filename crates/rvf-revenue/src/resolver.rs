//! Date resolution for incomplete or inconsistent project dates.
//!
//! Four-tier policy, evaluated in priority order:
//!
//! 1. Both dates present and `start <= stop`: returned as-is, no rule.
//! 2. Both present but `start > stop`: demoted to the both-missing path.
//! 3. Only start missing: per-BU backfill anchored on the stop date
//!    (MAINTENANCE) or the proposal date (others).
//! 4. Only stop missing: per-BU forward extension from the start date;
//!    CONCEPTION is start-only and stays untouched.
//! 5. Both missing: per-BU window anchored on the proposal date.
//!
//! Tiers 3 and 5 require a proposal date; without one, resolution fails as
//! a whole and the row gets an all-zero allocation downstream. Tier 4 never
//! consults the proposal date. Pure logic, no failure mode beyond `None`
//! effective dates.

use chrono::{Months, NaiveDate};
use rvf_schemas::BusinessUnit;

use crate::types::{DateResolution, DateRule};

/// Duration backfills, expressed as months added to the anchor month.
/// 11 spans a full 12-month window; 5 spans 6 months.
const MAINTENANCE_SPAN_MONTHS: u32 = 11;
const TRAVAUX_SPAN_MONTHS: u32 = 5;

/// Resolve effective start/stop dates for one row.
pub fn resolve(
    business_unit: BusinessUnit,
    project_start: Option<NaiveDate>,
    project_stop: Option<NaiveDate>,
    proposal_date: Option<NaiveDate>,
) -> DateResolution {
    if let (Some(start), Some(stop)) = (project_start, project_stop) {
        if start <= stop {
            return DateResolution::clean(start, stop);
        }
        // Inconsistent source dates: discard both and anchor on the
        // proposal date instead.
        return resolve_both_missing(business_unit, proposal_date);
    }

    match (project_start, project_stop) {
        (None, Some(stop)) => resolve_start_missing(business_unit, stop, proposal_date),
        (Some(start), None) => resolve_stop_missing(business_unit, start),
        _ => resolve_both_missing(business_unit, proposal_date),
    }
}

fn resolve_start_missing(
    business_unit: BusinessUnit,
    stop: NaiveDate,
    proposal_date: Option<NaiveDate>,
) -> DateResolution {
    let Some(anchor) = proposal_date else {
        return DateResolution::unresolved();
    };
    match business_unit {
        BusinessUnit::Maintenance => DateResolution::applied(
            sub_months(stop, MAINTENANCE_SPAN_MONTHS),
            Some(stop),
            DateRule::StartMissingMaintenance,
        ),
        BusinessUnit::Travaux => {
            DateResolution::applied(anchor, Some(stop), DateRule::StartMissingTravaux)
        }
        BusinessUnit::Conception => {
            DateResolution::applied(anchor, None, DateRule::StartMissingConception)
        }
        BusinessUnit::Autre => {
            DateResolution::applied(anchor, Some(stop), DateRule::StartMissingDefault)
        }
    }
}

fn resolve_stop_missing(business_unit: BusinessUnit, start: NaiveDate) -> DateResolution {
    match business_unit {
        BusinessUnit::Maintenance => DateResolution::applied(
            start,
            Some(add_months(start, MAINTENANCE_SPAN_MONTHS)),
            DateRule::EndMissingMaintenance,
        ),
        BusinessUnit::Travaux => DateResolution::applied(
            start,
            Some(add_months(start, TRAVAUX_SPAN_MONTHS)),
            DateRule::EndMissingTravaux,
        ),
        // CONCEPTION phasing never reads a stop date; nothing to repair.
        BusinessUnit::Conception => DateResolution {
            effective_start: Some(start),
            effective_stop: None,
            rule_applied: false,
            rule: DateRule::None,
        },
        BusinessUnit::Autre => DateResolution::applied(
            start,
            Some(add_months(start, TRAVAUX_SPAN_MONTHS)),
            DateRule::EndMissingDefault,
        ),
    }
}

fn resolve_both_missing(
    business_unit: BusinessUnit,
    proposal_date: Option<NaiveDate>,
) -> DateResolution {
    let Some(anchor) = proposal_date else {
        return DateResolution::unresolved();
    };
    match business_unit {
        BusinessUnit::Maintenance => DateResolution::applied(
            anchor,
            Some(add_months(anchor, MAINTENANCE_SPAN_MONTHS)),
            DateRule::BothMissingMaintenance,
        ),
        BusinessUnit::Travaux => DateResolution::applied(
            anchor,
            Some(add_months(anchor, TRAVAUX_SPAN_MONTHS)),
            DateRule::BothMissingTravaux,
        ),
        BusinessUnit::Conception => {
            DateResolution::applied(anchor, None, DateRule::BothMissingConception)
        }
        BusinessUnit::Autre => DateResolution::applied(
            anchor,
            Some(add_months(anchor, TRAVAUX_SPAN_MONTHS)),
            DateRule::BothMissingDefault,
        ),
    }
}

/// Calendar-month addition with end-of-month clamping (Jan 31 + 1 month =
/// Feb 28). Saturates at the representable-date horizon instead of failing.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}
