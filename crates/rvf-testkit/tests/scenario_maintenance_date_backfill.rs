//! Scenario: MAINTENANCE date backfill rules
//!
//! # Invariant under test
//! MAINTENANCE contracts with incomplete dates are backfilled to a full
//! 12-month window (start = stop − 11 months, or stop = start + 11 months,
//! or a proposal-date-anchored year), then spread evenly. The fired rule is
//! visible in the diagnostics but never changes how totals are folded.

use rvf_revenue::RevenueEngine;
use rvf_schemas::{BusinessUnit, ProposalRecord};
use rvf_testkit::{date, proposal};

const EPS: f64 = 1e-9;

fn engine() -> RevenueEngine {
    RevenueEngine::new(&[2025, 2026, 2027, 2028]).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Start missing: backfilled from the stop date (rule 1)
// ---------------------------------------------------------------------------

#[test]
fn start_missing_backfills_twelve_months_from_stop() {
    let row = ProposalRecord {
        proposal_date: Some(date(2025, 1, 1)),
        project_stop: Some(date(2025, 12, 31)),
        ..proposal("MNT-1", BusinessUnit::Maintenance, 12000.0)
    };
    let result = engine().allocate(&row);

    assert_eq!(result.rule_name(), "rule1_start_missing_maintenance");
    assert!(result.rule_applied);
    assert_eq!(result.effective_start, Some(date(2025, 1, 31)));
    assert!((result.total(2025) - 12000.0).abs() < EPS);
    for quarter in 1..=4 {
        assert!(
            (result.quarter_total(2025, quarter) - 3000.0).abs() < EPS,
            "even spread puts 3000 in each quarter"
        );
    }
}

// ---------------------------------------------------------------------------
// 2. Stop missing: extended from the start date (rule 2)
// ---------------------------------------------------------------------------

#[test]
fn stop_missing_extends_eleven_months_from_start() {
    let row = ProposalRecord {
        project_start: Some(date(2025, 7, 10)),
        ..proposal("MNT-2", BusinessUnit::Maintenance, 12000.0)
    };
    let result = engine().allocate(&row);

    assert_eq!(result.rule_name(), "rule2_end_missing_maintenance");
    assert_eq!(result.effective_stop, Some(date(2026, 6, 10)));
    // Jul-Dec 2025 and Jan-Jun 2026, 1000 per month.
    assert!((result.total(2025) - 6000.0).abs() < EPS);
    assert!((result.total(2026) - 6000.0).abs() < EPS);
}

// ---------------------------------------------------------------------------
// 3. Both missing: anchored on the proposal date (rule 3)
// ---------------------------------------------------------------------------

#[test]
fn both_missing_anchors_year_on_proposal_date() {
    let row = ProposalRecord {
        proposal_date: Some(date(2025, 3, 5)),
        ..proposal("MNT-3", BusinessUnit::Maintenance, 24000.0)
    };
    let result = engine().allocate(&row);

    assert_eq!(result.rule_name(), "rule3_both_missing_maintenance");
    // Mar 2025 - Feb 2026: ten months in 2025, two in 2026.
    assert!((result.total(2025) - 20000.0).abs() < EPS);
    assert!((result.total(2026) - 4000.0).abs() < EPS);
}

// ---------------------------------------------------------------------------
// 4. Inconsistent dates demote to the proposal-date anchor
// ---------------------------------------------------------------------------

#[test]
fn inverted_dates_resolve_like_both_missing() {
    let row = ProposalRecord {
        proposal_date: Some(date(2025, 3, 5)),
        project_start: Some(date(2025, 11, 1)),
        project_stop: Some(date(2025, 2, 1)),
        ..proposal("MNT-4", BusinessUnit::Maintenance, 24000.0)
    };
    let result = engine().allocate(&row);

    assert_eq!(result.rule_name(), "rule3_both_missing_maintenance");
    assert!((result.total(2025) - 20000.0).abs() < EPS);
    assert!((result.total(2026) - 4000.0).abs() < EPS);
}

// ---------------------------------------------------------------------------
// 5. No anchor at all: zero result, flagged, never an error
// ---------------------------------------------------------------------------

#[test]
fn no_dates_anywhere_yields_flagged_zero_result() {
    let result = engine().allocate(&proposal("MNT-5", BusinessUnit::Maintenance, 9000.0));

    assert_eq!(result.rule_name(), "missing_all_dates");
    assert!(!result.rule_applied);
    assert_eq!(result.grand_total(), 0.0);
    assert_eq!(result.effective_start, None);
    assert_eq!(result.effective_stop, None);
    // The schema stays intact for downstream writers.
    assert_eq!(result.to_columns().len(), 40);
}
