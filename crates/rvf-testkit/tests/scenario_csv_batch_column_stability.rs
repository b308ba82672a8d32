//! Scenario: CSV export through the engine, stable column schema
//!
//! # Invariant under test
//! A CRM CSV export loads into typed rows (business unit classified from
//! title + raw label, probability normalized, date quirks handled), the
//! engine maps over the batch row-wise, and every result exposes the exact
//! same pre-declared column set the engine advertises (zeros included),
//! regardless of which years a given row touches.

use std::fs;
use std::io::Write;

use rvf_revenue::RevenueEngine;
use rvf_schemas::BusinessUnit;
use rvf_testkit::load_proposals_csv;

const EPS: f64 = 1e-9;

const FIXTURE: &str = "\
id,title,bu,amount,proposal_date,project_start,project_stop,probability
P-101,Refonte jardin sud,TRAVAUX,6000,2024-12-15,2025-01-01,2025-06-30,100
P-102,Contrat entretien campus,MAINTENANCE,12000,2025-01-01,,2025-12-31,50
P-103,Etude paysagère mairie,CONCEPTION,12000,2025-01-10 09:30:00,2025-01-01,,80
P-104,Pose clôture (TS),AUTRE,3000,2025-02-01,2025-03-02,2025-03-28,0
P-105,Divers,,4500,,,,60
";

fn write_fixture(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("proposals.csv");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// 1. Loader applies the upstream normalizations
// ---------------------------------------------------------------------------

#[test]
fn loader_classifies_and_normalizes_rows() {
    let dir = tempfile::tempdir().unwrap();
    let rows = load_proposals_csv(&write_fixture(&dir)).unwrap();
    assert_eq!(rows.len(), 5);

    // TS marker in the title overrides the raw AUTRE label.
    assert_eq!(rows[3].business_unit, BusinessUnit::Travaux);
    // Zero probability reads as 50 %.
    assert!((rows[3].probability_factor - 0.5).abs() < EPS);
    // Empty raw label falls back to the default bucket.
    assert_eq!(rows[4].business_unit, BusinessUnit::Autre);
    // Datetime cells truncate to their date part.
    assert_eq!(
        rows[2].proposal_date,
        Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    );
    // Empty date cells are missing, not sentinels.
    assert_eq!(rows[1].project_start, None);
    assert_eq!(rows[4].proposal_date, None);
}

// ---------------------------------------------------------------------------
// 2. Batch run: per-row semantics survive the pipeline
// ---------------------------------------------------------------------------

#[test]
fn batch_results_match_row_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let rows = load_proposals_csv(&write_fixture(&dir)).unwrap();
    let engine = RevenueEngine::new(&[2025, 2026, 2027, 2028]).unwrap();
    let results = engine.process(&rows);
    assert_eq!(results.len(), rows.len());

    // P-101: clean six-month TRAVAUX spread.
    assert!((results[0].total(2025) - 6000.0).abs() < EPS);
    assert_eq!(results[0].rule_name(), "none");

    // P-102: maintenance start backfilled from the stop date.
    assert_eq!(results[1].rule_name(), "rule1_start_missing_maintenance");
    assert!((results[1].total(2025) - 12000.0).abs() < EPS);
    assert!((results[1].weighted(2025) - 6000.0).abs() < EPS);

    // P-103: small-bracket conception phasing, stop irrelevant.
    assert!((results[2].total(2025) - 12000.0).abs() < EPS);
    assert!((results[2].quarter_total(2025, 1) - 12000.0).abs() < EPS);

    // P-104: single-month project books upfront, weighted at the 50 % default.
    assert!((results[3].total(2025) - 3000.0).abs() < EPS);
    assert!((results[3].quarter_total(2025, 1) - 3000.0).abs() < EPS);

    // P-105: no dates at all. Flagged zero row, batch keeps going.
    assert_eq!(results[4].rule_name(), "missing_all_dates");
    assert_eq!(results[4].grand_total(), 0.0);
}

// ---------------------------------------------------------------------------
// 3. Column schema is identical across rows
// ---------------------------------------------------------------------------

#[test]
fn every_row_exposes_the_full_declared_schema() {
    let dir = tempfile::tempdir().unwrap();
    let rows = load_proposals_csv(&write_fixture(&dir)).unwrap();
    let engine = RevenueEngine::new(&[2025, 2026, 2027, 2028]).unwrap();

    let declared: std::collections::BTreeSet<String> =
        engine.financial_columns().into_iter().collect();

    for result in engine.process(&rows) {
        let columns = result.to_columns();
        let keys: std::collections::BTreeSet<String> = columns.keys().cloned().collect();
        assert_eq!(
            keys, declared,
            "row columns must match the engine's declared schema exactly"
        );
    }
}

// ---------------------------------------------------------------------------
// 4. Duplicate CRM ids are a fixture defect
// ---------------------------------------------------------------------------

#[test]
fn duplicate_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.csv");
    fs::write(
        &path,
        "id,title,bu,amount,proposal_date,project_start,project_stop,probability\n\
         P-1,A,TRAVAUX,100,,,,50\n\
         P-1,B,TRAVAUX,200,,,,50\n",
    )
    .unwrap();

    let err = load_proposals_csv(&path.to_string_lossy()).unwrap_err();
    assert!(err.to_string().contains("duplicate proposal id"));
}
