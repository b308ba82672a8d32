//! rvf-testkit
//!
//! Fixture helpers for scenario tests: CSV proposal-export loading and row
//! construction shorthand. Scenario tests live under `tests/`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;

use rvf_schemas::{probability_factor_from_percent, BusinessUnit, ProposalRecord};

/// Civil-date shorthand for fixtures. Panics on an invalid date, which in
/// test tooling means the fixture itself is wrong.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid civil date")
}

/// Minimal row: no dates, probability 1.0. Scenario tests fill in the rest
/// through struct update syntax.
pub fn proposal(id: &str, business_unit: BusinessUnit, amount: f64) -> ProposalRecord {
    ProposalRecord::new(id, amount, business_unit, None, None, None, 1.0)
}

/// Load proposals from a CRM CSV export.
///
/// Expected columns, in order:
/// `id, title, bu, amount, proposal_date, project_start, project_stop, probability`
///
/// Dates are `YYYY-MM-DD` (longer datetime strings are truncated to their
/// date part); empty or `0000`-prefixed cells mean missing. The business
/// unit is classified from the title + raw label, and the probability is a
/// raw percentage normalized into a factor.
pub fn load_proposals_csv(path: &str) -> Result<Vec<ProposalRecord>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("open proposals csv: {path}"))?;
    let mut out = Vec::new();

    for rec in rdr.records() {
        let rec = rec?;
        let raw_probability: f64 = if rec[7].trim().is_empty() {
            0.0
        } else {
            rec[7].trim().parse().context("parse probability")?
        };
        let row = ProposalRecord {
            id: rec[0].to_string(),
            amount: rec[3].trim().parse().context("parse amount")?,
            business_unit: BusinessUnit::classify(&rec[1], &rec[2]),
            proposal_date: parse_date_cell(&rec[4]),
            project_start: parse_date_cell(&rec[5]),
            project_stop: parse_date_cell(&rec[6]),
            probability_factor: probability_factor_from_percent(raw_probability),
        };
        out.push(row);
    }

    // Minimal structural check: CRM ids are unique.
    let mut seen = BTreeSet::new();
    for row in &out {
        if !seen.insert(row.id.as_str()) {
            anyhow::bail!("duplicate proposal id: {}", row.id);
        }
    }

    Ok(out)
}

/// Parse a date cell from a CRM export. Datetime strings are truncated to
/// their first 10 characters; empty and `0000`-prefixed values are missing.
pub fn parse_date_cell(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.starts_with("0000") || trimmed == "None" {
        return None;
    }
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
