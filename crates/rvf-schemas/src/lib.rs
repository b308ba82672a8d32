//! rvf-schemas
//!
//! Shared record types for the revenue forecasting workspace.
//!
//! Everything here is plain data plus the two upstream normalizations the
//! engine contract depends on: business-unit assignment from raw CRM labels
//! and win-probability normalization. No IO, no engine logic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BusinessUnit
// ---------------------------------------------------------------------------

/// Keyword lists used to map raw CRM business-unit labels.
const MAINTENANCE_KEYWORDS: &[&str] = &["MAINTENANCE", "ENTRETIEN"];
const TRAVAUX_KEYWORDS: &[&str] = &["TRAVAUX", "CHANTIER"];
const CONCEPTION_KEYWORDS: &[&str] = &["CONCEPTION", "ETUDE"];

/// Top-level service category of a proposal.
///
/// `Autre` is the default bucket: any label that matches none of the keyword
/// lists lands here, and it spreads exactly like `Travaux` downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BusinessUnit {
    Conception,
    Travaux,
    Maintenance,
    Autre,
}

impl BusinessUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessUnit::Conception => "CONCEPTION",
            BusinessUnit::Travaux => "TRAVAUX",
            BusinessUnit::Maintenance => "MAINTENANCE",
            BusinessUnit::Autre => "AUTRE",
        }
    }

    /// Assign a business unit from the proposal title and the raw CRM label.
    ///
    /// Rules, in priority order:
    /// 1. A standalone `TS` token (or `(TS)`) in the title forces TRAVAUX.
    /// 2. Keyword match on the raw label: MAINTENANCE/ENTRETIEN, then
    ///    TRAVAUX/CHANTIER, then CONCEPTION/ETUDE.
    /// 3. Anything else is AUTRE. Unrecognized labels never error.
    pub fn classify(title: &str, raw_bu: &str) -> Self {
        let title_upper = title.to_uppercase();
        if has_ts_marker(&title_upper) {
            return BusinessUnit::Travaux;
        }

        let raw_upper = raw_bu.to_uppercase();
        if MAINTENANCE_KEYWORDS.iter().any(|kw| raw_upper.contains(kw)) {
            return BusinessUnit::Maintenance;
        }
        if TRAVAUX_KEYWORDS.iter().any(|kw| raw_upper.contains(kw)) {
            return BusinessUnit::Travaux;
        }
        if CONCEPTION_KEYWORDS.iter().any(|kw| raw_upper.contains(kw)) {
            return BusinessUnit::Conception;
        }

        BusinessUnit::Autre
    }
}

/// True if `title_upper` contains `TS` as its own token, e.g. "POSE (TS)" or
/// "TS JARDIN" but not "ARTS" or "TSAR".
fn has_ts_marker(title_upper: &str) -> bool {
    title_upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|tok| tok == "TS")
}

// ---------------------------------------------------------------------------
// Probability normalization
// ---------------------------------------------------------------------------

/// Normalize a raw win-probability percentage into a `[0, 1]` factor.
///
/// A raw value of 0 (or anything non-finite) means "not filled in" upstream
/// and is read as 50 %.
pub fn probability_factor_from_percent(raw_percent: f64) -> f64 {
    let percent = if !raw_percent.is_finite() || raw_percent == 0.0 {
        50.0
    } else {
        raw_percent
    };
    percent / 100.0
}

// ---------------------------------------------------------------------------
// ProposalRecord
// ---------------------------------------------------------------------------

/// One commercial proposal, as delivered by the upstream cleaning stage.
///
/// All source dates are optional: the engine's date resolver decides what to
/// do when they are missing or inconsistent. `probability_factor` is already
/// normalized into `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Opaque CRM identifier; used for diagnostics only.
    pub id: String,
    /// Total contract value, >= 0.
    pub amount: f64,
    pub business_unit: BusinessUnit,
    /// Date the proposal was created/sent; fallback anchor for resolution.
    pub proposal_date: Option<NaiveDate>,
    pub project_start: Option<NaiveDate>,
    pub project_stop: Option<NaiveDate>,
    /// Win-probability weight in [0, 1].
    pub probability_factor: f64,
}

impl ProposalRecord {
    pub fn new(
        id: impl Into<String>,
        amount: f64,
        business_unit: BusinessUnit,
        proposal_date: Option<NaiveDate>,
        project_start: Option<NaiveDate>,
        project_stop: Option<NaiveDate>,
        probability_factor: f64,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            business_unit,
            proposal_date,
            project_start,
            project_stop,
            probability_factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
