//! rvf-objectives
//!
//! Injected objectives configuration: monthly revenue targets keyed by
//! `(year, metric, dimension, key)`, loaded from layered YAML documents and
//! validated for completeness at load time. Replaces the hardcoded
//! module-level tables the original reporting pipeline carried.
//!
//! The table is content-hashed (SHA-256 of the canonical JSON rendering) so
//! downstream reports can record exactly which objectives they ran against.
//!
//! Also carries the 11-month accounting helpers: July and August form a
//! single accounting period, with August's monthly objective always zero.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;

// ---------------------------------------------------------------------------
// Dimensions and expected key sets
// ---------------------------------------------------------------------------

/// Which pipeline stage an objective measures: proposals sent vs. signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveMetric {
    Envoye,
    Signe,
}

impl ObjectiveMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveMetric::Envoye => "envoye",
            ObjectiveMetric::Signe => "signe",
        }
    }
}

/// Grouping axis for the targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveDimension {
    Bu,
    Typologie,
}

impl ObjectiveDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveDimension::Bu => "bu",
            ObjectiveDimension::Typologie => "typologie",
        }
    }
}

/// Every business-unit key each year/metric must provide.
pub const EXPECTED_BUS: &[&str] = &["CONCEPTION", "TRAVAUX", "MAINTENANCE", "AUTRE"];

/// Every typologie key each year/metric must provide.
pub const EXPECTED_TYPOLOGIES: &[&str] = &[
    "Conception Concours",
    "Conception DV",
    "Conception Paysage",
    "Travaux Direct",
    "Travaux DV",
    "Travaux Conception",
    "Maintenance TS",
    "Maintenance Entretien",
    "Maintenance Animation",
    "Autre",
];

// ---------------------------------------------------------------------------
// Table model
// ---------------------------------------------------------------------------

/// Targets for one metric: key -> 12 monthly values, per dimension.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricObjectives {
    #[serde(default)]
    pub bu: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub typologie: BTreeMap<String, Vec<f64>>,
}

impl MetricObjectives {
    fn dimension(&self, dimension: ObjectiveDimension) -> &BTreeMap<String, Vec<f64>> {
        match dimension {
            ObjectiveDimension::Bu => &self.bu,
            ObjectiveDimension::Typologie => &self.typologie,
        }
    }

    fn is_empty(&self) -> bool {
        self.bu.is_empty() && self.typologie.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YearObjectives {
    #[serde(default)]
    pub envoye: MetricObjectives,
    #[serde(default)]
    pub signe: MetricObjectives,
}

impl YearObjectives {
    fn metric(&self, metric: ObjectiveMetric) -> &MetricObjectives {
        match metric {
            ObjectiveMetric::Envoye => &self.envoye,
            ObjectiveMetric::Signe => &self.signe,
        }
    }
}

/// The full objectives table: year -> metric -> dimension -> key -> 12
/// monthly values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectivesTable {
    pub years: BTreeMap<i32, YearObjectives>,
}

impl ObjectivesTable {
    /// Monthly values for one key, or `None` when absent.
    pub fn monthly(
        &self,
        year: i32,
        metric: ObjectiveMetric,
        dimension: ObjectiveDimension,
        key: &str,
    ) -> Option<&[f64]> {
        self.years
            .get(&year)?
            .metric(metric)
            .dimension(dimension)
            .get(key)
            .map(|v| v.as_slice())
    }

    /// Quarterly sums for one key.
    pub fn quarterly(
        &self,
        year: i32,
        metric: ObjectiveMetric,
        dimension: ObjectiveDimension,
        key: &str,
    ) -> Option<[f64; 4]> {
        let months = self.monthly(year, metric, dimension, key)?;
        let mut quarters = [0.0; 4];
        for (i, value) in months.iter().enumerate() {
            quarters[(i / 3).min(3)] += value;
        }
        Some(quarters)
    }

    /// Annual sum for one key.
    pub fn annual(
        &self,
        year: i32,
        metric: ObjectiveMetric,
        dimension: ObjectiveDimension,
        key: &str,
    ) -> Option<f64> {
        self.monthly(year, metric, dimension, key)
            .map(|months| months.iter().sum())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    Warn,
    Fail,
}

/// Check the table against the expected key sets. Every declared year must
/// carry both metrics, both dimensions, every expected key, and exactly 12
/// monthly values per key. Returns the issue list (empty when clean).
pub fn validate(table: &ObjectivesTable) -> Vec<String> {
    let mut issues = Vec::new();

    for (year, year_data) in &table.years {
        for metric in [ObjectiveMetric::Envoye, ObjectiveMetric::Signe] {
            let metric_data = year_data.metric(metric);
            if metric_data.is_empty() {
                issues.push(format!("year {year}: missing metric '{}'", metric.as_str()));
                continue;
            }

            for dimension in [ObjectiveDimension::Bu, ObjectiveDimension::Typologie] {
                let entries = metric_data.dimension(dimension);
                if entries.is_empty() {
                    issues.push(format!(
                        "year {year}, {}: missing dimension '{}'",
                        metric.as_str(),
                        dimension.as_str()
                    ));
                    continue;
                }

                let expected = match dimension {
                    ObjectiveDimension::Bu => EXPECTED_BUS,
                    ObjectiveDimension::Typologie => EXPECTED_TYPOLOGIES,
                };
                for key in expected {
                    match entries.get(*key) {
                        None => issues.push(format!(
                            "year {year}, {}, {}: missing key '{key}'",
                            metric.as_str(),
                            dimension.as_str()
                        )),
                        Some(values) if values.len() != 12 => issues.push(format!(
                            "year {year}, {}, {}, {key}: expected 12 values, got {}",
                            metric.as_str(),
                            dimension.as_str(),
                            values.len()
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A validated, content-hashed objectives table.
#[derive(Debug, Clone)]
pub struct LoadedObjectives {
    pub config_hash: String,
    pub canonical_json: String,
    pub table: ObjectivesTable,
    /// Validation issues (only populated under `ValidationPolicy::Warn`).
    pub issues: Vec<String>,
}

pub fn load_layered_yaml(paths: &[&str], policy: ValidationPolicy) -> Result<LoadedObjectives> {
    let mut docs: Vec<String> = Vec::new();
    for path in paths {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read objectives yaml: {path}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs, policy)
}

/// Merge YAML docs in order (earlier docs are base, later docs override),
/// validate, and hash the canonical JSON rendering.
pub fn load_layered_yaml_from_strings(
    yaml_docs: &[&str],
    policy: ValidationPolicy,
) -> Result<LoadedObjectives> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).context("invalid objectives yaml")?;
        // Year keys are bare integers in YAML; JSON maps need string keys.
        let v_json = serde_json::to_value(stringify_keys(v_yaml))
            .context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let table: ObjectivesTable =
        serde_json::from_value(merged.clone()).context("objectives table shape mismatch")?;

    let issues = validate(&table);
    if policy == ValidationPolicy::Fail && !issues.is_empty() {
        bail!(
            "OBJECTIVES_VALIDATION_FAILED: {} issue(s). First few: {}",
            issues.len(),
            preview_list(&issues, 8)
        );
    }

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());

    Ok(LoadedObjectives {
        config_hash,
        canonical_json,
        table,
        issues,
    })
}

fn stringify_keys(v: serde_yaml::Value) -> serde_yaml::Value {
    match v {
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (key, value) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim_end()
                        .to_string(),
                };
                out.insert(serde_yaml::Value::String(key), stringify_keys(value));
            }
            serde_yaml::Value::Mapping(out)
        }
        serde_yaml::Value::Sequence(seq) => {
            serde_yaml::Value::Sequence(seq.into_iter().map(stringify_keys).collect())
        }
        other => other,
    }
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{take:?}")
}

// ---------------------------------------------------------------------------
// 11-month accounting (July + August merged)
// ---------------------------------------------------------------------------

/// Accounting period labels; index 6 covers both July and August.
pub const ACCOUNTING_PERIODS: &[&str] = &[
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juil+Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// Distribute an annual total over the 11 accounting periods: every month
/// carries `annual_total / 11`, except August which carries 0 (July+August
/// together form one period).
pub fn eleven_month_distribution_from_annual(annual_total: f64) -> [f64; 12] {
    eleven_month_distribution_from_monthly(annual_total / 11.0)
}

/// Same shape from a fixed per-month amount (used for targets quoted
/// per month rather than per year).
pub fn eleven_month_distribution_from_monthly(monthly_amount: f64) -> [f64; 12] {
    let mut months = [monthly_amount; 12];
    months[7] = 0.0; // August
    months
}

/// Accounting period index (0..=10) for a calendar month (1..=12). July and
/// August both map to period 6.
pub fn accounting_period_for_month(month: u32) -> usize {
    debug_assert!((1..=12).contains(&month));
    match month {
        1..=6 => (month - 1) as usize,
        7 | 8 => 6,
        _ => (month - 2) as usize,
    }
}

pub fn accounting_period_label(period: usize) -> Option<&'static str> {
    ACCOUNTING_PERIODS.get(period).copied()
}

/// Calendar months (1..=12) belonging to an accounting period.
pub fn months_for_accounting_period(period: usize) -> Vec<u32> {
    (1..=12)
        .filter(|&month| accounting_period_for_month(month) == period)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
