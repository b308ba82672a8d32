//! rvf-revenue
//!
//! Temporal revenue-allocation engine: distributes a proposal's contract
//! value across calendar months and folds the fragments into annual and
//! quarterly totals (raw and probability-weighted) over a fixed multi-year
//! tracking window.
//!
//! Architectural decisions:
//! - Pure deterministic logic. No IO, no wall-clock: the tracking window is
//!   injected at construction, dates arrive on the rows.
//! - Bad business data never errors. Missing or inconsistent dates degrade
//!   through a four-tier resolution policy; a row with no usable anchor
//!   yields an all-zero result tagged `missing_all_dates`.
//! - Out-of-window fragments are clamped to the nearest boundary month, so
//!   clamping relocates amount but never drops it.
//! - Diagnostics (`rule_name`, effective dates) exist for audit only and
//!   never drive control flow.

mod engine;
mod resolver;
mod spreader;
mod types;

pub use engine::RevenueEngine;
pub use resolver::resolve;
pub use spreader::{
    clamp_to_window, quarter_of, spread_conception, spread_maintenance, spread_travaux,
};
pub use types::*;
