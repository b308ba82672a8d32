//! Business-unit spreading algorithms and window clamping.
//!
//! All spreading iterates on calendar-month boundaries, never by adding
//! month offsets to the exact day: a project from Oct 20 to Dec 19 spans
//! Oct, Nov and Dec (3 months), where day-preserving arithmetic would drop
//! the last month whenever `stop.day < start.day` and silently lose amount.

use chrono::{Datelike, NaiveDate};

use crate::types::{EngineConfig, MonthlyAllocation};

/// Quarter (1..=4) for a calendar month (1..=12).
pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

// ---------------------------------------------------------------------------
// Month-boundary iteration
// ---------------------------------------------------------------------------

// Months are enumerated on a flat index (year * 12 + month - 1) so ranges
// crossing year boundaries need no special casing.

fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + month as i32 - 1
}

fn index_year(index: i32) -> i32 {
    index.div_euclid(12)
}

fn index_month(index: i32) -> u32 {
    (index.rem_euclid(12) + 1) as u32
}

/// Inclusive list of (year, month) pairs covering the calendar months
/// between `start` and `stop`. Empty when `stop`'s month precedes
/// `start`'s.
fn calendar_months(start: NaiveDate, stop: NaiveDate) -> Vec<(i32, u32)> {
    let first = month_index(start.year(), start.month());
    let last = month_index(stop.year(), stop.month());
    if last < first {
        return Vec::new();
    }
    (first..=last)
        .map(|idx| (index_year(idx), index_month(idx)))
        .collect()
}

// ---------------------------------------------------------------------------
// Spreading algorithms
// ---------------------------------------------------------------------------

/// MAINTENANCE: spread evenly over every calendar month of the duration.
pub fn spread_maintenance(
    amount: f64,
    start: NaiveDate,
    stop: NaiveDate,
) -> Vec<MonthlyAllocation> {
    let months = calendar_months(start, stop);
    if months.is_empty() {
        return Vec::new();
    }
    let monthly = amount / months.len() as f64;
    months
        .into_iter()
        .map(|(year, month)| MonthlyAllocation::new(year, month, monthly))
        .collect()
}

/// TRAVAUX / AUTRE: a project within a single calendar month books 100 %
/// upfront; anything longer spreads evenly like MAINTENANCE.
pub fn spread_travaux(amount: f64, start: NaiveDate, stop: NaiveDate) -> Vec<MonthlyAllocation> {
    if start.year() == stop.year() && start.month() == stop.month() {
        return vec![MonthlyAllocation::new(start.year(), start.month(), amount)];
    }
    spread_maintenance(amount, start, stop)
}

/// CONCEPTION: phased spreading anchored on the start month, stop date
/// ignored. Bracket by amount:
///
/// - below `low`: 3 equal monthly thirds;
/// - `low..=high` inclusive: 60 % over 6 months, 6-month pause, 40 % over
///   6 months;
/// - above `high`: 40 % over 12 months, 6-month pause, 60 % over 12 months.
pub fn spread_conception(
    amount: f64,
    start: NaiveDate,
    config: &EngineConfig,
) -> Vec<MonthlyAllocation> {
    let mut allocations = Vec::new();
    let mut cursor = month_index(start.year(), start.month());

    if amount < config.conception_threshold_low {
        push_phase(&mut allocations, &mut cursor, amount / 3.0, 3);
    } else if amount <= config.conception_threshold_high {
        push_phase(&mut allocations, &mut cursor, amount * 0.60 / 6.0, 6);
        cursor += 6;
        push_phase(&mut allocations, &mut cursor, amount * 0.40 / 6.0, 6);
    } else {
        push_phase(&mut allocations, &mut cursor, amount * 0.40 / 12.0, 12);
        cursor += 6;
        push_phase(&mut allocations, &mut cursor, amount * 0.60 / 12.0, 12);
    }

    allocations
}

fn push_phase(
    allocations: &mut Vec<MonthlyAllocation>,
    cursor: &mut i32,
    monthly_amount: f64,
    months: u32,
) {
    for _ in 0..months {
        allocations.push(MonthlyAllocation::new(
            index_year(*cursor),
            index_month(*cursor),
            monthly_amount,
        ));
        *cursor += 1;
    }
}

// ---------------------------------------------------------------------------
// Window clamping
// ---------------------------------------------------------------------------

/// Relocate an out-of-window allocation to the nearest boundary month,
/// amount unchanged: before the window lands on (first_year, January),
/// after it on (last_year, December). Clamping relocates, never drops.
pub fn clamp_to_window(
    allocation: MonthlyAllocation,
    first_year: i32,
    last_year: i32,
) -> MonthlyAllocation {
    if allocation.year < first_year {
        MonthlyAllocation::new(first_year, 1, allocation.amount)
    } else if allocation.year > last_year {
        MonthlyAllocation::new(last_year, 12, allocation.amount)
    } else {
        allocation
    }
}
