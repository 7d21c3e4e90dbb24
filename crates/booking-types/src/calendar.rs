//! Calendar-day math for stay intervals.
//!
//! Inventory is per calendar day and a stay occupies the half-open day
//! range `[from, to)`: arrival April 1, departure April 2 is one night
//! (April 1), whatever the times of day involved.

use chrono::{DateTime, NaiveDate, Utc};

/// The nights a stay occupies: every calendar day `d` with
/// `from.day <= d < to.day`, in chronological order.
///
/// Empty when the interval is inverted or spans no day boundary.
#[must_use]
pub fn nights(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<NaiveDate> {
    let first = from.date_naive();
    let last = to.date_naive();
    first.iter_days().take_while(|day| *day < last).collect()
}
