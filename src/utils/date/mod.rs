// Date utility functions

use chrono::{DateTime, Duration, Local, NaiveDate};

pub fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    date.and_hms_opt(0, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or_else(|| Local::now())
}

/// Signed number of whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Iterate the dates of `[first, first + days)`.
pub fn date_span(first: NaiveDate, days: usize) -> impl Iterator<Item = NaiveDate> {
    (0..days as i64).filter_map(move |i| first.checked_add_signed(Duration::days(i)))
}
