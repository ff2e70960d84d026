//! Now-indicator.
//!
//! Read-only overlay marking the current wall-clock time on the grid.
//! Derived from the visible day columns and the clock; hidden when today is
//! not on screen.

use chrono::{DateTime, Duration, Local, NaiveDate, Timelike};

use crate::services::coords::GridMapper;

/// Where the current-time line is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NowMarker {
    pub date: NaiveDate,
    pub column: usize,
    pub row: usize,
    /// Continuous vertical position, not snapped to slot boundaries.
    pub y: f32,
}

#[derive(Debug, Default)]
pub struct NowIndicator {
    pub show_seconds: bool,
    last_date: Option<NaiveDate>,
}

impl NowIndicator {
    pub fn new(show_seconds: bool) -> Self {
        Self {
            show_seconds,
            last_date: None,
        }
    }

    /// Locate the marker, or `None` when today is outside the visible set.
    pub fn compute(
        &self,
        dates: &[NaiveDate],
        now: DateTime<Local>,
        mapper: &GridMapper,
    ) -> Option<NowMarker> {
        let today = now.date_naive();
        let column = dates.iter().position(|d| *d == today)?;
        let time = now.time();
        Some(NowMarker {
            date: today,
            column,
            row: mapper.time_to_row(time),
            y: mapper.time_to_y(time),
        })
    }

    /// Refresh cadence: once per second while seconds are shown, else once
    /// per minute.
    pub fn refresh_interval(&self) -> Duration {
        if self.show_seconds {
            Duration::seconds(1)
        } else {
            Duration::minutes(1)
        }
    }

    /// Deadline of the next refresh, aligned to the cadence boundary.
    pub fn next_refresh(&self, now: DateTime<Local>) -> DateTime<Local> {
        if self.show_seconds {
            now + Duration::seconds(1) - Duration::nanoseconds(now.nanosecond() as i64)
        } else {
            let into_minute = Duration::seconds(now.second() as i64)
                + Duration::nanoseconds(now.nanosecond() as i64);
            now + Duration::minutes(1) - into_minute
        }
    }

    /// True exactly once per day-boundary crossing; forces a recompute of
    /// which column is "today".
    pub fn day_rolled_over(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        let rolled = self.last_date.map(|d| d != today).unwrap_or(false);
        self.last_date = Some(today);
        rolled
    }
}
