// Test fixtures - reusable test data
// Provides a scriptable in-memory store and occurrence builders

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

use timegrid::models::occurrence::{Occurrence, OccurrenceId};
use timegrid::services::chain::VisibleRange;
use timegrid::services::storage::{CalendarStore, EditScope};

/// Route engine log output through `RUST_LOG` while tests run.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Monday, March 9, 2026 - the first day of the standard test week.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

pub fn week() -> VisibleRange {
    VisibleRange::new(monday(), 7)
}

/// Local instant on a day of March 2026.
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 3, day, hour, minute, 0)
        .unwrap()
}

pub fn id(n: i64, day: u32) -> OccurrenceId {
    OccurrenceId::new(n, NaiveDate::from_ymd_opt(2026, 3, day).unwrap())
}

/// Timed occurrence within one day of March 2026.
pub fn timed(n: i64, day: u32, from: (u32, u32), to: (u32, u32)) -> Occurrence {
    Occurrence::new(
        id(n, day),
        format!("timed {n}"),
        at(day, from.0, from.1),
        at(day, to.0, to.1),
    )
}

/// Timed occurrence spanning several days.
pub fn spanning(n: i64, from: (u32, u32, u32), to: (u32, u32, u32)) -> Occurrence {
    Occurrence::new(
        id(n, from.0),
        format!("span {n}"),
        at(from.0, from.1, from.2),
        at(to.0, to.1, to.2),
    )
}

/// All-day occurrence covering a day range.
pub fn all_day(n: i64, from_day: u32, to_day: u32) -> Occurrence {
    let mut occ = Occurrence::new(
        id(n, from_day),
        format!("all-day {n}"),
        at(from_day, 0, 0),
        at(to_day, 23, 0),
    );
    occ.all_day = true;
    occ
}

/// Scriptable store: serves a fixed occurrence list and records every lock
/// and commit the engine dispatches.
pub struct FakeStore {
    pub occurrences: Vec<Occurrence>,
    pub accept_lock: bool,
    pub accept_commit: bool,
    pub scope: EditScope,
    pub locks: Vec<OccurrenceId>,
    pub commits: Vec<Occurrence>,
}

impl FakeStore {
    pub fn new(occurrences: Vec<Occurrence>) -> Self {
        Self {
            occurrences,
            accept_lock: true,
            accept_commit: true,
            scope: EditScope::Series,
            locks: Vec::new(),
            commits: Vec::new(),
        }
    }
}

impl CalendarStore for FakeStore {
    fn occurrences_in_range(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Vec<Occurrence> {
        self.occurrences
            .iter()
            .filter(|o| o.start < to && o.end + Duration::seconds(1) > from)
            .cloned()
            .collect()
    }

    fn begin_change(&mut self, id: OccurrenceId) -> bool {
        self.locks.push(id);
        self.accept_lock
    }

    fn end_change(&mut self, occurrence: &Occurrence) -> bool {
        if self.accept_commit {
            self.commits.push(occurrence.clone());
            if let Some(slot) = self
                .occurrences
                .iter_mut()
                .find(|o| o.id == occurrence.id)
            {
                *slot = occurrence.clone();
            }
        }
        self.accept_commit
    }

    fn resolve_recurrence_edit_scope(&mut self, _id: OccurrenceId) -> EditScope {
        self.scope
    }
}
