//! Storage collaborator interface.
//!
//! The engine owns no persistence; fetching, locking and committing
//! incidences belong to an external store reached through this trait. The
//! engine assumes no ordering from `occurrences_in_range` and re-sorts
//! internally.

use chrono::{DateTime, Local};

use crate::models::occurrence::{Occurrence, OccurrenceId};

/// Outcome of the three-way prompt shown before editing one occurrence of a
/// recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Apply to the whole recurring series.
    Series,
    /// Detach a standalone copy; the series gains an exception date.
    ThisOnly,
    /// Split the series at this date.
    ThisAndFuture,
    /// Decline; the gesture rolls back.
    Cancel,
}

#[cfg_attr(test, mockall::automock)]
pub trait CalendarStore {
    /// Occurrences intersecting `[from, to)`. Lazy; may be re-queried after
    /// a change notification. No ordering guarantee.
    fn occurrences_in_range(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Vec<Occurrence>;

    /// Acquire an edit lock. `false` aborts the gesture.
    fn begin_change(&mut self, id: OccurrenceId) -> bool;

    /// Dispatch the commit. `false` rolls the gesture back.
    fn end_change(&mut self, occurrence: &Occurrence) -> bool;

    /// Only invoked when the edited occurrence recurs.
    fn resolve_recurrence_edit_scope(&mut self, id: OccurrenceId) -> EditScope;
}
