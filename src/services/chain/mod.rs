//! Multi-day chain builder.
//!
//! An occurrence whose span crosses visible day boundaries is split into a
//! doubly-linked chain of per-day grid items: the first link runs from the
//! mapped start time to the end of its day, interior links cover full days,
//! and the last link runs from the start of its day to the mapped end time.
//! All-day occurrences use a single all-day link spanning a column range
//! instead.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::models::grid_item::{GridItem, ItemArena, ItemId};
use crate::models::occurrence::Occurrence;
use crate::services::coords::GridMapper;
use crate::utils::date;

/// The window of days currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub first_day: NaiveDate,
    pub days: usize,
}

impl VisibleRange {
    pub fn new(first_day: NaiveDate, days: usize) -> Self {
        Self {
            first_day,
            days: days.max(1),
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days(self.days as i64 - 1)
    }

    /// Column of a date, if visible.
    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = date::days_between(self.first_day, date);
        if offset >= 0 && (offset as usize) < self.days {
            Some(offset as usize)
        } else {
            None
        }
    }

    pub fn date_of(&self, column: usize) -> NaiveDate {
        self.first_day + Duration::days(column as i64)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.column_of(date).is_some()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain link columns are not consecutive at column {0}")]
    NonConsecutiveColumns(usize),
    #[error("chain head has a predecessor")]
    HeadHasPredecessor,
    #[error("chain link resolves to a dead arena id")]
    DeadLink,
}

/// Build the chain of grid items for one occurrence within the visible
/// range. Returns the link ids head-first; empty when the occurrence does
/// not intersect the range.
pub fn build_chain(
    arena: &mut ItemArena,
    occurrence: &Occurrence,
    range: &VisibleRange,
    mapper: &GridMapper,
) -> Vec<ItemId> {
    let start_day = occurrence.first_day();
    let end_day = occurrence.last_day();
    if end_day < range.first_day || start_day > range.last_day() {
        return Vec::new();
    }

    if occurrence.all_day {
        // One link spanning the clipped column range on the all-day row.
        let first_col = range.column_of(start_day.max(range.first_day)).unwrap_or(0);
        let last_col = range
            .column_of(end_day.min(range.last_day()))
            .unwrap_or(range.days - 1);
        let item = GridItem::new_all_day(
            occurrence.id,
            first_col,
            last_col - first_col + 1,
        );
        return vec![arena.insert(item)];
    }

    let last_row = mapper.last_row();
    let visible_first = start_day.max(range.first_day);
    let visible_last = end_day.min(range.last_day());

    let mut ids: Vec<ItemId> = Vec::new();
    let mut day = visible_first;
    while day <= visible_last {
        let column = range.column_of(day).expect("day inside range");
        let row_top = if day == start_day {
            mapper.time_to_row(occurrence.start.time())
        } else {
            0
        };
        let row_bottom = if day == end_day {
            mapper.time_to_row(occurrence.end.time())
        } else {
            last_row
        };
        let id = arena.insert(GridItem::new(occurrence.id, column, row_top, row_bottom));
        if let Some(&prev) = ids.last() {
            if let Some(link) = arena.get_mut(id) {
                link.prev = Some(prev);
            }
            if let Some(prev_link) = arena.get_mut(prev) {
                prev_link.next = Some(id);
            }
        }
        ids.push(id);
        day += Duration::days(1);
    }

    debug_assert!(validate_chain(arena, ids[0]).is_ok());
    ids
}

/// Walk a chain head-first and collect its live link ids.
pub fn chain_links(arena: &ItemArena, head: ItemId) -> Vec<ItemId> {
    let mut ids = Vec::new();
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        if arena.get(id).is_none() {
            break;
        }
        ids.push(id);
        cursor = arena.get(id).and_then(|item| item.next);
    }
    ids
}

/// Find the chain head reachable from any link.
pub fn chain_head(arena: &ItemArena, id: ItemId) -> ItemId {
    let mut head = id;
    while let Some(prev) = arena.get(head).and_then(|item| item.prev) {
        if arena.get(prev).is_none() {
            break;
        }
        head = prev;
    }
    head
}

/// Confirm chain structure: walked from the head, columns are strictly
/// consecutive and exactly one link has no successor.
pub fn validate_chain(arena: &ItemArena, head: ItemId) -> Result<(), ChainError> {
    let head_item = arena.get(head).ok_or(ChainError::DeadLink)?;
    if let Some(prev) = head_item.prev {
        if arena.get(prev).is_some() {
            return Err(ChainError::HeadHasPredecessor);
        }
    }

    let mut expected_column = head_item.column;
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        let item = arena.get(id).ok_or(ChainError::DeadLink)?;
        if item.column != expected_column {
            return Err(ChainError::NonConsecutiveColumns(item.column));
        }
        expected_column += 1;
        cursor = item.next;
    }
    Ok(())
}

/// Synthesize a new first link one column to the left, carrying the start
/// row; the previous head becomes an interior (full-day) link. Used while a
/// start-edge resize drags past the current head's day.
pub fn extend_head(arena: &mut ItemArena, head: ItemId, last_row: usize) -> Option<ItemId> {
    let head_item = arena.get(head)?.clone();
    if head_item.column == 0 {
        return None;
    }
    let mut new_head = GridItem::new(
        head_item.occurrence,
        head_item.column - 1,
        head_item.row_top,
        last_row,
    );
    new_head.next = Some(head);
    let new_id = arena.insert(new_head);
    if let Some(old) = arena.get_mut(head) {
        old.prev = Some(new_id);
        old.row_top = 0;
        if old.next.is_some() {
            old.row_bottom = last_row;
        }
    }
    Some(new_id)
}

/// Mirror of `extend_head` at the chain tail.
pub fn extend_tail(
    arena: &mut ItemArena,
    tail: ItemId,
    last_row: usize,
    max_column: usize,
) -> Option<ItemId> {
    let tail_item = arena.get(tail)?.clone();
    if tail_item.column >= max_column {
        return None;
    }
    let mut new_tail = GridItem::new(
        tail_item.occurrence,
        tail_item.column + 1,
        0,
        tail_item.row_bottom,
    );
    new_tail.prev = Some(tail);
    let new_id = arena.insert(new_tail);
    if let Some(old) = arena.get_mut(tail) {
        old.next = Some(new_id);
        old.row_bottom = last_row;
        if old.prev.is_some() {
            old.row_top = 0;
        }
    }
    Some(new_id)
}

/// Detach and hide the head link (kept resident for gesture rollback).
/// Returns the new head. Refuses to empty the chain.
pub fn detach_head(arena: &mut ItemArena, head: ItemId) -> Option<ItemId> {
    let head_item = arena.get(head)?.clone();
    let next = head_item.next?;
    let carried_top = head_item.row_top;
    arena.hide(head);
    if let Some(new_head) = arena.get_mut(next) {
        new_head.prev = None;
        // The new head inherits the start row so the start time survives
        // the day-boundary crossing.
        new_head.row_top = carried_top.min(new_head.row_bottom);
    }
    Some(next)
}

/// Detach and hide the tail link. Returns the new tail.
pub fn detach_tail(arena: &mut ItemArena, tail: ItemId) -> Option<ItemId> {
    let tail_item = arena.get(tail)?.clone();
    let prev = tail_item.prev?;
    let carried_bottom = tail_item.row_bottom;
    arena.hide(tail);
    if let Some(new_tail) = arena.get_mut(prev) {
        new_tail.next = None;
        new_tail.row_bottom = carried_bottom.max(new_tail.row_top);
    }
    Some(prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::LayoutConfig;
    use crate::models::occurrence::{Occurrence, OccurrenceId};
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    fn mapper() -> GridMapper {
        GridMapper::timed(&LayoutConfig::default())
    }

    fn range() -> VisibleRange {
        VisibleRange::new(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(), 7)
    }

    fn occurrence(start: (u32, u32, u32), end: (u32, u32, u32)) -> Occurrence {
        // Day-of-month plus hour/minute within March 2026.
        let s = Local
            .with_ymd_and_hms(2026, 3, start.0, start.1, start.2, 0)
            .unwrap();
        let e = Local.with_ymd_and_hms(2026, 3, end.0, end.1, end.2, 0).unwrap();
        Occurrence::new(OccurrenceId::new(1, s.date_naive()), "span", s, e)
    }

    #[test]
    fn test_scenario_b_three_day_chain() {
        // Starts day 2 of the range at row 40, ends day 4 at row 10.
        let occ = occurrence((10, 10, 0), (12, 2, 30));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        assert_eq!(ids.len(), 3);

        let l0 = arena.get(ids[0]).unwrap();
        let l1 = arena.get(ids[1]).unwrap();
        let l2 = arena.get(ids[2]).unwrap();
        assert_eq!((l0.column, l0.row_top, l0.row_bottom), (1, 40, 95));
        assert_eq!((l1.column, l1.row_top, l1.row_bottom), (2, 0, 95));
        assert_eq!((l2.column, l2.row_top, l2.row_bottom), (3, 0, 10));
        assert!(l0.is_chain_head() && !l0.is_chain_tail());
        assert!(!l1.is_chain_head() && !l1.is_chain_tail());
        assert!(l2.is_chain_tail());
        assert!(validate_chain(&arena, ids[0]).is_ok());
    }

    #[test]
    fn test_single_day_degenerate_chain() {
        let occ = occurrence((10, 9, 0), (10, 10, 30));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        assert_eq!(ids.len(), 1);
        let link = arena.get(ids[0]).unwrap();
        assert_eq!((link.row_top, link.row_bottom), (36, 42));
        assert!(link.is_chain_head() && link.is_chain_tail());
    }

    #[test]
    fn test_chain_clipped_to_visible_range() {
        // Starts before the range and ends inside it.
        let occ = occurrence((7, 22, 0), (11, 8, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        assert_eq!(ids.len(), 3); // columns 0..=2 for Mar 9..=11
        assert_eq!(arena.get(ids[0]).unwrap().column, 0);
        // The clipped first link is an interior day: full span.
        assert_eq!(arena.get(ids[0]).unwrap().row_top, 0);
        assert_eq!(arena.get(ids[0]).unwrap().row_bottom, 95);
    }

    #[test]
    fn test_outside_range_builds_nothing() {
        let occ = occurrence((1, 9, 0), (2, 10, 0));
        let mut arena = ItemArena::new();
        assert!(build_chain(&mut arena, &occ, &range(), &mapper()).is_empty());
    }

    #[test]
    fn test_all_day_single_link_column_span() {
        let mut occ = occurrence((10, 0, 0), (12, 23, 59));
        occ.all_day = true;
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        assert_eq!(ids.len(), 1);
        let link = arena.get(ids[0]).unwrap();
        assert!(link.all_day);
        assert_eq!((link.column, link.column_span), (1, 3));
    }

    #[test]
    fn test_extend_head_relabels_old_head_interior() {
        let occ = occurrence((10, 10, 0), (11, 12, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        let new_head = extend_head(&mut arena, ids[0], 95).unwrap();

        let head = arena.get(new_head).unwrap();
        assert_eq!((head.column, head.row_top, head.row_bottom), (0, 40, 95));
        let old = arena.get(ids[0]).unwrap();
        assert_eq!((old.row_top, old.row_bottom), (0, 95));
        assert!(validate_chain(&arena, new_head).is_ok());
    }

    #[test]
    fn test_extend_head_stops_at_column_zero() {
        let occ = occurrence((9, 10, 0), (10, 12, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        assert!(extend_head(&mut arena, ids[0], 95).is_none());
    }

    #[test]
    fn test_detach_head_hides_not_destroys() {
        let occ = occurrence((10, 10, 0), (12, 12, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        let new_head = detach_head(&mut arena, ids[0]).unwrap();
        assert_eq!(new_head, ids[1]);

        assert!(arena.get(ids[0]).is_none());
        assert!(arena.get_any(ids[0]).is_some());
        // New head carries the start row forward.
        assert_eq!(arena.get(new_head).unwrap().row_top, 40);
        assert!(arena.get(new_head).unwrap().is_chain_head());
        assert!(validate_chain(&arena, new_head).is_ok());

        // Rollback path: restore the hidden link.
        arena.restore(ids[0]);
        assert!(arena.get(ids[0]).is_some());
    }

    #[test]
    fn test_extend_tail_then_validate() {
        let occ = occurrence((10, 10, 0), (11, 12, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        let tail = *ids.last().unwrap();
        let new_tail = extend_tail(&mut arena, tail, 95, 6).unwrap();

        let t = arena.get(new_tail).unwrap();
        assert_eq!((t.column, t.row_top, t.row_bottom), (3, 0, 48));
        let old = arena.get(tail).unwrap();
        assert_eq!(old.row_bottom, 95);
        assert!(validate_chain(&arena, chain_head(&arena, new_tail)).is_ok());
    }

    #[test]
    fn test_validate_detects_column_gap() {
        let occ = occurrence((10, 10, 0), (12, 12, 0));
        let mut arena = ItemArena::new();
        let ids = build_chain(&mut arena, &occ, &range(), &mapper());
        arena.get_mut(ids[1]).unwrap().column = 5;
        assert_eq!(
            validate_chain(&arena, ids[0]),
            Err(ChainError::NonConsecutiveColumns(5))
        );
    }
}
