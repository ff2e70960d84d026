//! Month grid adapter.
//!
//! Reuses the placement engine at week-cell granularity: each item becomes a
//! single column-spanning arena entry (column = day offset into the month
//! grid), conflict is plain date-range intersection, and the assigned
//! sub-cell index doubles as the vertical stacking slot inside a week cell.
//! Items crossing a week boundary are split into per-week fragments that
//! know whether they carry the visual start or end of the item.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::models::grid_item::{GridItem, ItemArena, ItemId};
use crate::models::occurrence::{Occurrence, OccurrenceId};
use crate::services::placement;
use crate::utils::date;

/// The rectangular month grid: `weeks` rows of 7 day cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    /// Date of the top-left cell (start of the first week row).
    pub first_day: NaiveDate,
    pub weeks: usize,
}

impl MonthGrid {
    pub fn new(first_day: NaiveDate, weeks: usize) -> Self {
        Self {
            first_day,
            weeks: weeks.max(1),
        }
    }

    pub fn days(&self) -> usize {
        self.weeks * 7
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days(self.days() as i64 - 1)
    }

    fn day_offset(&self, date: NaiveDate) -> Option<usize> {
        let offset = date::days_between(self.first_day, date);
        if offset >= 0 && (offset as usize) < self.days() {
            Some(offset as usize)
        } else {
            None
        }
    }
}

/// One week-row slice of a placed month item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthFragment {
    pub occurrence: OccurrenceId,
    pub week_row: usize,
    /// Weekday columns covered within the week row, inclusive.
    pub start_weekday: usize,
    pub end_weekday: usize,
    /// Vertical stacking slot within the week cell.
    pub slot: usize,
    pub slots: usize,
    /// Carries the item's visual start (rounded cap, label) — false when the
    /// item begins before this fragment or before the grid.
    pub is_first: bool,
    pub is_last: bool,
}

/// Overflow bookkeeping for one week cell with limited vertical capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOverflow {
    pub first_visible: usize,
    pub last_visible: usize,
    pub hidden_above: usize,
    pub hidden_below: usize,
}

#[derive(Default)]
pub struct MonthAdapter {
    grid: Option<MonthGrid>,
    arena: ItemArena,
    items: HashMap<OccurrenceId, ItemId>,
    /// True when the item extends beyond the grid on that side.
    clipped: HashMap<OccurrenceId, (bool, bool)>,
}

impl MonthAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> Option<MonthGrid> {
        self.grid
    }

    /// Replace the grid span and item set, then assign stacking slots.
    pub fn set_items(&mut self, grid: MonthGrid, occurrences: &[Occurrence]) {
        self.grid = Some(grid);
        self.arena = ItemArena::new();
        self.items.clear();
        self.clipped.clear();

        for occurrence in occurrences {
            let start = occurrence.first_day();
            let end = occurrence.last_day();
            if end < grid.first_day || start > grid.last_day() {
                continue;
            }
            let clipped_start = start < grid.first_day;
            let clipped_end = end > grid.last_day();
            let first = grid.day_offset(start.max(grid.first_day)).unwrap_or(0);
            let last = grid
                .day_offset(end.min(grid.last_day()))
                .unwrap_or(grid.days() - 1);

            let item = GridItem::new_all_day(occurrence.id, first, last - first + 1);
            let id = self.arena.insert(item);
            self.items.insert(occurrence.id, id);
            self.clipped
                .insert(occurrence.id, (clipped_start, clipped_end));
        }
        placement::relayout_all(&mut self.arena);
    }

    /// Remove one item, shrinking the stacks it leaves.
    pub fn remove(&mut self, id: OccurrenceId) {
        if let Some(item_id) = self.items.remove(&id) {
            placement::remove_item(&mut self.arena, item_id);
            self.clipped.remove(&id);
        }
    }

    /// All fragments, split at week boundaries, ordered by week row then
    /// stacking slot.
    pub fn fragments(&self) -> Vec<MonthFragment> {
        let Some(_grid) = self.grid else {
            return Vec::new();
        };
        let mut fragments = Vec::new();
        for (_, item) in self.arena.iter() {
            let (clipped_start, clipped_end) = self
                .clipped
                .get(&item.occurrence)
                .copied()
                .unwrap_or((false, false));
            let first_week = item.column / 7;
            let last_week = item.last_column() / 7;
            for week_row in first_week..=last_week {
                let row_first = week_row * 7;
                let row_last = row_first + 6;
                fragments.push(MonthFragment {
                    occurrence: item.occurrence,
                    week_row,
                    start_weekday: item.column.max(row_first) - row_first,
                    end_weekday: item.last_column().min(row_last) - row_first,
                    slot: item.sub_cell,
                    slots: item.sub_cells,
                    is_first: week_row == first_week && !clipped_start,
                    is_last: week_row == last_week && !clipped_end,
                });
            }
        }
        fragments.sort_by_key(|f| (f.week_row, f.slot, f.start_weekday));
        fragments
    }

    /// Number of stacking slots needed by the cell at (week_row, weekday).
    pub fn slots_in_cell(&self, week_row: usize, weekday: usize) -> usize {
        let column = week_row * 7 + weekday;
        self.arena
            .iter()
            .filter(|(_, item)| item.column <= column && column <= item.last_column())
            .map(|(_, item)| item.sub_cells)
            .max()
            .unwrap_or(0)
    }

    /// Visible slot window for a cell holding `total` slots with room for
    /// `capacity`, scrolled down by `offset` slots. Indicator arrows derive
    /// from the hidden counts.
    pub fn cell_overflow(total: usize, capacity: usize, offset: usize) -> Option<CellOverflow> {
        if total == 0 || capacity == 0 {
            return None;
        }
        let capacity = capacity.min(total);
        let max_offset = total - capacity;
        let offset = offset.min(max_offset);
        Some(CellOverflow {
            first_visible: offset,
            last_visible: offset + capacity - 1,
            hidden_above: offset,
            hidden_below: total - capacity - offset,
        })
    }
}
