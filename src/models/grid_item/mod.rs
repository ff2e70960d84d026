// GridItem module
// Placement units and the generation-tagged arena that owns them

use crate::models::occurrence::OccurrenceId;

/// Handle into the [`ItemArena`]. Stale handles (outliving a sweep of their
/// slot) resolve to `None` rather than aliasing a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// The visual placement unit for one occurrence on one visible day.
///
/// Invariants: `row_top <= row_bottom` (rows are inclusive time slots),
/// `sub_cell < sub_cells`, and chain links are contiguous in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct GridItem {
    pub occurrence: OccurrenceId,
    /// 0-based day index from the leftmost visible day.
    pub column: usize,
    /// Columns covered; timed items always span 1, all-day and month items
    /// span `[column, column + column_span - 1]`.
    pub column_span: usize,
    pub row_top: usize,
    pub row_bottom: usize,
    /// Sub-cell index assigned by the placement engine.
    pub sub_cell: usize,
    /// Size of the overlap group the item belongs to.
    pub sub_cells: usize,
    pub all_day: bool,
    pub prev: Option<ItemId>,
    pub next: Option<ItemId>,
}

impl GridItem {
    /// Create an unplaced item. An inverted row span is clamped, never kept.
    pub fn new(occurrence: OccurrenceId, column: usize, row_top: usize, row_bottom: usize) -> Self {
        let (row_top, row_bottom) = if row_bottom < row_top {
            (row_top, row_top)
        } else {
            (row_top, row_bottom)
        };
        Self {
            occurrence,
            column,
            column_span: 1,
            row_top,
            row_bottom,
            sub_cell: 0,
            sub_cells: 1,
            all_day: false,
            prev: None,
            next: None,
        }
    }

    /// Create an unplaced all-day item spanning a column range.
    pub fn new_all_day(occurrence: OccurrenceId, column: usize, column_span: usize) -> Self {
        let mut item = Self::new(occurrence, column, 0, 0);
        item.column_span = column_span.max(1);
        item.all_day = true;
        item
    }

    pub fn last_column(&self) -> usize {
        self.column + self.column_span - 1
    }

    pub fn columns_intersect(&self, other: &GridItem) -> bool {
        self.column <= other.last_column() && other.column <= self.last_column()
    }

    pub fn rows_intersect(&self, other: &GridItem) -> bool {
        self.row_top <= other.row_bottom && other.row_top <= self.row_bottom
    }

    /// Two items conflict when they share a grid flavor and both their
    /// column ranges and their row spans intersect. Timed and all-day items
    /// never conflict with each other.
    pub fn overlaps(&self, other: &GridItem) -> bool {
        self.all_day == other.all_day
            && self.columns_intersect(other)
            && self.rows_intersect(other)
    }

    pub fn is_chain_head(&self) -> bool {
        self.prev.is_none()
    }

    pub fn is_chain_tail(&self) -> bool {
        self.next.is_none()
    }
}

struct Slot {
    generation: u32,
    item: Option<GridItem>,
    /// Retired items are excluded from all queries but still physically
    /// present until the next sweep (or until restored mid-gesture).
    retired: bool,
}

/// Generation-tagged arena owning every [`GridItem`].
///
/// Removal is two-phase: `retire` marks an item dead immediately (queries
/// stop returning it) and the slot is reclaimed on the next `sweep`, which
/// the engine runs at an idle boundary. `hide`/`restore` use the same
/// retired flag for chain links detached during an in-progress drag.
#[derive(Default)]
pub struct ItemArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pending_sweep: Vec<ItemId>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            generation: 0,
            item: None,
            retired: false,
        }
    }
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: GridItem) -> ItemId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.item = Some(item);
            slot.retired = false;
            ItemId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                item: Some(item),
                retired: false,
            });
            ItemId {
                index,
                generation: 0,
            }
        }
    }

    fn slot(&self, id: ItemId) -> Option<&Slot> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation && s.item.is_some())
    }

    /// Look up a live (non-retired) item.
    pub fn get(&self, id: ItemId) -> Option<&GridItem> {
        self.slot(id)
            .filter(|s| !s.retired)
            .and_then(|s| s.item.as_ref())
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut GridItem> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation && !s.retired)
            .and_then(|s| s.item.as_mut())
    }

    /// Look up an item even if it is currently hidden/retired.
    pub fn get_any(&self, id: ItemId) -> Option<&GridItem> {
        self.slot(id).and_then(|s| s.item.as_ref())
    }

    pub fn get_any_mut(&mut self, id: ItemId) -> Option<&mut GridItem> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.item.as_mut())
    }

    pub fn is_hidden(&self, id: ItemId) -> bool {
        self.slot(id).map(|s| s.retired).unwrap_or(false)
    }

    /// Hide a chain link detached during a drag. The item stays resident so
    /// the gesture can be cancelled and the link restored exactly.
    pub fn hide(&mut self, id: ItemId) {
        if let Some(slot) = self
            .slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation && s.item.is_some())
        {
            slot.retired = true;
        }
    }

    /// Undo a `hide`.
    pub fn restore(&mut self, id: ItemId) {
        if let Some(slot) = self
            .slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation && s.item.is_some())
        {
            slot.retired = false;
        }
    }

    /// Mark an item removed. It disappears from queries now and its slot is
    /// physically reclaimed by the next `sweep`.
    pub fn retire(&mut self, id: ItemId) {
        if let Some(slot) = self
            .slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation && s.item.is_some())
        {
            if !slot.retired || !self.pending_sweep.contains(&id) {
                slot.retired = true;
                self.pending_sweep.push(id);
            }
        }
    }

    pub fn has_pending_sweep(&self) -> bool {
        !self.pending_sweep.is_empty()
    }

    /// Reclaim retired slots. Returns how many were freed.
    pub fn sweep(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_sweep);
        let mut freed = 0;
        for id in pending {
            if let Some(slot) = self
                .slots
                .get_mut(id.index())
                .filter(|s| s.generation == id.generation && s.retired)
            {
                slot.item = None;
                slot.retired = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                freed += 1;
            }
        }
        freed
    }

    /// Iterate live items.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &GridItem)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            if slot.retired {
                return None;
            }
            slot.item.as_ref().map(|item| {
                (
                    ItemId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    item,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retire every item. Used by full rebuilds.
    pub fn retire_all(&mut self) {
        for id in self.ids() {
            self.retire(id);
        }
    }
}
