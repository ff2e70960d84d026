//! Placement engine.
//!
//! Assigns every grid item a sub-cell index so that items with intersecting
//! column and row ranges never share a sub-cell, while keeping the overlap
//! group's sub-cell count minimal. Overlaps within one column form an
//! interval graph, so greedy assignment in row-start order is optimal.
//!
//! Index policy: a newly placed item takes the lowest sub-cell index not
//! used by any conflicting item; surviving items are never renumbered when
//! a neighbor is added or removed, only their group count changes. A freed
//! index is reused by a later insertion. Renumbering would make items jump
//! visibly during live edits, so this is deliberate.

use std::collections::HashSet;

use crate::models::grid_item::{ItemArena, ItemId};

/// Live items whose column range and row span both intersect `id`'s.
pub fn conflicts_of(arena: &ItemArena, id: ItemId) -> Vec<ItemId> {
    let Some(item) = arena.get(id) else {
        return Vec::new();
    };
    arena
        .iter()
        .filter(|(other_id, other)| *other_id != id && other.overlaps(item))
        .map(|(other_id, _)| other_id)
        .collect()
}

/// Place one item among the already-placed `candidates`, assigning its
/// sub-cell index and growing the conflict group's count as needed.
fn place_among(arena: &mut ItemArena, id: ItemId, candidates: &[ItemId]) {
    let Some(item) = arena.get(id).cloned() else {
        return;
    };

    let conflicts: Vec<ItemId> = candidates
        .iter()
        .copied()
        .filter(|&other_id| {
            other_id != id
                && arena
                    .get(other_id)
                    .map(|other| other.overlaps(&item))
                    .unwrap_or(false)
        })
        .collect();

    let used: HashSet<usize> = conflicts
        .iter()
        .filter_map(|&c| arena.get(c).map(|i| i.sub_cell))
        .collect();
    let index = (0..).find(|i| !used.contains(i)).unwrap_or(0);

    let mut count = conflicts
        .iter()
        .filter_map(|&c| arena.get(c).map(|i| i.sub_cells))
        .max()
        .unwrap_or(1);
    if index >= count {
        count = index + 1;
    }

    if let Some(target) = arena.get_mut(id) {
        target.sub_cell = index;
        target.sub_cells = count;
    }
    // Conflict peers keep their index but adopt the grown count, which is
    // what shrinks their painted width.
    for c in conflicts {
        if let Some(peer) = arena.get_mut(c) {
            peer.sub_cells = count;
        }
    }
}

/// Place (or re-place after a geometry change) one item against every other
/// live item.
pub fn place_item(arena: &mut ItemArena, id: ItemId) {
    let candidates: Vec<ItemId> = arena.ids().into_iter().filter(|&c| c != id).collect();
    place_among(arena, id, &candidates);
}

/// Transitive closure of the overlap relation over live items, seeded by
/// `seeds`.
fn overlap_component(arena: &ItemArena, seeds: &[ItemId]) -> Vec<ItemId> {
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut queue: Vec<ItemId> = seeds
        .iter()
        .copied()
        .filter(|&s| arena.get(s).is_some())
        .collect();
    while let Some(id) = queue.pop() {
        if !visited.insert(id) {
            continue;
        }
        for next in conflicts_of(arena, id) {
            if !visited.contains(&next) {
                queue.push(next);
            }
        }
    }
    visited.into_iter().collect()
}

/// Recompute group counts for the overlap components containing `seeds`,
/// keeping every member's index. Used after an item leaves a group. Seeds
/// in different components get their counts computed independently.
pub fn repack(arena: &mut ItemArena, seeds: &[ItemId]) {
    let mut visited: HashSet<ItemId> = HashSet::new();
    for &seed in seeds {
        if visited.contains(&seed) || arena.get(seed).is_none() {
            continue;
        }
        let component = overlap_component(arena, &[seed]);
        let count = component
            .iter()
            .filter_map(|&id| arena.get(id).map(|i| i.sub_cell))
            .max()
            .map(|max| max + 1)
            .unwrap_or(1);
        for &id in &component {
            visited.insert(id);
            if let Some(item) = arena.get_mut(id) {
                item.sub_cells = count;
            }
        }
    }
}

/// Retire an item and shrink the groups it leaves behind.
pub fn remove_item(arena: &mut ItemArena, id: ItemId) {
    let former = conflicts_of(arena, id);
    arena.retire(id);
    if !former.is_empty() {
        repack(arena, &former);
    }
}

/// Deterministic placement order: column, then row start, then identity as
/// the insertion-order tie-break.
fn layout_order(arena: &ItemArena) -> Vec<ItemId> {
    let mut ids = arena.ids();
    ids.sort_by_key(|&id| {
        let item = arena.get(id).expect("live id");
        (item.column, item.row_top, item.occurrence, id.index())
    });
    ids
}

/// Re-place every live item from scratch in row-start order. Rebuilding an
/// unchanged item set is idempotent, and the resulting group counts are
/// interval-graph optimal.
pub fn relayout_all(arena: &mut ItemArena) {
    let order = layout_order(arena);
    for id in &order {
        if let Some(item) = arena.get_mut(*id) {
            item.sub_cell = 0;
            item.sub_cells = 1;
        }
    }
    for (i, &id) in order.iter().enumerate() {
        place_among(arena, id, &order[..i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grid_item::GridItem;
    use crate::models::occurrence::OccurrenceId;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn occ(n: i64) -> OccurrenceId {
        OccurrenceId::new(n, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
    }

    fn timed(arena: &mut ItemArena, n: i64, column: usize, top: usize, bottom: usize) -> ItemId {
        let id = arena.insert(GridItem::new(occ(n), column, top, bottom));
        place_item(arena, id);
        id
    }

    #[test]
    fn test_no_conflict_full_width() {
        let mut arena = ItemArena::new();
        let id = timed(&mut arena, 1, 0, 4, 8);
        let item = arena.get(id).unwrap();
        assert_eq!((item.sub_cell, item.sub_cells), (0, 1));
    }

    #[test]
    fn test_scenario_a_two_overlapping_items() {
        let mut arena = ItemArena::new();
        let x = timed(&mut arena, 1, 2, 4, 8);
        let y = timed(&mut arena, 2, 2, 6, 10);

        let x = arena.get(x).unwrap();
        let y = arena.get(y).unwrap();
        assert_eq!((x.sub_cell, x.sub_cells), (0, 2));
        assert_eq!((y.sub_cell, y.sub_cells), (1, 2));
    }

    #[test]
    fn test_same_rows_different_columns_no_conflict() {
        let mut arena = ItemArena::new();
        let a = timed(&mut arena, 1, 0, 4, 8);
        let b = timed(&mut arena, 2, 1, 4, 8);
        assert_eq!(arena.get(a).unwrap().sub_cells, 1);
        assert_eq!(arena.get(b).unwrap().sub_cells, 1);
    }

    #[test]
    fn test_lowest_free_index_reused() {
        let mut arena = ItemArena::new();
        let a = timed(&mut arena, 1, 0, 0, 10);
        let b = timed(&mut arena, 2, 0, 2, 12);
        let c = timed(&mut arena, 3, 0, 4, 14);
        assert_eq!(arena.get(c).unwrap().sub_cell, 2);

        // Free index 0, then insert a new overlapping item: it takes 0.
        remove_item(&mut arena, a);
        let d = timed(&mut arena, 4, 0, 6, 16);
        assert_eq!(arena.get(d).unwrap().sub_cell, 0);
        // Survivors were never renumbered.
        assert_eq!(arena.get(b).unwrap().sub_cell, 1);
        assert_eq!(arena.get(c).unwrap().sub_cell, 2);
    }

    #[test]
    fn test_removal_decrements_group_count() {
        let mut arena = ItemArena::new();
        let a = timed(&mut arena, 1, 0, 0, 10);
        let b = timed(&mut arena, 2, 0, 2, 12);
        let c = timed(&mut arena, 3, 0, 4, 14);
        assert_eq!(arena.get(a).unwrap().sub_cells, 3);

        remove_item(&mut arena, c);
        assert_eq!(arena.get(a).unwrap().sub_cells, 2);
        assert_eq!(arena.get(b).unwrap().sub_cells, 2);
    }

    #[test]
    fn test_no_overlap_property_after_incremental_inserts() {
        let mut arena = ItemArena::new();
        for n in 0..12 {
            timed(&mut arena, n, (n % 3) as usize, (n as usize * 3) % 40, (n as usize * 3) % 40 + 9);
        }
        let items: Vec<_> = arena.iter().map(|(_, i)| i.clone()).collect();
        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                if a.overlaps(b) {
                    assert_ne!(a.sub_cell, b.sub_cell, "{:?} vs {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_relayout_minimality_chain_of_overlaps() {
        // A overlaps B, B overlaps C, but A and C are disjoint: the max
        // clique is 2, so only indices {0, 1} may appear.
        let mut arena = ItemArena::new();
        arena.insert(GridItem::new(occ(1), 0, 0, 10));
        arena.insert(GridItem::new(occ(2), 0, 8, 20));
        arena.insert(GridItem::new(occ(3), 0, 18, 30));
        relayout_all(&mut arena);

        let indices: HashSet<usize> = arena.iter().map(|(_, i)| i.sub_cell).collect();
        assert_eq!(indices, HashSet::from([0, 1]));
        assert!(arena.iter().all(|(_, i)| i.sub_cells <= 2));
    }

    #[test]
    fn test_relayout_is_idempotent() {
        let mut arena = ItemArena::new();
        for n in 0..10 {
            arena.insert(GridItem::new(
                occ(n),
                (n % 2) as usize,
                (n as usize * 5) % 50,
                (n as usize * 5) % 50 + 12,
            ));
        }
        relayout_all(&mut arena);
        let first: Vec<_> = arena
            .iter()
            .map(|(_, i)| (i.occurrence, i.sub_cell, i.sub_cells))
            .collect();
        relayout_all(&mut arena);
        let second: Vec<_> = arena
            .iter()
            .map(|(_, i)| (i.occurrence, i.sub_cell, i.sub_cells))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_c_move_into_occupied_column() {
        let mut arena = ItemArena::new();
        let mover = timed(&mut arena, 1, 1, 4, 8);
        let resident = timed(&mut arena, 2, 2, 6, 10);
        assert_eq!(arena.get(mover).unwrap().sub_cells, 1);
        assert_eq!(arena.get(resident).unwrap().sub_cells, 1);

        // Engine move path: note old conflicts, mutate, repack, re-place.
        let old = conflicts_of(&arena, mover);
        arena.get_mut(mover).unwrap().column = 2;
        repack(&mut arena, &old);
        place_item(&mut arena, mover);

        assert_eq!(arena.get(mover).unwrap().sub_cells, 2);
        assert_eq!(arena.get(resident).unwrap().sub_cells, 2);
        assert_ne!(
            arena.get(mover).unwrap().sub_cell,
            arena.get(resident).unwrap().sub_cell
        );
    }
}
