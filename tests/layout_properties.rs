// Property-based tests for coordinate mapping and sub-cell placement
// Random configs and item sets; checks the structural layout guarantees

use proptest::prelude::*;

use timegrid::models::cell::Cell;
use timegrid::models::config::LayoutConfig;
use timegrid::models::grid_item::{GridItem, ItemArena};
use timegrid::models::occurrence::OccurrenceId;
use timegrid::services::coords::GridMapper;
use timegrid::services::placement;

fn config(minutes_per_row: u32, visible_days: usize, reversed: bool) -> LayoutConfig {
    LayoutConfig {
        minutes_per_row,
        visible_days,
        reversed,
        viewport_width: 910.0,
        origin_x: 50.0,
        origin_y: 40.0,
        ..Default::default()
    }
}

fn occ(n: i64) -> OccurrenceId {
    OccurrenceId::new(n, chrono::NaiveDate::from_ymd_opt(2026, 3, 9).unwrap())
}

proptest! {
    /// Every valid cell maps to a pixel corner that maps back to the same
    /// cell, for any slot granularity, week length and layout direction.
    #[test]
    fn prop_pixel_round_trip(
        minutes_per_row in prop::sample::select(vec![5u32, 10, 15, 20, 30, 60]),
        visible_days in 1usize..=14,
        reversed in any::<bool>(),
        column_seed in any::<u32>(),
        row_seed in any::<u32>(),
    ) {
        let cfg = config(minutes_per_row, visible_days, reversed);
        let mapper = GridMapper::timed(&cfg);
        let cell = Cell::new(
            column_seed as usize % mapper.columns(),
            row_seed as usize % mapper.rows(),
        );
        prop_assert_eq!(mapper.to_grid(mapper.to_pixel(cell)), cell);
    }

    /// Incremental placement never yields two overlapping items in the same
    /// sub-cell, and every slot index stays inside its group size.
    #[test]
    fn prop_no_overlap_after_random_inserts(
        spans in prop::collection::vec((0usize..7, 0usize..90, 1usize..20), 1..25),
    ) {
        let mut arena = ItemArena::new();
        for (n, (column, row_top, height)) in spans.iter().enumerate() {
            let item = GridItem::new(
                occ(n as i64),
                *column,
                *row_top,
                (row_top + height).min(95),
            );
            let id = arena.insert(item);
            placement::place_item(&mut arena, id);
        }

        let items: Vec<&GridItem> = arena.iter().map(|(_, item)| item).collect();
        for (i, a) in items.iter().enumerate() {
            prop_assert!(a.sub_cell < a.sub_cells);
            for b in items.iter().skip(i + 1) {
                if a.overlaps(b) {
                    prop_assert_ne!(a.sub_cell, b.sub_cell);
                }
            }
        }
    }

    /// A full relayout of an already laid-out arena changes nothing.
    #[test]
    fn prop_relayout_is_idempotent(
        spans in prop::collection::vec((0usize..7, 0usize..90, 1usize..20), 1..25),
    ) {
        let mut arena = ItemArena::new();
        for (n, (column, row_top, height)) in spans.iter().enumerate() {
            arena.insert(GridItem::new(
                occ(n as i64),
                *column,
                *row_top,
                (row_top + height).min(95),
            ));
        }
        placement::relayout_all(&mut arena);
        let first: Vec<GridItem> = arena.iter().map(|(_, i)| i.clone()).collect();

        placement::relayout_all(&mut arena);
        let second: Vec<GridItem> = arena.iter().map(|(_, i)| i.clone()).collect();
        prop_assert_eq!(first, second);
    }

    /// Removing an item never grows a surviving group, and survivors keep
    /// their indices.
    #[test]
    fn prop_removal_preserves_survivor_slots(
        spans in prop::collection::vec((0usize..7, 0usize..90, 1usize..20), 2..25),
        victim_seed in any::<u32>(),
    ) {
        let mut arena = ItemArena::new();
        let mut ids = Vec::new();
        for (n, (column, row_top, height)) in spans.iter().enumerate() {
            let id = arena.insert(GridItem::new(
                occ(n as i64),
                *column,
                *row_top,
                (row_top + height).min(95),
            ));
            placement::place_item(&mut arena, id);
            ids.push(id);
        }

        let victim = ids[victim_seed as usize % ids.len()];
        let before: Vec<(OccurrenceId, usize, usize)> = arena
            .iter()
            .filter(|(id, _)| *id != victim)
            .map(|(_, i)| (i.occurrence, i.sub_cell, i.sub_cells))
            .collect();

        placement::remove_item(&mut arena, victim);

        for (id, item) in arena.iter() {
            prop_assert!(id != victim);
            let (_, old_slot, old_size) = before
                .iter()
                .find(|(o, _, _)| *o == item.occurrence)
                .unwrap();
            prop_assert_eq!(item.sub_cell, *old_slot);
            prop_assert!(item.sub_cells <= *old_size);
        }
    }
}
