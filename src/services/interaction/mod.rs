//! Interaction state machine.
//!
//! Tracks the mouse-driven MOVE / RESIZE-* / SELECT gestures against one
//! item or a free time-span. All non-idle states exist only while a pointer
//! button is held; release, drag-out and lock failure all return to `Idle`,
//! the latter two after restoring pre-gesture geometry exactly. Rollback is
//! structural: a gesture must be fully reversible at any point before its
//! commit lands.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime};

use crate::models::cell::{Cell, PixelPoint};
use crate::models::config::LayoutConfig;
use crate::models::grid_item::{GridItem, ItemArena, ItemId};
use crate::models::occurrence::{IncidenceKind, Occurrence, OccurrenceId};
use crate::models::selection::SelectionSpan;
use crate::services::chain::{self, VisibleRange};
use crate::services::coords::GridMapper;
use crate::services::engine::EngineEvent;
use crate::services::placement;
use crate::services::scheduler::{Scheduler, TaskHandle, TaskKind};
use crate::services::storage::{CalendarStore, EditScope};

/// Everything a gesture needs to read and mutate, borrowed from the engine
/// for the duration of one event dispatch.
pub struct EngineCtx<'a> {
    pub arena: &'a mut ItemArena,
    pub timed: &'a GridMapper,
    pub all_day: &'a GridMapper,
    pub config: &'a LayoutConfig,
    pub range: &'a VisibleRange,
    pub occurrences: &'a mut HashMap<OccurrenceId, Occurrence>,
    pub store: &'a mut dyn CalendarStore,
    pub scheduler: &'a mut Scheduler,
    pub events: &'a mut Vec<EngineEvent>,
    pub selection: &'a mut Option<SelectionSpan>,
    pub scroll_offset: &'a mut f32,
    /// Occurrences whose chains must be rebuilt after this dispatch.
    pub refresh: &'a mut Vec<OccurrenceId>,
    pub now: DateTime<Local>,
}

impl<'a> EngineCtx<'a> {
    fn mapper_for(&self, all_day: bool) -> &GridMapper {
        if all_day {
            self.all_day
        } else {
            self.timed
        }
    }
}

/// Which edge of an item a resize gesture drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl ResizeEdge {
    pub fn is_vertical(&self) -> bool {
        matches!(self, ResizeEdge::Top | ResizeEdge::Bottom)
    }

    /// Whether the incidence kind allows dragging this edge. To-dos have no
    /// end-anchored resize; journals cannot be resized at all.
    pub fn permitted_for(&self, kind: IncidenceKind) -> bool {
        match self {
            ResizeEdge::Top | ResizeEdge::Left => kind.supports_start_resize(),
            ResizeEdge::Bottom | ResizeEdge::Right => kind.supports_end_resize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollDirection {
    Up,
    Down,
}

/// Live bookkeeping for one move/resize gesture.
#[derive(Debug)]
pub struct GestureData {
    pub occurrence: OccurrenceId,
    /// Chain links head-first; restructured live as the drag crosses day
    /// boundaries.
    links: Vec<ItemId>,
    /// Unclamped column per link; may run outside the visible range while a
    /// link is hidden.
    virtual_cols: Vec<i64>,
    /// Pre-gesture clones of every original link, for exact rollback.
    snapshot: Vec<(ItemId, GridItem)>,
    /// Links synthesized during this gesture; retired on rollback.
    synthesized: Vec<ItemId>,
    /// Links hidden during this gesture; restored on rollback, permanently
    /// retired on commit.
    hidden: Vec<ItemId>,
    last_cell: Cell,
    all_day: bool,
}

#[derive(Debug)]
pub enum GestureState {
    Idle,
    Selecting(SelectionSpan),
    Moving(GestureData),
    Resizing { edge: ResizeEdge, data: GestureData },
}

/// Pre-commit instants retained while a dispatched commit is outstanding,
/// so a late failure can still roll the occurrence back.
#[derive(Debug, Clone, Copy)]
struct PendingCommit {
    start: DateTime<Local>,
    end: DateTime<Local>,
}

#[derive(Default)]
pub struct Interaction {
    state: GestureState,
    autoscroll: Option<TaskHandle>,
    scroll_dir: Option<ScrollDirection>,
    pending: HashMap<OccurrenceId, PendingCommit>,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState::Idle
    }
}

/// Topmost live item under a pixel point, if any.
pub fn hit_test(ctx: &EngineCtx, pos: PixelPoint) -> Option<ItemId> {
    let mut hit = None;
    for (id, item) in ctx.arena.iter() {
        let rect = ctx.mapper_for(item.all_day).item_rect(item);
        if rect.contains(pos) {
            hit = Some(id);
        }
    }
    hit
}

fn in_all_day_strip(ctx: &EngineCtx, pos: PixelPoint) -> bool {
    pos.y < ctx.config.origin_y
}

/// Resize edge under the pointer, tested against the item's own edge cell
/// with a fixed device-pixel border. Timed items expose horizontal edges
/// (top on the chain head, bottom on the tail); all-day items expose
/// vertical edges, mapped through the reversed-layout mirror.
fn resize_edge_at(
    ctx: &EngineCtx,
    item: &GridItem,
    kind: IncidenceKind,
    pos: PixelPoint,
) -> Option<ResizeEdge> {
    let mapper = ctx.mapper_for(item.all_day);
    let rect = mapper.item_rect(item);
    let border = ctx.config.resize_border;

    let edge = if item.all_day {
        if pos.x <= rect.x + border {
            Some(if mapper.is_reversed() {
                ResizeEdge::Right
            } else {
                ResizeEdge::Left
            })
        } else if pos.x >= rect.right() - border {
            Some(if mapper.is_reversed() {
                ResizeEdge::Left
            } else {
                ResizeEdge::Right
            })
        } else {
            None
        }
    } else if item.is_chain_head() && pos.y <= rect.y + border {
        Some(ResizeEdge::Top)
    } else if item.is_chain_tail() && pos.y >= rect.bottom() - border {
        Some(ResizeEdge::Bottom)
    } else {
        None
    };

    edge.filter(|e| e.permitted_for(kind))
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    date.and_time(time).and_local_timezone(Local).earliest()
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn gesture_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// A gesture on an item stays blocked while its previous commit is
    /// still outstanding.
    pub fn is_frozen(&self, id: OccurrenceId) -> bool {
        self.pending.contains_key(&id)
    }

    /// The occurrence an in-flight move/resize gesture holds, if any.
    pub fn gesture_occurrence(&self) -> Option<OccurrenceId> {
        match &self.state {
            GestureState::Moving(data) | GestureState::Resizing { data, .. } => {
                Some(data.occurrence)
            }
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, ctx: &mut EngineCtx, pos: PixelPoint) {
        if self.gesture_active() {
            return;
        }

        if let Some(item_id) = hit_test(ctx, pos) {
            let item = match ctx.arena.get(item_id) {
                Some(item) => item.clone(),
                None => return,
            };
            let occurrence = match ctx.occurrences.get(&item.occurrence) {
                Some(occ) => occ.clone(),
                None => {
                    log::warn!("grid item for unknown occurrence {}", item.occurrence);
                    return;
                }
            };
            if occurrence.read_only {
                return;
            }
            if self.is_frozen(occurrence.id) {
                ctx.events.push(EngineEvent::Notice(format!(
                    "\"{}\" is still being saved",
                    occurrence.title
                )));
                return;
            }

            let head = chain::chain_head(ctx.arena, item_id);
            let links = chain::chain_links(ctx.arena, head);
            let snapshot: Vec<(ItemId, GridItem)> = links
                .iter()
                .filter_map(|&l| ctx.arena.get(l).map(|i| (l, i.clone())))
                .collect();
            let virtual_cols: Vec<i64> = snapshot
                .iter()
                .map(|(_, item)| item.column as i64)
                .collect();
            let data = GestureData {
                occurrence: occurrence.id,
                links,
                virtual_cols,
                snapshot,
                synthesized: Vec::new(),
                hidden: Vec::new(),
                last_cell: ctx.mapper_for(item.all_day).to_grid(pos),
                all_day: item.all_day,
            };

            self.state = match resize_edge_at(ctx, &item, occurrence.kind, pos) {
                Some(edge) => GestureState::Resizing { edge, data },
                None => GestureState::Moving(data),
            };
        } else {
            let all_day = in_all_day_strip(ctx, pos);
            let cell = ctx.mapper_for(all_day).to_grid(pos);
            let span = SelectionSpan::new(cell, all_day);
            *ctx.selection = Some(span);
            ctx.events.push(EngineEvent::SelectionChanged(Some(span)));
            self.state = GestureState::Selecting(span);
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut EngineCtx, pos: PixelPoint) {
        let mut state = std::mem::take(&mut self.state);
        let mut broken = false;
        match &mut state {
            GestureState::Idle => {}
            GestureState::Selecting(span) => {
                let cell = ctx.mapper_for(span.all_day).to_grid(pos);
                span.drag_to(cell);
                *ctx.selection = Some(*span);
                ctx.events.push(EngineEvent::SelectionChanged(Some(*span)));
            }
            GestureState::Moving(data) => {
                let cell = ctx.mapper_for(data.all_day).to_grid(pos);
                let (dc, dr) = cell.delta_from(data.last_cell);
                if dc != 0 || dr != 0 {
                    apply_move(ctx, data, dc, if data.all_day { 0 } else { dr });
                }
                data.last_cell = cell;
            }
            GestureState::Resizing { edge, data } => {
                let cell = ctx.mapper_for(data.all_day).to_grid(pos);
                if cell != data.last_cell {
                    apply_resize(ctx, *edge, data, cell);
                    if let Err(err) = chain::validate_chain(ctx.arena, data.links[0]) {
                        debug_assert!(false, "chain broke mid-resize: {err}");
                        log::error!(
                            "chain of {} broke mid-resize ({err}), restoring",
                            data.occurrence
                        );
                        broken = true;
                    }
                }
                data.last_cell = cell;
            }
        }
        if broken {
            // Self-heal: abandon the gesture, restore the snapshot and
            // rebuild the chain from its occurrence.
            if let GestureState::Resizing { data, .. } = &state {
                rollback(ctx, data);
                ctx.refresh.push(data.occurrence);
            }
            self.stop_autoscroll(ctx);
            state = GestureState::Idle;
        }
        self.state = state;

        if self.gesture_active() {
            self.update_autoscroll(ctx, pos);
        }
    }

    pub fn pointer_up(&mut self, ctx: &mut EngineCtx, _pos: PixelPoint) {
        self.stop_autoscroll(ctx);
        match std::mem::take(&mut self.state) {
            GestureState::Idle => {}
            GestureState::Selecting(span) => {
                *ctx.selection = Some(span);
            }
            GestureState::Moving(data) => self.commit(ctx, data, None),
            GestureState::Resizing { edge, data } => self.commit(ctx, data, Some(edge)),
        }
    }

    /// The pointer left the scrollable viewport entirely: treat the gesture
    /// as a drag-out signal, roll back locally and let the host take over.
    pub fn pointer_left_viewport(&mut self, ctx: &mut EngineCtx) {
        match std::mem::take(&mut self.state) {
            GestureState::Moving(data) | GestureState::Resizing { data, .. } => {
                self.stop_autoscroll(ctx);
                rollback(ctx, &data);
                ctx.events
                    .push(EngineEvent::DragOutRequested(data.occurrence));
            }
            other => self.state = other,
        }
    }

    /// Abort any in-flight gesture, restoring pre-gesture geometry.
    pub fn cancel(&mut self, ctx: &mut EngineCtx) {
        self.stop_autoscroll(ctx);
        match std::mem::take(&mut self.state) {
            GestureState::Moving(data) | GestureState::Resizing { data, .. } => {
                rollback(ctx, &data);
            }
            GestureState::Selecting(_) => {
                *ctx.selection = None;
                ctx.events.push(EngineEvent::SelectionChanged(None));
            }
            GestureState::Idle => {}
        }
    }

    /// The store resolved an asynchronously dispatched commit. Failure
    /// rolls the occurrence back to its pre-gesture instants.
    pub fn commit_resolved(&mut self, ctx: &mut EngineCtx, id: OccurrenceId, success: bool) {
        let Some(previous) = self.pending.remove(&id) else {
            return;
        };
        if !success {
            log::error!("deferred commit for {} failed, rolling back", id);
            if let Some(occurrence) = ctx.occurrences.get_mut(&id) {
                occurrence.start = previous.start;
                occurrence.end = previous.end;
                ctx.events.push(EngineEvent::Notice(format!(
                    "Saving \"{}\" failed",
                    occurrence.title
                )));
            }
            ctx.refresh.push(id);
        }
    }

    fn commit(&mut self, ctx: &mut EngineCtx, data: GestureData, edge: Option<ResizeEdge>) {
        let Some(occurrence) = ctx.occurrences.get(&data.occurrence).cloned() else {
            rollback(ctx, &data);
            return;
        };
        let Some((new_start, new_end)) = gesture_times(ctx, &data, edge, &occurrence) else {
            rollback(ctx, &data);
            return;
        };
        if new_start == occurrence.start && new_end == occurrence.end {
            rollback(ctx, &data);
            return;
        }

        if occurrence.recurs {
            match ctx.store.resolve_recurrence_edit_scope(occurrence.id) {
                EditScope::Cancel => {
                    log::debug!("recurrence edit of {} declined", occurrence.id);
                    rollback(ctx, &data);
                    return;
                }
                // Series / ThisOnly / ThisAndFuture: the store performs the
                // detach or split as part of the committed change.
                _ => {}
            }
        }

        if !ctx.store.begin_change(occurrence.id) {
            log::warn!("edit lock refused for {}", occurrence.id);
            ctx.events.push(EngineEvent::Notice(format!(
                "Could not lock \"{}\" for editing",
                occurrence.title
            )));
            rollback(ctx, &data);
            return;
        }

        let mut updated = occurrence.clone();
        updated.start = new_start;
        updated.end = new_end;
        if !ctx.store.end_change(&updated) {
            log::error!("commit refused for {}", occurrence.id);
            ctx.events.push(EngineEvent::Notice(format!(
                "Saving \"{}\" failed",
                occurrence.title
            )));
            rollback(ctx, &data);
            return;
        }

        ctx.occurrences.insert(occurrence.id, updated);
        for &hidden in &data.hidden {
            ctx.arena.retire(hidden);
        }
        self.pending.insert(
            occurrence.id,
            PendingCommit {
                start: occurrence.start,
                end: occurrence.end,
            },
        );
        ctx.events.push(EngineEvent::GeometryChanged {
            occurrence: occurrence.id,
            new_start,
            new_end,
        });
        ctx.refresh.push(occurrence.id);
        schedule_sweep(ctx);
    }

    fn update_autoscroll(&mut self, ctx: &mut EngineCtx, pos: PixelPoint) {
        let top = ctx.config.origin_y;
        let bottom = top + ctx.config.viewport_height;
        let margin = ctx.config.scroll_margin;
        let dir = if pos.y <= top + margin {
            Some(ScrollDirection::Up)
        } else if pos.y >= bottom - margin {
            Some(ScrollDirection::Down)
        } else {
            None
        };
        self.scroll_dir = dir;

        match (dir, self.autoscroll) {
            (Some(_), None) => {
                let due = ctx.now + Duration::milliseconds(ctx.config.scroll_interval_ms as i64);
                self.autoscroll = Some(ctx.scheduler.schedule(due, TaskKind::AutoScroll));
            }
            (None, Some(handle)) => {
                ctx.scheduler.cancel(handle);
                self.autoscroll = None;
            }
            _ => {}
        }
    }

    /// One auto-scroll timer expiry: scroll a fixed step and re-arm while
    /// the gesture continues inside the margin.
    pub fn auto_scroll_tick(&mut self, ctx: &mut EngineCtx) {
        self.autoscroll = None;
        if !self.gesture_active() {
            self.scroll_dir = None;
            return;
        }
        let Some(dir) = self.scroll_dir else {
            return;
        };
        *ctx.scroll_offset += match dir {
            ScrollDirection::Up => -ctx.config.scroll_step,
            ScrollDirection::Down => ctx.config.scroll_step,
        };
        let due = ctx.now + Duration::milliseconds(ctx.config.scroll_interval_ms as i64);
        self.autoscroll = Some(ctx.scheduler.schedule(due, TaskKind::AutoScroll));
    }

    fn stop_autoscroll(&mut self, ctx: &mut EngineCtx) {
        if let Some(handle) = self.autoscroll.take() {
            ctx.scheduler.cancel(handle);
        }
        self.scroll_dir = None;
    }
}

/// Shift every chain link by the pointer delta since the previous sample.
/// Links pushed outside the visible range are hidden (not destroyed) and
/// restored when they re-enter.
fn apply_move(ctx: &mut EngineCtx, data: &mut GestureData, dc: i64, dr: i64) {
    let seeds: Vec<ItemId> = data
        .links
        .iter()
        .flat_map(|&l| placement::conflicts_of(ctx.arena, l))
        .collect();
    let days = ctx.range.days as i64;

    if data.all_day {
        let span0 = data.snapshot[0].1.column_span as i64;
        data.virtual_cols[0] += dc;
        let v = data.virtual_cols[0];
        let link = data.links[0];
        let first = v.max(0);
        let last = (v + span0 - 1).min(days - 1);
        if last < first || v >= days || v + span0 <= 0 {
            ctx.arena.hide(link);
            if !data.hidden.contains(&link) {
                data.hidden.push(link);
            }
        } else {
            ctx.arena.restore(link);
            data.hidden.retain(|&h| h != link);
            if let Some(item) = ctx.arena.get_mut(link) {
                item.column = first as usize;
                item.column_span = (last - first + 1) as usize;
            }
        }
    } else {
        for (i, &link) in data.links.iter().enumerate() {
            data.virtual_cols[i] += dc;
            let v = data.virtual_cols[i];
            if v >= 0 && v < days {
                ctx.arena.restore(link);
                data.hidden.retain(|&h| h != link);
                if let Some(item) = ctx.arena.get_mut(link) {
                    item.column = v as usize;
                }
            } else {
                ctx.arena.hide(link);
                if !data.hidden.contains(&link) {
                    data.hidden.push(link);
                }
            }
        }

        if dr != 0 {
            let last_row = ctx.timed.last_row() as i64;
            let head = data.links[0];
            let tail = *data.links.last().expect("chain is never empty");
            let top = ctx.arena.get_any(head).map(|i| i.row_top as i64).unwrap_or(0);
            let bottom = ctx
                .arena
                .get_any(tail)
                .map(|i| i.row_bottom as i64)
                .unwrap_or(last_row);
            let dr_eff = dr.clamp(-(top.min(bottom)), last_row - top.max(bottom));
            if dr_eff != 0 {
                if let Some(item) = ctx.arena.get_any_mut(head) {
                    item.row_top = (item.row_top as i64 + dr_eff) as usize;
                }
                if let Some(item) = ctx.arena.get_any_mut(tail) {
                    item.row_bottom = (item.row_bottom as i64 + dr_eff) as usize;
                }
            }
        }
    }

    replace_links(ctx, data, &seeds);
}

/// Drag one anchored edge. The edge clamps against the opposite edge, it
/// never inverts the span; top/bottom resizes restructure the chain as the
/// edge crosses day boundaries.
fn apply_resize(ctx: &mut EngineCtx, edge: ResizeEdge, data: &mut GestureData, cell: Cell) {
    let seeds: Vec<ItemId> = data
        .links
        .iter()
        .flat_map(|&l| placement::conflicts_of(ctx.arena, l))
        .collect();
    let last_row = ctx.timed.last_row();
    let days = ctx.range.days;

    match edge {
        // Dragging the start edge into another column restructures the
        // chain first, then the (possibly new) head takes the row.
        ResizeEdge::Top => {
            let tail_col = ctx
                .arena
                .get(*data.links.last().expect("chain is never empty"))
                .map(|i| i.column)
                .unwrap_or(0);
            let target = cell.column.min(tail_col);
            loop {
                let head = data.links[0];
                let Some(head_col) = ctx.arena.get(head).map(|i| i.column) else {
                    break;
                };
                if head_col > target {
                    let Some(new_head) = chain::extend_head(ctx.arena, head, last_row) else {
                        break;
                    };
                    data.links.insert(0, new_head);
                    data.virtual_cols.insert(0, head_col as i64 - 1);
                    data.synthesized.push(new_head);
                } else if head_col < target && data.links.len() > 1 {
                    if chain::detach_head(ctx.arena, head).is_none() {
                        break;
                    }
                    if !data.hidden.contains(&head) {
                        data.hidden.push(head);
                    }
                    data.links.remove(0);
                    data.virtual_cols.remove(0);
                } else {
                    break;
                }
            }
            let head = data.links[0];
            if let Some(item) = ctx.arena.get_mut(head) {
                item.row_top = cell.row.min(item.row_bottom);
            }
        }
        ResizeEdge::Bottom => {
            let head_col = ctx.arena.get(data.links[0]).map(|i| i.column).unwrap_or(0);
            let target = cell.column.max(head_col).min(days - 1);
            loop {
                let tail = *data.links.last().expect("chain is never empty");
                let Some(tail_col) = ctx.arena.get(tail).map(|i| i.column) else {
                    break;
                };
                if tail_col < target {
                    let Some(new_tail) = chain::extend_tail(ctx.arena, tail, last_row, days - 1)
                    else {
                        break;
                    };
                    data.links.push(new_tail);
                    data.virtual_cols.push(tail_col as i64 + 1);
                    data.synthesized.push(new_tail);
                } else if tail_col > target && data.links.len() > 1 {
                    if chain::detach_tail(ctx.arena, tail).is_none() {
                        break;
                    }
                    if !data.hidden.contains(&tail) {
                        data.hidden.push(tail);
                    }
                    data.links.pop();
                    data.virtual_cols.pop();
                } else {
                    break;
                }
            }
            let tail = *data.links.last().expect("chain is never empty");
            if let Some(item) = ctx.arena.get_mut(tail) {
                item.row_bottom = cell.row.max(item.row_top).min(last_row);
            }
        }
        // All-day items carry their whole span in one link; the edges move
        // the column range directly.
        ResizeEdge::Left => {
            let link = data.links[0];
            if let Some(item) = ctx.arena.get_mut(link) {
                let end = item.last_column();
                let target = cell.column.min(end);
                item.column_span = end - target + 1;
                item.column = target;
            }
        }
        ResizeEdge::Right => {
            let link = data.links[0];
            if let Some(item) = ctx.arena.get_mut(link) {
                let target = cell.column.max(item.column).min(days - 1);
                item.column_span = target - item.column + 1;
            }
        }
    }

    replace_links(ctx, data, &seeds);
}

/// Re-seat the gesture's links in the placement after a geometry change:
/// groups they left shrink, groups they entered grow. Peers keep their
/// sub-cell indices throughout.
fn replace_links(ctx: &mut EngineCtx, data: &GestureData, old_seeds: &[ItemId]) {
    placement::repack(ctx.arena, old_seeds);
    for &link in &data.links {
        if ctx.arena.get(link).is_some() {
            placement::place_item(ctx.arena, link);
        }
    }
}

/// Translate the gesture's final grid geometry into occurrence instants.
fn gesture_times(
    ctx: &EngineCtx,
    data: &GestureData,
    edge: Option<ResizeEdge>,
    occurrence: &Occurrence,
) -> Option<(DateTime<Local>, DateTime<Local>)> {
    let head = data.links[0];
    let tail = *data.links.last()?;
    let head_item = ctx.arena.get_any(head)?;
    let tail_item = ctx.arena.get_any(tail)?;
    let minutes_per_row = ctx.config.minutes_per_row as i64;

    match edge {
        None => {
            // A move shifts both instants by the same delta, preserving the
            // exact duration.
            let dc = data.virtual_cols[0] - data.snapshot[0].1.column as i64;
            let dr = if data.all_day {
                0
            } else {
                head_item.row_top as i64 - data.snapshot[0].1.row_top as i64
            };
            let shift = Duration::days(dc) + Duration::minutes(dr * minutes_per_row);
            Some((occurrence.start + shift, occurrence.end + shift))
        }
        Some(ResizeEdge::Top) => {
            let date = ctx.range.date_of(head_item.column);
            let time = ctx.timed.row_to_time(head_item.row_top);
            Some((local_instant(date, time)?, occurrence.end))
        }
        Some(ResizeEdge::Bottom) => {
            let date = ctx.range.date_of(tail_item.column);
            let time = ctx.timed.row_to_time(tail_item.row_bottom);
            Some((occurrence.start, local_instant(date, time)?))
        }
        Some(ResizeEdge::Left) => {
            let date = ctx.range.date_of(head_item.column);
            Some((local_instant(date, occurrence.start.time())?, occurrence.end))
        }
        Some(ResizeEdge::Right) => {
            let date = ctx.range.date_of(head_item.last_column());
            Some((occurrence.start, local_instant(date, occurrence.end.time())?))
        }
    }
}

/// Restore pre-gesture geometry exactly: synthesized links are retired,
/// hidden links restored, every original link's column/rows/placement put
/// back from the snapshot.
fn rollback(ctx: &mut EngineCtx, data: &GestureData) {
    // Peers at the abandoned position must shrink once the links leave.
    let mut seeds: Vec<ItemId> = data
        .links
        .iter()
        .flat_map(|&l| placement::conflicts_of(ctx.arena, l))
        .collect();
    for &synthesized in &data.synthesized {
        ctx.arena.retire(synthesized);
    }
    for (id, saved) in &data.snapshot {
        ctx.arena.restore(*id);
        if let Some(item) = ctx.arena.get_mut(*id) {
            *item = saved.clone();
        }
    }
    seeds.extend(data.snapshot.iter().map(|(id, _)| *id));
    placement::repack(ctx.arena, &seeds);
    schedule_sweep(ctx);
}

fn schedule_sweep(ctx: &mut EngineCtx) {
    if ctx.arena.has_pending_sweep() && !ctx.scheduler.is_scheduled(TaskKind::RetireSweep) {
        ctx.scheduler.schedule(ctx.now, TaskKind::RetireSweep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_edge_permissions() {
        assert!(ResizeEdge::Bottom.permitted_for(IncidenceKind::Event));
        assert!(!ResizeEdge::Bottom.permitted_for(IncidenceKind::Todo));
        assert!(ResizeEdge::Top.permitted_for(IncidenceKind::Todo));
        assert!(!ResizeEdge::Left.permitted_for(IncidenceKind::Journal));
    }

    #[test]
    fn test_resize_edge_axis() {
        assert!(ResizeEdge::Top.is_vertical());
        assert!(ResizeEdge::Bottom.is_vertical());
        assert!(!ResizeEdge::Left.is_vertical());
        assert!(!ResizeEdge::Right.is_vertical());
    }
}
