//! Engine façade.
//!
//! `AgendaEngine` owns the arena, the chains, the gesture state machine and
//! the task scheduler, and exposes the narrow surface the host event loop
//! drives: pointer events in, drained [`EngineEvent`]s out, plus a `tick`
//! with the wall clock. The host renders from the placed items; the engine
//! never paints.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate};
use thiserror::Error;

use crate::models::cell::{PixelPoint, PixelRect};
use crate::models::config::LayoutConfig;
use crate::models::grid_item::{GridItem, ItemArena, ItemId};
use crate::models::occurrence::{Occurrence, OccurrenceId};
use crate::models::selection::SelectionSpan;
use crate::services::chain::{self, VisibleRange};
use crate::services::coords::GridMapper;
use crate::services::interaction::{EngineCtx, Interaction};
use crate::services::now_indicator::{NowIndicator, NowMarker};
use crate::services::placement;
use crate::services::scheduler::{Scheduler, TaskKind};
use crate::services::storage::CalendarStore;
use crate::utils::date;

/// Notifications pushed to the host, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A gesture committed new instants for an occurrence.
    GeometryChanged {
        occurrence: OccurrenceId,
        new_start: DateTime<Local>,
        new_end: DateTime<Local>,
    },
    SelectionChanged(Option<SelectionSpan>),
    /// The pointer dragged an item out of the viewport; the host may start
    /// an external drag-and-drop with it.
    DragOutRequested(OccurrenceId),
    ItemActivated(OccurrenceId),
    /// User-facing message (refused lock, failed save).
    Notice(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("occurrence {0} is not loaded")]
    UnknownOccurrence(OccurrenceId),
    #[error("a change to {0} is still being saved")]
    CommitPending(OccurrenceId),
}

pub struct AgendaEngine<S: CalendarStore> {
    config: LayoutConfig,
    timed: GridMapper,
    all_day: GridMapper,
    range: VisibleRange,
    arena: ItemArena,
    occurrences: HashMap<OccurrenceId, Occurrence>,
    chains: HashMap<OccurrenceId, Vec<ItemId>>,
    interaction: Interaction,
    scheduler: Scheduler,
    now_indicator: NowIndicator,
    now_marker: Option<NowMarker>,
    store: S,
    scroll_offset: f32,
    selection: Option<SelectionSpan>,
    events: Vec<EngineEvent>,
    now: DateTime<Local>,
}

impl<S: CalendarStore> AgendaEngine<S> {
    pub fn new(
        config: LayoutConfig,
        store: S,
        range: VisibleRange,
        now: DateTime<Local>,
    ) -> Self {
        let timed = GridMapper::timed(&config);
        let all_day = GridMapper::all_day(&config);
        let now_indicator = NowIndicator::new(config.show_seconds);
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now_indicator.next_refresh(now), TaskKind::NowRefresh);

        let mut engine = Self {
            config,
            timed,
            all_day,
            range,
            arena: ItemArena::new(),
            occurrences: HashMap::new(),
            chains: HashMap::new(),
            interaction: Interaction::new(),
            scheduler,
            now_indicator,
            now_marker: None,
            store,
            scroll_offset: 0.0,
            selection: None,
            events: Vec::new(),
            now,
        };
        engine.refresh();
        engine
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.range
    }

    pub fn visible_dates(&self) -> Vec<NaiveDate> {
        date::date_span(self.range.first_day, self.range.days).collect()
    }

    pub fn timed_mapper(&self) -> &GridMapper {
        &self.timed
    }

    pub fn all_day_mapper(&self) -> &GridMapper {
        &self.all_day
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn selection(&self) -> Option<SelectionSpan> {
        self.selection
    }

    pub fn now_marker(&self) -> Option<NowMarker> {
        self.now_marker
    }

    pub fn occurrence(&self, id: OccurrenceId) -> Option<&Occurrence> {
        self.occurrences.get(&id)
    }

    /// Placed items in arena order; the host paints from these.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &GridItem)> {
        self.arena.iter()
    }

    /// Paint rectangles of one occurrence's live chain links, head first.
    pub fn item_rects(&self, id: OccurrenceId) -> Vec<PixelRect> {
        let Some(links) = self.chains.get(&id) else {
            return Vec::new();
        };
        links
            .iter()
            .filter_map(|&link| self.arena.get(link))
            .map(|item| self.mapper_of(item).item_rect(item))
            .collect()
    }

    fn mapper_of(&self, item: &GridItem) -> &GridMapper {
        if item.all_day {
            &self.all_day
        } else {
            &self.timed
        }
    }

    /// Topmost occurrence under a pixel point.
    pub fn item_at(&self, pos: PixelPoint) -> Option<OccurrenceId> {
        let mut hit = None;
        for (_, item) in self.arena.iter() {
            if self.mapper_of(item).item_rect(item).contains(pos) {
                hit = Some(item.occurrence);
            }
        }
        hit
    }

    /// Re-query the store for the visible window and rebuild every chain.
    /// Old items are retired in place and reclaimed by the next sweep.
    pub fn refresh(&mut self) {
        let from = date::start_of_day(self.range.first_day);
        let to = date::start_of_day(self.range.last_day() + Duration::days(1));
        let mut list = self.store.occurrences_in_range(from, to);
        // The store guarantees no ordering; sort for deterministic layout.
        list.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

        self.arena.retire_all();
        self.occurrences.clear();
        self.chains.clear();
        for occurrence in list {
            let links = chain::build_chain(&mut self.arena, &occurrence, &self.range, &self.timed);
            if !links.is_empty() {
                self.chains.insert(occurrence.id, links);
            }
            self.occurrences.insert(occurrence.id, occurrence);
        }
        placement::relayout_all(&mut self.arena);
        self.schedule_sweep();
        self.update_now_marker();
    }

    /// Shift the visible window; everything is re-fetched and re-placed.
    pub fn set_visible_range(&mut self, range: VisibleRange) {
        self.range = range;
        self.refresh();
    }

    /// Apply a changed layout configuration (resize, zoom, week length).
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.timed = GridMapper::timed(&config);
        self.all_day = GridMapper::all_day(&config);
        self.now_indicator = NowIndicator::new(config.show_seconds);
        self.config = config;
        self.refresh();
    }

    /// Localized insert: one chain built and placed, nothing else moves
    /// except overlap groups the new links join.
    pub fn occurrence_added(&mut self, occurrence: Occurrence) {
        let id = occurrence.id;
        self.occurrences.insert(id, occurrence);
        self.rebuild_one(id);
    }

    /// Localized update of one occurrence from a store-side change.
    pub fn occurrence_modified(&mut self, occurrence: Occurrence) -> Result<(), EngineError> {
        let id = occurrence.id;
        if self.interaction.is_frozen(id) {
            return Err(EngineError::CommitPending(id));
        }
        if !self.occurrences.contains_key(&id) {
            return Err(EngineError::UnknownOccurrence(id));
        }
        // A gesture's rollback snapshot predates this change; abort it
        // before the rebuild or its restore would resurrect the old links.
        if self.interaction.gesture_occurrence() == Some(id) {
            self.cancel_gesture();
        }
        self.occurrences.insert(id, occurrence);
        self.rebuild_one(id);
        Ok(())
    }

    /// Localized removal; survivors in affected overlap groups shrink but
    /// keep their sub-cell indices.
    pub fn occurrence_removed(&mut self, id: OccurrenceId) {
        if self.interaction.gesture_occurrence() == Some(id) {
            self.cancel_gesture();
        }
        self.occurrences.remove(&id);
        self.remove_links_of(id);
        self.chains.remove(&id);
        self.schedule_sweep();
    }

    pub fn pointer_down(&mut self, pos: PixelPoint) {
        self.dispatch(|interaction, ctx| interaction.pointer_down(ctx, pos));
    }

    pub fn pointer_move(&mut self, pos: PixelPoint) {
        self.dispatch(|interaction, ctx| interaction.pointer_move(ctx, pos));
    }

    pub fn pointer_up(&mut self, pos: PixelPoint) {
        self.dispatch(|interaction, ctx| interaction.pointer_up(ctx, pos));
    }

    pub fn pointer_left_viewport(&mut self) {
        self.dispatch(|interaction, ctx| interaction.pointer_left_viewport(ctx));
    }

    /// Abort any in-flight gesture (Escape).
    pub fn cancel_gesture(&mut self) {
        self.dispatch(|interaction, ctx| interaction.cancel(ctx));
    }

    pub fn gesture_active(&self) -> bool {
        self.interaction.gesture_active()
    }

    pub fn double_click(&mut self, pos: PixelPoint) -> Option<OccurrenceId> {
        let id = self.item_at(pos)?;
        self.events.push(EngineEvent::ItemActivated(id));
        Some(id)
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.events.push(EngineEvent::SelectionChanged(None));
        }
    }

    /// The store resolved a commit that `end_change` had only dispatched.
    pub fn commit_resolved(&mut self, id: OccurrenceId, success: bool) {
        self.dispatch(move |interaction, ctx| interaction.commit_resolved(ctx, id, success));
    }

    /// Drive timed work. The host calls this from its event loop, at least
    /// whenever `next_wakeup` elapses.
    pub fn tick(&mut self, now: DateTime<Local>) {
        self.now = now;
        for kind in self.scheduler.run_due(now) {
            match kind {
                TaskKind::AutoScroll => {
                    self.dispatch(|interaction, ctx| interaction.auto_scroll_tick(ctx));
                }
                TaskKind::NowRefresh => {
                    if self.now_indicator.day_rolled_over(now) {
                        // "Today" moved to a different column; day-dependent
                        // placement may change.
                        self.refresh();
                    } else {
                        self.update_now_marker();
                    }
                    let due = self.now_indicator.next_refresh(now);
                    self.scheduler.schedule(due, TaskKind::NowRefresh);
                }
                TaskKind::RetireSweep => {
                    let freed = self.arena.sweep();
                    log::debug!("swept {freed} retired grid items");
                }
            }
        }
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_wakeup(&self) -> Option<DateTime<Local>> {
        self.scheduler.next_due()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Borrow-split the engine into the gesture context plus the state
    /// machine, then rebuild whatever chains the dispatch invalidated.
    fn dispatch<R>(
        &mut self,
        f: impl FnOnce(&mut Interaction, &mut EngineCtx<'_>) -> R,
    ) -> R {
        let mut refresh = Vec::new();
        let result = {
            let mut ctx = EngineCtx {
                arena: &mut self.arena,
                timed: &self.timed,
                all_day: &self.all_day,
                config: &self.config,
                range: &self.range,
                occurrences: &mut self.occurrences,
                store: &mut self.store,
                scheduler: &mut self.scheduler,
                events: &mut self.events,
                selection: &mut self.selection,
                scroll_offset: &mut self.scroll_offset,
                refresh: &mut refresh,
                now: self.now,
            };
            f(&mut self.interaction, &mut ctx)
        };
        for id in refresh {
            self.rebuild_one(id);
        }
        result
    }

    /// Retire every arena item of one occurrence, including links a gesture
    /// synthesized outside the tracked chain, and shrink the groups left
    /// behind.
    fn remove_links_of(&mut self, id: OccurrenceId) {
        let stale: Vec<ItemId> = self
            .arena
            .iter()
            .filter(|(_, item)| item.occurrence == id)
            .map(|(link, _)| link)
            .collect();
        for link in stale {
            placement::remove_item(&mut self.arena, link);
        }
    }

    fn rebuild_one(&mut self, id: OccurrenceId) {
        self.remove_links_of(id);
        self.chains.remove(&id);
        if let Some(occurrence) = self.occurrences.get(&id).cloned() {
            let links = chain::build_chain(&mut self.arena, &occurrence, &self.range, &self.timed);
            for &link in &links {
                placement::place_item(&mut self.arena, link);
            }
            if !links.is_empty() {
                self.chains.insert(id, links);
            }
        }
        self.schedule_sweep();
    }

    fn schedule_sweep(&mut self) {
        if self.arena.has_pending_sweep() && !self.scheduler.is_scheduled(TaskKind::RetireSweep) {
            self.scheduler.schedule(self.now, TaskKind::RetireSweep);
        }
    }

    fn update_now_marker(&mut self) {
        let dates = self.visible_dates();
        self.now_marker = self.now_indicator.compute(&dates, self.now, &self.timed);
    }
}
