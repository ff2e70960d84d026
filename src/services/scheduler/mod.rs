//! Deterministic task scheduler.
//!
//! The engine is single-threaded and cooperative: instead of ambient timer
//! objects, timed work (auto-scroll ticks, now-indicator refreshes, the
//! retired-item sweep) is modeled as explicit single-shot tasks with
//! cancellation handles. The host event loop drives it by calling
//! `run_due` with the current wall clock; owners re-arm their tasks.

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    AutoScroll,
    NowRefresh,
    /// Physical reclaim of retired grid items at the next idle boundary.
    /// Not cancellable once scheduled.
    RetireSweep,
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Entry {
    handle: TaskHandle,
    due: DateTime<Local>,
    kind: TaskKind,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: DateTime<Local>, kind: TaskKind) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        self.entries.push(Entry { handle, due, kind });
        handle
    }

    /// Cancel a pending task. Returns false if it already ran, was already
    /// cancelled, or is a sweep (sweeps always run once scheduled).
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.handle == handle) else {
            return false;
        };
        if self.entries[pos].kind == TaskKind::RetireSweep {
            return false;
        }
        self.entries.remove(pos);
        true
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Earliest pending deadline, for hosts that sleep between events.
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Remove and return every task due at `now`, in deadline order. Tasks
    /// are single-shot; owners re-arm as needed.
    pub fn run_due(&mut self, now: DateTime<Local>) -> Vec<TaskKind> {
        let mut due: Vec<Entry> = Vec::new();
        let mut remaining: Vec<Entry> = Vec::new();
        for entry in self.entries.drain(..) {
            if entry.due <= now {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.entries = remaining;
        due.sort_by_key(|e| e.due);
        due.into_iter().map(|e| e.kind).collect()
    }
}
