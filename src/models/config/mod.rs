// Layout configuration
// Explicit value passed to the mappers and the engine, never global state

use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// All knobs the layout and interaction code reads.
///
/// Constructed once and passed explicitly into the coordinate mappers and
/// the engine; updated as a whole when the host reconfigures the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minutes covered by one grid row (time slot).
    pub minutes_per_row: u32,
    /// Pixel height of one timed-grid row.
    pub row_height: f32,
    /// Pixel height of the single all-day row.
    pub all_day_row_height: f32,
    /// Number of day columns in the viewport.
    pub visible_days: usize,
    /// Pixel width of the day-column area (excludes the time label gutter).
    pub viewport_width: f32,
    /// Pixel height of the scrollable timed area.
    pub viewport_height: f32,
    /// Left edge of column 0 (right edge in reversed layout).
    pub origin_x: f32,
    /// Top edge of row 0.
    pub origin_y: f32,
    /// Right-to-left layout: column 0 is visually rightmost. Logical column
    /// numbering is unaffected.
    pub reversed: bool,
    pub week_start: Weekday,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    /// Distance from a viewport edge at which a drag starts auto-scrolling.
    pub scroll_margin: f32,
    /// Pixels scrolled per auto-scroll tick.
    pub scroll_step: f32,
    /// Auto-scroll tick interval.
    pub scroll_interval_ms: u64,
    /// Width of the resize zone along an item's edge, in device pixels.
    pub resize_border: f32,
    /// Refresh the now-indicator every second instead of every minute.
    pub show_seconds: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            minutes_per_row: 15,
            row_height: 30.0,
            all_day_row_height: 24.0,
            visible_days: 7,
            viewport_width: 910.0,
            viewport_height: 720.0,
            origin_x: 50.0,
            origin_y: 0.0,
            reversed: false,
            week_start: Weekday::Mon,
            work_start_hour: 8,
            work_end_hour: 17,
            scroll_margin: 24.0,
            scroll_step: 16.0,
            scroll_interval_ms: 50,
            resize_border: 8.0,
            show_seconds: false,
        }
    }
}

impl LayoutConfig {
    /// Rows in one day column.
    pub fn rows_per_day(&self) -> usize {
        (24 * 60 / self.minutes_per_row.max(1)) as usize
    }

    /// Index of the last valid row.
    pub fn last_row(&self) -> usize {
        self.rows_per_day().saturating_sub(1)
    }

    /// Width of one day column.
    pub fn column_width(&self) -> f32 {
        self.viewport_width / self.visible_days.max(1) as f32
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse layout config")
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout config {:?}", path))?;
        Self::from_toml_str(&text)
    }
}
