//! Grid coordinate mapper.
//!
//! Converts between continuous pixel coordinates and discrete grid cells for
//! the two grid flavors: the multi-row timed grid and the single-row all-day
//! grid. `to_grid` and `to_pixel` are exact inverses at cell boundaries.

use chrono::{NaiveTime, Timelike};

use crate::models::cell::{Cell, PixelPoint, PixelRect};
use crate::models::config::LayoutConfig;

/// Guards against float error when a boundary pixel divides back into its
/// own cell index.
const BOUNDARY_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFlavor {
    Timed,
    AllDay,
}

/// Pixel/cell converter for one grid flavor.
#[derive(Debug, Clone)]
pub struct GridMapper {
    flavor: GridFlavor,
    origin: PixelPoint,
    column_width: f32,
    row_height: f32,
    columns: usize,
    rows: usize,
    minutes_per_row: u32,
    reversed: bool,
    work_start_row: usize,
    work_end_row: usize,
}

impl GridMapper {
    /// Mapper for the timed day/time grid.
    pub fn timed(config: &LayoutConfig) -> Self {
        let minutes = config.minutes_per_row.max(1);
        Self {
            flavor: GridFlavor::Timed,
            origin: PixelPoint::new(config.origin_x, config.origin_y),
            column_width: config.column_width(),
            row_height: config.row_height,
            columns: config.visible_days.max(1),
            rows: config.rows_per_day(),
            minutes_per_row: minutes,
            reversed: config.reversed,
            work_start_row: (config.work_start_hour * 60 / minutes) as usize,
            work_end_row: (config.work_end_hour * 60 / minutes) as usize,
        }
    }

    /// Mapper for the single-row all-day strip above the timed grid.
    pub fn all_day(config: &LayoutConfig) -> Self {
        let mut mapper = Self::timed(config);
        mapper.flavor = GridFlavor::AllDay;
        mapper.origin = PixelPoint::new(
            config.origin_x,
            config.origin_y - config.all_day_row_height,
        );
        mapper.row_height = config.all_day_row_height;
        mapper.rows = 1;
        mapper
    }

    pub fn flavor(&self) -> GridFlavor {
        self.flavor
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn last_row(&self) -> usize {
        self.rows - 1
    }

    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Month grids divide the full grid width into seven weekday columns.
    pub fn month_column_width(grid_width: f32) -> f32 {
        grid_width / 7.0
    }

    /// Visual position of a logical column. Identity unless the layout is
    /// reversed, in which case column 0 is rightmost.
    fn visual_column(&self, column: usize) -> usize {
        if self.reversed {
            self.columns - 1 - column
        } else {
            column
        }
    }

    /// Top-left pixel corner of a cell.
    pub fn to_pixel(&self, cell: Cell) -> PixelPoint {
        PixelPoint::new(
            self.origin.x + self.visual_column(cell.column) as f32 * self.column_width,
            self.origin.y + cell.row as f32 * self.row_height,
        )
    }

    /// Cell under a pixel point. Out-of-range points clamp to the nearest
    /// valid cell.
    pub fn to_grid(&self, point: PixelPoint) -> Cell {
        let visual = ((point.x - self.origin.x) / self.column_width + BOUNDARY_EPS).floor();
        let visual = (visual.max(0.0) as usize).min(self.columns - 1);
        let column = if self.reversed {
            self.columns - 1 - visual
        } else {
            visual
        };

        let row = ((point.y - self.origin.y) / self.row_height + BOUNDARY_EPS).floor();
        let row = (row.max(0.0) as usize).min(self.rows - 1);

        Cell::new(column, row)
    }

    /// Paint rectangle of one cell.
    pub fn cell_rect(&self, cell: Cell) -> PixelRect {
        let corner = self.to_pixel(cell);
        PixelRect::new(corner.x, corner.y, self.column_width, self.row_height)
    }

    /// Paint rectangle of a placed item: the vertical slice of its column
    /// belonging to its sub-cell, spanning its row range. All-day items
    /// instead span their column range at full row height.
    pub fn item_rect(&self, item: &crate::models::grid_item::GridItem) -> PixelRect {
        if item.all_day || item.column_span > 1 {
            let first = self.visual_column(item.column);
            let last = self.visual_column(item.last_column());
            let (lo, hi) = if first <= last {
                (first, last)
            } else {
                (last, first)
            };
            let x = self.origin.x + lo as f32 * self.column_width;
            let width = (hi - lo + 1) as f32 * self.column_width;
            let slot_height = self.row_height / item.sub_cells.max(1) as f32;
            let y = self.origin.y + item.sub_cell as f32 * slot_height;
            return PixelRect::new(x, y, width, slot_height);
        }

        let col_x = self.origin.x + self.visual_column(item.column) as f32 * self.column_width;
        let slot_width = self.column_width / item.sub_cells.max(1) as f32;
        let x = col_x + item.sub_cell as f32 * slot_width;
        let y = self.origin.y + item.row_top as f32 * self.row_height;
        let height = (item.row_bottom - item.row_top + 1) as f32 * self.row_height;
        PixelRect::new(x, y, slot_width, height)
    }

    /// Row containing a wall-clock time of day.
    pub fn time_to_row(&self, time: NaiveTime) -> usize {
        let minutes = time.hour() * 60 + time.minute();
        let row = ((minutes as f64 / self.minutes_per_row as f64).round()) as usize;
        row.min(self.last_row())
    }

    /// Inverse of `time_to_row`, clamped to the last valid instant of the
    /// day for the final row boundary.
    pub fn row_to_time(&self, row: usize) -> NaiveTime {
        let minutes = row as u32 * self.minutes_per_row;
        if minutes >= 24 * 60 {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        } else {
            NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
        }
    }

    /// Continuous vertical position of a time of day, used by the
    /// now-indicator (which is not snapped to slot boundaries).
    pub fn time_to_y(&self, time: NaiveTime) -> f32 {
        let minutes = time.hour() as f32 * 60.0
            + time.minute() as f32
            + time.second() as f32 / 60.0;
        self.origin.y + minutes / self.minutes_per_row as f32 * self.row_height
    }

    pub fn is_working_row(&self, row: usize) -> bool {
        row >= self.work_start_row && row < self.work_end_row
    }
}
