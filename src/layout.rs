//! Grid geometry – maps a slot on a page to a cell position and applies the
//! printer calibration to it.
//!
//! All coordinates are millimetres with the origin at the top-left corner of
//! the page and y growing downwards.

use serde::{Deserialize, Serialize};

use crate::sheet::SheetLayout;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Per-axis spacing (gutters, inner margins).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f32,
    pub y: f32,
}

impl Spacing {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// True when the whole rectangle lies inside `[0, page.width] × [0, page.height]`.
    pub fn fits_within(&self, page: Size) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= page.width && self.bottom() <= page.height
    }

    /// Shrink by `inset` on every side. A collapsed axis ends up with zero
    /// extent centred on the original rectangle instead of going negative.
    pub fn inset(&self, inset: Spacing) -> Rect {
        let width = self.width - 2.0 * inset.x;
        let height = self.height - 2.0 * inset.y;
        let (x, width) = if width >= 0.0 {
            (self.x + inset.x, width)
        } else {
            (self.x + self.width / 2.0, 0.0)
        };
        let (y, height) = if height >= 0.0 {
            (self.y + inset.y, height)
        } else {
            (self.y + self.height / 2.0, 0.0)
        };
        Rect::new(x, y, width, height)
    }
}

// ---------------------------------------------------------------------------
// Slot → grid position
// ---------------------------------------------------------------------------

/// Iteration order over a page's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Left to right, then top to bottom (default).
    #[default]
    RowMajor,
    /// Top to bottom, then left to right.
    ColumnMajor,
}

/// Maps a zero-based slot on one page to the top-left corner of its cell.
#[derive(Debug, Clone, Copy)]
pub struct GridPositioner<'a> {
    layout: &'a SheetLayout,
    orientation: Orientation,
}

impl<'a> GridPositioner<'a> {
    pub fn new(layout: &'a SheetLayout, orientation: Orientation) -> Self {
        Self {
            layout,
            orientation,
        }
    }

    pub fn slots_per_page(&self) -> usize {
        self.layout.slots_per_page()
    }

    /// `(column, row)` of a slot.
    ///
    /// # Panics
    /// If `slot_on_page` is not on the page. Pagination guarantees the range,
    /// so an out-of-range slot is a caller bug.
    pub fn cell(&self, slot_on_page: usize) -> (usize, usize) {
        let grid = self.layout.grid;
        assert!(
            slot_on_page < grid.columns * grid.rows,
            "slot {slot_on_page} outside a {}x{} grid",
            grid.columns,
            grid.rows
        );
        match self.orientation {
            Orientation::RowMajor => (slot_on_page % grid.columns, slot_on_page / grid.columns),
            Orientation::ColumnMajor => (slot_on_page / grid.rows, slot_on_page % grid.rows),
        }
    }

    /// Inverse of [`cell`](Self::cell): the slot index of a zero-based
    /// `(column, row)`, or `None` off the grid.
    pub fn slot_at(&self, column: usize, row: usize) -> Option<usize> {
        let grid = self.layout.grid;
        if column >= grid.columns || row >= grid.rows {
            return None;
        }
        Some(match self.orientation {
            Orientation::RowMajor => row * grid.columns + column,
            Orientation::ColumnMajor => column * grid.rows + row,
        })
    }

    /// Uncalibrated top-left corner of the slot's cell.
    pub fn position(&self, slot_on_page: usize) -> Point {
        let (col, row) = self.cell(slot_on_page);
        let l = self.layout;
        Point {
            x: l.page_margin.left + col as f32 * (l.cell_size.width + l.gutter.x),
            y: l.page_margin.top + row as f32 * (l.cell_size.height + l.gutter.y),
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Per-axis scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Linear printer correction: `p' = p * scale + offset`, independently per
/// axis. Sizes are scaled but never offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub offset: Point,
    pub scale: Scale,
}

impl Calibration {
    pub fn new(offset: Point, scale: Scale) -> Self {
        Self { offset, scale }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: p.x * self.scale.x + self.offset.x,
            y: p.y * self.scale.y + self.offset.y,
        }
    }

    pub fn apply_size(&self, s: Size) -> Size {
        Size {
            width: s.width * self.scale.x,
            height: s.height * self.scale.y,
        }
    }

    pub fn apply_spacing(&self, s: Spacing) -> Spacing {
        Spacing {
            x: s.x * self.scale.x,
            y: s.y * self.scale.y,
        }
    }

    /// Calibrated outer rectangle of a cell at `origin`.
    pub fn apply_rect(&self, origin: Point, size: Size) -> Rect {
        Rect::from_origin(self.apply(origin), self.apply_size(size))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::sheet::SheetRegistry;

    fn avery_l4731() -> SheetLayout {
        SheetRegistry::builtin().get("averyL4731").unwrap().clone()
    }

    #[test]
    fn row_major_walks_columns_first() {
        let layout = avery_l4731();
        let grid = GridPositioner::new(&layout, Orientation::RowMajor);
        assert_eq!(grid.cell(0), (0, 0));
        assert_eq!(grid.cell(6), (6, 0));
        assert_eq!(grid.cell(7), (0, 1));
    }

    #[test]
    fn column_major_walks_rows_first() {
        let layout = avery_l4731();
        let grid = GridPositioner::new(&layout, Orientation::ColumnMajor);
        assert_eq!(grid.cell(0), (0, 0));
        assert_eq!(grid.cell(26), (0, 26));
        assert_eq!(grid.cell(27), (1, 0));
    }

    #[test]
    fn both_orientations_are_bijections() {
        let layout = avery_l4731();
        let per_page = layout.slots_per_page();
        for orientation in [Orientation::RowMajor, Orientation::ColumnMajor] {
            let grid = GridPositioner::new(&layout, orientation);
            let cells: HashSet<_> = (0..per_page).map(|s| grid.cell(s)).collect();
            assert_eq!(cells.len(), per_page);
            for col in 0..layout.grid.columns {
                for row in 0..layout.grid.rows {
                    let slot = grid.slot_at(col, row).unwrap();
                    assert_eq!(grid.cell(slot), (col, row));
                }
            }
        }
    }

    #[test]
    fn positions_stay_inside_grid_area() {
        let layout = avery_l4731();
        let l = &layout;
        let area_right = l.page_margin.left
            + l.grid.columns as f32 * (l.cell_size.width + l.gutter.x)
            - l.gutter.x;
        let area_bottom = l.page_margin.top
            + l.grid.rows as f32 * (l.cell_size.height + l.gutter.y)
            - l.gutter.y;
        for orientation in [Orientation::RowMajor, Orientation::ColumnMajor] {
            let grid = GridPositioner::new(&layout, orientation);
            for slot in 0..layout.slots_per_page() {
                let p = grid.position(slot);
                assert!(p.x >= l.page_margin.left && p.y >= l.page_margin.top);
                assert!(p.x + l.cell_size.width <= area_right + 1e-3);
                assert!(p.y + l.cell_size.height <= area_bottom + 1e-3);
            }
        }
    }

    #[test]
    fn position_uses_gutter_and_margin() {
        let layout = avery_l4731();
        let grid = GridPositioner::new(&layout, Orientation::RowMajor);
        let p = grid.position(8);
        assert!((p.x - (9.0 + 27.9)).abs() < 1e-4);
        assert!((p.y - (13.5 + 10.0)).abs() < 1e-4);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn slot_past_page_end_panics() {
        let layout = avery_l4731();
        GridPositioner::new(&layout, Orientation::RowMajor).position(189);
    }

    #[test]
    fn slot_at_rejects_off_grid() {
        let layout = avery_l4731();
        let grid = GridPositioner::new(&layout, Orientation::RowMajor);
        assert_eq!(grid.slot_at(7, 0), None);
        assert_eq!(grid.slot_at(0, 27), None);
    }

    #[test]
    fn calibration_composes_linearly() {
        let p = Point::new(12.0, 7.5);
        let doubled = Calibration::new(Point::default(), Scale { x: 2.0, y: 2.0 });
        let shifted = Calibration::new(Point::new(5.0, 0.0), Scale::default());
        let both = Calibration::new(Point::new(5.0, 0.0), Scale { x: 2.0, y: 2.0 });
        assert_eq!(shifted.apply(doubled.apply(p)), both.apply(p));
    }

    #[test]
    fn sizes_ignore_offset() {
        let cal = Calibration::new(Point::new(100.0, -3.0), Scale { x: 0.5, y: 2.0 });
        assert_eq!(cal.apply_size(Size::new(10.0, 4.0)), Size::new(5.0, 8.0));
    }

    #[test]
    fn inset_collapses_to_zero() {
        let r = Rect::new(0.0, 0.0, 10.0, 4.0);
        let inner = r.inset(Spacing::new(1.0, 3.0));
        assert_eq!(inner, Rect::new(1.0, 2.0, 8.0, 0.0));
    }

    #[test]
    fn fits_within_checks_both_corners() {
        let page = Size::new(100.0, 100.0);
        assert!(Rect::new(0.0, 0.0, 100.0, 100.0).fits_within(page));
        assert!(!Rect::new(-0.1, 0.0, 10.0, 10.0).fits_within(page));
        assert!(!Rect::new(95.0, 0.0, 10.0, 10.0).fits_within(page));
    }
}
