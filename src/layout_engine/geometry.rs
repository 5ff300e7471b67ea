use serde::{Deserialize, Serialize};

/// Width of the dashboard grid, in cells. The grid has no height limit.
pub const GRID_COLUMNS: u32 = 12;

/// Extra rows scanned below the lowest occupied cell before giving up and
/// appending under everything.
pub const SEARCH_SLACK_ROWS: u32 = 5;

/// A rectangle of grid cells. `x`/`y` is the top-left cell.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self { Self { x, y, w, h } }

    pub fn right(&self) -> u32 { self.x.saturating_add(self.w) }

    pub fn bottom(&self) -> u32 { self.y.saturating_add(self.h) }

    pub fn overlaps(&self, other: &GridRect) -> bool { overlaps(self, other) }

    pub fn fits_grid(&self) -> bool { self.w > 0 && self.h > 0 && self.right() <= GRID_COLUMNS }
}

/// Two rectangles overlap when both their column and row spans intersect.
/// Shared edges do not count.
pub fn overlaps(a: &GridRect, b: &GridRect) -> bool {
    let cols_overlap = a.x < b.right() && b.x < a.right();
    let rows_overlap = a.y < b.bottom() && b.y < a.bottom();
    cols_overlap && rows_overlap
}

/// Lowest occupied row boundary, 0 for an empty grid.
pub fn max_bottom(occupied: &[GridRect]) -> u32 {
    occupied.iter().map(GridRect::bottom).max().unwrap_or(0)
}

/// Returns the first top-left cell, scanning row-major, where a `width` x
/// `height` rectangle overlaps nothing in `occupied`.
///
/// Rows are scanned up to `max_bottom + SEARCH_SLACK_ROWS`; past that the
/// rectangle goes on its own row under everything else. Callers must keep
/// `1 <= width <= GRID_COLUMNS`.
///
/// The first free row is always row 0 or the bottom edge of some occupied
/// rectangle, so only those rows are tried.
pub fn find_free_position(width: u32, height: u32, occupied: &[GridRect]) -> (u32, u32) {
    let bottom = max_bottom(occupied);
    let last_row = bottom.saturating_add(SEARCH_SLACK_ROWS);
    let last_x = GRID_COLUMNS.saturating_sub(width);

    let mut rows: Vec<u32> = std::iter::once(0).chain(occupied.iter().map(GridRect::bottom)).collect();
    rows.sort_unstable();
    rows.dedup();

    for y in rows.into_iter().take_while(|&y| y <= last_row) {
        for x in 0..=last_x {
            let candidate = GridRect::new(x, y, width, height);
            if !occupied.iter().any(|rect| overlaps(&candidate, rect)) {
                return (x, y);
            }
        }
    }

    (0, bottom.saturating_add(1))
}
