use serde::{Deserialize, Serialize};

use crate::common::collections::HashSet;
use crate::layout_engine::ValidationError;
use crate::layout_engine::geometry::{GRID_COLUMNS, GridRect};

pub const DEFAULT_LAYOUT_NAME: &str = "default";

/// One positioned widget on the dashboard grid.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WidgetPlacement {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub min_w: Option<u32>,
    #[serde(default)]
    pub max_w: Option<u32>,
    #[serde(default)]
    pub min_h: Option<u32>,
    #[serde(default)]
    pub max_h: Option<u32>,
    /// Static widgets never move or resize as a side effect of placement.
    #[serde(default)]
    pub is_static: bool,
}

/// Requested size for a new widget, with optional inclusive bounds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WidgetSize {
    pub w: u32,
    pub h: u32,
    pub min_w: Option<u32>,
    pub max_w: Option<u32>,
    pub min_h: Option<u32>,
    pub max_h: Option<u32>,
}

impl WidgetSize {
    pub fn new(w: u32, h: u32) -> Self { Self { w, h, ..Default::default() } }

    pub fn with_width_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_w = min;
        self.max_w = max;
        self
    }

    pub fn with_height_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_h = min;
        self.max_h = max;
        self
    }
}

fn within(value: u32, min: Option<u32>, max: Option<u32>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

impl WidgetPlacement {
    pub fn new(id: impl Into<String>, rect: GridRect) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            min_w: None,
            max_w: None,
            min_h: None,
            max_h: None,
            is_static: false,
        }
    }

    /// Builds a non-static placement at `(x, y)` carrying the size and bounds
    /// of `size`.
    pub fn sized(id: impl Into<String>, x: u32, y: u32, size: WidgetSize) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w: size.w,
            h: size.h,
            min_w: size.min_w,
            max_w: size.max_w,
            min_h: size.min_h,
            max_h: size.max_h,
            is_static: false,
        }
    }

    pub fn rect(&self) -> GridRect { GridRect::new(self.x, self.y, self.w, self.h) }

    pub fn size(&self) -> WidgetSize {
        WidgetSize {
            w: self.w,
            h: self.h,
            min_w: self.min_w,
            max_w: self.max_w,
            min_h: self.min_h,
            max_h: self.max_h,
        }
    }

    pub fn overlaps(&self, other: &WidgetPlacement) -> bool { self.rect().overlaps(&other.rect()) }

    /// Checks `w`/`h` against the grid and this widget's size bounds.
    pub fn check_size(&self, w: u32, h: u32) -> Result<(), ValidationError> {
        check_size(&self.id, &WidgetSize { w, h, ..self.size() })
    }

    pub fn resize(&mut self, w: u32, h: u32) -> Result<(), ValidationError> {
        if self.is_static {
            return Err(ValidationError::StaticWidget(self.id.clone()));
        }
        self.check_size(w, h)?;
        if !GridRect::new(self.x, self.y, w, h).fits_grid() {
            return Err(ValidationError::OutOfGrid { id: self.id.clone(), x: self.x, y: self.y });
        }
        self.w = w;
        self.h = h;
        Ok(())
    }

    pub fn move_to(&mut self, x: u32, y: u32) -> Result<(), ValidationError> {
        if self.is_static {
            return Err(ValidationError::StaticWidget(self.id.clone()));
        }
        if !GridRect::new(x, y, self.w, self.h).fits_grid() {
            return Err(ValidationError::OutOfGrid { id: self.id.clone(), x, y });
        }
        self.x = x;
        self.y = y;
        Ok(())
    }
}

/// Validates a requested widget size: non-zero, no wider than the grid and
/// inside its own bounds.
pub(crate) fn check_size(id: &str, size: &WidgetSize) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidSize {
        id: id.to_string(),
        w: size.w,
        h: size.h,
        reason: reason.to_string(),
    };
    if size.w == 0 || size.h == 0 {
        return Err(invalid("width and height must be positive"));
    }
    if size.w > GRID_COLUMNS {
        return Err(invalid("wider than the grid"));
    }
    if !within(size.w, size.min_w, size.max_w) {
        return Err(invalid("width outside its bounds"));
    }
    if !within(size.h, size.min_h, size.max_h) {
        return Err(invalid("height outside its bounds"));
    }
    Ok(())
}

struct BuiltinPlacement {
    id: &'static str,
    rect: (u32, u32, u32, u32),
    width_bounds: (u32, u32),
    height_bounds: (u32, u32),
}

const fn builtin(
    id: &'static str,
    rect: (u32, u32, u32, u32),
    width_bounds: (u32, u32),
    height_bounds: (u32, u32),
) -> BuiltinPlacement {
    BuiltinPlacement { id, rect, width_bounds, height_bounds }
}

impl BuiltinPlacement {
    fn to_placement(&self) -> WidgetPlacement {
        let (x, y, w, h) = self.rect;
        WidgetPlacement {
            min_w: Some(self.width_bounds.0),
            max_w: Some(self.width_bounds.1),
            min_h: Some(self.height_bounds.0),
            max_h: Some(self.height_bounds.1),
            ..WidgetPlacement::new(self.id, GridRect::new(x, y, w, h))
        }
    }
}

// Home dashboard shipped with the client, used whenever the remote store is
// off or unreachable.
const DEFAULT_HOME: [BuiltinPlacement; 6] = [
    builtin("balance", (0, 0, 12, 3), (8, 12), (3, 3)),
    builtin("expenseChart", (0, 4, 6, 9), (4, 12), (6, 12)),
    builtin("timeChart", (6, 4, 6, 9), (5, 12), (9, 12)),
    builtin("transactionForm", (0, 13, 12, 5), (8, 12), (5, 5)),
    builtin("researchTable", (0, 18, 12, 4), (8, 12), (3, 8)),
    builtin("transactionHistory", (0, 22, 12, 8), (6, 12), (4, 15)),
];

/// A named, ordered arrangement of widgets. Item order is display order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub items: Vec<WidgetPlacement>,
    #[serde(default)]
    pub is_default: bool,
}

impl Layout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            items: Vec::new(),
            is_default: false,
        }
    }

    /// The built-in fallback layout. Never carries an id.
    pub fn build_default() -> Self {
        Self {
            id: None,
            name: DEFAULT_LAYOUT_NAME.to_string(),
            items: DEFAULT_HOME.iter().map(BuiltinPlacement::to_placement).collect(),
            is_default: true,
        }
    }

    pub fn is_persisted(&self) -> bool { self.id.is_some() }

    pub fn rects(&self) -> Vec<GridRect> { self.items.iter().map(WidgetPlacement::rect).collect() }

    pub fn has_widget(&self, id: &str) -> bool { self.items.iter().any(|item| item.id == id) }

    pub fn widget(&self, id: &str) -> Option<&WidgetPlacement> {
        self.items.iter().find(|item| item.id == id)
    }

    pub(crate) fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetPlacement> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn overlapping_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (idx, a) in self.items.iter().enumerate() {
            for b in &self.items[idx + 1..] {
                if a.overlaps(b) {
                    pairs.push((a.id.clone(), b.id.clone()));
                }
            }
        }
        pairs
    }

    /// Lists every problem with this layout; empty means it can be saved and
    /// rendered as is.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push("layout name must not be empty".to_string());
        }
        if self.items.is_empty() {
            issues.push("layout has no widgets".to_string());
        }

        let mut seen = HashSet::default();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                issues.push(format!("duplicate widget id \"{}\"", item.id));
            }
            if !item.rect().fits_grid() {
                issues.push(format!(
                    "widget \"{}\" ({}x{} at {},{}) does not fit the {}-column grid",
                    item.id, item.w, item.h, item.x, item.y, GRID_COLUMNS
                ));
            }
            if !within(item.w, item.min_w, item.max_w) || !within(item.h, item.min_h, item.max_h) {
                issues.push(format!("widget \"{}\" is sized outside its bounds", item.id));
            }
        }

        for (a, b) in self.overlapping_pairs() {
            issues.push(format!("widgets \"{a}\" and \"{b}\" overlap"));
        }

        issues
    }
}
