pub mod engine;
pub mod error;
pub mod geometry;

pub use engine::{EngineState, FALLBACK_MESSAGE, LayoutEngine, LayoutSource};
pub use error::{ErrorKind, LayoutError, ValidationError};
pub use geometry::{GRID_COLUMNS, GridRect, find_free_position, overlaps};
