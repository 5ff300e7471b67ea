pub mod layout;
pub mod snapshot;

pub use layout::{DEFAULT_LAYOUT_NAME, Layout, WidgetPlacement, WidgetSize};
pub use snapshot::SessionSnapshot;
