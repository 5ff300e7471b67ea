use thiserror::Error;

use crate::gateway::GatewayError;

/// Problems caught locally, before anything reaches the remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no active layout")]
    NoActiveLayout,
    #[error("layout name must not be empty")]
    EmptyName,
    #[error("layout has no widgets")]
    EmptyItems,
    #[error("layout has not been saved yet, nothing to update")]
    MissingId,
    #[error("widget \"{0}\" is already in the layout")]
    DuplicateWidget(String),
    #[error("widget \"{0}\" is not in the layout")]
    UnknownWidget(String),
    #[error("widget \"{0}\" is static and cannot be moved or resized")]
    StaticWidget(String),
    #[error("the default layout cannot be deleted")]
    ProtectedDefault,
    #[error("invalid size {w}x{h} for widget \"{id}\": {reason}")]
    InvalidSize { id: String, w: u32, h: u32, reason: String },
    #[error("widget \"{id}\" at ({x}, {y}) does not fit the grid")]
    OutOfGrid { id: String, x: u32, y: u32 },
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::AsRefStr,
    strum_macros::VariantNames
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RemoteUnavailable,
    NotFound,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] GatewayError),
    #[error("remote layouts are disabled")]
    RemoteDisabled,
}

impl LayoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LayoutError::Validation(_) => ErrorKind::Validation,
            LayoutError::Remote(GatewayError::NotFound { .. }) => ErrorKind::NotFound,
            LayoutError::Remote(GatewayError::Unavailable { .. }) | LayoutError::RemoteDisabled => {
                ErrorKind::RemoteUnavailable
            }
        }
    }

    pub fn is_not_found(&self) -> bool { self.kind() == ErrorKind::NotFound }
}
