//! Boundary to the remote layout store.
//!
//! The engine only sees [`LayoutGateway`]; [`HttpGateway`] talks to the real
//! service and [`SerializedGateway`] wraps any gateway so that calls for the
//! same layout name never run concurrently.

use thiserror::Error;

use crate::model::Layout;

pub mod http;
pub mod serialized;
pub mod wire;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpGateway;
pub use serialized::SerializedGateway;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("layout \"{name}\" not found")]
    NotFound { name: String },
    #[error("remote layout store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl GatewayError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        GatewayError::Unavailable { reason: reason.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self { GatewayError::NotFound { name: name.into() } }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::unavailable(format!("request timed out: {err}"))
        } else if err.is_decode() {
            GatewayError::unavailable(format!("malformed response: {err}"))
        } else {
            GatewayError::unavailable(err.to_string())
        }
    }
}

/// Remote CRUD over saved layouts. Every call may fail; callers decide
/// whether a failure falls back or propagates. Nothing here retries.
#[allow(async_fn_in_trait)]
pub trait LayoutGateway {
    async fn fetch_by_name(&self, name: &str) -> Result<Layout, GatewayError>;

    async fn fetch_all(&self) -> Result<Vec<Layout>, GatewayError>;

    /// Persists a new layout; the server assigns its id.
    async fn create(&self, layout: &Layout) -> Result<Layout, GatewayError>;

    /// Overwrites an existing layout, matched by id and name.
    async fn replace(&self, layout: &Layout) -> Result<Layout, GatewayError>;

    async fn delete_by_name(&self, name: &str) -> Result<(), GatewayError>;

    /// Server-side reset; returns the server's canonical default.
    async fn reset_to_default(&self) -> Result<Layout, GatewayError>;
}

impl<G: LayoutGateway> LayoutGateway for std::sync::Arc<G> {
    async fn fetch_by_name(&self, name: &str) -> Result<Layout, GatewayError> {
        (**self).fetch_by_name(name).await
    }

    async fn fetch_all(&self) -> Result<Vec<Layout>, GatewayError> { (**self).fetch_all().await }

    async fn create(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        (**self).create(layout).await
    }

    async fn replace(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        (**self).replace(layout).await
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), GatewayError> {
        (**self).delete_by_name(name).await
    }

    async fn reset_to_default(&self) -> Result<Layout, GatewayError> {
        (**self).reset_to_default().await
    }
}
