//! Error types

mod api;

pub use api::*;

/// Top-level error for table operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport or server failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A request could not be constructed from the current table state.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A fetch was issued outside of a tokio runtime.
    #[error("No async runtime available to run the fetch")]
    NoRuntime,
}

impl Error {
    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns `true` if the failure happened before anything was sent.
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::NoRuntime)
    }
}
