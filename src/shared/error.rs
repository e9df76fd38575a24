//! Shared Error Types
//!
//! This module defines the error taxonomy for talking to the analytics API.
//! Every request the dashboard makes resolves to one of three failure shapes:
//!
//! - `TransportError` - the network was unreachable or the request timed out
//! - `ServerError` - the API answered with a non-2xx status, usually carrying
//!   a `{ "detail": "..." }` body that is surfaced to the user verbatim
//! - `DataShapeError` - the API answered 2xx but the body did not decode into
//!   the expected shape
//!
//! # Usage
//!
//! ```rust
//! use pipeline_dashboard::shared::error::ApiError;
//!
//! let error = ApiError::server(500, "Failed to fetch sheet data");
//! assert_eq!(error.user_message(), "Failed to fetch sheet data");
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and `Clone`, so a failure can be stored in
//! the sync state and returned to a caller at the same time.
use thiserror::Error;

/// Errors raised while calling the analytics/sync API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network unreachable, connection refused or request timeout
    #[error("Transport error: {message}")]
    TransportError {
        /// Human-readable error message
        message: String,
        /// Whether the request hit the configured timeout
        timed_out: bool,
    },

    /// Non-2xx response from the API
    #[error("Server error ({status}): {detail}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// The `detail` field of the error body, or the status text
        detail: String,
    },

    /// Response body missing expected fields or not valid JSON
    #[error("Data shape error: {message}")]
    DataShapeError {
        /// Human-readable error message
        message: String,
    },
}

impl ApiError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Create a new transport error for a timed out request
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Create a new server error
    pub fn server(status: u16, detail: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            detail: detail.into(),
        }
    }

    /// Create a new data shape error
    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShapeError {
            message: message.into(),
        }
    }

    /// The message shown next to the sync indicator.
    ///
    /// Server errors surface their `detail` unchanged; everything else uses
    /// the display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerError { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the failure happened before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::data_shape(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::data_shape(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::server(status.as_u16(), err.to_string());
        }
        if err.is_timeout() {
            return Self::timeout(err.to_string());
        }
        Self::transport(err.to_string())
    }
}
