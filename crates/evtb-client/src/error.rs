//! # API Errors
//!
//! Error types for session and API operations.

use serde_json::Value;
use thiserror::Error;

use crate::messages;

/// Errors that can occur during API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or transport error (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// User-facing message extracted from the body or the fallback table.
        message: String,
        /// Parsed response body (`null` when empty, a JSON string when not JSON).
        data: Value,
    },

    /// Failed to deserialize a successful response.
    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    /// Credential storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// The request could not be built (bad header value, unusable token).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request body could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token refresh failed.
    #[error("token refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

impl ApiError {
    /// Returns the HTTP status code, if the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the response body attached to an HTTP error.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Http { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns whether this error is a 4xx response.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns whether this error is a 5xx response.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }

    /// Returns whether the backend rejected our credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for showing to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Network(_) => messages::NETWORK_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

/// Outcome of a failed refresh attempt.
///
/// `Clone` so that one in-flight attempt can hand the same failure to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The backend has no refresh endpoint.
    #[error("token refresh is not supported by the backend")]
    Unsupported,

    /// No refresh token is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The credential was replaced or cleared while the refresh was running.
    #[error("credential changed during refresh")]
    Superseded,

    /// The refresh request itself failed.
    #[error("{0}")]
    Failed(String),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            message: "boom".into(),
            data: Value::Null,
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(http(404).is_client_error());
        assert!(!http(404).is_server_error());
        assert!(http(503).is_server_error());
        assert!(http(401).is_unauthorized());
        assert!(!ApiError::Storage("disk".into()).is_client_error());
    }

    #[test]
    fn test_http_error_exposes_status_and_data() {
        let err = ApiError::Http {
            status: 409,
            message: "Sản phẩm đã tồn tại".into(),
            data: json!({ "message": "Sản phẩm đã tồn tại" }),
        };

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.data(), Some(&json!({ "message": "Sản phẩm đã tồn tại" })));
        assert_eq!(err.to_string(), "Sản phẩm đã tồn tại");
        assert_eq!(err.user_message(), "Sản phẩm đã tồn tại");
    }

    #[test]
    fn test_refresh_error_display() {
        let err = ApiError::from(RefreshError::Unsupported);
        assert!(err.to_string().contains("not supported"));
        assert_eq!(err.status(), None);
    }
}
