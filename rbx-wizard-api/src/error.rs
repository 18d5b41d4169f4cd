use serde::{Deserialize, Serialize};

/// Unified error type for every backend request.
///
/// Each variant carries the request `path` it originated from so a failure can be
/// traced back to the endpoint without the caller re-attaching context.
///
/// # Failure causes
///
/// - [`Timeout`](Self::Timeout): the configured deadline elapsed and the transfer was aborted
/// - [`NetworkError`](Self::NetworkError): any other transport failure (refused, reset, DNS)
/// - [`HttpStatus`](Self::HttpStatus): the backend answered with a non-success status
///
/// The remaining variants describe bodies that could not be encoded or decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// The request did not complete within its deadline.
    Timeout {
        /// Request path.
        path: String,
        /// Deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// A transport-level failure that is not a timeout.
    NetworkError {
        /// Request path.
        path: String,
        /// Error details.
        detail: String,
    },

    /// The backend answered with a non-success HTTP status.
    ///
    /// `message` is taken from a `{"message": ...}` or `{"detail": ...}` error body
    /// when present, otherwise synthesized from the status line.
    HttpStatus {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Normalized error message.
        message: String,
    },

    /// A response declared as JSON could not be parsed.
    ParseError {
        /// Request path.
        path: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// A request body could not be serialized.
    SerializationError {
        /// Details about the serialization failure.
        detail: String,
    },

    /// The response parsed, but not into the shape the caller expected.
    UnexpectedBody {
        /// Request path.
        path: String,
        /// What was expected versus received.
        detail: String,
    },
}

impl ApiError {
    /// Whether this is expected behavior (absent resource, rejected input), used for log levels.
    ///
    /// Use `warn` when this returns `true` and `error` when it returns `false`.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if (400..500).contains(status))
    }

    /// Whether the request was aborted by its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// HTTP status code, when the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as absent (HTTP 404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The human-readable message, without the request path prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Timeout { .. } => "Request timeout: API server is not responding".to_string(),
            Self::NetworkError { detail, .. }
            | Self::ParseError { detail, .. }
            | Self::SerializationError { detail }
            | Self::UnexpectedBody { detail, .. } => detail.clone(),
            Self::HttpStatus { message, .. } => message.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, timeout_ms } => {
                write!(f, "[{path}] Request timeout after {timeout_ms}ms")
            }
            Self::NetworkError { path, detail } => {
                write!(f, "[{path}] Network error: {detail}")
            }
            Self::HttpStatus {
                path,
                status,
                message,
            } => {
                write!(f, "[{path}] HTTP {status}: {message}")
            }
            Self::ParseError { path, detail } => {
                write!(f, "[{path}] Parse error: {detail}")
            }
            Self::SerializationError { detail } => {
                write!(f, "Serialization error: {detail}")
            }
            Self::UnexpectedBody { path, detail } => {
                write!(f, "[{path}] Unexpected response body: {detail}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timeout() {
        let e = ApiError::Timeout {
            path: "/statements".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(e.to_string(), "[/statements] Request timeout after 10000ms");
        assert!(e.is_timeout());
        assert!(!e.is_expected());
    }

    #[test]
    fn display_network_error() {
        let e = ApiError::NetworkError {
            path: "/validator".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[/validator] Network error: connection refused");
        assert!(!e.is_timeout());
    }

    #[test]
    fn display_http_status() {
        let e = ApiError::HttpStatus {
            path: "/checker".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(e.to_string(), "[/checker] HTTP 500: boom");
        assert_eq!(e.message(), "boom");
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn client_errors_are_expected() {
        let e = ApiError::HttpStatus {
            path: "/interactor".to_string(),
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(e.is_expected());
        assert!(e.is_not_found());
    }

    #[test]
    fn server_errors_are_not_expected() {
        let e = ApiError::HttpStatus {
            path: "/statements".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(!e.is_expected());
        assert!(!e.is_not_found());
    }

    #[test]
    fn timeout_message_is_user_facing() {
        let e = ApiError::Timeout {
            path: "/llm/models".to_string(),
            timeout_ms: 5,
        };
        assert_eq!(
            e.message(),
            "Request timeout: API server is not responding"
        );
    }

    #[test]
    fn serialize_is_tagged_by_code() {
        let e = ApiError::HttpStatus {
            path: "/statement/a/code".to_string(),
            status: 422,
            message: "bad".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"HttpStatus\""));
        assert!(json.contains("\"status\":422"));
    }
}
