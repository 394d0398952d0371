//! Error taxonomy for API operations.

use thiserror::Error;

/// The outbound request that produced a failure, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub url: String,
    /// Serialized JSON body, or empty for bodiless requests.
    pub payload: String,
}

impl RequestContext {
    pub fn new(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: payload.into(),
        }
    }
}

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthenticationFailed,
    Api { status: u16 },
    Transport,
    InvalidArgument,
}

/// Error type for API operations.
///
/// Every public operation returns one of these as data; nothing panics across
/// the operation boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthenticationFailed,
    /// Upstream answered with a status outside the accepted set.
    #[error("API error: {status}")]
    Status {
        status: u16,
        /// Compact JSON error body, or the raw text when it is not JSON.
        details: String,
        request: RequestContext,
    },
    /// No usable response was obtained.
    #[error("{message}")]
    Transport {
        message: String,
        request: Option<RequestContext>,
    },
    /// Rejected locally before any network call.
    #[error("{message}")]
    InvalidArgument { message: String, details: String },
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Status { status, .. } => ErrorKind::Api { status: *status },
            Self::Transport { .. } => ErrorKind::Transport,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Human-readable details beyond the error line, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Status { details, .. } | Self::InvalidArgument { details, .. } => {
                Some(details.as_str())
            }
            Self::AuthenticationFailed | Self::Transport { .. } => None,
        }
    }

    pub fn request(&self) -> Option<&RequestContext> {
        match self {
            Self::Status { request, .. } => Some(request),
            Self::Transport { request, .. } => request.as_ref(),
            Self::AuthenticationFailed | Self::InvalidArgument { .. } => None,
        }
    }
}

/// Failure before an HTTP response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_context() {
        let err = ApiError::Status {
            status: 422,
            details: r#"{"message":"name required"}"#.to_string(),
            request: RequestContext::new("https://x/flows", "{}"),
        };
        assert_eq!(err.kind(), ErrorKind::Api { status: 422 });
        assert_eq!(err.to_string(), "API error: 422");
        assert!(err.details().unwrap().contains("name required"));
        assert_eq!(err.request().unwrap().url, "https://x/flows");
    }

    #[test]
    fn test_invalid_argument_has_no_request() {
        let err = ApiError::invalid_argument("bad", "more");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.request().is_none());
    }
}
