//! Error types for the PromptLab client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the PromptLab client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// The server understood the request but could not run it
    ///
    /// Returned for pipelines with an invalid stored definition and for
    /// request bodies whose variables are not a string map.
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, Self::ApiError { status: 422, .. })
    }

    /// Message reported by the server, if the error came from it
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::ApiError { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = ClientError::api_error(404, "Pipeline x not found");
        assert!(not_found.is_not_found());
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());

        let unprocessable = ClientError::api_error(422, "bad variables");
        assert!(unprocessable.is_client_error());
        assert!(unprocessable.is_unprocessable());
        assert!(!unprocessable.is_not_found());
        assert_eq!(unprocessable.server_message(), Some("bad variables"));

        let internal = ClientError::api_error(500, "boom");
        assert!(internal.is_server_error());
        assert!(!internal.is_client_error());
    }
}
