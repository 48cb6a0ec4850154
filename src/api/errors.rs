use thiserror::Error;

/// Typed error enum for lesson API operations
///
/// Separates failure modes so callers can tell a missing resource or a
/// rejected session apart from a transient outage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Authentication failed (401, 403)
    #[error("Authentication failed: {message} (status: {status})")]
    Authentication { status: u16, message: String },

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client error (400-499, excluding auth and not found)
    #[error("Client error: {message} (status: {status})")]
    ClientError { status: u16, message: String },

    /// Server error (500+)
    #[error("Server error: {message} (status: {status})")]
    ServerError { status: u16, message: String },

    /// Network/connection errors (timeout, connection refused, etc.)
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("API error: {0}")]
    Other(String),
}

impl ApiError {
    /// Check if this error is transient and could succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::ServerError { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Create an error from a reqwest error
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            ApiError::Network(format!("Request error: {}", error))
        } else if error.is_decode() {
            ApiError::ParseError(error.to_string())
        } else {
            ApiError::Other(error.to_string())
        }
    }

    /// Create an error from an HTTP status code and response body
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Authentication {
                status,
                message: body,
            },
            404 => ApiError::NotFound(body),
            400..=499 => ApiError::ClientError {
                status,
                message: body,
            },
            500..=599 => ApiError::ServerError {
                status,
                message: body,
            },
            _ => ApiError::Other(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::ParseError(error.to_string())
    }
}
