//! Domain error types
//!
//! This module defines the error hierarchy for Porter. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Porter error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum PorterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Jira-related errors
    #[error("Jira error: {0}")]
    Jira(#[from] JiraError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted state errors (processed log, identity caches)
    #[error("State error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Jira-specific errors
///
/// Errors that occur when talking to a Jira server. These don't expose the
/// underlying HTTP client types.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Failed to connect to the Jira server
    #[error("Failed to connect to Jira server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Requested resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Search query failed
    #[error("Search failed: {0}")]
    SearchFailed(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for PorterError {
    fn from(err: std::io::Error) -> Self {
        PorterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PorterError {
    fn from(err: serde_json::Error) -> Self {
        PorterError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PorterError {
    fn from(err: toml::de::Error) -> Self {
        PorterError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porter_error_display() {
        let err = PorterError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_jira_error_conversion() {
        let jira_err = JiraError::ConnectionFailed("Network error".to_string());
        let porter_err: PorterError = jira_err.into();
        assert!(matches!(porter_err, PorterError::Jira(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let porter_err: PorterError = io_err.into();
        assert!(matches!(porter_err, PorterError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let porter_err: PorterError = json_err.into();
        assert!(matches!(porter_err, PorterError::Serialization(_)));
    }

    #[test]
    fn test_porter_error_implements_std_error() {
        let err = PorterError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_server_error_display() {
        let err = JiraError::ServerError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Server error: 502 - bad gateway");
    }
}
