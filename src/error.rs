//! Error types for taskpulse
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Error context and chaining
//! - Exit codes for CLI
//!
//! Note that errors raised while mirroring a host task lifecycle are
//! swallowed by the safe API facade; these types surface only through
//! the CLI and through explicit (non-safe) API calls.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for taskpulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    NotConfigured = 103,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Tracking service API errors (3xx)
    ApiConnection = 300,
    ApiTimeout = 301,
    ApiUnexpectedStatus = 302,
    ApiDecode = 303,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // API errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for taskpulse
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Tracking service credentials are incomplete
    #[error("Tracking is not configured (missing: {missing})")]
    NotConfigured { missing: String },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Tracking Service API Errors
    // ─────────────────────────────────────────────────────────────

    /// Could not reach the tracking service
    #[error("Failed to reach {url}: {message}")]
    ApiConnection { url: String, message: String },

    /// Request to the tracking service timed out
    #[error("Request to {url} timed out after {timeout_secs}s")]
    ApiTimeout { url: String, timeout_secs: u64 },

    /// The tracking service answered outside the 2xx range
    #[error("Tracking service returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to decode tracking service response: {message}")]
    ApiDecode { message: String },

    /// Transport-level HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::NotConfigured { .. } => ErrorCode::NotConfigured,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::ApiConnection { .. } => ErrorCode::ApiConnection,
            Error::ApiTimeout { .. } => ErrorCode::ApiTimeout,
            Error::UnexpectedStatus { .. } => ErrorCode::ApiUnexpectedStatus,
            Error::ApiDecode { .. } => ErrorCode::ApiDecode,
            Error::Http(e) => {
                if e.is_timeout() {
                    ErrorCode::ApiTimeout
                } else if e.is_decode() {
                    ErrorCode::ApiDecode
                } else {
                    ErrorCode::ApiConnection
                }
            }

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is retryable
    ///
    /// Advisory only. The tracking layer itself never retries; a host
    /// application may use this to decide whether re-submitting makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ApiConnection { .. } | Error::ApiTimeout { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::UnexpectedStatus { status, .. } => *status >= 500,
            Error::Io(_) | Error::IoRead { .. } | Error::IoWrite { .. } => true,
            _ => false,
        }
    }

    /// Check if the error is fatal (command should exit)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::NotConfigured { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'taskpulse config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'taskpulse config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values. Run 'taskpulse config show' to inspect the merged settings."
            ),
            Error::NotConfigured { .. } => Some(
                "Set TASKPULSE_ORG, TASKPULSE_PROJECT and TASKPULSE_API_KEY, or fill the [api] section of taskpulse.toml."
            ),

            Error::ApiConnection { .. } => Some(
                "Check your network connection and verify the configured host is correct."
            ),
            Error::ApiTimeout { .. } => Some(
                "The tracking service may be slow or unreachable. Check your network and firewall settings."
            ),
            Error::UnexpectedStatus { status, .. } if *status == 401 || *status == 403 => Some(
                "Verify your API token has access to this organization and project."
            ),
            Error::UnexpectedStatus { status, .. } if *status == 404 => Some(
                "Check that the organization, project and task id are correct."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a not-configured error naming the missing settings
    pub fn not_configured(missing: &[&str]) -> Self {
        Error::NotConfigured {
            missing: missing.join(", "),
        }
    }

    /// Create a connection error
    pub fn api_connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ApiConnection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn api_timeout(url: impl Into<String>, timeout_secs: u64) -> Self {
        Error::ApiTimeout {
            url: url.into(),
            timeout_secs,
        }
    }

    /// Create an unexpected-status error
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Error::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::ApiConnection.as_str(), "E300");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::NotConfigured.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::ApiUnexpectedStatus.exit_code(), 30);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/path/to/config.toml"),
            source: None,
        };
        assert!(err.to_string().contains("/path/to/config.toml"));
    }

    #[test]
    fn test_error_codes() {
        let err = Error::config_not_found("/test");
        assert_eq!(err.code(), ErrorCode::ConfigNotFound);

        let err = Error::api_connection("https://example.com", "refused");
        assert_eq!(err.code(), ErrorCode::ApiConnection);

        let err = Error::unexpected_status(502, "bad gateway");
        assert_eq!(err.code(), ErrorCode::ApiUnexpectedStatus);
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::api_connection("url", "test").is_retryable());
        assert!(Error::api_timeout("url", 30).is_retryable());
        assert!(Error::unexpected_status(503, "unavailable").is_retryable());
        assert!(!Error::unexpected_status(404, "not found").is_retryable());
        assert!(!Error::config_not_found("/test").is_retryable());
        assert!(!Error::not_configured(&["token"]).is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::config_not_found("/test").is_fatal());
        assert!(Error::not_configured(&["organization", "token"]).is_fatal());
        assert!(!Error::api_connection("url", "test").is_fatal());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().is_some());
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::not_configured(&["token"]);
        assert!(err.suggestion().unwrap().contains("TASKPULSE_API_KEY"));

        let err = Error::unexpected_status(401, "unauthorized");
        assert!(err.suggestion().unwrap().contains("API token"));
    }

    #[test]
    fn test_not_configured_lists_missing() {
        let err = Error::not_configured(&["organization", "project"]);
        assert!(err.to_string().contains("organization, project"));
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E100]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
