//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Upstream     │  │     Local               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  DatabaseError          │ │
//! │  │  MissingCreds   │  │  Timeout        │  │  LockFailed             │ │
//! │  │  InvalidUrl     │  │  Status         │  │                         │ │
//! │  │  ConfigLoad     │  │  InvalidPayload │  │                         │ │
//! │  │                 │  │  RetriesExhaust │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single bad upstream record is not an error: it becomes a
//! [`MalformedRecord`](crate::payload::MalformedRecord) and is skipped.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every way a cycle can fail.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Upstream base URL or API key not set.
    #[error("Upstream credentials not configured: {0} is missing")]
    MissingCredentials(&'static str),

    /// Upstream base URL could not be parsed.
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Request never produced a response.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body is not JSON.
    #[error("Invalid upstream payload: {0}")]
    InvalidPayload(String),

    /// Every attempt allowed by the retry policy failed.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Database query failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The sync lock could not be taken or released.
    #[error("Sync lock error: {0}")]
    LockFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<vitrine_db::DbError> for SyncError {
    fn from(err: vitrine_db::DbError) -> Self {
        match err {
            vitrine_db::DbError::LockFailed(msg) => SyncError::LockFailed(msg),
            other => SyncError::DatabaseError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_builder() {
            SyncError::InvalidConfig(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidPayload(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the failed request may succeed when repeated.
    ///
    /// ## Retryable Errors
    /// - Connection failures
    /// - Timeouts
    /// - Non-success HTTP statuses
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Non-JSON bodies
    /// - Local database and lock failures
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) | SyncError::Status { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingCredentials(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout("30s".into()).is_retryable());
        assert!(SyncError::Status {
            status: 503,
            url: "http://upstream/v1/produtos".into()
        }
        .is_retryable());

        assert!(!SyncError::InvalidPayload("expected value".into()).is_retryable());
        assert!(!SyncError::MissingCredentials("API_KEY").is_retryable());
        assert!(!SyncError::DatabaseError("disk full".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::MissingCredentials("API_BASE_URL").is_config_error());
        assert!(SyncError::InvalidUrl("relative URL".into()).is_config_error());
        assert!(!SyncError::Timeout("30s".into()).is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::RetriesExhausted {
            operation: "produtos page 2".into(),
            attempts: 3,
            last_error: "HTTP 503".into(),
        };
        assert_eq!(err.to_string(), "produtos page 2 failed after 3 attempts: HTTP 503");
    }

    #[test]
    fn test_lock_errors_keep_their_kind() {
        let err: SyncError = vitrine_db::DbError::LockFailed("io".into()).into();
        assert!(matches!(err, SyncError::LockFailed(_)));
    }
}
