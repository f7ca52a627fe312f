//! Error types and recovery strategies for keypoint
//!
//! Errors are classified by severity:
//! - **Recoverable**: playback stopped, state is intact, the user may try again
//! - **Degraded**: a feature is gated until the user retries
//! - **Fatal**: reserved for failures outside the player (bad input files, I/O)
//!
//! Nothing is retried automatically. Every recovery action is a fresh,
//! user-issued intent.

use std::fmt;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// The user may issue the same intent again (e.g. press play)
    UserRetry,
    /// The input must be fixed before anything can happen
    FixInput,
    /// Nothing to do; the operation was abandoned on purpose
    None,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRetry => write!(f, "Retry when ready"),
            Self::FixInput => write!(f, "Fix the input and try again"),
            Self::None => write!(f, "No action required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by retrying
    Recoverable,
    /// Feature gated but app can continue
    Degraded,
    /// The requested operation cannot continue at all
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for keypoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The playback engine failed to start a stream or errored mid-stream
    #[error("Playback engine error: {message}")]
    Engine { message: String },

    /// Fetching the product or the active entitlements failed
    #[error("Entitlement fetch failed: {message}")]
    EntitlementFetch { message: String },

    /// A book summary failed validation
    #[error("Invalid book summary: {}", details.join("; "))]
    InvalidBook { details: Vec<String> },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Operation cancelled
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },
}

impl AppError {
    /// Creates an engine error
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Creates an entitlement fetch error
    pub fn entitlement_fetch(message: impl Into<String>) -> Self {
        Self::EntitlementFetch {
            message: message.into(),
        }
    }

    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Engine { .. } | Self::Cancelled { .. } => ErrorSeverity::Recoverable,
            Self::EntitlementFetch { .. } => ErrorSeverity::Degraded,
            Self::InvalidBook { .. } | Self::InvalidArgument { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::Engine { .. } | Self::EntitlementFetch { .. } => RecoveryAction::UserRetry,
            Self::InvalidBook { .. } | Self::InvalidArgument { .. } => RecoveryAction::FixInput,
            Self::Cancelled { .. } => RecoveryAction::None,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::Engine { .. } => "Playback stopped unexpectedly. Press play to try again.".to_string(),
            Self::EntitlementFetch { .. } => {
                "Error on fetching subscriptions. Please retry".to_string()
            }
            Self::InvalidBook { .. } => "This book cannot be opened.".to_string(),
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
            Self::Cancelled { .. } => "Operation was cancelled.".to_string(),
        }
    }

    /// Returns true if this error blocks access until the user retries
    pub fn is_blocking(&self) -> bool {
        self.severity() >= ErrorSeverity::Degraded
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_is_recoverable() {
        let err = AppError::engine("device lost");
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.recovery_action(), RecoveryAction::UserRetry);
        assert!(!err.is_blocking());
    }

    #[test]
    fn test_entitlement_fetch_error_blocks() {
        let err = AppError::entitlement_fetch("offline");
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
        assert_eq!(err.recovery_action(), RecoveryAction::UserRetry);
        assert!(err.is_blocking());
        assert_eq!(
            err.user_message(),
            "Error on fetching subscriptions. Please retry"
        );
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::engine("stream closed");
        assert_eq!(err.to_string(), "Playback engine error: stream closed");

        let err = AppError::InvalidBook {
            details: vec!["Title cannot be empty".to_string(), "x".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid book summary: Title cannot be empty; x");
    }

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(RecoveryAction::UserRetry.to_string(), "Retry when ready");
    }

    #[test]
    fn test_result_type_alias() {
        fn fails() -> Result<i32> {
            Err(AppError::Cancelled {
                operation: "seek".to_string(),
            })
        }
        assert!(fails().is_err());
    }
}
