//! Error types for the player session

use thiserror::Error;

/// Result type for player operations
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Errors raised while talking to a player session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The session loop has ended and no longer accepts intents
    #[error("Player session is closed")]
    SessionClosed,

    /// The session's intent queue is full
    #[error("Player session is busy, intent dropped")]
    Busy,
}
