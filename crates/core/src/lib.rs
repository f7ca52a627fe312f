//! Domain types shared by every keypoint crate.

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    BookId, BookSummary, Chapter, Duration, PlaybackPosition, PlaybackSpeed, Validator,
};
