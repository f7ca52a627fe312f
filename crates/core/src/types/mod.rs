//! Domain types for keypoint
//!
//! - `book`: book summaries and their chapter catalog
//! - `position`: playback position within a chapter
//! - `speed`: the discrete playback speed ladder
//! - `common`: millisecond durations and validation

mod book;
mod common;
mod position;
mod speed;

pub use book::{BookId, BookSummary, Chapter};
pub use common::{Duration, Validator};
pub use position::PlaybackPosition;
pub use speed::PlaybackSpeed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _book_id: BookId = BookId::new();
        let _speed: PlaybackSpeed = PlaybackSpeed::default();
        let _position: PlaybackPosition = PlaybackPosition::default();
    }

    #[test]
    fn test_duration_formatting() {
        let d = Duration::from_seconds(3665);
        assert_eq!(d.to_string(), "1:01:05");
    }
}
