//! Player state and settings

use keypoint_core::{BookSummary, Chapter, Duration, PlaybackPosition, PlaybackSpeed};

/// Tunables the reducer reads but never changes
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// How far "skip forward" jumps
    pub skip_forward: Duration,
    /// How far "skip backward" jumps
    pub skip_backward: Duration,
    /// Capacity of the intent and engine-event queues
    pub event_buffer: usize,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            skip_forward: Duration::from_seconds(10),
            skip_backward: Duration::from_seconds(5),
            event_buffer: 64,
        }
    }
}

/// Everything the player knows about one listening session.
///
/// Created once per session from a book summary and only ever changed by
/// [`crate::reduce`]. When the catalog is non-empty,
/// `current_chapter_index < chapter_count()` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub(crate) book: BookSummary,
    pub(crate) current_chapter_index: usize,
    pub(crate) is_playing: bool,
    pub(crate) position: PlaybackPosition,
    pub(crate) speed: PlaybackSpeed,
}

impl PlayerState {
    /// Starts at the top of the first chapter, paused, at normal speed
    pub fn new(book: BookSummary) -> Self {
        let position = book
            .chapter(0)
            .map(|c| PlaybackPosition::start_of(c.duration))
            .unwrap_or_default();
        Self {
            book,
            current_chapter_index: 0,
            is_playing: false,
            position,
            speed: PlaybackSpeed::default(),
        }
    }

    /// Same as [`PlayerState::new`] with a preferred starting speed
    pub fn with_speed(book: BookSummary, speed: PlaybackSpeed) -> Self {
        Self {
            speed,
            ..Self::new(book)
        }
    }

    pub fn book(&self) -> &BookSummary {
        &self.book
    }

    pub fn current_chapter_index(&self) -> usize {
        self.current_chapter_index
    }

    /// `None` only when the catalog is empty
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.book.chapter(self.current_chapter_index)
    }

    pub fn chapter_count(&self) -> usize {
        self.book.chapter_count()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub(crate) fn current_duration(&self) -> Duration {
        self.current_chapter()
            .map(|c| c.duration)
            .unwrap_or(Duration::ZERO)
    }
}
