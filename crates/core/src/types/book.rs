//! Book summary and chapter catalog

use crate::types::{Duration, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a book summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the BookId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One titled, independently seekable segment of a book's audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub audio_resource_id: String,
    #[serde(rename = "duration_ms")]
    pub duration: Duration,
}

impl Chapter {
    pub fn new(
        title: impl Into<String>,
        audio_resource_id: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            audio_resource_id: audio_resource_id.into(),
            duration,
        }
    }
}

/// A book summary and its ordered, read-only chapter catalog.
///
/// `purchase_id` ties the book to the store's entitlement system and means
/// nothing to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(default)]
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub image_ref: String,
    pub purchase_id: String,
    #[serde(default)]
    chapters: Vec<Chapter>,
}

impl BookSummary {
    pub fn new(
        title: impl Into<String>,
        image_ref: impl Into<String>,
        chapters: Vec<Chapter>,
        purchase_id: impl Into<String>,
    ) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            image_ref: image_ref.into(),
            purchase_id: purchase_id.into(),
            chapters,
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Sum of every chapter's duration
    pub fn total_duration(&self) -> Duration {
        self.chapters
            .iter()
            .fold(Duration::ZERO, |acc, c| acc.saturating_add(c.duration))
    }
}

impl Validator for BookSummary {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.purchase_id.trim().is_empty() {
            errors.push("Purchase id cannot be empty".to_string());
        }

        for (index, chapter) in self.chapters.iter().enumerate() {
            let number = index + 1;
            if chapter.title.trim().is_empty() {
                errors.push(format!("Chapter {} has an empty title", number));
            }
            if chapter.audio_resource_id.trim().is_empty() {
                errors.push(format!("Chapter {} has no audio resource", number));
            }
            if chapter.duration.is_zero() {
                errors.push(format!("Chapter {} duration must be greater than zero", number));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
