//! The discrete playback speed ladder

use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback speed, one of five fixed steps ordered by multiplier.
///
/// Multipliers are nominal. Engines that cannot play a given step exactly
/// substitute their own value behind the engine interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackSpeed {
    /// Every step, slowest first
    pub const ALL: [PlaybackSpeed; 5] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::ThreeQuarters,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::Double,
    ];

    pub fn multiplier(&self) -> f32 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::ThreeQuarters => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackSpeed::Half => "x0.5",
            PlaybackSpeed::ThreeQuarters => "x0.75",
            PlaybackSpeed::Normal => "x1",
            PlaybackSpeed::OneAndHalf => "x1.5",
            PlaybackSpeed::Double => "x2",
        }
    }

    /// Next faster step, wrapping from the fastest back to the slowest
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Parses a label such as `"x1.5"`
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
