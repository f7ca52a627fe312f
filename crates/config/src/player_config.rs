//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use keypoint_core::{Duration, PlaybackSpeed};
use serde::{Deserialize, Serialize};

/// Player preferences and behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// How far "skip forward" jumps, in seconds
    pub skip_forward_secs: u64,

    /// How far "skip backward" jumps, in seconds
    pub skip_backward_secs: u64,

    /// Speed label the player starts at ("x0.5", "x0.75", "x1", "x1.5", "x2")
    pub default_speed: String,

    /// Capacity of the intent and engine-event queues
    pub event_buffer: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            skip_forward_secs: 10,
            skip_backward_secs: 5,
            default_speed: PlaybackSpeed::Normal.label().to_string(),
            event_buffer: 64,
        }
    }
}

impl PlayerConfig {
    pub fn skip_forward(&self) -> Duration {
        Duration::from_seconds(self.skip_forward_secs)
    }

    pub fn skip_backward(&self) -> Duration {
        Duration::from_seconds(self.skip_backward_secs)
    }

    /// The configured starting speed, normal speed if the label is unknown
    pub fn default_speed(&self) -> PlaybackSpeed {
        PlaybackSpeed::from_label(&self.default_speed).unwrap_or_default()
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let labels: Vec<&str> = PlaybackSpeed::ALL.iter().map(|s| s.label()).collect();
        Validator::collect_errors(vec![
            Validator::in_range(self.skip_forward_secs, 1, 120, "player.skip_forward_secs"),
            Validator::in_range(self.skip_backward_secs, 1, 120, "player.skip_backward_secs"),
            Validator::one_of(
                &self.default_speed.trim(),
                &labels,
                "player.default_speed",
            ),
            Validator::in_range(self.event_buffer, 1, 4096, "player.event_buffer"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.skip_forward_secs = other.skip_forward_secs;
        self.skip_backward_secs = other.skip_backward_secs;
        self.default_speed = other.default_speed;
        self.event_buffer = other.event_buffer;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
