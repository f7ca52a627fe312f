//! Playback engine configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the playback backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// How often the simulated engine reports its position, in milliseconds
    pub tick_interval_ms: u64,

    /// Replace an exact 2x request with `double_speed_multiplier`
    pub clamp_double_speed: bool,

    /// Multiplier actually sent to the backend for the 2x step
    pub double_speed_multiplier: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            clamp_double_speed: true,
            double_speed_multiplier: 1.99,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl ConfigSection for EngineConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.tick_interval_ms, 10, 5000, "engine.tick_interval_ms"),
            Validator::in_range(
                self.double_speed_multiplier,
                1.5,
                2.0,
                "engine.double_speed_multiplier",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.tick_interval_ms = other.tick_interval_ms;
        self.clamp_double_speed = other.clamp_double_speed;
        self.double_speed_multiplier = other.double_speed_multiplier;
    }

    fn section_name(&self) -> &'static str {
        "engine"
    }
}
