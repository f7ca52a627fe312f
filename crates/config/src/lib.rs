//! keypoint configuration
//!
//! Settings live in a single TOML file in the platform config directory.
//! Each section implements [`ConfigSection`] so it can validate and merge
//! itself. Missing files fall back to defaults; files are written
//! atomically.
//!
//! # Example
//!
//! ```rust,no_run
//! use keypoint_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("config directory");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Skip forward: {}s", config.player.skip_forward_secs);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

mod app_config;
mod engine_config;
mod player_config;
mod store_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use persistence::ConfigPersistence;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use engine_config::EngineConfig;
pub use player_config::PlayerConfig;
pub use store_config::StoreConfig;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Application-level settings
    pub app: AppConfig,

    /// Player preferences
    pub player: PlayerConfig,

    /// Playback backend settings
    pub engine: EngineConfig,

    /// Store and entitlement settings
    pub store: StoreConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.engine.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.store.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.engine.merge(other.engine);
        self.store.merge(other.store);
    }
}
