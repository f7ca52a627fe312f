//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "KEYPOINT";

/// Loads, saves and locates the keypoint config file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    persistence: ConfigPersistence,
}

impl ConfigManager {
    /// Creates a config manager for the platform config directory
    ///
    /// - Linux: `~/.config/keypoint/`
    /// - macOS: `~/Library/Application Support/keypoint/`
    /// - Windows: `%APPDATA%\keypoint\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self::with_directory(config_dir))
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> Self {
        Self::with_file(config_dir.join(CONFIG_FILE))
    }

    /// Creates a config manager for an explicit config file
    pub fn with_file(config_path: PathBuf) -> Self {
        Self {
            persistence: ConfigPersistence::new(config_path),
        }
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "keypoint")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDirectory)
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and saves the configuration atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads the current config, applies `update_fn` and saves the result
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation problem in the config file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `KEYPOINT_SECTION_FIELD` environment
    /// overrides, e.g. `KEYPOINT_PLAYER_SKIP_FORWARD_SECS=30`
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(variable: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::EnvOverride {
        variable: variable.to_string(),
        value: value.to_string(),
    })
}

/// Applies overrides found through `lookup`, which maps a variable name to
/// its value
pub(crate) fn apply_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let name = format!("{}_{}", ENV_PREFIX, suffix);
        lookup(&name).map(|value| (name, value))
    };

    if let Some((name, value)) = var("APP_LOG_LEVEL") {
        config.app.log_level = parse::<LogLevel>(&name, &value)?;
    }
    if let Some((name, value)) = var("PLAYER_SKIP_FORWARD_SECS") {
        config.player.skip_forward_secs = parse(&name, &value)?;
    }
    if let Some((name, value)) = var("PLAYER_SKIP_BACKWARD_SECS") {
        config.player.skip_backward_secs = parse(&name, &value)?;
    }
    if let Some((_, value)) = var("PLAYER_DEFAULT_SPEED") {
        config.player.default_speed = value.trim().to_string();
    }
    if let Some((name, value)) = var("ENGINE_TICK_INTERVAL_MS") {
        config.engine.tick_interval_ms = parse(&name, &value)?;
    }
    if let Some((name, value)) = var("STORE_FETCH_TIMEOUT_SECS") {
        config.store.fetch_timeout_secs = parse(&name, &value)?;
    }
    Ok(())
}
