//! Reading and writing the config file
//!
//! Writes go through a temporary file in the same directory followed by an
//! atomic rename, so the config file is never left half-written.

use crate::error::join_errors;
use crate::{Config, ConfigError, ConfigResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: &str = "# keypoint configuration\n# Delete a key to fall back to its default.\n\n";

/// Handles configuration file persistence
#[derive(Debug, Clone)]
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    /// Creates a new persistence handler for the given config file path
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the default config. An empty or unparsable
    /// file is an error. Out-of-range values are logged and kept so the
    /// user can fix them by hand.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::Read {
                path: self.config_path.clone(),
                source: e,
            })?;

        if contents.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.config_path.clone(),
            });
        }

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: self.config_path.clone(),
            source: e,
        })?;

        if let Err(errors) = config.validate() {
            log::warn!("Config validation warnings: {}", join_errors(&errors));
        }

        Ok(config)
    }

    /// Validates and saves configuration atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::Invalid(errors));
        }

        if let Some(parent) = self.config_path.parent() {
            self.ensure_directory_exists(parent)?;
        }

        let body = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        let temp_file = self.create_temp_file()?;
        self.write_atomic(temp_file, &format!("{}{}", HEADER, body))?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn ensure_directory_exists(&self, path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| self.save_error(e))?;
            log::info!("Created config directory: {}", path.display());
        }
        Ok(())
    }

    /// Creates a temporary file next to the config file
    fn create_temp_file(&self) -> ConfigResult<NamedTempFile> {
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| {
                self.save_error(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "config path has no parent directory",
                ))
            })?;

        NamedTempFile::new_in(dir).map_err(|e| self.save_error(e))
    }

    fn write_atomic(&self, mut temp_file: NamedTempFile, content: &str) -> ConfigResult<()> {
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| self.save_error(e))?;
        temp_file.flush().map_err(|e| self.save_error(e))?;

        temp_file
            .persist(&self.config_path)
            .map_err(|e| self.save_error(e.error))?;

        Ok(())
    }

    fn save_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Save {
            path: self.config_path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let config = persistence.load().expect("Should load default config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.player.skip_forward_secs = 30;
        config.engine.clamp_double_speed = false;

        persistence.save(&config).expect("Should save config");
        assert_eq!(persistence.load().expect("Should load config"), config);
    }

    #[test]
    fn test_saved_file_has_header() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());
        persistence.save(&Config::default()).expect("Should save");

        let contents = fs::read_to_string(&config_path).expect("Should read");
        assert!(contents.starts_with("# keypoint configuration"));
        assert!(contents.contains("[player]"));
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.toml");
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence
            .save(&Config::default())
            .expect("Should create directory and save");
        assert!(config_path.exists());
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "this is not valid TOML {{{").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "  \n\t\n").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_out_of_range_values_load_with_warning() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "[store]\nfetch_timeout_secs = 0\n").expect("Should write file");

        let config = ConfigPersistence::new(config_path)
            .load()
            .expect("Should load despite invalid value");
        assert_eq!(config.store.fetch_timeout_secs, 0);
    }

    #[test]
    fn test_validate_before_save() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());

        let mut config = Config::default();
        config.player.default_speed = "x9".to_string();

        let result = persistence.save(&config);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ref errors)) if errors[0].field == "player.default_speed"
        ));
        assert!(!config_path.exists());
    }
}
