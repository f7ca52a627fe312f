use keypoint_config::{Config, ConfigError, ConfigManager, LogLevel};
use keypoint_core::{Duration, PlaybackSpeed};
use std::fs;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

#[test]
fn test_hand_written_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keypoint.toml");
    fs::write(
        &path,
        r#"
[app]
log_level = "debug"

[player]
skip_forward_secs = 30
skip_backward_secs = 15
default_speed = "x1.5"

[engine]
tick_interval_ms = 100
clamp_double_speed = false

[store]
fetch_timeout_secs = 3
"#,
    )
    .unwrap();

    let config = ConfigManager::with_file(path).load().unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.app.log_level, LogLevel::Debug);
    assert_eq!(config.player.skip_forward(), Duration::from_seconds(30));
    assert_eq!(config.player.skip_backward(), Duration::from_seconds(15));
    assert_eq!(config.player.default_speed(), PlaybackSpeed::OneAndHalf);
    assert_eq!(config.player.event_buffer, 64);
    assert_eq!(config.engine.tick_interval(), StdDuration::from_millis(100));
    assert!(!config.engine.clamp_double_speed);
    assert_eq!(config.store.fetch_timeout(), StdDuration::from_secs(3));
}

#[test]
fn test_initialize_then_update() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().join("nested"));

    assert!(manager.initialize().unwrap());
    manager
        .update(|config| config.engine.double_speed_multiplier = 1.95)
        .unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.engine.double_speed_multiplier, 1.95);
    assert_eq!(config.player, Config::default().player);
}

#[test]
fn test_invalid_update_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf());
    manager.initialize().unwrap();
    let before = fs::read_to_string(manager.config_path()).unwrap();

    let result = manager.update(|config| config.player.event_buffer = 0);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
    assert_eq!(fs::read_to_string(manager.config_path()).unwrap(), before);
}
