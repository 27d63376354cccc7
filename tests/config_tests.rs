use pedalsyncrs::config::{ConfigError, EngineConfig};
use std::fs;
use std::path::PathBuf;

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("pedalsyncrs-{}-{}", std::process::id(), name));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_file_overrides_defaults() {
    let path = write_config(
        "override.toml",
        "debounce_window_us = 15000\nsession_count = 16\nauxiliary_indicator = true\n",
    );
    let config = EngineConfig::load(Some(&path)).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(config.debounce_window_us, 15_000);
    assert_eq!(config.session_count, 16);
    assert!(config.auxiliary_indicator);
    // Untouched keys keep their defaults
    assert_eq!(config.program_channel, 15);
    assert_eq!(config.default_tick_interval_us(), 20_833);
}

#[test]
fn test_invalid_values_rejected() {
    let path = write_config("invalid.toml", "default_bpm = 300\n");
    let result = EngineConfig::load(Some(&path));
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_missing_file_is_a_load_error() {
    let path = std::env::temp_dir().join("pedalsyncrs-does-not-exist.toml");
    match EngineConfig::load(Some(&path)) {
        Err(e @ ConfigError::Load(_)) => {
            assert!(e.to_string().starts_with("configuration load error"));
        }
        other => panic!("expected a load error, got {:?}", other),
    }
}
