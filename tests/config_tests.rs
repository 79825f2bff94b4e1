// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use drive_recorder::errors::AppError;
use drive_recorder::config::GSensorSensitivity;
use drive_recorder::{Config, ConfigHandle};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.frame_rate, 30);
    assert!(config.overlay_enabled, "Overlay should be enabled by default");
    assert!(!config.record_audio, "Audio should be opt-in");

    let recording = config.recording_config();
    assert_eq!((recording.width, recording.height), (1280, 720));
    assert!(recording.has_overlay());
    assert!(!recording.has_audio());
}

#[test]
fn test_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = Config {
        frame_rate: 15,
        record_audio: true,
        recordings_dir: dir.path().join("videos"),
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "record_audio": true }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(config.record_audio);
    assert_eq!(config.frame_rate, Config::default().frame_rate);
}

#[test]
fn test_malformed_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
}

#[test]
fn test_unsupported_frame_rate_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "frame_rate": 0 }"#).unwrap();

    assert_eq!(Config::load_from(&path).unwrap().frame_rate, 30);
}

#[test]
fn test_handle_changes_visible_to_clones() {
    let handle = ConfigHandle::new(Config::default());
    let other = handle.clone();
    other.update(|c| c.overlay_enabled = false);
    assert!(!handle.get().overlay_enabled);
}

#[test]
fn test_trigger_settings_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = Config {
        auto_start_enabled: true,
        auto_stop_enabled: true,
        auto_start_speed_kmh: 25.0,
        gsensor_sensitivity: GSensorSensitivity::Medium,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert!(loaded.auto_start_enabled && loaded.auto_stop_enabled);
    assert_eq!(loaded.auto_start_speed_kmh, 25.0);
    assert_eq!(loaded.gsensor_sensitivity, GSensorSensitivity::Medium);
    // Recording parameters do not depend on them
    assert_eq!(loaded.recording_config(), Config::default().recording_config());

    let strong = GSensorSensitivity::Strong.threshold();
    let medium = GSensorSensitivity::Medium.threshold();
    assert!(strong > medium && medium > GSensorSensitivity::Weak.threshold());
}

#[test]
fn test_negative_auto_start_speed_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "auto_start_speed_kmh": -5.0 }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.auto_start_speed_kmh, Config::default().auto_start_speed_kmh);
}
