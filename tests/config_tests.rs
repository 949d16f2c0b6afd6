// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use data_collection::config::{Config, DetectOverrides, MotionSettings};
use data_collection::errors::AppError;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.camera_index, 0);
    assert_eq!(config.jpeg_quality, 95);
    assert_eq!(config.motion.threshold, 500);
    assert_eq!(config.motion.pixel_threshold, 30);
    assert_eq!(config.motion.interval_ms, 500);
    assert_eq!(config.motion.output_dir, PathBuf::from("captured_changes"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "camera_index": 2, "motion": { "threshold": 1200 } }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.camera_index, 2);
    assert_eq!(config.motion.threshold, 1200);
    assert_eq!(config.motion.pixel_threshold, 30);
    assert_eq!(config.jpeg_quality, 95);
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        dataset_root: PathBuf::from("/data/faces"),
        jpeg_quality: 80,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
}

#[test]
fn test_out_of_range_quality_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "jpeg_quality": 0 }"#).unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
}

#[test]
fn test_flags_override_file_values() {
    let mut config = Config::default();
    config.merge_detect(DetectOverrides {
        threshold: Some(50),
        interval_ms: Some(0),
        ..DetectOverrides::default()
    });

    assert_eq!(
        config.motion,
        MotionSettings {
            threshold: 50,
            interval_ms: 0,
            ..MotionSettings::default()
        }
    );

    config.merge_collect(Some(1), Some(PathBuf::from("out")));
    assert_eq!(config.camera_index, 1);
    assert_eq!(config.dataset_root, PathBuf::from("out"));

    // Absent flags leave values alone
    config.merge_collect(None, None);
    assert_eq!(config.camera_index, 1);
}
