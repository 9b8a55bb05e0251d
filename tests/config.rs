use stereo_face_distance::{AppConfig, Error};

#[test]
fn missing_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config, AppConfig::default());
    assert!(path.exists());

    let written: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, config);
}

#[test]
fn partial_file_is_completed_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "calibration": { "baseline_mm": 62.5 } }"#).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.calibration.baseline_mm, 62.5);
    assert_eq!(config.calibration.reference_width_px, 1280.0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("focal_length_px"));
    assert!(content.contains("corner_length"));
}

#[test]
fn unparsable_file_is_fatal_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let original = r#"{ "calibration": { "baseline_mm": "sixty", "focal_length_px": 900.0 } }"#;
    std::fs::write(&path, original).unwrap();

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn malformed_json_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(AppConfig::load(&path), Err(Error::Json(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn invalid_calibration_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "calibration": { "min_valid_mm": 1200.0, "max_valid_mm": 900.0 } }"#,
    )
    .unwrap();

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidCalibration(_)));
}
