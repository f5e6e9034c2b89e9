//! Configuration file handling

use camera_effects::{
    adjustments::StyleFilter,
    config::{Config, EXAMPLE_CONFIG},
    filters::SmoothingMode,
    placement::OverlayKind,
    session::EffectsSession,
    Error,
};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("camera-effects-{}-{name}", std::process::id()))
}

#[test]
fn test_config_file_round_trip() {
    let path = temp_path("round-trip.yaml");
    let mut config = Config::default();
    config.overlays.initial = OverlayKind::Glasses;
    config.display.initial_filter = StyleFilter::Sepia;
    config.smoothing.mode = SmoothingMode::PerFace;
    config.capture.output_dir = PathBuf::from("/tmp/photos");

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.overlays.initial, OverlayKind::Glasses);
    assert_eq!(loaded.display.initial_filter, StyleFilter::Sepia);
    assert_eq!(loaded.smoothing.mode, SmoothingMode::PerFace);
    assert_eq!(loaded.capture.output_dir, PathBuf::from("/tmp/photos"));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::from_file(temp_path("does-not-exist.yaml")).is_err());
}

#[test]
fn test_malformed_yaml_is_a_config_error() {
    let result = Config::from_yaml("display: [unterminated");
    assert!(matches!(result, Err(Error::ConfigError(_))));

    let result = Config::from_yaml("overlays:\n  initial: monocle\n");
    assert!(result.is_err());
}

#[test]
fn test_session_starts_from_config() {
    let yaml = "
detection:
  enabled: false
overlays:
  initial: all
display:
  initial_filter: pixelated
  show_landmarks: true
";
    let config = Config::from_yaml(yaml).unwrap();
    let session = EffectsSession::from_config(&config);

    assert_eq!(session.overlay(), OverlayKind::All);
    assert_eq!(session.style(), StyleFilter::Pixelated);
    assert!(!session.toggles().face_detection);
    assert!(session.toggles().landmarks);
    assert!(!session.wants_landmarks());
}

#[test]
fn test_example_config_is_valid() {
    let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    config.validate().unwrap();
    assert_eq!(config.display.pixelate_divisor, 10);
    assert_eq!(config.display.status_timeout_ms, 2000);
    assert_eq!(config.capture.file_prefix, "photo-effect");
    assert!(!config.display.show_boxes);
    assert!(!config.display.show_confidence);
}

#[test]
fn test_validation_messages() {
    let mut config = Config::default();
    config.display.pixelate_divisor = 0;
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("Pixelate")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }

    let mut config = Config::default();
    config.camera.width = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.smoothing.history = 0;
    assert!(config.validate().is_err());
}
