//! Configuration management for the camera effects application

use crate::adjustments::StyleFilter;
use crate::constants::{
    CAPTURE_FILE_PREFIX, DEFAULT_SMOOTHING_FACTOR, DEFAULT_TRACKING_HISTORY, DETECTOR_INPUT_SIZE,
    DETECTOR_NMS_THRESHOLD, DETECTOR_SCORE_THRESHOLD, IDEAL_FRAME_HEIGHT, IDEAL_FRAME_WIDTH, PIXELATE_DIVISOR,
    STATUS_MESSAGE_TIMEOUT_MS,
};
use crate::filters::{FaceSmoothing, SmoothingMode};
use crate::placement::OverlayKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media source configuration
    pub camera: CameraConfig,

    /// Face detector configuration
    pub detection: DetectionConfig,

    /// Landmark smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Overlay asset configuration
    pub overlays: OverlayConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Photo capture configuration
    pub capture: CaptureConfig,
}

/// Media source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index
    pub index: i32,

    /// Play a video file instead of opening a camera
    pub video_file: Option<PathBuf>,

    /// Requested frame width
    pub width: i32,

    /// Requested frame height
    pub height: i32,
}

/// Face detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Face detection display on at startup
    pub enabled: bool,

    /// Path to face detection ONNX model
    pub face_detector: PathBuf,

    /// Path to facial landmarks ONNX model
    pub face_landmarks: PathBuf,

    /// Detector input resolution hint
    pub input_size: i32,

    /// Minimum detection score (0.0-1.0)
    pub score_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub nms_threshold: f32,
}

/// Landmark smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Weight kept from the previous frame (0.0-1.0, exclusive upper bound)
    pub factor: f32,

    /// Tracking history depth; accepted for compatibility, smoothing is an EMA
    pub history: usize,

    /// Shared slot or one slot per face
    pub mode: SmoothingMode,
}

/// Overlay asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Mustache image
    pub mustache: PathBuf,

    /// Glasses image
    pub glasses: PathBuf,

    /// Hat image
    pub hat: PathBuf,

    /// Overlay selected at startup
    pub initial: OverlayKind,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Main window title
    pub window_title: String,

    /// Style filter at startup
    pub initial_filter: StyleFilter,

    /// Draw face boxes
    pub show_boxes: bool,

    /// Draw confidence labels
    pub show_confidence: bool,

    /// Draw landmark points
    pub show_landmarks: bool,

    /// Draw the FPS counter
    pub show_fps: bool,

    /// Downscale factor of the pixelated style
    pub pixelate_divisor: i32,

    /// How long transient status messages stay up
    pub status_timeout_ms: u64,
}

/// Photo capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory photos are saved into
    pub output_dir: PathBuf,

    /// Saved file name prefix
    pub file_prefix: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            video_file: None,
            width: IDEAL_FRAME_WIDTH,
            height: IDEAL_FRAME_HEIGHT,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            face_detector: PathBuf::from("assets/face_detector.onnx"),
            face_landmarks: PathBuf::from("assets/face_landmarks.onnx"),
            input_size: DETECTOR_INPUT_SIZE,
            score_threshold: DETECTOR_SCORE_THRESHOLD,
            nms_threshold: DETECTOR_NMS_THRESHOLD,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            factor: DEFAULT_SMOOTHING_FACTOR,
            history: DEFAULT_TRACKING_HISTORY,
            mode: SmoothingMode::Shared,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mustache: PathBuf::from("assets/mustache.png"),
            glasses: PathBuf::from("assets/glasses.png"),
            hat: PathBuf::from("assets/hat.png"),
            initial: OverlayKind::None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: "Camera Effects".to_string(),
            initial_filter: StyleFilter::None,
            show_boxes: false,
            show_confidence: false,
            show_landmarks: false,
            show_fps: true,
            pixelate_divisor: PIXELATE_DIVISOR,
            status_timeout_ms: STATUS_MESSAGE_TIMEOUT_MS,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: CAPTURE_FILE_PREFIX.to_string(),
        }
    }
}

impl OverlayConfig {
    /// Asset path for a concrete overlay kind
    #[must_use]
    pub fn path_for(&self, kind: OverlayKind) -> Option<&Path> {
        match kind {
            OverlayKind::Mustache => Some(&self.mustache),
            OverlayKind::Glasses => Some(&self.glasses),
            OverlayKind::Hat => Some(&self.hat),
            OverlayKind::None | OverlayKind::All => None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Create the landmark smoothing state from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the smoothing factor is out of range.
    pub fn create_smoothing(&self) -> Result<FaceSmoothing> {
        if !(0.0..1.0).contains(&self.smoothing.factor) {
            return Err(Error::ConfigError(format!(
                "Smoothing factor must be in [0.0, 1.0), got {}",
                self.smoothing.factor
            )));
        }
        Ok(FaceSmoothing::new(self.smoothing.mode, self.smoothing.factor))
    }

    /// Validate configuration.
    ///
    /// Model and asset files are not required to exist: a missing model
    /// disables face features and a missing image disables only its overlay.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        if self.camera.width <= 0 || self.camera.height <= 0 {
            return Err(Error::ConfigError("Camera resolution must be positive".to_string()));
        }
        if self.camera.index < 0 {
            return Err(Error::ConfigError("Camera index must not be negative".to_string()));
        }

        if self.detection.input_size <= 0 {
            return Err(Error::ConfigError("Detector input size must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.detection.score_threshold) {
            return Err(Error::ConfigError("Score threshold must be between 0.0 and 1.0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.detection.nms_threshold) {
            return Err(Error::ConfigError("NMS threshold must be between 0.0 and 1.0".to_string()));
        }

        if !(0.0..1.0).contains(&self.smoothing.factor) {
            return Err(Error::ConfigError(
                "Smoothing factor must be at least 0.0 and below 1.0".to_string(),
            ));
        }
        if self.smoothing.history == 0 {
            return Err(Error::ConfigError("Tracking history must be greater than 0".to_string()));
        }

        if self.display.pixelate_divisor < 1 {
            return Err(Error::ConfigError("Pixelate divisor must be at least 1".to_string()));
        }

        if self.capture.file_prefix.is_empty() || self.capture.file_prefix.contains(['/', '\\']) {
            return Err(Error::ConfigError(format!(
                "Invalid capture file prefix: {:?}",
                self.capture.file_prefix
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Camera Effects Configuration

# Media source
camera:
  index: 0
  # video_file: "clip.mp4"
  width: 1280
  height: 720

# Face detector
detection:
  enabled: true
  face_detector: "assets/face_detector.onnx"
  face_landmarks: "assets/face_landmarks.onnx"
  input_size: 224
  score_threshold: 0.5
  nms_threshold: 0.4

# Landmark smoothing
smoothing:
  factor: 0.7
  history: 3
  mode: shared

# Overlay images
overlays:
  mustache: "assets/mustache.png"
  glasses: "assets/glasses.png"
  hat: "assets/hat.png"
  initial: none

# Display settings
display:
  window_title: "Camera Effects"
  initial_filter: none
  show_boxes: false
  show_confidence: false
  show_landmarks: false
  show_fps: true
  pixelate_divisor: 10
  status_timeout_ms: 2000

# Photo capture
capture:
  output_dir: "."
  file_prefix: "photo-effect"
"#;
