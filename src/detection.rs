//! Detection records and the adapter around the external face detector.
//!
//! The adapter fixes the detector options, decides whether landmarks are worth
//! computing, and turns any detector failure into an empty frame result so the
//! render loop never stops because of it.

use crate::constants::{DETECTOR_INPUT_SIZE, DETECTOR_SCORE_THRESHOLD, NUM_FACIAL_LANDMARKS};
use crate::placement::OverlayKind;
use crate::Result;
use log::{debug, warn};
use opencv::core::{Mat, Point2f, Rect2f};

/// Ordered 68-point landmark sequence in frame pixel coordinates
pub type Landmarks = Vec<Point2f>;

/// One detected face in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// Face box in frame pixels
    pub bbox: Rect2f,
    /// Detector confidence in [0, 1]
    pub score: f32,
    /// Landmarks, present only when they were requested and produced
    pub landmarks: Option<Landmarks>,
}

impl DetectionRecord {
    #[must_use]
    pub const fn new(bbox: Rect2f, score: f32) -> Self {
        Self {
            bbox,
            score,
            landmarks: None,
        }
    }

    #[must_use]
    pub fn with_landmarks(mut self, landmarks: Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    #[must_use]
    pub fn has_landmarks(&self) -> bool {
        self.landmarks.is_some()
    }
}

/// Options handed to the detector on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectOptions {
    /// Input resolution hint for the detector network
    pub input_size: i32,
    /// Minimum score for a detection to be reported
    pub score_threshold: f32,
    /// Request the landmark-augmented variant
    pub with_landmarks: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            input_size: DETECTOR_INPUT_SIZE,
            score_threshold: DETECTOR_SCORE_THRESHOLD,
            with_landmarks: false,
        }
    }
}

/// Face detector capability: boxes, scores and optionally 68 landmarks
pub trait FaceDetectorBackend {
    /// Detect faces in a BGR frame
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&mut self, frame: &Mat, options: &DetectOptions) -> Result<Vec<DetectionRecord>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Whether the detector should compute landmarks this frame.
///
/// Landmarks cost an extra network pass per face, so they are only requested
/// when something will consume them.
#[must_use]
pub fn wants_landmarks(detection_active: bool, show_landmarks: bool, overlay: OverlayKind) -> bool {
    detection_active && (show_landmarks || overlay != OverlayKind::None)
}

/// Wraps an optional detector backend with fixed options and failure containment
pub struct DetectionAdapter {
    backend: Option<Box<dyn FaceDetectorBackend>>,
    input_size: i32,
    score_threshold: f32,
    failures: u64,
}

impl DetectionAdapter {
    /// Create an adapter around a loaded backend
    #[must_use]
    pub fn new(backend: Box<dyn FaceDetectorBackend>, input_size: i32, score_threshold: f32) -> Self {
        Self {
            backend: Some(backend),
            input_size,
            score_threshold,
            failures: 0,
        }
    }

    /// Adapter used when no detector could be loaded; always yields no faces
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            backend: None,
            input_size: DETECTOR_INPUT_SIZE,
            score_threshold: DETECTOR_SCORE_THRESHOLD,
            failures: 0,
        }
    }

    /// Whether a detector backend is available
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Number of detector calls that failed so far
    #[must_use]
    pub const fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Detect faces, never failing.
    ///
    /// A backend error is logged and reported as "no faces" for this frame.
    pub fn detect(&mut self, frame: &Mat, want_landmarks: bool) -> Vec<DetectionRecord> {
        let Some(backend) = self.backend.as_mut() else {
            return Vec::new();
        };

        let options = DetectOptions {
            input_size: self.input_size,
            score_threshold: self.score_threshold,
            with_landmarks: want_landmarks,
        };

        match backend.detect(frame, &options) {
            Ok(detections) => normalize(detections, &options),
            Err(e) => {
                self.failures += 1;
                warn!("Face detection failed ({}): {}", backend.name(), e);
                Vec::new()
            }
        }
    }
}

/// Drop low-score records and landmark sets of the wrong size.
fn normalize(detections: Vec<DetectionRecord>, options: &DetectOptions) -> Vec<DetectionRecord> {
    detections
        .into_iter()
        .filter(|d| d.score >= options.score_threshold)
        .map(|mut d| {
            d.score = d.score.clamp(0.0, 1.0);
            if !options.with_landmarks {
                d.landmarks = None;
            } else if d.landmarks.as_ref().is_some_and(|l| l.len() != NUM_FACIAL_LANDMARKS) {
                debug!(
                    "Discarding landmark set with {} points",
                    d.landmarks.as_ref().map_or(0, Vec::len)
                );
                d.landmarks = None;
            }
            d
        })
        .collect()
}
