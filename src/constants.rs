//! Constants used throughout the application

/// Number of facial landmarks for full face
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Anatomical landmark indices (68-point convention, 0-indexed)
pub mod landmarks {
    /// Left end of the left eyebrow
    pub const BROW_LEFT: usize = 17;
    /// Right end of the right eyebrow
    pub const BROW_RIGHT: usize = 26;
    /// Top of the nose bridge
    pub const NOSE_TOP: usize = 27;
    /// Bottom of the nose, between the nostrils
    pub const NOSE_BOTTOM: usize = 33;
    /// Outer corner of the left eye
    pub const LEFT_EYE_OUTER: usize = 36;
    /// Outer corner of the right eye
    pub const RIGHT_EYE_OUTER: usize = 45;
    /// Left mouth corner
    pub const MOUTH_LEFT: usize = 48;
    /// Right mouth corner
    pub const MOUTH_RIGHT: usize = 54;
}

/// Identity levels for the continuous adjustments
pub const DEFAULT_BRIGHTNESS: f32 = 100.0;
pub const DEFAULT_CONTRAST: f32 = 100.0;
pub const DEFAULT_SATURATION: f32 = 100.0;
pub const DEFAULT_BLUR: f32 = 0.0;
pub const DEFAULT_HUE_ROTATE: f32 = 0.0;

/// Slider ranges exposed by the UI
pub const MAX_PERCENT_LEVEL: i32 = 200;
pub const MAX_BLUR_RADIUS: i32 = 20;
pub const HUE_ROTATE_RANGE: i32 = 180;

/// Pixelation divisor applied to each frame dimension
pub const PIXELATE_DIVISOR: i32 = 10;

/// Detector input-resolution hint and minimum score
pub const DETECTOR_INPUT_SIZE: i32 = 224;
pub const DETECTOR_SCORE_THRESHOLD: f32 = 0.5;
pub const DETECTOR_NMS_THRESHOLD: f32 = 0.4;

/// Image normalization constants for face detection
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;

/// Landmark smoothing factor (weight of the previous sample)
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.7;

/// Retained history depth. Only the last sample takes part in smoothing.
pub const DEFAULT_TRACKING_HISTORY: usize = 3;

/// Ideal capture resolution
pub const IDEAL_FRAME_WIDTH: i32 = 1280;
pub const IDEAL_FRAME_HEIGHT: i32 = 720;

/// How long a transient status message stays up, in milliseconds
pub const STATUS_MESSAGE_TIMEOUT_MS: u64 = 2000;

/// Prefix of saved capture files
pub const CAPTURE_FILE_PREFIX: &str = "photo-effect";
