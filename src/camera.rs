//! Media sources: live camera or video file, behind the [`MediaSource`] trait.

use log::{debug, info, warn};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Consecutive empty camera reads tolerated before the device counts as lost
const MAX_CONSECUTIVE_MISSES: u32 = 150;

/// Why the media device could not be acquired.
///
/// Every variant is fatal to the live pipeline; there is no retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("no camera found")]
    NoDevice,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("camera does not support the requested settings")]
    OverConstrained,

    #[error("camera access blocked by security restrictions")]
    SecurityRestricted,

    #[error("{0}")]
    Other(String),
}

impl CameraError {
    /// Message shown to the user on the error screen
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Camera access denied. Please allow camera permissions and restart.".to_string()
            }
            Self::NoDevice => "No camera found. Please connect a camera and restart.".to_string(),
            Self::DeviceBusy => {
                "Camera is already in use by another application. Please close other apps and restart.".to_string()
            }
            Self::OverConstrained => "Camera does not meet the required specifications.".to_string(),
            Self::SecurityRestricted => {
                "Camera access blocked due to security restrictions.".to_string()
            }
            Self::Other(detail) => format!("Camera error: {detail}"),
        }
    }

    /// Classify a backend failure description
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["permission", "denied", "eacces", "not allowed"]) {
            Self::PermissionDenied
        } else if has(&["busy", "ebusy", "in use", "not readable"]) {
            Self::DeviceBusy
        } else if has(&["no such", "not found", "enoent", "no device", "can't open", "cannot open"]) {
            Self::NoDevice
        } else if has(&["constraint", "unsupported resolution", "not supported"]) {
            Self::OverConstrained
        } else if has(&["security", "sandbox", "blocked"]) {
            Self::SecurityRestricted
        } else {
            Self::Other(message.to_string())
        }
    }

    /// Classify an OS error raised while probing the device node
    #[must_use]
    pub fn from_io(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::NotFound => Self::NoDevice,
            // EBUSY
            _ if error.raw_os_error() == Some(16) => Self::DeviceBusy,
            _ => Self::Other(error.to_string()),
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(PathBuf),
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(index) => write!(f, "camera {index}"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Outcome of polling the source for a frame
#[derive(Debug)]
pub enum FrameRead {
    /// A decoded BGR frame
    Frame(Mat),
    /// Nothing available yet; skip this tick
    NotReady,
    /// The stream finished (video files only)
    Ended,
}

/// Capability of a media device
pub trait MediaSource {
    /// Poll for the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if the device failed or was lost.
    fn read_frame(&mut self) -> crate::Result<FrameRead>;

    /// Current frame resolution
    fn resolution(&self) -> Size;

    /// Whether the source still delivers frames
    fn is_active(&self) -> bool;

    /// Release the device
    fn stop(&mut self);
}

/// [`MediaSource`] backed by an `OpenCV` `VideoCapture`
pub struct OpenCvCamera {
    source: VideoSource,
    capture: VideoCapture,
    resolution: Size,
    misses: u32,
    active: bool,
}

impl OpenCvCamera {
    /// Open a camera or video file, requesting the given resolution.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CameraError`] if the device cannot be acquired.
    pub fn open(source: &VideoSource, width: i32, height: i32) -> std::result::Result<Self, CameraError> {
        let capture = match source {
            VideoSource::Camera(index) => open_camera(*index, width, height)?,
            VideoSource::File(path) => open_file(path)?,
        };

        let resolution = Size::new(
            capture.get(CAP_PROP_FRAME_WIDTH).unwrap_or(0.0) as i32,
            capture.get(CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0) as i32,
        );
        if let VideoSource::Camera(_) = source {
            if resolution.width > 0 && (resolution.width != width || resolution.height != height) {
                info!(
                    "Camera delivers {}x{} instead of the requested {}x{}",
                    resolution.width, resolution.height, width, height
                );
            }
        }
        info!("Opened {} at {}x{}", source, resolution.width, resolution.height);

        Ok(Self {
            source: source.clone(),
            capture,
            resolution,
            misses: 0,
            active: true,
        })
    }

    /// The source this camera reads from
    #[must_use]
    pub const fn source(&self) -> &VideoSource {
        &self.source
    }
}

fn open_camera(index: i32, width: i32, height: i32) -> std::result::Result<VideoCapture, CameraError> {
    probe_device_node(index)?;

    info!("Opening camera {}", index);
    let mut cap =
        VideoCapture::new(index, videoio::CAP_ANY).map_err(|e| CameraError::classify(&e.message))?;
    if !cap.is_opened().unwrap_or(false) {
        return Err(CameraError::NoDevice);
    }

    // Reduce buffer size for lower latency
    if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
        debug!("Could not set camera buffer size: {}", e);
    }
    let accepted = cap.set(CAP_PROP_FRAME_WIDTH, f64::from(width)).unwrap_or(false)
        && cap.set(CAP_PROP_FRAME_HEIGHT, f64::from(height)).unwrap_or(false);
    if !accepted {
        warn!("Camera did not accept the ideal resolution {}x{}", width, height);
    }

    Ok(cap)
}

fn open_file(path: &Path) -> std::result::Result<VideoCapture, CameraError> {
    if !path.exists() {
        return Err(CameraError::NoDevice);
    }
    info!("Opening video file: {}", path.display());
    let cap = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
        .map_err(|e| CameraError::classify(&e.message))?;
    if !cap.is_opened().unwrap_or(false) {
        return Err(CameraError::Other(format!("Cannot decode {}", path.display())));
    }
    Ok(cap)
}

/// Open the V4L2 node briefly so permission and busy errors get a precise kind.
#[cfg(target_os = "linux")]
fn probe_device_node(index: i32) -> std::result::Result<(), CameraError> {
    let node = PathBuf::from(format!("/dev/video{index}"));
    std::fs::File::open(&node).map(drop).map_err(|e| {
        debug!("Probing {} failed: {}", node.display(), e);
        CameraError::from_io(&e)
    })
}

#[cfg(not(target_os = "linux"))]
fn probe_device_node(_index: i32) -> std::result::Result<(), CameraError> {
    Ok(())
}

impl MediaSource for OpenCvCamera {
    fn read_frame(&mut self) -> crate::Result<FrameRead> {
        if !self.active {
            return Ok(FrameRead::Ended);
        }

        let mut frame = Mat::default();
        let got = self.capture.read(&mut frame)?;
        if got && !frame.empty() {
            self.misses = 0;
            self.resolution = frame.size()?;
            return Ok(FrameRead::Frame(frame));
        }

        if matches!(self.source, VideoSource::File(_)) {
            info!("End of video file reached");
            self.active = false;
            return Ok(FrameRead::Ended);
        }

        self.misses += 1;
        if self.misses >= MAX_CONSECUTIVE_MISSES {
            self.stop();
            return Err(CameraError::Other("camera stopped delivering frames".to_string()).into());
        }
        Ok(FrameRead::NotReady)
    }

    fn resolution(&self) -> Size {
        self.resolution
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            if let Err(e) = self.capture.release() {
                warn!("Failed to release {}: {}", self.source, e);
            }
            self.active = false;
            info!("Released {}", self.source);
        }
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
