//! Live camera effects with adjustable filters and face-anchored overlays.
//!
//! This library provides the pieces of a webcam effects application built on:
//! - `OpenCV` for capture, filtering and drawing
//! - ONNX Runtime for face and landmark detection
//! - Exponential smoothing of landmark positions between frames
//!
//! The per-frame pipeline consists of:
//! 1. Building a render directive from the adjustment levels and style filter
//! 2. Rendering the filtered frame (a separate two-pass path for pixelation)
//! 3. Detecting faces and, when needed, 68 facial landmarks
//! 4. Smoothing the landmarks and placing overlays from fixed anchor points
//! 5. Drawing overlays, annotations and status chrome on top
//!
//! # Examples
//!
//! ## Render directive
//!
//! ```
//! use camera_effects::adjustments::{build_render_directive, AdjustmentState, StyleFilter};
//!
//! let mut state = AdjustmentState::default();
//! state.set_brightness(120.0);
//! let directive = build_render_directive(&state, StyleFilter::Grayscale);
//! assert_eq!(directive.to_string(), "brightness(120%) grayscale(100%)");
//! ```
//!
//! ## Overlay placement
//!
//! ```
//! use camera_effects::placement::{place, OverlayKind};
//! use opencv::core::Point2f;
//!
//! let mut landmarks = vec![Point2f::new(0.0, 0.0); 68];
//! landmarks[33] = Point2f::new(100.0, 180.0);
//! landmarks[48] = Point2f::new(90.0, 200.0);
//! landmarks[54] = Point2f::new(110.0, 200.0);
//!
//! let rect = place(OverlayKind::Mustache, &landmarks).unwrap();
//! assert!((rect.width - 36.0).abs() < 1e-4);
//! ```
//!
//! ## Compositing a frame
//!
//! ```no_run
//! use camera_effects::{
//!     assets::OverlayAssets, compositor::FrameCompositor, config::Config,
//!     detection::DetectionAdapter, onnx_detector::OnnxFaceDetector, session::EffectsSession,
//! };
//! use opencv::{core::Mat, imgcodecs, prelude::*};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let backend = OnnxFaceDetector::load(&config.detection)?;
//! let detector = DetectionAdapter::new(Box::new(backend), 224, 0.5);
//! let mut compositor = FrameCompositor::new(detector, config.create_smoothing()?, 10);
//!
//! let mut assets = OverlayAssets::new();
//! assets.load_all(&config.overlays);
//!
//! let frame = imgcodecs::imread("face.jpg", imgcodecs::IMREAD_COLOR)?;
//! let session = EffectsSession::from_config(&config);
//! let mut surface = Mat::default();
//! if let Some(report) = compositor.compose(&frame, &session, &assets, &mut surface)? {
//!     println!("{} faces, {} overlays", report.face_count, report.overlays_drawn);
//! }
//! # Ok(())
//! # }
//! ```

/// Adjustment levels, style filters and the render directive
pub mod adjustments;

/// Rendering a directive onto a frame
pub mod render;

/// Face detection module for finding faces in images
pub mod face_detection;

/// Facial landmark detection module for finding 68 key points
pub mod mark_detection;

/// Detector backend trait and the fault-tolerant adapter around it
pub mod detection;

/// ONNX Runtime detector backend
pub mod onnx_detector;

/// Landmark smoothing between frames
pub mod filters;

/// Overlay placement from facial landmarks
pub mod placement;

/// Overlay image loading
pub mod assets;

/// Drawing overlays, annotations and chrome
pub mod drawing;

/// Per-frame compositing
pub mod compositor;

/// Photo capture and export
pub mod capture;

/// Media sources and acquisition errors
pub mod camera;

/// Effect state shared by the live loop and capture
pub mod session;

/// Keyboard commands, trackbars and the status line
pub mod ui;

/// Utility functions for image processing and coordinate transformations
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
