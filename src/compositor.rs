//! Per-frame compositing: filtered video, face overlays, annotations and chrome.

use crate::adjustments::build_render_directive;
use crate::assets::OverlayAssets;
use crate::detection::{DetectionAdapter, DetectionRecord};
use crate::drawing::{self, WarningKind};
use crate::filters::FaceSmoothing;
use crate::placement::{placements_for, OverlayKind};
use crate::render::render_frame;
use crate::session::EffectsSession;
use crate::utils::to_pixel_rect;
use crate::Result;
use log::{debug, warn};
use opencv::core::Mat;
use opencv::prelude::*;

pub const WARN_DETECTION_OFF: &str = "Enable face detection to see overlays";
pub const WARN_ASSETS_LOADING: &str = "Loading overlay images...";
pub const WARN_LANDMARKS_MISSING: &str = "Face detected but landmarks missing";

/// Which affordances a composite includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chrome {
    /// Live preview: badge, warnings and face count
    Live,
    /// Exported photo: effects and annotations only
    Capture,
}

/// What happened while compositing one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Faces reported by the detector this frame
    pub face_count: usize,
    /// Overlay images drawn
    pub overlays_drawn: usize,
    /// Faces without landmarks while an overlay was selected
    pub faces_missing_landmarks: usize,
    /// Warning shown in the live chrome, if any
    pub warning: Option<&'static str>,
    /// The face layer failed and only the adjustment layer was drawn
    pub degraded: bool,
}

/// Owns the detector and smoothing state used by the live loop
pub struct FrameCompositor {
    detector: DetectionAdapter,
    smoothing: FaceSmoothing,
    pixelate_divisor: i32,
}

impl FrameCompositor {
    #[must_use]
    pub fn new(detector: DetectionAdapter, smoothing: FaceSmoothing, pixelate_divisor: i32) -> Self {
        Self {
            detector,
            smoothing,
            pixelate_divisor,
        }
    }

    /// Whether a detector backend is loaded
    #[must_use]
    pub fn detector_available(&self) -> bool {
        self.detector.is_available()
    }

    /// Detector calls that failed so far
    #[must_use]
    pub const fn detector_failures(&self) -> u64 {
        self.detector.failure_count()
    }

    /// Live smoothing state
    #[must_use]
    pub const fn smoothing(&self) -> &FaceSmoothing {
        &self.smoothing
    }

    /// Forget smoothed landmarks so the next detection starts cold
    pub fn reset_smoothing(&mut self) {
        self.smoothing.reset();
    }

    /// Composite one live frame onto `surface`.
    ///
    /// Returns `Ok(None)` for an empty frame, which is skipped without touching
    /// the surface. A failure in the face layer is logged and leaves only the
    /// adjustment layer on the surface.
    ///
    /// # Errors
    ///
    /// Returns an error only if the adjustment layer itself cannot be drawn.
    pub fn compose(
        &mut self,
        frame: &Mat,
        session: &EffectsSession,
        assets: &OverlayAssets,
        surface: &mut Mat,
    ) -> Result<Option<FrameReport>> {
        compose_with(
            &mut self.detector,
            &mut self.smoothing,
            self.pixelate_divisor,
            frame,
            session,
            assets,
            surface,
            Chrome::Live,
        )
    }

    /// Composite a frame for export with a fresh detection pass.
    ///
    /// Smoothing runs on a copy of the live state so the live overlays do not
    /// jump after a capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the adjustment layer cannot be drawn.
    pub fn compose_capture(
        &mut self,
        frame: &Mat,
        session: &EffectsSession,
        assets: &OverlayAssets,
        surface: &mut Mat,
    ) -> Result<Option<FrameReport>> {
        let mut smoothing = self.smoothing.clone();
        compose_with(
            &mut self.detector,
            &mut smoothing,
            self.pixelate_divisor,
            frame,
            session,
            assets,
            surface,
            Chrome::Capture,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn compose_with(
    detector: &mut DetectionAdapter,
    smoothing: &mut FaceSmoothing,
    divisor: i32,
    frame: &Mat,
    session: &EffectsSession,
    assets: &OverlayAssets,
    surface: &mut Mat,
    chrome: Chrome,
) -> Result<Option<FrameReport>> {
    if frame.empty() {
        return Ok(None);
    }

    let directive = build_render_directive(session.adjustments(), session.style());
    render_frame(frame, &directive, session.style(), divisor, surface)?;

    let mut report = FrameReport::default();
    if let Err(e) = draw_face_layer(detector, smoothing, frame, session, assets, surface, chrome, &mut report) {
        warn!("Face layer skipped for this frame: {}", e);
        // Drop whatever the face layer drew before it failed
        render_frame(frame, &directive, session.style(), divisor, surface)?;
        report = FrameReport {
            face_count: report.face_count,
            degraded: true,
            ..FrameReport::default()
        };
    }
    Ok(Some(report))
}

#[allow(clippy::too_many_arguments)]
fn draw_face_layer(
    detector: &mut DetectionAdapter,
    smoothing: &mut FaceSmoothing,
    frame: &Mat,
    session: &EffectsSession,
    assets: &OverlayAssets,
    surface: &mut Mat,
    chrome: Chrome,
    report: &mut FrameReport,
) -> Result<()> {
    let toggles = session.toggles();
    let overlay = session.overlay();

    if !toggles.face_detection {
        if chrome == Chrome::Live && overlay != OverlayKind::None {
            report.warning = Some(WARN_DETECTION_OFF);
            drawing::draw_warning(surface, WARN_DETECTION_OFF, WarningKind::Action)?;
        }
        return Ok(());
    }

    let detections = detector.detect(frame, session.wants_landmarks());
    report.face_count = detections.len();
    let smoothed = smoothing.smooth_all(&detections);

    if overlay != OverlayKind::None {
        for landmarks in &smoothed {
            let Some(landmarks) = landmarks else {
                report.faces_missing_landmarks += 1;
                continue;
            };
            for placement in placements_for(overlay, landmarks) {
                if let Some(image) = assets.image(placement.kind) {
                    drawing::blend_overlay(surface, image, to_pixel_rect(&placement.rect))?;
                    report.overlays_drawn += 1;
                }
            }
        }
    }

    draw_annotations(surface, &detections, session)?;

    if chrome == Chrome::Live {
        draw_live_chrome(surface, overlay, assets, report)?;
    }
    Ok(())
}

fn draw_annotations(surface: &mut Mat, detections: &[DetectionRecord], session: &EffectsSession) -> Result<()> {
    let toggles = session.toggles();
    for detection in detections {
        if toggles.boxes {
            let score = toggles.confidence.then_some(detection.score);
            drawing::draw_face_box(surface, &detection.bbox, score)?;
        }
        if toggles.landmarks {
            if let Some(points) = &detection.landmarks {
                drawing::draw_landmarks(surface, points)?;
            }
        }
    }
    Ok(())
}

fn draw_live_chrome(
    surface: &mut Mat,
    overlay: OverlayKind,
    assets: &OverlayAssets,
    report: &mut FrameReport,
) -> Result<()> {
    if overlay != OverlayKind::None && report.face_count > 0 {
        let nothing_loaded = !overlay.drawn_kinds().iter().any(|&k| assets.image(k).is_some());
        if nothing_loaded && assets.any_loading(overlay) {
            report.warning = Some(WARN_ASSETS_LOADING);
            drawing::draw_warning(surface, WARN_ASSETS_LOADING, WarningKind::Pending)?;
        } else if report.faces_missing_landmarks > 0 {
            report.warning = Some(WARN_LANDMARKS_MISSING);
            drawing::draw_warning(surface, WARN_LANDMARKS_MISSING, WarningKind::Action)?;
        }
        drawing::draw_overlay_badge(surface, overlay)?;
    }

    drawing::draw_face_count(surface, report.face_count)?;
    if report.warning.is_some() {
        debug!("Chrome warning: {:?}", report.warning);
    }
    Ok(())
}
