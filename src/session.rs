//! User-controlled effect state for one running session.

use crate::adjustments::{AdjustmentState, StyleFilter};
use crate::config::Config;
use crate::placement::OverlayKind;
use log::debug;

/// Which annotation layers are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToggles {
    pub face_detection: bool,
    pub boxes: bool,
    pub confidence: bool,
    pub landmarks: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            face_detection: true,
            boxes: false,
            confidence: false,
            landmarks: false,
        }
    }
}

/// Everything the user can change while the camera runs.
///
/// Copying the session is how capture freezes the state at invocation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectsSession {
    adjustments: AdjustmentState,
    style: StyleFilter,
    overlay: OverlayKind,
    toggles: DisplayToggles,
}

impl EffectsSession {
    /// Session seeded from the startup configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            adjustments: AdjustmentState::default(),
            style: config.display.initial_filter,
            overlay: config.overlays.initial,
            toggles: DisplayToggles {
                face_detection: config.detection.enabled,
                boxes: config.display.show_boxes,
                confidence: config.display.show_confidence,
                landmarks: config.display.show_landmarks,
            },
        }
    }

    #[must_use]
    pub const fn adjustments(&self) -> &AdjustmentState {
        &self.adjustments
    }

    pub fn adjustments_mut(&mut self) -> &mut AdjustmentState {
        &mut self.adjustments
    }

    #[must_use]
    pub const fn style(&self) -> StyleFilter {
        self.style
    }

    /// Replace the active style filter
    pub fn set_style(&mut self, style: StyleFilter) {
        if self.style != style {
            debug!("Style filter {} -> {}", self.style, style);
        }
        self.style = style;
    }

    #[must_use]
    pub const fn overlay(&self) -> OverlayKind {
        self.overlay
    }

    /// Replace the overlay selection; smoothing memory is left alone
    pub fn set_overlay(&mut self, overlay: OverlayKind) {
        self.overlay = overlay;
    }

    #[must_use]
    pub const fn toggles(&self) -> DisplayToggles {
        self.toggles
    }

    pub fn set_face_detection(&mut self, on: bool) {
        self.toggles.face_detection = on;
    }

    pub fn set_show_boxes(&mut self, on: bool) {
        self.toggles.boxes = on;
    }

    pub fn set_show_confidence(&mut self, on: bool) {
        self.toggles.confidence = on;
    }

    pub fn set_show_landmarks(&mut self, on: bool) {
        self.toggles.landmarks = on;
    }

    /// Restore the five adjustments and drop the style filter
    pub fn reset_effects(&mut self) {
        self.adjustments.reset();
        self.style = StyleFilter::None;
    }

    /// Whether this frame needs landmarks from the detector
    #[must_use]
    pub fn wants_landmarks(&self) -> bool {
        crate::detection::wants_landmarks(self.toggles.face_detection, self.toggles.landmarks, self.overlay)
    }
}
