//! Overlay placement from facial landmarks.
//!
//! Each decoration is anchored to a few fixed landmarks of the 68-point
//! convention and sized by an empirical ratio of a facial width. Rectangles are
//! axis aligned; head roll is not compensated.

use crate::constants::landmarks::{
    BROW_LEFT, BROW_RIGHT, LEFT_EYE_OUTER, MOUTH_LEFT, MOUTH_RIGHT, NOSE_BOTTOM, NOSE_TOP, RIGHT_EYE_OUTER,
};
use opencv::core::{Point2f, Rect2f};
use serde::{Deserialize, Serialize};
use std::fmt;

const MUSTACHE_WIDTH_RATIO: f32 = 1.8;
const MUSTACHE_ASPECT: f32 = 0.5;
const MUSTACHE_LIFT: f32 = 0.3;

const GLASSES_WIDTH_RATIO: f32 = 2.8;
const GLASSES_ASPECT: f32 = 0.45;

const HAT_WIDTH_RATIO: f32 = 2.0;
const HAT_ASPECT: f32 = 0.7;
const HAT_LIFT: f32 = 1.3;

/// Which decoration is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    #[default]
    None,
    Mustache,
    Glasses,
    Hat,
    /// Every decoration at once
    All,
}

impl OverlayKind {
    /// Concrete decorations in draw order
    pub const DRAWABLE: [Self; 3] = [Self::Mustache, Self::Glasses, Self::Hat];

    /// Parse overlay name from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "mustache" | "moustache" => Some(Self::Mustache),
            "glasses" => Some(Self::Glasses),
            "hat" => Some(Self::Hat),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Concrete kinds this selection draws, in draw order
    #[must_use]
    pub fn drawn_kinds(self) -> &'static [Self] {
        match self {
            Self::None => &[],
            Self::Mustache => &[Self::Mustache],
            Self::Glasses => &[Self::Glasses],
            Self::Hat => &[Self::Hat],
            Self::All => &Self::DRAWABLE,
        }
    }

    /// Whether this is a single decoration rather than None/All
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        matches!(self, Self::Mustache | Self::Glasses | Self::Hat)
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Mustache => "mustache",
            Self::Glasses => "glasses",
            Self::Hat => "hat",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Where one decoration goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub kind: OverlayKind,
    pub rect: Rect2f,
}

/// Compute the rectangle for one concrete decoration.
///
/// Returns `None` when an anchor landmark is missing or `kind` is not concrete.
#[must_use]
pub fn place(kind: OverlayKind, landmarks: &[Point2f]) -> Option<Rect2f> {
    match kind {
        OverlayKind::Mustache => place_mustache(landmarks),
        OverlayKind::Glasses => place_glasses(landmarks),
        OverlayKind::Hat => place_hat(landmarks),
        OverlayKind::None | OverlayKind::All => None,
    }
}

/// Placements for every decoration a selection draws, in draw order.
///
/// Kinds whose anchors are missing are skipped; the others are unaffected.
#[must_use]
pub fn placements_for(selection: OverlayKind, landmarks: &[Point2f]) -> Vec<Placement> {
    selection
        .drawn_kinds()
        .iter()
        .filter_map(|&kind| place(kind, landmarks).map(|rect| Placement { kind, rect }))
        .collect()
}

fn place_mustache(landmarks: &[Point2f]) -> Option<Rect2f> {
    let nose_bottom = landmarks.get(NOSE_BOTTOM)?;
    let mouth_left = landmarks.get(MOUTH_LEFT)?;
    let mouth_right = landmarks.get(MOUTH_RIGHT)?;

    let width = (mouth_right.x - mouth_left.x).abs() * MUSTACHE_WIDTH_RATIO;
    let height = width * MUSTACHE_ASPECT;
    Some(Rect2f::new(
        nose_bottom.x - width / 2.0,
        nose_bottom.y - height * MUSTACHE_LIFT,
        width,
        height,
    ))
}

fn place_glasses(landmarks: &[Point2f]) -> Option<Rect2f> {
    let left_eye = landmarks.get(LEFT_EYE_OUTER)?;
    let right_eye = landmarks.get(RIGHT_EYE_OUTER)?;

    let width = (right_eye.x - left_eye.x).abs() * GLASSES_WIDTH_RATIO;
    let height = width * GLASSES_ASPECT;
    let center_x = (left_eye.x + right_eye.x) / 2.0;
    let center_y = (left_eye.y + right_eye.y) / 2.0;
    Some(Rect2f::new(center_x - width / 2.0, center_y - height / 2.0, width, height))
}

fn place_hat(landmarks: &[Point2f]) -> Option<Rect2f> {
    let brow_left = landmarks.get(BROW_LEFT)?;
    let brow_right = landmarks.get(BROW_RIGHT)?;
    let nose_top = landmarks.get(NOSE_TOP)?;

    let width = (brow_right.x - brow_left.x).abs() * HAT_WIDTH_RATIO;
    let height = width * HAT_ASPECT;
    let center_x = (brow_left.x + brow_right.x) / 2.0;
    Some(Rect2f::new(center_x - width / 2.0, nose_top.y - height * HAT_LIFT, width, height))
}
