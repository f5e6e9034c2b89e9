//! Temporal filtering of facial landmarks.
//!
//! Detector output jitters from frame to frame; overlays anchored to raw
//! landmarks would shake. The smoothers here blend each 68-point sequence with the
//! previous one before placement.

/// Exponential smoothing of landmark sequences
pub mod exponential;

use crate::detection::{DetectionRecord, Landmarks};
use serde::{Deserialize, Serialize};

pub use exponential::LandmarkSmoother;

/// How smoothing memory is shared between simultaneously detected faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// One slot for every face
    #[default]
    Shared,
    /// One slot per face, faces ordered left to right by box center
    PerFace,
}

/// Smoothing state for a whole frame's detections
#[derive(Debug, Clone)]
pub struct FaceSmoothing {
    mode: SmoothingMode,
    alpha: f32,
    slots: Vec<LandmarkSmoother>,
}

impl FaceSmoothing {
    /// # Panics
    ///
    /// Panics if alpha is not in [0, 1)
    #[must_use]
    pub fn new(mode: SmoothingMode, alpha: f32) -> Self {
        Self {
            mode,
            alpha,
            slots: vec![LandmarkSmoother::new(alpha)],
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SmoothingMode {
        self.mode
    }

    /// Smooth every landmark-bearing detection.
    ///
    /// The result is aligned with `detections`; entries without landmarks are
    /// `None` and leave the retained state untouched.
    pub fn smooth_all(&mut self, detections: &[DetectionRecord]) -> Vec<Option<Landmarks>> {
        let slot_of = self.slot_indices(detections);
        detections
            .iter()
            .zip(slot_of)
            .map(|(detection, slot)| {
                let landmarks = detection.landmarks.as_ref()?;
                while self.slots.len() <= slot {
                    self.slots.push(LandmarkSmoother::new(self.alpha));
                }
                Some(self.slots[slot].smooth(landmarks))
            })
            .collect()
    }

    /// Drop all retained landmark memory
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    fn slot_indices(&self, detections: &[DetectionRecord]) -> Vec<usize> {
        match self.mode {
            SmoothingMode::Shared => vec![0; detections.len()],
            SmoothingMode::PerFace => {
                let mut order: Vec<usize> = (0..detections.len()).collect();
                order.sort_by(|&a, &b| {
                    let ca = detections[a].bbox.x + detections[a].bbox.width / 2.0;
                    let cb = detections[b].bbox.x + detections[b].bbox.width / 2.0;
                    ca.total_cmp(&cb)
                });
                let mut slots = vec![0; detections.len()];
                for (rank, index) in order.into_iter().enumerate() {
                    slots[index] = rank;
                }
                slots
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Point2f, Rect2f};

    fn face_at(x: f32, landmark_x: f32) -> DetectionRecord {
        DetectionRecord::new(Rect2f::new(x, 0.0, 10.0, 10.0), 0.9)
            .with_landmarks(vec![Point2f::new(landmark_x, 0.0)])
    }

    #[test]
    fn test_shared_slot_blends_across_faces() {
        let mut smoothing = FaceSmoothing::new(SmoothingMode::Shared, 0.5);
        let out = smoothing.smooth_all(&[face_at(0.0, 0.0), face_at(100.0, 100.0)]);
        // Second face is blended with the first one's landmarks
        assert_eq!(out[0].as_ref().unwrap()[0].x, 0.0);
        assert_eq!(out[1].as_ref().unwrap()[0].x, 50.0);
    }

    #[test]
    fn test_per_face_slots_follow_horizontal_order() {
        let mut smoothing = FaceSmoothing::new(SmoothingMode::PerFace, 0.5);
        smoothing.smooth_all(&[face_at(0.0, 0.0), face_at(100.0, 100.0)]);

        // Same faces reported in swapped order keep their own memory
        let out = smoothing.smooth_all(&[face_at(100.0, 110.0), face_at(0.0, 10.0)]);
        assert_eq!(out[0].as_ref().unwrap()[0].x, 105.0);
        assert_eq!(out[1].as_ref().unwrap()[0].x, 5.0);
    }

    #[test]
    fn test_reset_forgets_every_slot() {
        let mut smoothing = FaceSmoothing::new(SmoothingMode::PerFace, 0.5);
        smoothing.smooth_all(&[face_at(0.0, 0.0), face_at(100.0, 100.0)]);
        smoothing.reset();
        let out = smoothing.smooth_all(&[face_at(0.0, 30.0)]);
        assert_eq!(out[0].as_ref().unwrap()[0].x, 30.0);
    }

    #[test]
    fn test_detection_without_landmarks_keeps_state() {
        let mut smoothing = FaceSmoothing::new(SmoothingMode::Shared, 0.5);
        smoothing.smooth_all(&[face_at(0.0, 40.0)]);
        let bare = DetectionRecord::new(Rect2f::new(0.0, 0.0, 10.0, 10.0), 0.9);
        let out = smoothing.smooth_all(&[bare]);
        assert!(out[0].is_none());

        let out = smoothing.smooth_all(&[face_at(0.0, 80.0)]);
        assert_eq!(out[0].as_ref().unwrap()[0].x, 60.0);
    }
}
