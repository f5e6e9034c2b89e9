//! ONNX Runtime detector backend: SCRFD boxes plus the 68-point landmark network.

use crate::config::DetectionConfig;
use crate::detection::{DetectOptions, DetectionRecord, FaceDetectorBackend};
use crate::face_detection::FaceDetector;
use crate::mark_detection::MarkDetector;
use crate::utils::refine_boxes;
use crate::utils::safe_cast::f32_to_i32_clamp;
use crate::Result;
use log::{info, warn};
use opencv::core::{Mat, Point2f, Rect};
use opencv::prelude::*;

/// Fraction of the face box added on each side before cropping for landmarks
const LANDMARK_CROP_SHIFT: f32 = 0.2;

/// Face detector backed by two ONNX models
pub struct OnnxFaceDetector {
    faces: FaceDetector,
    marks: Option<MarkDetector>,
}

impl OnnxFaceDetector {
    /// Load both models.
    ///
    /// A missing landmark model only disables landmarks; a missing face model
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the face detection model cannot be loaded.
    pub fn load(config: &DetectionConfig) -> Result<Self> {
        let faces = FaceDetector::new(&config.face_detector, config.nms_threshold)?;
        let marks = match MarkDetector::new(&config.face_landmarks) {
            Ok(marks) => Some(marks),
            Err(e) => {
                warn!("Landmark model unavailable, overlays disabled: {}", e);
                None
            }
        };
        info!(
            "Face detector ready (landmarks {})",
            if marks.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self { faces, marks })
    }

    fn landmarks_for(&self, marks: &MarkDetector, frame: &Mat, boxes: &[Rect]) -> Result<Vec<Vec<Point2f>>> {
        let crops = boxes
            .iter()
            .map(|rect| Ok(Mat::roi(frame, *rect)?.try_clone()?))
            .collect::<Result<Vec<Mat>>>()?;
        let per_crop = marks.detect_batch(&crops)?;

        Ok(per_crop
            .into_iter()
            .zip(boxes)
            .map(|(points, rect)| {
                points
                    .into_iter()
                    .map(|p| Point2f::new(p.x + rect.x as f32, p.y + rect.y as f32))
                    .collect()
            })
            .collect())
    }
}

impl FaceDetectorBackend for OnnxFaceDetector {
    fn detect(&mut self, frame: &Mat, options: &DetectOptions) -> Result<Vec<DetectionRecord>> {
        let found = self.faces.detect(frame, options.input_size, options.score_threshold)?;
        let mut records: Vec<DetectionRecord> = found
            .iter()
            .map(|b| DetectionRecord::new(b.bbox, b.score))
            .collect();

        let Some(marks) = self.marks.as_ref().filter(|_| options.with_landmarks) else {
            return Ok(records);
        };

        let (width, height) = (frame.cols(), frame.rows());
        let mut crop_boxes: Vec<Rect> = found
            .iter()
            .map(|b| {
                let x = f32_to_i32_clamp(b.bbox.x, 0, width - 1);
                let y = f32_to_i32_clamp(b.bbox.y, 0, height - 1);
                Rect::new(
                    x,
                    y,
                    f32_to_i32_clamp(b.bbox.x + b.bbox.width, x + 1, width) - x,
                    f32_to_i32_clamp(b.bbox.y + b.bbox.height, y + 1, height) - y,
                )
            })
            .collect();
        refine_boxes(&mut crop_boxes, width, height, LANDMARK_CROP_SHIFT)?;

        // Squaring may push a crop past the frame on small frames
        let usable: Vec<usize> = crop_boxes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.x >= 0 && r.y >= 0 && r.x + r.width <= width && r.y + r.height <= height)
            .map(|(i, _)| i)
            .collect();
        let usable_boxes: Vec<Rect> = usable.iter().map(|&i| crop_boxes[i]).collect();

        let landmarks = self.landmarks_for(marks, frame, &usable_boxes)?;
        for (index, points) in usable.into_iter().zip(landmarks) {
            records[index].landmarks = Some(points);
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        "onnx-scrfd"
    }
}
