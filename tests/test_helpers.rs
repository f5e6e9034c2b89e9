//! Helper functions and utilities for tests

#![allow(dead_code)]

use camera_effects::{
    constants::landmarks::{
        BROW_LEFT, BROW_RIGHT, LEFT_EYE_OUTER, MOUTH_LEFT, MOUTH_RIGHT, NOSE_BOTTOM, NOSE_TOP, RIGHT_EYE_OUTER,
    },
    constants::NUM_FACIAL_LANDMARKS,
    detection::{DetectOptions, DetectionRecord, FaceDetectorBackend, Landmarks},
    Error, Result,
};
use opencv::core::{Mat, Point2f, Rect2f, Scalar, Vec3b, CV_8UC3, CV_8UC4};
use opencv::prelude::*;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const FRAME_WIDTH: i32 = 320;
pub const FRAME_HEIGHT: i32 = 240;

/// Uniform gray BGR frame
pub fn create_test_frame(value: f64) -> Result<Mat> {
    Mat::new_rows_cols_with_default(FRAME_HEIGHT, FRAME_WIDTH, CV_8UC3, Scalar::all(value)).map_err(Into::into)
}

/// Fully opaque white BGRA overlay image
pub fn create_opaque_overlay() -> Result<Mat> {
    Mat::new_rows_cols_with_default(8, 16, CV_8UC4, Scalar::new(255.0, 255.0, 255.0, 255.0)).map_err(Into::into)
}

/// BGR pixel at (row, col)
pub fn pixel(mat: &Mat, row: i32, col: i32) -> Result<[u8; 3]> {
    let px = *mat.at_2d::<Vec3b>(row, col)?;
    Ok([px[0], px[1], px[2]])
}

/// 68 landmarks for a face centered at x=160 with anchors at plausible positions.
///
/// Mouth corners (140,170)/(180,170) and nose bottom (160,150) give a mustache
/// rectangle of x=124, y=139.2, 72x36.
pub fn synthetic_landmarks() -> Landmarks {
    let mut points = vec![Point2f::new(160.0, 140.0); NUM_FACIAL_LANDMARKS];
    points[BROW_LEFT] = Point2f::new(120.0, 110.0);
    points[BROW_RIGHT] = Point2f::new(200.0, 110.0);
    points[NOSE_TOP] = Point2f::new(160.0, 115.0);
    points[NOSE_BOTTOM] = Point2f::new(160.0, 150.0);
    points[LEFT_EYE_OUTER] = Point2f::new(130.0, 125.0);
    points[RIGHT_EYE_OUTER] = Point2f::new(190.0, 125.0);
    points[MOUTH_LEFT] = Point2f::new(140.0, 170.0);
    points[MOUTH_RIGHT] = Point2f::new(180.0, 170.0);
    points
}

/// Same face shifted horizontally
pub fn shifted_landmarks(dx: f32) -> Landmarks {
    synthetic_landmarks()
        .into_iter()
        .map(|p| Point2f::new(p.x + dx, p.y))
        .collect()
}

/// A face with landmarks
pub fn synthetic_face() -> DetectionRecord {
    DetectionRecord::new(Rect2f::new(110.0, 90.0, 100.0, 110.0), 0.93).with_landmarks(synthetic_landmarks())
}

/// A face the landmark network produced nothing for
pub fn face_without_landmarks() -> DetectionRecord {
    DetectionRecord::new(Rect2f::new(110.0, 90.0, 100.0, 110.0), 0.88)
}

/// Detector that replays a script of results, then repeats a fallback.
///
/// `None` entries in the script fail the call.
pub struct ScriptedDetector {
    script: VecDeque<Option<Vec<DetectionRecord>>>,
    fallback: Vec<DetectionRecord>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Option<Vec<DetectionRecord>>>, fallback: Vec<DetectionRecord>) -> Self {
        Self {
            script: script.into(),
            fallback,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Always reports the same faces
    pub fn always(faces: Vec<DetectionRecord>) -> Self {
        Self::new(Vec::new(), faces)
    }

    /// Shared call counter, readable after the detector is boxed
    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl FaceDetectorBackend for ScriptedDetector {
    fn detect(&mut self, _frame: &Mat, _options: &DetectOptions) -> Result<Vec<DetectionRecord>> {
        self.calls.set(self.calls.get() + 1);
        match self.script.pop_front() {
            Some(Some(faces)) => Ok(faces),
            Some(None) => Err(Error::ModelError("scripted inference failure".to_string())),
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
