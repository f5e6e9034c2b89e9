//! SCRFD face box detector on ONNX Runtime.

use crate::constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE};
use crate::utils::image_conversion::{bgr_to_tensor, TensorLayout};
use crate::{Error, Result};
use log::{debug, info, warn};
use ndarray::CowArray;
use opencv::core::{Mat, Rect, Rect2f, Scalar, Size, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Input size used when the model declares dynamic dimensions and no hint is given
const FALLBACK_INPUT_SIZE: i32 = 640;

/// Largest stride of the SCRFD feature pyramid; inputs are padded to a multiple
const MAX_STRIDE: i32 = 32;

/// A face box with its score, in source image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBox {
    pub bbox: Rect2f,
    pub score: f32,
}

/// Layout of the SCRFD output heads, selected by output count
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadLayout {
    strides: Vec<i32>,
    anchors_per_cell: usize,
}

impl HeadLayout {
    fn for_outputs(count: usize) -> Self {
        match count {
            6 | 9 => Self {
                strides: vec![8, 16, 32],
                anchors_per_cell: 2,
            },
            10 | 15 => Self {
                strides: vec![8, 16, 32, 64, 128],
                anchors_per_cell: 1,
            },
            _ => {
                warn!("Unknown detector layout with {} outputs, assuming 3 strides", count);
                Self {
                    strides: vec![8, 16, 32],
                    anchors_per_cell: 2,
                }
            }
        }
    }
}

/// SCRFD face detector
pub struct FaceDetector {
    session: Session,
    fixed_input: Option<(i32, i32)>,
    layout: HeadLayout,
    nms_threshold: f32,
    center_cache: HashMap<(i32, i32, i32), Vec<(f32, f32)>>,
}

impl FaceDetector {
    /// Load a detector from an ONNX model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, nms_threshold: f32) -> Result<Self> {
        info!("Loading face detector from {}", model_path.as_ref().display());
        if !model_path.as_ref().exists() {
            return Err(Error::ModelError(format!(
                "Face detection model not found: {}",
                model_path.as_ref().display()
            )));
        }
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // Shape is [batch, channels, height, width]; dynamic axes are None
        let fixed_input = match input.dimensions.as_slice() {
            [_, _, Some(h), Some(w)] => Some((*w as i32, *h as i32)),
            _ => None,
        };
        let layout = HeadLayout::for_outputs(session.outputs.len());
        debug!("Detector input {:?}, strides {:?}", fixed_input, layout.strides);

        Ok(Self {
            session,
            fixed_input,
            layout,
            nms_threshold,
            center_cache: HashMap::new(),
        })
    }

    /// Detect faces in a BGR image.
    ///
    /// `input_size` is the preferred network resolution; a model with fixed
    /// input dimensions ignores it.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    pub fn detect(&mut self, image: &Mat, input_size: i32, score_threshold: f32) -> Result<Vec<ScoredBox>> {
        if image.empty() {
            return Ok(Vec::new());
        }

        let (input_w, input_h) = self.fixed_input.unwrap_or_else(|| {
            let side = round_to_stride(if input_size > 0 { input_size } else { FALLBACK_INPUT_SIZE });
            (side, side)
        });

        let (letterboxed, scale) = letterbox(image, input_w, input_h)?;
        let tensor = bgr_to_tensor(
            &letterboxed,
            TensorLayout::Nchw,
            IMAGE_NORMALIZATION_OFFSET,
            IMAGE_NORMALIZATION_SCALE,
        )?;

        let candidates = self.forward(tensor, input_w, input_h, score_threshold)?;
        let boxes = candidates
            .into_iter()
            .map(|c| ScoredBox {
                bbox: Rect2f::new(c.bbox.x / scale, c.bbox.y / scale, c.bbox.width / scale, c.bbox.height / scale),
                score: c.score,
            })
            .collect();

        Ok(non_max_suppression(boxes, self.nms_threshold))
    }

    fn forward(
        &mut self,
        tensor: ndarray::Array4<f32>,
        input_w: i32,
        input_h: i32,
        threshold: f32,
    ) -> Result<Vec<ScoredBox>> {
        let cow_array = CowArray::from(tensor.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let heads = self.layout.strides.len();
        if outputs.len() < heads * 2 {
            return Err(Error::ModelOutputError(format!(
                "Expected at least {} outputs, got {}",
                heads * 2,
                outputs.len()
            )));
        }

        let mut found = Vec::new();
        for (idx, &stride) in self.layout.strides.clone().iter().enumerate() {
            let scores: Vec<f32> = outputs[idx].try_extract::<f32>()?.view().iter().copied().collect();
            let distances: Vec<f32> = outputs[idx + heads].try_extract::<f32>()?.view().iter().copied().collect();

            let centers = self.anchor_centers(input_h / stride, input_w / stride, stride);
            if distances.len() < centers.len() * 4 || scores.len() < centers.len() {
                return Err(Error::ModelDataFormatError(format!(
                    "Stride {} head has {} scores and {} distances for {} anchors",
                    stride,
                    scores.len(),
                    distances.len(),
                    centers.len()
                )));
            }

            let stride_f = stride as f32;
            for (i, &(cx, cy)) in centers.iter().enumerate() {
                if scores[i] < threshold {
                    continue;
                }
                let d = &distances[i * 4..i * 4 + 4];
                found.push(ScoredBox {
                    bbox: distance_to_bbox((cx, cy), [d[0] * stride_f, d[1] * stride_f, d[2] * stride_f, d[3] * stride_f]),
                    score: scores[i],
                });
            }
        }

        Ok(found)
    }

    fn anchor_centers(&mut self, height: i32, width: i32, stride: i32) -> Vec<(f32, f32)> {
        let per_cell = self.layout.anchors_per_cell;
        self.center_cache
            .entry((height, width, stride))
            .or_insert_with(|| anchor_centers(height, width, stride, per_cell))
            .clone()
    }
}

/// Round up to the next multiple of the largest stride
fn round_to_stride(size: i32) -> i32 {
    ((size + MAX_STRIDE - 1) / MAX_STRIDE).max(1) * MAX_STRIDE
}

/// Resize keeping aspect ratio into the top-left of a black canvas.
///
/// Returns the canvas and the scale applied to source coordinates.
fn letterbox(image: &Mat, input_w: i32, input_h: i32) -> Result<(Mat, f32)> {
    let ratio_img = image.rows() as f32 / image.cols() as f32;
    let ratio_model = input_h as f32 / input_w as f32;

    let (new_w, new_h) = if ratio_img > ratio_model {
        (((input_h as f32 / ratio_img) as i32).max(1), input_h)
    } else {
        (input_w, ((input_w as f32 * ratio_img) as i32).max(1))
    };
    let scale = new_h as f32 / image.rows() as f32;

    let mut resized = Mat::default();
    imgproc::resize(
        image,
        &mut resized,
        Size::new(new_w, new_h),
        0.0,
        0.0,
        InterpolationFlags::INTER_LINEAR as i32,
    )?;

    let mut canvas = Mat::new_rows_cols_with_default(input_h, input_w, CV_8UC3, Scalar::all(0.0))?;
    let mut roi = canvas.roi_mut(Rect::new(0, 0, new_w, new_h))?;
    resized.copy_to(&mut roi)?;

    Ok((canvas, scale))
}

/// Anchor centers of one feature map, row-major, repeated per anchor
fn anchor_centers(height: i32, width: i32, stride: i32, per_cell: usize) -> Vec<(f32, f32)> {
    let mut centers = Vec::with_capacity((height.max(0) * width.max(0)) as usize * per_cell);
    for y in 0..height {
        for x in 0..width {
            let center = ((x * stride) as f32, (y * stride) as f32);
            centers.extend(std::iter::repeat(center).take(per_cell));
        }
    }
    centers
}

/// Decode left/top/right/bottom distances around a center into a box
fn distance_to_bbox(center: (f32, f32), distances: [f32; 4]) -> Rect2f {
    let x1 = center.0 - distances[0];
    let y1 = center.1 - distances[1];
    let x2 = center.0 + distances[2];
    let y2 = center.1 + distances[3];
    Rect2f::new(x1, y1, x2 - x1, y2 - y1)
}

fn iou(a: &Rect2f, b: &Rect2f) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);
    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy non-maximum suppression, highest score first
fn non_max_suppression(mut boxes: Vec<ScoredBox>, threshold: f32) -> Vec<ScoredBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut keep: Vec<ScoredBox> = Vec::new();
    for candidate in boxes {
        if keep.iter().all(|k| iou(&k.bbox, &candidate.bbox) <= threshold) {
            keep.push(candidate);
        }
    }
    keep
}
