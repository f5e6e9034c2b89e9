use crate::{constants::NUM_FACIAL_LANDMARKS, Error, Result};
use ndarray::{Array4, Axis, CowArray};
use opencv::core::{Mat, Point2f, Size};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

use crate::utils::image_conversion::{bgr_to_tensor, TensorLayout};

/// Landmark network input side in pixels
const LANDMARK_INPUT_SIZE: i32 = 128;

/// 68-point facial landmark regressor using `ONNX` Runtime.
///
/// Takes square face crops and returns points in crop pixel coordinates.
pub struct MarkDetector {
    session: Session,
    input_size: i32,
}

impl MarkDetector {
    /// Load the landmark network
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no inputs or outputs.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        log::info!("Loading landmark detector from {}", model_path.as_ref().display());
        if !model_path.as_ref().exists() {
            return Err(Error::ModelError(format!(
                "Landmark model not found: {}",
                model_path.as_ref().display()
            )));
        }
        let environment = Arc::new(
            Environment::builder()
                .with_name("mark_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelInputError("Model has no inputs".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Model has no outputs".to_string()));
        }

        Ok(Self {
            session,
            input_size: LANDMARK_INPUT_SIZE,
        })
    }

    /// Landmarks for each face crop, in the crop's own pixel coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or if the output
    /// does not hold 68 points per crop.
    pub fn detect_batch(&self, crops: &[Mat]) -> Result<Vec<Vec<Point2f>>> {
        if crops.is_empty() {
            return Ok(Vec::new());
        }

        let mut tensors = Vec::with_capacity(crops.len());
        for crop in crops {
            let mut resized = Mat::default();
            imgproc::resize(
                crop,
                &mut resized,
                Size::new(self.input_size, self.input_size),
                0.0,
                0.0,
                InterpolationFlags::INTER_LINEAR as i32,
            )?;
            tensors.push(bgr_to_tensor(&resized, TensorLayout::Nhwc, 0.0, 255.0)?);
        }
        let views: Vec<_> = tensors.iter().map(Array4::view).collect();
        let batch = ndarray::concatenate(Axis(0), &views)
            .map_err(|e| Error::ModelDataFormatError(format!("Failed to batch crops: {e}")))?;

        let marks = self.forward(batch)?;
        let per_face = NUM_FACIAL_LANDMARKS * 2;
        if marks.len() < per_face * crops.len() {
            return Err(Error::ModelOutputError(format!(
                "Expected {} landmark values, got {}",
                per_face * crops.len(),
                marks.len()
            )));
        }

        Ok(crops
            .iter()
            .zip(marks.chunks_exact(per_face))
            .map(|(crop, values)| self.scale_to_crop(values, crop))
            .collect())
    }

    fn forward(&self, inputs: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let marks_output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let marks = marks_output.try_extract::<f32>()?.view().iter().copied().collect();
        Ok(marks)
    }

    /// Network output is in input-size units; rescale to the crop
    #[allow(clippy::cast_precision_loss)]
    fn scale_to_crop(&self, values: &[f32], crop: &Mat) -> Vec<Point2f> {
        let sx = crop.cols() as f32 / self.input_size as f32;
        let sy = crop.rows() as f32 / self.input_size as f32;
        values
            .chunks_exact(2)
            .map(|xy| Point2f::new(xy[0] * sx, xy[1] * sy))
            .collect()
    }
}
