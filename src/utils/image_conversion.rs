//! Conversions between `OpenCV` images, `image` crate buffers and ndarray tensors.

use crate::{Error, Result};
use ndarray::Array4;
use opencv::core::{Mat, Scalar, CV_8UC3, CV_8UC4};
use opencv::prelude::*;

/// Memory layout of a model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// batch, channels, height, width
    Nchw,
    /// batch, height, width, channels
    Nhwc,
}

/// Convert a BGR image to a single-image RGB float tensor.
///
/// Each channel value becomes `(v - mean) / std`.
///
/// # Errors
///
/// Returns an error if the image is not 8-bit BGR or its data is not accessible.
#[allow(clippy::cast_sign_loss)] // OpenCV dimensions are positive
pub fn bgr_to_tensor(image: &Mat, layout: TensorLayout, mean: f32, std: f32) -> Result<Array4<f32>> {
    if image.typ() != CV_8UC3 || image.empty() {
        return Err(Error::InvalidInput(format!(
            "Expected non-empty 8-bit BGR image, got type {}",
            image.typ()
        )));
    }

    let continuous;
    let image = if image.is_continuous() {
        image
    } else {
        continuous = image.try_clone()?;
        &continuous
    };

    let height = image.rows() as usize;
    let width = image.cols() as usize;
    let bytes = image.data_bytes()?;

    let mut tensor = match layout {
        TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, height, width)),
        TensorLayout::Nhwc => Array4::<f32>::zeros((1, height, width, 3)),
    };

    for (index, pixel) in bytes.chunks_exact(3).enumerate() {
        let (row, col) = (index / width, index % width);
        // BGR in, RGB out
        for (channel, &value) in pixel.iter().rev().enumerate() {
            let normalized = (f32::from(value) - mean) / std;
            match layout {
                TensorLayout::Nchw => tensor[[0, channel, row, col]] = normalized,
                TensorLayout::Nhwc => tensor[[0, row, col, channel]] = normalized,
            }
        }
    }

    Ok(tensor)
}

/// Convert an RGBA buffer to a 4-channel BGRA `Mat`.
///
/// # Errors
///
/// Returns an error if the image is empty or the `Mat` cannot be allocated.
pub fn rgba_to_bgra_mat(image: &image::RgbaImage) -> Result<Mat> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput("Image has no pixels".to_string()));
    }

    let rows = super::safe_cast::u32_to_i32(height)?;
    let cols = super::safe_cast::u32_to_i32(width)?;
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC4, Scalar::all(0.0))?;

    let bytes = mat.data_bytes_mut()?;
    for (dst, src) in bytes.chunks_exact_mut(4).zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        dst.copy_from_slice(&[b, g, r, a]);
    }

    Ok(mat)
}
