//! Checked numeric conversions for `OpenCV` sizes and pixel coordinates

use crate::{Error, Result};

/// Convert an image dimension to the `i32` `OpenCV` expects
///
/// # Errors
///
/// Returns an error if the value exceeds `i32::MAX`
pub fn u32_to_i32(value: u32) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Clamp and convert f32 to i32 for pixel coordinates.
///
/// Non-finite input maps to the lower bound.
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    if !value.is_finite() {
        return min;
    }
    let clamped = value.clamp(min as f32, max as f32);
    (clamped as i32).clamp(min, max)
}
