//! Geometry and conversion helpers shared by the detectors and drawing code.

pub mod image_conversion;
pub mod safe_cast;

use crate::Result;
use opencv::core::{Rect, Rect2f};
use safe_cast::f32_to_i32_clamp;

/// Grow face boxes by `shift` of their size on each side, square them and keep
/// them inside a `max_width` x `max_height` image.
///
/// # Errors
///
/// Currently returns Ok(()) always, but returns Result for API consistency
#[allow(clippy::cast_precision_loss)] // Precision loss acceptable for box dimensions
pub fn refine_boxes(boxes: &mut [Rect], max_width: i32, max_height: i32, shift: f32) -> Result<()> {
    for bbox in boxes.iter_mut() {
        let x_shift = f32_to_i32_clamp(bbox.width as f32 * shift, 0, max_width);
        let y_shift = f32_to_i32_clamp(bbox.height as f32 * shift, 0, max_height);

        bbox.x = (bbox.x - x_shift).max(0);
        bbox.y = (bbox.y - y_shift).max(0);
        bbox.width = (bbox.width + 2 * x_shift).min(max_width - bbox.x);
        bbox.height = (bbox.height + 2 * y_shift).min(max_height - bbox.y);

        let side = bbox.width.max(bbox.height);
        bbox.width = side;
        bbox.height = side;

        if bbox.x + bbox.width > max_width {
            bbox.x = max_width - bbox.width;
        }
        if bbox.y + bbox.height > max_height {
            bbox.y = max_height - bbox.height;
        }
    }

    Ok(())
}

/// Round a float rectangle to integer pixels
#[must_use]
pub fn to_pixel_rect(rect: &Rect2f) -> Rect {
    let x = f32_to_i32_clamp(rect.x.round(), i32::MIN / 2, i32::MAX / 2);
    let y = f32_to_i32_clamp(rect.y.round(), i32::MIN / 2, i32::MAX / 2);
    let width = f32_to_i32_clamp(rect.width.round(), 0, i32::MAX / 2);
    let height = f32_to_i32_clamp(rect.height.round(), 0, i32::MAX / 2);
    Rect::new(x, y, width, height)
}
