//! Applies a render directive to a video frame.
//!
//! Color operations follow the CSS filter effect definitions so that levels mean
//! the same thing as on the web: percentages scale, hue rotation is in degrees and
//! blur takes a radius used as the Gaussian standard deviation.

use crate::adjustments::{RenderDirective, RenderOp, StyleFilter};
use crate::{Error, Result};
use opencv::core::{self, Mat, Scalar, Size, BORDER_DEFAULT, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

/// Luminance weights used by the saturate/hue-rotate matrices
const LUMA_R: f64 = 0.213;
const LUMA_G: f64 = 0.715;
const LUMA_B: f64 = 0.072;

type ColorMatrix = [[f64; 3]; 3];

/// Draw `frame` onto `surface` with the directive applied.
///
/// The surface is cleared first. For [`StyleFilter::Pixelated`] the frame goes
/// through the two-pass blit: nearest-neighbour downscale by `divisor`, the
/// adjustment operations at the small size, then a nearest-neighbour upscale.
///
/// # Errors
///
/// Returns an error if the frame is not 8-bit BGR or an `OpenCV` call fails.
pub fn render_frame(
    frame: &Mat,
    directive: &RenderDirective,
    style: StyleFilter,
    divisor: i32,
    surface: &mut Mat,
) -> Result<()> {
    if frame.empty() || frame.typ() != CV_8UC3 {
        return Err(Error::InvalidInput(format!(
            "Expected a non-empty 8-bit BGR frame, got type {} ({}x{})",
            frame.typ(),
            frame.cols(),
            frame.rows()
        )));
    }

    clear_surface(surface, frame.size()?)?;

    let rendered = if style.is_pixelated() {
        pixelate_with(frame, divisor, |small| apply_ops(small, directive.adjustment_ops()))?
    } else {
        apply_ops(frame, directive.ops())?
    };

    rendered.copy_to(surface)?;
    Ok(())
}

/// Reallocate the surface when the frame size changed, otherwise zero it.
pub(crate) fn clear_surface(surface: &mut Mat, size: Size) -> Result<()> {
    if surface.size()? != size || surface.typ() != CV_8UC3 {
        *surface = Mat::new_rows_cols_with_default(size.height, size.width, CV_8UC3, Scalar::all(0.0))?;
    } else {
        surface.set_to(&Scalar::all(0.0), &core::no_array())?;
    }
    Ok(())
}

/// Apply operations in order, returning a new image.
///
/// # Errors
///
/// Returns an error if any `OpenCV` operation fails.
pub fn apply_ops<'a, I>(frame: &Mat, ops: I) -> Result<Mat>
where
    I: IntoIterator<Item = &'a RenderOp>,
{
    let mut current = frame.try_clone()?;
    for op in ops {
        current = apply_op(&current, op)?;
    }
    Ok(current)
}

/// Apply a single operation.
///
/// # Errors
///
/// Returns an error if the underlying `OpenCV` operation fails.
pub fn apply_op(src: &Mat, op: &RenderOp) -> Result<Mat> {
    let mut dst = Mat::default();
    match *op {
        RenderOp::Brightness(percent) => {
            src.convert_to(&mut dst, -1, f64::from(percent) / 100.0, 0.0)?;
        }
        RenderOp::Contrast(percent) => {
            let c = f64::from(percent) / 100.0;
            src.convert_to(&mut dst, -1, c, 127.5 * (1.0 - c))?;
        }
        RenderOp::Saturate(percent) => {
            transform(src, &mut dst, &saturate_matrix(f64::from(percent) / 100.0))?;
        }
        RenderOp::Blur(radius) => {
            if radius <= 0.0 {
                return Ok(src.try_clone()?);
            }
            let sigma = f64::from(radius);
            imgproc::gaussian_blur(src, &mut dst, Size::new(0, 0), sigma, sigma, BORDER_DEFAULT)?;
        }
        RenderOp::HueRotate(degrees) => {
            transform(src, &mut dst, &hue_rotate_matrix(f64::from(degrees)))?;
        }
        RenderOp::Grayscale => {
            let row = [0.2126, 0.7152, 0.0722];
            transform(src, &mut dst, &[row, row, row])?;
        }
        RenderOp::Sepia => {
            let sepia = [[0.393, 0.769, 0.189], [0.349, 0.686, 0.168], [0.272, 0.534, 0.131]];
            transform(src, &mut dst, &sepia)?;
        }
        RenderOp::Invert => {
            core::bitwise_not(src, &mut dst, &core::no_array())?;
        }
    }
    Ok(dst)
}

/// Blocky pixelation: nearest downscale by `divisor`, then nearest upscale.
///
/// # Errors
///
/// Returns an error if resizing fails.
pub fn pixelate(frame: &Mat, divisor: i32) -> Result<Mat> {
    pixelate_with(frame, divisor, |small| Ok(small.try_clone()?))
}

fn pixelate_with<F>(frame: &Mat, divisor: i32, between: F) -> Result<Mat>
where
    F: FnOnce(&Mat) -> Result<Mat>,
{
    let full = frame.size()?;
    let divisor = divisor.max(1);
    let small_size = Size::new((full.width / divisor).max(1), (full.height / divisor).max(1));

    let mut small = Mat::default();
    imgproc::resize(frame, &mut small, small_size, 0.0, 0.0, imgproc::INTER_NEAREST)?;
    let small = between(&small)?;

    let mut upscaled = Mat::default();
    imgproc::resize(&small, &mut upscaled, full, 0.0, 0.0, imgproc::INTER_NEAREST)?;
    Ok(upscaled)
}

/// Apply an RGB-ordered color matrix to a BGR image.
fn transform(src: &Mat, dst: &mut Mat, rgb: &ColorMatrix) -> Result<()> {
    let bgr = to_bgr_order(rgb);
    let m = Mat::from_slice_2d(&bgr)?;
    core::transform(src, dst, &m)?;
    Ok(())
}

fn to_bgr_order(rgb: &ColorMatrix) -> ColorMatrix {
    let mut bgr = [[0.0; 3]; 3];
    for (i, row) in bgr.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = rgb[2 - i][2 - j];
        }
    }
    bgr
}

fn saturate_matrix(s: f64) -> ColorMatrix {
    [
        [LUMA_R + (1.0 - LUMA_R) * s, LUMA_G - LUMA_G * s, LUMA_B - LUMA_B * s],
        [LUMA_R - LUMA_R * s, LUMA_G + (1.0 - LUMA_G) * s, LUMA_B - LUMA_B * s],
        [LUMA_R - LUMA_R * s, LUMA_G - LUMA_G * s, LUMA_B + (1.0 - LUMA_B) * s],
    ]
}

fn hue_rotate_matrix(degrees: f64) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            LUMA_R + cos * (1.0 - LUMA_R) - sin * LUMA_R,
            LUMA_G - cos * LUMA_G - sin * LUMA_G,
            LUMA_B - cos * LUMA_B + sin * (1.0 - LUMA_B),
        ],
        [
            LUMA_R - cos * LUMA_R + sin * 0.143,
            LUMA_G + cos * (1.0 - LUMA_G) + sin * 0.140,
            LUMA_B - cos * LUMA_B - sin * 0.283,
        ],
        [
            LUMA_R - cos * LUMA_R - sin * (1.0 - LUMA_R),
            LUMA_G - cos * LUMA_G + sin * LUMA_G,
            LUMA_B + cos * (1.0 - LUMA_B) + sin * LUMA_B,
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{build_render_directive, AdjustmentState};
    use opencv::core::Vec3b;

    fn solid(rows: i32, cols: i32, bgr: (f64, f64, f64)) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::new(bgr.0, bgr.1, bgr.2, 0.0)).unwrap()
    }

    fn pixel(mat: &Mat, row: i32, col: i32) -> [u8; 3] {
        let p = mat.at_2d::<Vec3b>(row, col).unwrap();
        [p[0], p[1], p[2]]
    }

    #[test]
    fn test_brightness_scales_linearly() {
        let frame = solid(4, 4, (100.0, 100.0, 100.0));
        let out = apply_op(&frame, &RenderOp::Brightness(50.0)).unwrap();
        assert_eq!(pixel(&out, 0, 0), [50, 50, 50]);
    }

    #[test]
    fn test_zero_contrast_is_mid_gray() {
        let frame = solid(4, 4, (10.0, 200.0, 255.0));
        let out = apply_op(&frame, &RenderOp::Contrast(0.0)).unwrap();
        for channel in pixel(&out, 1, 1) {
            assert!((127..=128).contains(&channel));
        }
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let frame = solid(4, 4, (0.0, 0.0, 255.0));
        let out = apply_op(&frame, &RenderOp::Grayscale).unwrap();
        let [b, g, r] = pixel(&out, 2, 2);
        assert_eq!(b, g);
        assert_eq!(g, r);
        assert!((53..=55).contains(&r));
    }

    #[test]
    fn test_invert() {
        let frame = solid(2, 2, (0.0, 100.0, 255.0));
        let out = apply_op(&frame, &RenderOp::Invert).unwrap();
        assert_eq!(pixel(&out, 0, 0), [255, 155, 0]);
    }

    #[test]
    fn test_full_saturation_and_zero_hue_are_identity() {
        let frame = solid(2, 2, (30.0, 90.0, 200.0));
        let out = apply_op(&frame, &RenderOp::Saturate(100.0)).unwrap();
        let [b, g, r] = pixel(&out, 0, 0);
        assert!(b.abs_diff(30) <= 1 && g.abs_diff(90) <= 1 && r.abs_diff(200) <= 1);

        let out = apply_op(&frame, &RenderOp::HueRotate(360.0)).unwrap();
        let [b, g, r] = pixel(&out, 0, 0);
        assert!(b.abs_diff(30) <= 1 && g.abs_diff(90) <= 1 && r.abs_diff(200) <= 1);
    }

    #[test]
    fn test_pixelate_produces_uniform_blocks() {
        let mut frame = solid(40, 40, (0.0, 0.0, 0.0));
        for row in 0..40 {
            for col in 0..40 {
                *frame.at_2d_mut::<Vec3b>(row, col).unwrap() = Vec3b::from([row as u8 * 6, col as u8 * 6, 0]);
            }
        }

        let out = pixelate(&frame, 10).unwrap();
        assert_eq!(out.size().unwrap(), frame.size().unwrap());
        for block_row in 0..4 {
            for block_col in 0..4 {
                let anchor = pixel(&out, block_row * 10, block_col * 10);
                for dy in 0..10 {
                    for dx in 0..10 {
                        assert_eq!(pixel(&out, block_row * 10 + dy, block_col * 10 + dx), anchor);
                    }
                }
            }
        }
    }

    #[test]
    fn test_render_frame_identity_copies_frame() {
        let frame = solid(8, 6, (12.0, 34.0, 56.0));
        let directive = build_render_directive(&AdjustmentState::default(), StyleFilter::None);
        let mut surface = Mat::default();
        render_frame(&frame, &directive, StyleFilter::None, 10, &mut surface).unwrap();
        assert_eq!(surface.size().unwrap(), Size::new(6, 8));
        assert_eq!(pixel(&surface, 7, 5), [12, 34, 56]);
    }

    #[test]
    fn test_render_frame_pixelated_applies_adjustments() {
        let mut frame = solid(40, 40, (0.0, 0.0, 0.0));
        for row in 0..40 {
            for col in 0..40 {
                *frame.at_2d_mut::<Vec3b>(row, col).unwrap() = Vec3b::from([row as u8 * 6, col as u8 * 6, 200]);
            }
        }
        let mut state = AdjustmentState::default();
        state.set_brightness(50.0);
        let directive = build_render_directive(&state, StyleFilter::Pixelated);

        let mut surface = Mat::default();
        render_frame(&frame, &directive, StyleFilter::Pixelated, 10, &mut surface).unwrap();

        assert_eq!(surface.size().unwrap(), frame.size().unwrap());
        for block_row in 0..4 {
            for block_col in 0..4 {
                let anchor = pixel(&surface, block_row * 10, block_col * 10);
                // Half of a source pixel sampled from inside the same block
                assert_eq!(anchor[2], 100);
                assert_eq!(anchor[0] % 3, 0);
                assert_eq!(i32::from(anchor[0]) / 30, block_row);
                assert_eq!(i32::from(anchor[1]) / 30, block_col);
                for dy in 0..10 {
                    for dx in 0..10 {
                        assert_eq!(pixel(&surface, block_row * 10 + dy, block_col * 10 + dx), anchor);
                    }
                }
            }
        }
    }

    #[test]
    fn test_render_frame_rejects_wrong_type() {
        let frame = Mat::new_rows_cols_with_default(4, 4, opencv::core::CV_8UC1, Scalar::all(0.0)).unwrap();
        let mut surface = Mat::default();
        let directive = RenderDirective::default();
        assert!(render_frame(&frame, &directive, StyleFilter::None, 10, &mut surface).is_err());
    }
}
