//! Drawing primitives for overlays, annotations and chrome.
//!
//! Everything here draws onto a BGR surface after the render directive has been
//! applied, so none of it is affected by the color filters.

use crate::placement::OverlayKind;
use crate::utils::safe_cast::f32_to_i32_clamp;
use crate::Result;
use opencv::core::{self, Mat, Point, Point2f, Rect, Rect2f, Scalar, Size, Vec3b, Vec4b, CV_8UC3};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA};
use opencv::prelude::*;

const BOX_GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const LANDMARK_RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const BADGE_BLUE: (f64, f64, f64) = (234.0, 126.0, 102.0);
const WARNING_ORANGE: (f64, f64, f64) = (0.0, 152.0, 255.0);
const LOADING_AMBER: (f64, f64, f64) = (7.0, 193.0, 255.0);

fn bgr(color: (f64, f64, f64)) -> Scalar {
    Scalar::new(color.0, color.1, color.2, 0.0)
}

/// Severity of a chrome warning plate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Something the user must change
    Action,
    /// Something that will resolve by itself
    Pending,
}

/// Alpha-blend a BGRA overlay into `target` on the surface.
///
/// The overlay is stretched to the target size; parts outside the surface are
/// clipped. Targets with no area are ignored.
///
/// # Errors
///
/// Returns an error if resizing or pixel access fails.
pub fn blend_overlay(surface: &mut Mat, overlay: &Mat, target: Rect) -> Result<()> {
    if target.width <= 0 || target.height <= 0 || overlay.empty() {
        return Ok(());
    }
    let bounds = Rect::new(0, 0, surface.cols(), surface.rows());
    let visible = target & bounds;
    if visible.width <= 0 || visible.height <= 0 {
        return Ok(());
    }

    // Scale and shift in one warp so only the visible part is materialized
    let sx = f64::from(target.width) / f64::from(overlay.cols());
    let sy = f64::from(target.height) / f64::from(overlay.rows());
    let tx = 0.5 * (sx - 1.0) + f64::from(target.x - visible.x);
    let ty = 0.5 * (sy - 1.0) + f64::from(target.y - visible.y);
    let transform = Mat::from_slice_2d(&[[sx, 0.0, tx], [0.0, sy, ty]])?;

    let mut scaled = Mat::default();
    imgproc::warp_affine(
        overlay,
        &mut scaled,
        &transform,
        visible.size(),
        imgproc::INTER_LINEAR,
        core::BORDER_REPLICATE,
        Scalar::default(),
    )?;

    for row in visible.y..visible.y + visible.height {
        for col in visible.x..visible.x + visible.width {
            let src = *scaled.at_2d::<Vec4b>(row - visible.y, col - visible.x)?;
            let alpha = f32::from(src[3]) / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let dst = surface.at_2d_mut::<Vec3b>(row, col)?;
            for c in 0..3 {
                let blended = f32::from(src[c]) * alpha + f32::from(dst[c]) * (1.0 - alpha);
                dst[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(())
}

/// Fill a rectangle with a translucent color
///
/// # Errors
///
/// Returns an error if the blend fails.
pub fn fill_plate(surface: &mut Mat, rect: Rect, color: Scalar, opacity: f64) -> Result<()> {
    let bounds = Rect::new(0, 0, surface.cols(), surface.rows());
    let visible = rect & bounds;
    if visible.width <= 0 || visible.height <= 0 {
        return Ok(());
    }

    let mut roi = surface.roi_mut(visible)?;
    let base = roi.try_clone()?;
    let solid = Mat::new_rows_cols_with_default(visible.height, visible.width, CV_8UC3, color)?;
    core::add_weighted(&solid, opacity, &base, 1.0 - opacity, 0.0, &mut roi, -1)?;
    Ok(())
}

fn text(surface: &mut Mat, label: &str, origin: Point, scale: f64, color: Scalar, thickness: i32) -> Result<()> {
    imgproc::put_text(
        surface,
        label,
        origin,
        FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        thickness,
        LINE_AA,
        false,
    )?;
    Ok(())
}

/// Face box with a dark offset shadow and an optional `NN.N%` confidence plate
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_face_box(surface: &mut Mat, bbox: &Rect2f, score: Option<f32>) -> Result<()> {
    let rect = crate::utils::to_pixel_rect(bbox);
    let shadow = Rect::new(rect.x + 2, rect.y + 2, rect.width, rect.height);
    imgproc::rectangle(surface, shadow, Scalar::all(0.0), 5, LINE_8, 0)?;
    imgproc::rectangle(surface, rect, bgr(BOX_GREEN), 4, LINE_8, 0)?;

    if let Some(score) = score {
        fill_plate(surface, Rect::new(rect.x, rect.y - 30, 100, 25), Scalar::all(0.0), 0.7)?;
        text(
            surface,
            &confidence_label(score),
            Point::new(rect.x + 5, rect.y - 10),
            0.6,
            bgr(BOX_GREEN),
            2,
        )?;
    }
    Ok(())
}

/// Confidence label text
#[must_use]
pub fn confidence_label(score: f32) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Landmarks as red dots with a dark shadow
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_landmarks(surface: &mut Mat, points: &[Point2f]) -> Result<()> {
    for p in points {
        let x = f32_to_i32_clamp(p.x, -1, surface.cols());
        let y = f32_to_i32_clamp(p.y, -1, surface.rows());
        imgproc::circle(surface, Point::new(x + 1, y + 1), 3, Scalar::all(0.0), -1, LINE_AA, 0)?;
        imgproc::circle(surface, Point::new(x, y), 3, bgr(LANDMARK_RED), -1, LINE_AA, 0)?;
    }
    Ok(())
}

/// "<KIND> ACTIVE" badge in the top-right corner
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_overlay_badge(surface: &mut Mat, overlay: OverlayKind) -> Result<()> {
    let x = surface.cols() - 180;
    fill_plate(surface, Rect::new(x, 10, 170, 45), bgr(BADGE_BLUE), 0.9)?;
    text(
        surface,
        &format!("{} ACTIVE", overlay.to_string().to_uppercase()),
        Point::new(x + 10, 38),
        0.55,
        Scalar::all(255.0),
        2,
    )
}

/// Warning plate in the top-left corner
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_warning(surface: &mut Mat, message: &str, kind: WarningKind) -> Result<()> {
    let color = match kind {
        WarningKind::Action => WARNING_ORANGE,
        WarningKind::Pending => LOADING_AMBER,
    };
    let width = 20 + 11 * i32::try_from(message.len()).unwrap_or(40);
    fill_plate(surface, Rect::new(10, 10, width, 40), bgr(color), 0.8)?;
    text(surface, message, Point::new(20, 36), 0.6, Scalar::all(255.0), 2)
}

/// Number of faces in view, under the warning area
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_face_count(surface: &mut Mat, count: usize) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let label = if count == 1 {
        "1 face".to_string()
    } else {
        format!("{count} faces")
    };
    fill_plate(surface, Rect::new(10, 60, 110, 28), Scalar::all(0.0), 0.6)?;
    text(surface, &label, Point::new(18, 80), 0.6, bgr(BOX_GREEN), 2)
}

/// Status banner along the bottom edge
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_status_banner(surface: &mut Mat, message: &str) -> Result<()> {
    let y = surface.rows() - 36;
    fill_plate(surface, Rect::new(0, y, surface.cols(), 36), Scalar::all(0.0), 0.55)?;
    text(surface, message, Point::new(12, y + 24), 0.6, Scalar::all(255.0), 1)
}

/// Frame rate in the bottom-right corner
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn draw_fps(surface: &mut Mat, fps: f64) -> Result<()> {
    let origin = Point::new(surface.cols() - 130, surface.rows() - 48);
    text(surface, &format!("FPS: {fps:.1}"), origin, 0.7, bgr(BOX_GREEN), 2)
}

/// Full-window message shown when the camera cannot be used
///
/// # Errors
///
/// Returns an error if drawing fails.
pub fn error_screen(size: Size, message: &str) -> Result<Mat> {
    let mut screen = Mat::new_rows_cols_with_default(size.height, size.width, CV_8UC3, Scalar::all(30.0))?;
    text(&mut screen, "Camera initialization failed", Point::new(30, 60), 0.9, Scalar::new(54.0, 67.0, 244.0, 0.0), 2)?;

    // Wrap long messages on word boundaries
    let max_chars = usize::try_from((size.width - 60) / 11).unwrap_or(40).max(10);
    let mut line = String::new();
    let mut y = 110;
    for word in message.split_whitespace() {
        if !line.is_empty() && line.len() + word.len() + 1 > max_chars {
            text(&mut screen, &line, Point::new(30, y), 0.6, Scalar::all(230.0), 1)?;
            line.clear();
            y += 30;
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        text(&mut screen, &line, Point::new(30, y), 0.6, Scalar::all(230.0), 1)?;
    }
    Ok(screen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::CV_8UC4;

    fn surface(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(50, 50, CV_8UC3, Scalar::all(value)).unwrap()
    }

    fn overlay(alpha: f64) -> Mat {
        Mat::new_rows_cols_with_default(4, 4, CV_8UC4, Scalar::new(255.0, 255.0, 255.0, alpha)).unwrap()
    }

    #[test]
    fn test_opaque_overlay_replaces_pixels() {
        let mut s = surface(0.0);
        blend_overlay(&mut s, &overlay(255.0), Rect::new(10, 10, 8, 8)).unwrap();
        assert_eq!(s.at_2d::<Vec3b>(12, 12).unwrap()[0], 255);
        assert_eq!(s.at_2d::<Vec3b>(9, 9).unwrap()[0], 0);
        assert_eq!(s.at_2d::<Vec3b>(18, 18).unwrap()[0], 0);
    }

    #[test]
    fn test_transparent_overlay_leaves_surface() {
        let mut s = surface(40.0);
        blend_overlay(&mut s, &overlay(0.0), Rect::new(0, 0, 20, 20)).unwrap();
        assert_eq!(s.at_2d::<Vec3b>(5, 5).unwrap()[1], 40);
    }

    #[test]
    fn test_overlay_clipped_at_edges() {
        let mut s = surface(0.0);
        blend_overlay(&mut s, &overlay(255.0), Rect::new(-5, 45, 10, 10)).unwrap();
        assert_eq!(s.at_2d::<Vec3b>(49, 0).unwrap()[2], 255);
        blend_overlay(&mut s, &overlay(255.0), Rect::new(100, 100, 10, 10)).unwrap();
        blend_overlay(&mut s, &overlay(255.0), Rect::new(0, 0, 0, 10)).unwrap();
    }

    #[test]
    fn test_oversized_target_only_fills_visible_area() {
        let mut s = surface(0.0);
        let huge = Rect::new(-400_000, -300_000, 800_050, 600_050);
        blend_overlay(&mut s, &overlay(255.0), huge).unwrap();
        assert_eq!(s.at_2d::<Vec3b>(0, 0).unwrap()[0], 255);
        assert_eq!(s.at_2d::<Vec3b>(49, 49).unwrap()[1], 255);
    }

    #[test]
    fn test_non_bgra_overlay_is_rejected() {
        let mut s = surface(0.0);
        let bgr = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::all(255.0)).unwrap();
        assert!(blend_overlay(&mut s, &bgr, Rect::new(0, 0, 8, 8)).is_err());
    }

    #[test]
    fn test_fill_plate_blends() {
        let mut s = surface(0.0);
        fill_plate(&mut s, Rect::new(0, 0, 10, 10), Scalar::all(200.0), 0.5).unwrap();
        assert_eq!(s.at_2d::<Vec3b>(5, 5).unwrap()[0], 100);
        assert_eq!(s.at_2d::<Vec3b>(20, 20).unwrap()[0], 0);
    }

    #[test]
    fn test_confidence_label() {
        assert_eq!(confidence_label(0.9234), "92.3%");
        assert_eq!(confidence_label(1.0), "100.0%");
    }

    #[test]
    fn test_chrome_draws_near_edges() {
        let mut s = surface(0.0);
        draw_face_box(&mut s, &Rect2f::new(1.0, 1.0, 20.0, 20.0), Some(0.5)).unwrap();
        draw_landmarks(&mut s, &[Point2f::new(-3.0, 60.0)]).unwrap();
        draw_overlay_badge(&mut s, OverlayKind::Hat).unwrap();
        draw_warning(&mut s, "Loading overlay images...", WarningKind::Pending).unwrap();
        draw_status_banner(&mut s, "Ready").unwrap();
        let screen = error_screen(Size::new(320, 240), "No camera found. Please connect a camera and restart.").unwrap();
        assert_eq!(screen.size().unwrap(), Size::new(320, 240));
    }
}
