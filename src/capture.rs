//! Still photo capture with every effect baked in.

use crate::assets::OverlayAssets;
use crate::compositor::{FrameCompositor, FrameReport};
use crate::session::EffectsSession;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use log::info;
use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use std::path::{Path, PathBuf};

/// An encoded photo waiting for the user to save or discard it
#[derive(Debug)]
pub struct CapturedPhoto {
    image: Mat,
    png: Vec<u8>,
    taken_at: DateTime<Utc>,
    session: EffectsSession,
    report: FrameReport,
}

impl CapturedPhoto {
    /// The composited image, for previewing
    #[must_use]
    pub const fn image(&self) -> &Mat {
        &self.image
    }

    /// PNG-encoded bytes
    #[must_use]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Effect state the photo was taken with
    #[must_use]
    pub const fn session(&self) -> &EffectsSession {
        &self.session
    }

    #[must_use]
    pub const fn report(&self) -> &FrameReport {
        &self.report
    }

    /// File name with an ISO-8601 timestamp, `:` and `.` replaced by `-`
    #[must_use]
    pub fn file_name(&self, prefix: &str) -> String {
        photo_file_name(prefix, self.taken_at)
    }

    /// Write the PNG into `dir`, returning the path written
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written.
    pub fn save_to(&self, dir: &Path, prefix: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(prefix));
        std::fs::write(&path, &self.png)?;
        info!("Saved photo to {}", path.display());
        Ok(path)
    }
}

/// Name for a photo taken at `taken_at`
#[must_use]
pub fn photo_file_name(prefix: &str, taken_at: DateTime<Utc>) -> String {
    let stamp = taken_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string().replace([':', '.'], "-");
    format!("{prefix}-{stamp}.png")
}

/// Composite `frame` offscreen with the given session and encode it.
///
/// The session is taken by value so later UI changes cannot leak into the
/// photo. The badge, warnings and face count are left out.
///
/// # Errors
///
/// Returns an error if the frame is empty, compositing fails or PNG encoding
/// fails.
pub fn capture_photo(
    compositor: &mut FrameCompositor,
    frame: &Mat,
    session: EffectsSession,
    assets: &OverlayAssets,
) -> Result<CapturedPhoto> {
    let taken_at = Utc::now();
    let mut surface = Mat::default();
    let report = compositor
        .compose_capture(frame, &session, assets, &mut surface)?
        .ok_or_else(|| Error::InvalidInput("No frame available to capture".to_string()))?;

    let png = encode_png(&surface)?;
    info!(
        "Captured {}x{} photo ({} bytes, {} faces)",
        surface.cols(),
        surface.rows(),
        png.len(),
        report.face_count
    );

    Ok(CapturedPhoto {
        image: surface,
        png,
        taken_at,
        session,
        report,
    })
}

/// Encode a BGR image as PNG
///
/// # Errors
///
/// Returns an error if `OpenCV` cannot encode the image.
pub fn encode_png(image: &Mat) -> Result<Vec<u8>> {
    let mut buffer = Vector::<u8>::new();
    let encoded = imgcodecs::imencode(".png", image, &mut buffer, &Vector::new())?;
    if !encoded {
        return Err(Error::IoError("PNG encoding failed".to_string()));
    }
    Ok(buffer.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use opencv::core::{Scalar, CV_8UC3};

    #[test]
    fn test_photo_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::milliseconds(42);
        assert_eq!(
            photo_file_name("photo-effect", at),
            "photo-effect-2024-03-09T14-05-07-042Z.png"
        );
    }

    #[test]
    fn test_encode_png_signature() {
        let image = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::all(90.0)).unwrap();
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
