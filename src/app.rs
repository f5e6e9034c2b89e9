//! Main application module: camera window, trackbars, keyboard and preview.

use crate::{
    assets::OverlayAssets,
    camera::{CameraError, FrameRead, MediaSource, OpenCvCamera, VideoSource},
    capture::{capture_photo, CapturedPhoto},
    compositor::{FrameCompositor, FrameReport},
    config::Config,
    detection::DetectionAdapter,
    drawing,
    error::{Error, Result},
    onnx_detector::OnnxFaceDetector,
    placement::OverlayKind,
    session::EffectsSession,
    ui::{self, Command, StatusLine, SLIDERS},
};
use log::{debug, error, info, warn};
use opencv::{
    core::{Mat, Size},
    highgui::{self, WINDOW_AUTOSIZE, WINDOW_NORMAL, WND_PROP_VISIBLE},
    prelude::*,
};
use std::time::{Duration, Instant};

const PREVIEW_WINDOW: &str = "Photo Preview";
const READY_MESSAGE: &str = "Camera ready! Apply effects and take photos.";
const DETECTOR_MISSING_MESSAGE: &str = "Face detection models failed to load";

/// Whether the loop continues after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Frames per second over one-second windows
struct FpsCounter {
    frames: u32,
    since: Instant,
    rate: f64,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
            rate: 0.0,
        }
    }

    /// Count a shown frame and return the current rate
    fn tick(&mut self) -> f64 {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.rate = f64::from(self.frames) / elapsed.as_secs_f64();
            self.frames = 0;
            self.since = Instant::now();
        }
        self.rate
    }
}

/// Log a per-tick failure and carry on; only fatal errors escape the loop
fn contain<T>(result: Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("{} failed: {}", what, e);
            Ok(None)
        }
    }
}

/// Main application struct
pub struct CameraEffectsApp {
    config: Config,
    window: String,
    camera: Box<dyn MediaSource>,
    compositor: FrameCompositor,
    assets: OverlayAssets,
    session: EffectsSession,
    status: StatusLine,
    preview: Option<CapturedPhoto>,
    surface: Mat,
    last_frame: Mat,
    slider_positions: [i32; 5],
}

impl CameraEffectsApp {
    /// Open the camera, load models and assets, and create the windows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Camera`] if the media source cannot be acquired, or an
    /// `OpenCV` error if the windows cannot be created. Model and asset
    /// failures only disable the features that need them.
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing camera effects application");

        let source = match &config.camera.video_file {
            Some(path) => VideoSource::File(path.clone()),
            None => VideoSource::Camera(config.camera.index),
        };
        let camera = OpenCvCamera::open(&source, config.camera.width, config.camera.height)?;
        Self::with_source(config, Box::new(camera))
    }

    /// Build the application around an already opened media source
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the windows cannot be created.
    pub fn with_source(config: Config, camera: Box<dyn MediaSource>) -> Result<Self> {
        let detector = match OnnxFaceDetector::load(&config.detection) {
            Ok(backend) => DetectionAdapter::new(
                Box::new(backend),
                config.detection.input_size,
                config.detection.score_threshold,
            ),
            Err(e) => {
                warn!("Face detection disabled: {}", e);
                DetectionAdapter::disabled()
            }
        };
        let ready = if detector.is_available() {
            READY_MESSAGE
        } else {
            DETECTOR_MISSING_MESSAGE
        };

        let compositor = FrameCompositor::new(detector, config.create_smoothing()?, config.display.pixelate_divisor);

        let mut assets = OverlayAssets::new();
        assets.load_all(&config.overlays);

        let window = config.display.window_title.clone();
        highgui::named_window(&window, WINDOW_NORMAL)?;
        let resolution = camera.resolution();
        if resolution.width > 0 && resolution.height > 0 {
            highgui::resize_window(&window, resolution.width, resolution.height)?;
        }

        let session = EffectsSession::from_config(&config);
        let slider_positions = ui::slider_positions(session.adjustments());
        for (slider, &position) in SLIDERS.iter().zip(&slider_positions) {
            highgui::create_trackbar(slider.name, &window, None, slider.max, None)?;
            highgui::set_trackbar_pos(slider.name, &window, position)?;
        }

        let status = StatusLine::new(ready, Duration::from_millis(config.display.status_timeout_ms));
        info!("Controls:\n{}", ui::KEY_HELP);

        Ok(Self {
            config,
            window,
            camera,
            compositor,
            assets,
            session,
            status,
            preview: None,
            surface: Mat::default(),
            last_frame: Mat::default(),
            slider_positions,
        })
    }

    /// Run the main application loop until the user quits or the stream ends
    ///
    /// # Errors
    ///
    /// Returns an error if the camera is lost or the display fails.
    pub fn run(&mut self) -> Result<()> {
        info!("Starting main application loop");
        let result = self.run_loop();
        self.teardown();
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        let mut fps = FpsCounter::new();

        while self.camera.is_active() {
            if contain(self.tick(&mut fps), "Frame")? == Some(Flow::Stop) {
                break;
            }
            // HighGUI events are pumped every tick, even when the frame failed
            if contain(self.pump_events(), "Input handling")? == Some(true) {
                info!("Exit requested by user");
                break;
            }
        }
        Ok(())
    }

    /// Read, composite and show one frame
    fn tick(&mut self, fps: &mut FpsCounter) -> Result<Flow> {
        self.poll_assets();
        contain(self.sync_sliders(), "Trackbar sync")?;

        match self.camera.read_frame()? {
            FrameRead::Frame(frame) => self.last_frame = frame,
            FrameRead::NotReady => return Ok(Flow::Continue),
            FrameRead::Ended => {
                info!("Stream ended");
                return Ok(Flow::Stop);
            }
        }

        let Some(report) = self
            .compositor
            .compose(&self.last_frame, &self.session, &self.assets, &mut self.surface)?
        else {
            return Ok(Flow::Continue);
        };
        self.log_report(&report, fps.frames);
        let rate = fps.tick();

        drawing::draw_status_banner(&mut self.surface, self.status.current())?;
        if self.config.display.show_fps {
            drawing::draw_fps(&mut self.surface, rate)?;
        }
        highgui::imshow(&self.window, &self.surface)?;
        if let Some(photo) = &self.preview {
            highgui::imshow(PREVIEW_WINDOW, photo.image())?;
        }
        Ok(Flow::Continue)
    }

    /// Wait briefly for a key; returns true when the app should quit
    fn pump_events(&mut self) -> Result<bool> {
        let key = highgui::wait_key(1)?;
        Ok(self.handle_key(key)? || !self.window_visible())
    }

    fn log_report(&self, report: &FrameReport, frame: u32) {
        if report.degraded {
            debug!("Frame {} rendered without face layer", frame);
        }
        if frame % 300 == 0 {
            debug!(
                "Frame {}: {} faces, {} overlays, {} detector failures",
                frame,
                report.face_count,
                report.overlays_drawn,
                self.compositor.detector_failures()
            );
        }
    }

    fn window_visible(&self) -> bool {
        highgui::get_window_property(&self.window, WND_PROP_VISIBLE).map_or(true, |v| v >= 1.0)
    }

    fn poll_assets(&mut self) {
        if self.assets.poll().is_empty() || self.assets.any_loading(OverlayKind::All) {
            return;
        }
        if self.assets.any_loaded() {
            self.status.flash("Overlays ready! Select one to try it out.");
        } else {
            warn!("No overlay image could be loaded");
            self.status.set_ready("Overlay images unavailable");
        }
    }

    /// Read the trackbars and push any change into the session
    fn sync_sliders(&mut self) -> Result<()> {
        let mut positions = self.slider_positions;
        for (slider, position) in SLIDERS.iter().zip(positions.iter_mut()) {
            *position = highgui::get_trackbar_pos(slider.name, &self.window)?;
        }
        if positions != self.slider_positions {
            ui::apply_slider_positions(self.session.adjustments_mut(), positions);
            self.slider_positions = positions;
        }
        Ok(())
    }

    fn reset_sliders(&mut self) -> Result<()> {
        let positions = ui::slider_positions(self.session.adjustments());
        for (slider, &position) in SLIDERS.iter().zip(&positions) {
            highgui::set_trackbar_pos(slider.name, &self.window, position)?;
        }
        self.slider_positions = positions;
        Ok(())
    }

    /// Apply one key press; returns true when the app should quit
    fn handle_key(&mut self, key: i32) -> Result<bool> {
        let Some(command) = ui::command_for_key(key, self.preview.is_some()) else {
            return Ok(false);
        };
        debug!("Command {:?}", command);

        match command {
            Command::Quit => return Ok(true),
            Command::SetStyle(style) => {
                self.session.set_style(style);
                self.status.flash(format!("Filter: {style}"));
            }
            Command::SelectOverlay(overlay) => self.select_overlay(overlay),
            Command::ToggleFaceDetection => {
                let on = !self.session.toggles().face_detection;
                self.session.set_face_detection(on);
                if on {
                    self.compositor.reset_smoothing();
                }
                self.status.flash(if on { "Face detection on" } else { "Face detection off" });
            }
            Command::ToggleBoxes => {
                let on = !self.session.toggles().boxes;
                self.session.set_show_boxes(on);
            }
            Command::ToggleConfidence => {
                let on = !self.session.toggles().confidence;
                self.session.set_show_confidence(on);
            }
            Command::ToggleLandmarks => {
                let on = !self.session.toggles().landmarks;
                self.session.set_show_landmarks(on);
            }
            Command::TakePhoto => self.take_photo()?,
            Command::Reset => {
                self.session.reset_effects();
                self.reset_sliders()?;
                self.status.flash("Effects reset");
            }
            Command::Download => self.download_photo(),
            Command::Discard => {
                self.close_preview();
                self.status.flash("Photo discarded");
            }
        }
        Ok(false)
    }

    fn select_overlay(&mut self, overlay: OverlayKind) {
        if overlay != OverlayKind::None && !self.assets.any_loaded() {
            self.status.flash("Loading overlay images...");
            return;
        }
        self.session.set_overlay(overlay);
        self.status.flash(ui::overlay_status(overlay));
    }

    fn take_photo(&mut self) -> Result<()> {
        if self.last_frame.empty() {
            self.status.flash("No frame to capture yet");
            return Ok(());
        }
        match capture_photo(&mut self.compositor, &self.last_frame, self.session, &self.assets) {
            Ok(photo) => {
                highgui::named_window(PREVIEW_WINDOW, WINDOW_AUTOSIZE)?;
                highgui::imshow(PREVIEW_WINDOW, photo.image())?;
                self.preview = Some(photo);
                self.status.flash("Photo taken! Enter to save, x to discard.");
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                self.status.flash("Capture failed");
            }
        }
        Ok(())
    }

    fn download_photo(&mut self) {
        let Some(photo) = &self.preview else {
            return;
        };
        match photo.save_to(&self.config.capture.output_dir, &self.config.capture.file_prefix) {
            Ok(path) => {
                info!("Photo downloaded to {}", path.display());
                self.close_preview();
                self.status.flash("Photo saved");
            }
            Err(e) => {
                error!("Could not save photo: {}", e);
                self.status.flash("Could not save photo");
            }
        }
    }

    fn close_preview(&mut self) {
        if self.preview.take().is_some() {
            if let Err(e) = highgui::destroy_window(PREVIEW_WINDOW) {
                debug!("Preview window already closed: {}", e);
            }
        }
    }

    /// Stop the camera and close every window together
    fn teardown(&mut self) {
        info!("Application shutting down");
        self.camera.stop();
        self.preview = None;
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Failed to close windows: {}", e);
        }
    }
}

/// Show a camera acquisition error in a window until a key is pressed
///
/// # Errors
///
/// Returns an error if the window cannot be shown.
pub fn show_camera_error(title: &str, camera_error: &CameraError) -> Result<()> {
    let message = camera_error.user_message();
    error!("{}", message);

    let screen = drawing::error_screen(Size::new(720, 240), &message)?;
    highgui::named_window(title, WINDOW_AUTOSIZE)?;
    highgui::imshow(title, &screen)?;
    highgui::wait_key(0)?;
    highgui::destroy_all_windows()?;
    Ok(())
}

/// Run the application, presenting camera errors to the user
///
/// # Errors
///
/// Returns any error that stopped the application.
pub fn run(config: Config) -> Result<()> {
    let title = config.display.window_title.clone();
    let outcome = CameraEffectsApp::new(config).and_then(|mut app| app.run());
    if let Err(Error::Camera(camera_error)) = &outcome {
        if let Err(e) = show_camera_error(&title, camera_error) {
            warn!("Could not show camera error window: {}", e);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_passes_values_through() {
        assert_eq!(contain(Ok(Flow::Stop), "Frame").unwrap(), Some(Flow::Stop));
    }

    #[test]
    fn test_contain_swallows_frame_errors() {
        let bad_frame: Result<Flow> = Err(Error::InvalidInput("8-bit single channel frame".to_string()));
        assert_eq!(contain(bad_frame, "Frame").unwrap(), None);

        let asset: Result<()> = Err(Error::AssetError("overlay decode".to_string()));
        assert!(contain(asset, "Input handling").unwrap().is_none());
    }

    #[test]
    fn test_contain_lets_camera_loss_through() {
        let lost: Result<Flow> = Err(Error::Camera(CameraError::NoDevice));
        assert!(matches!(contain(lost, "Frame"), Err(Error::Camera(CameraError::NoDevice))));
    }

    #[test]
    fn test_fps_counter_counts_until_a_second_passes() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick(), 0.0);
        assert_eq!(fps.frames, 1);

        fps.since = Instant::now() - Duration::from_secs(2);
        let rate = fps.tick();
        assert!(rate > 0.0 && rate <= 1.0);
        assert_eq!(fps.frames, 0);
    }
}
