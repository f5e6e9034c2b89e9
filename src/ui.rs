//! Keyboard commands and the status banner.

use crate::adjustments::{AdjustmentState, StyleFilter};
use crate::constants::{HUE_ROTATE_RANGE, MAX_BLUR_RADIUS, MAX_PERCENT_LEVEL};
use crate::placement::OverlayKind;
use std::time::{Duration, Instant};

const KEY_ESC: i32 = 27;
const KEY_ENTER: i32 = 13;
const KEY_LINEFEED: i32 = 10;
const KEY_BACKSPACE: i32 = 8;

/// A user action decoded from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    SetStyle(StyleFilter),
    SelectOverlay(OverlayKind),
    ToggleFaceDetection,
    ToggleBoxes,
    ToggleConfidence,
    ToggleLandmarks,
    TakePhoto,
    Reset,
    /// Save the photo shown in the preview
    Download,
    /// Drop the photo shown in the preview
    Discard,
}

/// Map a `wait_key` code to a command.
///
/// While the preview is open only save, discard and quit are accepted.
#[must_use]
pub fn command_for_key(key: i32, preview_open: bool) -> Option<Command> {
    if key < 0 {
        return None;
    }
    let ch = u8::try_from(key & 0xFF).ok().map(|b| b.to_ascii_lowercase() as char);

    if preview_open {
        return match (key, ch) {
            (KEY_ENTER | KEY_LINEFEED, _) | (_, Some('d' | 'w')) => Some(Command::Download),
            (KEY_ESC | KEY_BACKSPACE, _) | (_, Some('x')) => Some(Command::Discard),
            (_, Some('q')) => Some(Command::Quit),
            _ => None,
        };
    }

    if key == KEY_ESC {
        return Some(Command::Quit);
    }

    Some(match ch? {
        'q' => Command::Quit,
        'n' => Command::SetStyle(StyleFilter::None),
        'g' => Command::SetStyle(StyleFilter::Grayscale),
        's' => Command::SetStyle(StyleFilter::Sepia),
        'i' => Command::SetStyle(StyleFilter::Invert),
        'p' => Command::SetStyle(StyleFilter::Pixelated),
        '0' => Command::SelectOverlay(OverlayKind::None),
        '1' => Command::SelectOverlay(OverlayKind::Mustache),
        '2' => Command::SelectOverlay(OverlayKind::Glasses),
        '3' => Command::SelectOverlay(OverlayKind::Hat),
        '4' => Command::SelectOverlay(OverlayKind::All),
        'f' => Command::ToggleFaceDetection,
        'b' => Command::ToggleBoxes,
        'c' => Command::ToggleConfidence,
        'l' => Command::ToggleLandmarks,
        ' ' | 't' => Command::TakePhoto,
        'r' => Command::Reset,
        _ => return None,
    })
}

/// Key help printed at startup
pub const KEY_HELP: &str = "\
Filters:  n none  g grayscale  s sepia  i invert  p pixelated
Overlays: 0 none  1 mustache  2 glasses  3 hat  4 all
Display:  f face detection  b boxes  c confidence  l landmarks
Photo:    space take  r reset  (preview: enter/d save, x/esc discard)
Quit:     q or esc";

/// One adjustment trackbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    pub name: &'static str,
    pub max: i32,
}

/// Trackbars in window order: brightness, contrast, saturation, blur, hue
pub const SLIDERS: [Slider; 5] = [
    Slider { name: "Brightness %", max: MAX_PERCENT_LEVEL },
    Slider { name: "Contrast %", max: MAX_PERCENT_LEVEL },
    Slider { name: "Saturation %", max: MAX_PERCENT_LEVEL },
    Slider { name: "Blur px", max: MAX_BLUR_RADIUS },
    Slider { name: "Hue deg +180", max: HUE_ROTATE_RANGE * 2 },
];

/// Adjustment levels for the given trackbar positions.
///
/// The hue trackbar cannot go negative, so its position is offset by half
/// its range.
#[allow(clippy::cast_precision_loss)]
pub fn apply_slider_positions(state: &mut AdjustmentState, positions: [i32; 5]) {
    state.set_brightness(positions[0] as f32);
    state.set_contrast(positions[1] as f32);
    state.set_saturation(positions[2] as f32);
    state.set_blur(positions[3] as f32);
    state.set_hue_rotate((positions[4] - HUE_ROTATE_RANGE) as f32);
}

/// Trackbar positions showing the given levels
#[must_use]
pub fn slider_positions(state: &AdjustmentState) -> [i32; 5] {
    let to_pos = |v: f32, max: i32| crate::utils::safe_cast::f32_to_i32_clamp(v.round(), 0, max);
    [
        to_pos(state.brightness(), SLIDERS[0].max),
        to_pos(state.contrast(), SLIDERS[1].max),
        to_pos(state.saturation(), SLIDERS[2].max),
        to_pos(state.blur(), SLIDERS[3].max),
        to_pos(state.hue_rotate() + HUE_ROTATE_RANGE as f32, SLIDERS[4].max),
    ]
}

/// Status text announcing a new overlay selection
#[must_use]
pub fn overlay_status(overlay: OverlayKind) -> String {
    if overlay == OverlayKind::None {
        return "Overlay removed".to_string();
    }
    let name = overlay.to_string();
    let mut chars = name.chars();
    let capitalized: String = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    format!("{capitalized} overlay active - move your head!")
}

/// Status banner text with transient messages that revert to a ready message
#[derive(Debug, Clone)]
pub struct StatusLine {
    ready: String,
    transient: Option<(String, Instant)>,
    timeout: Duration,
}

impl StatusLine {
    #[must_use]
    pub fn new(ready: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ready: ready.into(),
            transient: None,
            timeout,
        }
    }

    /// Replace the message shown when nothing transient is up
    pub fn set_ready(&mut self, message: impl Into<String>) {
        self.ready = message.into();
    }

    /// Show a message until the timeout passes
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flash_at(message, Instant::now());
    }

    pub fn flash_at(&mut self, message: impl Into<String>, now: Instant) {
        self.transient = Some((message.into(), now + self.timeout));
    }

    /// Text to show now
    pub fn current(&mut self) -> &str {
        self.current_at(Instant::now())
    }

    pub fn current_at(&mut self, now: Instant) -> &str {
        if self.transient.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.transient = None;
        }
        match &self.transient {
            Some((message, _)) => message,
            None => &self.ready,
        }
    }
}
