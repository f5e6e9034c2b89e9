//! Adjustment levels, stylistic filters and the render directive built from them.
//!
//! The directive is an ordered list of typed operations. The renderer in
//! [`crate::render`] consumes it; this module never touches pixels.

use crate::constants::{
    DEFAULT_BLUR, DEFAULT_BRIGHTNESS, DEFAULT_CONTRAST, DEFAULT_HUE_ROTATE, DEFAULT_SATURATION,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five continuous image adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
    hue_rotate: f32,
}

impl Default for AdjustmentState {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
            saturation: DEFAULT_SATURATION,
            blur: DEFAULT_BLUR,
            hue_rotate: DEFAULT_HUE_ROTATE,
        }
    }
}

impl AdjustmentState {
    /// Brightness in percent
    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Contrast in percent
    #[must_use]
    pub const fn contrast(&self) -> f32 {
        self.contrast
    }

    /// Saturation in percent
    #[must_use]
    pub const fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Blur radius in pixels
    #[must_use]
    pub const fn blur(&self) -> f32 {
        self.blur
    }

    /// Hue rotation in degrees
    #[must_use]
    pub const fn hue_rotate(&self) -> f32 {
        self.hue_rotate
    }

    pub fn set_brightness(&mut self, percent: f32) {
        self.brightness = non_negative(percent);
    }

    pub fn set_contrast(&mut self, percent: f32) {
        self.contrast = non_negative(percent);
    }

    pub fn set_saturation(&mut self, percent: f32) {
        self.saturation = non_negative(percent);
    }

    pub fn set_blur(&mut self, radius: f32) {
        self.blur = non_negative(radius);
    }

    pub fn set_hue_rotate(&mut self, degrees: f32) {
        self.hue_rotate = if degrees.is_finite() { degrees } else { DEFAULT_HUE_ROTATE };
    }

    /// Restore all five levels to identity at once
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when every level sits at its identity value
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Mutually exclusive stylistic filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleFilter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
    /// Blocky downscale/upscale; not expressible as a color operation
    Pixelated,
}

impl StyleFilter {
    pub const ALL: [Self; 5] = [Self::None, Self::Grayscale, Self::Sepia, Self::Invert, Self::Pixelated];

    /// Parse filter name from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "grayscale" | "greyscale" | "gray" => Some(Self::Grayscale),
            "sepia" => Some(Self::Sepia),
            "invert" => Some(Self::Invert),
            "pixelated" | "pixelate" => Some(Self::Pixelated),
            _ => None,
        }
    }

    /// The color operation this filter contributes to the directive, if any
    #[must_use]
    pub const fn render_op(self) -> Option<RenderOp> {
        match self {
            Self::Grayscale => Some(RenderOp::Grayscale),
            Self::Sepia => Some(RenderOp::Sepia),
            Self::Invert => Some(RenderOp::Invert),
            Self::None | Self::Pixelated => None,
        }
    }

    #[must_use]
    pub const fn is_pixelated(self) -> bool {
        matches!(self, Self::Pixelated)
    }
}

impl fmt::Display for StyleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
            Self::Pixelated => "pixelated",
        };
        f.write_str(name)
    }
}

/// One color or blur operation of the render directive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOp {
    /// Linear multiplier, percent
    Brightness(f32),
    /// Contrast around mid-gray, percent
    Contrast(f32),
    /// Saturation, percent
    Saturate(f32),
    /// Gaussian blur, pixel radius
    Blur(f32),
    /// Hue rotation, degrees
    HueRotate(f32),
    Grayscale,
    Sepia,
    Invert,
}

impl RenderOp {
    /// Whether this operation comes from the stylistic filter rather than a slider
    #[must_use]
    pub const fn is_stylistic(&self) -> bool {
        matches!(self, Self::Grayscale | Self::Sepia | Self::Invert)
    }
}

impl fmt::Display for RenderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness(v) => write!(f, "brightness({v}%)"),
            Self::Contrast(v) => write!(f, "contrast({v}%)"),
            Self::Saturate(v) => write!(f, "saturate({v}%)"),
            Self::Blur(v) => write!(f, "blur({v}px)"),
            Self::HueRotate(v) => write!(f, "hue-rotate({v}deg)"),
            Self::Grayscale => f.write_str("grayscale(100%)"),
            Self::Sepia => f.write_str("sepia(100%)"),
            Self::Invert => f.write_str("invert(100%)"),
        }
    }
}

/// Ordered list of operations applied when drawing a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderDirective {
    ops: Vec<RenderOp>,
}

impl RenderDirective {
    #[must_use]
    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations excluding the stylistic filter
    pub fn adjustment_ops(&self) -> impl Iterator<Item = &RenderOp> {
        self.ops.iter().filter(|op| !op.is_stylistic())
    }
}

impl fmt::Display for RenderDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("none");
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// Build the render directive for the current adjustment levels and style.
///
/// Adjustments come first in fixed order, each only when it differs from its
/// identity value; the stylistic operation, if any, comes last.
#[must_use]
#[allow(clippy::float_cmp)] // identity levels are exact slider values
pub fn build_render_directive(state: &AdjustmentState, style: StyleFilter) -> RenderDirective {
    let mut ops = Vec::with_capacity(6);

    if state.brightness != DEFAULT_BRIGHTNESS {
        ops.push(RenderOp::Brightness(state.brightness));
    }
    if state.contrast != DEFAULT_CONTRAST {
        ops.push(RenderOp::Contrast(state.contrast));
    }
    if state.saturation != DEFAULT_SATURATION {
        ops.push(RenderOp::Saturate(state.saturation));
    }
    if state.blur > DEFAULT_BLUR {
        ops.push(RenderOp::Blur(state.blur));
    }
    if state.hue_rotate != DEFAULT_HUE_ROTATE {
        ops.push(RenderOp::HueRotate(state.hue_rotate));
    }
    if let Some(op) = style.render_op() {
        ops.push(op);
    }

    RenderDirective { ops }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_directive_is_empty() {
        let directive = build_render_directive(&AdjustmentState::default(), StyleFilter::None);
        assert!(directive.is_empty());
        assert_eq!(directive.to_string(), "none");
    }

    #[test]
    fn test_single_adjustment_position() {
        let mut state = AdjustmentState::default();
        state.set_saturation(150.0);
        let directive = build_render_directive(&state, StyleFilter::None);
        assert_eq!(directive.ops(), &[RenderOp::Saturate(150.0)]);

        let mut state = AdjustmentState::default();
        state.set_hue_rotate(-45.0);
        let directive = build_render_directive(&state, StyleFilter::None);
        assert_eq!(directive.ops(), &[RenderOp::HueRotate(-45.0)]);
    }

    #[test]
    fn test_full_order_with_style_last() {
        let mut state = AdjustmentState::default();
        state.set_hue_rotate(90.0);
        state.set_blur(3.0);
        state.set_saturation(50.0);
        state.set_contrast(120.0);
        state.set_brightness(80.0);

        let directive = build_render_directive(&state, StyleFilter::Sepia);
        assert_eq!(
            directive.ops(),
            &[
                RenderOp::Brightness(80.0),
                RenderOp::Contrast(120.0),
                RenderOp::Saturate(50.0),
                RenderOp::Blur(3.0),
                RenderOp::HueRotate(90.0),
                RenderOp::Sepia,
            ]
        );
        assert_eq!(
            directive.to_string(),
            "brightness(80%) contrast(120%) saturate(50%) blur(3px) hue-rotate(90deg) sepia(100%)"
        );
    }

    #[test]
    fn test_pixelated_adds_no_op() {
        let directive = build_render_directive(&AdjustmentState::default(), StyleFilter::Pixelated);
        assert!(directive.is_empty());

        let mut state = AdjustmentState::default();
        state.set_brightness(130.0);
        let directive = build_render_directive(&state, StyleFilter::Pixelated);
        assert_eq!(directive.ops(), &[RenderOp::Brightness(130.0)]);
    }

    #[test]
    fn test_adjustment_ops_skip_style() {
        let mut state = AdjustmentState::default();
        state.set_contrast(50.0);
        let directive = build_render_directive(&state, StyleFilter::Invert);
        let adjustments: Vec<_> = directive.adjustment_ops().copied().collect();
        assert_eq!(adjustments, vec![RenderOp::Contrast(50.0)]);
    }

    #[test]
    fn test_setters_clamp_and_reset() {
        let mut state = AdjustmentState::default();
        state.set_brightness(-20.0);
        state.set_blur(f32::NAN);
        state.set_hue_rotate(f32::INFINITY);
        assert_eq!(state.brightness(), 0.0);
        assert_eq!(state.blur(), 0.0);
        assert_eq!(state.hue_rotate(), 0.0);

        state.set_contrast(10.0);
        state.reset();
        assert!(state.is_identity());
    }

    #[test]
    fn test_style_filter_parse() {
        for style in StyleFilter::ALL {
            assert_eq!(StyleFilter::from_str(&style.to_string()), Some(style));
        }
        assert_eq!(StyleFilter::from_str("GreyScale"), Some(StyleFilter::Grayscale));
        assert_eq!(StyleFilter::from_str("vaporwave"), None);
    }
}
