use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::animation::Easing;
use crate::error::{GaugeError, Result};

/// Gap left undrawn at the bottom of the dial, in degrees.
pub const OPEN_ANGLE_DEGREES: f64 = 120.0;

/// Angle of the range minimum, clockwise from 3 o'clock.
pub const BASELINE_DEGREES: f64 = 150.0;

/// Spacing between the glow arc and the dial edge.
pub const BORDER: f64 = 5.0;

/// Visible arc span: everything except the open gap.
pub const SWEEP_SPAN_DEGREES: f64 = 360.0 - OPEN_ANGLE_DEGREES;

/// RGBA color for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::from_argb(0x0000_0000);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parses `#RRGGBB` or `#AARRGGBB`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || GaugeError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Self::from_argb(0xff00_0000 | value)),
            8 => Ok(Self::from_argb(value)),
            _ => Err(invalid()),
        }
    }

    /// Linear blend towards `other`, including alpha.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = GaugeError;

    fn try_from(value: String) -> Result<Self> {
        Color::parse(&value)
    }
}

/// Fixed colors of the layered dial look.
pub mod palette {
    use super::Color;

    pub const BACKGROUND: Color = Color::from_argb(0xff02_0018);
    pub const DIAL_MIDDLE: Color = Color::from_argb(0xff22_8fbd);
    pub const GLOW_ARC: Color = Color::from_argb(0xff38_f9fd);
    pub const GLOW_ARC_ALPHA: u8 = 70;
    pub const GLOW_ARC_SHADOW: Color = Color::WHITE;
    pub const INNER_DISC: Color = Color::from_argb(0xff05_002d);
    pub const CAP: Color = Color::from_argb(0xff05_0d3d);
    pub const CAP_SHADOW: Color = Color::from_argb(0xff00_6ec6);
    pub const UNIT_LABEL: Color = Color::from_argb(0xff38_f9fd);
    pub const TICK_LABEL: Color = Color::WHITE;
    pub const NEEDLE: Color = Color::WHITE;

    /// Sweep stops measured clockwise from the needle.
    pub const SWEEP_STOPS: [(f64, Color); 3] = [
        (0.0, Color::from_argb(0xaaff_e9ec)),
        (0.9, Color::from_argb(0x0028_e9ec)),
        (1.0, Color::from_argb(0xaa28_e9ec)),
    ];
}

/// Internal dimensions in density-independent units.
pub mod dims {
    pub const MAJOR_TICK_INSET: f64 = 15.0;
    pub const MINOR_TICK_INSET: f64 = 9.0;
    pub const LABEL_INSET: f64 = 21.0;
    pub const NEEDLE_TIP_INSET: f64 = 12.0;
    pub const NEEDLE_HALF_WIDTH: f64 = 5.0;
    pub const UNIT_LABEL_OFFSET: f64 = 18.0;
    pub const UNIT_LABEL_TEXT_SIZE: f64 = 14.0;

    /// Raw pixels, not scaled by density.
    pub const NEEDLE_TAIL_PX: f64 = 12.0;
    pub const MAJOR_TICK_STROKE_PX: f32 = 3.0;
    pub const MINOR_TICK_STROKE_PX: f32 = 2.0;
    pub const GLOW_ARC_BLUR_PX: f64 = 10.0;
    pub const CAP_BLUR_PX: f64 = 15.0;
}

/// Static appearance of one gauge, already resolved to device pixels.
///
/// Deserialises from a key/value table whose keys follow the declarative attribute
/// names, e.g.
///
/// ```toml
/// color_dial_middle = "#228fbd"
/// text_size_dial = 11.0
/// animator_play_time = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default)]
pub struct GaugeStyle {
    #[builder(default = palette::DIAL_MIDDLE)]
    #[serde(rename = "color_dial_middle")]
    pub dial_color: Color,
    #[builder(default = Color::WHITE)]
    #[serde(rename = "text_title_color")]
    pub title_color: Color,
    #[builder(default = 11.0)]
    #[serde(rename = "text_size_dial")]
    pub tick_label_text_size: f32,
    #[builder(default = 2.0)]
    #[serde(rename = "stroke_width_dial")]
    pub stroke_width: f64,
    /// Preferred radius used when the host leaves the size open.
    #[builder(default = 128.0)]
    #[serde(rename = "radius_circle_dial")]
    pub dial_radius: f64,
    #[builder(default = 22.0)]
    #[serde(rename = "text_title_size")]
    pub title_text_size: f32,
    #[builder(default = 2000)]
    #[serde(rename = "animator_play_time")]
    pub animation_duration_ms: u64,
    /// Pixels per density-independent unit.
    #[builder(default = 1.0)]
    pub density: f64,
    #[builder(default)]
    pub easing: Easing,
}

impl Default for GaugeStyle {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeStyle {
    /// Parses and validates a TOML style table. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let style: GaugeStyle = toml::from_str(source)?;
        style.validate()?;
        Ok(style)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("text_size_dial", self.tick_label_text_size as f64),
            ("stroke_width_dial", self.stroke_width),
            ("radius_circle_dial", self.dial_radius),
            ("text_title_size", self.title_text_size as f64),
            ("density", self.density),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GaugeError::InvalidStyle(format!(
                    "{key} must be positive, got {value}"
                )));
            }
        }
        if self.animation_duration_ms == 0 {
            return Err(GaugeError::InvalidStyle(
                "animator_play_time must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Scales a density-independent length to pixels.
    pub fn dp(&self, value: f64) -> f64 {
        value * self.density
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

/// Configuration for the application window
#[derive(Debug, Clone, Builder)]
pub struct WindowConfig {
    #[builder(default = "Dashboard".to_string())]
    pub title: String,
    #[builder(default = 300)]
    pub width: usize,
    #[builder(default = 300)]
    pub height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,
    #[builder(default = palette::BACKGROUND)]
    pub background: Color,
}

impl WindowConfig {
    /// Time budget of one frame at `max_framerate`.
    pub fn frame_duration(&self) -> Result<Duration> {
        if !(self.max_framerate.is_finite() && self.max_framerate > 0.0) {
            return Err(GaugeError::Window(format!(
                "max_framerate must be positive, got {}",
                self.max_framerate
            )));
        }
        Ok(Duration::from_secs_f64(1.0 / self.max_framerate))
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
