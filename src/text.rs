use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::error::{GaugeError, Result};

/// Vertical font metrics; both values are positive distances from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
}

impl FontMetrics {
    /// Baseline offset that centres a line of text on a given y.
    pub fn baseline_offset(&self) -> f64 {
        (self.ascent - self.descent) / 2.0
    }
}

/// Text measurement needed to place labels before anything is drawn.
pub trait TextMeasure {
    fn text_width(&self, text: &str, size: f32) -> f64;
    fn metrics(&self, size: f32) -> FontMetrics;
}

/// Measures every string as empty. Used when a canvas has no font to draw text with.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoText;

impl TextMeasure for NoText {
    fn text_width(&self, _text: &str, _size: f32) -> f64 {
        0.0
    }

    fn metrics(&self, _size: f32) -> FontMetrics {
        FontMetrics {
            ascent: 0.0,
            descent: 0.0,
        }
    }
}

/// Font used for every piece of gauge text.
pub struct GaugeFont {
    font: Font<'static>,
}

impl std::fmt::Debug for GaugeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl GaugeFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = Font::try_from_vec(data).ok_or(GaugeError::InvalidFont)?;
        Ok(Self { font })
    }

    pub fn font(&self) -> &Font<'static> {
        &self.font
    }

    /// Glyphs laid out on a baseline at `(x, y)`.
    pub fn layout(&self, text: &str, size: f32, x: f32, y: f32) -> Vec<PositionedGlyph<'static>> {
        self.font
            .layout(text, Scale::uniform(size), point(x, y))
            .collect()
    }
}

impl TextMeasure for GaugeFont {
    fn text_width(&self, text: &str, size: f32) -> f64 {
        self.layout(text, size, 0.0, 0.0)
            .last()
            .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as f64)
            .unwrap_or(0.0)
    }

    fn metrics(&self, size: f32) -> FontMetrics {
        let v = self.font.v_metrics(Scale::uniform(size));
        FontMetrics {
            ascent: v.ascent as f64,
            descent: -v.descent as f64,
        }
    }
}

/// Rounds to one decimal place, halves away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Formats a reading with at most one decimal, dropping a trailing `.0`.
///
/// Halves round away from zero, so `3.45` becomes `"3.5"` and `-1.25` becomes
/// `"-1.3"`. A value that rounds to zero prints as `"0"`, never `"-0"`.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let tenths = (value * 10.0).round() as i64;
    if tenths == 0 {
        "0".to_string()
    } else if tenths % 10 == 0 {
        (tenths / 10).to_string()
    } else {
        let sign = if tenths < 0 { "-" } else { "" };
        let abs = tenths.unsigned_abs();
        format!("{sign}{}.{}", abs / 10, abs % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(3.45), "3.5");
        assert_eq!(format_value(-1.25), "-1.3");
        assert_eq!(format_value(115.0), "115");
        assert_eq!(format_value(57.5), "57.5");
        assert_eq!(format_value(0.04), "0");
        assert_eq!(format_value(-0.04), "0");
        assert_eq!(format_value(-0.5), "-0.5");
        assert_eq!(format_value(229.96), "230");
        assert_eq!(format_value(1234.5), "1234.5");
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(57.54), 57.5);
        assert_eq!(round_to_tenth(57.56), 57.6);
        assert_eq!(round_to_tenth(-1.25), -1.3);
        assert_eq!(round_to_tenth(115.0), 115.0);
    }

    #[test]
    fn test_baseline_offset() {
        let metrics = FontMetrics {
            ascent: 9.0,
            descent: 3.0,
        };
        assert_eq!(metrics.baseline_offset(), 3.0);
    }

    #[test]
    fn test_invalid_font_rejected() {
        assert!(matches!(
            GaugeFont::from_bytes(vec![0, 1, 2, 3]),
            Err(GaugeError::InvalidFont)
        ));
    }
}
