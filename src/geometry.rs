//! Pure dial geometry.
//!
//! Angles are in degrees, measured clockwise from 3 o'clock on a surface whose y axis
//! points down. Nothing here holds state between frames; the renderer calls into
//! these functions again on every redraw.

use crate::config::{dims, GaugeStyle, BASELINE_DEGREES, BORDER, SWEEP_SPAN_DEGREES};
use crate::text::FontMetrics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self` along `angle_degrees`.
    pub fn polar(self, radius: f64, angle_degrees: f64) -> Point {
        let angle = angle_degrees.to_radians();
        Point::new(self.x + angle.cos() * radius, self.y + angle.sin() * radius)
    }

    fn rotate(self, angle_degrees: f64) -> Point {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Square of half-side `half_extent` around `center`.
    pub fn square(center: Point, half_extent: f64) -> Self {
        Self {
            left: center.x - half_extent,
            top: center.y - half_extent,
            right: center.x + half_extent,
            bottom: center.y + half_extent,
        }
    }

    pub fn inset(self, by: f64) -> Self {
        Self {
            left: self.left + by,
            top: self.top + by,
            right: self.right - by,
            bottom: self.bottom - by,
        }
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Radius of the circle inscribed in this (square) rect.
    pub fn radius(&self) -> f64 {
        (self.right - self.left) / 2.0
    }
}

// ============================================================================
// RANGE AND ANGLES
// ============================================================================

/// Displayed range plus its unit, always replaced as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeState {
    min_value: i32,
    tick_count: u32,
    unit_label: String,
}

impl Default for RangeState {
    fn default() -> Self {
        Self::new(0, 230, "km/h")
    }
}

impl RangeState {
    /// # Panics
    ///
    /// Panics unless `max_value > min_value`; an empty range has no angle step.
    pub fn new(min_value: i32, max_value: i32, unit_label: impl Into<String>) -> Self {
        assert!(
            max_value > min_value,
            "gauge range must satisfy max_value > min_value (got {min_value}..{max_value})"
        );
        Self {
            min_value,
            tick_count: (max_value as i64 - min_value as i64) as u32,
            unit_label: unit_label.into(),
        }
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        (self.min_value as i64 + self.tick_count as i64) as i32
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    /// Angular spacing between adjacent ticks.
    pub fn tick_angle_step(&self) -> f64 {
        SWEEP_SPAN_DEGREES / self.tick_count as f64
    }

    /// Linear, unclamped: values outside the range land outside the visible arc.
    pub fn angle_for_value(&self, value: f64) -> f64 {
        BASELINE_DEGREES + (value - self.min_value as f64) * self.tick_angle_step()
    }

    /// Degrees covered by the progress arc, starting at the baseline.
    pub fn sweep_angle(&self, value: f64) -> f64 {
        self.angle_for_value(value) - BASELINE_DEGREES
    }

    pub fn value_for_percent(&self, percent: f64) -> f64 {
        self.min_value as f64 + self.tick_count as f64 * percent / 100.0
    }

    /// All `tick_count + 1` tick slots, drawn or not.
    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        (0..=self.tick_count).map(move |index| {
            let kind = TickKind::classify(index);
            Tick {
                index,
                kind,
                angle: BASELINE_DEGREES + index as f64 * self.tick_angle_step(),
                label: (kind == TickKind::Major).then(|| self.min_value as i64 + index as i64),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Major,
    Minor,
    Hidden,
}

impl TickKind {
    pub fn classify(index: u32) -> Self {
        if index % 10 == 0 {
            TickKind::Major
        } else if index % 5 == 0 {
            TickKind::Minor
        } else {
            TickKind::Hidden
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u32,
    pub kind: TickKind,
    /// Absolute angle of this tick.
    pub angle: f64,
    /// Value printed next to major ticks.
    pub label: Option<i64>,
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Padding {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Padding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

/// Size constraint handed down by the host for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureSpec {
    Exactly(u32),
    AtMost(u32),
    Unspecified,
}

impl MeasureSpec {
    pub fn resolve(self, desired: u32) -> u32 {
        match self {
            MeasureSpec::Exactly(size) => size,
            MeasureSpec::AtMost(size) => desired.min(size),
            MeasureSpec::Unspecified => desired,
        }
    }
}

/// Negotiates the widget size: padding plus the preferred dial diameter, bounded by
/// the host's constraints.
pub fn measure(
    style: &GaugeStyle,
    padding: Padding,
    width_spec: MeasureSpec,
    height_spec: MeasureSpec,
) -> (u32, u32) {
    let diameter = style.dial_radius * 2.0;
    let desired_width = (padding.left + diameter + padding.right).round() as u32;
    let desired_height = (padding.top + diameter + padding.bottom).round() as u32;
    (
        width_spec.resolve(desired_width),
        height_spec.resolve(desired_height),
    )
}

/// Layout derived from the drawable size; only changes when the size does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
    pub effective_radius: f64,
    pub inner_radius: f64,
    pub center: Point,
    pub bounding_box: Rect,
}

impl Layout {
    pub fn new(width: f64, height: f64, padding: Padding, stroke_width: f64) -> Self {
        let effective_radius = ((width - padding.left - padding.right)
            .min(height - padding.top - padding.bottom)
            / 2.0)
            .max(0.0);
        let inner_radius = effective_radius - stroke_width / 2.0 - BORDER * 2.0;
        let center = Point::new(padding.left + effective_radius, padding.top + effective_radius);
        Self {
            width,
            height,
            padding,
            effective_radius,
            inner_radius,
            center,
            bounding_box: Rect::square(center, inner_radius + BORDER),
        }
    }

    /// Where the progress ring is stroked: inset so a `0.4 R` stroke sits between
    /// the ticks and the centre disc.
    pub fn progress_box(&self) -> Rect {
        self.bounding_box.inset(self.effective_radius * 0.2)
    }

    pub fn progress_stroke(&self) -> f64 {
        self.effective_radius * 0.4
    }

    pub fn inner_disc_radius(&self) -> f64 {
        self.effective_radius * 0.6
    }

    pub fn cap_radius(&self) -> f64 {
        self.effective_radius * 0.4
    }
}

// ============================================================================
// SHAPES
// ============================================================================

/// A tick mark resolved to absolute surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSegment {
    pub outer: Point,
    pub inner: Point,
    pub thickness: f32,
}

pub fn tick_segment(layout: &Layout, style: &GaugeStyle, tick: &Tick) -> Option<TickSegment> {
    let (inset, thickness) = match tick.kind {
        TickKind::Major => (dims::MAJOR_TICK_INSET, dims::MAJOR_TICK_STROKE_PX),
        TickKind::Minor => (dims::MINOR_TICK_INSET, dims::MINOR_TICK_STROKE_PX),
        TickKind::Hidden => return None,
    };
    let r = layout.effective_radius;
    let outer_radius = r - BORDER - style.stroke_width;
    let inner_radius = r - style.stroke_width - style.dp(inset);
    Some(TickSegment {
        outer: layout.center.polar(outer_radius, tick.angle),
        inner: layout.center.polar(inner_radius, tick.angle),
        thickness,
    })
}

/// Horizontal centre and baseline of an upright tick label.
///
/// The label is pushed inward by half its own width so wide numbers do not collide
/// with the tick, and centred vertically on the ray using the font's ascent/descent.
pub fn label_anchor(
    layout: &Layout,
    style: &GaugeStyle,
    angle: f64,
    text_width: f64,
    metrics: FontMetrics,
) -> Point {
    let radius = layout.effective_radius
        - style.stroke_width
        - style.dp(dims::LABEL_INSET)
        - text_width / 2.0;
    let center = layout.center.polar(radius, angle);
    Point::new(center.x, center.y + metrics.baseline_offset())
}

/// Kite-shaped needle: tip, one side, tail, other side.
pub fn needle_polygon(layout: &Layout, style: &GaugeStyle, angle: f64) -> [Point; 4] {
    let half_width = style.dp(dims::NEEDLE_HALF_WIDTH);
    [
        Point::new(layout.effective_radius - style.dp(dims::NEEDLE_TIP_INSET), 0.0),
        Point::new(0.0, -half_width),
        Point::new(-dims::NEEDLE_TAIL_PX, 0.0),
        Point::new(0.0, half_width),
    ]
    .map(|p| p.rotate(angle).offset(layout.center))
}
