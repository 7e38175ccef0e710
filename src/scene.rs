//! Frame composition: one gauge state in, an ordered list of draw commands out.
//!
//! Later commands deliberately cover earlier ones: glow ring, ticks, progress ring,
//! dark disc, needle, blue cap, text. Each command carries its own style so the
//! rasteriser holds no paint state between commands.

use crate::config::{dims, palette, Color, GaugeStyle, BASELINE_DEGREES, SWEEP_SPAN_DEGREES};
use crate::geometry::{label_anchor, needle_polygon, tick_segment, Layout, Point, RangeState, Rect};
use crate::text::{format_value, TextMeasure};

// ============================================================================
// STYLE DESCRIPTORS
// ============================================================================

/// Soft blurred halo around a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub radius: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Angular gradient around `center`; stop offsets run clockwise from
    /// `start_angle` over a full turn.
    SweepGradient {
        center: Point,
        start_angle: f64,
        stops: Vec<(f64, Color)>,
    },
}

impl Paint {
    /// Color of this paint at `angle` degrees around its centre.
    pub fn color_at(&self, angle: f64) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::SweepGradient {
                start_angle, stops, ..
            } => {
                let offset = (angle - start_angle).rem_euclid(360.0) / 360.0;
                gradient_color(stops, offset)
            }
        }
    }
}

fn gradient_color(stops: &[(f64, Color)], offset: f64) -> Color {
    let Some(&(first_at, first)) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if offset <= first_at {
        return first;
    }
    for pair in stops.windows(2) {
        let ((from_at, from), (to_at, to)) = (pair[0], pair[1]);
        if offset <= to_at {
            let span = to_at - from_at;
            let t = if span > 0.0 { (offset - from_at) / span } else { 1.0 };
            return from.lerp(to, t);
        }
    }
    stops.last().map(|&(_, c)| c).unwrap_or(first)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub paint: Paint,
    pub glow: Option<Glow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: Color,
    pub glow: Option<Glow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub bold: bool,
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Stroked arc of the circle inscribed in `oval`.
    Arc {
        oval: Rect,
        start_angle: f64,
        sweep_angle: f64,
        stroke: Stroke,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Fill,
    },
    Polygon {
        points: Vec<Point>,
        fill: Fill,
    },
    /// Text horizontally centred on `anchor.x` with its baseline on `anchor.y`.
    Text {
        anchor: Point,
        text: String,
        style: TextStyle,
    },
}

#[derive(Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}

// ============================================================================
// FRAME COMPOSITION
// ============================================================================

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub style: &'a GaugeStyle,
    pub range: &'a RangeState,
    pub layout: &'a Layout,
    pub value: f64,
}

/// Builds the draw commands for one redraw. Geometry is recomputed every call.
pub fn compose(frame: &Frame<'_>, measure: &dyn TextMeasure) -> Scene {
    let mut scene = Scene::new();
    add_glow_arc(&mut scene, frame);
    add_ticks(&mut scene, frame, measure);
    add_progress_arc(&mut scene, frame);
    add_inner_disc(&mut scene, frame);
    add_needle(&mut scene, frame);
    add_cap(&mut scene, frame);
    add_readout(&mut scene, frame);
    scene
}

fn add_glow_arc(scene: &mut Scene, frame: &Frame<'_>) {
    scene.add_command(DrawCommand::Arc {
        oval: frame.layout.bounding_box,
        start_angle: BASELINE_DEGREES,
        sweep_angle: SWEEP_SPAN_DEGREES,
        stroke: Stroke {
            width: frame.style.stroke_width,
            paint: Paint::Solid(palette::GLOW_ARC.with_alpha(palette::GLOW_ARC_ALPHA)),
            glow: Some(Glow {
                radius: dims::GLOW_ARC_BLUR_PX,
                color: palette::GLOW_ARC_SHADOW,
            }),
        },
    });
}

fn add_ticks(scene: &mut Scene, frame: &Frame<'_>, measure: &dyn TextMeasure) {
    let label_size = frame.style.tick_label_text_size;
    let metrics = measure.metrics(label_size);
    for tick in frame.range.ticks() {
        let Some(segment) = tick_segment(frame.layout, frame.style, &tick) else {
            continue;
        };
        scene.add_command(DrawCommand::Line {
            from: segment.inner,
            to: segment.outer,
            thickness: segment.thickness,
            color: frame.style.dial_color,
        });
        if let Some(label) = tick.label {
            let text = label.to_string();
            let width = measure.text_width(&text, label_size);
            scene.add_command(DrawCommand::Text {
                anchor: label_anchor(frame.layout, frame.style, tick.angle, width, metrics),
                text,
                style: TextStyle {
                    size: label_size,
                    color: palette::TICK_LABEL,
                    bold: false,
                },
            });
        }
    }
}

fn add_progress_arc(scene: &mut Scene, frame: &Frame<'_>) {
    let needle_angle = frame.range.angle_for_value(frame.value);
    scene.add_command(DrawCommand::Arc {
        oval: frame.layout.progress_box(),
        start_angle: BASELINE_DEGREES,
        sweep_angle: frame.range.sweep_angle(frame.value),
        stroke: Stroke {
            width: frame.layout.progress_stroke(),
            paint: Paint::SweepGradient {
                center: frame.layout.center,
                start_angle: needle_angle,
                stops: palette::SWEEP_STOPS.to_vec(),
            },
            glow: None,
        },
    });
}

fn add_inner_disc(scene: &mut Scene, frame: &Frame<'_>) {
    scene.add_command(DrawCommand::Circle {
        center: frame.layout.center,
        radius: frame.layout.inner_disc_radius(),
        fill: Fill {
            color: palette::INNER_DISC,
            glow: None,
        },
    });
}

fn add_needle(scene: &mut Scene, frame: &Frame<'_>) {
    let angle = frame.range.angle_for_value(frame.value);
    scene.add_command(DrawCommand::Polygon {
        points: needle_polygon(frame.layout, frame.style, angle).to_vec(),
        fill: Fill {
            color: palette::NEEDLE,
            glow: None,
        },
    });
}

fn add_cap(scene: &mut Scene, frame: &Frame<'_>) {
    scene.add_command(DrawCommand::Circle {
        center: frame.layout.center,
        radius: frame.layout.cap_radius(),
        fill: Fill {
            color: palette::CAP,
            glow: Some(Glow {
                radius: dims::CAP_BLUR_PX,
                color: palette::CAP_SHADOW,
            }),
        },
    });
}

fn add_readout(scene: &mut Scene, frame: &Frame<'_>) {
    let center = frame.layout.center;
    scene.add_command(DrawCommand::Text {
        anchor: center,
        text: format_value(frame.value),
        style: TextStyle {
            size: frame.style.title_text_size,
            color: frame.style.title_color,
            bold: true,
        },
    });
    scene.add_command(DrawCommand::Text {
        anchor: Point::new(center.x, center.y + frame.style.dp(dims::UNIT_LABEL_OFFSET)),
        text: format!("({})", frame.range.unit_label()),
        style: TextStyle {
            size: frame.style.dp(dims::UNIT_LABEL_TEXT_SIZE) as f32,
            color: palette::UNIT_LABEL,
            bold: true,
        },
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::Padding;
    use crate::text::FontMetrics;

    /// Fixed-advance font stand-in: every character is half the font size wide.
    pub(crate) struct MonoMeasure;

    impl TextMeasure for MonoMeasure {
        fn text_width(&self, text: &str, size: f32) -> f64 {
            text.chars().count() as f64 * size as f64 / 2.0
        }

        fn metrics(&self, size: f32) -> FontMetrics {
            FontMetrics {
                ascent: size as f64 * 0.8,
                descent: size as f64 * 0.2,
            }
        }
    }

    fn compose_at(value: f64) -> Scene {
        let style = GaugeStyle::default();
        let range = RangeState::new(0, 230, "km/h");
        let layout = Layout::new(300.0, 300.0, Padding::default(), style.stroke_width);
        compose(
            &Frame {
                style: &style,
                range: &range,
                layout: &layout,
                value,
            },
            &MonoMeasure,
        )
    }

    fn kind(command: &DrawCommand) -> &'static str {
        match command {
            DrawCommand::Arc { .. } => "arc",
            DrawCommand::Line { .. } => "line",
            DrawCommand::Circle { .. } => "circle",
            DrawCommand::Polygon { .. } => "polygon",
            DrawCommand::Text { .. } => "text",
        }
    }

    #[test]
    fn test_layer_order() {
        let scene = compose_at(115.0);
        let kinds: Vec<&str> = scene.commands().iter().map(kind).collect();

        // 24 major ticks with labels, 23 minor ticks
        let tick_commands = 24 * 2 + 23;
        assert_eq!(kinds.len(), 1 + tick_commands + 6);
        assert_eq!(kinds[0], "arc");
        assert!(kinds[1..=tick_commands]
            .iter()
            .all(|k| *k == "line" || *k == "text"));
        assert_eq!(
            &kinds[tick_commands + 1..],
            &["arc", "circle", "polygon", "circle", "text", "text"]
        );
    }

    #[test]
    fn test_labels_follow_their_tick() {
        let scene = compose_at(0.0);
        let labels: Vec<&str> = scene
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, style, .. } if !style.bold => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 24);
        assert_eq!(labels[0], "0");
        assert_eq!(labels[23], "230");

        // every label comes right after its major tick line
        let commands = scene.commands();
        for (i, command) in commands.iter().enumerate() {
            if let DrawCommand::Text { style, .. } = command {
                if !style.bold {
                    assert!(matches!(commands[i - 1], DrawCommand::Line { thickness, .. } if thickness == 3.0));
                }
            }
        }
    }

    #[test]
    fn test_progress_arc_tracks_value() {
        for (value, sweep) in [(0.0, 0.0), (115.0, 120.0), (230.0, 240.0)] {
            let scene = compose_at(value);
            let progress = scene
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::Arc { .. }))
                .nth(1)
                .unwrap();
            let DrawCommand::Arc {
                start_angle,
                sweep_angle,
                stroke,
                oval,
            } = progress
            else {
                unreachable!()
            };
            assert_eq!(*start_angle, 150.0);
            assert!((sweep_angle - sweep).abs() < 1e-9);
            assert!((stroke.width - 60.0).abs() < 1e-9);
            assert!(stroke.glow.is_none());
            assert!((oval.radius() - (150.0 - 1.0 - 10.0 + 5.0 - 30.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_readout_text() {
        let scene = compose_at(57.5);
        let texts: Vec<&str> = scene
            .commands()
            .iter()
            .rev()
            .take(2)
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["(km/h)", "57.5"]);
    }

    #[test]
    fn test_glow_ring_style() {
        let scene = compose_at(0.0);
        let DrawCommand::Arc {
            start_angle,
            sweep_angle,
            stroke,
            ..
        } = &scene.commands()[0]
        else {
            panic!("first command must be the glow arc");
        };
        assert_eq!(*start_angle, 150.0);
        assert_eq!(*sweep_angle, 240.0);
        assert_eq!(stroke.paint, Paint::Solid(palette::GLOW_ARC.with_alpha(70)));
        assert!(stroke.glow.is_some());
    }

    #[test]
    fn test_sweep_gradient_is_anchored_at_needle() {
        let paint = Paint::SweepGradient {
            center: Point::new(0.0, 0.0),
            start_angle: 270.0,
            stops: palette::SWEEP_STOPS.to_vec(),
        };
        assert_eq!(paint.color_at(270.0), palette::SWEEP_STOPS[0].1);
        // 0.9 of a turn clockwise from the needle is fully transparent
        assert_eq!(paint.color_at(270.0 + 324.0).a, 0);
        assert_eq!(paint.color_at(269.999_999).a, 0xaa);
    }
}
