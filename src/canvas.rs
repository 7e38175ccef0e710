//! Software rasteriser that executes a [`Scene`] into an RGBA frame buffer.

use crate::config::Color;
use crate::geometry::{Point, Rect};
use crate::scene::{DrawCommand, Fill, Glow, Scene, Stroke, TextStyle};
use crate::text::{GaugeFont, TextMeasure};

/// Host-provided drawing context: a borrowed RGBA8 frame plus the font to draw with.
/// Text commands are skipped when there is no font.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    font: Option<&'a GaugeFont>,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize, font: Option<&'a GaugeFont>) -> Self {
        // never index past the buffer, even if it lags behind a resize
        let height = height.min(frame.len() / (width * 4).max(1));
        Self {
            frame,
            width,
            height,
            font,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn font(&self) -> Option<&'a GaugeFont> {
        self.font
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    pub fn render(&mut self, scene: &Scene) {
        for command in scene.commands() {
            match command {
                DrawCommand::Arc {
                    oval,
                    start_angle,
                    sweep_angle,
                    stroke,
                } => self.stroke_arc(oval, *start_angle, *sweep_angle, stroke),
                DrawCommand::Line {
                    from,
                    to,
                    thickness,
                    color,
                } => self.draw_thick_line_aa(*from, *to, *thickness, *color),
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                } => self.fill_circle(*center, *radius, fill),
                DrawCommand::Polygon { points, fill } => self.fill_polygon(points, fill),
                DrawCommand::Text {
                    anchor,
                    text,
                    style,
                } => self.draw_text(*anchor, text, style),
            }
        }
    }

    // ========================================================================
    // DRAWING PRIMITIVES
    // ========================================================================

    fn set_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let alpha = (color.a as f64 / 255.0) * coverage.clamp(0.0, 1.0);
        if alpha <= 0.001 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let blend = |src: u8, dst: u8| (src as f64 * alpha + dst as f64 * (1.0 - alpha)).round() as u8;
        self.frame[idx] = blend(color.r, self.frame[idx]);
        self.frame[idx + 1] = blend(color.g, self.frame[idx + 1]);
        self.frame[idx + 2] = blend(color.b, self.frame[idx + 2]);
        self.frame[idx + 3] = 0xff;
    }

    /// Pixel indices from `min` to `max`, clipped to `0..limit`.
    fn span(&self, min: f64, max: f64, limit: usize) -> std::ops::RangeInclusive<i32> {
        let lo = (min.floor() as i32).max(0);
        let hi = (max.ceil() as i32).min(limit as i32 - 1);
        lo..=hi
    }

    fn draw_thick_line_aa(&mut self, from: Point, to: Point, thickness: f32, color: Color) {
        let pad = thickness as f64 + 1.0;
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len_sq = (dx * dx + dy * dy).max(f64::EPSILON);
        let half = thickness as f64 / 2.0;
        for y in self.span(from.y.min(to.y) - pad, from.y.max(to.y) + pad, self.height) {
            for x in self.span(from.x.min(to.x) - pad, from.x.max(to.x) + pad, self.width) {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let t = (((px - from.x) * dx + (py - from.y) * dy) / len_sq).clamp(0.0, 1.0);
                let (lx, ly) = (from.x + t * dx, from.y + t * dy);
                let dist = ((lx - px).powi(2) + (ly - py).powi(2)).sqrt();
                let aa = (half + 0.5 - dist).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.set_pixel(x, y, color, aa);
                }
            }
        }
    }

    fn glow_coverage(glow: &Glow, distance_outside: f64) -> f64 {
        if distance_outside <= 0.0 || distance_outside >= glow.radius {
            return 0.0;
        }
        let falloff = 1.0 - distance_outside / glow.radius;
        falloff * falloff * 0.6
    }

    fn fill_circle(&mut self, center: Point, radius: f64, fill: &Fill) {
        let reach = radius + fill.glow.map(|g| g.radius).unwrap_or(0.0) + 1.0;
        let ys = self.span(center.y - reach, center.y + reach, self.height);
        let xs = self.span(center.x - reach, center.x + reach, self.width);

        if let Some(glow) = fill.glow {
            for y in ys.clone() {
                for x in xs.clone() {
                    let dist = (x as f64 + 0.5 - center.x).hypot(y as f64 + 0.5 - center.y);
                    let coverage = Self::glow_coverage(&glow, dist - radius);
                    if coverage > 0.0 {
                        self.set_pixel(x, y, glow.color, coverage);
                    }
                }
            }
        }

        for y in ys {
            for x in xs.clone() {
                let dist = (x as f64 + 0.5 - center.x).hypot(y as f64 + 0.5 - center.y);
                let aa = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if aa > 0.0 {
                    self.set_pixel(x, y, fill.color, aa);
                }
            }
        }
    }

    fn stroke_arc(&mut self, oval: &Rect, start_angle: f64, sweep_angle: f64, stroke: &Stroke) {
        // a negative sweep runs counter-clockwise
        let (start, sweep) = if sweep_angle < 0.0 {
            (start_angle + sweep_angle, -sweep_angle)
        } else {
            (start_angle, sweep_angle)
        };
        if sweep <= 0.0 {
            return;
        }
        let sweep = sweep.min(360.0);
        let center = oval.center();
        let radius = oval.radius();
        let half = stroke.width / 2.0;
        let reach = radius + half + stroke.glow.map(|g| g.radius).unwrap_or(0.0) + 1.0;
        let ys = self.span(center.y - reach, center.y + reach, self.height);
        let xs = self.span(center.x - reach, center.x + reach, self.width);

        let in_arc = |angle: f64| (angle - start).rem_euclid(360.0) <= sweep;

        if let Some(glow) = stroke.glow {
            for y in ys.clone() {
                for x in xs.clone() {
                    let (dx, dy) = (x as f64 + 0.5 - center.x, y as f64 + 0.5 - center.y);
                    if !in_arc(dy.atan2(dx).to_degrees()) {
                        continue;
                    }
                    let outside = (dx.hypot(dy) - radius).abs() - half;
                    let coverage = Self::glow_coverage(&glow, outside);
                    if coverage > 0.0 {
                        self.set_pixel(x, y, glow.color, coverage);
                    }
                }
            }
        }

        for y in ys {
            for x in xs.clone() {
                let (dx, dy) = (x as f64 + 0.5 - center.x, y as f64 + 0.5 - center.y);
                let angle = dy.atan2(dx).to_degrees();
                if !in_arc(angle) {
                    continue;
                }
                let aa = (half + 0.5 - (dx.hypot(dy) - radius).abs()).clamp(0.0, 1.0);
                if aa > 0.0 {
                    self.set_pixel(x, y, stroke.paint.color_at(angle), aa);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) {
        if points.len() < 3 {
            return;
        }
        let (min_x, max_x, min_y, max_y) = points.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(min_x, max_x, min_y, max_y), p| {
                (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
            },
        );
        // 2x2 supersampling for the edges
        const SAMPLES: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];
        for y in self.span(min_y, max_y, self.height) {
            for x in self.span(min_x, max_x, self.width) {
                let hits = SAMPLES
                    .iter()
                    .filter(|(sx, sy)| contains(points, x as f64 + sx, y as f64 + sy))
                    .count();
                if hits > 0 {
                    self.set_pixel(x, y, fill.color, hits as f64 / SAMPLES.len() as f64);
                }
            }
        }
    }

    fn draw_text(&mut self, anchor: Point, text: &str, style: &TextStyle) {
        let Some(font) = self.font else {
            return;
        };
        let origin = text_origin(anchor, font.text_width(text, style.size));
        let glyphs = font.layout(text, style.size, origin.x as f32, origin.y as f32);
        // fake bold: overdraw one pixel to the right
        let passes: &[i32] = if style.bold { &[0, 1] } else { &[0] };
        for &shift in passes {
            for glyph in &glyphs {
                if let Some(bb) = glyph.pixel_bounding_box() {
                    glyph.draw(|gx, gy, v| {
                        self.set_pixel(
                            bb.min.x + gx as i32 + shift,
                            bb.min.y + gy as i32,
                            style.color,
                            v as f64,
                        );
                    });
                }
            }
        }
    }
}

/// Left end of the baseline for text of `width` centred on `anchor`.
fn text_origin(anchor: Point, width: f64) -> Point {
    Point::new(anchor.x - width / 2.0, anchor.y)
}

/// Even-odd point-in-polygon test.
fn contains(points: &[Point], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::palette;
    use crate::scene::Paint;

    const BLACK: Color = Color::new(0, 0, 0);

    fn blank(width: usize, height: usize) -> Vec<u8> {
        let mut frame = vec![0u8; width * height * 4];
        Canvas::new(&mut frame, width, height, None).clear(BLACK);
        frame
    }

    fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    /// Pixel on the circle of `radius` around (150, 150) at `angle` degrees.
    fn on_ring(frame: &[u8], radius: f64, angle: f64) -> [u8; 4] {
        let p = Point::new(150.0, 150.0).polar(radius, angle);
        pixel(frame, 300, p.x.floor() as usize, p.y.floor() as usize)
    }

    fn ring_arc(start_angle: f64, sweep_angle: f64, paint: Paint) -> Scene {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Arc {
            oval: Rect::square(Point::new(150.0, 150.0), 100.0),
            start_angle,
            sweep_angle,
            stroke: Stroke {
                width: 20.0,
                paint,
                glow: None,
            },
        });
        scene
    }

    #[test]
    fn test_short_buffer_clamps_height() {
        let mut frame = vec![0u8; 10 * 5 * 4];
        let mut canvas = Canvas::new(&mut frame, 10, 20, None);
        assert_eq!(canvas.height(), 5);

        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Circle {
            center: Point::new(5.0, 15.0),
            radius: 10.0,
            fill: Fill {
                color: Color::WHITE,
                glow: None,
            },
        });
        canvas.render(&scene);
    }

    #[test]
    fn test_set_pixel_blends_alpha_and_coverage() {
        let mut frame = blank(4, 4);
        {
            let mut canvas = Canvas::new(&mut frame, 4, 4, None);
            canvas.set_pixel(1, 1, Color::WHITE.with_alpha(128), 1.0);
            canvas.set_pixel(2, 1, Color::WHITE, 0.25);
            canvas.set_pixel(3, 1, Color::TRANSPARENT, 1.0);
            // out of bounds is ignored
            canvas.set_pixel(-1, 0, Color::WHITE, 1.0);
            canvas.set_pixel(4, 0, Color::WHITE, 1.0);
        }
        assert_eq!(pixel(&frame, 4, 1, 1), [128, 128, 128, 255]);
        assert_eq!(pixel(&frame, 4, 2, 1), [64, 64, 64, 255]);
        assert_eq!(pixel(&frame, 4, 3, 1), [0, 0, 0, 255]);
        assert_eq!(pixel(&frame, 4, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_filled_circle() {
        let mut frame = blank(20, 20);
        let red = Color::new(255, 0, 0);
        Canvas::new(&mut frame, 20, 20, None).fill_circle(
            Point::new(10.0, 10.0),
            5.0,
            &Fill {
                color: red,
                glow: None,
            },
        );
        assert_eq!(pixel(&frame, 20, 10, 10), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 20, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_glow_fades_with_distance() {
        let mut frame = blank(60, 60);
        Canvas::new(&mut frame, 60, 60, None).fill_circle(
            Point::new(30.5, 30.5),
            10.0,
            &Fill {
                color: Color::new(255, 0, 0),
                glow: Some(Glow {
                    radius: 10.0,
                    color: Color::WHITE,
                }),
            },
        );
        let green = |x| pixel(&frame, 60, x, 30)[1];
        // the fill covers its own glow
        assert_eq!(pixel(&frame, 60, 30, 30), [255, 0, 0, 255]);
        assert!(green(42) > green(46));
        assert!(green(46) > 0);
        assert_eq!(green(52), 0);
    }

    #[test]
    fn test_arc_stays_within_sweep() {
        let mut frame = blank(300, 300);
        Canvas::new(&mut frame, 300, 300, None).render(&ring_arc(
            150.0,
            120.0,
            Paint::Solid(Color::WHITE),
        ));
        for angle in [160.0, 200.0, 260.0] {
            assert_eq!(on_ring(&frame, 100.0, angle), [255, 255, 255, 255], "{angle}");
        }
        for angle in [280.0, 350.0, 90.0] {
            assert_eq!(on_ring(&frame, 100.0, angle), [0, 0, 0, 255], "{angle}");
        }
        // off the ring inside the sweep
        assert_eq!(on_ring(&frame, 60.0, 200.0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_negative_sweep_runs_counter_clockwise() {
        let mut frame = blank(300, 300);
        Canvas::new(&mut frame, 300, 300, None).render(&ring_arc(
            150.0,
            -30.0,
            Paint::Solid(Color::WHITE),
        ));
        assert_eq!(on_ring(&frame, 100.0, 130.0), [255, 255, 255, 255]);
        assert_eq!(on_ring(&frame, 100.0, 160.0), [0, 0, 0, 255]);
        assert_eq!(on_ring(&frame, 100.0, 110.0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_sweep_gradient_brightest_behind_needle() {
        let mut frame = blank(300, 300);
        let gradient = Paint::SweepGradient {
            center: Point::new(150.0, 150.0),
            start_angle: 270.0,
            stops: palette::SWEEP_STOPS.to_vec(),
        };
        Canvas::new(&mut frame, 300, 300, None).render(&ring_arc(150.0, 120.0, gradient));

        let green = |angle| on_ring(&frame, 100.0, angle)[1];
        assert!(green(265.0) > green(160.0));
        assert!(green(160.0) > 0);
        // past the needle nothing is painted
        assert_eq!(green(275.0), 0);
    }

    #[test]
    fn test_text_needs_a_font() {
        let mut frame = blank(40, 40);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Text {
            anchor: Point::new(20.0, 20.0),
            text: "115".to_string(),
            style: TextStyle {
                size: 22.0,
                color: Color::WHITE,
                bold: true,
            },
        });
        Canvas::new(&mut frame, 40, 40, None).render(&scene);
        assert!(frame.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_text_origin_is_centred() {
        assert_eq!(
            text_origin(Point::new(100.0, 50.0), 40.0),
            Point::new(80.0, 50.0)
        );
    }

    #[test]
    fn test_contains_kite() {
        let kite = [
            Point::new(10.0, 0.0),
            Point::new(0.0, -3.0),
            Point::new(-4.0, 0.0),
            Point::new(0.0, 3.0),
        ];
        assert!(contains(&kite, 0.0, 0.0));
        assert!(contains(&kite, 8.0, 0.1));
        assert!(!contains(&kite, 0.0, 4.0));
        assert!(!contains(&kite, 11.0, 0.0));
        assert!(!contains(&kite, -5.0, 0.0));
    }
}
