// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod animation;
pub mod canvas;
pub mod config;
pub mod error;
pub mod geometry;
pub mod scene;
pub mod text;

// External crate imports
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, error, trace, warn};

// Standard library imports
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use animation::{Easing, ValueAnimator};
pub use canvas::Canvas;
pub use config::{Color, GaugeStyle, WindowConfig};
pub use error::{GaugeError, Result};
pub use geometry::{Layout, MeasureSpec, Padding, RangeState};
pub use scene::{DrawCommand, Scene};
pub use text::{format_value, GaugeFont, NoText, TextMeasure};

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Command enum for driving a gauge from another thread
#[derive(Debug, Clone, PartialEq)]
pub enum GaugeCommand {
    AnimateTo(f64),
    /// Position within the range, 0 to 100.
    SetPercent(f64),
    Configure {
        min_value: i32,
        max_value: i32,
        unit_label: String,
    },
}

type RedrawHook = Box<dyn FnMut()>;

/// Speedometer-style gauge widget.
///
/// The widget owns its style, range, layout and animation state. It never draws on
/// its own: the host calls [`tick`](Self::tick) from its frame loop and
/// [`draw`](Self::draw) whenever a redraw was requested through the hook installed
/// with [`on_redraw`](Self::on_redraw).
pub struct DashboardGauge {
    style: GaugeStyle,
    range: RangeState,
    padding: Padding,
    layout: Layout,
    animator: ValueAnimator,
    /// Whether the host has established a drawable size yet.
    sized: bool,
    redraw_hook: Option<RedrawHook>,
}

impl std::fmt::Debug for DashboardGauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardGauge")
            .field("style", &self.style)
            .field("range", &self.range)
            .field("layout", &self.layout)
            .field("animator", &self.animator)
            .finish_non_exhaustive()
    }
}

impl DashboardGauge {
    pub fn new(style: GaugeStyle) -> Result<Self> {
        style.validate()?;
        let padding = Padding::default();
        let (width, height) = geometry::measure(
            &style,
            padding,
            MeasureSpec::Unspecified,
            MeasureSpec::Unspecified,
        );
        Ok(Self {
            layout: Layout::new(width as f64, height as f64, padding, style.stroke_width),
            animator: ValueAnimator::new(style.animation_duration()).with_easing(style.easing),
            range: RangeState::default(),
            padding,
            style,
            sized: false,
            redraw_hook: None,
        })
    }

    pub fn style(&self) -> &GaugeStyle {
        &self.style
    }

    pub fn range(&self) -> &RangeState {
        &self.range
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn current_value(&self) -> f64 {
        self.animator.current_value()
    }

    pub fn target_value(&self) -> f64 {
        self.animator.target_value()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Installs the callback used to ask the host for a redraw.
    pub fn on_redraw(&mut self, hook: impl FnMut() + 'static) {
        self.redraw_hook = Some(Box::new(hook));
    }

    fn request_redraw(&mut self) {
        if let Some(hook) = self.redraw_hook.as_mut() {
            hook();
        }
    }

    /// Replaces the displayed range and unit. The current value is kept as is, even
    /// if it now falls outside the range.
    ///
    /// # Panics
    ///
    /// Panics unless `max_value > min_value`.
    pub fn configure(&mut self, min_value: i32, max_value: i32, unit_label: impl Into<String>) {
        self.range = RangeState::new(min_value, max_value, unit_label);
        debug!(
            min_value,
            max_value,
            unit = self.range.unit_label(),
            "gauge range configured"
        );
        self.request_redraw();
    }

    pub fn animate_to(&mut self, value: f64) {
        self.animate_to_at(value, Instant::now());
    }

    /// Starts a tween from the live value towards `value`, dropping any tween in
    /// flight.
    pub fn animate_to_at(&mut self, value: f64, now: Instant) {
        debug!(
            from = self.animator.current_value(),
            to = value,
            "gauge animation started"
        );
        self.animator.animate_to(value, now);
        self.request_redraw();
    }

    /// Animates to a position given as a percentage of the range.
    pub fn set_percent(&mut self, percent: f64) {
        self.animate_to(self.range.value_for_percent(percent));
    }

    pub fn apply(&mut self, command: GaugeCommand) {
        match command {
            GaugeCommand::AnimateTo(value) => self.animate_to(value),
            GaugeCommand::SetPercent(percent) => self.set_percent(percent),
            GaugeCommand::Configure {
                min_value,
                max_value,
                unit_label,
            } => self.configure(min_value, max_value, unit_label),
        }
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding;
        if self.sized {
            self.relayout(self.layout.width, self.layout.height);
        } else {
            let (width, height) =
                self.measure(MeasureSpec::Unspecified, MeasureSpec::Unspecified);
            self.relayout(width as f64, height as f64);
        }
    }

    /// Size this gauge would like within the host's constraints.
    pub fn measure(&self, width_spec: MeasureSpec, height_spec: MeasureSpec) -> (u32, u32) {
        geometry::measure(&self.style, self.padding, width_spec, height_spec)
    }

    /// Called by the host whenever the drawable area is (re)established.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.sized = true;
        if width != self.layout.width || height != self.layout.height {
            self.relayout(width, height);
        }
    }

    fn relayout(&mut self, width: f64, height: f64) {
        let layout = Layout::new(width, height, self.padding, self.style.stroke_width);
        if layout != self.layout {
            self.layout = layout;
            debug!(
                width,
                height,
                radius = layout.effective_radius,
                "gauge layout changed"
            );
            self.request_redraw();
        }
    }

    /// Advances the animation to `now`; requests a redraw when the value changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.animator.tick(now) {
            return false;
        }
        let value = self.animator.current_value();
        if self.animator.is_animating() {
            trace!(value, "gauge tick");
        } else {
            debug!(value, "gauge animation finished");
        }
        self.request_redraw();
        true
    }

    /// Draw commands for the current state.
    pub fn scene(&self, measure: &dyn TextMeasure) -> Scene {
        scene::compose(
            &scene::Frame {
                style: &self.style,
                range: &self.range,
                layout: &self.layout,
                value: self.animator.current_value(),
            },
            measure,
        )
    }

    /// Renders the current state. Without a font only the text is left out.
    pub fn draw(&self, canvas: &mut Canvas) {
        let scene = match canvas.font() {
            Some(font) => self.scene(font),
            None => self.scene(&NoText),
        };
        canvas.render(&scene);
    }

    // ========================================================================
    // WINDOWED HOST
    // ========================================================================

    pub fn show(&mut self, font: &GaugeFont, window: &WindowConfig) -> Result<()> {
        self.run_window(font, window, None)
    }

    pub fn show_with_commands(
        &mut self,
        font: &GaugeFont,
        window: &WindowConfig,
        receiver: Receiver<GaugeCommand>,
    ) -> Result<()> {
        self.run_window(font, window, Some(receiver))
    }

    fn run_window(
        &mut self,
        font: &GaugeFont,
        config: &WindowConfig,
        receiver: Option<Receiver<GaugeCommand>>,
    ) -> Result<()> {
        let frame_duration = config.frame_duration()?;
        let event_loop = EventLoop::new().map_err(|e| GaugeError::Window(e.to_string()))?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
            .build(&event_loop)
            .map_err(|e| GaugeError::Window(e.to_string()))?;

        let window = Arc::new(window);
        let hook_window = window.clone();
        self.on_redraw(move || hook_window.request_redraw());

        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)
            .map_err(|e| GaugeError::Surface(e.to_string()))?;
        self.resize(fb_width as f64, fb_height as f64);

        let mut last_frame = Instant::now();
        let background = config.background;
        let gauge = &mut *self;

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                            warn!(error = %e, "failed to resize frame buffer");
                        }
                        if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                            warn!(error = %e, "failed to resize surface");
                        }
                        gauge.resize(fb_width as f64, fb_height as f64);
                    }
                    WindowEvent::RedrawRequested => {
                        let mut canvas =
                            Canvas::new(pixels.frame_mut(), fb_width, fb_height, Some(font));
                        canvas.clear(background);
                        gauge.draw(&mut canvas);
                        if let Err(e) = pixels.render() {
                            error!(error = %e, "render failed");
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if let Some(ref receiver) = receiver {
                        while let Ok(command) = receiver.try_recv() {
                            gauge.apply(command);
                        }
                    }
                    if last_frame.elapsed() >= frame_duration {
                        last_frame = Instant::now();
                        gauge.tick(last_frame);
                    }
                }
                _ => {}
            }
        })
        .map_err(|e| GaugeError::Window(e.to_string()))?;

        // the window is gone; nothing left to notify
        self.redraw_hook = None;
        Ok(())
    }
}
