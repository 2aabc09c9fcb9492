#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for robot replays.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The board is painted from a [`RetainedCanvas`] every frame. The control
//! panel on the right uses Macroquad's immediate-mode UI; all UI-specific
//! calls live inside the local `ui` module.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelWidgets};
use anyhow::Result;
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    shapes::{
        draw_circle, draw_circle_lines, draw_line, draw_rectangle, draw_rectangle_lines,
    },
    text::{draw_text, measure_text},
};
use robot_replay_rendering::{
    BoardGeometry, Canvas, CanvasObject, Color, ControlInput, FrameInput, PanelView,
    Presentation, RenderingBackend, RetainedCanvas, Shape, Style,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Height reserved for the widget window at the top of the control panel.
const WIDGET_WINDOW_HEIGHT: f32 = 200.0;
/// Vertical distance between two info lines.
const INFO_LINE_HEIGHT: f32 = 24.0;
/// Font size of info lines.
const INFO_FONT_SIZE: f32 = 22.0;

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct ControlPanelInputState {
    latched: Vec<ControlInput>,
}

impl ControlPanelInputState {
    /// Returns the controls latched since the last call, in arrival order,
    /// clearing the latch so each control fires once.
    pub fn take_controls(&mut self) -> Vec<ControlInput> {
        std::mem::take(&mut self.latched)
    }

    /// Records controls requested by the panel this frame.
    pub fn register<I>(&mut self, controls: I)
    where
        I: IntoIterator<Item = ControlInput>,
    {
        self.latched.extend(controls);
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the playback loop.
    quit_requested: bool,
    /// `Left` shows the previous turn.
    step_backward: bool,
    /// `Right` shows the next turn.
    step_forward: bool,
    /// `Space` toggles pause.
    toggle_pause: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            step_backward: is_key_pressed(KeyCode::Left),
            step_forward: is_key_pressed(KeyCode::Right),
            toggle_pause: is_key_pressed(KeyCode::Space),
        }
    }

    fn controls(self) -> impl Iterator<Item = ControlInput> {
        [
            (self.step_backward, ControlInput::StepBackward),
            (self.step_forward, ControlInput::StepForward),
            (self.toggle_pause, ControlInput::TogglePause),
        ]
        .into_iter()
        .filter_map(|(pressed, control)| pressed.then_some(control))
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    update: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    update_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_update: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.update_accum += breakdown.update;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_update: self.update_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.update_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

/// Tracks the board frame size and reports changes as resize controls.
///
/// The first observed size is always reported, standing in for the startup
/// configure event that playback discards.
#[derive(Clone, Copy, Debug, Default)]
struct FrameSizeTracker {
    last: Option<Vec2>,
}

impl FrameSizeTracker {
    fn observe(&mut self, frame: Vec2) -> Option<ControlInput> {
        if let Some(last) = self.last {
            if (frame - last).abs().max_element() < 0.5 {
                return None;
            }
        }
        self.last = Some(frame);
        Some(ControlInput::Resize {
            width: frame.x,
            height: frame.y,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut RetainedCanvas) -> PanelView + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let window_size = presentation.window_size();
        let Presentation {
            window_title,
            clear_color,
            panel_width,
            canvas,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window_size.x.round() as i32,
            window_height: window_size.y.round() as i32,
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut canvas = canvas;
            let background = to_macroquad_color(clear_color);
            let panel_background = to_macroquad_color(clear_color.lighten(0.08));
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();
            let mut frame_size = FrameSizeTracker::default();
            let mut view = update(Duration::ZERO, FrameInput::default(), &mut canvas);
            let mut widgets = ControlPanelWidgets {
                speed_offset: view.speed_offset,
                show_arrows: view.show_arrows,
            };

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let board = board_frame(screen, panel_width);

                let mut controls = control_panel_input.take_controls();
                controls.extend(keyboard.controls());
                controls.extend(board_click(board));
                controls.extend(frame_size.observe(board));

                let now = Duration::from_secs_f64(macroquad::time::get_time().max(0.0));
                let update_start = Instant::now();
                view = update(now, FrameInput { controls }, &mut canvas);
                let update_duration = update_start.elapsed();

                let render_start = Instant::now();
                paint_canvas(&canvas);
                draw_info_lines(&view, screen, panel_width, panel_background);
                let mut control_panel_ui = macroquad::ui::root_ui();
                control_panel_input.register(draw_control_panel_ui(
                    &mut control_panel_ui,
                    ControlPanelUiContext {
                        origin: macroquad::math::Vec2::new(screen.x - panel_width, 0.0),
                        size: macroquad::math::Vec2::new(panel_width, WIDGET_WINDOW_HEIGHT),
                        background: panel_background,
                        view: &view,
                    },
                    &mut widgets,
                ));
                let render_duration = render_start.elapsed();

                let frame_dt =
                    Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    update: update_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_update,
                        avg_render,
                    }) = fps_metrics
                    {
                        println!(
                            "FPS: {:.2} (10s avg: {:.2}) | update: {:>6.2}ms render: {:>6.2}ms",
                            per_second,
                            trailing_ten_seconds,
                            avg_update.as_secs_f64() * 1_000.0,
                            avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Area left of the control panel available to the board.
fn board_frame(screen: Vec2, panel_width: f32) -> Vec2 {
    Vec2::new((screen.x - panel_width).max(0.0), screen.y.max(0.0))
}

fn board_click(board: Vec2) -> Option<ControlInput> {
    if !is_mouse_button_pressed(MouseButton::Left) {
        return None;
    }
    let (x, y) = mouse_position();
    (x < board.x && y < board.y).then_some(ControlInput::Click(Vec2::new(x, y)))
}

fn paint_canvas(canvas: &RetainedCanvas) {
    let geometry = canvas.geometry();
    for (_, object) in canvas.paint_order() {
        match object {
            CanvasObject::Shape {
                position,
                shape,
                style,
                ..
            } => paint_shape(&geometry, *position, *shape, style),
            CanvasObject::Text {
                position,
                text,
                color,
            } => paint_text(&geometry, *position, text, *color),
            CanvasObject::Line {
                src,
                dst,
                offset,
                style,
                ..
            } => {
                let start = geometry.grid_to_pixel(*src) + *offset;
                let end = geometry.grid_to_pixel(*dst) + *offset;
                if let Some(color) = style.stroke.or(style.fill) {
                    draw_line(
                        start.x,
                        start.y,
                        end.x,
                        end.y,
                        style.width.max(1.0),
                        to_macroquad_color(color),
                    );
                }
            }
        }
    }
}

fn paint_shape(geometry: &BoardGeometry, position: Vec2, shape: Shape, style: &Style) {
    let corner = geometry.grid_to_pixel(position);
    let extent = geometry.cell_extent();
    match shape {
        Shape::Square => {
            if let Some(fill) = style.fill {
                draw_rectangle(corner.x, corner.y, extent, extent, to_macroquad_color(fill));
            }
            if let (Some(stroke), true) = (style.stroke, style.width > 0.0) {
                draw_rectangle_lines(
                    corner.x,
                    corner.y,
                    extent,
                    extent,
                    style.width,
                    to_macroquad_color(stroke),
                );
            }
        }
        Shape::Circle => {
            let radius = extent / 2.0;
            let centre = corner + Vec2::splat(radius);
            if let Some(fill) = style.fill {
                draw_circle(centre.x, centre.y, radius, to_macroquad_color(fill));
            }
            if let (Some(stroke), true) = (style.stroke, style.width > 0.0) {
                draw_circle_lines(
                    centre.x,
                    centre.y,
                    radius,
                    style.width,
                    to_macroquad_color(stroke),
                );
            }
        }
    }
}

fn paint_text(geometry: &BoardGeometry, position: Vec2, text: &str, color: Color) {
    let extent = geometry.cell_extent();
    let font_size = text_font_size(extent);
    let dimensions = measure_text(text, None, font_size, 1.0);
    let corner = geometry.grid_to_pixel(position);
    let x = corner.x + (extent - dimensions.width) / 2.0;
    let y = corner.y + (extent + dimensions.offset_y) / 2.0;
    draw_text(text, x, y, f32::from(font_size), to_macroquad_color(color));
}

/// Font size fitting a label inside a cell of `extent` pixels.
fn text_font_size(extent: f32) -> u16 {
    (extent * 0.6).clamp(8.0, 64.0).round() as u16
}

fn draw_info_lines(
    view: &PanelView,
    screen: Vec2,
    panel_width: f32,
    background: macroquad::color::Color,
) {
    let left = screen.x - panel_width;
    draw_rectangle(left, 0.0, panel_width, screen.y, background);
    for (index, line) in view.lines.iter().enumerate() {
        let y = WIDGET_WINDOW_HEIGHT + INFO_LINE_HEIGHT * (index as f32 + 1.0);
        draw_text(
            &line.text,
            left + 16.0,
            y,
            INFO_FONT_SIZE,
            to_macroquad_color(line.color),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
