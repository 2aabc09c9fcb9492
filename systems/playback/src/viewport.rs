//! Board layout derived from the frame size, with debounced resizes.

use glam::Vec2;
use robot_replay_core::{CellCoord, Settings};
use robot_replay_rendering::{
    BoardGeometry, Canvas, Color, Layer, RenderingError, Shape, Style,
};

/// Owns the frame size and turns it into a board layout on demand.
#[derive(Clone, Debug)]
pub struct ViewportController {
    frame: Vec2,
    pending: bool,
    settled: bool,
    board_size: u32,
    min_board_pixels: f32,
    margin: f32,
    border_width: f32,
}

impl ViewportController {
    /// Creates a controller for a frame of `frame` pixels.
    #[must_use]
    pub fn new(settings: &Settings, frame: Vec2) -> Self {
        Self {
            frame,
            pending: false,
            settled: false,
            board_size: settings.board_size,
            min_board_pixels: settings.min_board_pixels,
            margin: settings.board_margin,
            border_width: settings.cell_border_width,
        }
    }

    /// Current frame size in pixels.
    #[must_use]
    pub const fn frame(&self) -> Vec2 {
        self.frame
    }

    /// Whether a resize is waiting for the next tick.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Records a new frame size; the layout is recomputed on a later tick.
    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.frame = Vec2::new(width, height);
        self.pending = true;
        log::debug!("frame resized to {width}x{height}");
    }

    /// Consumes the pending flag and reports whether a recompute is due.
    ///
    /// The first pending resize after construction is swallowed, since the
    /// initial layout already matches the frame the backend reports first.
    pub fn take_pending(&mut self) -> bool {
        if !std::mem::take(&mut self.pending) {
            return false;
        }
        if !self.settled {
            self.settled = true;
            log::debug!("ignoring initial resize");
            return false;
        }
        true
    }

    /// Side length of the square board area for the current frame.
    ///
    /// Frames smaller than the configured minimum are clamped up to it.
    #[must_use]
    pub fn board_pixels(&self) -> f32 {
        let available = self.frame.x.min(self.frame.y);
        if available.is_finite() {
            available.max(self.min_board_pixels)
        } else {
            self.min_board_pixels
        }
    }

    /// Layout for the current frame.
    pub fn compute_geometry(&self) -> Result<BoardGeometry, RenderingError> {
        let cell_size = (self.board_pixels() - self.margin) / self.board_size.max(1) as f32;
        BoardGeometry::new(self.board_size, cell_size, self.margin, self.border_width)
    }

    /// Clears the canvas, applies the current layout and redraws the static
    /// background.
    ///
    /// A layout that cannot be computed keeps the canvas geometry unchanged.
    pub fn recompute(&self, settings: &Settings, canvas: &mut dyn Canvas) {
        canvas.clear();
        match self.compute_geometry() {
            Ok(geometry) => {
                log::debug!(
                    "board laid out at {} px per cell",
                    geometry.cell_size()
                );
                canvas.configure(geometry);
            }
            Err(error) => log::warn!("keeping previous board layout: {error}"),
        }
        draw_background(settings, canvas);
    }
}

/// Paints every board cell and the coordinate labels along the top row and
/// left column.
fn draw_background(settings: &Settings, canvas: &mut dyn Canvas) {
    for row in 0..settings.board_size {
        for column in 0..settings.board_size {
            let cell = CellCoord::new(column, row);
            let _ = canvas.draw_grid_object(
                Vec2::new(column as f32, row as f32),
                Shape::Square,
                Layer::BACKGROUND,
                Style::filled(Color::from(settings.cell_color(cell))),
            );
        }
    }

    let text_color = Color::from(settings.text_color);
    for index in 0..settings.board_size {
        let label = index.to_string();
        let _ = canvas.draw_text(Vec2::new(index as f32, 0.0), &label, text_color);
        if index > 0 {
            let _ = canvas.draw_text(Vec2::new(0.0, index as f32), &label, text_color);
        }
    }
}
