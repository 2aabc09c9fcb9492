#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for robot replay adapters.
//!
//! Playback code owns *when* to draw *what*; it talks to the drawing surface
//! exclusively through the retained-mode [`Canvas`] trait. Every object placed
//! on a canvas is identified by an [`ObjectHandle`] that stays valid until it
//! is explicitly removed or the canvas is cleared. Positions are expressed in
//! board cell units; [`BoardGeometry`] maps them to pixels.

mod retained;

use anyhow::Result as AnyResult;
use glam::Vec2;
use robot_replay_core::{CellCoord, Rgb};
use std::{error::Error, fmt, time::Duration};

pub use retained::{CanvasObject, RetainedCanvas};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Moves every channel `amount` of the way toward white, keeping alpha.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let lift = |channel: f32| channel + (1.0 - channel) * amount;
        Self {
            red: lift(self.red),
            green: lift(self.green),
            blue: lift(self.blue),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::from_rgb_u8(rgb.red(), rgb.green(), rgb.blue())
    }
}

/// Opaque identifier of an object placed on a [`Canvas`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Creates a handle from its raw value. Only canvases mint handles.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the raw value of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Integer ordering hint; higher layers are painted above lower ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(u8);

impl Layer {
    /// Board cells.
    pub const BACKGROUND: Self = Self(1);
    /// Robot bodies.
    pub const ROBOTS: Self = Self(2);
    /// Selection highlight and its target.
    pub const HIGHLIGHT: Self = Self(3);
    /// Attack and suicide markers.
    pub const EFFECTS: Self = Self(4);
    /// Movement and targeting arrows.
    pub const ARROWS: Self = Self(5);
    /// Every text object.
    pub const TEXT: Self = Self(9);

    /// Creates a custom layer.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }
}

/// Outline of a grid object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Axis-aligned square covering the cell.
    Square,
    /// Circle inscribed in the cell.
    Circle,
}

/// Paint parameters shared by grid objects and lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    /// Interior color, if the object is filled.
    pub fill: Option<Color>,
    /// Outline or line color.
    pub stroke: Option<Color>,
    /// Outline or line thickness in pixels; zero disables outlines.
    pub width: f32,
}

impl Style {
    /// Borderless fill.
    #[must_use]
    pub const fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            width: 0.0,
        }
    }

    /// Stroke of the provided thickness without fill.
    #[must_use]
    pub const fn stroked(color: Color, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            width,
        }
    }
}

/// Retained-mode drawing surface addressed in board cell units.
///
/// Objects on the same layer are painted in creation order. Newly created
/// objects are painted on top until [`Canvas::raise_layers`] restores strict
/// layer ordering.
pub trait Canvas {
    /// Places a cell-sized shape whose top-left corner sits at `position`.
    fn draw_grid_object(
        &mut self,
        position: Vec2,
        shape: Shape,
        layer: Layer,
        style: Style,
    ) -> ObjectHandle;

    /// Places text centred in the cell whose top-left corner sits at `position`.
    fn draw_text(&mut self, position: Vec2, text: &str, color: Color) -> ObjectHandle;

    /// Places a line between two cell corners shifted by a pixel `offset`.
    fn draw_line(
        &mut self,
        src: Vec2,
        dst: Vec2,
        offset: Vec2,
        layer: Layer,
        style: Style,
    ) -> ObjectHandle;

    /// Deletes an object. Unknown handles are ignored.
    fn remove_object(&mut self, handle: ObjectHandle);

    /// Deletes every object.
    fn clear(&mut self);

    /// Reapplies strict layer ordering to every live object.
    fn raise_layers(&mut self);

    /// Updates the mapping between cell units and pixels.
    fn configure(&mut self, geometry: BoardGeometry);

    /// Current mapping between cell units and pixels.
    fn geometry(&self) -> BoardGeometry;
}

/// Pixel layout of a square board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardGeometry {
    board_size: u32,
    cell_size: f32,
    margin: f32,
    border_width: f32,
}

impl BoardGeometry {
    /// Creates a new board layout.
    ///
    /// Returns an error when the board has no cells or the cell size is not positive.
    pub fn new(
        board_size: u32,
        cell_size: f32,
        margin: f32,
        border_width: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if board_size == 0 {
            return Err(RenderingError::EmptyBoard);
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            board_size,
            cell_size,
            margin: margin.max(0.0),
            border_width: border_width.max(0.0),
        })
    }

    /// Number of cells along each board edge.
    #[must_use]
    pub const fn board_size(&self) -> u32 {
        self.board_size
    }

    /// Side length of a cell including its border, in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total margin around the board, in pixels.
    #[must_use]
    pub const fn margin(&self) -> f32 {
        self.margin
    }

    /// Side length of the painted part of a cell, in pixels.
    #[must_use]
    pub fn cell_extent(&self) -> f32 {
        (self.cell_size - self.border_width).max(1.0)
    }

    /// Side length of the whole board including its margin, in pixels.
    #[must_use]
    pub fn board_pixels(&self) -> f32 {
        self.cell_size * self.board_size as f32 + self.margin
    }

    /// Pixel position of the top-left corner of a point in cell units.
    #[must_use]
    pub fn grid_to_pixel(&self, position: Vec2) -> Vec2 {
        position * self.cell_size + Vec2::splat(self.margin / 2.0)
    }

    /// Board cell under a pixel position, if the position lies on the board.
    #[must_use]
    pub fn pixel_to_cell(&self, pixel: Vec2) -> Option<CellCoord> {
        let cell = (pixel - Vec2::splat(self.margin / 2.0)) / self.cell_size;
        if !(cell.x >= 0.0 && cell.y >= 0.0) {
            return None;
        }

        let column = cell.x.floor() as u32;
        let row = cell.y.floor() as u32;
        let coord = CellCoord::new(column, row);
        coord.is_within(self.board_size).then_some(coord)
    }
}

/// User controls surfaced by adapters, applied synchronously between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlInput {
    /// Show the previous turn.
    StepBackward,
    /// Show the next turn.
    StepForward,
    /// Rewind to the first turn.
    Restart,
    /// Flip between playing and paused.
    TogglePause,
    /// Move the speed slider; positive values play faster.
    SetSpeedOffset(f32),
    /// Enable or disable movement arrows.
    SetShowArrows(bool),
    /// Left click at a pixel position relative to the board canvas.
    Click(Vec2),
    /// The board frame changed size, in pixels.
    Resize {
        /// Available width.
        width: f32,
        /// Available height.
        height: f32,
    },
}

/// Input gathered by adapters during a single frame, in arrival order.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Controls triggered since the previous frame.
    pub controls: Vec<ControlInput>,
}

/// A single colored line of the info panel.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoLine {
    /// Text shown on the line.
    pub text: String,
    /// Text color.
    pub color: Color,
}

/// Control panel state presented next to the board.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelView {
    /// Score, turn and selection lines.
    pub lines: Vec<InfoLine>,
    /// Whether playback is paused, used for the play/stop button label.
    pub paused: bool,
    /// Current speed slider position.
    pub speed_offset: f32,
    /// Largest magnitude accepted by the speed slider.
    pub speed_range: f32,
    /// Whether movement arrows are shown.
    pub show_arrows: bool,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Width of the control panel on the right of the board, in pixels.
    pub panel_width: f32,
    /// Canvas holding the initial frame; its geometry sizes the window.
    pub canvas: RetainedCanvas,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(
        window_title: T,
        clear_color: Color,
        panel_width: f32,
        canvas: RetainedCanvas,
    ) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            panel_width,
            canvas,
        }
    }

    /// Window size fitting the board and the control panel side by side.
    #[must_use]
    pub fn window_size(&self) -> Vec2 {
        let board = self.canvas.geometry().board_pixels();
        Vec2::new(board + self.panel_width.max(0.0), board)
    }
}

/// Rendering backend capable of presenting replay playback.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update` closure receives the wall-clock time since the
    /// backend started, the input captured during the frame, and the canvas
    /// it may mutate; it returns the control panel to display.
    fn run<F>(self, presentation: Presentation, update: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut RetainedCanvas) -> PanelView + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The board must contain at least one cell.
    EmptyBoard,
    /// Cell size must be positive to keep objects visible.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBoard => write!(f, "board must contain at least one cell"),
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_degenerate_boards_without_panicking() {
        assert_eq!(
            BoardGeometry::new(0, 10.0, 0.0, 2.0),
            Err(RenderingError::EmptyBoard)
        );
        assert!(matches!(
            BoardGeometry::new(19, 0.0, 0.0, 2.0),
            Err(RenderingError::InvalidCellSize { .. })
        ));
    }

    #[test]
    fn grid_to_pixel_applies_half_margin() {
        let geometry = BoardGeometry::new(10, 20.0, 8.0, 2.0).expect("valid geometry");

        assert_eq!(geometry.grid_to_pixel(Vec2::new(2.0, 3.0)), Vec2::new(44.0, 64.0));
        assert_eq!(geometry.cell_extent(), 18.0);
        assert_eq!(geometry.board_pixels(), 208.0);
    }

    #[test]
    fn pixel_to_cell_inverts_grid_to_pixel() {
        let geometry = BoardGeometry::new(10, 20.0, 8.0, 2.0).expect("valid geometry");
        let corner = geometry.grid_to_pixel(Vec2::new(7.0, 2.0));

        assert_eq!(
            geometry.pixel_to_cell(corner + Vec2::splat(5.0)),
            Some(CellCoord::new(7, 2))
        );
    }

    #[test]
    fn pixel_to_cell_rejects_positions_outside_board() {
        let geometry = BoardGeometry::new(10, 20.0, 0.0, 2.0).expect("valid geometry");

        assert_eq!(geometry.pixel_to_cell(Vec2::new(-1.0, 5.0)), None);
        assert_eq!(geometry.pixel_to_cell(Vec2::new(5.0, 200.0)), None);
        assert_eq!(geometry.pixel_to_cell(Vec2::new(f32::NAN, 5.0)), None);
    }

    #[test]
    fn window_fits_board_and_panel() {
        let geometry = BoardGeometry::new(19, 30.0, 0.0, 2.0).expect("valid geometry");
        let presentation = Presentation::new(
            "replay",
            Color::from_rgb_u8(0, 0, 0),
            220.0,
            RetainedCanvas::new(geometry),
        );

        assert_eq!(presentation.window_size(), Vec2::new(790.0, 570.0));
    }

    #[test]
    fn color_from_rgb_normalises_channels() {
        let color = Color::from(Rgb::new(255, 0, 51));
        assert_eq!(color, Color::new(1.0, 0.0, 0.2, 1.0));
        assert_eq!(color.with_alpha(2.0).alpha, 1.0);
        assert_eq!(Color::new(0.0, 0.5, 1.0, 0.5).lighten(0.5), Color::new(0.5, 0.75, 1.0, 0.5));
    }
}
