use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, MapConfig, PlayerId, Rgb};

/// Fraction of a robot's color that is washed out once all hit points are lost.
const HP_LIGHTEN_RANGE: f32 = 0.6;

/// Shape used to draw robot bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotShape {
    /// Robots fill their cell as squares.
    Square,
    /// Robots are drawn as circles inscribed in their cell.
    Circle,
}

/// Immutable presentation settings for a playback session.
///
/// Every field has a default supplied by [`Settings::default`]; settings
/// files only need to list the values they override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of cells along each board edge.
    pub board_size: u32,
    /// Cells drawn with the obstacle color.
    pub obstacles: BTreeSet<CellCoord>,
    /// Fill color of ordinary board cells.
    pub normal_color: Rgb,
    /// Fill color of obstacle cells.
    pub obstacle_color: Rgb,
    /// Color of coordinate labels and robot hit point labels.
    pub text_color: Rgb,
    /// Fill color of the highlighted cell.
    pub highlight_color: Rgb,
    /// Fill color of the highlighted robot's action target.
    pub target_color: Rgb,
    /// Base color of each player's robots.
    pub player_colors: [Rgb; PlayerId::COUNT],
    /// Display names of both players.
    pub names: [String; PlayerId::COUNT],
    /// Hit points of an undamaged robot.
    pub max_hp: u32,
    /// Base duration of a single turn in milliseconds.
    pub turn_interval_ms: u32,
    /// Shortest turn duration reachable through the speed control.
    pub min_turn_interval_ms: u32,
    /// Target number of scheduler ticks per second.
    pub fps: u32,
    /// Interpolates between turns when enabled; steps discretely otherwise.
    pub animations: bool,
    /// Whether the highlight cursor blinks.
    pub highlight_cursor_blink: bool,
    /// Visible portion of every blink period, in milliseconds.
    pub highlight_cursor_blink_interval_ms: u32,
    /// Length of a full blink period, in milliseconds.
    pub rate_cursor_blink_ms: u32,
    /// Clears the highlighted cell whenever the turn changes.
    pub clear_highlight_between_turns: bool,
    /// Clears the highlighted target whenever the turn changes.
    pub clear_highlight_target_between_turns: bool,
    /// Shape of robot bodies.
    pub bot_shape: BotShape,
    /// Initial state of the movement arrow toggle.
    pub show_arrows: bool,
    /// Smallest board edge, in pixels, the viewport will lay out.
    pub min_board_pixels: f32,
    /// Total margin around the board, in pixels.
    pub board_margin: f32,
    /// Gap left between neighbouring cells, in pixels.
    pub cell_border_width: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_map(&MapConfig::default_map())
    }
}

impl Settings {
    /// Default settings describing the board of `map`.
    #[must_use]
    pub fn for_map(map: &MapConfig) -> Self {
        Self {
            board_size: map.board_size(),
            obstacles: map.obstacles().clone(),
            normal_color: Rgb::new(230, 230, 230),
            obstacle_color: Rgb::new(102, 102, 102),
            text_color: Rgb::new(153, 153, 153),
            highlight_color: Rgb::new(153, 153, 153),
            target_color: Rgb::new(153, 0, 0),
            player_colors: [Rgb::new(255, 26, 26), Rgb::new(52, 85, 255)],
            names: [String::from("Red"), String::from("Blue")],
            max_hp: 50,
            turn_interval_ms: 300,
            min_turn_interval_ms: 25,
            fps: 60,
            animations: true,
            highlight_cursor_blink: true,
            highlight_cursor_blink_interval_ms: 400,
            rate_cursor_blink_ms: 600,
            clear_highlight_between_turns: true,
            clear_highlight_target_between_turns: true,
            bot_shape: BotShape::Square,
            show_arrows: false,
            min_board_pixels: 250.0,
            board_margin: 0.0,
            cell_border_width: 2.0,
        }
    }

    /// Replaces the board description with the one of `map`.
    #[must_use]
    pub fn with_map(mut self, map: &MapConfig) -> Self {
        self.board_size = map.board_size();
        self.obstacles = map.obstacles().clone();
        self
    }

    /// Checks that every timing and layout value is usable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.board_size == 0 {
            return Err(SettingsError::EmptyBoard);
        }
        if self.fps == 0 {
            return Err(SettingsError::ZeroFps);
        }
        if self.turn_interval_ms == 0 {
            return Err(SettingsError::ZeroTurnInterval);
        }
        if self.min_turn_interval_ms == 0 || self.min_turn_interval_ms > self.turn_interval_ms {
            return Err(SettingsError::InvalidTurnFloor {
                floor: self.min_turn_interval_ms,
                base: self.turn_interval_ms,
            });
        }
        if self.rate_cursor_blink_ms == 0 {
            return Err(SettingsError::ZeroBlinkRate);
        }
        if self.max_hp == 0 {
            return Err(SettingsError::ZeroMaxHp);
        }
        if let Some(cell) = self
            .obstacles
            .iter()
            .find(|cell| !cell.is_within(self.board_size))
        {
            return Err(SettingsError::ObstacleOutOfBounds { cell: *cell });
        }
        if !(self.min_board_pixels.is_finite() && self.min_board_pixels > 0.0) {
            return Err(SettingsError::InvalidMinimumBoard {
                pixels: self.min_board_pixels,
            });
        }
        Ok(())
    }

    /// Base color of `player`'s robots.
    #[must_use]
    pub fn player_color(&self, player: PlayerId) -> Rgb {
        self.player_colors
            .get(player.index())
            .copied()
            .unwrap_or(self.text_color)
    }

    /// Display name of `player`.
    #[must_use]
    pub fn player_name(&self, player: PlayerId) -> &str {
        self.names
            .get(player.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Color of a robot owned by `player` with `hp` hit points left.
    ///
    /// Damaged robots fade towards white in proportion to the hit points lost.
    #[must_use]
    pub fn robot_color(&self, player: PlayerId, hp: u32) -> Rgb {
        let max_hp = self.max_hp.max(1);
        let lost = 1.0 - hp.min(max_hp) as f32 / max_hp as f32;
        self.player_color(player).lighten(lost * HP_LIGHTEN_RANGE)
    }

    /// Background color of a board cell.
    #[must_use]
    pub fn cell_color(&self, cell: CellCoord) -> Rgb {
        if self.obstacles.contains(&cell) {
            self.obstacle_color
        } else {
            self.normal_color
        }
    }
}

/// Invalid settings detected before playback starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SettingsError {
    /// The board has no cells.
    #[error("board size must be positive")]
    EmptyBoard,
    /// The scheduler cannot tick zero times per second.
    #[error("fps must be positive")]
    ZeroFps,
    /// Turns must take some time.
    #[error("turn interval must be positive")]
    ZeroTurnInterval,
    /// The speed floor must be positive and not exceed the base interval.
    #[error("minimum turn interval {floor}ms must be in 1..={base}ms")]
    InvalidTurnFloor {
        /// Configured floor.
        floor: u32,
        /// Configured base interval.
        base: u32,
    },
    /// The blink period must be positive.
    #[error("cursor blink rate must be positive")]
    ZeroBlinkRate,
    /// Robots need hit points to be colored.
    #[error("max hp must be positive")]
    ZeroMaxHp,
    /// An obstacle lies outside the board.
    #[error("obstacle {cell} lies outside the board")]
    ObstacleOutOfBounds {
        /// Offending obstacle cell.
        cell: CellCoord,
    },
    /// The minimum board edge must be a positive number of pixels.
    #[error("minimum board size {pixels}px must be positive")]
    InvalidMinimumBoard {
        /// Configured minimum.
        pixels: f32,
    },
}
