//! Textual summary of the displayed turn shown next to the board.

use std::fmt;

use robot_replay_core::{CellCoord, PlayerId, RobotId, Rgb, Settings, StateSnapshot};
use robot_replay_rendering::{Color, InfoLine};

/// What occupies the highlighted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightDetail {
    /// The cell is an obstacle.
    Obstacle,
    /// A robot stands on the cell.
    Bot(RobotId),
}

impl fmt::Display for HighlightDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Obstacle => write!(f, "Obstacle"),
            Self::Bot(id) => write!(f, "Bot {}", id.get()),
        }
    }
}

/// Score of one player on the displayed turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreLine {
    /// Player display name.
    pub name: String,
    /// Robots the player still controls.
    pub score: u32,
    /// Player color.
    pub color: Rgb,
}

/// Scores, turn counter and selection summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    /// One line per player, in player order.
    pub scores: Vec<ScoreLine>,
    /// Turn currently shown.
    pub display_turn: u32,
    /// Last turn of the replay.
    pub max_turn: u32,
    /// Highlighted cell, if any.
    pub highlighted: Option<CellCoord>,
    /// Occupant of the highlighted cell.
    pub detail: Option<HighlightDetail>,
}

impl InfoPanel {
    /// Summarises `state`, the board shown on `display_turn`.
    #[must_use]
    pub fn new(
        settings: &Settings,
        state: &StateSnapshot,
        display_turn: u32,
        max_turn: u32,
        highlighted: Option<CellCoord>,
    ) -> Self {
        let (first, second) = state.scores();
        let scores = [first, second]
            .into_iter()
            .enumerate()
            .map(|(index, score)| {
                let player = PlayerId::new(index as u8);
                ScoreLine {
                    name: settings.player_name(player).to_owned(),
                    score,
                    color: settings.player_color(player),
                }
            })
            .collect();

        let detail = highlighted.and_then(|cell| {
            if settings.obstacles.contains(&cell) {
                Some(HighlightDetail::Obstacle)
            } else {
                state
                    .robot(cell)
                    .map(|robot| HighlightDetail::Bot(robot.robot_id))
            }
        });

        Self {
            scores,
            display_turn,
            max_turn,
            highlighted,
            detail,
        }
    }

    /// `Turn: <display>/<max>`.
    #[must_use]
    pub fn turn_text(&self) -> String {
        format!("Turn: {}/{}", self.display_turn, self.max_turn)
    }

    /// `Highlighted: <cell>; <detail>`.
    #[must_use]
    pub fn highlight_text(&self) -> String {
        let cell = self
            .highlighted
            .map_or_else(|| String::from("none"), |cell| cell.to_string());
        let detail = self.detail.map(|detail| detail.to_string()).unwrap_or_default();
        format!("Highlighted: {cell}; {detail}")
    }

    /// Panel lines: scores in player colors, then turn and selection.
    #[must_use]
    pub fn lines(&self, text_color: Rgb) -> Vec<InfoLine> {
        let scores = self.scores.iter().map(|line| InfoLine {
            text: format!("{}: {}", line.name, line.score),
            color: Color::from(line.color),
        });
        let text = Color::from(text_color);
        scores
            .chain([
                InfoLine {
                    text: self.turn_text(),
                    color: text,
                },
                InfoLine {
                    text: self.highlight_text(),
                    color: text,
                },
            ])
            .collect()
    }
}
