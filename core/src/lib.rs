#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the robot replay viewer.
//!
//! This crate defines the read-only surface that connects a recorded
//! simulation to the playback controller. A [`ReplaySource`] exposes one
//! immutable [`StateSnapshot`] and one ordered [`TurnActions`] set per
//! integer turn; the playback systems never mutate either. Static board
//! configuration lives in [`MapConfig`] and presentation parameters in
//! [`Settings`], both constructed explicitly rather than through shared
//! process-wide defaults.

mod color;
mod map;
mod settings;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use color::Rgb;
pub use map::{MapConfig, MapError};
pub use settings::{BotShape, Settings, SettingsError};

/// Zero-based coordinate of a single board cell.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the cell lies on a square board with `board_size` cells per edge.
    #[must_use]
    pub const fn is_within(&self, board_size: u32) -> bool {
        self.column < board_size && self.row < board_size
    }

    /// Orthogonal neighbours of the cell that remain on the board.
    ///
    /// Neighbours are yielded in north, east, south, west order.
    #[must_use]
    pub fn adjacent(self, board_size: u32) -> Vec<CellCoord> {
        let mut cells = Vec::with_capacity(4);
        if self.row > 0 {
            cells.push(Self::new(self.column, self.row - 1));
        }
        if self.column + 1 < board_size {
            cells.push(Self::new(self.column + 1, self.row));
        }
        if self.row + 1 < board_size {
            cells.push(Self::new(self.column, self.row + 1));
        }
        if self.column > 0 {
            cells.push(Self::new(self.column - 1, self.row));
        }
        cells
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Identifier of one of the two competing players.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Number of players taking part in a replay.
    pub const COUNT: usize = 2;

    /// Creates a new player identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Zero-based index of the player, used to look up per-player palettes.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier assigned to a robot by the simulation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RobotId(u32);

impl RobotId {
    /// Creates a new robot identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable view of a robot alive on a given turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    /// Identifier assigned to the robot.
    pub robot_id: RobotId,
    /// Player controlling the robot.
    pub player_id: PlayerId,
    /// Remaining hit points.
    pub hp: u32,
    /// Cell occupied by the robot.
    pub location: CellCoord,
}

/// Immutable state of the board on a single turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    robots: BTreeMap<CellCoord, RobotSnapshot>,
}

impl StateSnapshot {
    /// Builds a snapshot from the robots alive on the turn.
    ///
    /// A later robot reported on an already occupied cell replaces the earlier one.
    #[must_use]
    pub fn from_robots<I>(robots: I) -> Self
    where
        I: IntoIterator<Item = RobotSnapshot>,
    {
        Self {
            robots: robots
                .into_iter()
                .map(|robot| (robot.location, robot))
                .collect(),
        }
    }

    /// Reports whether a robot occupies the cell.
    #[must_use]
    pub fn is_robot(&self, cell: CellCoord) -> bool {
        self.robots.contains_key(&cell)
    }

    /// Retrieves the robot occupying the cell, if any.
    #[must_use]
    pub fn robot(&self, cell: CellCoord) -> Option<&RobotSnapshot> {
        self.robots.get(&cell)
    }

    /// Iterates over every robot on the board in cell order.
    pub fn robots(&self) -> impl Iterator<Item = &RobotSnapshot> {
        self.robots.values()
    }

    /// Number of robots alive on the turn.
    #[must_use]
    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    /// Scores of both players, counted as the robots each still controls.
    #[must_use]
    pub fn scores(&self) -> (u32, u32) {
        self.robots
            .values()
            .fold((0, 0), |(first, second), robot| match robot.player_id.index() {
                0 => (first + 1, second),
                _ => (first, second + 1),
            })
    }
}

/// Kind of action a robot performed on a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// The robot stepped into an adjacent cell.
    Move,
    /// The robot attacked an adjacent cell.
    Attack,
    /// The robot stayed in place and guarded.
    Guard,
    /// The robot self-destructed, damaging its surroundings.
    Suicide,
}

impl ActionKind {
    /// Lowercase label used by info displays.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Guard => "guard",
            Self::Suicide => "suicide",
        }
    }
}

/// Descriptor of what a single robot did on a given turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action performed by the robot.
    pub kind: ActionKind,
    /// Cell the action was aimed at, if the action has a target.
    #[serde(default)]
    pub target: Option<CellCoord>,
    /// Identifier of the acting robot.
    pub robot_id: RobotId,
    /// Player controlling the acting robot.
    pub player_id: PlayerId,
    /// Hit points at the start of the turn.
    pub hp: u32,
    /// Hit points once the turn resolved.
    pub hp_end: u32,
    /// Cell occupied at the start of the turn.
    pub location: CellCoord,
    /// Cell occupied once the turn resolved.
    pub location_end: CellCoord,
}

/// Ordered action records of one turn, keyed by the acting robot's starting cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnActions {
    records: Vec<ActionRecord>,
}

impl TurnActions {
    /// Creates an action set preserving the provided insertion order.
    #[must_use]
    pub fn new(records: Vec<ActionRecord>) -> Self {
        Self { records }
    }

    /// Retrieves the action performed by the robot that started the turn on `cell`.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&ActionRecord> {
        self.records.iter().find(|record| record.location == cell)
    }

    /// Iterates over `(cell, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &ActionRecord)> {
        self.records.iter().map(|record| (record.location, record))
    }

    /// Number of action records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether no robot acted on the turn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read-only access to a recorded simulation, one immutable state per turn.
///
/// Implementations must answer every turn in `1..=max_turn()`. Playback never
/// queries turns outside that range.
pub trait ReplaySource {
    /// Last turn contained in the replay.
    fn max_turn(&self) -> u32;

    /// Board state at the start of `turn`.
    fn state(&self, turn: u32) -> &StateSnapshot;

    /// Actions performed during `turn`, in the simulation's natural order.
    fn actions_on_turn(&self, turn: u32) -> &TurnActions;
}
