#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory replays.
//!
//! A [`Replay`] stores one immutable board state and one ordered action list
//! per turn. Replays are either loaded from JSON documents or produced by the
//! seeded synthetic generator.

mod document;
mod synthetic;

use robot_replay_core::{CellCoord, ReplaySource, StateSnapshot, TurnActions};
use thiserror::Error;

pub use document::{ReplayDocument, TurnDocument};

/// Recorded simulation with states for every turn in `1..=max_turn`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    names: Option<[String; 2]>,
    states: Vec<StateSnapshot>,
    actions: Vec<TurnActions>,
}

impl Replay {
    /// Creates a replay from per-turn states and actions, first turn first.
    ///
    /// Every action must be performed by a robot standing on the action's
    /// starting cell in the same turn's state, and no cell may act twice.
    pub fn new(
        names: Option<[String; 2]>,
        states: Vec<StateSnapshot>,
        actions: Vec<TurnActions>,
    ) -> Result<Self, ReplayError> {
        if states.is_empty() {
            return Err(ReplayError::Empty);
        }
        if states.len() != actions.len() {
            return Err(ReplayError::TurnCountMismatch {
                states: states.len(),
                actions: actions.len(),
            });
        }

        for (index, (state, turn_actions)) in states.iter().zip(&actions).enumerate() {
            let turn = index as u32 + 1;
            let mut seen = std::collections::BTreeSet::new();
            for (cell, record) in turn_actions.iter() {
                if !seen.insert(cell) {
                    return Err(ReplayError::DuplicateAction { turn, cell });
                }
                match state.robot(cell) {
                    Some(robot) if robot.robot_id == record.robot_id => {}
                    Some(_) => return Err(ReplayError::RobotMismatch { turn, cell }),
                    None => return Err(ReplayError::ActionWithoutRobot { turn, cell }),
                }
            }
        }

        Ok(Self {
            names,
            states,
            actions,
        })
    }

    /// Parses and validates a JSON replay document.
    pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
        let document: ReplayDocument = serde_json::from_str(json)?;
        let replay = document.into_replay()?;
        log::info!("loaded replay with {} turns", replay.max_turn());
        Ok(replay)
    }

    /// Serialises the replay as a JSON document.
    pub fn to_json_string(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(&ReplayDocument::from_replay(self))?)
    }

    /// Checks that every robot, move and target lies on a board of
    /// `board_size` cells per side.
    pub fn check_fits(&self, board_size: u32) -> Result<(), ReplayError> {
        let on_board = |cell: CellCoord| cell.column() < board_size && cell.row() < board_size;
        for (index, (state, turn_actions)) in self.states.iter().zip(&self.actions).enumerate() {
            let turn = index as u32 + 1;
            let robot_cells = state.robots().map(|robot| robot.location);
            let action_cells = turn_actions.iter().flat_map(|(_, record)| {
                [Some(record.location), Some(record.location_end), record.target]
                    .into_iter()
                    .flatten()
            });
            if let Some(cell) = robot_cells.chain(action_cells).find(|cell| !on_board(*cell)) {
                return Err(ReplayError::OffBoard {
                    turn,
                    cell,
                    board_size,
                });
            }
        }
        Ok(())
    }

    /// Player names recorded with the replay, if any.
    #[must_use]
    pub fn names(&self) -> Option<&[String; 2]> {
        self.names.as_ref()
    }

    fn index(&self, turn: u32) -> usize {
        let last = self.states.len().saturating_sub(1);
        (turn.max(1) as usize - 1).min(last)
    }
}

impl ReplaySource for Replay {
    fn max_turn(&self) -> u32 {
        self.states.len() as u32
    }

    fn state(&self, turn: u32) -> &StateSnapshot {
        &self.states[self.index(turn)]
    }

    fn actions_on_turn(&self, turn: u32) -> &TurnActions {
        &self.actions[self.index(turn)]
    }
}

/// Errors raised while loading or validating a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The document is not valid JSON or does not match the replay layout.
    #[error("malformed replay document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The replay holds no turn.
    #[error("replay must contain at least one turn")]
    Empty,
    /// The document's declared length disagrees with its turn list.
    #[error("replay declares {declared} turns but contains {found}")]
    DeclaredTurnMismatch {
        /// Value of the `max_turn` field.
        declared: u32,
        /// Number of turns present.
        found: usize,
    },
    /// States and action lists differ in length.
    #[error("replay has {states} states but {actions} action lists")]
    TurnCountMismatch {
        /// Number of states.
        states: usize,
        /// Number of action lists.
        actions: usize,
    },
    /// An action starts on a cell where no robot stands.
    #[error("turn {turn}: action on {cell} has no robot")]
    ActionWithoutRobot {
        /// Turn containing the action.
        turn: u32,
        /// Starting cell of the action.
        cell: CellCoord,
    },
    /// An action names a different robot than the one standing on its cell.
    #[error("turn {turn}: action on {cell} names another robot")]
    RobotMismatch {
        /// Turn containing the action.
        turn: u32,
        /// Starting cell of the action.
        cell: CellCoord,
    },
    /// Two actions start on the same cell.
    #[error("turn {turn}: more than one action on {cell}")]
    DuplicateAction {
        /// Turn containing the actions.
        turn: u32,
        /// Shared starting cell.
        cell: CellCoord,
    },
    /// A robot or action lies outside the board it is played on.
    #[error("turn {turn}: {cell} lies outside the {board_size}x{board_size} board")]
    OffBoard {
        /// Turn containing the cell.
        turn: u32,
        /// Offending cell.
        cell: CellCoord,
        /// Cells per board side.
        board_size: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_replay_core::{ActionKind, ActionRecord, PlayerId, RobotId, RobotSnapshot};

    fn robot(id: u32, cell: CellCoord) -> RobotSnapshot {
        RobotSnapshot {
            robot_id: RobotId::new(id),
            player_id: PlayerId::new(0),
            hp: 50,
            location: cell,
        }
    }

    fn guard(id: u32, cell: CellCoord) -> ActionRecord {
        ActionRecord {
            kind: ActionKind::Guard,
            target: None,
            robot_id: RobotId::new(id),
            player_id: PlayerId::new(0),
            hp: 50,
            hp_end: 50,
            location: cell,
            location_end: cell,
        }
    }

    #[test]
    fn turns_are_clamped_to_the_recorded_range() {
        let cell = CellCoord::new(3, 3);
        let replay = Replay::new(
            None,
            vec![
                StateSnapshot::from_robots([robot(1, cell)]),
                StateSnapshot::default(),
            ],
            vec![TurnActions::new(vec![guard(1, cell)]), TurnActions::default()],
        )
        .expect("valid replay");

        assert_eq!(replay.max_turn(), 2);
        assert_eq!(replay.state(0).robot_count(), 1);
        assert_eq!(replay.actions_on_turn(1).len(), 1);
        assert!(replay.actions_on_turn(2).is_empty());
        assert!(replay.actions_on_turn(99).is_empty());
    }

    #[test]
    fn actions_must_start_on_their_robot() {
        let cell = CellCoord::new(3, 3);
        let result = Replay::new(
            None,
            vec![StateSnapshot::default()],
            vec![TurnActions::new(vec![guard(1, cell)])],
        );
        assert!(matches!(
            result,
            Err(ReplayError::ActionWithoutRobot { turn: 1, cell: c }) if c == cell
        ));

        let result = Replay::new(
            None,
            vec![StateSnapshot::from_robots([robot(2, cell)])],
            vec![TurnActions::new(vec![guard(1, cell)])],
        );
        assert!(matches!(result, Err(ReplayError::RobotMismatch { .. })));
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let cell = CellCoord::new(3, 3);
        let result = Replay::new(
            None,
            vec![StateSnapshot::from_robots([robot(1, cell)])],
            vec![TurnActions::new(vec![guard(1, cell), guard(1, cell)])],
        );
        assert!(matches!(result, Err(ReplayError::DuplicateAction { turn: 1, .. })));
    }

    #[test]
    fn cells_beyond_the_board_are_reported() {
        let cell = CellCoord::new(3, 12);
        let mut attack = guard(1, cell);
        attack.kind = ActionKind::Attack;
        attack.target = Some(CellCoord::new(3, 13));
        let replay = Replay::new(
            None,
            vec![
                StateSnapshot::default(),
                StateSnapshot::from_robots([robot(1, cell)]),
            ],
            vec![TurnActions::default(), TurnActions::new(vec![attack])],
        )
        .expect("valid replay");

        assert!(replay.check_fits(14).is_ok());
        assert!(matches!(
            replay.check_fits(13),
            Err(ReplayError::OffBoard { turn: 2, cell: c, board_size: 13 }) if c == CellCoord::new(3, 13)
        ));
        assert!(matches!(
            replay.check_fits(10),
            Err(ReplayError::OffBoard { turn: 2, cell: c, .. }) if c == cell
        ));
    }

    #[test]
    fn empty_replays_are_rejected() {
        assert!(matches!(
            Replay::new(None, Vec::new(), Vec::new()),
            Err(ReplayError::Empty)
        ));
    }
}
