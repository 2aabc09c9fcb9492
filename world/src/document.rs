//! JSON layout of replay files.

use robot_replay_core::{ActionRecord, ReplaySource, RobotSnapshot, StateSnapshot, TurnActions};
use serde::{Deserialize, Serialize};

use crate::{Replay, ReplayError};

/// Serialised replay: optional player names and one entry per turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDocument {
    /// Player names, first player first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<[String; 2]>,
    /// Last turn; must equal the number of entries in `turns`.
    pub max_turn: u32,
    /// Turns `1..=max_turn` in order.
    pub turns: Vec<TurnDocument>,
}

/// Robots alive at the start of a turn and the actions they performed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDocument {
    /// Robots on the board when the turn starts.
    #[serde(default)]
    pub robots: Vec<RobotSnapshot>,
    /// Actions in the order the simulation reported them.
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl ReplayDocument {
    /// Validates the document and builds the replay it describes.
    pub fn into_replay(self) -> Result<Replay, ReplayError> {
        if self.turns.len() != self.max_turn as usize {
            return Err(ReplayError::DeclaredTurnMismatch {
                declared: self.max_turn,
                found: self.turns.len(),
            });
        }

        let (states, actions) = self
            .turns
            .into_iter()
            .map(|turn| {
                (
                    StateSnapshot::from_robots(turn.robots),
                    TurnActions::new(turn.actions),
                )
            })
            .unzip();
        Replay::new(self.names, states, actions)
    }

    /// Captures every turn of `replay`.
    #[must_use]
    pub fn from_replay(replay: &Replay) -> Self {
        let turns = (1..=replay.max_turn())
            .map(|turn| TurnDocument {
                robots: replay.state(turn).robots().copied().collect(),
                actions: replay
                    .actions_on_turn(turn)
                    .iter()
                    .map(|(_, record)| *record)
                    .collect(),
            })
            .collect();

        Self {
            names: replay.names().cloned(),
            max_turn: replay.max_turn(),
            turns,
        }
    }
}
