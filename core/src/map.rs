use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Cells per edge of the standard arena.
const ARENA_SIZE: u32 = 19;

/// Inclusive playable column span of every arena row; `None` rows are solid.
const ARENA_ROW_SPANS: [Option<(u32, u32)>; ARENA_SIZE as usize] = [
    None,
    Some((7, 11)),
    Some((5, 13)),
    Some((3, 15)),
    Some((3, 15)),
    Some((2, 16)),
    Some((2, 16)),
    Some((1, 17)),
    Some((1, 17)),
    Some((1, 17)),
    Some((1, 17)),
    Some((1, 17)),
    Some((2, 16)),
    Some((2, 16)),
    Some((3, 15)),
    Some((3, 15)),
    Some((5, 13)),
    Some((7, 11)),
    None,
];

const DEFAULT_TURNS: u32 = 100;
const DEFAULT_SPAWN_EVERY: u32 = 10;
const DEFAULT_PLAYERS: u32 = 2;
const DEFAULT_BOTS_PER_SPAWN: u32 = 5;

/// Static board configuration of a loaded replay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    board_size: u32,
    obstacles: BTreeSet<CellCoord>,
    spawn: Vec<CellCoord>,
    turns: u32,
    spawn_turns: Vec<u32>,
    num_players: u32,
    bots_per_spawn_and_player: u32,
}

impl MapConfig {
    /// Creates a validated map configuration.
    pub fn new(
        board_size: u32,
        obstacles: BTreeSet<CellCoord>,
        spawn: Vec<CellCoord>,
        turns: u32,
        spawn_turns: Vec<u32>,
        num_players: u32,
        bots_per_spawn_and_player: u32,
    ) -> Result<Self, MapError> {
        let map = Self {
            board_size,
            obstacles,
            spawn,
            turns,
            spawn_turns,
            num_players,
            bots_per_spawn_and_player,
        };
        map.validate()?;
        Ok(map)
    }

    /// Standard 19x19 arena: a rounded playable area walled off by obstacles,
    /// with every playable cell touching the wall acting as a spawn cell.
    #[must_use]
    pub fn default_map() -> Self {
        let playable = |column: u32, row: u32| -> bool {
            ARENA_ROW_SPANS
                .get(row as usize)
                .copied()
                .flatten()
                .is_some_and(|(first, last)| (first..=last).contains(&column))
        };

        let mut obstacles = BTreeSet::new();
        let mut spawn = Vec::new();
        for row in 0..ARENA_SIZE {
            for column in 0..ARENA_SIZE {
                let cell = CellCoord::new(column, row);
                if !playable(column, row) {
                    let _ = obstacles.insert(cell);
                    continue;
                }
                let touches_wall = cell.adjacent(ARENA_SIZE).len() < 4
                    || cell
                        .adjacent(ARENA_SIZE)
                        .into_iter()
                        .any(|neighbour| !playable(neighbour.column(), neighbour.row()));
                if touches_wall {
                    spawn.push(cell);
                }
            }
        }

        Self {
            board_size: ARENA_SIZE,
            obstacles,
            spawn,
            turns: DEFAULT_TURNS,
            spawn_turns: (0..DEFAULT_TURNS)
                .filter(|turn| turn % DEFAULT_SPAWN_EVERY == 0)
                .collect(),
            num_players: DEFAULT_PLAYERS,
            bots_per_spawn_and_player: DEFAULT_BOTS_PER_SPAWN,
        }
    }

    /// Returns a copy of the map lasting `turns` turns, dropping spawn turns
    /// that would fall past the end.
    pub fn with_turns(mut self, turns: u32) -> Result<Self, MapError> {
        self.turns = turns;
        self.spawn_turns.retain(|turn| *turn < turns);
        self.validate()?;
        Ok(self)
    }

    /// Checks the map for internal consistency.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.board_size == 0 {
            return Err(MapError::EmptyBoard);
        }

        for cell in &self.spawn {
            if !cell.is_within(self.board_size) {
                return Err(MapError::SpawnOutOfBounds { cell: *cell });
            }
            if self.obstacles.contains(cell) {
                return Err(MapError::SpawnOnObstacle { cell: *cell });
            }
        }

        if let Some(cell) = self
            .obstacles
            .iter()
            .find(|cell| !cell.is_within(self.board_size))
        {
            return Err(MapError::ObstacleOutOfBounds { cell: *cell });
        }

        let required = self.num_players * self.bots_per_spawn_and_player;
        if (self.spawn.len() as u32) < required {
            return Err(MapError::NotEnoughSpawnCells {
                available: self.spawn.len(),
                required,
            });
        }

        let (Some(first), Some(last)) = (
            self.spawn_turns.iter().min().copied(),
            self.spawn_turns.iter().max().copied(),
        ) else {
            return Err(MapError::NoSpawnTurns);
        };
        if last >= self.turns {
            return Err(MapError::SpawnTurnAfterEnd {
                turn: last,
                turns: self.turns,
            });
        }
        if first != 0 {
            return Err(MapError::FirstSpawnTurnNotZero { turn: first });
        }

        Ok(())
    }

    /// Number of cells along each board edge.
    #[must_use]
    pub const fn board_size(&self) -> u32 {
        self.board_size
    }

    /// Cells that can never be entered.
    #[must_use]
    pub const fn obstacles(&self) -> &BTreeSet<CellCoord> {
        &self.obstacles
    }

    /// Cells where new robots may appear, in row-major order.
    #[must_use]
    pub fn spawn(&self) -> &[CellCoord] {
        &self.spawn
    }

    /// Number of turns a match on this map lasts.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.turns
    }

    /// Turns on which robots spawn.
    #[must_use]
    pub fn spawn_turns(&self) -> &[u32] {
        &self.spawn_turns
    }

    /// Number of competing players.
    #[must_use]
    pub const fn num_players(&self) -> u32 {
        self.num_players
    }

    /// Robots spawned for each player on every spawn turn.
    #[must_use]
    pub const fn bots_per_spawn_and_player(&self) -> u32 {
        self.bots_per_spawn_and_player
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::default_map()
    }
}

/// Consistency violations detected when loading a map.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapError {
    /// The board has no cells.
    #[error("board size must be positive")]
    EmptyBoard,
    /// A spawn cell lies outside the board.
    #[error("spawn cell {cell} lies outside the board")]
    SpawnOutOfBounds {
        /// Offending spawn cell.
        cell: CellCoord,
    },
    /// A spawn cell is also an obstacle.
    #[error("spawn cell {cell} is an obstacle")]
    SpawnOnObstacle {
        /// Offending spawn cell.
        cell: CellCoord,
    },
    /// An obstacle lies outside the board.
    #[error("obstacle {cell} lies outside the board")]
    ObstacleOutOfBounds {
        /// Offending obstacle cell.
        cell: CellCoord,
    },
    /// Not enough spawn cells for a full spawn wave.
    #[error("map provides {available} spawn cells but a spawn wave needs {required}")]
    NotEnoughSpawnCells {
        /// Spawn cells declared by the map.
        available: usize,
        /// Spawn cells consumed by a single wave.
        required: u32,
    },
    /// The map never spawns robots.
    #[error("map declares no spawn turns")]
    NoSpawnTurns,
    /// A spawn turn falls on or after the final turn.
    #[error("spawn turn {turn} is not before the final turn {turns}")]
    SpawnTurnAfterEnd {
        /// Latest spawn turn.
        turn: u32,
        /// Number of turns in the match.
        turns: u32,
    },
    /// Robots must spawn on turn zero.
    #[error("first spawn turn must be 0, found {turn}")]
    FirstSpawnTurnNotZero {
        /// Earliest spawn turn.
        turn: u32,
    },
}
