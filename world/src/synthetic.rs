//! Seeded replay generator used when no recorded replay is available.
//!
//! Robots spawn on the map's schedule and act randomly but plausibly: they
//! attack adjacent enemies, occasionally self-destruct when surrounded, and
//! otherwise wander or guard. Two robots heading for the same cell both stay
//! put, as does a robot heading for an occupied cell.

use std::collections::{BTreeMap, BTreeSet};

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use robot_replay_core::{
    ActionKind, ActionRecord, CellCoord, MapConfig, PlayerId, RobotId, RobotSnapshot,
    StateSnapshot, TurnActions,
};

use crate::Replay;

const ROBOT_HP: u32 = 50;
const ATTACK_DAMAGE: std::ops::RangeInclusive<u32> = 8..=10;
const SUICIDE_DAMAGE: u32 = 15;
const SUICIDE_CHANCE: f64 = 0.2;
const GUARD_CHANCE: f64 = 0.15;

impl Replay {
    /// Generates a deterministic replay lasting `map.turns()` turns.
    #[must_use]
    pub fn synthetic(map: &MapConfig, seed: u64) -> Self {
        let mut generator = Generator::new(map, seed);
        let turns = map.turns().max(1);
        let mut states = Vec::with_capacity(turns as usize);
        let mut actions = Vec::with_capacity(turns as usize);

        for turn in 1..=turns {
            if map.spawn_turns().contains(&(turn - 1)) {
                generator.spawn();
            }
            let state = StateSnapshot::from_robots(generator.robots.values().copied());
            let records = generator.act();
            states.push(state);
            actions.push(TurnActions::new(records));
        }

        log::info!("generated synthetic replay with {turns} turns from seed {seed}");
        Self {
            names: None,
            states,
            actions,
        }
    }
}

struct Generator<'a> {
    map: &'a MapConfig,
    rng: ChaCha8Rng,
    robots: BTreeMap<CellCoord, RobotSnapshot>,
    next_id: u32,
}

impl<'a> Generator<'a> {
    fn new(map: &'a MapConfig, seed: u64) -> Self {
        Self {
            map,
            rng: ChaCha8Rng::seed_from_u64(seed),
            robots: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Clears every spawn cell and places a fresh wave of robots on them.
    fn spawn(&mut self) {
        let map = self.map;
        let spawn = map.spawn();
        for cell in spawn {
            let _ = self.robots.remove(cell);
        }

        let players = map.num_players().clamp(1, PlayerId::COUNT as u32);
        let count = (players * map.bots_per_spawn_and_player()) as usize;
        let chosen: Vec<CellCoord> = spawn
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();
        for (index, cell) in chosen.into_iter().enumerate() {
            let robot = RobotSnapshot {
                robot_id: RobotId::new(self.next_id),
                player_id: PlayerId::new((index as u32 % players) as u8),
                hp: ROBOT_HP,
                location: cell,
            };
            self.next_id += 1;
            let _ = self.robots.insert(cell, robot);
        }
    }

    /// Chooses and resolves one action per robot, advancing the board.
    fn act(&mut self) -> Vec<ActionRecord> {
        let board_size = self.map.board_size();
        let robots: Vec<RobotSnapshot> = self.robots.values().copied().collect();
        let plans: Vec<(RobotSnapshot, ActionKind, Option<CellCoord>)> = robots
            .into_iter()
            .map(|robot| {
                let (kind, target) = self.choose(robot, board_size);
                (robot, kind, target)
            })
            .collect();

        let mut claims: BTreeMap<CellCoord, usize> = BTreeMap::new();
        for (_, kind, target) in &plans {
            if let (ActionKind::Move, Some(cell)) = (kind, target) {
                *claims.entry(*cell).or_default() += 1;
            }
        }

        let guarding: BTreeSet<CellCoord> = plans
            .iter()
            .filter(|(_, kind, _)| *kind == ActionKind::Guard)
            .map(|(robot, _, _)| robot.location)
            .collect();
        let mut damage: BTreeMap<CellCoord, u32> = BTreeMap::new();
        for (robot, kind, target) in &plans {
            match (kind, target) {
                (ActionKind::Attack, Some(cell)) => {
                    let amount = self.rng.gen_range(ATTACK_DAMAGE);
                    *damage.entry(*cell).or_default() += amount;
                }
                (ActionKind::Suicide, _) => {
                    for cell in robot.location.adjacent(board_size) {
                        *damage.entry(cell).or_default() += SUICIDE_DAMAGE;
                    }
                }
                _ => {}
            }
        }

        let mut records = Vec::with_capacity(plans.len());
        let mut next = BTreeMap::new();
        for (robot, kind, target) in plans {
            let location_end = match (kind, target) {
                (ActionKind::Move, Some(cell))
                    if !self.robots.contains_key(&cell) && claims.get(&cell) == Some(&1) =>
                {
                    cell
                }
                _ => robot.location,
            };
            let taken = damage.get(&robot.location).copied().unwrap_or(0);
            let taken = if guarding.contains(&robot.location) {
                taken / 2
            } else {
                taken
            };
            let hp_end = match kind {
                ActionKind::Suicide => 0,
                _ => robot.hp.saturating_sub(taken),
            };

            records.push(ActionRecord {
                kind,
                target,
                robot_id: robot.robot_id,
                player_id: robot.player_id,
                hp: robot.hp,
                hp_end,
                location: robot.location,
                location_end,
            });
            if hp_end > 0 {
                let _ = next.insert(
                    location_end,
                    RobotSnapshot {
                        hp: hp_end,
                        location: location_end,
                        ..robot
                    },
                );
            }
        }

        self.robots = next;
        records
    }

    fn choose(&mut self, robot: RobotSnapshot, board_size: u32) -> (ActionKind, Option<CellCoord>) {
        let neighbours = robot.location.adjacent(board_size);
        let enemies: Vec<CellCoord> = neighbours
            .iter()
            .copied()
            .filter(|cell| {
                self.robots
                    .get(cell)
                    .is_some_and(|other| other.player_id != robot.player_id)
            })
            .collect();

        if enemies.len() > 1 && self.rng.gen_bool(SUICIDE_CHANCE) {
            return (ActionKind::Suicide, None);
        }
        if let Some(enemy) = enemies.choose(&mut self.rng) {
            return (ActionKind::Attack, Some(*enemy));
        }
        if self.rng.gen_bool(GUARD_CHANCE) {
            return (ActionKind::Guard, None);
        }

        let open: Vec<CellCoord> = neighbours
            .into_iter()
            .filter(|cell| !self.map.obstacles().contains(cell))
            .collect();
        match open.choose(&mut self.rng) {
            Some(cell) => (ActionKind::Move, Some(*cell)),
            None => (ActionKind::Guard, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_replay_core::ReplaySource;

    fn map() -> MapConfig {
        MapConfig::default_map()
            .with_turns(30)
            .expect("shorter arena is valid")
    }

    #[test]
    fn same_seed_produces_same_replay() {
        assert_eq!(Replay::synthetic(&map(), 7), Replay::synthetic(&map(), 7));
        assert_ne!(Replay::synthetic(&map(), 7), Replay::synthetic(&map(), 8));
    }

    #[test]
    fn replay_covers_every_turn_of_the_map() {
        let replay = Replay::synthetic(&map(), 3);

        assert_eq!(replay.max_turn(), 30);
        assert_eq!(replay.state(1).robot_count(), 10);
        assert_eq!(replay.actions_on_turn(1).len(), 10);
    }

    #[test]
    fn generated_replay_passes_validation() {
        let replay = Replay::synthetic(&map(), 11);
        let states = (1..=replay.max_turn())
            .map(|turn| replay.state(turn).clone())
            .collect();
        let actions = (1..=replay.max_turn())
            .map(|turn| replay.actions_on_turn(turn).clone())
            .collect();

        assert!(Replay::new(None, states, actions).is_ok());
    }

    #[test]
    fn robots_stay_on_playable_cells() {
        let map = map();
        let replay = Replay::synthetic(&map, 5);

        for turn in 1..=replay.max_turn() {
            for robot in replay.state(turn).robots() {
                assert!(robot.location.is_within(map.board_size()));
                assert!(!map.obstacles().contains(&robot.location));
            }
            for (_, record) in replay.actions_on_turn(turn).iter() {
                if record.kind == ActionKind::Move {
                    assert!(record.location.manhattan_distance(record.location_end) <= 1);
                }
            }
        }
    }

    #[test]
    fn next_state_follows_resolved_actions() {
        let replay = Replay::synthetic(&map(), 9);

        for turn in 1..replay.max_turn() {
            if turn % 10 == 0 {
                continue;
            }
            let survivors = replay
                .actions_on_turn(turn)
                .iter()
                .filter(|(_, record)| record.hp_end > 0)
                .count();
            assert_eq!(replay.state(turn + 1).robot_count(), survivors);
        }
    }
}
