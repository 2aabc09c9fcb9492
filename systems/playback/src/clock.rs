//! Turn and sub-turn clock driven purely by elapsed wall-clock time.

use std::time::Duration;

use robot_replay_core::Settings;

/// Largest sub-turn value strictly below one full turn.
const LAST_SUB_TURN: f64 = 1.0 - f64::EPSILON;

/// Weight applied to positive (accelerating) speed offsets.
const ACCELERATION_WEIGHT: f64 = 2.0;

/// Signals that the committed turn changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnTransition {
    /// Turn committed before the transition.
    pub from: u32,
    /// Turn committed after the transition.
    pub to: u32,
}

/// Playback clock holding the committed turn and the interpolation progress
/// toward the next one.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    turn: u32,
    sub_turn: f64,
    paused: bool,
    max_turn: u32,
    frame_start: Duration,
    next_frame_deadline: Duration,
    base_interval_ms: f64,
    min_interval_ms: f64,
    speed_offset_ms: f64,
    turn_duration: Duration,
    animations: bool,
}

impl PlaybackClock {
    /// Creates a paused clock on turn 1, anchored at `now`.
    #[must_use]
    pub fn new(settings: &Settings, max_turn: u32, now: Duration) -> Self {
        let base_interval_ms = f64::from(settings.turn_interval_ms.max(1));
        let mut clock = Self {
            turn: 1,
            sub_turn: 0.0,
            paused: true,
            max_turn: max_turn.max(1),
            frame_start: now,
            next_frame_deadline: now,
            base_interval_ms,
            min_interval_ms: f64::from(settings.min_turn_interval_ms.max(1)),
            speed_offset_ms: 0.0,
            turn_duration: duration_from_ms(base_interval_ms),
            animations: settings.animations,
        };
        clock.anchor(now);
        clock
    }

    /// Last fully committed turn.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Interpolation progress toward the next turn, in `[0, 1)`.
    #[must_use]
    pub const fn sub_turn(&self) -> f64 {
        self.sub_turn
    }

    /// Whether playback is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last turn of the replay.
    #[must_use]
    pub const fn max_turn(&self) -> u32 {
        self.max_turn
    }

    /// Current duration of a single turn.
    #[must_use]
    pub const fn turn_duration(&self) -> Duration {
        self.turn_duration
    }

    /// Current speed offset in milliseconds, after clamping.
    #[must_use]
    pub const fn speed_offset_ms(&self) -> f64 {
        self.speed_offset_ms
    }

    /// Largest offset magnitude accepted by [`PlaybackClock::set_speed`].
    #[must_use]
    pub fn speed_range_ms(&self) -> f64 {
        self.base_interval_ms / 2.0
    }

    /// The only turn ever shown or queried from the replay.
    #[must_use]
    pub fn display_turn(&self) -> u32 {
        let whole_turns = self.sub_turn.floor() as u32;
        self.turn.saturating_add(whole_turns).clamp(1, self.max_turn)
    }

    /// Advances the clock to `now`.
    ///
    /// Consumes at most one turn per call; elapsed time beyond that carries
    /// over to the next call through the frame anchor.
    ///
    /// A transition re-anchors at the deadline armed when the turn began, so
    /// after a mid-turn speed-up the next turn holds at sub-turn zero until
    /// that deadline passes. This is intended.
    pub fn tick(&mut self, now: Duration) -> Option<TurnTransition> {
        if self.paused {
            return None;
        }

        if !self.animations {
            return self.tick_discrete(now);
        }

        let elapsed = now.saturating_sub(self.frame_start);
        self.sub_turn = (elapsed.as_nanos() as f64 / self.turn_duration.as_nanos() as f64).max(0.0);

        if self.turn >= self.max_turn {
            self.turn = self.max_turn;
            self.pause();
            log::info!("reached final turn {}; playback paused", self.max_turn);
            return None;
        }

        if self.sub_turn < 1.0 {
            return None;
        }

        let from = self.turn;
        self.sub_turn = (self.sub_turn - 1.0).min(LAST_SUB_TURN);
        self.turn += 1;
        self.anchor(self.next_frame_deadline);
        Some(TurnTransition {
            from,
            to: self.turn,
        })
    }

    fn tick_discrete(&mut self, now: Duration) -> Option<TurnTransition> {
        if self.turn >= self.max_turn {
            self.turn = self.max_turn;
            self.pause();
            log::info!("reached final turn {}; playback paused", self.max_turn);
            return None;
        }

        if now <= self.next_frame_deadline {
            return None;
        }

        let from = self.turn;
        self.turn += 1;
        self.anchor(self.next_frame_deadline);
        Some(TurnTransition {
            from,
            to: self.turn,
        })
    }

    /// Recomputes the turn duration from a speed offset in milliseconds.
    ///
    /// Positive offsets accelerate at twice the rate negative offsets
    /// decelerate; the result never drops below the configured floor.
    pub fn set_speed(&mut self, offset_ms: f64) {
        let range = self.speed_range_ms();
        let offset = if offset_ms.is_finite() {
            offset_ms.clamp(-range, range)
        } else {
            0.0
        };
        let duration_ms = if offset > 0.0 {
            self.base_interval_ms - offset * ACCELERATION_WEIGHT
        } else {
            self.base_interval_ms - offset
        };

        self.speed_offset_ms = offset;
        self.turn_duration = duration_from_ms(duration_ms.max(self.min_interval_ms));
    }

    /// Flips between playing and paused.
    ///
    /// Pausing drops the sub-turn progress; resuming re-anchors the frame at
    /// `now` so interpolation restarts without a jump.
    pub fn toggle_pause(&mut self, now: Duration) {
        if self.paused {
            self.paused = false;
            self.anchor(now);
        } else {
            self.pause();
        }
        log::info!(
            "playback {} on turn {}",
            if self.paused { "paused" } else { "resumed" },
            self.turn
        );
    }

    /// Pauses and moves `delta` turns away from the displayed turn, clamped
    /// to the replay.
    ///
    /// Always reports a transition, even when the turn does not change, so
    /// callers rebuild the displayed turn unconditionally.
    pub fn jump_to(&mut self, delta: i64, now: Duration) -> TurnTransition {
        let from = self.turn;
        let target = i64::from(self.display_turn()).saturating_add(delta);
        let clamped = target.clamp(1, i64::from(self.max_turn));
        if clamped != target {
            log::warn!("turn {target} out of range; clamped to {clamped}");
        }

        self.paused = true;
        self.turn = u32::try_from(clamped).unwrap_or(self.max_turn);
        self.sub_turn = 0.0;
        self.anchor(now);
        TurnTransition {
            from,
            to: self.turn,
        }
    }

    fn pause(&mut self) {
        self.paused = true;
        self.sub_turn = 0.0;
    }

    fn anchor(&mut self, start: Duration) {
        self.frame_start = start;
        self.next_frame_deadline = start + self.turn_duration;
    }
}

fn duration_from_ms(milliseconds: f64) -> Duration {
    Duration::from_micros((milliseconds * 1_000.0).round().max(0.0) as u64)
}
