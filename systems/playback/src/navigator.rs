//! Manual turn navigation layered over [`PlaybackClock`].
//!
//! Every navigation pauses playback first, then jumps. Callers are expected
//! to rebuild the displayed turn from the returned transition and repaint.

use std::time::Duration;

use crate::clock::{PlaybackClock, TurnTransition};

/// Shows the turn after the displayed one.
pub fn step_forward(clock: &mut PlaybackClock, now: Duration) -> TurnTransition {
    step(clock, 1, now)
}

/// Shows the turn before the displayed one.
pub fn step_backward(clock: &mut PlaybackClock, now: Duration) -> TurnTransition {
    step(clock, -1, now)
}

/// Rewinds to the first turn.
pub fn restart(clock: &mut PlaybackClock, now: Duration) -> TurnTransition {
    let delta = 1 - i64::from(clock.display_turn());
    step(clock, delta, now)
}

fn step(clock: &mut PlaybackClock, delta: i64, now: Duration) -> TurnTransition {
    if !clock.is_paused() {
        clock.toggle_pause(now);
    }
    clock.jump_to(delta, now)
}
