#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replay playback controller.
//!
//! Reconciles the discrete, per-turn replay with continuous presentation: a
//! wall-clock driven turn clock, manual navigation, per-turn sprite rebuilds,
//! a blinking selection overlay and a debounced viewport. Everything runs on
//! the caller's thread; [`Playback::frame`] is the single entry point a
//! backend calls once per rendered frame.

pub mod clock;
pub mod info;
pub mod navigator;
pub mod scheduler;
pub mod selection;
pub mod sprites;
pub mod viewport;

use std::time::Duration;

use glam::Vec2;
use robot_replay_core::{ReplaySource, Settings};
use robot_replay_rendering::{Canvas, ControlInput, FrameInput, PanelView};

pub use clock::{PlaybackClock, TurnTransition};
pub use info::{HighlightDetail, InfoPanel, ScoreLine};
pub use scheduler::FrameScheduler;
pub use selection::{BlinkPhase, Selection, SelectionController};
pub use sprites::{RobotSprite, SpriteContext, SpriteLifecycleManager};
pub use viewport::ViewportController;

/// Playback state of a single loaded replay.
#[derive(Debug)]
pub struct Playback<R> {
    replay: R,
    settings: Settings,
    clock: PlaybackClock,
    sprites: SpriteLifecycleManager,
    selection: SelectionController,
    viewport: ViewportController,
    scheduler: FrameScheduler,
    speed_offset_ms: f64,
    show_arrows: bool,
    info: InfoPanel,
}

impl<R> Playback<R>
where
    R: ReplaySource,
{
    /// Lays out the board for `frame` and shows the first turn, paused.
    pub fn new(
        replay: R,
        settings: Settings,
        frame: Vec2,
        now: Duration,
        canvas: &mut dyn Canvas,
    ) -> Self {
        let max_turn = replay.max_turn();
        let clock = PlaybackClock::new(&settings, max_turn, now);
        let info = InfoPanel::new(
            &settings,
            replay.state(clock.display_turn()),
            clock.display_turn(),
            max_turn,
            None,
        );
        let mut playback = Self {
            sprites: SpriteLifecycleManager::new(),
            selection: SelectionController::new(&settings, now),
            viewport: ViewportController::new(&settings, frame),
            scheduler: FrameScheduler::new(settings.fps, now),
            speed_offset_ms: 0.0,
            show_arrows: settings.show_arrows,
            clock,
            info,
            replay,
            settings,
        };
        playback.recompute_viewport(now, canvas);
        log::info!("playback ready with {max_turn} turns");
        playback
    }

    /// Applies the frame's controls in order, then runs the scheduled tick if
    /// it is due.
    pub fn frame(&mut self, now: Duration, input: FrameInput, canvas: &mut dyn Canvas) -> PanelView {
        for control in input.controls {
            self.handle(control, now, canvas);
        }
        if self.scheduler.poll(now) {
            self.tick(now, canvas);
        }
        self.panel_view()
    }

    /// Advances playback by one scheduled step.
    pub fn tick(&mut self, now: Duration, canvas: &mut dyn Canvas) {
        self.clock.set_speed(self.speed_offset_ms);
        if let Some(transition) = self.clock.tick(now) {
            log::debug!("turn {} -> {}", transition.from, transition.to);
            self.turn_changed(canvas);
        }
        self.paint(now, canvas);
        if self.viewport.take_pending() {
            self.recompute_viewport(now, canvas);
        }
        self.refresh_info();
    }

    /// Applies a single user control synchronously.
    pub fn handle(&mut self, control: ControlInput, now: Duration, canvas: &mut dyn Canvas) {
        match control {
            ControlInput::StepBackward => {
                let transition = navigator::step_backward(&mut self.clock, now);
                self.navigated(transition, now, canvas);
            }
            ControlInput::StepForward => {
                let transition = navigator::step_forward(&mut self.clock, now);
                self.navigated(transition, now, canvas);
            }
            ControlInput::Restart => {
                let transition = navigator::restart(&mut self.clock, now);
                self.navigated(transition, now, canvas);
            }
            ControlInput::TogglePause => {
                self.clock.toggle_pause(now);
                self.paint(now, canvas);
            }
            ControlInput::SetSpeedOffset(offset) => {
                self.speed_offset_ms = f64::from(offset);
            }
            ControlInput::SetShowArrows(show_arrows) => {
                if self.show_arrows != show_arrows {
                    self.show_arrows = show_arrows;
                    self.paint(now, canvas);
                }
            }
            ControlInput::Click(pixel) => self.click(pixel, now, canvas),
            ControlInput::Resize { width, height } => self.viewport.on_resize(width, height),
        }
        self.refresh_info();
    }

    /// Rebuilds sprites and the highlight for the displayed turn.
    pub fn turn_changed(&mut self, canvas: &mut dyn Canvas) {
        let display_turn = self.clock.display_turn();
        self.sprites
            .on_turn_transition(display_turn, &self.replay, canvas);
        self.selection.on_turn_transition(canvas);
    }

    /// Redraws sprites and the highlight for the current sub-turn and blink
    /// phase, then restores layer ordering.
    pub fn paint(&mut self, now: Duration, canvas: &mut dyn Canvas) {
        let context = SpriteContext {
            settings: &self.settings,
            show_arrows: self.show_arrows,
        };
        self.sprites.animate_all(
            self.clock.display_turn(),
            self.clock.sub_turn(),
            context,
            canvas,
        );

        let state = self.replay.state(self.clock.display_turn());
        if self.settings.animations {
            self.selection.repaint(now, state, &self.settings, canvas);
        } else {
            self.selection.repaint_steady(state, &self.settings, canvas);
        }
        canvas.raise_layers();
    }

    /// Clears the canvas, lays the board out for the current frame and
    /// redraws everything from scratch.
    pub fn recompute_viewport(&mut self, now: Duration, canvas: &mut dyn Canvas) {
        self.sprites.destroy_all(canvas);
        self.selection.release(canvas);
        self.viewport.recompute(&self.settings, canvas);
        self.sprites
            .on_turn_transition(self.clock.display_turn(), &self.replay, canvas);
        self.paint(now, canvas);
    }

    /// Scores, turn counter and selection summary for the displayed turn.
    #[must_use]
    pub fn info(&self) -> &InfoPanel {
        &self.info
    }

    /// Control panel state for the backend.
    #[must_use]
    pub fn panel_view(&self) -> PanelView {
        PanelView {
            lines: self.info.lines(self.settings.text_color),
            paused: self.clock.is_paused(),
            speed_offset: self.clock.speed_offset_ms() as f32,
            speed_range: self.clock.speed_range_ms() as f32,
            show_arrows: self.show_arrows,
        }
    }

    /// Turn clock.
    #[must_use]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Live sprites of the displayed turn.
    #[must_use]
    pub fn sprites(&self) -> &SpriteLifecycleManager {
        &self.sprites
    }

    /// Selection and highlight state.
    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Frame size and pending resize state.
    #[must_use]
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Replay being played back.
    #[must_use]
    pub fn replay(&self) -> &R {
        &self.replay
    }

    /// Session settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether movement arrows are drawn.
    #[must_use]
    pub const fn show_arrows(&self) -> bool {
        self.show_arrows
    }

    fn navigated(&mut self, transition: TurnTransition, now: Duration, canvas: &mut dyn Canvas) {
        log::debug!("navigated from turn {} to {}", transition.from, transition.to);
        self.turn_changed(canvas);
        self.paint(now, canvas);
    }

    fn click(&mut self, pixel: Vec2, now: Duration, canvas: &mut dyn Canvas) {
        let Some(cell) = canvas.geometry().pixel_to_cell(pixel) else {
            log::debug!("ignoring click outside the board at {pixel}");
            return;
        };

        let display_turn = self.clock.display_turn();
        self.selection.on_cell_clicked(
            cell,
            now,
            self.replay.actions_on_turn(display_turn),
            self.replay.state(display_turn),
            &self.settings,
            canvas,
        );
        canvas.raise_layers();
    }

    fn refresh_info(&mut self) {
        let display_turn = self.clock.display_turn();
        self.info = InfoPanel::new(
            &self.settings,
            self.replay.state(display_turn),
            display_turn,
            self.clock.max_turn(),
            self.selection.selection().cell,
        );
    }
}
