//! Click-driven cell selection and its blinking highlight overlay.

use std::time::Duration;

use glam::Vec2;
use robot_replay_core::{CellCoord, Rgb, Settings, StateSnapshot, TurnActions};
use robot_replay_rendering::{Canvas, Color, Layer, ObjectHandle, Shape, Style};

/// Share of the highlight color kept when tinting it with an occupying robot's color.
const HIGHLIGHT_BLEND: f32 = 0.7;

/// Highlighted cell and the action target resolved for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Cell the user clicked.
    pub cell: Option<CellCoord>,
    /// Target of the action performed from `cell` on the turn it was selected.
    pub target: Option<CellCoord>,
}

/// Position within the current blink period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlinkPhase {
    /// Time elapsed since the start of the current period.
    pub phase: Duration,
    /// Whether the highlight is shown at this phase.
    pub visible: bool,
}

/// Overlay marking the selected cell and its target.
///
/// Owns at most two canvas objects. Releasing them hides the overlay; the
/// next visible repaint draws them again.
#[derive(Debug, Default)]
struct HighlightSprite {
    selection: Selection,
    cell_handle: Option<ObjectHandle>,
    target_handle: Option<ObjectHandle>,
}

impl HighlightSprite {
    fn new(selection: Selection) -> Self {
        Self {
            selection,
            cell_handle: None,
            target_handle: None,
        }
    }

    fn clear(&mut self, canvas: &mut dyn Canvas) {
        if let Some(handle) = self.cell_handle.take() {
            canvas.remove_object(handle);
        }
        if let Some(handle) = self.target_handle.take() {
            canvas.remove_object(handle);
        }
    }

    fn animate(
        &mut self,
        visible: bool,
        state: &StateSnapshot,
        settings: &Settings,
        canvas: &mut dyn Canvas,
    ) {
        if !visible {
            self.clear(canvas);
            return;
        }

        if let (Some(cell), None) = (self.selection.cell, self.cell_handle) {
            let color = mixed_color(settings.highlight_color, cell, state, settings);
            self.cell_handle = Some(draw_highlight(canvas, cell, color));
        }
        if let (Some(target), None) = (self.selection.target, self.target_handle) {
            let color = mixed_color(settings.target_color, target, state, settings);
            self.target_handle = Some(draw_highlight(canvas, target, color));
        }
    }

    fn handle_count(&self) -> usize {
        usize::from(self.cell_handle.is_some()) + usize::from(self.target_handle.is_some())
    }
}

fn mixed_color(color: Rgb, cell: CellCoord, state: &StateSnapshot, settings: &Settings) -> Rgb {
    match state.robot(cell) {
        Some(robot) => color.blend(
            settings.robot_color(robot.player_id, robot.hp),
            HIGHLIGHT_BLEND,
        ),
        None => color,
    }
}

fn draw_highlight(canvas: &mut dyn Canvas, cell: CellCoord, color: Rgb) -> ObjectHandle {
    canvas.draw_grid_object(
        Vec2::new(cell.column() as f32, cell.row() as f32),
        Shape::Square,
        Layer::HIGHLIGHT,
        Style::filled(Color::from(color)),
    )
}

/// Tracks the selection and drives its highlight independently of turn timing.
#[derive(Debug)]
pub struct SelectionController {
    selection: Selection,
    blink_start: Duration,
    highlight: HighlightSprite,
    blink_enabled: bool,
    blink_visible: Duration,
    blink_period: Duration,
    clear_cell_between_turns: bool,
    clear_target_between_turns: bool,
}

impl SelectionController {
    /// Creates a controller with nothing selected.
    #[must_use]
    pub fn new(settings: &Settings, now: Duration) -> Self {
        Self {
            selection: Selection::default(),
            blink_start: now,
            highlight: HighlightSprite::default(),
            blink_enabled: settings.highlight_cursor_blink,
            blink_visible: Duration::from_millis(u64::from(
                settings.highlight_cursor_blink_interval_ms,
            )),
            blink_period: Duration::from_millis(u64::from(settings.rate_cursor_blink_ms.max(1))),
            clear_cell_between_turns: settings.clear_highlight_between_turns,
            clear_target_between_turns: settings.clear_highlight_target_between_turns,
        }
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Number of canvas objects currently owned by the highlight.
    #[must_use]
    pub fn highlight_handle_count(&self) -> usize {
        self.highlight.handle_count()
    }

    /// Toggles the selection of `cell` and repaints the highlight immediately.
    ///
    /// Clicking the highlighted cell again clears the selection. Otherwise the
    /// target is resolved once from `actions`, the actions of the displayed
    /// turn, and is not re-resolved later.
    pub fn on_cell_clicked(
        &mut self,
        cell: CellCoord,
        now: Duration,
        actions: &TurnActions,
        state: &StateSnapshot,
        settings: &Settings,
        canvas: &mut dyn Canvas,
    ) {
        self.selection = if self.selection.cell == Some(cell) {
            Selection::default()
        } else {
            Selection {
                cell: Some(cell),
                target: actions.get(cell).and_then(|record| record.target),
            }
        };
        self.blink_start = now;
        log::debug!(
            "selection changed to {:?} targeting {:?}",
            self.selection.cell,
            self.selection.target
        );

        self.rebuild_highlight(canvas);
        self.repaint(now, state, settings, canvas);
    }

    /// Applies the configured between-turn clearing and rebuilds the highlight.
    ///
    /// The two clearing switches are independent, so a target may outlive the
    /// cell it was resolved from.
    pub fn on_turn_transition(&mut self, canvas: &mut dyn Canvas) {
        if self.clear_cell_between_turns {
            self.selection.cell = None;
        }
        if self.clear_target_between_turns {
            self.selection.target = None;
        }
        self.rebuild_highlight(canvas);
    }

    /// Position within the blink period at `now`.
    #[must_use]
    pub fn compute_blink_phase(&self, now: Duration) -> BlinkPhase {
        let elapsed = now.saturating_sub(self.blink_start);
        let period = self.blink_period.as_nanos().max(1);
        let phase = Duration::from_nanos((elapsed.as_nanos() % period) as u64);
        BlinkPhase {
            phase,
            visible: !self.blink_enabled || phase < self.blink_visible,
        }
    }

    /// Shows or hides the highlight according to the blink phase at `now`.
    pub fn repaint(
        &mut self,
        now: Duration,
        state: &StateSnapshot,
        settings: &Settings,
        canvas: &mut dyn Canvas,
    ) {
        let visible = self.compute_blink_phase(now).visible;
        self.highlight.animate(visible, state, settings, canvas);
    }

    /// Shows the highlight regardless of the blink phase.
    pub fn repaint_steady(
        &mut self,
        state: &StateSnapshot,
        settings: &Settings,
        canvas: &mut dyn Canvas,
    ) {
        self.highlight.animate(true, state, settings, canvas);
    }

    /// Releases the highlight's canvas objects without changing the selection.
    pub fn release(&mut self, canvas: &mut dyn Canvas) {
        self.highlight.clear(canvas);
    }

    fn rebuild_highlight(&mut self, canvas: &mut dyn Canvas) {
        self.highlight.clear(canvas);
        self.highlight = HighlightSprite::new(self.selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_replay_core::{
        ActionKind, ActionRecord, PlayerId, RobotId, RobotSnapshot,
    };
    use robot_replay_rendering::{BoardGeometry, CanvasObject, RetainedCanvas};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn canvas() -> RetainedCanvas {
        RetainedCanvas::new(BoardGeometry::new(19, 20.0, 0.0, 2.0).expect("valid geometry"))
    }

    fn attacker() -> (TurnActions, StateSnapshot) {
        let cell = CellCoord::new(4, 4);
        let record = ActionRecord {
            kind: ActionKind::Attack,
            target: Some(CellCoord::new(5, 4)),
            robot_id: RobotId::new(9),
            player_id: PlayerId::new(1),
            hp: 50,
            hp_end: 50,
            location: cell,
            location_end: cell,
        };
        let state = StateSnapshot::from_robots([RobotSnapshot {
            robot_id: RobotId::new(9),
            player_id: PlayerId::new(1),
            hp: 50,
            location: cell,
        }]);
        (TurnActions::new(vec![record]), state)
    }

    #[test]
    fn clicking_a_robot_resolves_its_target() {
        let settings = Settings::default();
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));

        controller.on_cell_clicked(CellCoord::new(4, 4), ms(10), &actions, &state, &settings, &mut canvas);

        assert_eq!(
            controller.selection(),
            Selection {
                cell: Some(CellCoord::new(4, 4)),
                target: Some(CellCoord::new(5, 4)),
            }
        );
        assert_eq!(controller.highlight_handle_count(), 2);
        assert_eq!(canvas.count_on_layer(Layer::HIGHLIGHT), 2);
    }

    #[test]
    fn clicking_an_idle_cell_yields_no_target() {
        let settings = Settings::default();
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));

        controller.on_cell_clicked(CellCoord::new(9, 9), ms(0), &actions, &state, &settings, &mut canvas);

        assert_eq!(controller.selection().cell, Some(CellCoord::new(9, 9)));
        assert_eq!(controller.selection().target, None);
        assert_eq!(controller.highlight_handle_count(), 1);
    }

    #[test]
    fn clicking_the_same_cell_twice_clears_everything() {
        let settings = Settings::default();
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));
        let cell = CellCoord::new(4, 4);

        controller.on_cell_clicked(cell, ms(0), &actions, &state, &settings, &mut canvas);
        controller.on_cell_clicked(cell, ms(5), &actions, &state, &settings, &mut canvas);

        assert_eq!(controller.selection(), Selection::default());
        assert_eq!(controller.highlight_handle_count(), 0);
        assert!(canvas.is_empty());
    }

    #[test]
    fn highlight_on_a_robot_is_tinted_with_its_color() {
        let settings = Settings::default();
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));

        controller.on_cell_clicked(CellCoord::new(4, 4), ms(0), &actions, &state, &settings, &mut canvas);

        let expected = Color::from(
            settings
                .highlight_color
                .blend(settings.robot_color(PlayerId::new(1), 50), 0.7),
        );
        let fills: Vec<_> = canvas
            .paint_order()
            .filter_map(|(_, object)| match object {
                CanvasObject::Shape { style, .. } => style.fill,
                _ => None,
            })
            .collect();
        assert_eq!(fills[0], expected);
        assert_eq!(fills[1], Color::from(settings.target_color));
    }

    #[test]
    fn blink_visibility_follows_duty_cycle() {
        let settings = Settings {
            highlight_cursor_blink: true,
            highlight_cursor_blink_interval_ms: 400,
            rate_cursor_blink_ms: 600,
            ..Settings::default()
        };
        let controller = SelectionController::new(&settings, ms(1_000));

        let visible = (0..600)
            .filter(|offset| controller.compute_blink_phase(ms(1_000 + offset)).visible)
            .count();
        assert_eq!(visible, 400);

        for offset in (0..600).step_by(37) {
            assert_eq!(
                controller.compute_blink_phase(ms(1_000 + offset)),
                controller.compute_blink_phase(ms(1_600 + offset))
            );
        }
    }

    #[test]
    fn disabled_blink_is_always_visible() {
        let settings = Settings {
            highlight_cursor_blink: false,
            ..Settings::default()
        };
        let controller = SelectionController::new(&settings, ms(0));

        assert!((0..2_000)
            .step_by(13)
            .all(|offset| controller.compute_blink_phase(ms(offset)).visible));
    }

    #[test]
    fn hidden_phase_releases_highlight_objects() {
        let settings = Settings::default();
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));
        controller.on_cell_clicked(CellCoord::new(4, 4), ms(0), &actions, &state, &settings, &mut canvas);

        controller.repaint(ms(500), &state, &settings, &mut canvas);
        assert_eq!(controller.highlight_handle_count(), 0);
        assert!(canvas.is_empty());

        controller.repaint(ms(650), &state, &settings, &mut canvas);
        assert_eq!(controller.highlight_handle_count(), 2);
    }

    #[test]
    fn turn_clearing_switches_are_independent() {
        let settings = Settings {
            clear_highlight_between_turns: true,
            clear_highlight_target_between_turns: false,
            ..Settings::default()
        };
        let (actions, state) = attacker();
        let mut canvas = canvas();
        let mut controller = SelectionController::new(&settings, ms(0));
        controller.on_cell_clicked(CellCoord::new(4, 4), ms(0), &actions, &state, &settings, &mut canvas);

        controller.on_turn_transition(&mut canvas);

        assert_eq!(controller.selection().cell, None);
        assert_eq!(controller.selection().target, Some(CellCoord::new(5, 4)));
        assert_eq!(controller.highlight_handle_count(), 0);
    }
}
