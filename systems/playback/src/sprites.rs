//! Per-turn robot sprites and the manager that rebuilds them on every turn
//! transition.

use glam::Vec2;
use robot_replay_core::{ActionKind, ActionRecord, BotShape, CellCoord, ReplaySource, Settings};
use robot_replay_rendering::{Canvas, Color, Layer, ObjectHandle, Shape, Style};

/// Thickness of attack markers and arrows, in pixels.
const STROKE_WIDTH: f32 = 2.0;

/// Read-only inputs shared by every sprite during one animation pass.
#[derive(Clone, Copy, Debug)]
pub struct SpriteContext<'a> {
    /// Presentation settings.
    pub settings: &'a Settings,
    /// Whether movement and targeting arrows are drawn.
    pub show_arrows: bool,
}

/// Visual representation of one robot's action on a single turn.
///
/// A sprite exclusively owns the canvas objects it created and is the only
/// entity that removes them.
#[derive(Debug)]
pub struct RobotSprite {
    cell: CellCoord,
    record: ActionRecord,
    turn: u32,
    handles: Vec<ObjectHandle>,
}

impl RobotSprite {
    fn new(cell: CellCoord, record: ActionRecord, turn: u32) -> Self {
        Self {
            cell,
            record,
            turn,
            handles: Vec::new(),
        }
    }

    /// Cell the robot started the turn on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Turn the sprite was built for.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Canvas objects currently owned by the sprite.
    #[must_use]
    pub fn handles(&self) -> &[ObjectHandle] {
        &self.handles
    }

    fn clear(&mut self, canvas: &mut dyn Canvas) {
        for handle in self.handles.drain(..) {
            canvas.remove_object(handle);
        }
    }

    /// Redraws the sprite `progress` of the way through its turn.
    fn animate(&mut self, progress: f32, context: SpriteContext<'_>, canvas: &mut dyn Canvas) {
        self.clear(canvas);

        let settings = context.settings;
        let record = &self.record;
        let start = cell_position(record.location);
        let end = match record.kind {
            ActionKind::Move => cell_position(record.location_end),
            ActionKind::Attack | ActionKind::Guard | ActionKind::Suicide => start,
        };
        let position = start.lerp(end, progress);

        let start_color = settings.robot_color(record.player_id, record.hp);
        let end_color = settings.robot_color(record.player_id, record.hp_end);
        let fill = start_color.blend(end_color, 1.0 - progress);
        let alpha = if record.hp_end == 0 { 1.0 - progress } else { 1.0 };
        let shape = match settings.bot_shape {
            BotShape::Square => Shape::Square,
            BotShape::Circle => Shape::Circle,
        };
        self.handles.push(canvas.draw_grid_object(
            position,
            shape,
            Layer::ROBOTS,
            Style::filled(Color::from(fill).with_alpha(alpha)),
        ));

        let hp = if progress < 0.5 { record.hp } else { record.hp_end };
        self.handles.push(canvas.draw_text(
            position,
            &hp.to_string(),
            Color::from(settings.text_color),
        ));

        let marker_color = Color::from(settings.player_color(record.player_id));
        match (record.kind, record.target) {
            (ActionKind::Attack, Some(target)) => {
                self.handles.push(canvas.draw_grid_object(
                    cell_position(target),
                    Shape::Circle,
                    Layer::EFFECTS,
                    Style::stroked(marker_color.with_alpha(1.0 - progress), STROKE_WIDTH),
                ));
            }
            (ActionKind::Suicide, _) => {
                self.handles.push(canvas.draw_grid_object(
                    start,
                    Shape::Square,
                    Layer::EFFECTS,
                    Style::stroked(marker_color.with_alpha(1.0 - progress), STROKE_WIDTH * 2.0),
                ));
            }
            _ => {}
        }

        if context.show_arrows {
            if let Some(target) = record.target {
                let offset = Vec2::splat(canvas.geometry().cell_extent() / 2.0);
                self.handles.push(canvas.draw_line(
                    start,
                    cell_position(target),
                    offset,
                    Layer::ARROWS,
                    Style::stroked(marker_color, STROKE_WIDTH),
                ));
            }
        }
    }
}

fn cell_position(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}

/// Owns the live sprite set and rebuilds it on every turn transition.
///
/// Sprites are never reused across turns: each transition destroys every
/// live sprite and creates one per action record of the new turn.
#[derive(Debug, Default)]
pub struct SpriteLifecycleManager {
    sprites: Vec<RobotSprite>,
}

impl SpriteLifecycleManager {
    /// Creates a manager without live sprites.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live sprites in creation order.
    #[must_use]
    pub fn sprites(&self) -> &[RobotSprite] {
        &self.sprites
    }

    /// Number of live sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Reports whether no sprite is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Replaces every live sprite with fresh sprites for `display_turn`.
    ///
    /// Sprites are created in the replay's natural action order.
    pub fn on_turn_transition(
        &mut self,
        display_turn: u32,
        replay: &dyn ReplaySource,
        canvas: &mut dyn Canvas,
    ) {
        self.destroy_all(canvas);

        let actions = replay.actions_on_turn(display_turn);
        self.sprites.extend(
            actions
                .iter()
                .map(|(cell, record)| RobotSprite::new(cell, *record, display_turn)),
        );
        log::debug!(
            "built {} robot sprites for turn {display_turn}",
            self.sprites.len()
        );
    }

    /// Destroys every live sprite, releasing all of their canvas objects.
    pub fn destroy_all(&mut self, canvas: &mut dyn Canvas) {
        for mut sprite in self.sprites.drain(..) {
            sprite.clear(canvas);
        }
    }

    /// Redraws every live sprite interpolated `sub_turn` of the way through
    /// `display_turn`.
    pub fn animate_all(
        &mut self,
        display_turn: u32,
        sub_turn: f64,
        context: SpriteContext<'_>,
        canvas: &mut dyn Canvas,
    ) {
        let progress = sub_turn.clamp(0.0, 1.0) as f32;
        for sprite in &mut self.sprites {
            debug_assert_eq!(
                sprite.turn, display_turn,
                "sprite built for turn {} animated on turn {display_turn}",
                sprite.turn
            );
            sprite.animate(progress, context, canvas);
        }
    }
}
