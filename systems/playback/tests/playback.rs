use std::time::Duration;

use glam::Vec2;
use robot_replay_core::{CellCoord, MapConfig, ReplaySource, Settings};
use robot_replay_playback::Playback;
use robot_replay_rendering::{
    BoardGeometry, Canvas, ControlInput, FrameInput, Layer, RetainedCanvas,
};
use robot_replay_world::Replay;

const FRAME: f32 = 570.0;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn input(controls: Vec<ControlInput>) -> FrameInput {
    FrameInput { controls }
}

fn canvas() -> RetainedCanvas {
    RetainedCanvas::new(BoardGeometry::new(19, 1.0, 0.0, 0.0).expect("valid geometry"))
}

fn start(settings: Settings) -> (Playback<Replay>, RetainedCanvas) {
    let replay = Replay::synthetic(&MapConfig::default_map(), 42);
    let mut canvas = canvas();
    let playback = Playback::new(replay, settings, Vec2::splat(FRAME), ms(0), &mut canvas);
    (playback, canvas)
}

fn cell_center(canvas: &RetainedCanvas, cell: CellCoord) -> Vec2 {
    let geometry = canvas.geometry();
    geometry.grid_to_pixel(Vec2::new(cell.column() as f32, cell.row() as f32))
        + Vec2::splat(geometry.cell_size() / 2.0)
}

#[test]
fn starts_paused_on_the_first_turn_with_its_sprites() {
    let (playback, canvas) = start(Settings::default());

    assert!(playback.clock().is_paused());
    assert_eq!(playback.clock().display_turn(), 1);
    assert_eq!(
        playback.sprites().len(),
        playback.replay().actions_on_turn(1).len()
    );
    assert_eq!(canvas.geometry().cell_size(), 30.0);
    assert_eq!(canvas.count_on_layer(Layer::BACKGROUND), 19 * 19);
    assert_eq!(playback.info().turn_text(), "Turn: 1/100");
}

#[test]
fn stepping_forward_past_the_end_stops_on_the_last_turn() {
    let (mut playback, mut canvas) = start(Settings::default());

    for press in 0..150 {
        let _ = playback.frame(ms(press), input(vec![ControlInput::StepForward]), &mut canvas);
    }

    assert_eq!(playback.clock().turn(), 100);
    assert!(playback.clock().is_paused());
    assert_eq!(
        playback.sprites().len(),
        playback.replay().actions_on_turn(100).len()
    );
    assert!(playback.sprites().sprites().iter().all(|sprite| sprite.turn() == 100));
}

#[test]
fn playing_across_a_turn_boundary_rebuilds_sprites() {
    let (mut playback, mut canvas) = start(Settings::default());
    let _ = playback.frame(ms(0), input(vec![ControlInput::TogglePause]), &mut canvas);
    let _ = playback.frame(ms(150), FrameInput::default(), &mut canvas);
    assert_eq!(playback.clock().display_turn(), 1);
    let previous: Vec<_> = playback
        .sprites()
        .sprites()
        .iter()
        .flat_map(|sprite| sprite.handles().to_vec())
        .collect();
    assert!(!previous.is_empty());

    let _ = playback.frame(ms(300), FrameInput::default(), &mut canvas);

    assert_eq!(playback.clock().turn(), 2);
    assert_eq!(
        playback.sprites().len(),
        playback.replay().actions_on_turn(2).len()
    );
    assert!(previous.iter().all(|handle| !canvas.contains(*handle)));
}

#[test]
fn restart_twice_matches_restart_once() {
    let (mut playback, mut canvas) = start(Settings::default());
    let _ = playback.frame(
        ms(0),
        input(vec![
            ControlInput::StepForward,
            ControlInput::StepForward,
            ControlInput::TogglePause,
        ]),
        &mut canvas,
    );
    let _ = playback.frame(ms(100), FrameInput::default(), &mut canvas);

    let _ = playback.frame(ms(200), input(vec![ControlInput::Restart]), &mut canvas);
    let once = (
        playback.clock().turn(),
        playback.clock().sub_turn(),
        playback.clock().is_paused(),
        playback.sprites().len(),
    );
    let _ = playback.frame(ms(250), input(vec![ControlInput::Restart]), &mut canvas);
    let twice = (
        playback.clock().turn(),
        playback.clock().sub_turn(),
        playback.clock().is_paused(),
        playback.sprites().len(),
    );

    assert_eq!(once.0, 1);
    assert_eq!(once.1, 0.0);
    assert!(once.2);
    assert_eq!(once, twice);
}

#[test]
fn clicking_a_robot_selects_it_and_its_target() {
    let (mut playback, mut canvas) = start(Settings::default());
    let robot = *playback
        .replay()
        .state(1)
        .robots()
        .next()
        .expect("robots spawn on the first turn");
    let expected_target = playback
        .replay()
        .actions_on_turn(1)
        .get(robot.location)
        .and_then(|record| record.target);
    let pixel = cell_center(&canvas, robot.location);

    let view = playback.frame(ms(10), input(vec![ControlInput::Click(pixel)]), &mut canvas);

    let selection = playback.selection().selection();
    assert_eq!(selection.cell, Some(robot.location));
    assert_eq!(selection.target, expected_target);
    assert!(canvas.count_on_layer(Layer::HIGHLIGHT) >= 1);
    let highlighted = format!(
        "Highlighted: {}; Bot {}",
        robot.location,
        robot.robot_id.get()
    );
    assert!(view.lines.iter().any(|line| line.text == highlighted));

    let _ = playback.frame(ms(20), input(vec![ControlInput::Click(pixel)]), &mut canvas);
    assert_eq!(playback.selection().selection().cell, None);
    assert_eq!(canvas.count_on_layer(Layer::HIGHLIGHT), 0);
}

#[test]
fn clicks_outside_the_board_are_ignored() {
    let (mut playback, mut canvas) = start(Settings::default());

    let _ = playback.frame(
        ms(0),
        input(vec![ControlInput::Click(Vec2::new(FRAME + 40.0, 10.0))]),
        &mut canvas,
    );

    assert_eq!(playback.selection().selection().cell, None);
}

#[test]
fn turn_changes_clear_the_selection_by_default() {
    let (mut playback, mut canvas) = start(Settings::default());
    let pixel = cell_center(&canvas, CellCoord::new(9, 9));
    let _ = playback.frame(ms(0), input(vec![ControlInput::Click(pixel)]), &mut canvas);
    assert_eq!(playback.selection().selection().cell, Some(CellCoord::new(9, 9)));

    let _ = playback.frame(ms(20), input(vec![ControlInput::StepForward]), &mut canvas);

    assert_eq!(playback.selection().selection().cell, None);
    assert_eq!(playback.selection().selection().target, None);
}

fn resize(width: f32, height: f32) -> FrameInput {
    input(vec![ControlInput::Resize { width, height }])
}

#[test]
fn startup_size_report_is_ignored_and_a_single_resize_relayouts() {
    let (mut playback, mut canvas) = start(Settings::default());
    let initial = canvas.geometry();

    let _ = playback.frame(ms(0), resize(FRAME, FRAME), &mut canvas);
    let _ = playback.frame(ms(20), FrameInput::default(), &mut canvas);
    assert_eq!(canvas.geometry(), initial);

    let _ = playback.frame(ms(40), resize(950.0, 950.0), &mut canvas);
    for step in 3..60 {
        let _ = playback.frame(ms(step * 20), FrameInput::default(), &mut canvas);
    }

    assert_eq!(playback.viewport().frame(), Vec2::new(950.0, 950.0));
    assert_eq!(canvas.geometry().cell_size(), 50.0);
    assert_eq!(canvas.count_on_layer(Layer::BACKGROUND), 19 * 19);
    assert_eq!(
        playback.sprites().len(),
        playback.replay().actions_on_turn(1).len()
    );
}

#[test]
fn bursts_of_resizes_relayout_once_for_the_last_size() {
    let (mut playback, mut canvas) = start(Settings::default());
    let _ = playback.frame(ms(0), resize(FRAME, FRAME), &mut canvas);
    let _ = playback.frame(ms(20), FrameInput::default(), &mut canvas);

    let _ = playback.frame(
        ms(40),
        input(vec![
            ControlInput::Resize {
                width: 900.0,
                height: 900.0,
            },
            ControlInput::Resize {
                width: 380.0,
                height: 500.0,
            },
        ]),
        &mut canvas,
    );

    assert_eq!(canvas.geometry().cell_size(), 20.0);
    assert_eq!(canvas.count_on_layer(Layer::BACKGROUND), 19 * 19);
}

#[test]
fn tiny_frames_fall_back_to_the_minimum_board() {
    let (mut playback, mut canvas) = start(Settings::default());
    let _ = playback.frame(ms(0), resize(FRAME, FRAME), &mut canvas);
    let _ = playback.frame(ms(20), FrameInput::default(), &mut canvas);
    let _ = playback.frame(ms(40), resize(12.0, 3.0), &mut canvas);

    assert!((canvas.geometry().board_pixels() - 250.0).abs() < 1e-3);
}

#[test]
fn maximum_deceleration_slows_turns_by_the_plain_offset() {
    let (mut playback, mut canvas) = start(Settings::default());

    let view = playback.frame(
        ms(0),
        input(vec![ControlInput::SetSpeedOffset(-1_000.0)]),
        &mut canvas,
    );

    assert_eq!(playback.clock().turn_duration(), ms(450));
    assert_eq!(view.speed_offset, -150.0);
    assert_eq!(view.speed_range, 150.0);
}

#[test]
fn toggling_arrows_repaints_immediately() {
    let (mut playback, mut canvas) = start(Settings::default());
    let targeted = playback
        .replay()
        .actions_on_turn(1)
        .iter()
        .filter(|(_, record)| record.target.is_some())
        .count();
    assert_eq!(canvas.count_on_layer(Layer::ARROWS), 0);

    let view = playback.frame(ms(0), input(vec![ControlInput::SetShowArrows(true)]), &mut canvas);

    assert!(view.show_arrows);
    assert_eq!(canvas.count_on_layer(Layer::ARROWS), targeted);
}

#[test]
fn discrete_playback_steps_at_deadlines() {
    let settings = Settings {
        animations: false,
        ..Settings::default()
    };
    let (mut playback, mut canvas) = start(settings);
    let _ = playback.frame(ms(0), input(vec![ControlInput::TogglePause]), &mut canvas);

    let _ = playback.frame(ms(300), FrameInput::default(), &mut canvas);
    assert_eq!(playback.clock().turn(), 1);

    let _ = playback.frame(ms(320), FrameInput::default(), &mut canvas);
    assert_eq!(playback.clock().turn(), 2);
    assert_eq!(playback.clock().sub_turn(), 0.0);
}

#[test]
fn repeated_frames_do_not_leak_canvas_objects() {
    let (mut playback, mut canvas) = start(Settings::default());
    let _ = playback.frame(ms(0), FrameInput::default(), &mut canvas);
    let live = canvas.len();

    for step in 1..30 {
        let _ = playback.frame(ms(step * 20), FrameInput::default(), &mut canvas);
    }

    assert_eq!(canvas.len(), live);
}
