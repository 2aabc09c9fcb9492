#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays back robot replays in a window.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use robot_replay_core::{MapConfig, Settings};
use robot_replay_playback::Playback;
use robot_replay_rendering::{BoardGeometry, Color, Presentation, RenderingBackend, RetainedCanvas};
use robot_replay_rendering_macroquad::MacroquadBackend;
use robot_replay_world::Replay;

/// Board edge, in pixels, of the initial window.
const DEFAULT_BOARD_PIXELS: f32 = 570.0;
/// Width of the control panel, in pixels.
const PANEL_WIDTH: f32 = 320.0;
/// Seed of the synthetic replay when none is supplied.
const DEFAULT_SEED: u64 = 0x5eed_0f_b075;

/// Plays back a robot game replay with interactive controls.
#[derive(Debug, Parser)]
#[command(name = "robot-replay", version)]
struct Args {
    /// JSON replay to play; a synthetic replay is generated when omitted.
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// TOML file overriding default settings.
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Seed of the synthetic replay.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Length of the synthetic replay in turns.
    #[arg(long)]
    turns: Option<u32>,

    /// Step between turns without interpolating.
    #[arg(long)]
    no_animations: bool,

    /// Playback ticks per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Synchronise presentation with the display refresh rate (default).
    #[arg(long, overrides_with = "no_vsync")]
    vsync: bool,

    /// Render as fast as possible.
    #[arg(long, overrides_with = "vsync")]
    no_vsync: bool,

    /// Print frame timing once per second.
    #[arg(long)]
    show_fps: bool,

    /// Player names, first player first.
    #[arg(long, num_args = 2, value_names = ["FIRST", "SECOND"])]
    names: Option<Vec<String>>,
}

impl Args {
    fn vsync_enabled(&self) -> bool {
        !self.no_vsync
    }
}

/// Entry point for the robot replay command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (replay, map) = load_replay(&args)?;
    let settings = load_settings(args.settings.as_deref())?;
    let settings = apply_overrides(settings, &args, &replay, map.as_ref());
    settings.validate().context("invalid playback settings")?;
    ensure_fits(&replay, &settings)?;

    let mut canvas = RetainedCanvas::new(
        BoardGeometry::new(
            settings.board_size,
            1.0,
            settings.board_margin,
            settings.cell_border_width,
        )
        .context("failed to prepare board canvas")?,
    );
    let frame = Vec2::splat(DEFAULT_BOARD_PIXELS.max(settings.min_board_pixels));
    let mut playback = Playback::new(replay, settings, frame, Duration::ZERO, &mut canvas);

    let presentation = Presentation::new(
        "Robot Replay",
        Color::from_rgb_u8(34, 34, 34),
        PANEL_WIDTH,
        canvas,
    );
    MacroquadBackend::new()
        .with_vsync(args.vsync_enabled())
        .with_show_fps(args.show_fps)
        .run(presentation, move |now, input, canvas| {
            playback.frame(now, input, canvas)
        })
        .context("rendering backend failed")
}

/// Loads the replay file, or generates a synthetic replay together with the
/// map it was played on.
fn load_replay(args: &Args) -> Result<(Replay, Option<MapConfig>)> {
    if let Some(path) = &args.replay {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay {}", path.display()))?;
        let replay = Replay::from_json_str(&json)
            .with_context(|| format!("failed to load replay {}", path.display()))?;
        return Ok((replay, None));
    }

    let map = match args.turns {
        Some(turns) => MapConfig::default_map()
            .with_turns(turns)
            .with_context(|| format!("cannot build a {turns} turn map"))?,
        None => MapConfig::default_map(),
    };
    log::info!("no replay supplied; generating one from seed {}", args.seed);
    let replay = Replay::synthetic(&map, args.seed);
    Ok((replay, Some(map)))
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse settings {}", path.display()))
}

/// Layers command-line flags and replay metadata over file settings.
///
/// A synthetic replay brings its own map, which replaces the board described
/// by the settings.
fn apply_overrides(
    mut settings: Settings,
    args: &Args,
    replay: &Replay,
    map: Option<&MapConfig>,
) -> Settings {
    if let Some(map) = map {
        settings = settings.with_map(map);
    }
    if args.no_animations {
        settings.animations = false;
    }
    if let Some(fps) = args.fps {
        settings.fps = fps;
    }
    if let Some(names) = replay.names() {
        settings.names = names.clone();
    }
    if let Some([first, second]) = args.names.as_deref() {
        settings.names = [first.clone(), second.clone()];
    }
    settings
}

fn ensure_fits(replay: &Replay, settings: &Settings) -> Result<()> {
    replay.check_fits(settings.board_size).with_context(|| {
        format!(
            "replay does not fit the {0}x{0} board",
            settings.board_size
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(arguments: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("robot-replay").chain(arguments.iter().copied()))
            .expect("arguments should parse")
    }

    fn short_replay() -> Replay {
        Replay::synthetic(
            &MapConfig::default_map()
                .with_turns(5)
                .expect("short map is valid"),
            1,
        )
    }

    #[test]
    fn defaults_generate_a_synthetic_replay_with_vsync() {
        let args = parse(&[]);

        assert!(args.replay.is_none());
        assert_eq!(args.seed, DEFAULT_SEED);
        assert!(args.vsync_enabled());
        assert!(!args.show_fps);
    }

    #[test]
    fn last_vsync_flag_wins() {
        assert!(!parse(&["--vsync", "--no-vsync"]).vsync_enabled());
        assert!(parse(&["--no-vsync", "--vsync"]).vsync_enabled());
    }

    #[test]
    fn flags_override_settings() {
        let args = parse(&["--no-animations", "--fps", "30", "--names", "Ada", "Bob"]);

        let settings = apply_overrides(Settings::default(), &args, &short_replay(), None);

        assert!(!settings.animations);
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.names, ["Ada".to_owned(), "Bob".to_owned()]);
    }

    #[test]
    fn synthetic_replay_honours_turn_count() {
        let args = parse(&["--turns", "12", "--seed", "9"]);

        let (replay, map) = load_replay(&args).expect("synthetic replay");

        assert!(map.is_some());
        assert_eq!(
            robot_replay_core::ReplaySource::max_turn(&replay),
            12
        );
    }

    #[test]
    fn synthetic_replays_bring_their_board() {
        let args = parse(&[]);
        let (replay, map) = load_replay(&args).expect("synthetic replay");
        let small = Settings {
            board_size: 10,
            obstacles: Default::default(),
            ..Settings::default()
        };

        let settings = apply_overrides(small, &args, &replay, map.as_ref());

        assert_eq!(settings.board_size, 19);
        assert_eq!(&settings.obstacles, MapConfig::default_map().obstacles());
        assert!(ensure_fits(&replay, &settings).is_ok());
    }

    #[test]
    fn replays_larger_than_the_board_are_rejected() {
        let tiny = Settings {
            board_size: 2,
            ..Settings::default()
        };

        let error = ensure_fits(&short_replay(), &tiny).expect_err("replay exceeds the board");

        assert!(error.to_string().contains("does not fit the 2x2 board"));
    }

    #[test]
    fn missing_settings_file_is_reported() {
        let error = load_settings(Some(Path::new("/nonexistent/settings.toml")))
            .expect_err("missing file should fail");

        assert!(error.to_string().contains("failed to read settings"));
    }

    #[test]
    fn settings_files_override_selected_fields() {
        let settings: Settings = toml::from_str(
            "turn_interval_ms = 500\nbot_shape = \"circle\"\nnames = [\"North\", \"South\"]\n",
        )
        .expect("valid settings");

        assert_eq!(settings.turn_interval_ms, 500);
        assert_eq!(settings.bot_shape, robot_replay_core::BotShape::Circle);
        assert_eq!(settings.fps, Settings::default().fps);
        assert_eq!(settings.names[1], "South");
    }
}
