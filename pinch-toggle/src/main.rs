//! pinch-toggle - turn a thumb/index pinch into a debounced keypress
//!
//! Reads hand landmarks frame by frame from an external detector, measures
//! thumb-to-index and thumb-to-middle fingertip distances, and presses a key
//! when the pinch forms, at most once per cooldown.

mod effector;
mod gesture;
mod pipeline;
mod source;
mod state;
mod timing;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use effector::{CommandEffector, EffectorType, KeySpec};
use gesture::{GestureConfig, RearmPolicy};
use pipeline::PipelineConfig;
use source::{DetectorConfig, SourceType};
use state::ToggleState;
use timing::FrameTiming;

#[derive(Parser, Debug)]
#[command(
    name = "pinch-toggle",
    about = "Press a key when a thumb/index pinch is seen in hand landmark frames"
)]
struct Cli {
    /// Landmark source: stdin, replay, or command
    #[arg(long, default_value = "stdin")]
    source: String,

    /// JSON Lines file to replay (with --source replay)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Detector command line, e.g. "python3 hand_detect.py" (with --source command)
    #[arg(long)]
    detector: Option<String>,

    /// Minimum palm detection confidence passed to the detector
    #[arg(long, default_value_t = 0.8)]
    min_detection_confidence: f64,

    /// Minimum landmark tracking confidence passed to the detector
    #[arg(long, default_value_t = 0.5)]
    min_tracking_confidence: f64,

    /// Action effector: command, keyboard, or log
    #[arg(long, default_value = "command")]
    effector: String,

    /// Key to press (space, enter, tab, escape, backspace, or one character)
    #[arg(long, default_value = "space")]
    key: KeySpec,

    /// Key injection command for --effector command (default: xdotool key <key>)
    #[arg(long)]
    key_command: Option<String>,

    /// Maximum thumb-to-index distance in pixels
    #[arg(long, default_value_t = 20.0)]
    index_threshold: f64,

    /// Minimum thumb-to-middle distance in pixels
    #[arg(long, default_value_t = 80.0)]
    middle_threshold: f64,

    /// Minimum seconds between key presses
    #[arg(long, default_value_t = 1.0)]
    cooldown: f64,

    /// Re-arm after the cooldown alone, or only once the pinch is released
    #[arg(long, default_value = "cooldown")]
    rearm: String,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<f64>,

    /// Seconds between status log lines
    #[arg(long, default_value_t = 60.0)]
    status_interval: f64,

    /// Per-frame latency budget in milliseconds
    #[arg(long, default_value_t = 33.3)]
    frame_budget_ms: f64,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn seconds(name: &str, secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--{name} must be a non-negative number of seconds, got {secs}"))
}

/// `program [args…]` for the detector subprocess backend.
fn detector_command(line: &str) -> anyhow::Result<SourceType> {
    let mut argv = CommandEffector::split_command_line(line).into_iter();
    let program = argv.next().context("--detector command is empty")?;
    Ok(SourceType::Command {
        program,
        args: argv.collect(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("pinch-toggle {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinch_toggle=info".into()),
        )
        .init();

    info!("pinch-toggle v{} starting", env!("CARGO_PKG_VERSION"));

    let rearm = match cli.rearm.as_str() {
        "cooldown" => RearmPolicy::Cooldown,
        "release" => RearmPolicy::Release,
        other => anyhow::bail!("unknown rearm policy: {other}. Use: cooldown or release"),
    };
    let gesture = GestureConfig {
        index_threshold: cli.index_threshold,
        middle_threshold: cli.middle_threshold,
        cooldown_secs: cli.cooldown,
        rearm,
    };

    let detector = DetectorConfig {
        min_detection_confidence: cli.min_detection_confidence,
        min_tracking_confidence: cli.min_tracking_confidence,
    };

    let source_type = match cli.source.as_str() {
        "stdin" => SourceType::Stdin,
        "replay" => SourceType::Replay(
            cli.replay
                .context("--source replay needs --replay <FILE>")?,
        ),
        "command" => {
            let line = cli
                .detector
                .context("--source command needs --detector <COMMAND>")?;
            detector_command(&line)?
        }
        other => anyhow::bail!("unknown source: {other}. Use: stdin, replay, or command"),
    };

    let effector_type = match cli.effector.as_str() {
        "command" => EffectorType::Command(
            cli.key_command
                .as_deref()
                .map(CommandEffector::split_command_line)
                .unwrap_or_default(),
        ),
        "keyboard" => EffectorType::Keyboard,
        "log" => EffectorType::Log,
        other => anyhow::bail!("unknown effector: {other}. Use: command, keyboard, or log"),
    };

    let pipeline_config = PipelineConfig {
        exit_after: cli
            .exit_after
            .map(|secs| seconds("exit-after", secs))
            .transpose()?,
        status_interval: seconds("status-interval", cli.status_interval)?,
    };

    let mut state = ToggleState::new(gesture, FrameTiming::new(1000, cli.frame_budget_ms))?;
    let mut effector = effector::open(effector_type, cli.key)?;
    let source = source::open(source_type, &detector)?;

    pipeline::install_signal_handlers();
    let reason = pipeline::run(&mut state, source, effector.as_mut(), &pipeline_config);
    info!("pinch-toggle exiting ({})", reason.as_str());
    Ok(())
}
