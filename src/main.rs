//! spark-flow - terminal flow field exhibit.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use spark_flow::config::ExhibitConfig;
use spark_flow::error::ExhibitError;
use spark_flow::pipeline::{run, run_headless, RunOptions};
use spark_flow::sequencer::PlaybackMode;

/// Config file read when `--config` is not given.
const DEFAULT_CONFIG: &str = "spark-flow.toml";

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SPARK_FLOW_LOG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Vector-field particle exhibit for the terminal")]
struct Cli {
    /// Path to config TOML (defaults to ./spark-flow.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Particle count (overrides config)
    #[arg(long)]
    particles: Option<usize>,

    /// Program to start playing immediately
    #[arg(long)]
    program: Option<String>,

    /// Playback mode: normal, loop or reverse
    #[arg(long, default_value_t = PlaybackMode::Normal)]
    mode: PlaybackMode,

    /// Text that picks the flow profile while nothing is focused
    #[arg(long)]
    text: Option<String>,

    /// RNG seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Run without a terminal, logging to stderr
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Simulated terminal size in headless mode, as COLSxROWS
    #[arg(long, default_value = "80x24", value_parser = parse_size)]
    size: (u16, u16),

    /// Write logs here when running fullscreen (otherwise they are dropped)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_size(s: &str) -> Result<(u16, u16), String> {
    let (cols, rows) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {s:?}"))?;
    let cols = cols.trim().parse().map_err(|e| format!("bad column count: {e}"))?;
    let rows = rows.trim().parse().map_err(|e| format!("bad row count: {e}"))?;
    Ok((cols, rows))
}

/// Install the log subscriber. Fullscreen output must not share the
/// terminal with logs, so they go to a file or nowhere.
fn init_logging(cli: &Cli) -> std::io::Result<()> {
    let filter = || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter()).with_target(false);

    if cli.headless {
        builder.with_writer(std::io::stderr).init();
    } else if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::sink).init();
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ExhibitConfig, ExhibitError> {
    let mut config = match &cli.config {
        Some(path) => ExhibitConfig::load(path)?,
        None => ExhibitConfig::load_or_default(DEFAULT_CONFIG),
    };
    if let Some(particles) = cli.particles {
        config.simulator.particle_count = particles;
    }
    if let Some(text) = &cli.text {
        config.fallback_text.clone_from(text);
    }
    if let Some(seed) = cli.seed {
        config.simulator.seed = Some(seed);
    }
    Ok(config)
}

fn execute(cli: &Cli) -> Result<(), ExhibitError> {
    let config = load_config(cli)?;
    let options = RunOptions {
        program: cli.program.clone(),
        mode: cli.mode,
    };

    if cli.headless {
        let report = run_headless(&config, &options, cli.frames, cli.size, std::io::sink())?;
        println!(
            "frames={} cells_written={} profile={} playing={}",
            report.frames, report.cells_written, report.profile_id, report.still_playing
        );
        if let Some(stats) = report.last_stats {
            println!(
                "archetype={:?} source={:?} sides={} particles={} respawned={}",
                stats.archetype, stats.source, stats.sides, stats.particles, stats.respawned
            );
        }
        return Ok(());
    }

    run(&config, &options)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli) {
        eprintln!("spark-flow: cannot open log file: {err}");
        return ExitCode::FAILURE;
    }

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "exhibit failed");
            eprintln!("spark-flow: {err}");
            ExitCode::FAILURE
        }
    }
}
