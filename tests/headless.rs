//! Headless runs: the whole exhibit on a simulated terminal and clock.

use spark_flow::config::ExhibitConfig;
use spark_flow::error::ExhibitError;
use spark_flow::pipeline::{run_headless, RunOptions};
use spark_flow::sequencer::PlaybackMode;
use spark_flow::state::focus::reset_focus_state;
use spark_flow::state::status::reset_status_state;

const CONFIG: &str = r#"
    [simulator]
    particle_count = 150
    fps = 50
    seed = 21

    [sequencer]
    default_interval_ms = 200

    [[programs]]
    id = "tour"
    steps = [{ key = "orbit", duration_ms = 100 }, "spiral"]
"#;

fn config() -> ExhibitConfig {
    reset_focus_state();
    reset_status_state();
    ExhibitConfig::from_toml_str(CONFIG).unwrap()
}

fn tour(mode: PlaybackMode) -> RunOptions {
    RunOptions {
        program: Some("tour".into()),
        mode,
    }
}

#[test]
fn program_drives_the_field_then_finishes() {
    let config = config();
    let mut out = Vec::new();

    // 20ms frames: orbit at 0, spiral at 100ms, idle at 300ms.
    let report = run_headless(&config, &tour(PlaybackMode::Normal), 30, (60, 20), &mut out).unwrap();

    assert_eq!(report.frames, 30);
    assert_eq!(report.profile_id, "spiral");
    assert!(!report.still_playing);
    assert!(report.cells_written > 0);
    assert!(!out.is_empty());

    let stats = report.last_stats.unwrap();
    assert_eq!(stats.particles, 150);
}

#[test]
fn short_run_is_still_on_first_step() {
    let config = config();
    let report = run_headless(&config, &tour(PlaybackMode::Loop), 3, (40, 12), std::io::sink()).unwrap();

    assert_eq!(report.frames, 3);
    assert_eq!(report.profile_id, "orbit");
    assert!(report.still_playing);
}

#[test]
fn no_program_draws_the_default_profile() {
    let config = config();
    let report = run_headless(&config, &RunOptions::default(), 5, (40, 12), std::io::sink()).unwrap();

    assert_eq!(report.profile_id, config.default_profile);
    assert!(!report.still_playing);
}

#[test]
fn unknown_program_is_rejected() {
    let config = config();
    let options = RunOptions {
        program: Some("missing".into()),
        mode: PlaybackMode::Normal,
    };
    let err = run_headless(&config, &options, 5, (40, 12), std::io::sink()).unwrap_err();
    assert!(matches!(err, ExhibitError::UnknownProgram(id) if id == "missing"));
}
