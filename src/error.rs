//! Error types.
//!
//! Rendering never fails (an unavailable surface is a no-op) and unknown
//! profiles always resolve to a fallback, so errors only come from loading
//! configuration, from caller-supplied step callbacks and from terminal I/O.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a step activation callback.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate flow profile id: {0}")]
    DuplicateProfile(String),

    #[error("default flow profile {0:?} is not defined")]
    UnknownDefault(String),

    #[error("flow profile table is empty")]
    NoProfiles,
}

/// Sequencer errors.
///
/// The sequencer itself never fails; it only surfaces callback failures to
/// the direct caller of `play`, `poll` or `fire`.
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("step callback failed for {key:?}: {source}")]
    Step {
        key: String,
        #[source]
        source: StepError,
    },
}

/// Host (terminal exhibit) errors.
#[derive(Debug, Error)]
pub enum ExhibitError {
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error("unknown program {0:?}")]
    UnknownProgram(String),
}
