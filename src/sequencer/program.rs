//! Programs, steps and playback modes.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One unit of playback: an opaque key, optionally with its own duration.
///
/// In config a step is either a bare string or `{ key, duration_ms }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Key(String),
    Timed { key: String, duration_ms: u64 },
}

impl Step {
    pub fn timed(key: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timed {
            key: key.into(),
            duration_ms,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Key(key) | Self::Timed { key, .. } => key,
        }
    }

    /// Per-step duration override.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Key(_) => None,
            Self::Timed { duration_ms, .. } => Some(Duration::from_millis(*duration_ms)),
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

/// An identified, ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Program {
    pub fn new<I, S>(id: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Self {
            id: id.into(),
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    /// At least one step, and no step with a blank key.
    pub fn is_playable(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|step| !step.key().trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Direction and wrap behavior of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackMode {
    /// First to last, then stop.
    #[default]
    Normal,
    /// First to last, forever.
    Loop,
    /// Last to first, then stop.
    Reverse,
}

impl PlaybackMode {
    pub const ALL: [PlaybackMode; 3] = [Self::Normal, Self::Loop, Self::Reverse];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Loop => "loop",
            Self::Reverse => "reverse",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown playback mode {s:?} (expected normal, loop or reverse)"))
    }
}
