//! Program Sequencer - timed playback of named steps
//!
//! A two-state machine (idle / playing) that walks a [`Program`] and calls a
//! step callback once per activation. The sequencer does not own a thread or
//! a timer: it holds a single pending deadline and the host calls
//! [`Sequencer::poll`] from its loop. Starting a program always replaces the
//! pending deadline, so at most one program is ever armed.
//!
//! # Timing
//!
//! Each deadline is measured from the previous deadline, not from when
//! `poll` happened to run, so a late poll catches up without drifting.
//!
//! ```text
//! play([A:100ms, B], normal), default 500ms
//!
//! t=0    A   (synchronous, inside play)
//! t=100  B
//! t=600  idle
//! ```
//!
//! # Example
//!
//! ```rust
//! use spark_flow::sequencer::{ManualClock, PlaybackMode, Program, Sequencer, Step};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut sequencer = Sequencer::new(Duration::from_millis(500), clock.clone(), |key| {
//!     println!("step {key}");
//!     Ok(())
//! });
//!
//! let program = Program::new("intro", [Step::timed("A", 100), Step::from("B")]);
//! sequencer.play(&program, PlaybackMode::Normal).unwrap();
//! clock.advance_ms(100);
//! sequencer.poll().unwrap();
//! assert_eq!(sequencer.current_step_key(), Some("B"));
//! ```

pub mod clock;
pub mod program;

pub use clock::{Clock, ManualClock, SystemClock};
pub use program::{PlaybackMode, Program, Step};

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SequencerError, StepError};

/// Shortest step duration. Keeps a zero-length step from spinning `poll`.
pub const MIN_STEP_DURATION: Duration = Duration::from_millis(1);

/// Most advances a single `poll` fires before re-basing on the current time.
const MAX_CATCH_UP: usize = 1024;

/// Step activation callback.
pub type StepCallback = Box<dyn FnMut(&str) -> Result<(), StepError>>;

/// Snapshot of the playback state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub program_id: Option<String>,
    pub step_index: Option<usize>,
    pub mode: Option<PlaybackMode>,
}

struct Active {
    program: Program,
    index: usize,
    mode: PlaybackMode,
    /// Deadline of the next advance.
    due: Duration,
}

/// The program sequencer.
pub struct Sequencer {
    default_interval: Duration,
    clock: Box<dyn Clock>,
    on_step: StepCallback,
    active: Option<Active>,
}

impl Sequencer {
    /// A sequencer driven by `clock`. Steps without a duration override last
    /// `default_interval`.
    pub fn new<C, F>(default_interval: Duration, clock: C, on_step: F) -> Self
    where
        C: Clock + 'static,
        F: FnMut(&str) -> Result<(), StepError> + 'static,
    {
        Self {
            default_interval,
            clock: Box::new(clock),
            on_step: Box::new(on_step),
            active: None,
        }
    }

    /// A sequencer on the wall clock.
    pub fn with_system_clock<F>(default_interval: Duration, on_step: F) -> Self
    where
        F: FnMut(&str) -> Result<(), StepError> + 'static,
    {
        Self::new(default_interval, SystemClock::new(), on_step)
    }

    /// Start `program` in `mode`.
    ///
    /// Any program already playing is stopped first. The first step (the
    /// last one in reverse) is activated before this returns. A program with
    /// no steps or a blank step key is ignored and leaves the sequencer idle.
    ///
    /// A callback error is returned as-is; playback stays armed, so a later
    /// `poll`, `stop` or `play` behaves normally.
    pub fn play(&mut self, program: &Program, mode: PlaybackMode) -> Result<(), SequencerError> {
        self.stop();

        if !program.is_playable() {
            warn!(program = %program.id, steps = program.len(), "ignoring program with no playable steps");
            return Ok(());
        }

        let index = match mode {
            PlaybackMode::Normal | PlaybackMode::Loop => 0,
            PlaybackMode::Reverse => program.len() - 1,
        };
        let due = self.clock.now() + step_duration(&program.steps[index], self.default_interval);
        self.active = Some(Active {
            program: program.clone(),
            index,
            mode,
            due,
        });
        debug!(program = %program.id, %mode, index, "program started");

        self.activate()
    }

    /// Stop playback and cancel the pending deadline. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(program = %active.program.id, index = active.index, "program stopped");
        }
    }

    /// Fire every advance whose deadline has passed. Returns how many fired.
    pub fn poll(&mut self) -> Result<usize, SequencerError> {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(due) = self.next_deadline() {
            if due > now {
                break;
            }
            if fired == MAX_CATCH_UP {
                warn!(fired, "sequencer fell behind, skipping ahead");
                if let Some(active) = self.active.as_mut() {
                    active.due = now;
                }
                self.advance(now)?;
                fired += 1;
                break;
            }
            self.advance(due)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Advance one step now, regardless of the deadline.
    ///
    /// The next deadline is measured from the current time.
    pub fn fire(&mut self) -> Result<(), SequencerError> {
        let now = self.clock.now();
        self.advance(now)
    }

    /// When the next advance is due, if playing.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.active.as_ref().map(|active| active.due)
    }

    /// Time left until the next advance (zero if overdue).
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.next_deadline().map(|due| due.saturating_sub(now))
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_step_key(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|active| active.program.steps[active.index].key())
    }

    pub fn state(&self) -> PlaybackState {
        match &self.active {
            Some(active) => PlaybackState {
                is_playing: true,
                program_id: Some(active.program.id.clone()),
                step_index: Some(active.index),
                mode: Some(active.mode),
            },
            None => PlaybackState::default(),
        }
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Move to the next index for the active mode, scheduling from `base`.
    ///
    /// Stepping past either end in normal or reverse mode stops without a
    /// callback.
    fn advance(&mut self, base: Duration) -> Result<(), SequencerError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let len = active.program.len();
        let next = match active.mode {
            PlaybackMode::Normal => Some(active.index + 1).filter(|&i| i < len),
            PlaybackMode::Loop => Some((active.index + 1) % len),
            PlaybackMode::Reverse => active.index.checked_sub(1),
        };

        match next {
            Some(index) => {
                active.index = index;
                active.due = base + step_duration(&active.program.steps[index], self.default_interval);
                debug!(program = %active.program.id, index, "step advanced");
                self.activate()
            }
            None => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Call the step callback for the current step.
    fn activate(&mut self) -> Result<(), SequencerError> {
        let Some(active) = &self.active else {
            return Ok(());
        };
        let key = active.program.steps[active.index].key();
        (self.on_step)(key).map_err(|source| SequencerError::Step {
            key: key.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("default_interval", &self.default_interval)
            .field("state", &self.state())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

fn step_duration(step: &Step, default_interval: Duration) -> Duration {
    step.duration().unwrap_or(default_interval).max(MIN_STEP_DURATION)
}
