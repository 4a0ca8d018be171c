//! # spark-flow
//!
//! Real-time vector-field particle renderer and declarative step sequencer,
//! hosted in the terminal.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! the shared host state (focus key, system status, pointer).
//!
//! ## Architecture
//!
//! ```text
//! Sequencer step / pointer click ──→ focus key ─┐
//! system status ────────────────────────────────┼─→ FrameInput
//!                                               ↓
//! FlowRegistry ──→ ParticleField::tick ──→ Surface (Raster → FrameBuffer → DiffRenderer)
//! ```
//!
//! The simulator never reads global state: the host builds a
//! [`FrameInput`](field::FrameInput) from the state signals each frame and
//! passes it in with the surface to draw on.
//!
//! ## Modules
//!
//! - [`flow`] - Flow profiles, the registry, profile resolution
//! - [`field`] - Particle pool, velocity law, overlay, simulator
//! - [`sequencer`] - Program playback state machine and clocks
//! - [`renderer`] - Surface trait, raster, terminal frame buffer, diff output
//! - [`state`] - Focus, status and pointer signals, input conversion
//! - [`pipeline`] - Exhibit wiring, terminal run loop, headless runs
//! - [`config`] - TOML configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod field;
pub mod flow;
pub mod pipeline;
pub mod renderer;
pub mod sequencer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{ExhibitConfig, SequencerConfig, SimulatorConfig};
pub use error::{ConfigError, ExhibitError, SequencerError, StepError};

pub use field::{compute_field_velocity, FrameInput, FrameStats, Particle, ParticleField};

pub use flow::{
    effective_profile, Archetype, ConceptTable, FlowProfile, FlowRegistry, FocusResolver,
    ProfileSource, SystemStatus,
};

pub use pipeline::{run, run_headless, Exhibit, HeadlessReport, MountHandle, RunOptions};

pub use renderer::{DiffRenderer, FrameBuffer, Raster, RecordingSurface, Surface};

pub use sequencer::{
    Clock, ManualClock, PlaybackMode, PlaybackState, Program, Sequencer, Step, SystemClock,
};
