//! Host pipeline
//!
//! Connects the simulator and sequencer to the terminal.
//!
//! ```text
//! crossterm events → Exhibit (field + sequencer + state) → Raster → FrameBuffer → DiffRenderer
//! ```
//!
//! - [`exhibit`] - terminal-agnostic wiring, one frame per call
//! - [`terminal`] - fullscreen mount handle, the run loop and headless runs

pub mod exhibit;
pub mod terminal;

pub use exhibit::Exhibit;
pub use terminal::{run, run_headless, HeadlessReport, MountHandle, RunOptions};
