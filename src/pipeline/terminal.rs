//! Terminal host - mount, run loop, unmount.
//!
//! # Example
//!
//! ```ignore
//! use spark_flow::config::ExhibitConfig;
//! use spark_flow::pipeline::{run, RunOptions};
//!
//! run(&ExhibitConfig::default(), &RunOptions::default())?;
//! ```

use std::io::{self, Stdout, Write};
use std::time::Instant;

use crossterm::terminal;
use tracing::{debug, info};

use super::exhibit::Exhibit;
use crate::config::ExhibitConfig;
use crate::error::ExhibitError;
use crate::field::FrameStats;
use crate::renderer::{DiffRenderer, FrameBuffer};
use crate::sequencer::{ManualClock, PlaybackMode, SystemClock};
use crate::state::input::{self, InputEvent};

/// What to do once mounted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Program to start immediately.
    pub program: Option<String>,
    pub mode: PlaybackMode,
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Fullscreen terminal session. Restores the terminal on drop.
pub struct MountHandle {
    renderer: DiffRenderer<Stdout>,
    buffer: FrameBuffer,
    mounted: bool,
}

impl MountHandle {
    /// Enter raw mode and the alternate screen with mouse capture.
    pub fn mount() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut renderer = DiffRenderer::stdout();
        if let Err(err) = renderer.enter_fullscreen() {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        debug!("terminal mounted");
        Ok(Self {
            renderer,
            buffer: FrameBuffer::new(0, 0),
            mounted: true,
        })
    }

    /// Compose the exhibit's raster and write the changed cells.
    pub fn present(&mut self, exhibit: &Exhibit) -> io::Result<usize> {
        self.buffer.compose(exhibit.raster());
        self.renderer.render(&self.buffer)
    }

    /// Force the next present to redraw everything.
    pub fn invalidate(&mut self) {
        self.renderer.invalidate();
    }

    /// Restore the terminal. Safe to call twice.
    pub fn unmount(&mut self) -> io::Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;
        let left = self.renderer.exit_fullscreen();
        let raw = terminal::disable_raw_mode();
        debug!("terminal unmounted");
        left.and(raw)
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        // Best effort
        let _ = self.unmount();
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Run the exhibit fullscreen until `q`/Ctrl+C.
pub fn run(config: &ExhibitConfig, options: &RunOptions) -> Result<(), ExhibitError> {
    let mut exhibit = Exhibit::new(config, SystemClock::new())?;
    let mut handle = MountHandle::mount()?;

    let (cols, rows) = terminal::size()?;
    exhibit.resize(cols, rows);
    exhibit.attach_pointer();
    if let Some(id) = &options.program {
        exhibit.play(id, options.mode)?;
    }
    info!(cols, rows, "exhibit running");

    let interval = config.simulator.frame_interval();
    let mut next_frame = Instant::now();
    while exhibit.is_running() {
        let timeout = next_frame.saturating_duration_since(Instant::now());
        if let Some(event) = input::poll_event(timeout)? {
            if matches!(event, InputEvent::Resize(..)) {
                handle.invalidate();
            }
            exhibit.handle_input(event)?;
            if Instant::now() < next_frame {
                continue;
            }
        }

        exhibit.frame()?;
        handle.present(&exhibit)?;

        next_frame += interval;
        let now = Instant::now();
        if next_frame < now {
            // Fell behind; don't try to catch up on frames.
            next_frame = now + interval;
        }
    }

    exhibit.unmount();
    handle.unmount()?;
    Ok(())
}

// =============================================================================
// Headless
// =============================================================================

/// Result of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub frames: u64,
    /// Terminal cells the diff renderer would have written.
    pub cells_written: usize,
    pub last_stats: Option<FrameStats>,
    pub profile_id: String,
    pub still_playing: bool,
}

/// Run `frames` frames on a simulated `cols x rows` terminal.
///
/// Time is simulated: the sequencer clock advances one frame interval per
/// frame, so program timing matches a real run at the configured fps.
pub fn run_headless<W: Write>(
    config: &ExhibitConfig,
    options: &RunOptions,
    frames: u64,
    (cols, rows): (u16, u16),
    out: W,
) -> Result<HeadlessReport, ExhibitError> {
    let clock = ManualClock::new();
    let mut exhibit = Exhibit::new(config, clock.clone())?;
    exhibit.resize(cols, rows);
    if let Some(id) = &options.program {
        exhibit.play(id, options.mode)?;
    }

    let interval = config.simulator.frame_interval();
    let mut renderer = DiffRenderer::new(out);
    let mut buffer = FrameBuffer::new(cols, rows);
    let mut cells_written = 0;
    let mut last_stats = None;

    for _ in 0..frames {
        if !exhibit.is_running() {
            break;
        }
        last_stats = exhibit.frame()?.or(last_stats);
        buffer.compose(exhibit.raster());
        cells_written += renderer.render(&buffer)?;
        clock.advance(interval);
    }

    let report = HeadlessReport {
        frames: exhibit.frames_drawn(),
        cells_written,
        last_stats,
        profile_id: exhibit.field().active_profile_id().to_string(),
        still_playing: exhibit.sequencer().is_playing(),
    };
    exhibit.unmount();
    info!(frames = report.frames, cells = report.cells_written, "headless run finished");
    Ok(report)
}
