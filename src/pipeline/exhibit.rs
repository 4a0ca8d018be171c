//! Exhibit - the field, the sequencer and their shared state, wired together.
//!
//! The exhibit is terminal-agnostic: it owns a [`Raster`] and produces one
//! frame per [`Exhibit::frame`] call. [`super::terminal`] puts it on screen;
//! tests and headless runs drive it directly.
//!
//! ```text
//! input ─┬─ pointer ──→ ParticleField (hover/click) ──→ focus
//!        └─ keys ─────→ play/stop, status, focus
//! Sequencer step ────────────────────────────────────→ focus
//! focus + status ──→ FrameInput ──→ ParticleField::tick ──→ Raster
//! ```

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ExhibitConfig;
use crate::error::ExhibitError;
use crate::field::{FrameInput, FrameStats, ParticleField};
use crate::flow::{FlowRegistry, FocusResolver};
use crate::renderer::{Raster, Surface};
use crate::sequencer::{Clock, PlaybackMode, Program, Sequencer};
use crate::state::{focus, pointer, status, InputEvent, KeyAction};
use crate::types::{Point, Rgba};

/// Status line color.
const STATUS_COLOR: Rgba = Rgba::rgb(120, 130, 150);

/// Field + sequencer + surface.
pub struct Exhibit {
    field: ParticleField,
    sequencer: Sequencer,
    raster: Raster,
    programs: Vec<Program>,
    /// Program the play toggle starts.
    selected: Option<usize>,
    mode: PlaybackMode,
    focus_keys: Vec<String>,
    particle_count: usize,
    scale: f32,
    frame: u64,
    status_line: String,
    running: Arc<AtomicBool>,
    unmounted: bool,
}

impl Exhibit {
    /// Build an exhibit from config, with the sequencer on `clock`.
    ///
    /// Sequencer steps and overlay clicks both set the focus key.
    pub fn new<C: Clock + 'static>(config: &ExhibitConfig, clock: C) -> Result<Self, ExhibitError> {
        let registry = config.registry()?;
        let concepts = config.concept_table();

        let focus_keys: Vec<String> = if concepts.is_empty() {
            registry
                .profiles()
                .iter()
                .filter(|p| !p.is_status_profile())
                .map(|p| p.id.clone())
                .collect()
        } else {
            concepts.keys().map(str::to_string).collect()
        };

        // Concepts first, then keys that name a profile directly.
        let identity = registry.clone();
        let resolver = move |key: &str| {
            concepts
                .resolve_focus_profile_id(key)
                .or_else(|| identity.resolve_focus_profile_id(key))
        };

        let mut field = ParticleField::new(registry, config.simulator.clone())
            .with_resolver(resolver)
            .with_concepts(focus_keys.iter().cloned());
        field.on_select(|key| focus::set_focus(Some(key)));

        let sequencer = Sequencer::new(config.sequencer.default_interval(), clock, |key| {
            focus::set_focus(Some(key));
            Ok(())
        });

        focus::set_fallback_text(&config.fallback_text);

        let [r, g, b] = config.simulator.background;
        let raster = Raster::new(0.0, 0.0, config.simulator.scale).with_background(Rgba::rgb(r, g, b));

        Ok(Self {
            field,
            sequencer,
            raster,
            programs: config.programs.clone(),
            selected: (!config.programs.is_empty()).then_some(0),
            mode: PlaybackMode::Normal,
            focus_keys,
            particle_count: config.simulator.particle_count,
            scale: config.simulator.scale,
            frame: 0,
            status_line: String::new(),
            running: Arc::new(AtomicBool::new(true)),
            unmounted: false,
        })
    }

    /// Attach pointer input to the field.
    pub fn attach_pointer(&mut self) {
        self.field.attach_pointer();
    }

    /// Resize for a `cols x rows` terminal and re-seed the particles.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (width, height) = (cols as f32, rows as f32 * 2.0);
        self.raster.resize(width, height, self.scale);
        self.field.initialize(self.particle_count, width, height);
        debug!(cols, rows, "exhibit resized");
    }

    /// Advance the sequencer, then draw one frame into the raster.
    pub fn frame(&mut self) -> Result<Option<FrameStats>, ExhibitError> {
        self.sequencer.poll()?;

        let input = FrameInput {
            frame: self.frame,
            focus: focus::focus_key(),
            status: status::system_status(),
            fallback_text: focus::fallback_text(),
        };
        let stats = self.field.tick(Some(&mut self.raster as &mut dyn Surface), &input);
        if stats.is_some() {
            self.draw_status_line(&input);
        }
        self.frame += 1;
        Ok(stats)
    }

    /// Play the program with `id`. It becomes the play toggle's program.
    pub fn play(&mut self, id: &str, mode: PlaybackMode) -> Result<(), ExhibitError> {
        let index = self
            .programs
            .iter()
            .position(|program| program.id == id)
            .ok_or_else(|| ExhibitError::UnknownProgram(id.to_string()))?;
        self.selected = Some(index);
        self.mode = mode;
        self.sequencer.play(&self.programs[index], mode)?;
        info!(program = id, %mode, "playing program");
        Ok(())
    }

    pub fn stop_program(&mut self) {
        self.sequencer.stop();
    }

    /// Stop the playing program, or start the selected one.
    pub fn toggle_playback(&mut self) -> Result<(), ExhibitError> {
        if self.sequencer.is_playing() {
            self.sequencer.stop();
            return Ok(());
        }
        match self.selected {
            Some(index) => {
                let mode = self.mode;
                self.sequencer.play(&self.programs[index], mode)?;
                Ok(())
            }
            None => {
                warn!("no program configured");
                Ok(())
            }
        }
    }

    /// Apply a converted input event.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), ExhibitError> {
        match event {
            InputEvent::Pointer(event) => pointer::dispatch(event),
            InputEvent::Key(action) => self.handle_key(action)?,
            InputEvent::Resize(cols, rows) => self.resize(cols, rows),
            InputEvent::None => {}
        }
        Ok(())
    }

    pub fn handle_key(&mut self, action: KeyAction) -> Result<(), ExhibitError> {
        match action {
            KeyAction::Quit => self.stop(),
            KeyAction::TogglePlayback => self.toggle_playback()?,
            KeyAction::CycleStatus => {
                status::cycle_system_status();
            }
            KeyAction::NextConcept => {
                let keys: Vec<&str> = self.focus_keys.iter().map(String::as_str).collect();
                focus::focus_next(&keys);
            }
            KeyAction::Blur => focus::blur(),
        }
        Ok(())
    }

    /// Dispose the field and stop the sequencer. Safe to call twice.
    pub fn unmount(&mut self) {
        self.stop();
        if self.unmounted {
            return;
        }
        self.unmounted = true;
        self.sequencer.stop();
        self.field.dispose();
        info!(frames = self.frame, "exhibit unmounted");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown; the run loop exits after the current frame.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Shared running flag, for stopping the loop from elsewhere.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn registry(&self) -> &FlowRegistry {
        self.field.registry()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frame
    }

    fn draw_status_line(&mut self, input: &FrameInput) {
        self.status_line.clear();
        let _ = write!(
            self.status_line,
            " {} · {:?}",
            self.field.active_profile_id(),
            input.status
        );
        if let Some(key) = input.focus.as_deref() {
            let _ = write!(self.status_line, " · {key}");
        }
        let playback = self.sequencer.state();
        if let (Some(id), Some(index)) = (playback.program_id.as_deref(), playback.step_index) {
            let _ = write!(self.status_line, " · ▶ {id}[{index}]");
        }
        let y = (self.raster.height() - 2.0).max(0.0);
        self.raster.text(Point::new(0.0, y), &self.status_line, STATUS_COLOR);
    }
}

impl Drop for Exhibit {
    fn drop(&mut self) {
        self.unmount();
    }
}
