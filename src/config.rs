//! Exhibit configuration.
//!
//! TOML, one section per subsystem. Every field has a default so an empty
//! file (or no file) yields a working exhibit.
//!
//! ```toml
//! default_profile = "orbit"
//! fallback_text = "tidal memory"
//!
//! [simulator]
//! particle_count = 2000
//! trail_alpha = 0.12
//!
//! [sequencer]
//! default_interval_ms = 4000
//!
//! [concepts]
//! gravity = "collapse"
//! tides = "orbit"
//!
//! [[programs]]
//! id = "tour"
//! steps = ["gravity", { key = "tides", duration_ms = 1500 }]
//! ```
//!
//! When `[[profiles]]` is present it replaces the builtin profile table
//! (status profiles are still filled in from the presets).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::flow::{presets, ConceptTable, FlowProfile, FlowRegistry, DEFAULT_PROFILE_ID};
use crate::sequencer::Program;

// =============================================================================
// [simulator]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "SimulatorConfig::default_particle_count")]
    pub particle_count: usize,
    #[serde(default = "SimulatorConfig::default_life_min")]
    pub life_min: u32,
    #[serde(default = "SimulatorConfig::default_life_max")]
    pub life_max: u32,
    /// Pointer distance (logical pixels) that counts as over a vertex.
    #[serde(default = "SimulatorConfig::default_hover_radius")]
    pub hover_radius: f32,
    /// Opacity of the per-frame background fill; lower means longer trails.
    #[serde(default = "SimulatorConfig::default_trail_alpha")]
    pub trail_alpha: f32,
    /// Overlay polygon radius as a fraction of half the short side.
    #[serde(default = "SimulatorConfig::default_overlay_radius")]
    pub overlay_radius: f32,
    #[serde(default = "SimulatorConfig::default_background")]
    pub background: [u8; 3],
    /// Device pixels per logical pixel.
    #[serde(default = "SimulatorConfig::default_scale")]
    pub scale: f32,
    #[serde(default = "SimulatorConfig::default_fps")]
    pub fps: u32,
    /// RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    fn default_particle_count() -> usize {
        1200
    }
    fn default_life_min() -> u32 {
        50
    }
    fn default_life_max() -> u32 {
        250
    }
    fn default_hover_radius() -> f32 {
        4.0
    }
    fn default_trail_alpha() -> f32 {
        0.15
    }
    fn default_overlay_radius() -> f32 {
        0.75
    }
    fn default_background() -> [u8; 3] {
        [6, 8, 18]
    }
    fn default_scale() -> f32 {
        1.0
    }
    fn default_fps() -> u32 {
        60
    }

    /// Target frame period.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.clamp(1, 240) as f64)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            particle_count: Self::default_particle_count(),
            life_min: Self::default_life_min(),
            life_max: Self::default_life_max(),
            hover_radius: Self::default_hover_radius(),
            trail_alpha: Self::default_trail_alpha(),
            overlay_radius: Self::default_overlay_radius(),
            background: Self::default_background(),
            scale: Self::default_scale(),
            fps: Self::default_fps(),
            seed: None,
        }
    }
}

// =============================================================================
// [sequencer]
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default = "SequencerConfig::default_interval_ms")]
    pub default_interval_ms: u64,
}

impl SequencerConfig {
    fn default_interval_ms() -> u64 {
        3000
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: Self::default_interval_ms(),
        }
    }
}

// =============================================================================
// ExhibitConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default = "ExhibitConfig::default_profile_id")]
    pub default_profile: String,
    /// Text hashed to pick a profile while nothing is focused.
    #[serde(default)]
    pub fallback_text: String,
    /// Replaces the builtin table when non-empty.
    #[serde(default)]
    pub profiles: Vec<FlowProfile>,
    /// Focus key → profile id, in vertex binding order.
    #[serde(default)]
    pub concepts: BTreeMap<String, String>,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl ExhibitConfig {
    fn default_profile_id() -> String {
        DEFAULT_PROFILE_ID.to_string()
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), profiles = config.profiles.len(), programs = config.programs.len(), "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "using default config");
                Self::default()
            }
        }
    }

    /// Build the flow registry this config describes.
    pub fn registry(&self) -> Result<FlowRegistry, ConfigError> {
        let profiles = if self.profiles.is_empty() {
            presets::all()
        } else {
            self.profiles.clone()
        };
        FlowRegistry::from_profiles(profiles, &self.default_profile)
    }

    /// Concept table in key order. Concepts naming an unknown profile are
    /// kept; they resolve to the default profile at draw time.
    pub fn concept_table(&self) -> ConceptTable {
        let mut table = ConceptTable::default();
        for (key, profile) in &self.concepts {
            table.insert(key.as_str(), profile.as_str());
        }
        table
    }

    pub fn program(&self, id: &str) -> Option<&Program> {
        self.programs.iter().find(|program| program.id == id)
    }

    /// Program ids in file order.
    pub fn program_ids(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|program| program.id.as_str())
    }
}

impl Default for ExhibitConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            sequencer: SequencerConfig::default(),
            default_profile: Self::default_profile_id(),
            profiles: Vec::new(),
            concepts: BTreeMap::new(),
            programs: Vec::new(),
            fallback_text: String::new(),
        }
    }
}
