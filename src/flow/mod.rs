//! Flow Field Registry.
//!
//! Immutable table of flow profiles. Each profile names a vector-field
//! archetype and the handful of scalars that parameterize it. The table is
//! built once (from the builtin presets or from config) and only read after
//! that, so lookups are safe to call from the render hot path every frame.
//!
//! # Example
//!
//! ```rust
//! use spark_flow::flow::FlowRegistry;
//!
//! let registry = FlowRegistry::builtin();
//! let orbit = registry.lookup(Some("orbit"));
//! assert_eq!(orbit.id, "orbit");
//!
//! // Unknown ids resolve to the default profile, never an error.
//! let fallback = registry.lookup(Some("no-such-profile"));
//! assert_eq!(fallback.id, registry.default_profile().id);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub mod presets;
pub mod resolve;

pub use presets::{get_preset, preset_names};
pub use resolve::{
    effective_profile, Concept, ConceptTable, EffectiveProfile, FocusResolver, ProfileSource, SystemStatus,
};

/// Profile id used when no other default is configured.
pub const DEFAULT_PROFILE_ID: &str = "drift";

/// Reserved ids for the status override profiles.
pub const STATUS_BUSY_ID: &str = "busy";
pub const STATUS_COMMUNICATING_ID: &str = "communicating";
pub const STATUS_ERROR_ID: &str = "error";

const STATUS_IDS: [&str; 3] = [STATUS_BUSY_ID, STATUS_COMMUNICATING_ID, STATUS_ERROR_ID];

// =============================================================================
// Archetype
// =============================================================================

/// The qualitative shape of a flow field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Archetype {
    /// Constant rightward drift.
    UniformGrid,
    /// Straight in or out of the center, signed by `radial_bias`.
    Radial,
    /// Circles around the center.
    TangentialOrbit,
    /// Radial bias plus twist.
    LogarithmicSpiral,
    /// Pulled toward a ring of radius `shell_radius`, circulating along it.
    RadialShell,
    /// Trigonometric turbulence driven by `noise` and `curl`.
    TurbulentNoise,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::UniformGrid,
        Archetype::Radial,
        Archetype::TangentialOrbit,
        Archetype::LogarithmicSpiral,
        Archetype::RadialShell,
        Archetype::TurbulentNoise,
    ];
}

// =============================================================================
// FlowProfile
// =============================================================================

/// A named parameter set for one flow field.
///
/// Every archetype reads only the fields it needs; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowProfile {
    pub id: String,
    pub archetype: Archetype,
    /// Final velocity magnitude in pixels per frame.
    #[serde(default = "FlowProfile::default_speed")]
    pub speed: f32,
    /// Inward (negative) or outward (positive) pull.
    #[serde(default)]
    pub radial_bias: f32,
    /// Rotational contribution (spiral only).
    #[serde(default)]
    pub twist: f32,
    /// Stochastic perturbation magnitude, 0..1.
    #[serde(default)]
    pub noise: f32,
    /// Turbulence strength (turbulent-noise only).
    #[serde(default)]
    pub curl: f32,
    /// Target ring radius as a fraction of half the short side (radial-shell only).
    #[serde(default = "FlowProfile::default_shell_radius")]
    pub shell_radius: f32,
    /// Side count of the overlay polygon.
    #[serde(default = "FlowProfile::default_sides")]
    pub sides: u8,
    /// Particle color.
    #[serde(default = "FlowProfile::default_tint")]
    pub tint: [u8; 3],
}

impl FlowProfile {
    fn default_speed() -> f32 {
        1.0
    }
    fn default_shell_radius() -> f32 {
        0.6
    }
    fn default_sides() -> u8 {
        5
    }
    fn default_tint() -> [u8; 3] {
        [170, 200, 255]
    }

    /// A profile with default scalars for the given archetype.
    pub fn new(id: impl Into<String>, archetype: Archetype) -> Self {
        Self {
            id: id.into(),
            archetype,
            speed: Self::default_speed(),
            radial_bias: 0.0,
            twist: 0.0,
            noise: 0.0,
            curl: 0.0,
            shell_radius: Self::default_shell_radius(),
            sides: Self::default_sides(),
            tint: Self::default_tint(),
        }
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn radial_bias(mut self, bias: f32) -> Self {
        self.radial_bias = bias;
        self
    }

    pub fn twist(mut self, twist: f32) -> Self {
        self.twist = twist;
        self
    }

    pub fn noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }

    pub fn curl(mut self, curl: f32) -> Self {
        self.curl = curl;
        self
    }

    pub fn shell_radius(mut self, fraction: f32) -> Self {
        self.shell_radius = fraction;
        self
    }

    pub fn sides(mut self, sides: u8) -> Self {
        self.sides = sides;
        self
    }

    pub fn tint(mut self, tint: [u8; 3]) -> Self {
        self.tint = tint;
        self
    }

    /// True for the reserved busy/communicating/error profiles.
    pub fn is_status_profile(&self) -> bool {
        STATUS_IDS.contains(&self.id.as_str())
    }
}

// =============================================================================
// FlowRegistry
// =============================================================================

/// Immutable id → profile table with a designated default.
#[derive(Debug, Clone)]
pub struct FlowRegistry {
    profiles: Vec<FlowProfile>,
    index: HashMap<String, usize>,
    default: usize,
    /// Indices eligible for hash fallback (everything but status profiles).
    selectable: Vec<usize>,
}

impl FlowRegistry {
    /// The builtin preset table.
    pub fn builtin() -> Self {
        // Preset ids are unique and include the default, so this cannot fail.
        match Self::from_profiles(presets::all(), DEFAULT_PROFILE_ID) {
            Ok(registry) => registry,
            Err(err) => unreachable!("builtin presets are invalid: {err}"),
        }
    }

    /// Build a registry from a profile list.
    ///
    /// Status profiles missing from the list are filled in from the presets
    /// so the busy/communicating/error overrides always resolve.
    pub fn from_profiles(
        mut profiles: Vec<FlowProfile>,
        default_id: &str,
    ) -> Result<Self, ConfigError> {
        if profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }

        for status_id in STATUS_IDS {
            if !profiles.iter().any(|p| p.id == status_id) {
                if let Some(preset) = get_preset(status_id) {
                    profiles.push(preset);
                }
            }
        }

        let mut index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            if index.insert(profile.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateProfile(profile.id.clone()));
            }
        }

        let default = *index
            .get(default_id)
            .ok_or_else(|| ConfigError::UnknownDefault(default_id.to_string()))?;

        let mut selectable: Vec<usize> = profiles
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_status_profile())
            .map(|(i, _)| i)
            .collect();
        if selectable.is_empty() {
            selectable.push(default);
        }

        Ok(Self {
            profiles,
            index,
            default,
            selectable,
        })
    }

    /// Look up a profile, falling back to the default for unknown or absent ids.
    #[inline]
    pub fn lookup(&self, id: Option<&str>) -> &FlowProfile {
        id.and_then(|id| self.get(id))
            .unwrap_or(&self.profiles[self.default])
    }

    /// Exact lookup.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&FlowProfile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }

    /// The designated default profile.
    pub fn default_profile(&self) -> &FlowProfile {
        &self.profiles[self.default]
    }

    /// Stable per-string profile choice for unrecognized input.
    ///
    /// Empty text resolves to the default profile.
    pub fn fallback_for_text(&self, text: &str) -> &FlowProfile {
        if text.is_empty() {
            return self.default_profile();
        }
        let slot = text_hash(text) as usize % self.selectable.len();
        &self.profiles[self.selectable[slot]]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Profile ids in table order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.id.as_str())
    }

    pub fn profiles(&self) -> &[FlowProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Deterministic 32-bit string hash (`h * 31 + c` over chars).
///
/// Stable across runs and platforms; used for fallback profile selection
/// and overlay wobble phase.
pub fn text_hash(text: &str) -> u32 {
    text.chars().fold(0u32, |h, c| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as u32)
    })
}
