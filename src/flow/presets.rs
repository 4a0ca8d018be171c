//! Builtin flow profiles.
//!
//! One or two presets per archetype, plus the three status profiles that
//! override focus-based selection:
//! - drift (default)
//! - bloom, collapse
//! - orbit
//! - spiral, unfurl
//! - shell
//! - storm
//! - busy, communicating, error

use super::{Archetype, FlowProfile, STATUS_BUSY_ID, STATUS_COMMUNICATING_ID, STATUS_ERROR_ID};

// =============================================================================
// Focus profiles
// =============================================================================

/// Drift - slow rightward current. The default.
pub fn drift() -> FlowProfile {
    FlowProfile::new("drift", Archetype::UniformGrid)
        .speed(0.8)
        .noise(0.15)
        .sides(4)
        .tint([150, 180, 220])
}

/// Bloom - particles pushed out from the center.
pub fn bloom() -> FlowProfile {
    FlowProfile::new("bloom", Archetype::Radial)
        .speed(1.2)
        .radial_bias(1.0)
        .noise(0.2)
        .sides(6)
        .tint([255, 190, 120])
}

/// Collapse - particles drawn into the center.
pub fn collapse() -> FlowProfile {
    FlowProfile::new("collapse", Archetype::Radial)
        .speed(1.0)
        .radial_bias(-1.0)
        .noise(0.1)
        .sides(3)
        .tint([190, 140, 255])
}

/// Orbit - steady circulation.
pub fn orbit() -> FlowProfile {
    FlowProfile::new("orbit", Archetype::TangentialOrbit)
        .speed(1.4)
        .noise(0.05)
        .sides(8)
        .tint([120, 220, 255])
}

/// Spiral - inward logarithmic spiral.
pub fn spiral() -> FlowProfile {
    FlowProfile::new("spiral", Archetype::LogarithmicSpiral)
        .speed(1.3)
        .radial_bias(-0.35)
        .twist(1.0)
        .noise(0.1)
        .sides(5)
        .tint([140, 255, 200])
}

/// Unfurl - outward spiral turning the other way.
pub fn unfurl() -> FlowProfile {
    FlowProfile::new("unfurl", Archetype::LogarithmicSpiral)
        .speed(1.1)
        .radial_bias(0.4)
        .twist(-0.8)
        .noise(0.12)
        .sides(7)
        .tint([255, 160, 200])
}

/// Shell - particles settle onto a ring and circulate.
pub fn shell() -> FlowProfile {
    FlowProfile::new("shell", Archetype::RadialShell)
        .speed(1.2)
        .shell_radius(0.6)
        .noise(0.08)
        .sides(6)
        .tint([200, 230, 255])
}

/// Storm - trigonometric turbulence.
pub fn storm() -> FlowProfile {
    FlowProfile::new("storm", Archetype::TurbulentNoise)
        .speed(1.5)
        .noise(0.6)
        .curl(1.0)
        .sides(9)
        .tint([180, 200, 200])
}

// =============================================================================
// Status profiles
// =============================================================================

/// Busy - fast, agitated turbulence.
pub fn busy() -> FlowProfile {
    FlowProfile::new(STATUS_BUSY_ID, Archetype::TurbulentNoise)
        .speed(2.2)
        .noise(0.8)
        .curl(1.6)
        .sides(3)
        .tint([255, 200, 90])
}

/// Communicating - tight pulsing ring.
pub fn communicating() -> FlowProfile {
    FlowProfile::new(STATUS_COMMUNICATING_ID, Archetype::RadialShell)
        .speed(1.8)
        .shell_radius(0.35)
        .noise(0.05)
        .sides(4)
        .tint([90, 230, 255])
}

/// Error - noisy outward scatter.
pub fn error() -> FlowProfile {
    FlowProfile::new(STATUS_ERROR_ID, Archetype::Radial)
        .speed(2.0)
        .radial_bias(1.0)
        .noise(0.9)
        .sides(3)
        .tint([255, 80, 80])
}

// =============================================================================
// Preset lookup
// =============================================================================

/// Every builtin profile, in table order.
pub fn all() -> Vec<FlowProfile> {
    vec![
        drift(),
        bloom(),
        collapse(),
        orbit(),
        spiral(),
        unfurl(),
        shell(),
        storm(),
        busy(),
        communicating(),
        error(),
    ]
}

/// Get a builtin profile by name.
///
/// Matching ignores case, `-` and `_`.
pub fn get_preset(name: &str) -> Option<FlowProfile> {
    match name.to_lowercase().replace(['_', '-'], "").as_str() {
        "drift" => Some(drift()),
        "bloom" => Some(bloom()),
        "collapse" => Some(collapse()),
        "orbit" => Some(orbit()),
        "spiral" => Some(spiral()),
        "unfurl" => Some(unfurl()),
        "shell" => Some(shell()),
        "storm" => Some(storm()),
        "busy" => Some(busy()),
        "communicating" => Some(communicating()),
        "error" => Some(error()),
        _ => None,
    }
}

/// List all builtin profile names.
pub fn preset_names() -> &'static [&'static str] {
    &[
        "drift",
        "bloom",
        "collapse",
        "orbit",
        "spiral",
        "unfurl",
        "shell",
        "storm",
        "busy",
        "communicating",
        "error",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_resolvable_by_name() {
        for name in preset_names() {
            let preset = get_preset(name).unwrap_or_else(|| panic!("missing preset {name}"));
            assert_eq!(preset.id, *name);
        }
        assert_eq!(all().len(), preset_names().len());
    }

    #[test]
    fn test_preset_name_normalization() {
        assert_eq!(get_preset("ORBIT").unwrap().id, "orbit");
        assert_eq!(get_preset("un-furl").unwrap().id, "unfurl");
        assert!(get_preset("nope").is_none());
    }

    #[test]
    fn test_status_presets_are_flagged() {
        assert!(busy().is_status_profile());
        assert!(communicating().is_status_profile());
        assert!(error().is_status_profile());
        assert!(!orbit().is_status_profile());
        assert_eq!(busy().archetype, Archetype::TurbulentNoise);
    }
}
