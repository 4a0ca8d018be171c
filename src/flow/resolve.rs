//! Effective profile resolution.
//!
//! Picks the profile a frame is drawn with from the host state handed to
//! `tick`: the system status wins, then the focus key (through a
//! [`FocusResolver`]), then a stable hash of the fallback text.

use serde::{Deserialize, Serialize};

use super::{
    text_hash, FlowProfile, FlowRegistry, STATUS_BUSY_ID, STATUS_COMMUNICATING_ID, STATUS_ERROR_ID,
};

/// Externally reported system status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemStatus {
    #[default]
    Idle,
    Busy,
    Communicating,
    Error,
}

impl SystemStatus {
    /// Reserved profile id that overrides focus selection, if any.
    pub fn override_profile_id(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::Busy => Some(STATUS_BUSY_ID),
            Self::Communicating => Some(STATUS_COMMUNICATING_ID),
            Self::Error => Some(STATUS_ERROR_ID),
        }
    }

    /// Next status in display order (used by the host's status toggle).
    pub fn cycle(self) -> Self {
        match self {
            Self::Idle => Self::Busy,
            Self::Busy => Self::Communicating,
            Self::Communicating => Self::Error,
            Self::Error => Self::Idle,
        }
    }
}

// =============================================================================
// FocusResolver
// =============================================================================

/// Maps a focus key to a flow profile id. `None` means "unrecognized".
pub trait FocusResolver {
    fn resolve_focus_profile_id(&self, focus_key: &str) -> Option<String>;
}

/// Any closure works as a resolver.
impl<F> FocusResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve_focus_profile_id(&self, focus_key: &str) -> Option<String> {
        self(focus_key)
    }
}

/// A focus key that names a registered profile resolves to itself.
impl FocusResolver for FlowRegistry {
    fn resolve_focus_profile_id(&self, focus_key: &str) -> Option<String> {
        self.contains(focus_key).then(|| focus_key.to_string())
    }
}

/// Concept table: ordered focus keys with the profile each one selects.
///
/// The order is also the order concepts are bound to overlay vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptTable {
    entries: Vec<Concept>,
}

/// One focusable concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub key: String,
    pub profile: String,
}

impl ConceptTable {
    pub fn new(entries: Vec<Concept>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, key: impl Into<String>, profile: impl Into<String>) {
        let key = key.into();
        let profile = profile.into();
        match self.entries.iter_mut().find(|c| c.key == key) {
            Some(existing) => existing.profile = profile,
            None => self.entries.push(Concept { key, profile }),
        }
    }

    /// Concept keys in binding order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FocusResolver for ConceptTable {
    fn resolve_focus_profile_id(&self, focus_key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|c| c.key == focus_key)
            .map(|c| c.profile.clone())
    }
}

// =============================================================================
// Effective profile
// =============================================================================

/// Where the frame's profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Status(SystemStatus),
    Focus,
    Fallback,
}

/// The profile a frame is drawn with, plus the overlay signature.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveProfile<'a> {
    pub profile: &'a FlowProfile,
    pub source: ProfileSource,
    /// Hash of the focus text; seeds the overlay wobble.
    pub text_hash: u32,
    /// Overlay polygon side count.
    pub sides: u8,
}

/// Resolve the profile for one frame.
///
/// A focus key the resolver does not recognize is hashed like fallback text,
/// so unrecognized input still looks distinct per key.
pub fn effective_profile<'a>(
    registry: &'a FlowRegistry,
    resolver: &dyn FocusResolver,
    status: SystemStatus,
    focus: Option<&str>,
    fallback_text: &str,
) -> EffectiveProfile<'a> {
    let focus = focus.filter(|f| !f.is_empty());
    let signature_text = focus.unwrap_or(fallback_text);
    let hash = text_hash(signature_text);

    if let Some(id) = status.override_profile_id() {
        let profile = registry.lookup(Some(id));
        return EffectiveProfile {
            profile,
            source: ProfileSource::Status(status),
            text_hash: hash,
            sides: profile.sides,
        };
    }

    if let Some(id) = focus.and_then(|key| resolver.resolve_focus_profile_id(key)) {
        let profile = registry.lookup(Some(&id));
        return EffectiveProfile {
            profile,
            source: ProfileSource::Focus,
            text_hash: hash,
            sides: profile.sides,
        };
    }

    EffectiveProfile {
        profile: registry.fallback_for_text(signature_text),
        source: ProfileSource::Fallback,
        text_hash: hash,
        sides: 3 + (hash % 6) as u8,
    }
}
