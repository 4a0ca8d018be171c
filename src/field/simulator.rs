//! Particle field simulator.
//!
//! [`ParticleField`] owns the particle pool, the overlay vertex buffer and
//! its RNG. The host hands it a [`Surface`] and a [`FrameInput`] once per
//! frame; everything it knows about the outside world arrives through those
//! two arguments and the pointer listener it attaches.
//!
//! # Frame order
//!
//! ```text
//! resolve profile → trail fill → overlay polygon → particles → clicks → hover ring
//! ```
//!
//! Nothing in `tick` allocates once the pool is sized, except the hover
//! label string when a vertex is under the pointer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::overlay::Overlay;
use super::particle::ParticlePool;
use super::velocity::{compute_field_velocity, FieldFrame};
use crate::config::SimulatorConfig;
use crate::flow::{effective_profile, Archetype, FlowRegistry, FocusResolver, ProfileSource, SystemStatus};
use crate::renderer::Surface;
use crate::state::pointer::{self, Cleanup, PointerKind};
use crate::types::{Point, Rgba};

/// Clicks remembered between frames. Older clicks are dropped.
const MAX_PENDING_CLICKS: usize = 8;

/// Overlay stroke opacity.
const OVERLAY_ALPHA: f32 = 0.18;

/// Host state for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub frame: u64,
    pub focus: Option<String>,
    pub status: SystemStatus,
    pub fallback_text: String,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub archetype: Archetype,
    pub source: ProfileSource,
    pub sides: u8,
    pub particles: usize,
    pub respawned: usize,
    /// Overlay vertex under the pointer.
    pub hovered: Option<usize>,
}

/// Pointer state seen by the attached listener.
#[derive(Debug, Default)]
struct PointerTrack {
    position: Option<Point>,
    clicks: VecDeque<Point>,
}

type SelectHandler = Box<dyn FnMut(&str)>;

/// The particle field.
pub struct ParticleField {
    registry: FlowRegistry,
    resolver: Option<Box<dyn FocusResolver>>,
    settings: SimulatorConfig,
    pool: ParticlePool,
    /// Count from the last `initialize`; kept across resizes.
    particle_count: Option<usize>,
    overlay: Overlay,
    rng: StdRng,
    concepts: Vec<String>,
    pointer: Rc<RefCell<PointerTrack>>,
    detach: Option<Cleanup>,
    on_select: Option<SelectHandler>,
    active_profile: String,
    hover_label: String,
    disposed: bool,
}

impl ParticleField {
    /// A field drawing profiles from `registry`.
    ///
    /// Focus keys resolve through the registry itself (a key that names a
    /// profile selects it) until [`with_resolver`](Self::with_resolver)
    /// installs another resolver. The pool stays empty until
    /// [`initialize`](Self::initialize).
    pub fn new(registry: FlowRegistry, settings: SimulatorConfig) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let pool = ParticlePool::new(settings.life_min, settings.life_max);
        let active_profile = registry.default_profile().id.clone();
        Self {
            registry,
            resolver: None,
            settings,
            pool,
            particle_count: None,
            overlay: Overlay::new(),
            rng: StdRng::seed_from_u64(seed),
            concepts: Vec::new(),
            pointer: Rc::new(RefCell::new(PointerTrack::default())),
            detach: None,
            on_select: None,
            active_profile,
            hover_label: String::new(),
            disposed: false,
        }
    }

    pub fn with_resolver(mut self, resolver: impl FocusResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Concept keys bound to overlay vertices, in vertex order.
    pub fn with_concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    /// Called with the concept key when a click lands on a vertex.
    pub fn on_select<F>(&mut self, handler: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.on_select = Some(Box::new(handler));
    }

    /// (Re)size the pool for a `width x height` surface and re-sample every
    /// particle. Call on every resize.
    pub fn initialize(&mut self, particle_count: usize, width: f32, height: f32) {
        if self.disposed {
            return;
        }
        self.particle_count = Some(particle_count);
        self.pool.initialize(particle_count, width, height, &mut self.rng);
        info!(particles = self.pool.len(), width, height, "particle field initialized");
    }

    /// Attach the pointer listener (hover and click hit-testing).
    ///
    /// Does nothing if already attached or disposed.
    pub fn attach_pointer(&mut self) {
        if self.detach.is_some() || self.disposed {
            return;
        }
        let track = Rc::clone(&self.pointer);
        self.detach = Some(pointer::on_pointer(move |event| {
            let mut track = track.borrow_mut();
            match event.kind {
                PointerKind::Move => track.position = Some(event.position),
                PointerKind::Click => {
                    track.position = Some(event.position);
                    if track.clicks.len() == MAX_PENDING_CLICKS {
                        track.clicks.pop_front();
                    }
                    track.clicks.push_back(event.position);
                }
                PointerKind::Leave => track.position = None,
            }
        }));
        debug!("pointer listener attached");
    }

    /// Advance one frame and draw it.
    ///
    /// Returns `None` without touching any state when there is no surface,
    /// the surface has no area, or the field is disposed.
    pub fn tick(&mut self, surface: Option<&mut dyn Surface>, input: &FrameInput) -> Option<FrameStats> {
        if self.disposed {
            return None;
        }
        let surface = surface?;
        let (width, height) = (surface.width(), surface.height());
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        if width != self.pool.width() || height != self.pool.height() {
            debug!(width, height, "surface size changed, re-sampling particles");
            let count = self.particle_count.unwrap_or(self.settings.particle_count);
            self.pool.initialize(count, width, height, &mut self.rng);
        }

        let resolver: &dyn FocusResolver = match &self.resolver {
            Some(resolver) => resolver.as_ref(),
            None => &self.registry,
        };
        let effective = effective_profile(
            &self.registry,
            resolver,
            input.status,
            input.focus.as_deref(),
            &input.fallback_text,
        );
        let profile = effective.profile;
        let (source, sides, archetype) = (effective.source, effective.sides, profile.archetype);
        if profile.id != self.active_profile {
            debug!(from = %self.active_profile, to = %profile.id, source = ?effective.source, "flow profile changed");
            self.active_profile.clone_from(&profile.id);
        }
        let tint = Rgba::from_triple(profile.tint);
        let field = FieldFrame::new(width, height, input.frame);

        surface.begin_frame();

        let [r, g, b] = self.settings.background;
        surface.fill(Rgba::rgb(r, g, b).with_opacity(self.settings.trail_alpha));

        self.overlay.layout(
            field.center,
            field.extent * self.settings.overlay_radius,
            sides,
            input.frame,
            effective.text_hash,
        );
        surface.polyline(self.overlay.vertices(), true, tint.with_opacity(OVERLAY_ALPHA));

        let mut respawned = 0;
        let spawner = self.pool.spawner();
        for (i, particle) in self.pool.particles_mut().iter_mut().enumerate() {
            particle.velocity = compute_field_velocity(profile, particle.position, &field, &mut self.rng);
            particle.position += particle.velocity;
            particle.age += 1;

            let p = particle.position;
            let out_of_bounds = !(p.x >= 0.0 && p.x <= width && p.y >= 0.0 && p.y <= height);
            if particle.is_expired() || out_of_bounds {
                *particle = spawner.spawn(&mut self.rng);
                respawned += 1;
            }

            let size = 1.0 + (i & 1) as f32;
            surface.point(particle.position, size, tint.with_opacity(particle.opacity()));
        }

        self.drain_clicks();

        let hover_radius = self.settings.hover_radius;
        let hovered = self
            .pointer
            .borrow()
            .position
            .and_then(|p| self.overlay.hit_test(p, hover_radius));
        if let Some(index) = hovered {
            let vertex = self.overlay.vertices()[index];
            surface.ring(vertex, hover_radius, tint);
            let label = concept_for_vertex(&self.concepts, index).unwrap_or(self.active_profile.as_str());
            self.hover_label.clear();
            self.hover_label.push_str(label);
            let at = Point::new(vertex.x + hover_radius + 1.0, vertex.y);
            surface.text(at, &self.hover_label, Rgba::WHITE);
        }

        Some(FrameStats {
            archetype,
            source,
            sides,
            particles: self.pool.len(),
            respawned,
            hovered,
        })
    }

    /// Concept under `at` on the last drawn overlay, if any.
    pub fn concept_at(&self, at: Point) -> Option<&str> {
        self.overlay
            .hit_test(at, self.settings.hover_radius)
            .and_then(|index| concept_for_vertex(&self.concepts, index))
    }

    /// Select the concept under `at`, firing the selection callback.
    pub fn select_at(&mut self, at: Point) -> Option<String> {
        let key = self.concept_at(at)?.to_string();
        debug!(concept = %key, "concept selected");
        if let Some(handler) = self.on_select.as_mut() {
            handler(&key);
        }
        Some(key)
    }

    /// Stop drawing and detach the pointer listener. Safe to call twice.
    pub fn dispose(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.overlay.clear();
        let mut track = self.pointer.borrow_mut();
        track.position = None;
        track.clicks.clear();
        info!("particle field disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_pointer_attached(&self) -> bool {
        self.detach.is_some()
    }

    pub fn particles(&self) -> &[super::Particle] {
        self.pool.particles()
    }

    /// Overlay vertices from the last tick.
    pub fn overlay_vertices(&self) -> &[Point] {
        self.overlay.vertices()
    }

    /// Id of the profile the last tick drew with.
    pub fn active_profile_id(&self) -> &str {
        &self.active_profile
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SimulatorConfig {
        &self.settings
    }

    fn drain_clicks(&mut self) {
        loop {
            let Some(click) = self.pointer.borrow_mut().clicks.pop_front() else {
                break;
            };
            self.select_at(click);
        }
    }
}

/// Concept bound to overlay vertex `index`, wrapping when there are more
/// vertices than concepts.
fn concept_for_vertex(concepts: &[String], index: usize) -> Option<&str> {
    if concepts.is_empty() {
        return None;
    }
    Some(concepts[index % concepts.len()].as_str())
}

impl Drop for ParticleField {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ParticleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleField")
            .field("particles", &self.pool.len())
            .field("active_profile", &self.active_profile)
            .field("concepts", &self.concepts)
            .field("attached", &self.detach.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{ConceptTable, STATUS_BUSY_ID};
    use crate::renderer::{DrawCall, RecordingSurface};
    use crate::state::pointer::{dispatch, listener_count, reset_pointer_state, PointerEvent};
    use std::cell::RefCell;

    fn settings() -> SimulatorConfig {
        SimulatorConfig {
            particle_count: 200,
            seed: Some(11),
            ..SimulatorConfig::default()
        }
    }

    fn field() -> ParticleField {
        let mut field = ParticleField::new(FlowRegistry::builtin(), settings());
        field.initialize(200, 160.0, 80.0);
        field
    }

    fn input(frame: u64) -> FrameInput {
        FrameInput {
            frame,
            ..FrameInput::default()
        }
    }

    #[test]
    fn test_tick_without_surface_is_noop() {
        let mut field = field();
        let before = field.particles().to_vec();
        assert!(field.tick(None, &input(1)).is_none());
        assert_eq!(field.particles(), before.as_slice());
    }

    #[test]
    fn test_tick_draws_in_frame_order() {
        let mut field = field();
        let mut surface = RecordingSurface::new(160.0, 80.0);
        let stats = field.tick(Some(&mut surface), &input(1)).unwrap();

        assert_eq!(surface.calls[0], DrawCall::BeginFrame);
        assert!(matches!(surface.calls[1], DrawCall::Fill(_)));
        assert!(matches!(surface.calls[2], DrawCall::Polyline { closed: true, .. }));
        assert_eq!(surface.points().count(), 200);
        assert_eq!(stats.particles, 200);
        assert!(surface.points().all(|(_, size, _)| (1.0..=2.0).contains(&size)));
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut field = field();
        let mut surface = RecordingSurface::new(160.0, 80.0);
        for frame in 0..300 {
            surface.clear();
            field.tick(Some(&mut surface), &input(frame));
            for p in field.particles() {
                assert!(p.position.x >= 0.0 && p.position.x <= 160.0);
                assert!(p.position.y >= 0.0 && p.position.y <= 80.0);
            }
        }
    }

    #[test]
    fn test_status_overrides_focus() {
        let mut field = field();
        let mut surface = RecordingSurface::new(160.0, 80.0);
        let frame = FrameInput {
            frame: 1,
            focus: Some("orbit".into()),
            status: SystemStatus::Busy,
            fallback_text: String::new(),
        };
        let stats = field.tick(Some(&mut surface), &frame).unwrap();
        assert_eq!(stats.archetype, Archetype::TurbulentNoise);
        assert_eq!(field.active_profile_id(), STATUS_BUSY_ID);

        let frame = FrameInput {
            status: SystemStatus::Idle,
            ..frame
        };
        let stats = field.tick(Some(&mut surface), &frame).unwrap();
        assert_eq!(stats.source, ProfileSource::Focus);
        assert_eq!(field.active_profile_id(), "orbit");
    }

    #[test]
    fn test_custom_resolver_is_consulted() {
        let mut table = ConceptTable::default();
        table.insert("gravity", "collapse");
        let mut field = ParticleField::new(FlowRegistry::builtin(), settings()).with_resolver(table);
        field.initialize(10, 50.0, 50.0);
        let mut surface = RecordingSurface::new(50.0, 50.0);
        let frame = FrameInput {
            focus: Some("gravity".into()),
            ..input(0)
        };
        field.tick(Some(&mut surface), &frame);
        assert_eq!(field.active_profile_id(), "collapse");
    }

    #[test]
    fn test_surface_resize_resamples_pool() {
        let mut field = field();
        let mut surface = RecordingSurface::new(30.0, 20.0);
        field.tick(Some(&mut surface), &input(0));
        assert_eq!(field.particles().len(), 200);
        assert!(field
            .particles()
            .iter()
            .all(|p| p.position.x <= 30.0 && p.position.y <= 20.0));
    }

    #[test]
    fn test_surface_resize_keeps_initialized_count() {
        let mut field = ParticleField::new(FlowRegistry::builtin(), settings());
        field.initialize(10, 100.0, 100.0);
        let mut surface = RecordingSurface::new(50.0, 50.0);

        let stats = field.tick(Some(&mut surface), &input(0)).unwrap();
        assert_eq!(stats.particles, 10);
        assert_eq!(field.particles().len(), 10);
    }

    #[test]
    fn test_first_tick_sizes_uninitialized_pool_from_settings() {
        let mut field = ParticleField::new(FlowRegistry::builtin(), settings());
        let mut surface = RecordingSurface::new(50.0, 50.0);
        let stats = field.tick(Some(&mut surface), &input(0)).unwrap();
        assert_eq!(stats.particles, 200);
    }

    #[test]
    fn test_hover_without_concepts_labels_profile() {
        reset_pointer_state();
        let mut field = field();
        field.attach_pointer();
        let mut surface = RecordingSurface::new(160.0, 80.0);
        let frame = FrameInput {
            focus: Some("orbit".into()),
            ..input(0)
        };
        field.tick(Some(&mut surface), &frame);
        let vertex = field.overlay_vertices()[1];

        dispatch(PointerEvent::move_to(vertex));
        surface.clear();
        let stats = field.tick(Some(&mut surface), &frame).unwrap();

        assert_eq!(stats.hovered, Some(1));
        assert!(surface.calls.iter().any(|c| matches!(c, DrawCall::Ring { .. })));
        assert_eq!(surface.labels().collect::<Vec<_>>(), ["orbit"]);
    }

    #[test]
    fn test_click_on_vertex_selects_concept() {
        reset_pointer_state();
        let selected = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&selected);

        let mut field = ParticleField::new(FlowRegistry::builtin(), settings())
            .with_concepts(["tides", "ember"]);
        field.on_select(move |key| sink.borrow_mut().push(key.to_string()));
        field.initialize(10, 160.0, 80.0);
        field.attach_pointer();

        let mut surface = RecordingSurface::new(160.0, 80.0);
        let frame = FrameInput {
            frame: 5,
            focus: Some("spiral".into()),
            ..FrameInput::default()
        };
        field.tick(Some(&mut surface), &frame);
        // Spiral has more than two sides, so vertex 2 wraps to concept 0.
        let vertex = field.overlay_vertices()[2];

        dispatch(PointerEvent::click(vertex));
        surface.clear();
        let stats = field.tick(Some(&mut surface), &frame).unwrap();

        assert_eq!(selected.borrow().as_slice(), ["tides".to_string()]);
        assert_eq!(stats.hovered, Some(2));
        assert!(surface.calls.iter().any(|c| matches!(c, DrawCall::Ring { .. })));
        assert_eq!(surface.labels().collect::<Vec<_>>(), ["tides"]);
    }

    #[test]
    fn test_leave_clears_hover() {
        reset_pointer_state();
        let mut field = field().with_concepts(["a"]);
        field.attach_pointer();
        let mut surface = RecordingSurface::new(160.0, 80.0);
        field.tick(Some(&mut surface), &input(0));
        let vertex = field.overlay_vertices()[0];

        dispatch(PointerEvent::move_to(vertex));
        assert_eq!(field.tick(Some(&mut surface), &input(0)).unwrap().hovered, Some(0));
        dispatch(PointerEvent::leave());
        assert_eq!(field.tick(Some(&mut surface), &input(0)).unwrap().hovered, None);
    }

    #[test]
    fn test_dispose_is_idempotent_and_detaches() {
        reset_pointer_state();
        let mut field = field();
        field.attach_pointer();
        assert_eq!(listener_count(), 1);

        field.dispose();
        field.dispose();
        assert_eq!(listener_count(), 0);
        assert!(field.is_disposed());

        let mut surface = RecordingSurface::new(160.0, 80.0);
        assert!(field.tick(Some(&mut surface), &input(1)).is_none());
        assert!(surface.calls.is_empty());

        field.attach_pointer();
        assert_eq!(listener_count(), 0);
    }

    #[test]
    fn test_drop_detaches_listener() {
        reset_pointer_state();
        {
            let mut field = field();
            field.attach_pointer();
            assert_eq!(listener_count(), 1);
        }
        assert_eq!(listener_count(), 0);
    }
}
