//! Particle field behavior through the public API.

use rand::rngs::StdRng;
use rand::SeedableRng;

use spark_flow::config::SimulatorConfig;
use spark_flow::field::{compute_field_velocity, FieldFrame, FrameInput, ParticleField};
use spark_flow::flow::{presets, FlowRegistry, SystemStatus};
use spark_flow::renderer::RecordingSurface;
use spark_flow::Point;

fn settings(count: usize, seed: u64) -> SimulatorConfig {
    SimulatorConfig {
        particle_count: count,
        seed: Some(seed),
        ..SimulatorConfig::default()
    }
}

fn frame(n: u64) -> FrameInput {
    FrameInput {
        frame: n,
        ..FrameInput::default()
    }
}

#[test]
fn opacity_only_decreases_between_respawns() {
    let mut field = ParticleField::new(FlowRegistry::builtin(), settings(1, 5));
    let mut surface = RecordingSurface::new(400.0, 400.0);
    field.initialize(1, 400.0, 400.0);

    let mut last = field.particles()[0].opacity();
    for n in 0..40 {
        let stats = field.tick(Some(&mut surface), &frame(n)).unwrap();
        let now = field.particles()[0].opacity();
        if stats.respawned == 0 {
            assert!(now <= last, "opacity rose from {last} to {now}");
        }
        last = now;
    }
}

#[test]
fn resize_resamples_into_new_bounds() {
    let mut field = ParticleField::new(FlowRegistry::builtin(), settings(300, 9));
    field.initialize(300, 400.0, 300.0);

    let mut small = RecordingSurface::new(40.0, 20.0);
    let stats = field.tick(Some(&mut small), &frame(0)).unwrap();
    assert_eq!(stats.particles, 300);
    assert!(field
        .particles()
        .iter()
        .all(|p| (0.0..=40.0).contains(&p.position.x) && (0.0..=20.0).contains(&p.position.y)));
}

#[test]
fn zero_area_surface_is_skipped() {
    let mut field = ParticleField::new(FlowRegistry::builtin(), settings(50, 1));
    field.initialize(50, 100.0, 100.0);
    let before = field.particles().to_vec();

    let mut empty = RecordingSurface::new(0.0, 100.0);
    assert!(field.tick(Some(&mut empty), &frame(1)).is_none());
    assert!(empty.calls.is_empty());
    assert!(field.tick(None, &frame(2)).is_none());
    assert_eq!(field.particles(), before.as_slice());
}

#[test]
fn status_overrides_focus() {
    let mut field = ParticleField::new(FlowRegistry::builtin(), settings(10, 2));
    let mut surface = RecordingSurface::new(100.0, 100.0);
    let input = FrameInput {
        frame: 1,
        focus: Some("orbit".into()),
        status: SystemStatus::Error,
        ..FrameInput::default()
    };

    field.tick(Some(&mut surface), &input).unwrap();
    assert_eq!(field.active_profile_id(), presets::error().id);

    let input = FrameInput {
        status: SystemStatus::Idle,
        ..input
    };
    field.tick(Some(&mut surface), &input).unwrap();
    assert_eq!(field.active_profile_id(), "orbit");
}

#[test]
fn dispose_twice_then_tick_draws_nothing() {
    let mut field = ParticleField::new(FlowRegistry::builtin(), settings(20, 4));
    field.attach_pointer();
    field.dispose();
    field.dispose();
    assert!(field.is_disposed());
    assert!(!field.is_pointer_attached());

    let mut surface = RecordingSurface::new(100.0, 100.0);
    assert!(field.tick(Some(&mut surface), &frame(0)).is_none());
    assert!(surface.calls.is_empty());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn velocity_has_profile_speed(
            preset in 0usize..11,
            x in 0.0f32..320.0,
            y in 0.0f32..180.0,
            t in 0u64..10_000,
            seed in any::<u64>(),
        ) {
            let profiles = presets::all();
            let profile = &profiles[preset % profiles.len()];
            let field = FieldFrame::new(320.0, 180.0, t);
            let mut rng = StdRng::seed_from_u64(seed);

            let v = compute_field_velocity(profile, Point::new(x, y), &field, &mut rng);
            prop_assert!(v.x.is_finite() && v.y.is_finite());
            if v != Point::ZERO {
                let tolerance = 1e-3 * profile.speed.max(1.0);
                prop_assert!((v.length() - profile.speed).abs() < tolerance,
                    "{} at ({}, {}): |v| = {}", profile.id, x, y, v.length());
            }
        }

        #[test]
        fn particles_stay_in_bounds(
            width in 8.0f32..300.0,
            height in 8.0f32..200.0,
            ticks in 1u64..40,
            seed in any::<u64>(),
        ) {
            let mut field = ParticleField::new(FlowRegistry::builtin(), settings(120, seed));
            let mut surface = RecordingSurface::new(width, height);
            field.initialize(120, width, height);

            for n in 0..ticks {
                let stats = field.tick(Some(&mut surface), &frame(n));
                prop_assert!(stats.is_some());
                surface.clear();
            }
            prop_assert_eq!(field.particles().len(), 120);
            for p in field.particles() {
                prop_assert!(p.position.x >= 0.0 && p.position.x <= width);
                prop_assert!(p.position.y >= 0.0 && p.position.y <= height);
                prop_assert!(p.age <= p.life);
            }
        }
    }
}
