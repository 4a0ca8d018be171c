//! Particle Field Simulator.
//!
//! - [`velocity`] - the archetype velocity law (pure)
//! - [`particle`] - fixed-size particle pool
//! - [`overlay`] - overlay polygon and vertex hit-testing
//! - [`simulator`] - [`ParticleField`], the per-frame update and draw

pub mod overlay;
pub mod particle;
pub mod simulator;
pub mod velocity;

pub use overlay::Overlay;
pub use particle::{Particle, ParticlePool, Spawner};
pub use simulator::{FrameInput, FrameStats, ParticleField};
pub use velocity::{compute_field_velocity, FieldFrame};
