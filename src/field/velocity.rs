//! Velocity law.
//!
//! Every particle's velocity is computed in two stages:
//!
//! 1. **Archetype direction** - a pure function of the archetype, the
//!    particle's position relative to the surface center, and the frame.
//! 2. **Perturb, renormalize, scale** - uniform noise scaled by the profile's
//!    noise level is added to both axes, the result is normalized, then
//!    multiplied by the profile speed.
//!
//! Normalizing before applying speed makes `speed` mean the same thing for
//! every archetype, however noisy the direction is.
//!
//! | Archetype          | Direction (dx, dy = unit vector center → particle) |
//! |--------------------|-----------------------------------------------------|
//! | uniform-grid       | (1, 0)                                              |
//! | radial             | (dx, dy) * radial_bias                              |
//! | tangential-orbit   | (-dy, dx)                                           |
//! | logarithmic-spiral | (dx*bias - dy*twist, dy*bias + dx*twist)            |
//! | radial-shell       | correction toward the shell band + tangential       |
//! | turbulent-noise    | trig functions of position and frame                |

use rand::Rng;

use crate::flow::{Archetype, FlowProfile};
use crate::types::Point;

/// Directions shorter than this are degenerate and produce no motion.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Tangential component of the radial-shell archetype.
const SHELL_TANGENT: f32 = 0.6;

/// Width of the radial-shell band, as a fraction of the field extent.
const SHELL_BAND: f32 = 0.1;

/// Geometry shared by every particle in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldFrame {
    /// Surface center.
    pub center: Point,
    /// Half the short side of the surface.
    pub extent: f32,
    /// Frame counter.
    pub frame: u64,
}

impl FieldFrame {
    pub fn new(width: f32, height: f32, frame: u64) -> Self {
        Self {
            center: Point::new(width / 2.0, height / 2.0),
            extent: width.min(height) / 2.0,
            frame,
        }
    }
}

/// Stage one: the archetype's unscaled direction at `position`.
pub fn archetype_direction(profile: &FlowProfile, position: Point, field: &FieldFrame) -> Point {
    let offset = position - field.center;
    let dist = offset.length();
    let (dx, dy) = if dist > DEGENERATE_EPSILON {
        (offset.x / dist, offset.y / dist)
    } else {
        (0.0, 0.0)
    };

    match profile.archetype {
        Archetype::UniformGrid => Point::new(1.0, 0.0),
        Archetype::Radial => Point::new(dx, dy) * profile.radial_bias,
        Archetype::TangentialOrbit => Point::new(-dy, dx),
        Archetype::LogarithmicSpiral => Point::new(
            dx * profile.radial_bias - dy * profile.twist,
            dy * profile.radial_bias + dx * profile.twist,
        ),
        Archetype::RadialShell => {
            let target = profile.shell_radius * field.extent;
            let band = (field.extent * SHELL_BAND).max(1.0);
            let correction = ((target - dist) / band).clamp(-1.0, 1.0);
            Point::new(
                dx * correction - dy * SHELL_TANGENT,
                dy * correction + dx * SHELL_TANGENT,
            )
        }
        Archetype::TurbulentNoise => {
            let t = field.frame as f32;
            let (x, y) = (position.x, position.y);
            Point::new(
                (y * 0.010 + t * 0.020).sin() * profile.curl
                    + (x * 0.013 - t * 0.015).cos() * profile.noise,
                (x * 0.010 - t * 0.020).cos() * profile.curl
                    - (y * 0.013 + t * 0.010).sin() * profile.noise,
            )
        }
    }
}

/// Stage two: add `jitter * noise`, renormalize, scale by speed.
///
/// `jitter` components are expected in `[-0.5, 0.5)`. Degenerate vectors
/// (shorter than [`DEGENERATE_EPSILON`] after perturbation) return zero.
pub fn perturb_and_scale(direction: Point, jitter: Point, noise: f32, speed: f32) -> Point {
    let perturbed = direction + jitter * noise;
    let len = perturbed.length();
    if len <= DEGENERATE_EPSILON || !len.is_finite() {
        return Point::ZERO;
    }
    perturbed * (speed / len)
}

/// Velocity of a particle at `position` under `profile`.
///
/// The result has magnitude `profile.speed` unless the direction is
/// degenerate (e.g. a radial field sampled exactly at the center).
pub fn compute_field_velocity<R: Rng + ?Sized>(
    profile: &FlowProfile,
    position: Point,
    field: &FieldFrame,
    rng: &mut R,
) -> Point {
    let direction = archetype_direction(profile, position, field);
    let jitter = Point::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5);
    perturb_and_scale(direction, jitter, profile.noise, profile.speed)
}
