//! Particle pool.
//!
//! A fixed-size pool: particles are never destroyed individually, they are
//! respawned in place with a fresh position and life when they expire or
//! leave the surface. The pool only reallocates when `initialize` asks for
//! more particles than it has ever held.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::types::Point;

/// One simulated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    /// Frames alive.
    pub age: u32,
    /// Frames before respawn.
    pub life: u32,
}

impl Particle {
    /// Opacity fades linearly from 1 at birth to 0 at `age == life`.
    #[inline]
    pub fn opacity(&self) -> f32 {
        if self.life == 0 {
            return 0.0;
        }
        (1.0 - self.age as f32 / self.life as f32).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age > self.life
    }
}

/// Respawn parameters: surface bounds and life range.
///
/// Copied out of the pool so particles can be respawned while the pool is
/// mutably borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawner {
    width: f32,
    height: f32,
    life_min: u32,
    life_max: u32,
}

impl Spawner {
    /// A fresh particle at a random position with a random life.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        Particle {
            position: Point::new(
                rng.random_range(0.0..self.width),
                rng.random_range(0.0..self.height),
            ),
            velocity: Point::ZERO,
            age: 0,
            life: rng.random_range(self.life_min..=self.life_max),
        }
    }
}

/// Fixed-size particle pool bound to a surface size.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    spawner: Spawner,
}

impl ParticlePool {
    /// Empty pool. `life` bounds are normalized so `min <= max` and `min >= 1`.
    pub fn new(life_min: u32, life_max: u32) -> Self {
        let lo = life_min.min(life_max).max(1);
        let hi = life_min.max(life_max).max(1);
        Self {
            particles: Vec::new(),
            spawner: Spawner {
                width: 0.0,
                height: 0.0,
                life_min: lo,
                life_max: hi,
            },
        }
    }

    /// (Re)fill the pool with `count` particles sampled uniformly over a
    /// `width x height` surface.
    ///
    /// Every particle is re-sampled; nothing from the previous size survives.
    /// A surface with no area leaves the pool empty.
    pub fn initialize<R: Rng + ?Sized>(&mut self, count: usize, width: f32, height: f32, rng: &mut R) {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.particles.clear();
        self.spawner.width = sanitize(width);
        self.spawner.height = sanitize(height);
        if self.spawner.width <= 0.0 || self.spawner.height <= 0.0 {
            return;
        }

        let spawner = self.spawner;
        self.particles.extend((0..count).map(|_| spawner.spawn(rng)));
    }

    /// Respawn parameters for the current bounds.
    pub fn spawner(&self) -> Spawner {
        self.spawner
    }

    #[inline]
    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0.0 && p.x <= self.spawner.width && p.y >= 0.0 && p.y <= self.spawner.height
    }

    pub fn width(&self) -> f32 {
        self.spawner.width
    }

    pub fn height(&self) -> f32 {
        self.spawner.height
    }

    pub fn life_range(&self) -> RangeInclusive<u32> {
        self.spawner.life_min..=self.spawner.life_max
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}
