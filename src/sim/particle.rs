//! Particles and the fixed-size particle system
//!
//! Positions live in the [-1, 1] box (square in 2D, cube in 3D). Each tick a
//! particle moves by its velocity and bounces off the walls axis by axis.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{DOMAIN_MAX, DOMAIN_MIN};
use crate::error::ConfigError;

/// Dimensionality of the simulation space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensions {
    #[default]
    Two,
    Three,
}

impl Dimensions {
    /// Number of active axes
    #[inline]
    pub fn count(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimensions {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            other => Err(ConfigError::InvalidDimensions(other)),
        }
    }
}

impl From<Dimensions> for u8 {
    fn from(dims: Dimensions) -> Self {
        dims.count() as u8
    }
}

/// A single particle. In 2D the `z` components stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
}

impl Particle {
    pub fn new(pos: Vec3, vel: Vec3) -> Self {
        Self { pos, vel }
    }

    /// Move by one velocity step, clamping to the domain and reflecting
    /// velocity on every axis that reached a wall.
    pub fn advance(&mut self, dims: Dimensions) {
        for axis in 0..dims.count() {
            let clamped = (self.pos[axis] + self.vel[axis]).clamp(DOMAIN_MIN, DOMAIN_MAX);
            self.pos[axis] = clamped;
            if clamped >= DOMAIN_MAX || clamped <= DOMAIN_MIN {
                self.vel[axis] = -self.vel[axis];
            }
        }
    }

    /// Euclidean distance between two particles
    #[inline]
    pub fn distance(&self, other: &Particle) -> f32 {
        self.pos.distance(other.pos)
    }
}

/// Fixed-size collection of particles, indexed by position in the collection
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    dims: Dimensions,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    /// Spawn `count` particles with random positions in the domain and
    /// velocity components in `[-speed, speed)`.
    pub fn spawn(count: usize, speed: f32, dims: Dimensions, rng: &mut Pcg32) -> Self {
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let mut pos = Vec3::ZERO;
            let mut vel = Vec3::ZERO;
            for axis in 0..dims.count() {
                pos[axis] = rng.random_range(DOMAIN_MIN..DOMAIN_MAX);
                vel[axis] = rng.random_range(-speed..speed);
            }
            particles.push(Particle::new(pos, vel));
        }
        Self { dims, particles }
    }

    /// Build a system from explicit particles (unused axes are zeroed)
    pub fn from_particles(dims: Dimensions, mut particles: Vec<Particle>) -> Self {
        if dims == Dimensions::Two {
            for p in &mut particles {
                p.pos.z = 0.0;
                p.vel.z = 0.0;
            }
        }
        Self { dims, particles }
    }

    /// Advance every particle by one tick
    pub fn advance(&mut self) {
        let dims = self.dims;
        for p in &mut self.particles {
            p.advance(dims);
        }
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Flat position buffer, `len() * dims` values
    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        let d = self.dims.count();
        for p in &self.particles {
            out.extend_from_slice(&p.pos.to_array()[..d]);
        }
    }

    /// Flat velocity buffer, `len() * dims` values
    pub fn write_velocities(&self, out: &mut Vec<f32>) {
        out.clear();
        let d = self.dims.count();
        for p in &self.particles {
            out.extend_from_slice(&p.vel.to_array()[..d]);
        }
    }
}
