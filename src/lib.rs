//! Plexus - drifting particles joined by proximity edges
//!
//! Core modules:
//! - `sim`: Deterministic simulation (particles, edge building, spatial indexes, session)
//! - `renderer`: Vertex layouts handed to the GPU rasterizer
//! - `config`: Construction-time configuration, loaded from JSON
//! - `error`: Configuration errors

pub mod config;
pub mod error;
pub mod renderer;
pub mod sim;

pub use config::SimConfig;
pub use error::ConfigError;

/// Simulation configuration constants
pub mod consts {
    /// Default number of particles
    pub const PARTICLE_COUNT: usize = 400;
    /// Default maximum distance for two particles to be joined by an edge
    pub const PROXIMITY_THRESHOLD: f32 = 0.15;
    /// Default bound on initial velocity components, in units per tick.
    ///
    /// The browser sketch drew velocities of about 2e-5 per millisecond and
    /// scaled them by elapsed time in the vertex stage. The simulation here
    /// steps a fixed tick instead, so the bound is that rate over one 60 Hz
    /// frame (about 16.7 ms).
    pub const SPEED: f32 = 0.00002 * 1000.0 / 60.0;

    /// Upper bound on particles for the filtered strategies. Particle indices
    /// are stored as `u32`.
    pub const MAX_PARTICLES: usize = 1 << 20;
    /// Upper bound on particles for `FullPairs`, which keeps every pair
    /// (about 8.4 million segments at this limit)
    pub const MAX_FULL_PAIRS_PARTICLES: usize = 4096;

    /// Domain boundaries (every axis)
    pub const DOMAIN_MIN: f32 = -1.0;
    pub const DOMAIN_MAX: f32 = 1.0;

    /// Default number of frames the headless runner steps through
    pub const DEFAULT_FRAMES: u64 = 600;
    /// Clock offsets wrap every hour (milliseconds)
    pub const CLOCK_WRAP_MS: f64 = 1000.0 * 60.0 * 60.0;
}

/// Number of unordered pairs among `n` particles, saturating at `usize::MAX`
#[inline]
pub fn pair_count(n: usize) -> usize {
    let m = n.saturating_sub(1);
    // Halve the even factor first so the product is exact whenever it fits
    if n % 2 == 0 {
        (n / 2).saturating_mul(m)
    } else {
        n.saturating_mul(m / 2)
    }
}
