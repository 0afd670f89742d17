//! Deterministic simulation module
//!
//! Everything that moves or connects particles lives here. This module must be
//! pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by particle index)
//! - No rendering or platform dependencies

pub mod edges;
pub mod grid;
pub mod particle;
pub mod session;
pub mod sorted_index;

pub use edges::{EdgeBuffer, EdgeBuilder, EdgeStrategy, build_brute_force, build_full};
pub use grid::UniformGrid;
pub use particle::{Dimensions, Particle, ParticleSystem};
pub use session::{
    Frame, FrameInput, FrameUniforms, Session, clock_offset, normalize_pointer,
};
pub use sorted_index::{ResortPolicy, SortedIndex, lower_bound, upper_bound};
