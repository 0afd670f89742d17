//! Proximity edge building
//!
//! Every tick the edge buffer is rebuilt from scratch: one line segment per
//! unordered particle pair (i < j), two vertices per segment. Each vertex
//! carries the full position and velocity of its particle plus the pair's
//! distance, so a fragment stage can fade or cull segments on its own.

use serde::{Deserialize, Serialize};

use super::grid::UniformGrid;
use super::particle::ParticleSystem;
use super::sorted_index::SortedIndex;
use crate::pair_count;

/// How edges are produced each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrategy {
    /// Every pair, unfiltered. Culling is left to the shader via per-vertex distance.
    #[default]
    FullPairs,
    /// Every pair tested, kept if within threshold
    BruteForce,
    /// Per-axis sorted views narrow the candidates before the exact test
    SortedAxes,
    /// Uniform grid with cells the size of the threshold
    Grid,
}

impl EdgeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStrategy::FullPairs => "full_pairs",
            EdgeStrategy::BruteForce => "brute_force",
            EdgeStrategy::SortedAxes => "sorted_axes",
            EdgeStrategy::Grid => "grid",
        }
    }

    /// Whether this strategy drops pairs beyond the threshold on the CPU
    pub fn is_filtered(&self) -> bool {
        !matches!(self, EdgeStrategy::FullPairs)
    }
}

/// Flat per-frame edge data handed to the rasterizer
#[derive(Debug, Clone)]
pub struct EdgeBuffer {
    stride: usize,
    /// Endpoint positions, `segments * 2 * stride` values
    pub positions: Vec<f32>,
    /// Endpoint velocities, same layout as `positions`
    pub velocities: Vec<f32>,
    /// Pair distance repeated for both vertices, `segments * 2` values
    pub distances: Vec<f32>,
    /// Particle indices that produced each segment, `i < j`
    pub pairs: Vec<(u32, u32)>,
}

impl EdgeBuffer {
    /// Empty buffer that grows as segments are pushed
    pub fn new(stride: usize) -> Self {
        Self::with_capacity(0, stride)
    }

    /// Allocate room for `segments` segments
    pub fn with_capacity(segments: usize, stride: usize) -> Self {
        Self {
            stride,
            positions: Vec::with_capacity(segments * 2 * stride),
            velocities: Vec::with_capacity(segments * 2 * stride),
            distances: Vec::with_capacity(segments * 2),
            pairs: Vec::with_capacity(segments),
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.distances.clear();
        self.pairs.clear();
    }

    /// Number of line segments
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.pairs.len()
    }

    /// Values per vertex attribute (the dimensionality)
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Append the segment joining particles `i` and `j`
    fn push(&mut self, system: &ParticleSystem, i: usize, j: usize, distance: f32) {
        let particles = system.particles();
        let (a, b) = (&particles[i], &particles[j]);
        let d = self.stride;
        self.positions.extend_from_slice(&a.pos.to_array()[..d]);
        self.positions.extend_from_slice(&b.pos.to_array()[..d]);
        self.velocities.extend_from_slice(&a.vel.to_array()[..d]);
        self.velocities.extend_from_slice(&b.vel.to_array()[..d]);
        self.distances.push(distance);
        self.distances.push(distance);
        // Config validation caps the particle count at `MAX_PARTICLES`
        debug_assert!(j <= u32::MAX as usize);
        self.pairs.push((i as u32, j as u32));
    }
}

/// Rebuilds the edge buffer each tick with a fixed strategy
#[derive(Debug, Clone)]
pub struct EdgeBuilder {
    strategy: EdgeStrategy,
    threshold: f32,
    buffer: EdgeBuffer,
}

impl EdgeBuilder {
    /// The full pair list has a known size and is allocated up front. Filtered
    /// strategies start with room for one segment per particle and grow with
    /// the densest frame seen so far.
    pub fn new(strategy: EdgeStrategy, threshold: f32, system: &ParticleSystem) -> Self {
        let segments = if strategy.is_filtered() {
            system.len()
        } else {
            pair_count(system.len())
        };
        Self {
            strategy,
            threshold,
            buffer: EdgeBuffer::with_capacity(segments, system.dims().count()),
        }
    }

    #[inline]
    pub fn strategy(&self) -> EdgeStrategy {
        self.strategy
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn buffer(&self) -> &EdgeBuffer {
        &self.buffer
    }

    /// Recompute every segment from the current particle state.
    ///
    /// `index` and `grid` are only consulted by the strategies that need them
    /// and must already reflect the current positions.
    pub fn rebuild(
        &mut self,
        system: &ParticleSystem,
        index: Option<&SortedIndex>,
        grid: Option<&UniformGrid>,
    ) -> &EdgeBuffer {
        self.buffer.clear();
        match (self.strategy, index, grid) {
            (EdgeStrategy::FullPairs, _, _) => build_full(system, &mut self.buffer),
            (EdgeStrategy::SortedAxes, Some(index), _) => {
                build_sorted(system, index, self.threshold, &mut self.buffer)
            }
            (EdgeStrategy::Grid, _, Some(grid)) => {
                build_grid(system, grid, self.threshold, &mut self.buffer)
            }
            _ => build_brute_force(system, self.threshold, &mut self.buffer),
        }
        &self.buffer
    }
}

/// Emit every unordered pair, `n * (n - 1) / 2` segments
pub fn build_full(system: &ParticleSystem, out: &mut EdgeBuffer) {
    let particles = system.particles();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let distance = particles[i].distance(&particles[j]);
            out.push(system, i, j, distance);
        }
    }
}

/// Test every unordered pair and keep those within `threshold` (inclusive)
pub fn build_brute_force(system: &ParticleSystem, threshold: f32, out: &mut EdgeBuffer) {
    let particles = system.particles();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let distance = particles[i].distance(&particles[j]);
            if distance <= threshold {
                out.push(system, i, j, distance);
            }
        }
    }
}

/// Narrow candidates through the sorted axis views, then test exactly
pub fn build_sorted(
    system: &ParticleSystem,
    index: &SortedIndex,
    threshold: f32,
    out: &mut EdgeBuffer,
) {
    let particles = system.particles();
    for (i, p) in particles.iter().enumerate() {
        for j in index.candidates(p.pos, threshold) {
            let j = j as usize;
            if j <= i {
                continue;
            }
            let distance = p.distance(&particles[j]);
            if distance <= threshold {
                out.push(system, i, j, distance);
            }
        }
    }
    sort_segments(system, out);
}

/// Query the uniform grid's neighbouring cells, then test exactly
pub fn build_grid(
    system: &ParticleSystem,
    grid: &UniformGrid,
    threshold: f32,
    out: &mut EdgeBuffer,
) {
    let particles = system.particles();
    for (i, p) in particles.iter().enumerate() {
        grid.for_each_neighbor(p.pos, |j| {
            let j = j as usize;
            if j <= i {
                return;
            }
            let distance = p.distance(&particles[j]);
            if distance <= threshold {
                out.push(system, i, j, distance);
            }
        });
    }
    sort_segments(system, out);
}

/// Reorder segments into pair enumeration order (i ascending, then j).
///
/// Accelerated strategies visit candidates in index order, so segments for a
/// given `i` arrive shuffled.
fn sort_segments(system: &ParticleSystem, out: &mut EdgeBuffer) {
    if out.pairs.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }
    let mut order: Vec<(u32, u32, f32)> = out
        .pairs
        .iter()
        .zip(out.distances.iter().step_by(2))
        .map(|(&(i, j), &d)| (i, j, d))
        .collect();
    order.sort_unstable_by_key(|&(i, j, _)| (i, j));
    out.clear();
    for (i, j, d) in order {
        out.push(system, i as usize, j as usize, d);
    }
}
