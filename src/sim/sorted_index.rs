//! Per-axis sorted views of the particle system
//!
//! Each axis keeps particle indices ordered by that coordinate, alongside the
//! sorted coordinates themselves. A proximity query looks up the window
//! `[c - threshold, c + threshold]` on every axis with boundary searches and
//! scans the narrowest one. Any pair within the threshold lies inside every
//! axis window, so one window is enough for an exact answer.

use std::ops::Range;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::particle::ParticleSystem;

/// How the axis orderings are refreshed after particles move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResortPolicy {
    /// Stable sort from the previous order every tick
    #[default]
    Full,
    /// Insertion sort, cheap when the order barely changed since last tick
    Incremental,
}

/// First index whose key is `>= needle` (`keys.len()` if none)
#[inline]
pub fn lower_bound(keys: &[f32], needle: f32) -> usize {
    keys.partition_point(|&k| k < needle)
}

/// First index whose key is `> needle` (`keys.len()` if none)
#[inline]
pub fn upper_bound(keys: &[f32], needle: f32) -> usize {
    keys.partition_point(|&k| k <= needle)
}

/// Particle indices ordered by one coordinate axis
#[derive(Debug, Clone)]
pub struct AxisOrder {
    axis: usize,
    order: Vec<u32>,
    keys: Vec<f32>,
}

impl AxisOrder {
    fn new(axis: usize, system: &ParticleSystem) -> Self {
        let mut this = Self {
            axis,
            order: (0..system.len() as u32).collect(),
            keys: Vec::with_capacity(system.len()),
        };
        this.resort(system, ResortPolicy::Full);
        this
    }

    fn resort(&mut self, system: &ParticleSystem, policy: ResortPolicy) {
        let particles = system.particles();
        let axis = self.axis;
        match policy {
            ResortPolicy::Full => {
                self.order.sort_by(|&a, &b| {
                    particles[a as usize].pos[axis].total_cmp(&particles[b as usize].pos[axis])
                });
                self.keys.clear();
                self.keys
                    .extend(self.order.iter().map(|&i| particles[i as usize].pos[axis]));
            }
            ResortPolicy::Incremental => {
                self.keys.clear();
                self.keys
                    .extend(self.order.iter().map(|&i| particles[i as usize].pos[axis]));
                for k in 1..self.keys.len() {
                    let mut m = k;
                    while m > 0 && self.keys[m - 1].total_cmp(&self.keys[m]).is_gt() {
                        self.keys.swap(m - 1, m);
                        self.order.swap(m - 1, m);
                        m -= 1;
                    }
                }
            }
        }
    }

    #[inline]
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Particle indices in ascending coordinate order
    #[inline]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Coordinates in ascending order, parallel to `order()`
    #[inline]
    pub fn keys(&self) -> &[f32] {
        &self.keys
    }

    /// Positions in the ordering whose key lies in `[lo, hi]`
    pub fn range(&self, lo: f32, hi: f32) -> Range<usize> {
        let start = lower_bound(&self.keys, lo);
        let end = upper_bound(&self.keys, hi).max(start);
        start..end
    }

    /// Particle indices whose key lies in `[lo, hi]`
    pub fn window(&self, lo: f32, hi: f32) -> &[u32] {
        &self.order[self.range(lo, hi)]
    }

    pub fn is_sorted(&self) -> bool {
        self.keys.windows(2).all(|w| w[0].total_cmp(&w[1]).is_le())
    }
}

/// Sorted views over every active axis of a particle system
#[derive(Debug, Clone)]
pub struct SortedIndex {
    policy: ResortPolicy,
    axes: Vec<AxisOrder>,
}

impl SortedIndex {
    pub fn build(system: &ParticleSystem, policy: ResortPolicy) -> Self {
        let axes = (0..system.dims().count())
            .map(|axis| AxisOrder::new(axis, system))
            .collect();
        Self { policy, axes }
    }

    /// Refresh every axis after the particles moved
    pub fn resort(&mut self, system: &ParticleSystem) {
        for axis in &mut self.axes {
            axis.resort(system, self.policy);
        }
    }

    #[inline]
    pub fn policy(&self) -> ResortPolicy {
        self.policy
    }

    #[inline]
    pub fn axes(&self) -> &[AxisOrder] {
        &self.axes
    }

    /// Candidate neighbours of `pos`: the narrowest axis window around it.
    ///
    /// Includes the particle at `pos` itself when it belongs to the system.
    pub fn candidates(&self, pos: Vec3, threshold: f32) -> impl Iterator<Item = u32> + '_ {
        let window = self
            .axes
            .iter()
            .map(|a| {
                let c = pos[a.axis];
                a.window(c - threshold, c + threshold)
            })
            .min_by_key(|w| w.len())
            .unwrap_or(&[]);
        window.iter().copied()
    }
}
