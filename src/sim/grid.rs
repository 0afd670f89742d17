//! Uniform grid over the simulation domain
//!
//! Cells are at least `threshold` wide, so every particle within the threshold
//! of a point sits in that point's cell or one of its immediate neighbours
//! (3x3 in 2D, 3x3x3 in 3D). Particles are bucketed with a counting sort into
//! one flat entry array, rebuilt every tick.

use glam::Vec3;

use super::particle::ParticleSystem;
use crate::consts::{DOMAIN_MAX, DOMAIN_MIN};

/// Upper bound on total cell count, keeps tiny thresholds from exploding memory
pub const MAX_CELLS: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct UniformGrid {
    dims: usize,
    cells_per_axis: usize,
    cell_len: f32,
    /// `cell_start[c]..cell_start[c + 1]` indexes `entries` for cell `c`
    cell_start: Vec<u32>,
    entries: Vec<u32>,
    cell_of: Vec<u32>,
}

impl UniformGrid {
    /// Bucket the system into cells no narrower than `min_cell_len`
    pub fn build(system: &ParticleSystem, min_cell_len: f32) -> Self {
        let dims = system.dims().count();
        let extent = DOMAIN_MAX - DOMAIN_MIN;
        let max_per_axis = (MAX_CELLS as f64).powf(1.0 / dims as f64).floor() as usize;
        let mut cells_per_axis = ((extent / min_cell_len).floor() as usize).clamp(1, max_per_axis);
        // Rounding in the division can leave cells a hair narrower than asked
        while cells_per_axis > 1 && extent / (cells_per_axis as f32) < min_cell_len {
            cells_per_axis -= 1;
        }
        let total = cells_per_axis.pow(dims as u32);

        let mut grid = Self {
            dims,
            cells_per_axis,
            cell_len: extent / cells_per_axis as f32,
            cell_start: vec![0; total + 1],
            entries: vec![0; system.len()],
            cell_of: vec![0; system.len()],
        };
        grid.rebuild(system);
        grid
    }

    /// Re-bucket every particle from its current position
    pub fn rebuild(&mut self, system: &ParticleSystem) {
        self.cell_start.fill(0);
        for (i, p) in system.particles().iter().enumerate() {
            let cell = self.flat(self.cell_coords(p.pos));
            self.cell_of[i] = cell as u32;
            self.cell_start[cell + 1] += 1;
        }
        for c in 1..self.cell_start.len() {
            self.cell_start[c] += self.cell_start[c - 1];
        }
        // Fill back to front so each bucket keeps ascending particle order
        let mut cursor = self.cell_start.clone();
        for i in (0..self.cell_of.len()).rev() {
            let cell = self.cell_of[i] as usize;
            cursor[cell + 1] -= 1;
            self.entries[cursor[cell + 1] as usize] = i as u32;
        }
    }

    #[inline]
    pub fn cells_per_axis(&self) -> usize {
        self.cells_per_axis
    }

    #[inline]
    pub fn cell_len(&self) -> f32 {
        self.cell_len
    }

    /// Grid coordinates of a position, clamped to the grid
    pub fn cell_coords(&self, pos: Vec3) -> [usize; 3] {
        let mut coords = [0usize; 3];
        let last = self.cells_per_axis as isize - 1;
        for (axis, c) in coords.iter_mut().enumerate().take(self.dims) {
            let raw = ((pos[axis] - DOMAIN_MIN) / self.cell_len).floor() as isize;
            *c = raw.clamp(0, last) as usize;
        }
        coords
    }

    #[inline]
    fn flat(&self, coords: [usize; 3]) -> usize {
        let n = self.cells_per_axis;
        coords[0] + n * (coords[1] + n * coords[2])
    }

    /// Particle indices bucketed in one cell
    pub fn cell(&self, coords: [usize; 3]) -> &[u32] {
        let c = self.flat(coords);
        &self.entries[self.cell_start[c] as usize..self.cell_start[c + 1] as usize]
    }

    /// Visit every particle in the cell containing `pos` and its neighbours
    pub fn for_each_neighbor<F>(&self, pos: Vec3, mut f: F)
    where
        F: FnMut(u32),
    {
        let center = self.cell_coords(pos);
        let span = |axis: usize| {
            if axis < self.dims {
                let c = center[axis];
                c.saturating_sub(1)..=(c + 1).min(self.cells_per_axis - 1)
            } else {
                0..=0
            }
        };
        for z in span(2) {
            for y in span(1) {
                for x in span(0) {
                    for &j in self.cell([x, y, z]) {
                        f(j);
                    }
                }
            }
        }
    }
}
