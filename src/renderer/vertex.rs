//! Vertex layouts for the point and edge passes
//!
//! Positions and velocities are always three components wide; 2D sessions
//! pad `z` with zero so one shader pair serves both.

use bytemuck::{Pod, Zeroable};

use crate::sim::{EdgeBuffer, ParticleSystem};

/// One particle, drawn as a point
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
}

impl PointVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One endpoint of an edge segment, drawn as a line list
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct EdgeVertex {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Length of the segment this vertex belongs to
    pub distance: f32,
}

impl EdgeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<EdgeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

fn widen(values: &[f32]) -> [f32; 3] {
    let mut out = [0.0; 3];
    out[..values.len()].copy_from_slice(values);
    out
}

/// Point vertices for every particle, in index order
pub fn pack_points(system: &ParticleSystem) -> Vec<PointVertex> {
    system
        .particles()
        .iter()
        .map(|p| PointVertex {
            position: p.pos.to_array(),
            velocity: p.vel.to_array(),
        })
        .collect()
}

/// Line-list vertices for every segment, two per segment
pub fn pack_edges(edges: &EdgeBuffer) -> Vec<EdgeVertex> {
    let d = edges.stride();
    edges
        .positions
        .chunks_exact(d)
        .zip(edges.velocities.chunks_exact(d))
        .zip(edges.distances.iter())
        .map(|((position, velocity), &distance)| EdgeVertex {
            position: widen(position),
            velocity: widen(velocity),
            distance,
        })
        .collect()
}
