//! Rasterizer data contract
//!
//! Pipelines, shaders and surfaces belong to the host application. This module
//! only fixes the vertex and uniform layouts the simulation's buffers are
//! packed into.

pub mod vertex;

pub use crate::sim::FrameUniforms;
pub use vertex::{EdgeVertex, PointVertex, pack_edges, pack_points};
