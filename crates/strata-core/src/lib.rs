//! Strata Core Library
//!
//! Mesh-side building blocks shared by the selection engine and the tools:
//!
//! - [`TriangleMesh`]: compact triangle mesh with edge, vertex and triangle adjacency
//!   plus optional per-triangle polygroup and material layers.
//! - [`GroupTopology`]: the polygon-level view (groups, corners, group edges) of a
//!   polygroup layer.
//! - [`connected`]: breadth-first growth over adjacency with a caller predicate.
//! - [`spatial`]: triangle BVH for nearest-hit ray queries.

#![allow(clippy::needless_range_loop)]

pub mod connected;
pub mod error;
pub mod geometry_indices;
pub mod group_topology;
pub mod mesh;
pub mod spatial;

pub use error::{MeshError, Result};
pub use geometry_indices::{
    EdgeId, TriEdge, TriangleId, VertexId, INVALID_EDGE, INVALID_TRIANGLE, INVALID_VERTEX,
};
pub use group_topology::{Corner, Group, GroupEdge, GroupTopology};
pub use mesh::{Edge, TriangleMesh};
pub use spatial::{Aabb, MeshAabbTree, Ray, RayHit};

pub use glam::DVec3;
