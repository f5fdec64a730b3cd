//! Compact triangle mesh with full edge/vertex/triangle adjacency.
//!
//! The mesh is immutable after construction apart from its per-triangle
//! layers (polygroups and material ids). Edges are built once by matching
//! triangle sides on their shared vertices; an edge that would get a third
//! triangle is split off as a separate boundary edge so that every edge has
//! at most two incident triangles.

use glam::DVec3;

use crate::error::{MeshError, Result};
use crate::geometry_indices::{EdgeId, TriEdge, TriangleId, VertexId, INVALID_TRIANGLE};

/// A unique mesh edge. `triangles[1]` is [`INVALID_TRIANGLE`] on the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [VertexId; 2],
    pub triangles: [TriangleId; 2],
}

impl Edge {
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.triangles[1].is_valid()
    }

    /// Returns the vertex on the other end from `v`, if `v` is on this edge.
    pub fn other_vertex(&self, v: VertexId) -> Option<VertexId> {
        if self.vertices[0] == v {
            Some(self.vertices[1])
        } else if self.vertices[1] == v {
            Some(self.vertices[0])
        } else {
            None
        }
    }

    /// Returns the triangle across this edge from `t`.
    pub fn other_triangle(&self, t: TriangleId) -> Option<TriangleId> {
        if self.triangles[0] == t && self.triangles[1].is_valid() {
            Some(self.triangles[1])
        } else if self.triangles[1] == t {
            Some(self.triangles[0])
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TriangleMesh {
    positions: Vec<DVec3>,
    triangles: Vec<[VertexId; 3]>,
    triangle_edges: Vec<[EdgeId; 3]>,
    edges: Vec<Edge>,
    vertex_edges: Vec<Vec<EdgeId>>,
    vertex_triangles: Vec<Vec<TriangleId>>,
    groups: Option<Vec<u32>>,
    materials: Option<Vec<u32>>,
}

impl TriangleMesh {
    /// Builds a mesh and its adjacency from positions and triangle vertex triples.
    pub fn new(positions: Vec<DVec3>, triangles: &[[u32; 3]]) -> Result<Self> {
        let vertex_count = positions.len();
        let mut mesh = Self {
            positions,
            triangles: Vec::with_capacity(triangles.len()),
            triangle_edges: Vec::with_capacity(triangles.len()),
            edges: Vec::new(),
            vertex_edges: vec![Vec::new(); vertex_count],
            vertex_triangles: vec![Vec::new(); vertex_count],
            groups: None,
            materials: None,
        };

        for (ti, tri) in triangles.iter().enumerate() {
            for &v in tri {
                if v as usize >= vertex_count {
                    return Err(MeshError::VertexOutOfRange {
                        triangle: ti,
                        vertex: v,
                        vertex_count,
                    });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                return Err(MeshError::DegenerateTriangle(ti));
            }
            mesh.triangles.push([VertexId(tri[0]), VertexId(tri[1]), VertexId(tri[2])]);
        }

        mesh.compute_edges();
        Ok(mesh)
    }

    /// Attaches a polygroup id to every triangle.
    pub fn with_polygroups(mut self, groups: Vec<u32>) -> Result<Self> {
        self.check_layer("polygroups", groups.len())?;
        self.groups = Some(groups);
        Ok(self)
    }

    /// Attaches a material id to every triangle.
    pub fn with_material_ids(mut self, materials: Vec<u32>) -> Result<Self> {
        self.check_layer("materials", materials.len())?;
        self.materials = Some(materials);
        Ok(self)
    }

    fn check_layer(&self, layer: &'static str, len: usize) -> Result<()> {
        if len != self.triangles.len() {
            return Err(MeshError::LayerSizeMismatch {
                layer,
                len,
                expected: self.triangles.len(),
            });
        }
        Ok(())
    }

    // Matches each triangle side (a, b) against the edges already registered
    // on vertex `a`. The first edge with a free second slot wins; otherwise a
    // new edge is created, which also splits non-manifold fans.
    fn compute_edges(&mut self) {
        for ti in 0..self.triangles.len() {
            let tid = TriangleId(ti as u32);
            let tri = self.triangles[ti];
            let mut tri_edges = [EdgeId(0); 3];
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                let existing = self.vertex_edges[a.index()].iter().copied().find(|&e| {
                    let edge = &self.edges[e.index()];
                    edge.other_vertex(a) == Some(b) && !edge.triangles[1].is_valid()
                });
                tri_edges[k] = match existing {
                    Some(e) => {
                        self.edges[e.index()].triangles[1] = tid;
                        e
                    }
                    None => {
                        let e = EdgeId(self.edges.len() as u32);
                        self.edges.push(Edge {
                            vertices: [a, b],
                            triangles: [tid, INVALID_TRIANGLE],
                        });
                        self.vertex_edges[a.index()].push(e);
                        self.vertex_edges[b.index()].push(e);
                        e
                    }
                };
                self.vertex_triangles[a.index()].push(tid);
            }
            self.triangle_edges.push(tri_edges);
        }
    }

    // ------------------------------------------------------------------
    // Counts and existence
    // ------------------------------------------------------------------

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_vertex(&self, v: VertexId) -> bool {
        v.index() < self.positions.len()
    }

    pub fn is_triangle(&self, t: TriangleId) -> bool {
        t.index() < self.triangles.len()
    }

    pub fn is_edge(&self, e: EdgeId) -> bool {
        e.index() < self.edges.len()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.positions.len() as u32).map(VertexId)
    }

    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> {
        (0..self.triangles.len() as u32).map(TriangleId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    pub fn vertex(&self, v: VertexId) -> DVec3 {
        self.positions[v.index()]
    }

    pub fn triangle(&self, t: TriangleId) -> [VertexId; 3] {
        self.triangles[t.index()]
    }

    pub fn triangle_edges(&self, t: TriangleId) -> [EdgeId; 3] {
        self.triangle_edges[t.index()]
    }

    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e.index()]
    }

    pub fn edge_vertices(&self, e: EdgeId) -> [VertexId; 2] {
        self.edges[e.index()].vertices
    }

    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        self.edges[e.index()].is_boundary()
    }

    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertex_edges[v.index()]
            .iter()
            .any(|&e| self.edges[e.index()].is_boundary())
    }

    pub fn vertex_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertex_edges[v.index()]
    }

    pub fn vertex_triangles(&self, v: VertexId) -> &[TriangleId] {
        &self.vertex_triangles[v.index()]
    }

    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_edges[v.index()]
            .iter()
            .filter_map(move |&e| self.edges[e.index()].other_vertex(v))
    }

    pub fn triangle_neighbors(&self, t: TriangleId) -> [Option<TriangleId>; 3] {
        let tri_edges = self.triangle_edges[t.index()];
        tri_edges.map(|e| self.edges[e.index()].other_triangle(t))
    }

    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        if !self.is_vertex(a) {
            return None;
        }
        self.vertex_edges[a.index()]
            .iter()
            .copied()
            .find(|&e| self.edges[e.index()].other_vertex(a) == Some(b))
    }

    // ------------------------------------------------------------------
    // Half-edge helpers
    // ------------------------------------------------------------------

    /// Resolves a triangle side to its unique mesh edge.
    pub fn edge_from_tri_edge(&self, te: TriEdge) -> Option<EdgeId> {
        if !self.is_triangle(te.triangle) || te.local > 2 {
            return None;
        }
        Some(self.triangle_edges[te.triangle.index()][te.local as usize])
    }

    /// Returns the triangle side of `e` within its first triangle.
    pub fn tri_edge_from_edge(&self, e: EdgeId) -> TriEdge {
        let t = self.edges[e.index()].triangles[0];
        self.local_tri_edge(t, e)
    }

    /// Every triangle side that refers to `e` (one on the boundary, two otherwise).
    pub fn tri_edges_of_edge(&self, e: EdgeId) -> impl Iterator<Item = TriEdge> + '_ {
        self.edges[e.index()]
            .triangles
            .into_iter()
            .filter(|t| t.is_valid())
            .map(move |t| self.local_tri_edge(t, e))
    }

    fn local_tri_edge(&self, t: TriangleId, e: EdgeId) -> TriEdge {
        let tri_edges = self.triangle_edges[t.index()];
        let local = tri_edges.iter().position(|&x| x == e).unwrap_or(0);
        TriEdge::new(t, local as u8)
    }

    // ------------------------------------------------------------------
    // Per-triangle layers
    // ------------------------------------------------------------------

    pub fn has_polygroups(&self) -> bool {
        self.groups.is_some()
    }

    /// Polygroup id of `t`; meshes without a polygroup layer report group 0.
    pub fn triangle_group(&self, t: TriangleId) -> u32 {
        self.groups.as_ref().map_or(0, |g| g[t.index()])
    }

    pub fn set_triangle_group(&mut self, t: TriangleId, group: u32) {
        let count = self.triangles.len();
        let groups = self.groups.get_or_insert_with(|| vec![0; count]);
        groups[t.index()] = group;
    }

    pub fn has_material_ids(&self) -> bool {
        self.materials.is_some()
    }

    pub fn triangle_material(&self, t: TriangleId) -> u32 {
        self.materials.as_ref().map_or(0, |m| m[t.index()])
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn triangle_positions(&self, t: TriangleId) -> [DVec3; 3] {
        self.triangles[t.index()].map(|v| self.positions[v.index()])
    }

    /// Unit normal following counter-clockwise winding. Degenerate triangles yield zero.
    pub fn triangle_normal(&self, t: TriangleId) -> DVec3 {
        let [a, b, c] = self.triangle_positions(t);
        (b - a).cross(c - a).normalize_or_zero()
    }

    pub fn triangle_area(&self, t: TriangleId) -> f64 {
        let [a, b, c] = self.triangle_positions(t);
        0.5 * (b - a).cross(c - a).length()
    }

    pub fn triangle_centroid(&self, t: TriangleId) -> DVec3 {
        let [a, b, c] = self.triangle_positions(t);
        (a + b + c) / 3.0
    }

    /// Area-weighted average of the incident triangle normals.
    pub fn vertex_normal(&self, v: VertexId) -> DVec3 {
        let mut sum = DVec3::ZERO;
        for &t in &self.vertex_triangles[v.index()] {
            let [a, b, c] = self.triangle_positions(t);
            sum += (b - a).cross(c - a);
        }
        sum.normalize_or_zero()
    }

    pub fn edge_normal(&self, e: EdgeId) -> DVec3 {
        let edge = &self.edges[e.index()];
        let mut sum = self.triangle_normal(edge.triangles[0]);
        if edge.triangles[1].is_valid() {
            sum += self.triangle_normal(edge.triangles[1]);
        }
        sum.normalize_or_zero()
    }

    pub fn edge_midpoint(&self, e: EdgeId) -> DVec3 {
        let [a, b] = self.edges[e.index()].vertices;
        (self.positions[a.index()] + self.positions[b.index()]) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        let positions = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        TriangleMesh::new(positions, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_quad_adjacency() {
        let mesh = quad();
        assert_eq!(mesh.edge_count(), 5);
        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        assert!(!mesh.is_boundary_edge(diagonal));
        assert_eq!(mesh.tri_edges_of_edge(diagonal).count(), 2);
        assert_eq!(
            mesh.triangle_neighbors(TriangleId(0)),
            [None, None, Some(TriangleId(1))]
        );
        assert!(mesh.is_boundary_vertex(VertexId(1)));
    }

    #[test]
    fn test_tri_edge_resolution() {
        let mesh = quad();
        for e in mesh.edge_ids() {
            let te = mesh.tri_edge_from_edge(e);
            assert_eq!(mesh.edge_from_tri_edge(te), Some(e));
        }
        assert_eq!(mesh.edge_from_tri_edge(TriEdge::new(TriangleId(9), 0)), None);
    }

    #[test]
    fn test_rejects_bad_triangles() {
        let positions = vec![DVec3::ZERO; 3];
        assert!(matches!(
            TriangleMesh::new(positions.clone(), &[[0, 1, 5]]),
            Err(MeshError::VertexOutOfRange { vertex: 5, .. })
        ));
        assert_eq!(
            TriangleMesh::new(positions, &[[0, 1, 1]]).unwrap_err(),
            MeshError::DegenerateTriangle(0)
        );
    }

    #[test]
    fn test_non_manifold_edge_is_split() {
        let positions = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, -1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ];
        let mesh = TriangleMesh::new(positions, &[[0, 1, 2], [1, 0, 3], [0, 1, 4]]).unwrap();
        for e in mesh.edge_ids() {
            assert!(mesh.edge(e).triangles[0].is_valid());
        }
        // Two edges now join vertices 0 and 1.
        let count = mesh
            .edge_ids()
            .filter(|&e| mesh.edge(e).other_vertex(VertexId(0)) == Some(VertexId(1)))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_layers() {
        let mesh = quad().with_polygroups(vec![3, 4]).unwrap();
        assert_eq!(mesh.triangle_group(TriangleId(1)), 4);
        assert!(quad().with_material_ids(vec![1]).is_err());
        assert!((mesh.triangle_area(TriangleId(0)) - 0.5).abs() < 1e-12);
        assert!((mesh.vertex_normal(VertexId(0)) - DVec3::Z).length() < 1e-12);
    }
}
