//! Polygroup topology built on top of a [`TriangleMesh`].
//!
//! A polygroup partitions the triangles into logical faces. This module derives
//! the "polygon" view of that partition:
//!
//! - **Groups**: the triangles carrying one polygroup id.
//! - **Corners**: vertices where three or more groups meet. The open mesh boundary
//!   counts as one extra group, so a boundary vertex between two groups is a corner.
//! - **Group edges**: maximal chains of mesh edges separating the same pair of groups
//!   (or a group and the boundary), split at corners. A chain with no corner on it
//!   is a closed loop and has no endpoint corners.
//!
//! Corner ids and group-edge ids are dense `u32` indices into this structure; group
//! ids are the polygroup values stored on the mesh.

use std::collections::HashMap;

use crate::geometry_indices::{EdgeId, TriangleId, VertexId};
use crate::mesh::TriangleMesh;

#[derive(Debug, Clone)]
pub struct Group {
    pub id: u32,
    pub triangles: Vec<TriangleId>,
    pub group_edges: Vec<u32>,
    pub neighbor_groups: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct Corner {
    pub vertex: VertexId,
    pub neighbor_groups: Vec<u32>,
    pub group_edges: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct GroupEdge {
    /// Groups on either side; `None` for the open mesh boundary.
    pub groups: (u32, Option<u32>),
    /// Mesh edges along the chain, in walk order.
    pub edges: Vec<EdgeId>,
    /// Vertices along the chain, one more than `edges` unless the chain is closed.
    pub vertices: Vec<VertexId>,
    pub endpoint_corners: [Option<u32>; 2],
}

impl GroupEdge {
    pub fn is_closed_loop(&self) -> bool {
        self.endpoint_corners == [None, None] && self.vertices.len() == self.edges.len()
    }

    pub fn other_corner(&self, corner: u32) -> Option<u32> {
        match self.endpoint_corners {
            [Some(a), b] if a == corner => b,
            [a, Some(b)] if b == corner => a,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupTopology {
    groups: Vec<Group>,
    group_lookup: HashMap<u32, usize>,
    corners: Vec<Corner>,
    vertex_corner: HashMap<VertexId, u32>,
    edges: Vec<GroupEdge>,
    edge_lookup: HashMap<EdgeId, u32>,
    triangle_groups: Vec<u32>,
}

type EdgeKey = (u32, Option<u32>);

fn edge_key(mesh: &TriangleMesh, e: EdgeId) -> Option<EdgeKey> {
    let edge = mesh.edge(e);
    let g0 = mesh.triangle_group(edge.triangles[0]);
    if edge.is_boundary() {
        return Some((g0, None));
    }
    let g1 = mesh.triangle_group(edge.triangles[1]);
    if g0 == g1 {
        None
    } else {
        Some((g0.min(g1), Some(g0.max(g1))))
    }
}

impl GroupTopology {
    #[tracing::instrument(level = "debug", skip_all, fields(triangles = mesh.triangle_count()))]
    pub fn new(mesh: &TriangleMesh) -> Self {
        let mut topo = Self {
            triangle_groups: mesh.triangle_ids().map(|t| mesh.triangle_group(t)).collect(),
            ..Default::default()
        };
        topo.build_groups(mesh);
        topo.build_corners(mesh);
        topo.build_group_edges(mesh);
        tracing::debug!(
            groups = topo.groups.len(),
            corners = topo.corners.len(),
            group_edges = topo.edges.len(),
            "built polygroup topology"
        );
        topo
    }

    fn build_groups(&mut self, mesh: &TriangleMesh) {
        for t in mesh.triangle_ids() {
            let gid = self.triangle_groups[t.index()];
            let slot = *self.group_lookup.entry(gid).or_insert_with(|| {
                self.groups.push(Group {
                    id: gid,
                    triangles: Vec::new(),
                    group_edges: Vec::new(),
                    neighbor_groups: Vec::new(),
                });
                self.groups.len() - 1
            });
            self.groups[slot].triangles.push(t);
        }
    }

    fn build_corners(&mut self, mesh: &TriangleMesh) {
        for v in mesh.vertex_ids() {
            let mut unique: Vec<u32> = Vec::new();
            for &t in mesh.vertex_triangles(v) {
                let g = self.triangle_groups[t.index()];
                if !unique.contains(&g) {
                    unique.push(g);
                }
            }
            if unique.is_empty() {
                continue;
            }
            let boundary = usize::from(mesh.is_boundary_vertex(v));
            if unique.len() + boundary >= 3 {
                let id = self.corners.len() as u32;
                self.corners.push(Corner {
                    vertex: v,
                    neighbor_groups: unique,
                    group_edges: Vec::new(),
                });
                self.vertex_corner.insert(v, id);
            }
        }
    }

    fn build_group_edges(&mut self, mesh: &TriangleMesh) {
        let keys: Vec<Option<EdgeKey>> = mesh.edge_ids().map(|e| edge_key(mesh, e)).collect();
        let mut visited = vec![false; mesh.edge_count()];

        for start in mesh.edge_ids() {
            let Some(key) = keys[start.index()] else {
                continue;
            };
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;

            let [a, b] = mesh.edge_vertices(start);
            let mut edges = vec![start];
            let mut vertices = vec![a, b];
            let mut closed = false;

            // Walk forward from `b`, then backward from `a`.
            let mut tip = b;
            while !self.vertex_corner.contains_key(&tip) {
                let Some(next) = self.next_chain_edge(mesh, &keys, &visited, tip, key) else {
                    break;
                };
                visited[next.index()] = true;
                edges.push(next);
                let Some(other) = mesh.edge(next).other_vertex(tip) else {
                    break;
                };
                if other == vertices[0] && !self.vertex_corner.contains_key(&other) {
                    closed = true;
                    break;
                }
                vertices.push(other);
                tip = other;
            }

            if !closed {
                let mut tail = a;
                while !self.vertex_corner.contains_key(&tail) {
                    let Some(next) = self.next_chain_edge(mesh, &keys, &visited, tail, key) else {
                        break;
                    };
                    visited[next.index()] = true;
                    edges.insert(0, next);
                    let Some(other) = mesh.edge(next).other_vertex(tail) else {
                        break;
                    };
                    vertices.insert(0, other);
                    tail = other;
                }
            }

            let endpoint_corners = if closed {
                [None, None]
            } else {
                [
                    vertices.first().and_then(|v| self.vertex_corner.get(v).copied()),
                    vertices.last().and_then(|v| self.vertex_corner.get(v).copied()),
                ]
            };

            let id = self.edges.len() as u32;
            for &e in &edges {
                self.edge_lookup.insert(e, id);
            }
            for corner in endpoint_corners.into_iter().flatten() {
                let list = &mut self.corners[corner as usize].group_edges;
                if !list.contains(&id) {
                    list.push(id);
                }
            }
            self.link_groups(key, id);
            self.edges.push(GroupEdge {
                groups: key,
                edges,
                vertices,
                endpoint_corners,
            });
        }
    }

    fn next_chain_edge(
        &self,
        mesh: &TriangleMesh,
        keys: &[Option<EdgeKey>],
        visited: &[bool],
        at: VertexId,
        key: EdgeKey,
    ) -> Option<EdgeId> {
        mesh.vertex_edges(at)
            .iter()
            .copied()
            .find(|&e| !visited[e.index()] && keys[e.index()] == Some(key))
    }

    fn link_groups(&mut self, key: EdgeKey, group_edge: u32) {
        let (g0, g1) = key;
        if let Some(&slot) = self.group_lookup.get(&g0) {
            let group = &mut self.groups[slot];
            group.group_edges.push(group_edge);
            if let Some(g1) = g1 {
                if !group.neighbor_groups.contains(&g1) {
                    group.neighbor_groups.push(g1);
                }
            }
        }
        if let Some(g1) = g1 {
            if let Some(&slot) = self.group_lookup.get(&g1) {
                let group = &mut self.groups[slot];
                group.group_edges.push(group_edge);
                if !group.neighbor_groups.contains(&g0) {
                    group.neighbor_groups.push(g0);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_id(&self, t: TriangleId) -> u32 {
        self.triangle_groups[t.index()]
    }

    pub fn find_group(&self, group_id: u32) -> Option<&Group> {
        self.group_lookup.get(&group_id).map(|&slot| &self.groups[slot])
    }

    pub fn group_triangles(&self, group_id: u32) -> &[TriangleId] {
        self.find_group(group_id).map_or(&[], |g| g.triangles.as_slice())
    }

    pub fn group_neighbor_groups(&self, group_id: u32) -> &[u32] {
        self.find_group(group_id).map_or(&[], |g| g.neighbor_groups.as_slice())
    }

    pub fn group_edges_of_group(&self, group_id: u32) -> &[u32] {
        self.find_group(group_id).map_or(&[], |g| g.group_edges.as_slice())
    }

    /// Endpoint corners of every group edge bordering `group_id`.
    pub fn group_corners(&self, group_id: u32) -> Vec<u32> {
        let mut corners = Vec::new();
        for &ge in self.group_edges_of_group(group_id) {
            for c in self.edges[ge as usize].endpoint_corners.into_iter().flatten() {
                if !corners.contains(&c) {
                    corners.push(c);
                }
            }
        }
        corners
    }

    // ------------------------------------------------------------------
    // Corners
    // ------------------------------------------------------------------

    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn corner(&self, corner: u32) -> Option<&Corner> {
        self.corners.get(corner as usize)
    }

    /// Mesh vertex of `corner`, or `None` for an id this topology never issued.
    pub fn corner_vertex(&self, corner: u32) -> Option<VertexId> {
        self.corner(corner).map(|c| c.vertex)
    }

    pub fn corner_for_vertex(&self, v: VertexId) -> Option<u32> {
        self.vertex_corner.get(&v).copied()
    }

    pub fn is_corner_vertex(&self, v: VertexId) -> bool {
        self.vertex_corner.contains_key(&v)
    }

    pub fn corner_neighbor_corners(&self, corner: u32) -> Vec<u32> {
        let mut result = Vec::new();
        for &ge in self.corner_neighbor_edges(corner) {
            if let Some(other) = self.edges[ge as usize].other_corner(corner) {
                if other != corner && !result.contains(&other) {
                    result.push(other);
                }
            }
        }
        result
    }

    pub fn corner_neighbor_edges(&self, corner: u32) -> &[u32] {
        self.corner(corner).map_or(&[], |c| c.group_edges.as_slice())
    }

    pub fn corner_neighbor_groups(&self, corner: u32) -> &[u32] {
        self.corner(corner).map_or(&[], |c| c.neighbor_groups.as_slice())
    }

    // ------------------------------------------------------------------
    // Group edges
    // ------------------------------------------------------------------

    pub fn group_edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn group_edge(&self, id: u32) -> Option<&GroupEdge> {
        self.edges.get(id as usize)
    }

    pub fn find_group_edge(&self, e: EdgeId) -> Option<u32> {
        self.edge_lookup.get(&e).copied()
    }

    pub fn is_group_edge(&self, e: EdgeId) -> bool {
        self.edge_lookup.contains_key(&e)
    }

    /// Group edges sharing an endpoint corner with `id`, or `None` when `id`
    /// is not a group edge of this topology.
    pub fn edge_neighbor_edges(&self, id: u32) -> Option<Vec<u32>> {
        let mut result = Vec::new();
        for corner in self.group_edge(id)?.endpoint_corners.into_iter().flatten() {
            for &ge in self.corner_neighbor_edges(corner) {
                if ge != id && !result.contains(&ge) {
                    result.push(ge);
                }
            }
        }
        Some(result)
    }
}
