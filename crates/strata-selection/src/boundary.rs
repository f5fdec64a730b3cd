//! Selection borders and the elements adjacent to them.
//!
//! A vertex on the open mesh boundary is always part of the selection border,
//! whatever the selected element kind.

use std::collections::BTreeSet;

use strata_core::{EdgeId, GroupTopology, TriangleId, TriangleMesh, VertexId};

use crate::enumerate::{
    corner_selection_id, enumerate_selection_edges, enumerate_selection_triangles, group_edge_selection_id,
    group_face_selection_id, require_topology, selected_vertex,
};
use crate::error::Result;
use crate::selection::{ElementType, GeometrySelection, SelectionId, TopologyType};

/// Vertices covered by a selection, and the subset lying on its border.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryVertices {
    pub border: BTreeSet<VertexId>,
    pub current: BTreeSet<VertexId>,
}

/// Corner ids covered by a polygroup selection, and the subset on its border.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryCorners {
    pub border: BTreeSet<u32>,
    pub current: BTreeSet<u32>,
}

/// Border vertices of `reference`.
///
/// A covered vertex is on the border when it is a mesh boundary vertex or when
/// one of its neighbours of the selected kind (vertex, edge or triangle) is not
/// covered.
pub fn selection_boundary_vertices(mesh: &TriangleMesh, reference: &GeometrySelection) -> Result<BoundaryVertices> {
    let mut out = BoundaryVertices::default();
    match reference.element_type {
        ElementType::Vertex => {
            out.current
                .extend(reference.iter().filter_map(|id| selected_vertex(mesh, id)));
            for &v in &out.current {
                if mesh.is_boundary_vertex(v) || mesh.vertex_neighbors(v).any(|n| !out.current.contains(&n)) {
                    out.border.insert(v);
                }
            }
        }
        ElementType::Edge => {
            let mut edges: BTreeSet<EdgeId> = BTreeSet::new();
            enumerate_selection_edges(reference, mesh, |e| {
                edges.insert(e);
            })?;
            for &e in &edges {
                out.current.extend(mesh.edge_vertices(e));
            }
            for &v in &out.current {
                if mesh.is_boundary_vertex(v) || mesh.vertex_edges(v).iter().any(|e| !edges.contains(e)) {
                    out.border.insert(v);
                }
            }
        }
        ElementType::Face => {
            let mut triangles: BTreeSet<TriangleId> = BTreeSet::new();
            enumerate_selection_triangles(reference, mesh, |t| {
                triangles.insert(t);
            })?;
            for &t in &triangles {
                out.current.extend(mesh.triangle(t));
            }
            for &v in &out.current {
                if mesh.is_boundary_vertex(v) || mesh.vertex_triangles(v).iter().any(|t| !triangles.contains(t)) {
                    out.border.insert(v);
                }
            }
        }
    }
    Ok(out)
}

/// Border corners of a polygroup selection.
///
/// Vertex selections cover their corners; edge selections the endpoint corners
/// of their group edges; face selections the corners around their groups. A
/// covered corner is on the border when it sits on the mesh boundary or has an
/// unselected neighbour of the selected kind.
pub fn selection_boundary_corners(
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    reference: &GeometrySelection,
) -> Result<BoundaryCorners> {
    reference.expect_topology(TopologyType::Polygroup)?;
    let corner_count = topology.corner_count() as u32;
    let mut out = BoundaryCorners::default();
    let on_mesh_boundary = |c: u32| topology.corner_vertex(c).is_some_and(|v| mesh.is_boundary_vertex(v));

    match reference.element_type {
        ElementType::Vertex => {
            out.current
                .extend(reference.iter().map(SelectionId::topology).filter(|&c| c < corner_count));
            for &c in &out.current {
                if on_mesh_boundary(c)
                    || topology
                        .corner_neighbor_corners(c)
                        .iter()
                        .any(|n| !out.current.contains(n))
                {
                    out.border.insert(c);
                }
            }
        }
        ElementType::Edge => {
            let edge_count = topology.group_edge_count() as u32;
            let group_edges: BTreeSet<u32> = reference
                .iter()
                .map(SelectionId::topology)
                .filter(|&ge| ge < edge_count)
                .collect();
            for &ge in &group_edges {
                if let Some(span) = topology.group_edge(ge) {
                    out.current.extend(span.endpoint_corners.into_iter().flatten());
                }
            }
            for &c in &out.current {
                if on_mesh_boundary(c)
                    || topology
                        .corner_neighbor_edges(c)
                        .iter()
                        .any(|ge| !group_edges.contains(ge))
                {
                    out.border.insert(c);
                }
            }
        }
        ElementType::Face => {
            let groups: BTreeSet<u32> = reference.iter().map(SelectionId::topology).collect();
            for &g in &groups {
                out.current.extend(topology.group_corners(g));
            }
            for &c in &out.current {
                if on_mesh_boundary(c)
                    || topology
                        .corner_neighbor_groups(c)
                        .iter()
                        .any(|g| !groups.contains(g))
                {
                    out.border.insert(c);
                }
            }
        }
    }
    Ok(out)
}

/// Adds to `out` the elements of its kind that touch the border of `reference`
/// and pass `predicate`.
///
/// For vertices the border itself is included, along with neighbours outside
/// the covered set. Edges and faces are the ones incident to a border vertex
/// (or corner). Triangle edges are added as both sides and only when both
/// sides pass.
pub fn make_boundary_connected_selection<P>(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    reference: &GeometrySelection,
    mut predicate: P,
    out: &mut GeometrySelection,
) -> Result<()>
where
    P: FnMut(SelectionId) -> bool,
{
    match out.topology_type {
        TopologyType::Triangle => {
            let boundary = selection_boundary_vertices(mesh, reference)?;
            match out.element_type {
                ElementType::Vertex => {
                    let mut adjacent = boundary.border.clone();
                    for &v in &boundary.border {
                        adjacent.extend(mesh.vertex_neighbors(v).filter(|n| !boundary.current.contains(n)));
                    }
                    for v in adjacent {
                        let id = SelectionId::Raw(v.0);
                        if predicate(id) {
                            out.insert(id);
                        }
                    }
                }
                ElementType::Edge => {
                    let adjacent: BTreeSet<EdgeId> = boundary
                        .border
                        .iter()
                        .flat_map(|&v| mesh.vertex_edges(v).iter().copied())
                        .collect();
                    for e in adjacent {
                        if mesh.tri_edges_of_edge(e).map(SelectionId::tri_edge).all(&mut predicate) {
                            out.extend(mesh.tri_edges_of_edge(e).map(SelectionId::tri_edge));
                        }
                    }
                }
                ElementType::Face => {
                    let adjacent: BTreeSet<TriangleId> = boundary
                        .border
                        .iter()
                        .flat_map(|&v| mesh.vertex_triangles(v).iter().copied())
                        .collect();
                    for t in adjacent {
                        let id = SelectionId::Raw(t.0);
                        if predicate(id) {
                            out.insert(id);
                        }
                    }
                }
            }
        }
        TopologyType::Polygroup => {
            let topology = require_topology(topology, "boundary-connected polygroup selection")?;
            let boundary = selection_boundary_corners(mesh, topology, reference)?;
            match out.element_type {
                ElementType::Vertex => {
                    let mut adjacent = boundary.border.clone();
                    for &c in &boundary.border {
                        adjacent.extend(
                            topology
                                .corner_neighbor_corners(c)
                                .into_iter()
                                .filter(|n| !boundary.current.contains(n)),
                        );
                    }
                    for id in adjacent.into_iter().filter_map(|c| corner_selection_id(topology, c)) {
                        if predicate(id) {
                            out.insert(id);
                        }
                    }
                }
                ElementType::Edge => {
                    let adjacent: BTreeSet<u32> = boundary
                        .border
                        .iter()
                        .flat_map(|&c| topology.corner_neighbor_edges(c).iter().copied())
                        .collect();
                    for ge in adjacent {
                        if let Some(id) = group_edge_selection_id(mesh, topology, ge) {
                            if predicate(id) {
                                out.insert(id);
                            }
                        }
                    }
                }
                ElementType::Face => {
                    let adjacent: BTreeSet<u32> = boundary
                        .border
                        .iter()
                        .flat_map(|&c| topology.corner_neighbor_groups(c).iter().copied())
                        .collect();
                    for g in adjacent {
                        if let Some(id) = group_face_selection_id(topology, g) {
                            if predicate(id) {
                                out.insert(id);
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectionError;
    use strata_core::DVec3;

    /// `n` x `n` quads in the XY plane, one polygroup per quad.
    fn grid(n: u32) -> TriangleMesh {
        let mut positions = Vec::new();
        for y in 0..=n {
            for x in 0..=n {
                positions.push(DVec3::new(x as f64, y as f64, 0.0));
            }
        }
        let mut tris = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let i = y * (n + 1) + x;
                tris.push([i, i + 1, i + n + 2]);
                tris.push([i, i + n + 2, i + n + 1]);
            }
        }
        let groups = (0..n * n).flat_map(|q| [q, q]).collect();
        TriangleMesh::new(positions, &tris).unwrap().with_polygroups(groups).unwrap()
    }

    fn vertices(ids: &[u32]) -> BTreeSet<VertexId> {
        ids.iter().map(|&v| VertexId(v)).collect()
    }

    #[test]
    fn test_center_quad_border() {
        let mesh = grid(3);
        let sel = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Triangle,
            [SelectionId::Raw(8), SelectionId::Raw(9)],
        );
        let boundary = selection_boundary_vertices(&mesh, &sel).unwrap();
        assert_eq!(boundary.current, vertices(&[5, 6, 9, 10]));
        assert_eq!(boundary.border, boundary.current);
    }

    #[test]
    fn test_interior_vertex_is_not_border() {
        let mesh = grid(2);
        let all = GeometrySelection::with_ids(
            ElementType::Vertex,
            TopologyType::Triangle,
            mesh.vertex_ids().map(|v| SelectionId::Raw(v.0)),
        );
        let boundary = selection_boundary_vertices(&mesh, &all).unwrap();
        assert_eq!(boundary.current.len(), 9);
        assert!(!boundary.border.contains(&VertexId(4)));
        assert_eq!(boundary.border.len(), 8, "every mesh boundary vertex stays on the border");
    }

    #[test]
    fn test_boundary_connected_faces() {
        let mesh = grid(3);
        let sel = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Triangle,
            [SelectionId::Raw(8), SelectionId::Raw(9)],
        );
        let mut out = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        make_boundary_connected_selection(&mesh, None, &sel, |_| true, &mut out).unwrap();
        // triangles (2,3,7) and (8,13,12) do not touch the centre quad
        assert_eq!(out.len(), 16);
        assert!(!out.contains(SelectionId::Raw(4)));
        assert!(!out.contains(SelectionId::Raw(13)));
    }

    #[test]
    fn test_boundary_connected_vertices_skip_interior() {
        let mesh = grid(3);
        let sel = GeometrySelection::with_ids(ElementType::Vertex, TopologyType::Triangle, [SelectionId::Raw(5)]);
        let mut out = GeometrySelection::new(ElementType::Vertex, TopologyType::Triangle);
        make_boundary_connected_selection(&mesh, None, &sel, |id| id != SelectionId::Raw(0), &mut out).unwrap();
        let expected: Vec<SelectionId> = [1, 4, 5, 6, 9, 10].map(SelectionId::Raw).into();
        assert_eq!(out.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_center_group_border_corners() {
        let mesh = grid(3);
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(8, 4)]);
        let corners = selection_boundary_corners(&mesh, &topo, &sel).unwrap();
        let corner_vertices: BTreeSet<VertexId> = corners.border.iter().filter_map(|&c| topo.corner_vertex(c)).collect();
        assert_eq!(corner_vertices, vertices(&[5, 6, 9, 10]));

        let mut groups = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
        make_boundary_connected_selection(&mesh, Some(&topo), &sel, |_| true, &mut groups).unwrap();
        assert_eq!(groups.len(), 9);
    }

    #[test]
    fn test_corners_require_polygroup_selection() {
        let mesh = grid(1);
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::new(ElementType::Vertex, TopologyType::Triangle);
        assert!(matches!(
            selection_boundary_corners(&mesh, &topo, &sel),
            Err(SelectionError::TopologyTypeMismatch { .. })
        ));
    }
}
