//! Conversion between the six selection kinds and to/from plain index arrays.
//!
//! The six kinds are {Triangle, Polygroup} x {Vertex, Edge, Face}. Converting a
//! kind to itself copies the ids. Every other pair dispatches on the target
//! kind; the source is read through the enumeration functions.

use std::collections::{BTreeSet, HashSet};

use glam::DVec3;
use strata_core::{EdgeId, GroupTopology, TriEdge, TriangleId, TriangleMesh, VertexId};

use crate::enumerate::{
    connected_group_triangles, enumerate_polygroup_selection_edges_with_topology,
    enumerate_polygroup_selection_vertices, enumerate_selection_triangles, enumerate_triangle_selection_edges,
    enumerate_triangle_selection_vertices, group_edge_selection_id, require_topology, selected_edge,
};
use crate::error::Result;
use crate::selection::{ElementType, GeometrySelection, SelectionId, TopologyType};

/// How partially covered target elements are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionPolicy {
    /// Any touched target element is selected.
    Expand,
    /// Only target elements fully covered by the source are selected, where the
    /// source kind makes that distinction (triangle vertices and edges).
    #[default]
    Contain,
}

/// Converts `from` into the kind of `to`, adding the converted ids to `to`.
///
/// Returns `Ok(false)` when a conversion to polygroup vertices or edges found
/// nothing to convert (no corner or group edge was touched). Polygroup sources
/// and targets need `topology`.
#[tracing::instrument(level = "trace", skip_all, fields(
    from = ?(from.topology_type, from.element_type),
    to = ?(to.topology_type, to.element_type),
    ?policy,
))]
pub fn convert_selection(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
    policy: ConversionPolicy,
) -> Result<bool> {
    if from.is_same_type(to) {
        to.extend(from.iter());
        return Ok(true);
    }
    match (to.topology_type, to.element_type) {
        (TopologyType::Triangle, ElementType::Vertex) => to_triangle_vertices(mesh, topology, from, to),
        (TopologyType::Triangle, ElementType::Edge) => to_triangle_edges(mesh, topology, from, to, policy),
        (TopologyType::Triangle, ElementType::Face) => to_triangle_faces(mesh, from, to, policy),
        (TopologyType::Polygroup, ElementType::Vertex) => to_polygroup_vertices(mesh, topology, from, to),
        (TopologyType::Polygroup, ElementType::Edge) => to_polygroup_edges(mesh, topology, from, to),
        (TopologyType::Polygroup, ElementType::Face) => to_polygroup_faces(mesh, from, to),
    }
}

fn to_triangle_vertices(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
) -> Result<bool> {
    let mut add = |v: VertexId, _: DVec3| {
        to.insert(SelectionId::Raw(v.0));
    };
    match from.topology_type {
        TopologyType::Triangle => enumerate_triangle_selection_vertices(from, mesh, None, &mut add)?,
        TopologyType::Polygroup => {
            let topology = require_topology(topology, "polygroup to vertex conversion")?;
            enumerate_polygroup_selection_vertices(from, mesh, topology, None, &mut add)?
        }
    }
    Ok(true)
}

fn insert_both_sides(mesh: &TriangleMesh, to: &mut GeometrySelection, e: EdgeId) {
    for te in mesh.tri_edges_of_edge(e) {
        to.insert(SelectionId::tri_edge(te));
    }
}

fn to_triangle_edges(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
    policy: ConversionPolicy,
) -> Result<bool> {
    match from.topology_type {
        TopologyType::Triangle
            if policy == ConversionPolicy::Contain && from.element_type == ElementType::Vertex =>
        {
            // Keep only edges with both endpoints selected.
            let selected: HashSet<u32> = from.iter().map(SelectionId::geometry).collect();
            let mut candidates: Vec<EdgeId> = Vec::new();
            enumerate_triangle_selection_edges(from, mesh, |e| candidates.push(e))?;
            for e in candidates {
                let [a, b] = mesh.edge_vertices(e);
                if selected.contains(&a.0) && selected.contains(&b.0) {
                    insert_both_sides(mesh, to, e);
                }
            }
        }
        TopologyType::Triangle => {
            enumerate_triangle_selection_edges(from, mesh, |e| insert_both_sides(mesh, to, e))?;
        }
        TopologyType::Polygroup => {
            let topology = require_topology(topology, "polygroup to edge conversion")?;
            enumerate_polygroup_selection_edges_with_topology(from, mesh, topology, |e| {
                insert_both_sides(mesh, to, e)
            })?;
        }
    }
    Ok(true)
}

fn to_triangle_faces(
    mesh: &TriangleMesh,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
    policy: ConversionPolicy,
) -> Result<bool> {
    let contain = policy == ConversionPolicy::Contain
        && from.topology_type == TopologyType::Triangle
        && from.element_type != ElementType::Face;
    if !contain {
        enumerate_selection_triangles(from, mesh, |t| {
            to.insert(SelectionId::Raw(t.0));
        })?;
        return Ok(true);
    }

    let mut candidates: Vec<TriangleId> = Vec::new();
    enumerate_selection_triangles(from, mesh, |t| candidates.push(t))?;
    match from.element_type {
        ElementType::Edge => {
            let selected: HashSet<EdgeId> = from.iter().filter_map(|id| selected_edge(mesh, id)).collect();
            for t in candidates {
                if mesh.triangle_edges(t).iter().all(|e| selected.contains(e)) {
                    to.insert(SelectionId::Raw(t.0));
                }
            }
        }
        ElementType::Vertex => {
            let selected: HashSet<u32> = from.iter().map(SelectionId::geometry).collect();
            for t in candidates {
                if mesh.triangle(t).iter().all(|v| selected.contains(&v.0)) {
                    to.insert(SelectionId::Raw(t.0));
                }
            }
        }
        ElementType::Face => {}
    }
    Ok(true)
}

/// One entry per group touched by the source, seeded at the first triangle
/// reached in that group.
fn to_polygroup_faces(mesh: &TriangleMesh, from: &GeometrySelection, to: &mut GeometrySelection) -> Result<bool> {
    let mut touched: Vec<TriangleId> = Vec::new();
    enumerate_selection_triangles(from, mesh, |t| touched.push(t))?;

    let mut covered: HashSet<TriangleId> = HashSet::new();
    for t in touched {
        if covered.contains(&t) {
            continue;
        }
        covered.extend(connected_group_triangles(mesh, t));
        let id = SelectionId::grouped(t.0, mesh.triangle_group(t));
        if !to.contains(id) {
            to.insert(id);
        }
    }
    Ok(true)
}

/// Mesh edges resolve to their group edge; edges inside a group are dropped.
/// Reports whether any touched edge lies on a group border or the mesh boundary.
fn to_polygroup_edges(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
) -> Result<bool> {
    let topology = require_topology(topology, "conversion to polygroup edges")?;
    let mut converted = false;
    let mut add = |e: EdgeId| {
        if let Some(ge) = topology.find_group_edge(e) {
            converted = true;
            if let Some(id) = group_edge_selection_id(mesh, topology, ge) {
                if !to.contains(id) {
                    to.insert(id);
                }
            }
        }
    };
    match from.topology_type {
        TopologyType::Triangle => enumerate_triangle_selection_edges(from, mesh, &mut add)?,
        TopologyType::Polygroup => enumerate_polygroup_selection_edges_with_topology(from, mesh, topology, &mut add)?,
    }
    Ok(converted)
}

/// Keeps only vertices that are polygroup corners.
fn to_polygroup_vertices(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    from: &GeometrySelection,
    to: &mut GeometrySelection,
) -> Result<bool> {
    let topology = require_topology(topology, "conversion to polygroup vertices")?;
    let mut converted = false;
    let mut add = |v: VertexId, _: DVec3| {
        if let Some(corner) = topology.corner_for_vertex(v) {
            converted = true;
            to.insert(SelectionId::grouped(v.0, corner));
        }
    };
    match from.topology_type {
        TopologyType::Triangle => enumerate_triangle_selection_vertices(from, mesh, None, &mut add)?,
        TopologyType::Polygroup => enumerate_polygroup_selection_vertices(from, mesh, topology, None, &mut add)?,
    }
    Ok(converted)
}

// ============================================================================
// Triangle lists and index arrays
// ============================================================================

/// Adds the elements of `triangles` to `out`, in `out`'s kind. Invalid
/// triangles are skipped.
///
/// Triangle edges are added as the triangles' own sides; polygroup vertices
/// keep only corners and polygroup edges only group edges.
pub fn initialize_selection_from_triangles(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    triangles: &[u32],
    out: &mut GeometrySelection,
) -> Result<()> {
    let valid = triangles.iter().map(|&t| TriangleId(t)).filter(|&t| mesh.is_triangle(t));
    match (out.topology_type, out.element_type) {
        (TopologyType::Triangle, ElementType::Vertex) => {
            for t in valid {
                out.extend(mesh.triangle(t).map(|v| SelectionId::Raw(v.0)));
            }
        }
        (TopologyType::Triangle, ElementType::Edge) => {
            for t in valid {
                out.extend((0..3).map(|k| SelectionId::tri_edge(TriEdge::new(t, k))));
            }
        }
        (TopologyType::Triangle, ElementType::Face) => {
            out.extend(valid.map(|t| SelectionId::Raw(t.0)));
        }
        (TopologyType::Polygroup, element) => {
            let topology = require_topology(topology, "polygroup selection from triangles")?;
            match element {
                ElementType::Vertex => {
                    let vertices: BTreeSet<VertexId> = valid.flat_map(|t| mesh.triangle(t)).collect();
                    for v in vertices {
                        if let Some(corner) = topology.corner_for_vertex(v) {
                            out.insert(SelectionId::grouped(v.0, corner));
                        }
                    }
                }
                ElementType::Edge => {
                    let edges: BTreeSet<EdgeId> = valid.flat_map(|t| mesh.triangle_edges(t)).collect();
                    for e in edges {
                        if let Some(id) = topology.find_group_edge(e).and_then(|ge| group_edge_selection_id(mesh, topology, ge)) {
                            out.insert(id);
                        }
                    }
                }
                ElementType::Face => {
                    for t in valid {
                        let group = topology.group_id(t);
                        if let Some(first) = topology.group_triangles(group).first() {
                            out.insert(SelectionId::grouped(first.0, group));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// What the integers of an index array name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexArrayKind {
    Vertices,
    Triangles,
    Polygroups,
}

/// Builds a selection of `out`'s kind from an index array. The indices are
/// first read as a triangle-topology vertex or face selection (polygroup ids
/// expand to their triangles), then converted with `policy`.
pub fn convert_index_array_to_selection(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    indices: &[u32],
    kind: IndexArrayKind,
    out: &mut GeometrySelection,
    policy: ConversionPolicy,
) -> Result<bool> {
    let source = match kind {
        IndexArrayKind::Vertices => GeometrySelection::with_ids(
            ElementType::Vertex,
            TopologyType::Triangle,
            indices
                .iter()
                .filter(|&&v| mesh.is_vertex(VertexId(v)))
                .map(|&v| SelectionId::Raw(v)),
        ),
        IndexArrayKind::Triangles => GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Triangle,
            indices
                .iter()
                .filter(|&&t| mesh.is_triangle(TriangleId(t)))
                .map(|&t| SelectionId::Raw(t)),
        ),
        IndexArrayKind::Polygroups => {
            let groups: HashSet<u32> = indices.iter().copied().collect();
            GeometrySelection::with_ids(
                ElementType::Face,
                TopologyType::Triangle,
                mesh.triangle_ids()
                    .filter(|&t| groups.contains(&mesh.triangle_group(t)))
                    .map(|t| SelectionId::Raw(t.0)),
            )
        }
    };
    convert_selection(mesh, topology, &source, out, policy)
}

/// Flattens a selection to sorted unique vertex, triangle or polygroup ids.
///
/// Triangles and polygroups come from the triangles the selection touches.
/// Vertices come from the selection's own vertices (group vertices for
/// polygroup selections, which need `topology`).
pub fn convert_selection_to_index_array(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    sel: &GeometrySelection,
    kind: IndexArrayKind,
) -> Result<Vec<u32>> {
    let mut out: BTreeSet<u32> = BTreeSet::new();
    match kind {
        IndexArrayKind::Triangles => {
            enumerate_selection_triangles(sel, mesh, |t| {
                out.insert(t.0);
            })?;
        }
        IndexArrayKind::Polygroups => {
            enumerate_selection_triangles(sel, mesh, |t| {
                out.insert(mesh.triangle_group(t));
            })?;
        }
        IndexArrayKind::Vertices => {
            let add = |v: VertexId, _: DVec3| {
                out.insert(v.0);
            };
            match sel.topology_type {
                TopologyType::Triangle => enumerate_triangle_selection_vertices(sel, mesh, None, add)?,
                TopologyType::Polygroup => {
                    let topology = require_topology(topology, "polygroup vertex index array")?;
                    enumerate_polygroup_selection_vertices(sel, mesh, topology, None, add)?
                }
            }
        }
    }
    Ok(out.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectionError;

    // 2x2 quad grid, one group per quad.
    fn grid() -> TriangleMesh {
        let mut positions = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                positions.push(DVec3::new(x as f64, y as f64, 0.0));
            }
        }
        let mut tris = Vec::new();
        for y in 0..2u32 {
            for x in 0..2u32 {
                let i = y * 3 + x;
                tris.push([i, i + 1, i + 4]);
                tris.push([i, i + 4, i + 3]);
            }
        }
        TriangleMesh::new(positions, &tris)
            .unwrap()
            .with_polygroups(vec![0, 0, 1, 1, 2, 2, 3, 3])
            .unwrap()
    }

    fn sel(element: ElementType, topology: TopologyType, ids: &[SelectionId]) -> GeometrySelection {
        GeometrySelection::with_ids(element, topology, ids.iter().copied())
    }

    #[test]
    fn test_vertex_to_face_contain_needs_all_corners() {
        let mesh = grid();
        let from = sel(
            ElementType::Vertex,
            TopologyType::Triangle,
            &[SelectionId::Raw(0), SelectionId::Raw(1), SelectionId::Raw(4)],
        );
        let mut contain = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        convert_selection(&mesh, None, &from, &mut contain, ConversionPolicy::Contain).unwrap();
        assert_eq!(contain.iter().collect::<Vec<_>>(), vec![SelectionId::Raw(0)]);

        let mut expand = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        convert_selection(&mesh, None, &from, &mut expand, ConversionPolicy::Expand).unwrap();
        assert_eq!(expand.len(), 7, "all but triangle 5 touch vertex 0, 1 or 4");
    }

    #[test]
    fn test_vertex_to_edge_contain_keeps_both_sides() {
        let mesh = grid();
        let from = sel(ElementType::Vertex, TopologyType::Triangle, &[SelectionId::Raw(0), SelectionId::Raw(4)]);
        let mut to = GeometrySelection::new(ElementType::Edge, TopologyType::Triangle);
        convert_selection(&mesh, None, &from, &mut to, ConversionPolicy::Contain).unwrap();
        // The diagonal 0-4 is interior, so both of its sides are selected.
        assert_eq!(to.len(), 2);
        assert_eq!(to.unique_edges(&mesh).len(), 1);
    }

    #[test]
    fn test_to_polygroup_vertices_reports_no_corners() {
        let mesh = grid();
        let topo = GroupTopology::new(&mesh);
        let from = sel(ElementType::Vertex, TopologyType::Triangle, &[SelectionId::Raw(0)]);
        let mut to = GeometrySelection::new(ElementType::Vertex, TopologyType::Polygroup);
        let converted = convert_selection(&mesh, Some(&topo), &from, &mut to, ConversionPolicy::Contain).unwrap();
        assert!(!converted, "vertex 0 is not a corner");
        assert!(to.is_empty());

        let center = sel(ElementType::Vertex, TopologyType::Triangle, &[SelectionId::Raw(4)]);
        assert!(convert_selection(&mesh, Some(&topo), &center, &mut to, ConversionPolicy::Contain).unwrap());
        assert_eq!(to.len(), 1);
    }

    #[test]
    fn test_polygroup_target_needs_topology() {
        let mesh = grid();
        let from = sel(ElementType::Face, TopologyType::Triangle, &[SelectionId::Raw(0)]);
        let mut to = GeometrySelection::new(ElementType::Edge, TopologyType::Polygroup);
        let err = convert_selection(&mesh, None, &from, &mut to, ConversionPolicy::Contain).unwrap_err();
        assert!(matches!(err, SelectionError::MissingGroupTopology(_)));
    }

    #[test]
    fn test_face_to_polygroup_face_is_one_entry_per_group() {
        let mesh = grid();
        let from = sel(ElementType::Face, TopologyType::Triangle, &[SelectionId::Raw(0), SelectionId::Raw(1)]);
        let mut to = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
        convert_selection(&mesh, None, &from, &mut to, ConversionPolicy::Contain).unwrap();
        assert_eq!(to.iter().collect::<Vec<_>>(), vec![SelectionId::grouped(0, 0)]);
    }

    #[test]
    fn test_initialize_polygroup_edges_from_triangles() {
        let mesh = grid();
        let topo = GroupTopology::new(&mesh);
        let mut out = GeometrySelection::new(ElementType::Edge, TopologyType::Polygroup);
        initialize_selection_from_triangles(&mesh, Some(&topo), &[0, 1], &mut out).unwrap();
        // Quad 0 is bounded by two inner group edges and one boundary chain.
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_polygroup_index_array() {
        let mesh = grid();
        let mut out = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        convert_index_array_to_selection(&mesh, None, &[2], IndexArrayKind::Polygroups, &mut out, ConversionPolicy::Contain)
            .unwrap();
        assert_eq!(
            convert_selection_to_index_array(&mesh, None, &out, IndexArrayKind::Triangles).unwrap(),
            vec![4, 5]
        );
        assert_eq!(
            convert_selection_to_index_array(&mesh, None, &out, IndexArrayKind::Polygroups).unwrap(),
            vec![2]
        );
    }
}
