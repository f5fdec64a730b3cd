//! Enumeration of the mesh elements a selection covers.
//!
//! Every entry point checks the selection's topology type and returns an error
//! when it does not match. Callbacks may see the same element more than once
//! (for example both triangles of a selected edge share vertices); callers that
//! need uniqueness collect into a set.

use std::collections::{BTreeSet, HashSet};

use glam::{DAffine3, DVec3};
use strata_core::connected::{grow_to_connected_edges, grow_to_connected_triangles};
use strata_core::{EdgeId, GroupTopology, TriEdge, TriangleId, TriangleMesh, VertexId};

use crate::error::{Result, SelectionError};
use crate::selection::{ElementType, GeometrySelection, SelectionId, TopologyType};

/// Resolves an edge-selection id to its mesh edge. Stale ids resolve to `None`.
pub(crate) fn selected_edge(mesh: &TriangleMesh, id: SelectionId) -> Option<EdgeId> {
    mesh.edge_from_tri_edge(TriEdge::decode(id.geometry()))
}

pub(crate) fn selected_triangle(mesh: &TriangleMesh, id: SelectionId) -> Option<TriangleId> {
    let t = TriangleId(id.geometry());
    mesh.is_triangle(t).then_some(t)
}

pub(crate) fn selected_vertex(mesh: &TriangleMesh, id: SelectionId) -> Option<VertexId> {
    let v = VertexId(id.geometry());
    mesh.is_vertex(v).then_some(v)
}

pub(crate) fn require_topology<'a>(topology: Option<&'a GroupTopology>, what: &'static str) -> Result<&'a GroupTopology> {
    topology.ok_or(SelectionError::MissingGroupTopology(what))
}

/// Polygroup vertex id for `corner`.
pub(crate) fn corner_selection_id(topology: &GroupTopology, corner: u32) -> Option<SelectionId> {
    topology.corner_vertex(corner).map(|v| SelectionId::grouped(v.0, corner))
}

/// Polygroup edge id for `group_edge`, seeded at the first side of its first span edge.
pub(crate) fn group_edge_selection_id(mesh: &TriangleMesh, topology: &GroupTopology, group_edge: u32) -> Option<SelectionId> {
    let first = *topology.group_edge(group_edge)?.edges.first()?;
    Some(SelectionId::grouped(mesh.tri_edge_from_edge(first).encode(), group_edge))
}

/// Polygroup face id for `group`, seeded at its first triangle.
pub(crate) fn group_face_selection_id(topology: &GroupTopology, group: u32) -> Option<SelectionId> {
    let first = topology.group_triangles(group).first()?;
    Some(SelectionId::grouped(first.0, group))
}

/// Triangles reachable from `seed` without leaving its polygroup.
pub(crate) fn connected_group_triangles(mesh: &TriangleMesh, seed: TriangleId) -> Vec<TriangleId> {
    let group = mesh.triangle_group(seed);
    grow_to_connected_triangles(mesh, [seed], |_, to| mesh.triangle_group(to) == group)
}

/// Sorted polygroup ids of the triangles adjacent to `e` (one or two entries).
fn edge_groups(mesh: &TriangleMesh, e: EdgeId) -> Vec<u32> {
    let mut groups: Vec<u32> = mesh
        .edge(e)
        .triangles
        .iter()
        .filter(|t| t.is_valid())
        .map(|&t| mesh.triangle_group(t))
        .collect();
    groups.sort_unstable();
    groups
}

// ============================================================================
// Triangles
// ============================================================================

pub fn enumerate_selection_triangles<F>(sel: &GeometrySelection, mesh: &TriangleMesh, f: F) -> Result<()>
where
    F: FnMut(TriangleId),
{
    match sel.topology_type {
        TopologyType::Triangle => enumerate_triangle_selection_triangles(sel, mesh, f),
        TopologyType::Polygroup => enumerate_polygroup_selection_triangles(sel, mesh, f),
    }
}

/// Faces yield themselves, edges their one or two adjacent triangles, and
/// vertices their one-ring.
pub fn enumerate_triangle_selection_triangles<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    mut f: F,
) -> Result<()>
where
    F: FnMut(TriangleId),
{
    sel.expect_topology(TopologyType::Triangle)?;
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                if let Some(t) = selected_triangle(mesh, id) {
                    f(t);
                }
            }
            ElementType::Edge => {
                if let Some(e) = selected_edge(mesh, id) {
                    for &t in mesh.edge(e).triangles.iter().filter(|t| t.is_valid()) {
                        f(t);
                    }
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    mesh.vertex_triangles(v).iter().copied().for_each(&mut f);
                }
            }
        }
    }
    Ok(())
}

/// Flood-fills each seed triangle across its own polygroup. Edge and vertex
/// entries seed from every adjacent triangle.
///
/// Only the region connected to a seed is produced, so two disconnected
/// patches sharing one group id are enumerated separately when both are seeded.
/// Each triangle is reported once.
pub fn enumerate_polygroup_selection_triangles<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    mut f: F,
) -> Result<()>
where
    F: FnMut(TriangleId),
{
    sel.expect_topology(TopologyType::Polygroup)?;
    let mut seeds: Vec<TriangleId> = Vec::new();
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => seeds.extend(selected_triangle(mesh, id)),
            ElementType::Edge => {
                if let Some(e) = selected_edge(mesh, id) {
                    seeds.extend(mesh.edge(e).triangles.iter().filter(|t| t.is_valid()));
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    seeds.extend_from_slice(mesh.vertex_triangles(v));
                }
            }
        }
    }

    let mut emitted: HashSet<TriangleId> = HashSet::new();
    for seed in seeds {
        if emitted.contains(&seed) {
            continue;
        }
        for t in connected_group_triangles(mesh, seed) {
            if emitted.insert(t) {
                f(t);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Edges
// ============================================================================

pub fn enumerate_selection_edges<F>(sel: &GeometrySelection, mesh: &TriangleMesh, f: F) -> Result<()>
where
    F: FnMut(EdgeId),
{
    match sel.topology_type {
        TopologyType::Triangle => enumerate_triangle_selection_edges(sel, mesh, f),
        TopologyType::Polygroup => enumerate_polygroup_selection_edges(sel, mesh, f),
    }
}

pub fn enumerate_triangle_selection_edges<F>(sel: &GeometrySelection, mesh: &TriangleMesh, mut f: F) -> Result<()>
where
    F: FnMut(EdgeId),
{
    sel.expect_topology(TopologyType::Triangle)?;
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                if let Some(t) = selected_triangle(mesh, id) {
                    mesh.triangle_edges(t).into_iter().for_each(&mut f);
                }
            }
            ElementType::Edge => {
                if let Some(e) = selected_edge(mesh, id) {
                    f(e);
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    mesh.vertex_edges(v).iter().copied().for_each(&mut f);
                }
            }
        }
    }
    Ok(())
}

/// Polygroup edge enumeration driven by the mesh's polygroup layer.
///
/// - Faces report every edge of every triangle in the seed's connected group.
/// - Edges grow from the seed edge over connected edges that separate the same
///   groups. A seed inside one group therefore reports that group's connected
///   interior edges, and a seed on a group border reports the whole border run.
/// - Vertices seed from each incident edge.
pub fn enumerate_polygroup_selection_edges<F>(sel: &GeometrySelection, mesh: &TriangleMesh, mut f: F) -> Result<()>
where
    F: FnMut(EdgeId),
{
    sel.expect_topology(TopologyType::Polygroup)?;

    if sel.element_type == ElementType::Face {
        let mut visited: HashSet<TriangleId> = HashSet::new();
        for id in sel.iter() {
            let Some(seed) = selected_triangle(mesh, id) else {
                continue;
            };
            if visited.contains(&seed) {
                continue;
            }
            for t in connected_group_triangles(mesh, seed) {
                if visited.insert(t) {
                    mesh.triangle_edges(t).into_iter().for_each(&mut f);
                }
            }
        }
        return Ok(());
    }

    let mut seeds: Vec<EdgeId> = Vec::new();
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Edge => seeds.extend(selected_edge(mesh, id)),
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    seeds.extend_from_slice(mesh.vertex_edges(v));
                }
            }
            ElementType::Face => {}
        }
    }

    let mut emitted: HashSet<EdgeId> = HashSet::new();
    for seed in seeds {
        if emitted.contains(&seed) {
            continue;
        }
        let key = edge_groups(mesh, seed);
        for e in grow_to_connected_edges(mesh, [seed], |_, to| edge_groups(mesh, to) == key) {
            if emitted.insert(e) {
                f(e);
            }
        }
    }
    Ok(())
}

/// Polygroup edge enumeration driven by a prebuilt [`GroupTopology`].
///
/// Faces report every edge of the triangles in the seed's connected group
/// region. Edges and vertices
/// report the spans of the group edges they lie on; mesh edges inside a group
/// are skipped.
pub fn enumerate_polygroup_selection_edges_with_topology<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    mut f: F,
) -> Result<()>
where
    F: FnMut(EdgeId),
{
    sel.expect_topology(TopologyType::Polygroup)?;
    let mut group_edges: Vec<u32> = Vec::new();
    match sel.element_type {
        ElementType::Face => {
            let mut visited: HashSet<TriangleId> = HashSet::new();
            for seed in sel.iter().filter_map(|id| selected_triangle(mesh, id)) {
                if visited.contains(&seed) {
                    continue;
                }
                for t in connected_group_triangles(mesh, seed) {
                    if visited.insert(t) {
                        mesh.triangle_edges(t).into_iter().for_each(&mut f);
                    }
                }
            }
            return Ok(());
        }
        ElementType::Edge => {
            for id in sel.iter() {
                if let Some(ge) = selected_edge(mesh, id).and_then(|e| topology.find_group_edge(e)) {
                    group_edges.push(ge);
                }
            }
        }
        ElementType::Vertex => {
            for id in sel.iter() {
                if let Some(v) = selected_vertex(mesh, id) {
                    group_edges.extend(mesh.vertex_edges(v).iter().filter_map(|&e| topology.find_group_edge(e)));
                }
            }
        }
    }
    for span in group_edges.into_iter().filter_map(|ge| topology.group_edge(ge)) {
        span.edges.iter().copied().for_each(&mut f);
    }
    Ok(())
}

// ============================================================================
// Vertices
// ============================================================================

/// Vertices of a triangle-topology selection with their (optionally transformed)
/// positions.
pub fn enumerate_triangle_selection_vertices<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    transform: Option<&DAffine3>,
    mut f: F,
) -> Result<()>
where
    F: FnMut(VertexId, DVec3),
{
    sel.expect_topology(TopologyType::Triangle)?;
    let place = |v: VertexId| apply(transform, mesh.vertex(v));
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                if let Some(t) = selected_triangle(mesh, id) {
                    for v in mesh.triangle(t) {
                        f(v, place(v));
                    }
                }
            }
            ElementType::Edge => {
                if let Some(e) = selected_edge(mesh, id) {
                    for v in mesh.edge_vertices(e) {
                        f(v, place(v));
                    }
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    f(v, place(v));
                }
            }
        }
    }
    Ok(())
}

/// Faces report every vertex of the seed's connected group region, edges every
/// vertex along their group edge, and vertices themselves.
pub fn enumerate_polygroup_selection_vertices<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    transform: Option<&DAffine3>,
    mut f: F,
) -> Result<()>
where
    F: FnMut(VertexId, DVec3),
{
    sel.expect_topology(TopologyType::Polygroup)?;
    let place = |v: VertexId| apply(transform, mesh.vertex(v));
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                let Some(seed) = selected_triangle(mesh, id) else {
                    continue;
                };
                for t in connected_group_triangles(mesh, seed) {
                    for v in mesh.triangle(t) {
                        f(v, place(v));
                    }
                }
            }
            ElementType::Edge => {
                let span = selected_edge(mesh, id)
                    .and_then(|e| topology.find_group_edge(e))
                    .and_then(|ge| topology.group_edge(ge));
                if let Some(span) = span {
                    for &v in &span.vertices {
                        f(v, place(v));
                    }
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    f(v, place(v));
                }
            }
        }
    }
    Ok(())
}

fn apply(transform: Option<&DAffine3>, p: DVec3) -> DVec3 {
    transform.map_or(p, |xf| xf.transform_point3(p))
}

// ============================================================================
// Renderable elements
// ============================================================================

/// A selected element together with its geometry, for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionElement {
    Vertex(VertexId, DVec3),
    Edge(EdgeId, [DVec3; 2]),
    Triangle(TriangleId, [DVec3; 3]),
}

/// Which elements a face selection is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementMapping {
    pub faces_to_faces: bool,
    pub faces_to_edges: bool,
}

impl Default for ElementMapping {
    fn default() -> Self {
        Self {
            faces_to_faces: true,
            faces_to_edges: false,
        }
    }
}

fn edge_element(mesh: &TriangleMesh, e: EdgeId, transform: Option<&DAffine3>) -> SelectionElement {
    let [a, b] = mesh.edge_vertices(e);
    SelectionElement::Edge(e, [apply(transform, mesh.vertex(a)), apply(transform, mesh.vertex(b))])
}

fn triangle_element(mesh: &TriangleMesh, t: TriangleId, transform: Option<&DAffine3>) -> SelectionElement {
    SelectionElement::Triangle(t, mesh.triangle_positions(t).map(|p| apply(transform, p)))
}

pub fn enumerate_triangle_selection_elements<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    transform: Option<&DAffine3>,
    mapping: ElementMapping,
    mut f: F,
) -> Result<()>
where
    F: FnMut(SelectionElement),
{
    sel.expect_topology(TopologyType::Triangle)?;
    match sel.element_type {
        ElementType::Face => {
            if mapping.faces_to_faces {
                enumerate_triangle_selection_triangles(sel, mesh, |t| f(triangle_element(mesh, t, transform)))?;
            }
            if mapping.faces_to_edges {
                enumerate_triangle_selection_edges(sel, mesh, |e| f(edge_element(mesh, e, transform)))?;
            }
        }
        ElementType::Edge => {
            enumerate_triangle_selection_edges(sel, mesh, |e| f(edge_element(mesh, e, transform)))?;
        }
        ElementType::Vertex => {
            enumerate_triangle_selection_vertices(sel, mesh, transform, |v, p| f(SelectionElement::Vertex(v, p)))?;
        }
    }
    Ok(())
}

/// Face selections map to the triangles of the seed's connected group region
/// and, when asked, to the group edges bounding that region.
pub fn enumerate_polygroup_selection_elements<F>(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    transform: Option<&DAffine3>,
    mapping: ElementMapping,
    mut f: F,
) -> Result<()>
where
    F: FnMut(SelectionElement),
{
    sel.expect_topology(TopologyType::Polygroup)?;
    let emit_group_edge = |ge: u32, f: &mut F| {
        if let Some(span) = topology.group_edge(ge) {
            for &e in &span.edges {
                f(edge_element(mesh, e, transform));
            }
        }
    };
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                let Some(seed) = selected_triangle(mesh, id) else {
                    continue;
                };
                let region = connected_group_triangles(mesh, seed);
                if mapping.faces_to_faces {
                    for &t in &region {
                        f(triangle_element(mesh, t, transform));
                    }
                }
                if mapping.faces_to_edges {
                    let bounding: BTreeSet<u32> = region
                        .iter()
                        .flat_map(|&t| mesh.triangle_edges(t))
                        .filter_map(|e| topology.find_group_edge(e))
                        .collect();
                    for ge in bounding {
                        emit_group_edge(ge, &mut f);
                    }
                }
            }
            ElementType::Edge => {
                if let Some(ge) = selected_edge(mesh, id).and_then(|e| topology.find_group_edge(e)) {
                    emit_group_edge(ge, &mut f);
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    f(SelectionElement::Vertex(v, apply(transform, mesh.vertex(v))));
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Group topology view
// ============================================================================

/// A polygroup selection expressed as [`GroupTopology`] ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTopologySelection {
    pub groups: BTreeSet<u32>,
    pub group_edges: BTreeSet<u32>,
    pub corners: BTreeSet<u32>,
}

impl GroupTopologySelection {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.group_edges.is_empty() && self.corners.is_empty()
    }
}

/// Maps each polygroup selection entry to the group, group edge or corner it
/// names. Entries that no longer resolve are dropped.
pub fn convert_polygroup_selection_to_topology_selection(
    sel: &GeometrySelection,
    mesh: &TriangleMesh,
    topology: &GroupTopology,
) -> Result<GroupTopologySelection> {
    sel.expect_topology(TopologyType::Polygroup)?;
    let mut out = GroupTopologySelection::default();
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                if let Some(t) = selected_triangle(mesh, id) {
                    out.groups.insert(topology.group_id(t));
                }
            }
            ElementType::Edge => {
                if let Some(ge) = selected_edge(mesh, id).and_then(|e| topology.find_group_edge(e)) {
                    out.group_edges.insert(ge);
                }
            }
            ElementType::Vertex => {
                if let Some(c) = selected_vertex(mesh, id).and_then(|v| topology.corner_for_vertex(v)) {
                    out.corners.insert(c);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x1 strip of quads: vertices 0..6, quad 0 = tris 0,1 (group 10), quad 1 = tris 2,3 (group 20).
    fn strip() -> TriangleMesh {
        let positions = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
        ];
        TriangleMesh::new(positions, &[[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]])
            .unwrap()
            .with_polygroups(vec![10, 10, 20, 20])
            .unwrap()
    }

    fn collect_triangles(sel: &GeometrySelection, mesh: &TriangleMesh) -> BTreeSet<TriangleId> {
        let mut out = BTreeSet::new();
        enumerate_selection_triangles(sel, mesh, |t| {
            out.insert(t);
        })
        .unwrap();
        out
    }

    #[test]
    fn test_triangle_edge_selection_touches_both_sides() {
        let mesh = strip();
        let shared = mesh.find_edge(VertexId(1), VertexId(4)).unwrap();
        let te = mesh.tri_edge_from_edge(shared);
        let sel = GeometrySelection::with_ids(ElementType::Edge, TopologyType::Triangle, [SelectionId::tri_edge(te)]);
        let tris = collect_triangles(&sel, &mesh);
        assert_eq!(tris, BTreeSet::from([TriangleId(0), TriangleId(3)]));
    }

    #[test]
    fn test_polygroup_face_floods_group() {
        let mesh = strip();
        let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(2, 20)]);
        assert_eq!(collect_triangles(&sel, &mesh), BTreeSet::from([TriangleId(2), TriangleId(3)]));
    }

    #[test]
    fn test_topology_mismatch_is_an_error() {
        let mesh = strip();
        let sel = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        assert!(enumerate_polygroup_selection_triangles(&sel, &mesh, |_| {}).is_err());
    }

    #[test]
    fn test_border_edge_enumerates_whole_border_run() {
        let mesh = strip();
        let border = mesh.find_edge(VertexId(1), VertexId(4)).unwrap();
        let te = mesh.tri_edge_from_edge(border);
        let sel = GeometrySelection::with_ids(
            ElementType::Edge,
            TopologyType::Polygroup,
            [SelectionId::grouped(te.encode(), 0)],
        );
        let mut edges = Vec::new();
        enumerate_polygroup_selection_edges(&sel, &mesh, |e| edges.push(e)).unwrap();
        assert_eq!(edges, vec![border]);
    }

    #[test]
    fn test_topology_selection_view() {
        let mesh = strip();
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::with_ids(
            ElementType::Vertex,
            TopologyType::Polygroup,
            [SelectionId::grouped(1, 0), SelectionId::grouped(0, 0)],
        );
        let view = convert_polygroup_selection_to_topology_selection(&sel, &mesh, &topo).unwrap();
        // Vertex 1 is a boundary vertex between two groups; vertex 0 is not a corner.
        assert_eq!(view.corners.len(), 1);
        assert!(view.groups.is_empty());
    }

    // Two disjoint unit quads sharing polygroup 10: tris 0,1 on vertices 0..4, tris 2,3 on 4..8.
    fn split_group() -> TriangleMesh {
        let mut positions = Vec::new();
        for x in [0.0, 5.0] {
            positions.extend([
                DVec3::new(x, 0.0, 0.0),
                DVec3::new(x + 1.0, 0.0, 0.0),
                DVec3::new(x + 1.0, 1.0, 0.0),
                DVec3::new(x, 1.0, 0.0),
            ]);
        }
        TriangleMesh::new(positions, &[[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]])
            .unwrap()
            .with_polygroups(vec![10; 4])
            .unwrap()
    }

    #[test]
    fn test_polygroup_face_vertices_stay_in_seed_region() {
        let mesh = split_group();
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(3, 10)]);
        let mut vertices = BTreeSet::new();
        enumerate_polygroup_selection_vertices(&sel, &mesh, &topo, None, |v, _| {
            vertices.insert(v);
        })
        .unwrap();
        assert_eq!(vertices, (4..8).map(VertexId).collect());
    }

    #[test]
    fn test_polygroup_face_elements_stay_in_seed_region() {
        let mesh = split_group();
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(0, 10)]);
        let mapping = ElementMapping {
            faces_to_faces: true,
            faces_to_edges: true,
        };
        let mut tris = BTreeSet::new();
        let mut edges = BTreeSet::new();
        enumerate_polygroup_selection_elements(&sel, &mesh, &topo, None, mapping, |el| match el {
            SelectionElement::Triangle(t, _) => {
                tris.insert(t);
            }
            SelectionElement::Edge(e, _) => {
                edges.insert(e);
            }
            SelectionElement::Vertex(..) => {}
        })
        .unwrap();
        assert_eq!(tris, BTreeSet::from([TriangleId(0), TriangleId(1)]));
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|&e| mesh.edge_vertices(e).iter().all(|v| v.0 < 4)));
    }

    #[test]
    fn test_elements_with_edge_mapping() {
        let mesh = strip();
        let topo = GroupTopology::new(&mesh);
        let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(0, 10)]);
        let mapping = ElementMapping {
            faces_to_faces: true,
            faces_to_edges: true,
        };
        let mut tris = 0;
        let mut edges = 0;
        enumerate_polygroup_selection_elements(&sel, &mesh, &topo, None, mapping, |el| match el {
            SelectionElement::Triangle(..) => tris += 1,
            SelectionElement::Edge(..) => edges += 1,
            SelectionElement::Vertex(..) => {}
        })
        .unwrap();
        assert_eq!(tris, 2);
        assert_eq!(edges, 4, "the four sides of the left quad");
    }
}
