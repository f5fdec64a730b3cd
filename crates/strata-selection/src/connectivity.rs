//! Select-all, flood selection, and one-ring expand/contract.

use std::collections::{BTreeSet, VecDeque};

use strata_core::connected::{grow_to_connected_edges, grow_to_connected_triangles, grow_to_connected_vertices};
use strata_core::{EdgeId, GroupTopology, TriangleId, TriangleMesh, VertexId};

use crate::enumerate::{
    corner_selection_id, group_edge_selection_id, group_face_selection_id, require_topology, selected_edge,
    selected_triangle, selected_vertex,
};
use crate::error::{Result, SelectionError};
use crate::selection::{ElementType, GeometrySelection, SelectionId, TopologyType};

/// Which neighbouring elements count as connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Any mesh adjacency.
    #[default]
    Geometric,
    /// Elements must share a polygroup id.
    Polygroup,
    /// Elements must share a material id.
    Material,
}

impl ConnectionMode {
    fn attribute(self, mesh: &TriangleMesh, t: TriangleId) -> u32 {
        match self {
            ConnectionMode::Material => mesh.triangle_material(t),
            _ => mesh.triangle_group(t),
        }
    }

    /// Attribute values of the triangles an element touches.
    fn attributes(self, mesh: &TriangleMesh, element: ElementType, id: SelectionId) -> Vec<u32> {
        let triangles: Vec<TriangleId> = match element {
            ElementType::Face => selected_triangle(mesh, id).into_iter().collect(),
            ElementType::Edge => selected_edge(mesh, id)
                .map(|e| mesh.edge(e).triangles.into_iter().filter(|t| t.is_valid()).collect())
                .unwrap_or_default(),
            ElementType::Vertex => selected_vertex(mesh, id)
                .map(|v| mesh.vertex_triangles(v).to_vec())
                .unwrap_or_default(),
        };
        let mut values: Vec<u32> = triangles.into_iter().map(|t| self.attribute(mesh, t)).collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Connection predicate over selection ids of `sel`'s kind.
    ///
    /// Two elements are connected when the attribute sets of the triangles they
    /// touch intersect. Under polygroup topology every group differs from its
    /// neighbours, so `Polygroup` behaves like `Geometric` there.
    pub fn predicate<'a>(
        self,
        mesh: &'a TriangleMesh,
        sel: &GeometrySelection,
    ) -> impl Fn(SelectionId, SelectionId) -> bool + 'a {
        let element = sel.element_type;
        let mode = match (self, sel.topology_type) {
            (ConnectionMode::Polygroup, TopologyType::Polygroup) => ConnectionMode::Geometric,
            (mode, _) => mode,
        };
        move |a, b| {
            if mode == ConnectionMode::Geometric {
                return true;
            }
            let a = mode.attributes(mesh, element, a);
            let b = mode.attributes(mesh, element, b);
            a.iter().any(|x| b.contains(x))
        }
    }
}

fn tri_edge_ids(mesh: &TriangleMesh, e: EdgeId) -> impl Iterator<Item = SelectionId> + '_ {
    mesh.tri_edges_of_edge(e).map(SelectionId::tri_edge)
}

// ============================================================================
// Select all
// ============================================================================

/// Adds every element of `out`'s kind accepted by `predicate`.
///
/// Triangle edges are tested and added as both of their sides. Polygroup
/// kinds enumerate corners, group edges and groups of `topology`.
pub fn make_select_all<P>(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    mut predicate: P,
    out: &mut GeometrySelection,
) -> Result<()>
where
    P: FnMut(SelectionId) -> bool,
{
    match out.topology_type {
        TopologyType::Triangle => match out.element_type {
            ElementType::Vertex => {
                for v in mesh.vertex_ids() {
                    let id = SelectionId::Raw(v.0);
                    if predicate(id) {
                        out.insert(id);
                    }
                }
            }
            ElementType::Edge => {
                for e in mesh.edge_ids() {
                    if tri_edge_ids(mesh, e).all(&mut predicate) {
                        out.extend(tri_edge_ids(mesh, e));
                    }
                }
            }
            ElementType::Face => {
                for t in mesh.triangle_ids() {
                    let id = SelectionId::Raw(t.0);
                    if predicate(id) {
                        out.insert(id);
                    }
                }
            }
        },
        TopologyType::Polygroup => {
            let topology = require_topology(topology, "polygroup select all")?;
            let ids: Vec<SelectionId> = match out.element_type {
                ElementType::Vertex => (0..topology.corner_count() as u32)
                    .filter_map(|c| corner_selection_id(topology, c))
                    .collect(),
                ElementType::Edge => (0..topology.group_edge_count() as u32)
                    .filter_map(|ge| group_edge_selection_id(mesh, topology, ge))
                    .collect(),
                ElementType::Face => topology
                    .groups()
                    .iter()
                    .filter_map(|g| group_face_selection_id(topology, g.id))
                    .collect(),
            };
            for id in ids {
                if predicate(id) {
                    out.insert(id);
                }
            }
        }
    }
    Ok(())
}

/// Floods outward from `reference`, adding each neighbour accepted by
/// `predicate` and connected to the element it was reached from.
///
/// `reference` and `out` must be the same kind. Triangle kinds grow over mesh
/// adjacency; polygroup kinds over corner, group-edge or group adjacency.
pub fn make_select_all_connected<P, C>(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    reference: &GeometrySelection,
    predicate: P,
    connected: C,
    out: &mut GeometrySelection,
) -> Result<()>
where
    P: Fn(SelectionId) -> bool,
    C: Fn(SelectionId, SelectionId) -> bool,
{
    if !reference.is_same_type(out) {
        return Err(SelectionError::IncompatibleSelections);
    }
    match out.topology_type {
        TopologyType::Triangle => {
            select_all_connected_triangle_topology(mesh, reference, &predicate, &connected, out);
            Ok(())
        }
        TopologyType::Polygroup => {
            let topology = require_topology(topology, "polygroup connected selection")?;
            select_all_connected_polygroup(mesh, topology, reference, &predicate, &connected, out);
            Ok(())
        }
    }
}

fn select_all_connected_triangle_topology(
    mesh: &TriangleMesh,
    reference: &GeometrySelection,
    predicate: &dyn Fn(SelectionId) -> bool,
    connected: &dyn Fn(SelectionId, SelectionId) -> bool,
    out: &mut GeometrySelection,
) {
    match out.element_type {
        ElementType::Vertex => {
            let seeds = reference.iter().map(|id| VertexId(id.geometry()));
            let grown = grow_to_connected_vertices(mesh, seeds, |from, to| {
                let to = SelectionId::Raw(to.0);
                predicate(to) && connected(SelectionId::Raw(from.0), to)
            });
            out.extend(grown.into_iter().map(|v| SelectionId::Raw(v.0)));
        }
        ElementType::Edge => {
            let seeds: Vec<EdgeId> = reference.iter().filter_map(|id| selected_edge(mesh, id)).collect();
            let grown = grow_to_connected_edges(mesh, seeds, |from, to| {
                tri_edge_ids(mesh, to).all(predicate)
                    && connected(
                        SelectionId::tri_edge(mesh.tri_edge_from_edge(from)),
                        SelectionId::tri_edge(mesh.tri_edge_from_edge(to)),
                    )
            });
            for e in grown {
                out.extend(tri_edge_ids(mesh, e));
            }
        }
        ElementType::Face => {
            let seeds = reference.iter().map(|id| TriangleId(id.geometry()));
            let grown = grow_to_connected_triangles(mesh, seeds, |from, to| {
                let to = SelectionId::Raw(to.0);
                predicate(to) && connected(SelectionId::Raw(from.0), to)
            });
            out.extend(grown.into_iter().map(|t| SelectionId::Raw(t.0)));
        }
    }
}

fn select_all_connected_polygroup(
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    reference: &GeometrySelection,
    predicate: &dyn Fn(SelectionId) -> bool,
    connected: &dyn Fn(SelectionId, SelectionId) -> bool,
    out: &mut GeometrySelection,
) {
    out.extend(reference.iter());
    let mut queue: VecDeque<SelectionId> = reference.iter().collect();
    while let Some(cur) = queue.pop_front() {
        let neighbors: Vec<SelectionId> = match out.element_type {
            ElementType::Vertex => topology
                .corner_neighbor_corners(cur.topology())
                .into_iter()
                .filter_map(|c| corner_selection_id(topology, c))
                .collect(),
            ElementType::Edge => topology
                .edge_neighbor_edges(cur.topology())
                .into_iter()
                .flatten()
                .filter_map(|ge| group_edge_selection_id(mesh, topology, ge))
                .collect(),
            ElementType::Face => topology
                .group_neighbor_groups(cur.topology())
                .iter()
                .filter_map(|&g| group_face_selection_id(topology, g))
                .collect(),
        };
        for nbr in neighbors {
            if !out.contains(nbr) && predicate(nbr) && connected(cur, nbr) {
                out.insert(nbr);
                queue.push_back(nbr);
            }
        }
    }
}

// ============================================================================
// Expand / contract
// ============================================================================

/// Grows (or shrinks) a selection by one ring per iteration.
///
/// Expansion adds every unselected neighbour connected (under `mode`) to a
/// selected element. Contraction removes every selected element with a
/// connected neighbour outside the selection. Triangle faces use the vertex
/// one-ring, triangle vertices and edges their mesh neighbours, and polygroup
/// kinds the group topology adjacency.
#[tracing::instrument(level = "debug", skip(mesh, topology, sel), fields(len = sel.len()))]
pub fn expand_contract_selection(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    sel: &GeometrySelection,
    iterations: u32,
    contract: bool,
    mode: ConnectionMode,
) -> Result<GeometrySelection> {
    let topology = match sel.topology_type {
        TopologyType::Triangle => None,
        TopologyType::Polygroup => Some(require_topology(topology, "polygroup expand/contract")?),
    };
    let connected = mode.predicate(mesh, sel);
    let mut current = canonical(mesh, sel);

    for _ in 0..iterations {
        let mut next = current.clone();
        let mut changed = false;
        for id in current.iter() {
            let neighbors = ring_neighbors(mesh, topology, &current, id);
            if contract {
                if neighbors.iter().any(|&n| !current.contains(n) && connected(id, n)) {
                    changed |= remove_element(mesh, &mut next, id);
                }
            } else {
                for n in neighbors {
                    if !next.contains(n) && connected(id, n) {
                        add_element(mesh, &mut next, n);
                        changed = true;
                    }
                }
            }
        }
        current = next;
        if !changed {
            break;
        }
    }
    Ok(current)
}

/// Triangle edge selections are normalised to hold both sides of each edge.
fn canonical(mesh: &TriangleMesh, sel: &GeometrySelection) -> GeometrySelection {
    if sel.topology_type != TopologyType::Triangle || sel.element_type != ElementType::Edge {
        return sel.clone();
    }
    let mut out = sel.empty_like();
    for e in sel.unique_edges(mesh) {
        out.extend(tri_edge_ids(mesh, e));
    }
    out
}

fn add_element(mesh: &TriangleMesh, sel: &mut GeometrySelection, id: SelectionId) {
    match (sel.topology_type, sel.element_type) {
        (TopologyType::Triangle, ElementType::Edge) => {
            if let Some(e) = selected_edge(mesh, id) {
                sel.extend(tri_edge_ids(mesh, e));
            }
        }
        _ => {
            sel.insert(id);
        }
    }
}

fn remove_element(mesh: &TriangleMesh, sel: &mut GeometrySelection, id: SelectionId) -> bool {
    match (sel.topology_type, sel.element_type) {
        (TopologyType::Triangle, ElementType::Edge) => {
            let Some(e) = selected_edge(mesh, id) else {
                return sel.remove(id);
            };
            let mut removed = false;
            for side in tri_edge_ids(mesh, e).collect::<Vec<_>>() {
                removed |= sel.remove(side);
            }
            removed
        }
        _ => sel.remove(id),
    }
}

fn ring_neighbors(
    mesh: &TriangleMesh,
    topology: Option<&GroupTopology>,
    sel: &GeometrySelection,
    id: SelectionId,
) -> Vec<SelectionId> {
    if let Some(topology) = topology {
        return match sel.element_type {
            ElementType::Vertex => topology
                .corner_neighbor_corners(id.topology())
                .into_iter()
                .filter_map(|c| corner_selection_id(topology, c))
                .collect(),
            ElementType::Edge => topology
                .edge_neighbor_edges(id.topology())
                .into_iter()
                .flatten()
                .filter_map(|ge| group_edge_selection_id(mesh, topology, ge))
                .collect(),
            ElementType::Face => topology
                .group_neighbor_groups(id.topology())
                .iter()
                .filter_map(|&g| group_face_selection_id(topology, g))
                .collect(),
        };
    }

    match sel.element_type {
        ElementType::Vertex => selected_vertex(mesh, id)
            .map(|v| mesh.vertex_neighbors(v).map(|n| SelectionId::Raw(n.0)).collect())
            .unwrap_or_default(),
        ElementType::Edge => {
            let Some(e) = selected_edge(mesh, id) else {
                return Vec::new();
            };
            let mut out = Vec::new();
            for v in mesh.edge_vertices(e) {
                for &other in mesh.vertex_edges(v) {
                    if other != e {
                        out.push(SelectionId::tri_edge(mesh.tri_edge_from_edge(other)));
                    }
                }
            }
            out
        }
        ElementType::Face => {
            let Some(t) = selected_triangle(mesh, id) else {
                return Vec::new();
            };
            let ring: BTreeSet<TriangleId> = mesh
                .triangle(t)
                .iter()
                .flat_map(|&v| mesh.vertex_triangles(v).iter().copied())
                .filter(|&u| u != t)
                .collect();
            ring.into_iter().map(|u| SelectionId::Raw(u.0)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    // 3x1 strip of quads; quad q owns triangles 2q and 2q + 1.
    fn strip(groups: Vec<u32>) -> TriangleMesh {
        let mut positions = Vec::new();
        for y in 0..2 {
            for x in 0..4 {
                positions.push(DVec3::new(x as f64, y as f64, 0.0));
            }
        }
        let mut tris = Vec::new();
        for x in 0..3u32 {
            tris.push([x, x + 1, x + 5]);
            tris.push([x, x + 5, x + 4]);
        }
        TriangleMesh::new(positions, &tris).unwrap().with_polygroups(groups).unwrap()
    }

    fn face_sel(ids: &[u32]) -> GeometrySelection {
        GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Triangle,
            ids.iter().map(|&t| SelectionId::Raw(t)),
        )
    }

    #[test]
    fn test_select_all_edges_adds_both_sides() {
        let mesh = strip(vec![0; 6]);
        let mut out = GeometrySelection::new(ElementType::Edge, TopologyType::Triangle);
        make_select_all(&mesh, None, |_| true, &mut out).unwrap();
        assert_eq!(out.unique_edges(&mesh).len(), mesh.edge_count());
        // 8 boundary sides plus two sides for each of the 5 interior edges.
        assert_eq!(out.len(), 18);
    }

    #[test]
    fn test_select_all_connected_stops_at_material_change() {
        let mesh = strip(vec![0; 6]).with_material_ids(vec![1, 1, 1, 1, 2, 2]).unwrap();
        let reference = face_sel(&[0]);
        let mut out = reference.empty_like();
        let connected = ConnectionMode::Material.predicate(&mesh, &reference);
        make_select_all_connected(&mesh, None, &reference, |_| true, connected, &mut out).unwrap();
        assert_eq!(out, face_sel(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_polygroup_face_flood() {
        let mesh = strip(vec![0, 0, 1, 1, 2, 2]);
        let topo = GroupTopology::new(&mesh);
        let reference = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Polygroup,
            [SelectionId::grouped(0, 0)],
        );
        let mut out = reference.empty_like();
        make_select_all_connected(&mesh, Some(&topo), &reference, |id| id.topology() != 2, |_, _| true, &mut out)
            .unwrap();
        let groups: Vec<u32> = out.iter().map(SelectionId::topology).collect();
        assert_eq!(groups, vec![0, 1]);
    }

    #[test]
    fn test_stale_topology_ids_have_no_neighbors() {
        let mesh = strip(vec![0, 0, 1, 1, 2, 2]);
        let topo = GroupTopology::new(&mesh);
        for element in [ElementType::Vertex, ElementType::Edge] {
            let reference = GeometrySelection::with_ids(element, TopologyType::Polygroup, [SelectionId::grouped(0, 999)]);
            let mut out = reference.empty_like();
            make_select_all_connected(&mesh, Some(&topo), &reference, |_| true, |_, _| true, &mut out).unwrap();
            assert_eq!(out, reference);

            let grown = expand_contract_selection(&mesh, Some(&topo), &reference, 1, false, ConnectionMode::Geometric);
            assert!(grown.is_ok());
        }
    }

    #[test]
    fn test_expand_then_contract_faces() {
        let mesh = strip(vec![0; 6]);
        let grown = expand_contract_selection(&mesh, None, &face_sel(&[0]), 1, false, ConnectionMode::Geometric).unwrap();
        // Triangle 0 = [0, 1, 5] touches every triangle of quads 0 and 1.
        assert_eq!(grown, face_sel(&[0, 1, 2, 3]));

        let shrunk = expand_contract_selection(&mesh, None, &grown, 1, true, ConnectionMode::Geometric).unwrap();
        // Quad 1 touches quad 2 through vertices 2 and 6; quad 0 does not.
        assert_eq!(shrunk, face_sel(&[0, 1]));
    }

    #[test]
    fn test_expand_respects_polygroups() {
        let mesh = strip(vec![0, 0, 1, 1, 1, 1]);
        let grown = expand_contract_selection(&mesh, None, &face_sel(&[1]), 3, false, ConnectionMode::Polygroup).unwrap();
        assert_eq!(grown, face_sel(&[0, 1]));
    }

    #[test]
    fn test_expand_edges_keeps_both_sides() {
        let mesh = strip(vec![0; 6]);
        let diagonal = mesh.find_edge(VertexId(0), VertexId(5)).unwrap();
        let sel = GeometrySelection::with_ids(
            ElementType::Edge,
            TopologyType::Triangle,
            [SelectionId::tri_edge(mesh.tri_edge_from_edge(diagonal))],
        );
        let grown = expand_contract_selection(&mesh, None, &sel, 1, false, ConnectionMode::Geometric).unwrap();
        let unique = grown.unique_edges(&mesh);
        let expected: usize = mesh.vertex_edges(VertexId(0)).len() + mesh.vertex_edges(VertexId(5)).len() - 1;
        assert_eq!(unique.len(), expected);
        for e in unique {
            assert_eq!(grown.iter().filter(|id| selected_edge(&mesh, *id) == Some(e)).count(), mesh.tri_edges_of_edge(e).count());
        }
    }
}
