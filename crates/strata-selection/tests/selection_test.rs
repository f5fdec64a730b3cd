//! Cross-module selection behaviour on small quad grids.

use std::collections::BTreeSet;

use proptest::prelude::*;

use strata_core::{DVec3, EdgeId, GroupTopology, TriEdge, TriangleId, TriangleMesh, VertexId};
use strata_selection::enumerate::{
    enumerate_polygroup_selection_elements, enumerate_polygroup_selection_triangles,
    enumerate_polygroup_selection_vertices, ElementMapping, SelectionElement,
};
use strata_selection::{
    combine_selection_in_place, convert_index_array_to_selection, convert_selection, convert_selection_to_index_array,
    enumerate_selection_edges, CombineMode, ConversionPolicy, ElementType, GeometrySelection, IndexArrayKind,
    SelectionId, TopologyType,
};

/// `n` x `n` unit quads, split along the diagonal from `i` to `i + n + 2`.
fn quad_grid(n: u32, groups: Vec<u32>) -> TriangleMesh {
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
    TriangleMesh::new(positions, &tris).unwrap().with_polygroups(groups).unwrap()
}

/// One polygroup per grid row.
fn row_groups(n: u32) -> Vec<u32> {
    (0..n).flat_map(|row| std::iter::repeat(row).take(2 * n as usize)).collect()
}

// ============================================================================
// Index arrays
// ============================================================================

#[test]
fn test_triangle_index_array_round_trip() {
    let mesh = quad_grid(3, row_groups(3));
    let mut sel = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
    convert_index_array_to_selection(
        &mesh,
        None,
        &[9, 5, 7],
        IndexArrayKind::Triangles,
        &mut sel,
        ConversionPolicy::Contain,
    )
    .unwrap();
    let back = convert_selection_to_index_array(&mesh, None, &sel, IndexArrayKind::Triangles).unwrap();
    assert_eq!(back, vec![5, 7, 9]);
}

#[test]
fn test_polygroup_index_array_to_group_faces() {
    let mesh = quad_grid(3, row_groups(3));
    let topo = GroupTopology::new(&mesh);
    let mut sel = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
    convert_index_array_to_selection(
        &mesh,
        Some(&topo),
        &[2],
        IndexArrayKind::Polygroups,
        &mut sel,
        ConversionPolicy::Expand,
    )
    .unwrap();
    assert_eq!(sel.len(), 1);
    assert_eq!(sel.iter().next().map(SelectionId::topology), Some(2));

    let triangles = convert_selection_to_index_array(&mesh, Some(&topo), &sel, IndexArrayKind::Triangles).unwrap();
    assert_eq!(triangles, (12..18).collect::<Vec<_>>());
}

// ============================================================================
// Polygroup edges
// ============================================================================

#[test]
fn test_interior_edge_enumerates_group_interior() {
    // Bottom row is group 0; its interior edges are the two diagonals and the
    // shared vertical edge 1-4.
    let mesh = quad_grid(2, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    let seed = TriEdge::new(TriangleId(0), 2);
    let sel = GeometrySelection::with_ids(
        ElementType::Edge,
        TopologyType::Polygroup,
        [SelectionId::grouped(seed.encode(), 0)],
    );

    let mut edges: BTreeSet<EdgeId> = BTreeSet::new();
    enumerate_selection_edges(&sel, &mesh, |e| {
        edges.insert(e);
    })
    .unwrap();

    let expected: BTreeSet<EdgeId> = [(0, 4), (1, 4), (1, 5)]
        .into_iter()
        .filter_map(|(a, b)| mesh.find_edge(VertexId(a), VertexId(b)))
        .collect();
    assert_eq!(expected.len(), 3);
    assert_eq!(edges, expected);
}

// ============================================================================
// Polygroup faces
// ============================================================================

#[test]
fn test_polygroup_face_covers_connected_group() {
    let mesh = quad_grid(3, row_groups(3));
    let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(8, 1)]);
    let mut triangles = Vec::new();
    enumerate_polygroup_selection_triangles(&sel, &mesh, |t| triangles.push(t.0)).unwrap();
    triangles.sort_unstable();
    assert_eq!(triangles, (6..12).collect::<Vec<_>>());
}

#[test]
fn test_polygroup_face_stays_in_connected_patch() {
    // Group 5 appears in two separate corners of the grid.
    let mut groups = vec![0; 8];
    groups[0] = 5;
    groups[1] = 5;
    groups[6] = 5;
    groups[7] = 5;
    let mesh = quad_grid(2, groups);
    let sel = GeometrySelection::with_ids(ElementType::Face, TopologyType::Polygroup, [SelectionId::grouped(0, 5)]);
    let mut triangles = Vec::new();
    enumerate_polygroup_selection_triangles(&sel, &mesh, |t| triangles.push(t.0)).unwrap();
    triangles.sort_unstable();
    assert_eq!(triangles, vec![0, 1]);
}

// ============================================================================
// Properties
// ============================================================================

fn vertex_selection(mesh: &TriangleMesh, mask: &[bool]) -> GeometrySelection {
    GeometrySelection::with_ids(
        ElementType::Vertex,
        TopologyType::Triangle,
        mesh.vertex_ids()
            .filter(|v| mask[v.index()])
            .map(|v| SelectionId::Raw(v.0)),
    )
}

fn edge_selection(mesh: &TriangleMesh, mask: &[bool]) -> GeometrySelection {
    GeometrySelection::with_ids(
        ElementType::Edge,
        TopologyType::Triangle,
        mesh.edge_ids()
            .filter(|e| mask[e.index()])
            .map(|e| SelectionId::tri_edge(mesh.tri_edge_from_edge(e))),
    )
}

fn face_selection(mesh: &TriangleMesh, mask: &[bool], topology: TopologyType) -> GeometrySelection {
    GeometrySelection::with_ids(
        ElementType::Face,
        topology,
        mesh.triangle_ids().filter(|t| mask[t.index()]).map(|t| match topology {
            TopologyType::Triangle => SelectionId::Raw(t.0),
            TopologyType::Polygroup => SelectionId::grouped(t.0, mesh.triangle_group(t)),
        }),
    )
}

fn contain_round_trip(mesh: &TriangleMesh, sel: &GeometrySelection, via: ElementType) -> GeometrySelection {
    let mut mid = GeometrySelection::new(via, TopologyType::Triangle);
    convert_selection(mesh, None, sel, &mut mid, ConversionPolicy::Contain).unwrap();
    let mut back = GeometrySelection::new(sel.element_type, sel.topology_type);
    convert_selection(mesh, None, &mid, &mut back, ConversionPolicy::Contain).unwrap();
    back
}

/// Triangles covered by a polygroup selection.
fn covered_triangles(mesh: &TriangleMesh, sel: &GeometrySelection) -> BTreeSet<TriangleId> {
    let mut out = BTreeSet::new();
    enumerate_polygroup_selection_triangles(sel, mesh, |t| {
        out.insert(t);
    })
    .unwrap();
    out
}

fn per_triangle(groups: &[u32]) -> Vec<u32> {
    groups.iter().flat_map(|&g| [g, g]).collect()
}

proptest! {
    /// Contained faces and edges never reach outside the vertices they came from.
    #[test]
    fn contain_round_trip_is_a_subset(mask in prop::collection::vec(any::<bool>(), 16)) {
        let mesh = quad_grid(3, row_groups(3));
        let sel = vertex_selection(&mesh, &mask);
        for via in [ElementType::Face, ElementType::Edge] {
            let back = contain_round_trip(&mesh, &sel, via);
            for id in back.iter() {
                prop_assert!(sel.contains(id), "{:?} via {:?} added {:?}", sel, via, id);
            }
        }
    }

    /// Edges and faces survive a trip down to their vertices and back.
    #[test]
    fn contain_round_trip_keeps_source(
        edge_mask in prop::collection::vec(any::<bool>(), 33),
        face_mask in prop::collection::vec(any::<bool>(), 18),
    ) {
        let mesh = quad_grid(3, row_groups(3));
        prop_assert_eq!(mesh.edge_count(), 33);
        for sel in [edge_selection(&mesh, &edge_mask), face_selection(&mesh, &face_mask, TopologyType::Triangle)] {
            let back = contain_round_trip(&mesh, &sel, ElementType::Vertex);
            for id in sel.iter() {
                prop_assert!(back.contains(id), "{:?} lost {:?}", sel.element_type, id);
            }
        }
    }

    /// Polygroup faces cover the same triangles after a trip through plain
    /// faces, and their vertices cover at least those triangles.
    #[test]
    fn polygroup_contain_round_trip(
        groups in prop::collection::vec(0u32..3, 9),
        mask in prop::collection::vec(any::<bool>(), 18),
    ) {
        let mesh = quad_grid(3, per_triangle(&groups));
        let topo = GroupTopology::new(&mesh);
        let sel = face_selection(&mesh, &mask, TopologyType::Polygroup);
        let covered = covered_triangles(&mesh, &sel);

        let mut faces = GeometrySelection::new(ElementType::Face, TopologyType::Triangle);
        convert_selection(&mesh, Some(&topo), &sel, &mut faces, ConversionPolicy::Contain).unwrap();
        let mut back = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
        convert_selection(&mesh, Some(&topo), &faces, &mut back, ConversionPolicy::Contain).unwrap();
        prop_assert_eq!(&covered_triangles(&mesh, &back), &covered);

        let mut vertices = GeometrySelection::new(ElementType::Vertex, TopologyType::Triangle);
        convert_selection(&mesh, Some(&topo), &sel, &mut vertices, ConversionPolicy::Contain).unwrap();
        let mut regrown = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
        convert_selection(&mesh, Some(&topo), &vertices, &mut regrown, ConversionPolicy::Contain).unwrap();
        prop_assert!(covered.is_subset(&covered_triangles(&mesh, &regrown)));
    }

    /// Vertices, triangles and drawable elements of a polygroup face all come
    /// from the same flood of the seed's group.
    #[test]
    fn polygroup_face_enumerations_agree(
        groups in prop::collection::vec(0u32..3, 9),
        seed in 0u32..18,
    ) {
        let mesh = quad_grid(3, per_triangle(&groups));
        let topo = GroupTopology::new(&mesh);
        let sel = face_selection(&mesh, &(0..18).map(|t| t == seed).collect::<Vec<_>>(), TopologyType::Polygroup);
        let triangles = covered_triangles(&mesh, &sel);

        let mut vertices = BTreeSet::new();
        enumerate_polygroup_selection_vertices(&sel, &mesh, &topo, None, |v, _| {
            vertices.insert(v);
        })
        .unwrap();
        let expected: BTreeSet<VertexId> = triangles.iter().flat_map(|&t| mesh.triangle(t)).collect();
        prop_assert_eq!(vertices, expected);

        let mut drawn = BTreeSet::new();
        enumerate_polygroup_selection_elements(&sel, &mesh, &topo, None, ElementMapping::default(), |el| {
            if let SelectionElement::Triangle(t, _) = el {
                drawn.insert(t);
            }
        })
        .unwrap();
        prop_assert_eq!(drawn, triangles);
    }

    /// Subtracting a selection from itself leaves nothing.
    #[test]
    fn subtract_self_is_empty(mask in prop::collection::vec(any::<bool>(), 16)) {
        let mesh = quad_grid(3, row_groups(3));
        let mut edges = GeometrySelection::new(ElementType::Edge, TopologyType::Triangle);
        convert_selection(&mesh, None, &vertex_selection(&mesh, &mask), &mut edges, ConversionPolicy::Expand).unwrap();
        let copy = edges.clone();
        combine_selection_in_place(&mut edges, &copy, CombineMode::Subtract).unwrap();
        prop_assert!(edges.is_empty());
    }

    /// A polygroup face seeds a patch of its own group that includes the seed.
    #[test]
    fn polygroup_face_stays_in_group(
        groups in prop::collection::vec(0u32..3, 9),
        seed in 0u32..18,
    ) {
        let mesh = quad_grid(3, per_triangle(&groups));
        let group = mesh.triangle_group(TriangleId(seed));
        let sel = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Polygroup,
            [SelectionId::grouped(seed, group)],
        );
        let mut triangles = Vec::new();
        enumerate_polygroup_selection_triangles(&sel, &mesh, |t| triangles.push(t)).unwrap();
        prop_assert!(triangles.contains(&TriangleId(seed)));
        for t in triangles {
            prop_assert_eq!(mesh.triangle_group(t), group);
        }
    }
}
