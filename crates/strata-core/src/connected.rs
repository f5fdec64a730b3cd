//! Breadth-first growth of element sets over mesh adjacency.
//!
//! Each function starts from a seed list and adds neighbours for which the
//! `can_grow(from, to)` predicate holds. Results are in visit order with seeds
//! first, and contain no duplicates. Invalid seeds are skipped.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use crate::geometry_indices::{EdgeId, TriangleId, VertexId};
use crate::mesh::TriangleMesh;

fn grow<T, S, N, P>(seeds: S, mut neighbors: N, mut can_grow: P) -> Vec<T>
where
    T: Copy + Eq + Hash,
    S: IntoIterator<Item = T>,
    N: FnMut(T, &mut Vec<T>),
    P: FnMut(T, T) -> bool,
{
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    for seed in seeds {
        if visited.insert(seed) {
            order.push(seed);
            queue.push_back(seed);
        }
    }

    let mut scratch = Vec::new();
    while let Some(cur) = queue.pop_front() {
        scratch.clear();
        neighbors(cur, &mut scratch);
        for &nbr in &scratch {
            if !visited.contains(&nbr) && can_grow(cur, nbr) {
                visited.insert(nbr);
                order.push(nbr);
                queue.push_back(nbr);
            }
        }
    }
    order
}

/// Grows across shared edges.
pub fn grow_to_connected_triangles<S, P>(mesh: &TriangleMesh, seeds: S, can_grow: P) -> Vec<TriangleId>
where
    S: IntoIterator<Item = TriangleId>,
    P: FnMut(TriangleId, TriangleId) -> bool,
{
    let seeds: Vec<TriangleId> = seeds.into_iter().filter(|&t| mesh.is_triangle(t)).collect();
    grow(
        seeds,
        |t, out| out.extend(mesh.triangle_neighbors(t).into_iter().flatten()),
        can_grow,
    )
}

/// Grows across edges to adjacent vertices.
pub fn grow_to_connected_vertices<S, P>(mesh: &TriangleMesh, seeds: S, can_grow: P) -> Vec<VertexId>
where
    S: IntoIterator<Item = VertexId>,
    P: FnMut(VertexId, VertexId) -> bool,
{
    let seeds: Vec<VertexId> = seeds.into_iter().filter(|&v| mesh.is_vertex(v)).collect();
    grow(seeds, |v, out| out.extend(mesh.vertex_neighbors(v)), can_grow)
}

/// Grows to edges sharing a vertex.
pub fn grow_to_connected_edges<S, P>(mesh: &TriangleMesh, seeds: S, can_grow: P) -> Vec<EdgeId>
where
    S: IntoIterator<Item = EdgeId>,
    P: FnMut(EdgeId, EdgeId) -> bool,
{
    let seeds: Vec<EdgeId> = seeds.into_iter().filter(|&e| mesh.is_edge(e)).collect();
    grow(
        seeds,
        |e, out| {
            for v in mesh.edge_vertices(e) {
                out.extend(mesh.vertex_edges(v).iter().copied().filter(|&x| x != e));
            }
        },
        can_grow,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    // Two separate quads: triangles 0,1 and 2,3.
    fn two_islands() -> TriangleMesh {
        let mut positions = Vec::new();
        for x in [0.0, 5.0] {
            positions.push(DVec3::new(x, 0.0, 0.0));
            positions.push(DVec3::new(x + 1.0, 0.0, 0.0));
            positions.push(DVec3::new(x + 1.0, 1.0, 0.0));
            positions.push(DVec3::new(x, 1.0, 0.0));
        }
        TriangleMesh::new(positions, &[[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]]).unwrap()
    }

    #[test]
    fn test_triangle_growth_stays_on_island() {
        let mesh = two_islands();
        let grown = grow_to_connected_triangles(&mesh, [TriangleId(1)], |_, _| true);
        assert_eq!(grown, vec![TriangleId(1), TriangleId(0)]);
    }

    #[test]
    fn test_predicate_blocks_growth() {
        let mesh = two_islands();
        let grown = grow_to_connected_triangles(&mesh, [TriangleId(0)], |_, _| false);
        assert_eq!(grown, vec![TriangleId(0)]);
    }

    #[test]
    fn test_vertex_and_edge_growth() {
        let mesh = two_islands();
        let verts = grow_to_connected_vertices(&mesh, [VertexId(5)], |_, _| true);
        assert_eq!(verts.len(), 4);
        assert!(verts.iter().all(|v| v.0 >= 4));

        let edges = grow_to_connected_edges(&mesh, [EdgeId(0)], |_, _| true);
        assert_eq!(edges.len(), 5);
    }

    #[test]
    fn test_invalid_seeds_are_skipped() {
        let mesh = two_islands();
        assert!(grow_to_connected_triangles(&mesh, [TriangleId(99)], |_, _| true).is_empty());
    }
}
