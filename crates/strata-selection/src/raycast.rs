//! Picking: apply a ray hit to a selection.

use glam::DVec3;
use strata_core::{GroupTopology, MeshAabbTree, Ray, RayHit, TriEdge, TriangleMesh};

use crate::error::Result;
use crate::selection::{ChangeType, ElementType, GeometrySelection, SelectionDelta, SelectionId, TopologyType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionUpdateConfig {
    pub change_type: ChangeType,
    /// Accept triangles facing away from the ray.
    pub hit_back_faces: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionUpdateResult {
    pub modified: bool,
    /// No element was hit; the selection is untouched.
    pub missed: bool,
    pub delta: SelectionDelta,
}

impl SelectionUpdateResult {
    fn miss() -> Self {
        Self {
            missed: true,
            ..Default::default()
        }
    }
}

/// Applies `ids` to `sel` according to `change`, recording the effect in
/// `delta`. Returns true if the selection changed.
///
/// `Replace` only records the difference between the old and new contents.
pub fn update_selection_with_new_elements(
    sel: &mut GeometrySelection,
    change: ChangeType,
    ids: &[SelectionId],
    delta: &mut SelectionDelta,
) -> bool {
    let mut modified = false;
    match change {
        ChangeType::Replace => {
            let stale: Vec<SelectionId> = sel
                .iter()
                .filter(|&kept| !ids.iter().any(|&id| same_element(sel.topology_type, kept, id)))
                .collect();
            for id in stale {
                modified |= sel.deselect(id, delta);
            }
            for &id in ids {
                modified |= sel.select(id, delta);
            }
        }
        ChangeType::Add => {
            for &id in ids {
                modified |= sel.select(id, delta);
            }
        }
        ChangeType::Remove => {
            for &id in ids {
                modified |= sel.deselect(id, delta);
            }
        }
    }
    modified
}

fn same_element(topology: TopologyType, a: SelectionId, b: SelectionId) -> bool {
    match topology {
        TopologyType::Triangle => a == b,
        TopologyType::Polygroup => a.topology() == b.topology(),
    }
}

fn nearest_hit(mesh: &TriangleMesh, tree: &MeshAabbTree, ray: &Ray, hit_back_faces: bool) -> Option<RayHit> {
    tree.find_nearest_hit(mesh, ray, |t| {
        hit_back_faces || mesh.triangle_normal(t).dot(ray.direction) < 0.0
    })
}

fn segment_distance_squared(a: DVec3, b: DVec3, p: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f64::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Index in `0..3` minimising `distance`, among slots accepted by `allowed`.
fn nearest_slot(allowed: impl Fn(usize) -> bool, distance: impl Fn(usize) -> f64) -> Option<usize> {
    (0..3)
        .filter(|&k| allowed(k))
        .map(|k| (k, distance(k)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
}

/// Casts `ray` against `mesh` and applies the hit element to a triangle
/// selection. Vertex and edge selections snap to the hit triangle's nearest
/// vertex or side.
#[tracing::instrument(level = "trace", skip_all)]
pub fn update_triangle_selection_via_raycast(
    mesh: &TriangleMesh,
    tree: &MeshAabbTree,
    sel: &mut GeometrySelection,
    ray: &Ray,
    config: SelectionUpdateConfig,
) -> Result<SelectionUpdateResult> {
    sel.expect_topology(TopologyType::Triangle)?;
    let Some(hit) = nearest_hit(mesh, tree, ray, config.hit_back_faces) else {
        return Ok(SelectionUpdateResult::miss());
    };
    let t = hit.triangle;
    let point = ray.point_at(hit.distance);
    let verts = mesh.triangle(t);
    let positions = mesh.triangle_positions(t);

    let id = match sel.element_type {
        ElementType::Face => Some(SelectionId::Raw(t.0)),
        ElementType::Vertex => nearest_slot(|_| true, |k| positions[k].distance_squared(point))
            .map(|k| SelectionId::Raw(verts[k].0)),
        ElementType::Edge => nearest_slot(
            |_| true,
            |k| segment_distance_squared(positions[k], positions[(k + 1) % 3], point),
        )
        .map(|k| SelectionId::tri_edge(TriEdge::new(t, k as u8))),
    };
    Ok(apply_hit(sel, config.change_type, id))
}

/// Polygroup counterpart of [`update_triangle_selection_via_raycast`]. Vertex
/// picks only consider corners and edge picks only group edges; a hit triangle
/// without either counts as a miss.
#[tracing::instrument(level = "trace", skip_all)]
pub fn update_group_selection_via_raycast(
    mesh: &TriangleMesh,
    topology: &GroupTopology,
    tree: &MeshAabbTree,
    sel: &mut GeometrySelection,
    ray: &Ray,
    config: SelectionUpdateConfig,
) -> Result<SelectionUpdateResult> {
    sel.expect_topology(TopologyType::Polygroup)?;
    let Some(hit) = nearest_hit(mesh, tree, ray, config.hit_back_faces) else {
        return Ok(SelectionUpdateResult::miss());
    };
    let t = hit.triangle;
    let point = ray.point_at(hit.distance);
    let verts = mesh.triangle(t);
    let positions = mesh.triangle_positions(t);

    let id = match sel.element_type {
        ElementType::Face => Some(SelectionId::grouped(t.0, topology.group_id(t))),
        ElementType::Vertex => nearest_slot(
            |k| topology.is_corner_vertex(verts[k]),
            |k| positions[k].distance_squared(point),
        )
        .and_then(|k| {
            let corner = topology.corner_for_vertex(verts[k])?;
            Some(SelectionId::grouped(verts[k].0, corner))
        }),
        ElementType::Edge => {
            let group_edge = |k: usize| {
                let edge = TriEdge::new(t, k as u8);
                mesh.edge_from_tri_edge(edge)
                    .and_then(|e| topology.find_group_edge(e))
                    .map(|ge| SelectionId::grouped(edge.encode(), ge))
            };
            nearest_slot(
                |k| group_edge(k).is_some(),
                |k| segment_distance_squared(positions[k], positions[(k + 1) % 3], point),
            )
            .and_then(group_edge)
        }
    };
    Ok(apply_hit(sel, config.change_type, id))
}

fn apply_hit(sel: &mut GeometrySelection, change: ChangeType, id: Option<SelectionId>) -> SelectionUpdateResult {
    let Some(id) = id else {
        return SelectionUpdateResult::miss();
    };
    let mut delta = SelectionDelta::default();
    let modified = update_selection_with_new_elements(sel, change, &[id], &mut delta);
    tracing::trace!(?id, modified, "applied ray hit");
    SelectionUpdateResult {
        modified,
        missed: false,
        delta,
    }
}
