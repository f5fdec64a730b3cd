use glam::{DMat3, DQuat, DVec3};
use strata_core::TriangleMesh;

use crate::enumerate::{selected_edge, selected_triangle, selected_vertex};
use crate::error::Result;
use crate::selection::{ElementType, GeometrySelection, TopologyType};

const ALIGNED_WITH_Z: f64 = 1e-4;

/// Local coordinate frame; the rotation maps +Z onto the frame normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame3 {
    pub origin: DVec3,
    pub rotation: DQuat,
}

impl Default for Frame3 {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
        }
    }
}

impl Frame3 {
    pub fn x(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    pub fn y(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    pub fn z(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }

    /// Frame at `origin` with Z along `normal`. When the normal is (nearly)
    /// world +Z the frame is world aligned; otherwise Y lies in the world XY plane.
    pub fn from_normal(origin: DVec3, normal: DVec3) -> Self {
        let n = normal.normalize_or_zero();
        if n == DVec3::ZERO || 1.0 - n.dot(DVec3::Z) < ALIGNED_WITH_Z {
            return Self {
                origin,
                rotation: DQuat::IDENTITY,
            };
        }
        let y = n.cross(DVec3::Z).normalize();
        let x = y.cross(n);
        Self {
            origin,
            rotation: DQuat::from_mat3(&DMat3::from_cols(x, y, n)),
        }
    }
}

/// Frame at the weighted centre of a triangle-topology selection.
///
/// Faces are weighted by area (degenerate faces are skipped), edges and
/// vertices count once each. An empty selection yields the default frame.
pub fn triangle_selection_frame(sel: &GeometrySelection, mesh: &TriangleMesh) -> Result<Frame3> {
    sel.expect_topology(TopologyType::Triangle)?;

    let mut origin = DVec3::ZERO;
    let mut normal = DVec3::ZERO;
    let mut weight = 0.0;
    for id in sel.iter() {
        match sel.element_type {
            ElementType::Face => {
                let Some(t) = selected_triangle(mesh, id) else {
                    continue;
                };
                let n = mesh.triangle_normal(t);
                if n.length_squared() > 0.9 {
                    let area = mesh.triangle_area(t).max(1e-6);
                    origin += area * mesh.triangle_centroid(t);
                    normal += area * n;
                    weight += area;
                }
            }
            ElementType::Edge => {
                if let Some(e) = selected_edge(mesh, id) {
                    origin += mesh.edge_midpoint(e);
                    normal += mesh.edge_normal(e);
                    weight += 1.0;
                }
            }
            ElementType::Vertex => {
                if let Some(v) = selected_vertex(mesh, id) {
                    origin += mesh.vertex(v);
                    normal += mesh.vertex_normal(v);
                    weight += 1.0;
                }
            }
        }
    }

    if weight <= 0.0 {
        return Ok(Frame3::default());
    }
    Ok(Frame3::from_normal(origin / weight, normal))
}
