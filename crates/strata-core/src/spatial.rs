//! Bounding-volume hierarchy over mesh triangles for nearest-hit ray queries.

use glam::DVec3;

use crate::geometry_indices::TriangleId;
use crate::mesh::TriangleMesh;

const LEAF_SIZE: usize = 4;
const HIT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Creates a ray with a normalized direction.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub triangle: TriangleId,
    /// Ray parameter of the hit; a distance when the direction is unit length.
    pub distance: f64,
    pub barycentric: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    pub fn include(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Slab test. Returns the entry parameter when the ray hits within `max_t`.
    pub fn intersect_ray(&self, ray: &Ray, max_t: f64) -> Option<f64> {
        let mut t_min = 0.0f64;
        let mut t_max = max_t;
        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.direction[axis];
            if d.abs() < HIT_EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf { bounds: Aabb, start: usize, len: usize },
    Interior { bounds: Aabb, left: usize, right: usize },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Interior { bounds, .. } => bounds,
        }
    }
}

/// Static triangle BVH. It stores no reference to the mesh, so queries take the
/// mesh it was built from.
#[derive(Debug, Clone, Default)]
pub struct MeshAabbTree {
    nodes: Vec<BvhNode>,
    triangles: Vec<TriangleId>,
}

impl MeshAabbTree {
    pub fn build(mesh: &TriangleMesh) -> Self {
        let mut triangles: Vec<TriangleId> = mesh.triangle_ids().collect();
        let centroids: Vec<DVec3> = mesh.triangle_ids().map(|t| mesh.triangle_centroid(t)).collect();
        let mut tree = Self {
            nodes: Vec::new(),
            triangles: Vec::new(),
        };
        if !triangles.is_empty() {
            let len = triangles.len();
            tree.build_node(mesh, &centroids, &mut triangles, 0, len);
        }
        tree.triangles = triangles;
        tree
    }

    fn build_node(
        &mut self,
        mesh: &TriangleMesh,
        centroids: &[DVec3],
        tris: &mut [TriangleId],
        start: usize,
        len: usize,
    ) -> usize {
        let slice = &mut tris[start..start + len];
        let mut bounds = Aabb::EMPTY;
        let mut centroid_bounds = Aabb::EMPTY;
        for &t in slice.iter() {
            for p in mesh.triangle_positions(t) {
                bounds.include(p);
            }
            centroid_bounds.include(centroids[t.index()]);
        }

        let slot = self.nodes.len();
        if len <= LEAF_SIZE {
            self.nodes.push(BvhNode::Leaf { bounds, start, len });
            return slot;
        }

        let extent = centroid_bounds.max - centroid_bounds.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        slice.sort_by(|a, b| {
            centroids[a.index()][axis].total_cmp(&centroids[b.index()][axis])
        });

        // Placeholder, patched once both children exist.
        self.nodes.push(BvhNode::Leaf { bounds, start, len });
        let half = len / 2;
        let left = self.build_node(mesh, centroids, tris, start, half);
        let right = self.build_node(mesh, centroids, tris, start + half, len - half);
        self.nodes[slot] = BvhNode::Interior { bounds, left, right };
        slot
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| *n.bounds())
    }

    /// Nearest triangle hit by `ray` among triangles accepted by `filter`.
    pub fn find_nearest_hit<F>(&self, mesh: &TriangleMesh, ray: &Ray, filter: F) -> Option<RayHit>
    where
        F: Fn(TriangleId) -> bool,
    {
        let mut best: Option<RayHit> = None;
        if self.nodes.is_empty() {
            return None;
        }
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            let max_t = best.map_or(f64::INFINITY, |h| h.distance);
            if self.nodes[node].bounds().intersect_ray(ray, max_t).is_none() {
                continue;
            }
            match self.nodes[node] {
                BvhNode::Leaf { start, len, .. } => {
                    for &t in &self.triangles[start..start + len] {
                        if !filter(t) {
                            continue;
                        }
                        if let Some((dist, bary)) = intersect_triangle(ray, mesh.triangle_positions(t)) {
                            if best.map_or(true, |h| dist < h.distance) {
                                best = Some(RayHit {
                                    triangle: t,
                                    distance: dist,
                                    barycentric: bary,
                                });
                            }
                        }
                    }
                }
                BvhNode::Interior { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        best
    }
}

/// Two-sided Möller-Trumbore. Returns the ray parameter and barycentric coordinates.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: [DVec3; 3]) -> Option<(f64, DVec3)> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < HIT_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some((t, DVec3::new(1.0 - u - v, u, v)))
}

#[cfg(test)]
mod tests {
    use super::*;

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
        TriangleMesh::new(positions, &tris).unwrap()
    }

    #[test]
    fn test_hit_matches_brute_force() {
        let mesh = grid(6);
        let tree = MeshAabbTree::build(&mesh);
        let ray = Ray::new(DVec3::new(2.3, 4.6, 5.0), DVec3::new(0.0, 0.0, -1.0));
        let hit = tree.find_nearest_hit(&mesh, &ray, |_| true).unwrap();
        let brute = mesh
            .triangle_ids()
            .find(|&t| intersect_triangle(&ray, mesh.triangle_positions(t)).is_some())
            .unwrap();
        assert_eq!(hit.triangle, brute);
        assert!((hit.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_and_miss() {
        let mesh = grid(2);
        let tree = MeshAabbTree::build(&mesh);
        let ray = Ray::new(DVec3::new(0.5, 0.2, 1.0), DVec3::NEG_Z);
        assert!(tree.find_nearest_hit(&mesh, &ray, |_| false).is_none());
        let away = Ray::new(DVec3::new(0.5, 0.2, 1.0), DVec3::Z);
        assert!(tree.find_nearest_hit(&mesh, &away, |_| true).is_none());
    }
}
