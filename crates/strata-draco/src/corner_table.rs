//! Corner table: the half-edge-like connectivity Draco's edgebreaker coder and
//! mesh prediction schemes walk.
//!
//! Corner `c` belongs to face `c / 3`. The opposite of `c` is the corner facing
//! the same edge in the neighbouring face. Swinging left visits the corners of
//! a vertex counter-clockwise. Missing links are [`INVALID`].

pub const INVALID: u32 = u32::MAX;

pub fn next(corner: u32) -> u32 {
    if corner == INVALID {
        INVALID
    } else if corner % 3 == 2 {
        corner - 2
    } else {
        corner + 1
    }
}

pub fn previous(corner: u32) -> u32 {
    if corner == INVALID {
        INVALID
    } else if corner % 3 == 0 {
        corner + 2
    } else {
        corner - 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct CornerTable {
    corner_to_vertex: Vec<u32>,
    opposite_corners: Vec<u32>,
    vertex_corners: Vec<u32>,
}

impl CornerTable {
    /// Table for `num_faces` faces with every corner unmapped and no vertices.
    pub fn with_faces(num_faces: usize) -> Self {
        Self {
            corner_to_vertex: vec![INVALID; num_faces * 3],
            opposite_corners: vec![INVALID; num_faces * 3],
            vertex_corners: Vec::new(),
        }
    }

    pub fn num_faces(&self) -> usize {
        self.corner_to_vertex.len() / 3
    }

    pub fn num_corners(&self) -> usize {
        self.corner_to_vertex.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_corners.len()
    }

    pub fn vertex(&self, corner: u32) -> u32 {
        self.corner_to_vertex
            .get(corner as usize)
            .copied()
            .unwrap_or(INVALID)
    }

    pub fn opposite(&self, corner: u32) -> u32 {
        self.opposite_corners
            .get(corner as usize)
            .copied()
            .unwrap_or(INVALID)
    }

    pub fn left_most_corner(&self, vertex: u32) -> u32 {
        self.vertex_corners
            .get(vertex as usize)
            .copied()
            .unwrap_or(INVALID)
    }

    pub fn swing_left(&self, corner: u32) -> u32 {
        next(self.opposite(next(corner)))
    }

    pub fn swing_right(&self, corner: u32) -> u32 {
        previous(self.opposite(previous(corner)))
    }

    pub fn left_corner(&self, corner: u32) -> u32 {
        self.opposite(previous(corner))
    }

    pub fn right_corner(&self, corner: u32) -> u32 {
        self.opposite(next(corner))
    }

    pub fn is_on_boundary(&self, vertex: u32) -> bool {
        let corner = self.left_most_corner(vertex);
        corner == INVALID || self.swing_left(corner) == INVALID
    }

    /// Corners around the vertex of `start`: counter-clockwise first, then
    /// clockwise from `start` when a boundary cuts the ring.
    pub fn corners_around(&self, start: u32) -> Vec<u32> {
        let mut ring = Vec::new();
        if start == INVALID {
            return ring;
        }
        ring.push(start);
        let mut corner = self.swing_left(start);
        while corner != INVALID && corner != start && ring.len() <= self.num_corners() {
            ring.push(corner);
            corner = self.swing_left(corner);
        }
        if corner == INVALID {
            corner = self.swing_right(start);
            while corner != INVALID && ring.len() <= self.num_corners() {
                ring.push(corner);
                corner = self.swing_right(corner);
            }
        }
        ring
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub fn add_new_vertex(&mut self) -> u32 {
        self.vertex_corners.push(INVALID);
        (self.vertex_corners.len() - 1) as u32
    }

    pub fn map_corner_to_vertex(&mut self, corner: u32, vertex: u32) {
        self.corner_to_vertex[corner as usize] = vertex;
    }

    pub fn set_left_most_corner(&mut self, vertex: u32, corner: u32) {
        self.vertex_corners[vertex as usize] = corner;
    }

    pub fn make_vertex_isolated(&mut self, vertex: u32) {
        self.vertex_corners[vertex as usize] = INVALID;
    }

    pub fn set_opposite_pair(&mut self, a: u32, b: u32) {
        self.opposite_corners[a as usize] = b;
        self.opposite_corners[b as usize] = a;
    }

    /// Connectivity of one attribute whose values are discontinuous across
    /// `seam_corners`. Seam edges are cut, and every fan of corners between two
    /// seams around a base vertex becomes its own vertex.
    pub fn with_seams(base: &CornerTable, seam_corners: &[u32]) -> AttributeConnectivity {
        let mut on_seam_edge = vec![false; base.num_corners()];
        let mut vertex_on_seam = vec![false; base.num_vertices()];
        let mut mark_vertex = |vertex: u32| {
            if let Some(flag) = vertex_on_seam.get_mut(vertex as usize) {
                *flag = true;
            }
        };
        for &corner in seam_corners {
            if corner as usize >= on_seam_edge.len() {
                continue;
            }
            on_seam_edge[corner as usize] = true;
            mark_vertex(base.vertex(next(corner)));
            mark_vertex(base.vertex(previous(corner)));
            let opposite = base.opposite(corner);
            if opposite != INVALID {
                on_seam_edge[opposite as usize] = true;
                mark_vertex(base.vertex(next(opposite)));
                mark_vertex(base.vertex(previous(opposite)));
            }
        }

        let mut table = CornerTable {
            corner_to_vertex: vec![INVALID; base.num_corners()],
            opposite_corners: base
                .opposite_corners
                .iter()
                .zip(&on_seam_edge)
                .map(|(&opposite, &seam)| if seam { INVALID } else { opposite })
                .collect(),
            vertex_corners: Vec::with_capacity(base.num_vertices()),
        };

        let limit = base.num_corners();
        for v in 0..base.num_vertices() {
            let c = base.left_most_corner(v as u32);
            if c == INVALID {
                continue;
            }
            let mut vertex_id = table.add_new_vertex();
            let mut first = c;
            if vertex_on_seam[v] {
                let mut steps = 0;
                let mut act = table.swing_left(first);
                while act != INVALID && steps <= limit {
                    first = act;
                    act = table.swing_left(act);
                    steps += 1;
                }
            }
            table.corner_to_vertex[first as usize] = vertex_id;
            table.vertex_corners[vertex_id as usize] = first;

            let mut steps = 0;
            let mut act = base.swing_right(first);
            while act != INVALID && act != first && steps <= limit {
                if on_seam_edge[next(act) as usize] {
                    vertex_id = table.add_new_vertex();
                    table.vertex_corners[vertex_id as usize] = act;
                }
                table.corner_to_vertex[act as usize] = vertex_id;
                act = base.swing_right(act);
                steps += 1;
            }
        }

        AttributeConnectivity {
            table,
            vertex_on_seam,
        }
    }
}

/// Seam-aware connectivity of one non-position attribute.
#[derive(Debug, Clone, Default)]
pub struct AttributeConnectivity {
    pub table: CornerTable,
    /// Indexed by base vertex.
    pub vertex_on_seam: Vec<bool>,
}

impl AttributeConnectivity {
    pub fn is_corner_on_seam(&self, base: &CornerTable, corner: u32) -> bool {
        self.vertex_on_seam
            .get(base.vertex(corner) as usize)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles (0, 1, 2) and (2, 1, 3) sharing edge 1-2.
    fn quad() -> CornerTable {
        let mut table = CornerTable::with_faces(2);
        for _ in 0..4 {
            table.add_new_vertex();
        }
        for (corner, vertex) in [0, 1, 2, 2, 1, 3].into_iter().enumerate() {
            table.map_corner_to_vertex(corner as u32, vertex);
        }
        table.set_opposite_pair(0, 5);
        table.set_left_most_corner(0, 0);
        table.set_left_most_corner(1, 1);
        table.set_left_most_corner(2, 3);
        table.set_left_most_corner(3, 5);
        table
    }

    #[test]
    fn test_swing_walks_shared_vertex() {
        let table = quad();
        assert_eq!(table.swing_left(4), 1);
        assert_eq!(table.swing_right(1), 4);
        assert_eq!(table.swing_left(1), INVALID);
        assert_eq!(table.corners_around(4), vec![4, 1]);
        assert!(table.is_on_boundary(1));
    }

    #[test]
    fn test_seam_splits_shared_vertices() {
        let base = quad();
        let split = CornerTable::with_seams(&base, &[0]);
        assert_eq!(split.table.num_vertices(), 6);
        assert_eq!(split.table.opposite(0), INVALID);
        assert_ne!(split.table.vertex(1), split.table.vertex(4));
        assert!(split.is_corner_on_seam(&base, 1));
        assert!(!split.is_corner_on_seam(&base, 0));

        let joined = CornerTable::with_seams(&base, &[]);
        assert_eq!(joined.table.num_vertices(), 4);
        assert_eq!(joined.table.vertex(1), joined.table.vertex(4));
    }
}
