//! Attribute value ordering for edgebreaker meshes.
//!
//! Values of a vertex attribute are stored in the order a mesh traversal first
//! reaches each vertex. Replaying the same traversal recovers which vertex (and
//! therefore which points) every decoded value belongs to.

use crate::corner_table::{next, previous, CornerTable, INVALID};
use crate::error::{corrupt, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMethod {
    DepthFirst,
    MaxPredictionDegree,
}

impl TraversalMethod {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::DepthFirst),
            1 => Some(Self::MaxPredictionDegree),
            _ => None,
        }
    }
}

/// Value order produced by a traversal.
#[derive(Debug, Clone, Default)]
pub struct EncodingData {
    /// Corner through which each value was first reached.
    pub value_to_corner: Vec<u32>,
    /// Value index of each vertex; unvisited vertices read as zero.
    pub vertex_to_value: Vec<u32>,
    /// Point owning each value.
    pub point_ids: Vec<u32>,
}

struct Visitor<'a> {
    table: &'a CornerTable,
    faces: &'a [[u32; 3]],
    face_visited: Vec<bool>,
    vertex_visited: Vec<bool>,
    data: EncodingData,
}

impl<'a> Visitor<'a> {
    fn new(table: &'a CornerTable, faces: &'a [[u32; 3]], vertex_slots: usize) -> Self {
        Self {
            table,
            faces,
            face_visited: vec![false; table.num_faces()],
            vertex_visited: vec![false; table.num_vertices()],
            data: EncodingData {
                value_to_corner: Vec::with_capacity(table.num_vertices()),
                vertex_to_value: vec![0; vertex_slots.max(table.num_vertices())],
                point_ids: Vec::with_capacity(table.num_vertices()),
            },
        }
    }

    fn is_face_visited(&self, corner: u32) -> bool {
        corner == INVALID
            || self
                .face_visited
                .get((corner / 3) as usize)
                .copied()
                .unwrap_or(true)
    }

    fn is_vertex_visited(&self, vertex: u32) -> bool {
        self.vertex_visited
            .get(vertex as usize)
            .copied()
            .unwrap_or(true)
    }

    fn visit_face(&mut self, corner: u32) {
        self.face_visited[(corner / 3) as usize] = true;
    }

    /// Marks the vertex at `corner` and assigns it the next value index.
    fn visit_vertex(&mut self, corner: u32) -> Result<()> {
        let vertex = self.table.vertex(corner);
        if vertex == INVALID {
            return corrupt("traversal reached an unmapped corner");
        }
        self.vertex_visited[vertex as usize] = true;
        let point = self.faces[(corner / 3) as usize][(corner % 3) as usize];
        self.data.point_ids.push(point);
        self.data.value_to_corner.push(corner);
        self.data.vertex_to_value[vertex as usize] = (self.data.value_to_corner.len() - 1) as u32;
        Ok(())
    }

    fn visit_if_new(&mut self, corner: u32) -> Result<()> {
        if !self.is_vertex_visited(self.table.vertex(corner)) {
            self.visit_vertex(corner)?;
        }
        Ok(())
    }
}

/// Runs `method` over every face in index order.
pub fn traverse(
    table: &CornerTable,
    faces: &[[u32; 3]],
    method: TraversalMethod,
    vertex_slots: usize,
) -> Result<EncodingData> {
    if faces.len() != table.num_faces() {
        return corrupt("face list does not match the corner table");
    }
    let mut visitor = Visitor::new(table, faces, vertex_slots);
    match method {
        TraversalMethod::DepthFirst => {
            let mut stack = Vec::new();
            for face in 0..table.num_faces() {
                depth_first(&mut visitor, &mut stack, (3 * face) as u32)?;
            }
        }
        TraversalMethod::MaxPredictionDegree => {
            let mut state = DegreeState {
                stacks: [Vec::new(), Vec::new(), Vec::new()],
                best_priority: 0,
                degree: vec![0; table.num_vertices()],
            };
            for face in 0..table.num_faces() {
                max_prediction_degree(&mut visitor, &mut state, (3 * face) as u32)?;
            }
        }
    }
    Ok(visitor.data)
}

fn depth_first(visitor: &mut Visitor<'_>, stack: &mut Vec<u32>, start: u32) -> Result<()> {
    if visitor.is_face_visited(start) {
        return Ok(());
    }
    let table = visitor.table;
    stack.clear();
    stack.push(start);
    if table.vertex(next(start)) == INVALID || table.vertex(previous(start)) == INVALID {
        return corrupt("traversal reached an unmapped corner");
    }
    visitor.visit_if_new(next(start))?;
    visitor.visit_if_new(previous(start))?;

    while let Some(&top) = stack.last() {
        let mut corner = top;
        if visitor.is_face_visited(corner) {
            stack.pop();
            continue;
        }
        loop {
            visitor.visit_face(corner);
            let vertex = table.vertex(corner);
            if vertex == INVALID {
                return corrupt("traversal reached an unmapped corner");
            }
            if !visitor.is_vertex_visited(vertex) {
                let on_boundary = table.is_on_boundary(vertex);
                visitor.visit_vertex(corner)?;
                if !on_boundary {
                    corner = table.right_corner(corner);
                    continue;
                }
            }
            let right = table.right_corner(corner);
            let left = table.left_corner(corner);
            match (visitor.is_face_visited(right), visitor.is_face_visited(left)) {
                (true, true) => {
                    stack.pop();
                    break;
                }
                (true, false) => corner = left,
                (false, true) => corner = right,
                (false, false) => {
                    if let Some(last) = stack.last_mut() {
                        *last = left;
                    }
                    stack.push(right);
                    break;
                }
            }
        }
    }
    Ok(())
}

const MAX_PRIORITY: usize = 3;

struct DegreeState {
    stacks: [Vec<u32>; MAX_PRIORITY],
    best_priority: usize,
    degree: Vec<u32>,
}

impl DegreeState {
    fn pop(&mut self) -> Option<u32> {
        for priority in self.best_priority..MAX_PRIORITY {
            if let Some(corner) = self.stacks[priority].pop() {
                self.best_priority = priority;
                return Some(corner);
            }
        }
        None
    }

    fn push(&mut self, corner: u32, priority: usize) {
        self.stacks[priority].push(corner);
        self.best_priority = self.best_priority.min(priority);
    }

    /// Visited tips get priority 0; otherwise vertices already predicted from
    /// another face rank above first sightings.
    fn priority(&mut self, visitor: &Visitor<'_>, corner: u32) -> usize {
        let tip = visitor.table.vertex(corner);
        if visitor.is_vertex_visited(tip) {
            return 0;
        }
        let Some(degree) = self.degree.get_mut(tip as usize) else {
            return 0;
        };
        *degree += 1;
        if *degree > 1 {
            1
        } else {
            2
        }
    }
}

fn max_prediction_degree(
    visitor: &mut Visitor<'_>,
    state: &mut DegreeState,
    start: u32,
) -> Result<()> {
    if state.degree.is_empty() {
        return Ok(());
    }
    let table = visitor.table;
    state.stacks[0].push(start);
    state.best_priority = 0;
    visitor.visit_if_new(next(start))?;
    visitor.visit_if_new(previous(start))?;
    visitor.visit_if_new(start)?;

    while let Some(popped) = state.pop() {
        if visitor.is_face_visited(popped) {
            continue;
        }
        let mut corner = popped;
        loop {
            visitor.visit_face(corner);
            visitor.visit_if_new(corner)?;
            let right = table.right_corner(corner);
            let left = table.left_corner(corner);
            let right_visited = visitor.is_face_visited(right);
            if !visitor.is_face_visited(left) {
                let priority = state.priority(visitor, left);
                if right_visited && priority <= state.best_priority {
                    corner = left;
                    continue;
                }
                state.push(left, priority);
            }
            if !right_visited {
                let priority = state.priority(visitor, right);
                if priority <= state.best_priority {
                    corner = right;
                    continue;
                }
                state.push(right, priority);
            }
            break;
        }
    }
    Ok(())
}

/// Point-to-value map for an attribute ordered by `data`.
pub fn point_to_value_map(
    table: &CornerTable,
    faces: &[[u32; 3]],
    data: &EncodingData,
    num_points: usize,
) -> Result<Vec<u32>> {
    let mut map = vec![0u32; num_points];
    for (face, points) in faces.iter().enumerate() {
        for (k, &point) in points.iter().enumerate() {
            let vertex = table.vertex((3 * face + k) as u32);
            let Some(&value) = data.vertex_to_value.get(vertex as usize) else {
                return corrupt("face corner has no attribute vertex");
            };
            if point as usize >= num_points || value as usize >= num_points {
                return corrupt("attribute value index out of range");
            }
            map[point as usize] = value;
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (CornerTable, Vec<[u32; 3]>) {
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
        (table, vec![[0, 1, 2], [2, 1, 3]])
    }

    #[test]
    fn test_depth_first_order() {
        let (table, faces) = quad();
        let data = traverse(&table, &faces, TraversalMethod::DepthFirst, 4).unwrap();
        assert_eq!(data.point_ids, vec![1, 2, 0, 3]);
        assert_eq!(data.value_to_corner, vec![1, 2, 0, 5]);
        assert_eq!(data.vertex_to_value, vec![2, 0, 1, 3]);
        let map = point_to_value_map(&table, &faces, &data, 4).unwrap();
        assert_eq!(map, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_max_degree_visits_tip_first_face() {
        let (table, faces) = quad();
        let data = traverse(&table, &faces, TraversalMethod::MaxPredictionDegree, 4).unwrap();
        assert_eq!(data.point_ids.len(), 4);
        assert_eq!(&data.point_ids[..3], &[1, 2, 0]);
        assert_eq!(data.point_ids[3], 3);
    }
}
