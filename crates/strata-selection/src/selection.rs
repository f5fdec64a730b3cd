//! The selection container and its element identifiers.
//!
//! A [`GeometrySelection`] is a set of [`SelectionId`]s tagged with an
//! [`ElementType`] and a [`TopologyType`]. What an id means depends on both tags:
//!
//! | Topology  | Vertex                 | Edge                                   | Face                      |
//! |-----------|------------------------|----------------------------------------|---------------------------|
//! | Triangle  | `Raw(vertex)`          | `Raw(tri_edge)`                        | `Raw(triangle)`           |
//! | Polygroup | `Grouped{vertex, corner}` | `Grouped{tri_edge, group_edge}`     | `Grouped{triangle, group}` |
//!
//! `tri_edge` is a [`TriEdge`] packed with [`TriEdge::encode`]. Under triangle
//! topology an interior mesh edge is normally present twice, once per adjacent
//! triangle; use [`GeometrySelection::unique_edges`] when counting edges.
//!
//! Under polygroup topology the `seed` half of an id is only a representative;
//! membership is decided by the `group` half.

use std::collections::BTreeSet;

use strata_core::{EdgeId, TriEdge, TriangleMesh};

use crate::error::{Result, SelectionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Vertex,
    Edge,
    Face,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopologyType {
    Triangle,
    Polygroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionId {
    Raw(u32),
    Grouped { seed: u32, group: u32 },
}

impl SelectionId {
    pub fn grouped(seed: u32, group: u32) -> Self {
        SelectionId::Grouped { seed, group }
    }

    pub fn tri_edge(edge: TriEdge) -> Self {
        SelectionId::Raw(edge.encode())
    }

    /// The low-level geometric index (vertex, triangle or packed tri-edge).
    pub fn geometry(self) -> u32 {
        match self {
            SelectionId::Raw(id) => id,
            SelectionId::Grouped { seed, .. } => seed,
        }
    }

    /// The logical element identifier (group, corner or group edge).
    pub fn topology(self) -> u32 {
        match self {
            SelectionId::Raw(id) => id,
            SelectionId::Grouped { group, .. } => group,
        }
    }
}

/// Set operation applied by `combine_selection_in_place`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    Add,
    Subtract,
    Intersection,
}

/// How new ids are applied to an existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeType {
    #[default]
    Replace,
    Add,
    Remove,
}

/// Ids added and removed by one or more selection edits, in edit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDelta {
    pub added: Vec<SelectionId>,
    pub removed: Vec<SelectionId>,
}

impl SelectionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometrySelection {
    pub element_type: ElementType,
    pub topology_type: TopologyType,
    ids: BTreeSet<SelectionId>,
}

impl GeometrySelection {
    pub fn new(element_type: ElementType, topology_type: TopologyType) -> Self {
        Self {
            element_type,
            topology_type,
            ids: BTreeSet::new(),
        }
    }

    pub fn with_ids<I>(element_type: ElementType, topology_type: TopologyType, ids: I) -> Self
    where
        I: IntoIterator<Item = SelectionId>,
    {
        Self {
            element_type,
            topology_type,
            ids: ids.into_iter().collect(),
        }
    }

    /// An empty selection with the same element and topology type.
    pub fn empty_like(&self) -> Self {
        Self::new(self.element_type, self.topology_type)
    }

    pub fn is_same_type(&self, other: &GeometrySelection) -> bool {
        self.element_type == other.element_type && self.topology_type == other.topology_type
    }

    pub fn expect_element(&self, expected: ElementType) -> Result<()> {
        if self.element_type != expected {
            return Err(SelectionError::ElementTypeMismatch {
                expected,
                actual: self.element_type,
            });
        }
        Ok(())
    }

    pub fn expect_topology(&self, expected: TopologyType) -> Result<()> {
        if self.topology_type != expected {
            return Err(SelectionError::TopologyTypeMismatch {
                expected,
                actual: self.topology_type,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SelectionId> + '_ {
        self.ids.iter().copied()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Inserts `id` verbatim, without topology-id filtering.
    pub fn insert(&mut self, id: SelectionId) -> bool {
        self.ids.insert(id)
    }

    /// Removes `id` verbatim.
    pub fn remove(&mut self, id: SelectionId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains_exact(&self, id: SelectionId) -> bool {
        self.ids.contains(&id)
    }

    /// Membership test that compares by topology id under polygroup topology.
    pub fn contains(&self, id: SelectionId) -> bool {
        match self.topology_type {
            TopologyType::Triangle => self.ids.contains(&id),
            TopologyType::Polygroup => self.find_by_topology_id(id.topology()).is_some(),
        }
    }

    /// Linear scan for a stored id with the given topology id.
    pub fn find_by_topology_id(&self, topology_id: u32) -> Option<SelectionId> {
        self.ids.iter().copied().find(|id| id.topology() == topology_id)
    }

    /// Adds `id` unless an equivalent element is already present.
    pub fn select(&mut self, id: SelectionId, delta: &mut SelectionDelta) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.insert(id);
        delta.added.push(id);
        true
    }

    /// Removes the stored element equivalent to `id`, if any.
    pub fn deselect(&mut self, id: SelectionId, delta: &mut SelectionDelta) -> bool {
        let found = match self.topology_type {
            TopologyType::Triangle => self.ids.contains(&id).then_some(id),
            TopologyType::Polygroup => self.find_by_topology_id(id.topology()),
        };
        match found {
            Some(stored) => {
                self.ids.remove(&stored);
                delta.removed.push(stored);
                true
            }
            None => false,
        }
    }

    /// Removes everything, recording each removed id.
    pub fn clear_tracked(&mut self, delta: &mut SelectionDelta) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        delta.removed.extend(self.ids.iter().copied());
        self.ids.clear();
        true
    }

    /// Unique mesh edges referenced by an edge selection, each reported once
    /// even when both of its tri-edges are selected. Stale ids are skipped.
    pub fn unique_edges(&self, mesh: &TriangleMesh) -> Vec<EdgeId> {
        if self.element_type != ElementType::Edge {
            return Vec::new();
        }
        let mut edges: Vec<EdgeId> = self
            .ids
            .iter()
            .filter_map(|id| mesh.edge_from_tri_edge(TriEdge::decode(id.geometry())))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

impl Extend<SelectionId> for GeometrySelection {
    fn extend<T: IntoIterator<Item = SelectionId>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

/// True when both selections have the same type and hold the same elements.
/// Polygroup selections are compared by topology id.
pub fn are_selections_identical(a: &GeometrySelection, b: &GeometrySelection) -> bool {
    if !a.is_same_type(b) || a.len() != b.len() {
        return false;
    }
    match a.topology_type {
        TopologyType::Triangle => a.ids == b.ids,
        TopologyType::Polygroup => a.iter().all(|id| b.find_by_topology_id(id.topology()).is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_membership_uses_topology_id() {
        let mut sel = GeometrySelection::new(ElementType::Face, TopologyType::Polygroup);
        let mut delta = SelectionDelta::default();
        assert!(sel.select(SelectionId::grouped(4, 2), &mut delta));
        assert!(!sel.select(SelectionId::grouped(9, 2), &mut delta), "same group, other seed");
        assert!(sel.contains(SelectionId::grouped(11, 2)));
        assert!(sel.deselect(SelectionId::grouped(11, 2), &mut delta));
        assert!(sel.is_empty());
        assert_eq!(delta.added, vec![SelectionId::grouped(4, 2)]);
        assert_eq!(delta.removed, vec![SelectionId::grouped(4, 2)]);
    }

    #[test]
    fn test_raw_membership_is_exact() {
        let mut sel = GeometrySelection::new(ElementType::Vertex, TopologyType::Triangle);
        sel.insert(SelectionId::Raw(3));
        assert!(sel.contains(SelectionId::Raw(3)));
        assert!(!sel.contains(SelectionId::Raw(4)));
    }

    #[test]
    fn test_identical_polygroup_selections_with_different_seeds() {
        let a = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Polygroup,
            [SelectionId::grouped(0, 1), SelectionId::grouped(5, 2)],
        );
        let b = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Polygroup,
            [SelectionId::grouped(1, 1), SelectionId::grouped(6, 2)],
        );
        assert!(are_selections_identical(&a, &b));
        let c = GeometrySelection::with_ids(ElementType::Face, TopologyType::Triangle, [SelectionId::Raw(0)]);
        assert!(!are_selections_identical(&a, &c));
    }

    #[test]
    fn test_id_halves() {
        assert_eq!(SelectionId::Raw(7).geometry(), 7);
        assert_eq!(SelectionId::Raw(7).topology(), 7);
        let id = SelectionId::grouped(12, 3);
        assert_eq!((id.geometry(), id.topology()), (12, 3));
    }
}
