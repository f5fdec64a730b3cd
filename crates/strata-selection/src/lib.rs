//! Strata Selection Library
//!
//! Vertex, edge and face selections over a [`strata_core::TriangleMesh`], in
//! either triangle topology (raw mesh elements) or polygroup topology (groups,
//! group edges and corners of a [`strata_core::GroupTopology`]).
//!
//! # Ids
//!
//! - Triangle topology: [`SelectionId::Raw`] holding a vertex id, triangle id
//!   or packed [`strata_core::TriEdge`].
//! - Polygroup topology: [`SelectionId::Grouped`] pairing a mesh element that
//!   seeds the entry with the group, group edge or corner it stands for.
//!   Polygroup selections compare entries by the latter only.
//!
//! # Operations
//!
//! - [`enumerate`]: mesh elements covered by a selection.
//! - [`convert`]: conversion between the six selection kinds, and to/from index arrays.
//! - [`combine`]: add, subtract and intersect.
//! - [`connectivity`]: select-all, flood selection, expand/contract.
//! - [`boundary`]: selection borders.
//! - [`raycast`]: picking.
//! - [`frame`]: a local frame for gizmo placement.

pub mod boundary;
pub mod combine;
pub mod connectivity;
pub mod convert;
pub mod enumerate;
pub mod error;
pub mod frame;
pub mod raycast;
pub mod selection;

pub use boundary::{
    make_boundary_connected_selection, selection_boundary_corners, selection_boundary_vertices, BoundaryCorners,
    BoundaryVertices,
};
pub use combine::combine_selection_in_place;
pub use connectivity::{expand_contract_selection, make_select_all, make_select_all_connected, ConnectionMode};
pub use convert::{
    convert_index_array_to_selection, convert_selection, convert_selection_to_index_array,
    initialize_selection_from_triangles, ConversionPolicy, IndexArrayKind,
};
pub use enumerate::{
    convert_polygroup_selection_to_topology_selection, enumerate_selection_edges, enumerate_selection_triangles,
    ElementMapping, GroupTopologySelection, SelectionElement,
};
pub use error::{Result, SelectionError};
pub use frame::{triangle_selection_frame, Frame3};
pub use raycast::{
    update_group_selection_via_raycast, update_selection_with_new_elements, update_triangle_selection_via_raycast,
    SelectionUpdateConfig, SelectionUpdateResult,
};
pub use selection::{
    are_selections_identical, ChangeType, CombineMode, ElementType, GeometrySelection, SelectionDelta, SelectionId,
    TopologyType,
};
