//! Strata Draco Decoder
//!
//! Decodes Draco-compressed triangle meshes as embedded by
//! `KHR_draco_mesh_compression` glTF primitives:
//!
//! - [`decode_mesh`]: header, optional metadata, sequential or edgebreaker
//!   connectivity and every attribute decoder.
//! - [`DracoMesh`]: faces over point ids plus [`DracoAttribute`]s, each holding
//!   unique values and a point-to-value map.
//!
//! Attributes come back as `f32` components: quantized and octahedral values
//! are dequantized, integer types keep their integral values.

pub mod ans;
pub mod buffer;
pub mod corner_table;
pub mod decoder;
pub mod edgebreaker;
pub mod error;
pub mod mesh;
pub mod prediction;
pub mod symbols;
pub mod traversal;

mod attributes;

pub use decoder::decode_mesh;
pub use error::{DracoError, Result};
pub use mesh::{AttributeKind, DataType, DracoAttribute, DracoMesh};
