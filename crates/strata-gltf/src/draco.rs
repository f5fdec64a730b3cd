//! Draco decompression for `KHR_draco_mesh_compression` primitives.
//!
//! Decoding goes through [`DracoDecoder`]. [`BuiltinDracoDecoder`] handles
//! triangle meshes with the in-tree bitstream decoder; hosts may plug in their
//! own. The reader only moves decoded streams into the arena and backs the
//! primitive's pending accessors with fresh buffer views.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use strata_draco::{DataType, DracoAttribute};

use crate::accessor::{AccessorState, Buffer, BufferView, ComponentType};
use crate::asset::{Asset, Primitive};
use crate::messages::MessageLog;

/// One decoded attribute: `values.len() == count * components`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedAttribute {
    pub components: usize,
    pub values: Vec<f32>,
}

/// Output of a Draco decode, keyed by the attribute ids of the compressed stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedDracoMesh {
    pub indices: Vec<u32>,
    pub attributes: BTreeMap<u32, DecodedAttribute>,
}

pub trait DracoDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDracoMesh, String>;
}

/// Decoder used when the host does not configure one.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDracoDecoder;

impl DracoDecoder for BuiltinDracoDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedDracoMesh, String> {
        let mesh = strata_draco::decode_mesh(bytes).map_err(|err| err.to_string())?;
        let attributes = mesh
            .attributes
            .iter()
            .map(|attribute| {
                let decoded = DecodedAttribute {
                    components: attribute.components,
                    values: float_values(attribute),
                };
                (attribute.unique_id, decoded)
            })
            .collect();
        Ok(DecodedDracoMesh {
            indices: mesh.indices(),
            attributes,
        })
    }
}

/// Per-point values; normalized integers are mapped to floats the way glTF
/// defines normalized accessors.
fn float_values(attribute: &DracoAttribute) -> Vec<f32> {
    let mut values = attribute.point_values();
    if attribute.normalized {
        let scale = match attribute.data_type {
            DataType::Int8 => Some(127.0),
            DataType::Uint8 => Some(255.0),
            DataType::Int16 => Some(32767.0),
            DataType::Uint16 => Some(65535.0),
            DataType::Int32 => Some(2147483647.0),
            DataType::Uint32 => Some(4294967295.0),
            _ => None,
        };
        if let Some(scale) = scale {
            for value in &mut values {
                *value = (*value / scale).max(-1.0);
            }
        }
    }
    values
}

/// Decode a primitive's `KHR_draco_mesh_compression` payload and back its
/// pending accessors. Accessors that are already backed are left alone, so a
/// shared accessor is filled once. Without a `decoder` the built-in one runs.
pub fn decompress_primitive(
    asset: &mut Asset,
    primitive: &Primitive,
    decoder: Option<&dyn DracoDecoder>,
    log: &mut MessageLog,
) {
    let Some(draco) = &primitive.draco else {
        return;
    };
    let decoder = decoder.unwrap_or(&BuiltinDracoDecoder);

    let decoded = match asset.byte_source().view_bytes(draco.buffer_view) {
        Some(bytes) => decoder.decode(bytes),
        None => Err(format!("buffer view {} is unreadable", draco.buffer_view)),
    };
    let decoded = match decoded {
        Ok(decoded) => decoded,
        Err(err) => {
            log.warning(format!("Failed to decode Draco mesh: {}", err));
            return;
        }
    };

    if let Some(indices) = primitive.indices.filter(|&i| is_pending(asset, i)) {
        if asset.accessors[indices].count == decoded.indices.len() {
            let mut bytes = vec![0u8; decoded.indices.len() * 4];
            LittleEndian::write_u32_into(&decoded.indices, &mut bytes);
            let view = materialize(asset, &bytes);
            asset.accessors[indices].back_with(view, ComponentType::U32);
        } else {
            log.warning(format!(
                "Draco index count {} does not match accessor {} count {}.",
                decoded.indices.len(),
                indices,
                asset.accessors[indices].count
            ));
        }
    }

    for (semantic, id) in &draco.attributes {
        let Some(accessor) = primitive.attributes.get(semantic).copied().filter(|&a| is_pending(asset, a)) else {
            continue;
        };
        let expected = asset.accessors[accessor].accessor_type.components();
        let count = asset.accessors[accessor].count;
        match decoded.attributes.get(id) {
            Some(attribute) if attribute.components == expected && attribute.values.len() == count * expected => {
                let mut bytes = vec![0u8; attribute.values.len() * 4];
                LittleEndian::write_f32_into(&attribute.values, &mut bytes);
                let view = materialize(asset, &bytes);
                asset.accessors[accessor].back_with(view, ComponentType::F32);
            }
            Some(_) => log.warning(format!(
                "Draco attribute {} does not match the layout of accessor {}.",
                id, accessor
            )),
            None => log.warning(format!("Draco attribute {} is missing from the decoded mesh.", id)),
        }
    }
}

fn is_pending(asset: &Asset, accessor: usize) -> bool {
    asset
        .accessors
        .get(accessor)
        .is_some_and(|a| a.state == AccessorState::Pending)
}

/// Append `bytes` as a new buffer with one packed view; returns the view index.
fn materialize(asset: &mut Asset, bytes: &[u8]) -> usize {
    let range = asset.push_bytes(bytes);
    asset.buffers.push(Buffer {
        name: String::new(),
        byte_length: bytes.len(),
        uri: None,
        data: Some(range),
    });
    asset.buffer_views.push(BufferView {
        name: String::new(),
        buffer: asset.buffers.len() - 1,
        byte_offset: 0,
        byte_length: bytes.len(),
        byte_stride: 0,
    });
    asset.buffer_views.len() - 1
}
