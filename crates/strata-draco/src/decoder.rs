//! Top-level Draco mesh decoding: header, metadata, connectivity dispatch and
//! the attribute section.

use tracing::debug;

use crate::attributes::{decode_group, decode_group_descriptors, AttributeSlot, Sequence};
use crate::buffer::{bitstream_version, DecoderBuffer};
use crate::corner_table::CornerTable;
use crate::edgebreaker::{decode_connectivity, EdgebreakerConnectivity};
use crate::error::{corrupt, DracoError, Result};
use crate::mesh::DracoMesh;
use crate::prediction::MeshContext;
use crate::symbols::decode_symbols;
use crate::traversal::{point_to_value_map, traverse, TraversalMethod};

const MAGIC: &[u8] = b"DRACO";
const TRIANGULAR_MESH: u8 = 1;
const METADATA_FLAG: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectivityMethod {
    Sequential,
    Edgebreaker,
}

#[derive(Debug, Clone, Copy)]
struct Header {
    major: u8,
    minor: u8,
    method: ConnectivityMethod,
    flags: u16,
}

/// Decodes a Draco-compressed triangle mesh.
///
/// Bitstreams 2.0 through 2.2 are accepted; edgebreaker connectivity needs 2.2.
/// Point clouds and the 1.x formats are rejected.
pub fn decode_mesh(data: &[u8]) -> Result<DracoMesh> {
    let mut buffer = DecoderBuffer::new(data);
    let header = decode_header(&mut buffer)?;
    if header.flags & METADATA_FLAG != 0 {
        skip_geometry_metadata(&mut buffer)?;
    }
    let mesh = match header.method {
        ConnectivityMethod::Sequential => {
            let (faces, num_points) = decode_sequential_connectivity(&mut buffer)?;
            decode_sequential_attributes(&mut buffer, faces, num_points)?
        }
        ConnectivityMethod::Edgebreaker => {
            let connectivity = decode_connectivity(&mut buffer)?;
            decode_edgebreaker_attributes(&mut buffer, connectivity)?
        }
    };
    debug!(
        version = format_args!("{}.{}", header.major, header.minor),
        method = ?header.method,
        faces = mesh.faces.len(),
        points = mesh.num_points,
        attributes = mesh.attributes.len(),
        "decoded draco mesh"
    );
    Ok(mesh)
}

fn decode_header(buffer: &mut DecoderBuffer<'_>) -> Result<Header> {
    let magic = buffer
        .read_bytes(MAGIC.len(), "header")
        .map_err(|_| DracoError::InvalidHeader("stream too short".to_string()))?;
    if magic != MAGIC {
        return Err(DracoError::InvalidHeader("missing DRACO magic".to_string()));
    }
    let major = buffer.read_u8()?;
    let minor = buffer.read_u8()?;
    if major != 2 || minor > 2 {
        return Err(DracoError::UnsupportedVersion { major, minor });
    }
    buffer.set_version(major, minor);
    let geometry = buffer.read_u8()?;
    if geometry != TRIANGULAR_MESH {
        return Err(DracoError::Unsupported(format!(
            "geometry type {geometry}, only triangle meshes are decoded"
        )));
    }
    let method = match buffer.read_u8()? {
        0 => ConnectivityMethod::Sequential,
        1 => ConnectivityMethod::Edgebreaker,
        other => {
            return Err(DracoError::Unsupported(format!(
                "connectivity method {other}"
            )))
        }
    };
    let flags = buffer.read_u16()?;
    Ok(Header {
        major,
        minor,
        method,
        flags,
    })
}

// ============================================================================
// Metadata
// ============================================================================

fn skip_geometry_metadata(buffer: &mut DecoderBuffer<'_>) -> Result<()> {
    let num_attribute_metadata = buffer.read_varint_u32()?;
    for _ in 0..num_attribute_metadata {
        buffer.read_varint_u32()?; // attribute unique id
        skip_metadata(buffer)?;
    }
    skip_metadata(buffer)
}

/// Skips a metadata block and all nested blocks. Nested blocks carry a name
/// and are laid out depth first right after their parent.
fn skip_metadata(buffer: &mut DecoderBuffer<'_>) -> Result<()> {
    let mut pending = 1usize;
    let mut nested = false;
    while pending > 0 {
        pending -= 1;
        if nested {
            skip_name(buffer)?;
        }
        nested = true;
        let num_entries = buffer.read_varint_u32()?;
        for _ in 0..num_entries {
            skip_name(buffer)?;
            let size = buffer.read_varint_u32()? as usize;
            buffer.read_bytes(size, "metadata entry")?;
        }
        let num_nested = buffer.read_varint_u32()? as usize;
        if num_nested > buffer.remaining_size() {
            return corrupt("metadata nesting exceeds the stream");
        }
        pending += num_nested;
    }
    Ok(())
}

fn skip_name(buffer: &mut DecoderBuffer<'_>) -> Result<()> {
    let len = usize::from(buffer.read_u8()?);
    buffer.read_bytes(len, "metadata name")?;
    Ok(())
}

// ============================================================================
// Sequential connectivity
// ============================================================================

fn decode_sequential_connectivity(
    buffer: &mut DecoderBuffer<'_>,
) -> Result<(Vec<[u32; 3]>, usize)> {
    let (num_faces, num_points) = if buffer.version() < bitstream_version(2, 2) {
        (buffer.read_u32()?, buffer.read_u32()?)
    } else {
        (buffer.read_varint_u32()?, buffer.read_varint_u32()?)
    };
    if num_faces > u32::MAX / 3 {
        return corrupt("too many faces");
    }
    let num_indices = num_faces as usize * 3;
    let indices = match buffer.read_u8()? {
        0 => {
            let symbols = decode_symbols(buffer, num_indices, 1)?;
            let mut last = 0i64;
            let mut indices = Vec::with_capacity(num_indices);
            for symbol in symbols {
                let diff = i64::from(symbol >> 1);
                let value = if symbol & 1 == 1 {
                    if diff > last {
                        return corrupt("negative face index");
                    }
                    last - diff
                } else {
                    last + diff
                };
                if value > i64::from(i32::MAX) {
                    return corrupt("face index overflow");
                }
                indices.push(value as u32);
                last = value;
            }
            indices
        }
        1 => decode_raw_indices(buffer, num_indices, num_points)?,
        other => return corrupt(format!("sequential connectivity method {other}")),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i >= num_points) {
        return corrupt(format!("face index {bad} out of {num_points} points"));
    }
    let faces = indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    Ok((faces, num_points as usize))
}

fn decode_raw_indices(
    buffer: &mut DecoderBuffer<'_>,
    num_indices: usize,
    num_points: u32,
) -> Result<Vec<u32>> {
    if num_points < 1 << 8 {
        let bytes = buffer.read_bytes(num_indices, "face indices")?;
        Ok(bytes.iter().map(|&b| u32::from(b)).collect())
    } else if num_points < 1 << 16 {
        (0..num_indices)
            .map(|_| buffer.read_u16().map(u32::from))
            .collect()
    } else if num_points < 1 << 21 && buffer.version() >= bitstream_version(2, 2) {
        (0..num_indices).map(|_| buffer.read_varint_u32()).collect()
    } else {
        (0..num_indices).map(|_| buffer.read_u32()).collect()
    }
}

fn decode_sequential_attributes(
    buffer: &mut DecoderBuffer<'_>,
    faces: Vec<[u32; 3]>,
    num_points: usize,
) -> Result<DracoMesh> {
    let num_decoders = buffer.read_u8()?;
    let mut slots = Vec::new();
    let groups = (0..num_decoders)
        .map(|_| decode_group_descriptors(buffer, &mut slots))
        .collect::<Result<Vec<_>>>()?;
    let point_ids: Vec<u32> = (0..num_points as u32).collect();
    for group in &groups {
        let sequence = Sequence {
            point_ids: &point_ids,
            point_to_value: point_ids.clone(),
            mesh: None,
        };
        decode_group(buffer, group, &sequence, &mut slots)?;
    }
    Ok(finish(faces, num_points, slots))
}

// ============================================================================
// Edgebreaker attributes
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct GroupHeader {
    /// Seam-aware connectivity slot, `None` for the position data.
    data_id: Option<usize>,
    per_corner: bool,
    traversal: TraversalMethod,
}

fn decode_edgebreaker_attributes(
    buffer: &mut DecoderBuffer<'_>,
    connectivity: EdgebreakerConnectivity,
) -> Result<DracoMesh> {
    let num_decoders = buffer.read_u8()?;
    let mut headers = Vec::with_capacity(usize::from(num_decoders));
    let mut position_claimed = false;
    for _ in 0..num_decoders {
        let data_id = buffer.read_i8()?;
        let decoder_type = buffer.read_u8()?;
        let traversal = TraversalMethod::from_id(buffer.read_u8()?)
            .ok_or_else(|| DracoError::Corrupt("unknown attribute traversal".to_string()))?;
        let data_id = match usize::try_from(data_id) {
            Ok(id) if id < connectivity.attribute_data.len() => Some(id),
            Ok(_) => return corrupt("attribute data id out of range"),
            Err(_) if position_claimed => return corrupt("position data used twice"),
            Err(_) => {
                position_claimed = true;
                None
            }
        };
        let per_corner = match decoder_type {
            0 => false,
            1 => true,
            other => return corrupt(format!("attribute decoder type {other}")),
        };
        if per_corner && (data_id.is_none() || traversal != TraversalMethod::DepthFirst) {
            return corrupt("per-corner attributes need their own depth-first connectivity");
        }
        headers.push(GroupHeader {
            data_id,
            per_corner,
            traversal,
        });
    }

    let mut slots = Vec::new();
    let groups = headers
        .iter()
        .map(|_| decode_group_descriptors(buffer, &mut slots))
        .collect::<Result<Vec<_>>>()?;

    let base = &connectivity.table;
    for (header, group) in headers.iter().zip(&groups) {
        let table: &CornerTable = match (header.per_corner, header.data_id) {
            (true, Some(id)) => &connectivity.attribute_data[id].table,
            _ => base,
        };
        let encoding = traverse(table, &connectivity.faces, header.traversal, base.num_vertices())?;
        let point_to_value =
            point_to_value_map(table, &connectivity.faces, &encoding, connectivity.num_points)?;
        let sequence = Sequence {
            point_ids: &encoding.point_ids,
            point_to_value,
            mesh: Some(MeshContext {
                table,
                value_to_corner: &encoding.value_to_corner,
                vertex_to_value: &encoding.vertex_to_value,
            }),
        };
        decode_group(buffer, group, &sequence, &mut slots)?;
    }
    Ok(finish(connectivity.faces, connectivity.num_points, slots))
}

fn finish(faces: Vec<[u32; 3]>, num_points: usize, slots: Vec<AttributeSlot>) -> DracoMesh {
    DracoMesh {
        faces,
        num_points,
        attributes: slots.into_iter().map(AttributeSlot::into_attribute).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic_and_versions() {
        assert!(matches!(
            decode_mesh(b"DRACX\x02\x02\x01\x00\x00\x00"),
            Err(DracoError::InvalidHeader(_))
        ));
        assert_eq!(
            decode_mesh(b"DRACO\x01\x03\x01\x00\x00\x00"),
            Err(DracoError::UnsupportedVersion { major: 1, minor: 3 })
        );
        assert!(matches!(
            decode_mesh(b"DRACO\x02\x02\x00\x00\x00\x00"),
            Err(DracoError::Unsupported(_))
        ));
    }

    #[test]
    fn test_metadata_is_skipped() {
        let bytes = [
            1, // attribute metadata blocks
            0, // unique id
            1, 1, b'k', 1, 9, // one entry "k" = [9]
            1, // one nested block
            0, 0, 0, // unnamed, no entries, no nesting
            0, 0, // geometry metadata: empty
            0xAA,
        ];
        let mut buffer = DecoderBuffer::new(&bytes);
        skip_geometry_metadata(&mut buffer).unwrap();
        assert_eq!(buffer.remaining_data(), &[0xAA]);
    }

    #[test]
    fn test_raw_indices_use_byte_width_for_small_meshes() {
        let bytes = [2, 4, 1, 0, 1, 2, 2, 1, 3];
        let mut buffer = DecoderBuffer::new(&bytes);
        let (faces, num_points) = decode_sequential_connectivity(&mut buffer).unwrap();
        assert_eq!(faces, vec![[0, 1, 2], [2, 1, 3]]);
        assert_eq!(num_points, 4);
    }

    #[test]
    fn test_compressed_indices_are_delta_coded() {
        // Deltas +0 +1 +1 +0 -1 +2 as symbols 0 2 2 0 3 4, three bits each.
        let bytes = [
            2, 4, 0, // faces, points, compressed
            0, 4, 0b0000_1011, 0b0000_0001, 0x40, 1, 0x00, // every tag is bit length 3
            0x90, 0x30, 0x02,
        ];
        let mut buffer = DecoderBuffer::new(&bytes);
        let (faces, _) = decode_sequential_connectivity(&mut buffer).unwrap();
        assert_eq!(faces, vec![[0, 1, 2], [2, 1, 3]]);
        assert_eq!(buffer.remaining_size(), 0);
    }

    #[test]
    fn test_face_index_past_points_is_rejected() {
        let bytes = [1, 3, 1, 0, 1, 3];
        let mut buffer = DecoderBuffer::new(&bytes);
        assert!(decode_sequential_connectivity(&mut buffer).is_err());
    }
}
