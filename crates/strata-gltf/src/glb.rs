//! GLB container splitting.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{GltfError, Result};

pub const GLB_MAGIC: u32 = 0x46546C67; // "glTF" in little-endian
pub const GLB_VERSION: u32 = 2;
pub const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
pub const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// The JSON and BIN chunks of a GLB file, borrowed from the file bytes.
#[derive(Debug, Clone, Copy)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

/// Returns `true` when `data` starts with the GLB magic.
pub fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(&data[0..4]) == GLB_MAGIC
}

/// Split a GLB container. Unknown chunk types are skipped; the first JSON and
/// first BIN chunk win.
pub fn split(data: &[u8]) -> Result<GlbChunks<'_>> {
    if data.len() < HEADER_LEN {
        return Err(GltfError::InvalidGlb("File too small for GLB header".into()));
    }

    let magic = LittleEndian::read_u32(&data[0..4]);
    let version = LittleEndian::read_u32(&data[4..8]);
    let length = LittleEndian::read_u32(&data[8..12]) as usize;

    if magic != GLB_MAGIC {
        return Err(GltfError::InvalidGlb("Invalid GLB magic".into()));
    }
    if version != GLB_VERSION {
        return Err(GltfError::InvalidGlb(format!("Unsupported GLB version: {}", version)));
    }
    if length > data.len() {
        return Err(GltfError::InvalidGlb("File truncated".into()));
    }

    let mut offset = HEADER_LEN;
    let mut json = None;
    let mut bin = None;

    while offset + CHUNK_HEADER_LEN <= length {
        let chunk_length = LittleEndian::read_u32(&data[offset..offset + 4]) as usize;
        let chunk_type = LittleEndian::read_u32(&data[offset + 4..offset + 8]);
        offset += CHUNK_HEADER_LEN;

        let end = offset
            .checked_add(chunk_length)
            .filter(|&end| end <= length)
            .ok_or_else(|| GltfError::InvalidGlb("Chunk extends past file end".into()))?;
        let chunk = &data[offset..end];
        offset = end;

        match chunk_type {
            GLB_CHUNK_JSON if json.is_none() => json = Some(chunk),
            GLB_CHUNK_BIN if bin.is_none() => bin = Some(chunk),
            _ => {}
        }
    }

    let json = json.ok_or_else(|| GltfError::InvalidGlb("No JSON chunk".into()))?;
    Ok(GlbChunks { json, bin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn chunk(out: &mut Vec<u8>, kind: u32, payload: &[u8]) {
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(kind).unwrap();
        out.extend_from_slice(payload);
    }

    fn container(chunks: &[(u32, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (kind, payload) in chunks {
            chunk(&mut body, *kind, payload);
        }
        let mut out = Vec::new();
        out.write_u32::<LittleEndian>(GLB_MAGIC).unwrap();
        out.write_u32::<LittleEndian>(GLB_VERSION).unwrap();
        out.write_u32::<LittleEndian>((HEADER_LEN + body.len()) as u32).unwrap();
        out.extend(body);
        out
    }

    #[test]
    fn test_split_json_and_bin() {
        let data = container(&[(GLB_CHUNK_JSON, b"{}  "), (0x1234, b"skip"), (GLB_CHUNK_BIN, &[1, 2, 3, 4])]);
        assert!(is_glb(&data));
        let chunks = split(&data).unwrap();
        assert_eq!(chunks.json, b"{}  ");
        assert_eq!(chunks.bin, Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = container(&[(GLB_CHUNK_JSON, b"{}  ")]);
        data[0] = b'x';
        assert!(matches!(split(&data), Err(GltfError::InvalidGlb(_))));
    }

    #[test]
    fn test_truncated_chunk() {
        let mut data = container(&[(GLB_CHUNK_JSON, b"{}  ")]);
        // Claim a longer JSON chunk than the file holds.
        data[12] = 200;
        assert!(split(&data).is_err());
    }

    #[test]
    fn test_missing_json_chunk() {
        let data = container(&[(GLB_CHUNK_BIN, &[0, 0, 0, 0])]);
        assert!(split(&data).is_err());
    }
}
