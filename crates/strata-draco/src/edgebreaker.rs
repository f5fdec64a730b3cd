//! Edgebreaker connectivity decoding.
//!
//! The encoder walks the mesh emitting one CLERS symbol per face; the decoder
//! replays the symbols in reverse, growing faces onto an active boundary edge.
//! Topology split events reconnect components that the encoder separated, and
//! start-face flags close interior triangles left over at the end. Both the
//! plain bit-coded traversal and the valence-context traversal are supported.

use std::collections::HashMap;

use tracing::trace;

use crate::ans::RansBitDecoder;
use crate::buffer::{bitstream_version, DecoderBuffer};
use crate::corner_table::{next, previous, AttributeConnectivity, CornerTable, INVALID};
use crate::error::{corrupt, DracoError, Result};
use crate::symbols::decode_symbols;

const TOPOLOGY_C: u32 = 0x0;
const TOPOLOGY_S: u32 = 0x1;
const TOPOLOGY_L: u32 = 0x3;
const TOPOLOGY_R: u32 = 0x5;
const TOPOLOGY_E: u32 = 0x7;
const TOPOLOGY_INVALID: u32 = 0xFF;

/// Valence contexts store symbols as indices into this table.
const CONTEXT_SYMBOLS: [u32; 5] = [TOPOLOGY_C, TOPOLOGY_S, TOPOLOGY_L, TOPOLOGY_R, TOPOLOGY_E];

const STANDARD_TRAVERSAL: u8 = 0;
const VALENCE_TRAVERSAL: u8 = 2;
const MIN_VALENCE: i32 = 2;
const MAX_VALENCE: i32 = 7;

const RIGHT_FACE_EDGE: u32 = 1;

/// Decoded edgebreaker connectivity with points already split at attribute seams.
#[derive(Debug, Clone)]
pub struct EdgebreakerConnectivity {
    pub table: CornerTable,
    /// One entry per attribute-data slot, in stream order.
    pub attribute_data: Vec<AttributeConnectivity>,
    pub faces: Vec<[u32; 3]>,
    pub num_points: usize,
}

#[derive(Debug, Clone, Copy)]
struct TopologySplit {
    source_symbol: u32,
    split_symbol: u32,
    source_edge: u32,
}

// ============================================================================
// Symbol sources
// ============================================================================

struct ValenceContexts {
    valences: Vec<i32>,
    symbols: Vec<Vec<u32>>,
    counters: Vec<usize>,
    active: Option<usize>,
    last_symbol: u32,
}

enum SymbolSource<'a> {
    Standard(DecoderBuffer<'a>),
    Valence(ValenceContexts),
}

impl SymbolSource<'_> {
    fn decode_symbol(&mut self) -> u32 {
        match self {
            SymbolSource::Standard(bits) => {
                let symbol = bits.decode_lsb_bits(1);
                if symbol == TOPOLOGY_C {
                    symbol
                } else {
                    symbol | (bits.decode_lsb_bits(2) << 1)
                }
            }
            SymbolSource::Valence(ctx) => {
                ctx.last_symbol = match ctx.active {
                    Some(active) => {
                        if ctx.counters[active] == 0 {
                            TOPOLOGY_INVALID
                        } else {
                            ctx.counters[active] -= 1;
                            let id = ctx.symbols[active][ctx.counters[active]] as usize;
                            CONTEXT_SYMBOLS.get(id).copied().unwrap_or(TOPOLOGY_INVALID)
                        }
                    }
                    // The first symbol of a valence stream is always E.
                    None => TOPOLOGY_E,
                };
                ctx.last_symbol
            }
        }
    }

    fn new_active_corner_reached(&mut self, table: &CornerTable, corner: u32) {
        let SymbolSource::Valence(ctx) = self else {
            return;
        };
        let tip = table.vertex(corner);
        let nxt = table.vertex(next(corner));
        let prv = table.vertex(previous(corner));
        let (tip_add, next_add, prev_add) = match ctx.last_symbol {
            TOPOLOGY_C | TOPOLOGY_S => (0, 1, 1),
            TOPOLOGY_R => (1, 1, 2),
            TOPOLOGY_L => (1, 2, 1),
            TOPOLOGY_E => (2, 2, 2),
            _ => (0, 0, 0),
        };
        for (vertex, add) in [(tip, tip_add), (nxt, next_add), (prv, prev_add)] {
            if let Some(valence) = ctx.valences.get_mut(vertex as usize) {
                *valence += add;
            }
        }
        let active_valence = ctx.valences.get(nxt as usize).copied().unwrap_or(0);
        ctx.active = Some((active_valence.clamp(MIN_VALENCE, MAX_VALENCE) - MIN_VALENCE) as usize);
    }

    fn merge_vertices(&mut self, dest: u32, source: u32) {
        if let SymbolSource::Valence(ctx) = self {
            let merged = ctx.valences.get(source as usize).copied().unwrap_or(0);
            if let Some(valence) = ctx.valences.get_mut(dest as usize) {
                *valence += merged;
            }
        }
    }
}

fn checked(index: u32, what: &str) -> Result<u32> {
    if index == INVALID {
        corrupt(format!("edgebreaker reached an unmapped {what}"))
    } else {
        Ok(index)
    }
}

// ============================================================================
// Decoding
// ============================================================================

pub fn decode_connectivity(buffer: &mut DecoderBuffer<'_>) -> Result<EdgebreakerConnectivity> {
    if buffer.version() < bitstream_version(2, 2) {
        return Err(DracoError::Unsupported(
            "edgebreaker connectivity before bitstream 2.2".to_string(),
        ));
    }
    let traversal = buffer.read_u8()?;
    if traversal != STANDARD_TRAVERSAL && traversal != VALENCE_TRAVERSAL {
        return Err(DracoError::Unsupported(format!(
            "edgebreaker traversal {traversal}"
        )));
    }

    let num_encoded_vertices = buffer.read_varint_u32()? as usize;
    let num_faces = buffer.read_varint_u32()? as usize;
    if num_faces > (u32::MAX / 3) as usize {
        return corrupt("too many faces");
    }
    if num_encoded_vertices > num_faces * 3 {
        return corrupt("more vertices than face corners");
    }
    let num_attribute_data = usize::from(buffer.read_u8()?);
    let num_symbols = buffer.read_varint_u32()? as usize;
    if num_faces < num_symbols || num_faces > num_symbols + num_symbols / 3 {
        return corrupt("face count inconsistent with symbol count");
    }
    let num_split_symbols = buffer.read_varint_u32()? as usize;
    if num_split_symbols > num_symbols {
        return corrupt("more split symbols than symbols");
    }

    let mut table = CornerTable::with_faces(num_faces);
    let max_num_vertices = num_encoded_vertices + num_split_symbols;
    let mut is_vert_hole = vec![true; max_num_vertices];

    let mut splits = decode_topology_splits(buffer, num_faces)?;

    let mut source = match traversal {
        STANDARD_TRAVERSAL => {
            let mut bits = buffer.clone();
            let size = bits.start_bit_decoding(true)?;
            let size = usize::try_from(size)
                .ok()
                .filter(|&size| size <= bits.remaining_size())
                .ok_or(DracoError::UnexpectedEnd("traversal symbols"))?;
            buffer.advance(bits.position() - buffer.position() + size)?;
            SymbolSource::Standard(bits)
        }
        _ => SymbolSource::Valence(ValenceContexts {
            valences: Vec::new(),
            symbols: Vec::new(),
            counters: Vec::new(),
            active: None,
            last_symbol: TOPOLOGY_INVALID,
        }),
    };
    let mut start_faces = RansBitDecoder::start(buffer)?;
    let mut seam_decoders = (0..num_attribute_data)
        .map(|_| RansBitDecoder::start(buffer))
        .collect::<Result<Vec<_>>>()?;

    if let SymbolSource::Valence(ctx) = &mut source {
        ctx.valences = vec![0; max_num_vertices];
        for _ in MIN_VALENCE..=MAX_VALENCE {
            let count = buffer.read_varint_u32()? as usize;
            if count > num_faces {
                return corrupt("valence context larger than the face count");
            }
            let symbols = decode_symbols(buffer, count, 1)?;
            ctx.counters.push(symbols.len());
            ctx.symbols.push(symbols);
        }
    }

    let mut active: Vec<u32> = Vec::new();
    let mut split_active: HashMap<i64, u32> = HashMap::new();
    let mut invalid_vertices = Vec::new();
    let remove_invalid_vertices = num_attribute_data == 0;
    let mut decoded_faces = 0usize;

    for symbol_id in 0..num_symbols {
        let corner = (3 * decoded_faces) as u32;
        decoded_faces += 1;
        let mut check_topology_split = false;
        match source.decode_symbol() {
            TOPOLOGY_C => {
                let corner_a = *active.last().ok_or_else(empty_stack)?;
                let vertex_x = checked(table.vertex(next(corner_a)), "vertex")?;
                let corner_b = checked(next(table.left_most_corner(vertex_x)), "corner")?;
                if corner_a == corner_b {
                    return corrupt("C symbol closes onto its own edge");
                }
                if table.opposite(corner_a) != INVALID || table.opposite(corner_b) != INVALID {
                    return corrupt("C symbol attaches to a closed edge");
                }
                table.set_opposite_pair(corner_a, corner + 1);
                table.set_opposite_pair(corner_b, corner + 2);
                let vert_a_prev = checked(table.vertex(previous(corner_a)), "vertex")?;
                let vert_b_next = checked(table.vertex(next(corner_b)), "vertex")?;
                if vertex_x == vert_a_prev || vertex_x == vert_b_next {
                    return corrupt("C symbol produced a degenerate face");
                }
                table.map_corner_to_vertex(corner, vertex_x);
                table.map_corner_to_vertex(corner + 1, vert_b_next);
                table.map_corner_to_vertex(corner + 2, vert_a_prev);
                table.set_left_most_corner(vert_a_prev, corner + 2);
                is_vert_hole[vertex_x as usize] = false;
                *active.last_mut().ok_or_else(empty_stack)? = corner;
            }
            symbol @ (TOPOLOGY_R | TOPOLOGY_L) => {
                let corner_a = *active.last().ok_or_else(empty_stack)?;
                if table.opposite(corner_a) != INVALID {
                    return corrupt("R/L symbol attaches to a closed edge");
                }
                let (opp_corner, corner_l, corner_r) = if symbol == TOPOLOGY_R {
                    (corner + 2, corner + 1, corner)
                } else {
                    (corner + 1, corner, corner + 2)
                };
                table.set_opposite_pair(opp_corner, corner_a);
                let new_vertex = table.add_new_vertex();
                if table.num_vertices() > max_num_vertices {
                    return corrupt("more vertices than encoded");
                }
                table.map_corner_to_vertex(opp_corner, new_vertex);
                table.set_left_most_corner(new_vertex, opp_corner);
                let vertex_r = checked(table.vertex(previous(corner_a)), "vertex")?;
                table.map_corner_to_vertex(corner_r, vertex_r);
                table.set_left_most_corner(vertex_r, corner_r);
                let vertex_l = checked(table.vertex(next(corner_a)), "vertex")?;
                table.map_corner_to_vertex(corner_l, vertex_l);
                *active.last_mut().ok_or_else(empty_stack)? = corner;
                check_topology_split = true;
            }
            TOPOLOGY_S => {
                let corner_b = active.pop().ok_or_else(empty_stack)?;
                if let Some(&split_corner) = split_active.get(&(symbol_id as i64)) {
                    active.push(split_corner);
                }
                let corner_a = *active.last().ok_or_else(empty_stack)?;
                if corner_a == corner_b {
                    return corrupt("S symbol merges an edge with itself");
                }
                if table.opposite(corner_a) != INVALID || table.opposite(corner_b) != INVALID {
                    return corrupt("S symbol attaches to a closed edge");
                }
                table.set_opposite_pair(corner_a, corner + 2);
                table.set_opposite_pair(corner_b, corner + 1);
                let vertex_p = checked(table.vertex(previous(corner_a)), "vertex")?;
                table.map_corner_to_vertex(corner, vertex_p);
                let vert_a_next = checked(table.vertex(next(corner_a)), "vertex")?;
                table.map_corner_to_vertex(corner + 1, vert_a_next);
                let vert_b_prev = checked(table.vertex(previous(corner_b)), "vertex")?;
                table.map_corner_to_vertex(corner + 2, vert_b_prev);
                table.set_left_most_corner(vert_b_prev, corner + 2);

                let mut corner_n = next(corner_b);
                let vertex_n = checked(table.vertex(corner_n), "vertex")?;
                source.merge_vertices(vertex_p, vertex_n);
                table.set_left_most_corner(vertex_p, table.left_most_corner(vertex_n));
                let first = corner_n;
                while corner_n != INVALID {
                    table.map_corner_to_vertex(corner_n, vertex_p);
                    corner_n = table.swing_left(corner_n);
                    if corner_n == first {
                        return corrupt("S symbol merged a closed vertex ring");
                    }
                }
                table.make_vertex_isolated(vertex_n);
                if remove_invalid_vertices {
                    invalid_vertices.push(vertex_n);
                }
                *active.last_mut().ok_or_else(empty_stack)? = corner;
            }
            TOPOLOGY_E => {
                let first_vertex = table.add_new_vertex();
                let second = table.add_new_vertex();
                let third = table.add_new_vertex();
                if table.num_vertices() > max_num_vertices {
                    return corrupt("more vertices than encoded");
                }
                for (offset, vertex) in [first_vertex, second, third].into_iter().enumerate() {
                    table.map_corner_to_vertex(corner + offset as u32, vertex);
                    table.set_left_most_corner(vertex, corner + offset as u32);
                }
                active.push(corner);
                check_topology_split = true;
            }
            other => return corrupt(format!("unknown edgebreaker symbol {other:#x}")),
        }

        let top = *active.last().ok_or_else(empty_stack)?;
        source.new_active_corner_reached(&table, top);

        if check_topology_split {
            let encoder_symbol_id = (num_symbols - symbol_id - 1) as u32;
            while let Some(split) = next_topology_split(&mut splits, encoder_symbol_id)? {
                let top = *active.last().ok_or_else(empty_stack)?;
                let new_active = if split.source_edge == RIGHT_FACE_EDGE {
                    next(top)
                } else {
                    previous(top)
                };
                let decoder_split_id = num_symbols as i64 - i64::from(split.split_symbol) - 1;
                split_active.insert(decoder_split_id, new_active);
            }
        }
    }

    while let Some(corner) = active.pop() {
        if !start_faces.decode_next_bit() {
            continue;
        }
        if decoded_faces >= table.num_faces() {
            return corrupt("more start faces than faces");
        }
        let vert_n = checked(table.vertex(next(corner)), "vertex")?;
        let corner_b = checked(next(table.left_most_corner(vert_n)), "corner")?;
        let vert_x = checked(table.vertex(next(corner_b)), "vertex")?;
        let corner_c = checked(next(table.left_most_corner(vert_x)), "corner")?;
        if corner == corner_b || corner == corner_c || corner_b == corner_c {
            return corrupt("interior start face reuses a corner");
        }
        if table.opposite(corner) != INVALID
            || table.opposite(corner_b) != INVALID
            || table.opposite(corner_c) != INVALID
        {
            return corrupt("interior start face attaches to a closed edge");
        }
        let vert_p = checked(table.vertex(next(corner_c)), "vertex")?;
        let new_corner = (3 * decoded_faces) as u32;
        decoded_faces += 1;
        table.set_opposite_pair(new_corner, corner);
        table.set_opposite_pair(new_corner + 1, corner_b);
        table.set_opposite_pair(new_corner + 2, corner_c);
        table.map_corner_to_vertex(new_corner, vert_x);
        table.map_corner_to_vertex(new_corner + 1, vert_p);
        table.map_corner_to_vertex(new_corner + 2, vert_n);
        for vertex in [vert_x, vert_p, vert_n] {
            is_vert_hole[vertex as usize] = false;
        }
    }
    if decoded_faces != table.num_faces() {
        return corrupt(format!(
            "decoded {decoded_faces} faces but {} were declared",
            table.num_faces()
        ));
    }

    let num_vertices = compact_vertices(&mut table, &mut is_vert_hole, &invalid_vertices)?;

    let mut seam_corners = vec![Vec::new(); num_attribute_data];
    if num_attribute_data > 0 {
        for face in 0..table.num_faces() {
            let first = (3 * face) as u32;
            for corner in [first, next(first), previous(first)] {
                let opposite = table.opposite(corner);
                if opposite == INVALID {
                    // Boundary edges are always seams.
                    for seams in &mut seam_corners {
                        seams.push(corner);
                    }
                    continue;
                }
                if (opposite / 3) < face as u32 {
                    continue;
                }
                for (seams, decoder) in seam_corners.iter_mut().zip(&mut seam_decoders) {
                    if decoder.decode_next_bit() {
                        seams.push(corner);
                    }
                }
            }
        }
    }
    let attribute_data: Vec<AttributeConnectivity> = seam_corners
        .iter()
        .map(|seams| CornerTable::with_seams(&table, seams))
        .collect();

    let (faces, num_points) = if attribute_data.is_empty() {
        let faces = (0..table.num_faces() as u32)
            .map(|f| [table.vertex(3 * f), table.vertex(3 * f + 1), table.vertex(3 * f + 2)])
            .collect();
        (faces, num_vertices)
    } else {
        assign_points_to_corners(&table, &attribute_data, &is_vert_hole)?
    };

    trace!(
        faces = faces.len(),
        points = num_points,
        attribute_data = attribute_data.len(),
        "decoded edgebreaker connectivity"
    );
    Ok(EdgebreakerConnectivity {
        table,
        attribute_data,
        faces,
        num_points,
    })
}

fn empty_stack() -> DracoError {
    DracoError::Corrupt("edgebreaker active edge stack is empty".to_string())
}

fn decode_topology_splits(
    buffer: &mut DecoderBuffer<'_>,
    num_faces: usize,
) -> Result<Vec<TopologySplit>> {
    let count = buffer.read_varint_u32()? as usize;
    if count > num_faces {
        return corrupt("more topology splits than faces");
    }
    let mut splits = Vec::with_capacity(count);
    let mut last_source = 0u32;
    for _ in 0..count {
        let source_symbol = last_source
            .checked_add(buffer.read_varint_u32()?)
            .ok_or_else(|| DracoError::Corrupt("topology split id overflow".to_string()))?;
        let delta = buffer.read_varint_u32()?;
        if delta > source_symbol {
            return corrupt("topology split precedes the stream");
        }
        splits.push(TopologySplit {
            source_symbol,
            split_symbol: source_symbol - delta,
            source_edge: 0,
        });
        last_source = source_symbol;
    }
    if count > 0 {
        buffer.start_bit_decoding(false)?;
        for split in &mut splits {
            split.source_edge = buffer.decode_lsb_bits(1) & 1;
        }
        buffer.end_bit_decoding();
    }
    Ok(splits)
}

/// Pops the split event whose source is `encoder_symbol_id`, if it is next.
fn next_topology_split(
    splits: &mut Vec<TopologySplit>,
    encoder_symbol_id: u32,
) -> Result<Option<TopologySplit>> {
    let Some(split) = splits.last().copied() else {
        return Ok(None);
    };
    if split.source_symbol > encoder_symbol_id {
        return corrupt("topology split event was skipped");
    }
    if split.source_symbol != encoder_symbol_id {
        return Ok(None);
    }
    splits.pop();
    Ok(Some(split))
}

/// Moves vertices isolated by S merges to the end of the id range; returns the
/// number of live vertices.
fn compact_vertices(
    table: &mut CornerTable,
    is_vert_hole: &mut [bool],
    invalid_vertices: &[u32],
) -> Result<usize> {
    let mut num_vertices = table.num_vertices();
    for &invalid in invalid_vertices {
        if num_vertices == 0 {
            break;
        }
        let mut src = (num_vertices - 1) as u32;
        while table.left_most_corner(src) == INVALID {
            num_vertices -= 1;
            if num_vertices == 0 {
                return Ok(0);
            }
            src = (num_vertices - 1) as u32;
        }
        if src < invalid {
            continue;
        }
        for corner in table.corners_around(table.left_most_corner(src)) {
            if table.vertex(corner) != src {
                return corrupt("vertex ring crosses another vertex");
            }
            table.map_corner_to_vertex(corner, invalid);
        }
        table.set_left_most_corner(invalid, table.left_most_corner(src));
        table.make_vertex_isolated(src);
        is_vert_hole[invalid as usize] = is_vert_hole[src as usize];
        is_vert_hole[src as usize] = false;
        num_vertices -= 1;
    }
    Ok(num_vertices)
}

/// Gives every corner a point id, starting a new point wherever any attribute
/// changes value while swinging around a vertex.
fn assign_points_to_corners(
    table: &CornerTable,
    attribute_data: &[AttributeConnectivity],
    is_vert_hole: &[bool],
) -> Result<(Vec<[u32; 3]>, usize)> {
    let limit = table.num_corners();
    let mut corner_to_point = vec![0u32; table.num_corners()];
    let mut num_points = 0u32;

    for v in 0..table.num_vertices() {
        let start = table.left_most_corner(v as u32);
        if start == INVALID {
            continue;
        }
        let mut first = start;
        if !is_vert_hole.get(v).copied().unwrap_or(true) {
            'attributes: for data in attribute_data {
                if !data.is_corner_on_seam(table, start) {
                    continue;
                }
                let vertex_id = data.table.vertex(start);
                let mut act = table.swing_right(start);
                let mut steps = 0;
                while act != start {
                    if act == INVALID || steps > limit {
                        return corrupt("interior vertex ring is open");
                    }
                    if data.table.vertex(act) != vertex_id {
                        first = act;
                        break 'attributes;
                    }
                    act = table.swing_right(act);
                    steps += 1;
                }
            }
        }

        corner_to_point[first as usize] = num_points;
        num_points += 1;
        let mut prev = first;
        let mut corner = table.swing_right(first);
        let mut steps = 0;
        while corner != INVALID && corner != first && steps <= limit {
            let seam = attribute_data
                .iter()
                .any(|data| data.table.vertex(corner) != data.table.vertex(prev));
            corner_to_point[corner as usize] = if seam {
                num_points += 1;
                num_points - 1
            } else {
                corner_to_point[prev as usize]
            };
            prev = corner;
            corner = table.swing_right(corner);
            steps += 1;
        }
    }

    let faces = corner_to_point
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    Ok((faces, num_points as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Header fields for a standard traversal of `symbol_bits` with no splits,
    /// followed by the start-face and seam flag streams.
    fn stream(
        num_vertices: u8,
        num_faces: u8,
        num_attribute_data: u8,
        num_symbols: u8,
        symbol_bits: &[u8],
        start_face_flag: u8,
        seam_flags: &[u8],
    ) -> Vec<u8> {
        let mut bytes = vec![
            STANDARD_TRAVERSAL,
            num_vertices,
            num_faces,
            num_attribute_data,
            num_symbols,
            0, // split symbols
            0, // topology splits
            symbol_bits.len() as u8,
        ];
        bytes.extend_from_slice(symbol_bits);
        bytes.extend_from_slice(&[start_face_flag, 1, 0x01]);
        for &flag in seam_flags {
            bytes.extend_from_slice(&[flag, 1, 0x01]);
        }
        bytes
    }

    // prob_zero 255 decodes 0 from a state of 4097, prob_zero 0 decodes 1.
    const FLAG_FALSE: u8 = 255;
    const FLAG_TRUE: u8 = 0;

    #[test]
    fn test_single_triangle() {
        let bytes = stream(3, 1, 0, 1, &[0b111], FLAG_FALSE, &[]);
        let mut buffer = DecoderBuffer::new(&bytes);
        let connectivity = decode_connectivity(&mut buffer).unwrap();
        assert_eq!(connectivity.faces, vec![[0, 1, 2]]);
        assert_eq!(connectivity.num_points, 3);
        assert_eq!(buffer.remaining_size(), 0);
    }

    #[test]
    fn test_r_symbol_grows_quad() {
        // Decoder order: E then R (bits 111 then 101, least significant first).
        let bytes = stream(4, 2, 0, 2, &[0b10_1111], FLAG_FALSE, &[]);
        let mut buffer = DecoderBuffer::new(&bytes);
        let connectivity = decode_connectivity(&mut buffer).unwrap();
        assert_eq!(connectivity.faces, vec![[0, 1, 2], [2, 1, 3]]);
        assert_eq!(connectivity.table.opposite(0), 5);
        assert_eq!(connectivity.num_points, 4);
    }

    #[test]
    fn test_attribute_seam_splits_points() {
        // The shared edge carries a seam flag for the single attribute slot.
        let bytes = stream(4, 2, 1, 2, &[0b10_1111], FLAG_FALSE, &[FLAG_TRUE]);
        let mut buffer = DecoderBuffer::new(&bytes);
        let connectivity = decode_connectivity(&mut buffer).unwrap();
        assert_eq!(connectivity.num_points, 6);
        let [a, b, c] = connectivity.faces[0];
        let [d, e, f] = connectivity.faces[1];
        let mut all = vec![a, b, c, d, e, f];
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_attribute_without_seam_shares_points() {
        let bytes = stream(4, 2, 1, 2, &[0b10_1111], FLAG_FALSE, &[FLAG_FALSE]);
        let mut buffer = DecoderBuffer::new(&bytes);
        let connectivity = decode_connectivity(&mut buffer).unwrap();
        assert_eq!(connectivity.num_points, 4);
        assert_eq!(connectivity.faces[0][1], connectivity.faces[1][1]);
        assert_eq!(connectivity.faces[0][2], connectivity.faces[1][0]);
    }

    #[test]
    fn test_c_symbol_without_active_edge_is_rejected() {
        let bytes = stream(3, 1, 0, 1, &[0b0], FLAG_FALSE, &[]);
        let mut buffer = DecoderBuffer::new(&bytes);
        assert!(decode_connectivity(&mut buffer).is_err());
    }

    #[test]
    fn test_face_count_must_match_symbols() {
        let bytes = stream(3, 3, 0, 1, &[0b111], FLAG_FALSE, &[]);
        let mut buffer = DecoderBuffer::new(&bytes);
        assert!(decode_connectivity(&mut buffer).is_err());
    }
}
