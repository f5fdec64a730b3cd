//! Attribute descriptors and value decoding.
//!
//! Each attributes decoder owns a group of attributes that share one value
//! order. A group is decoded in three passes over the stream: portable integer
//! (or raw) values for every attribute, then the parameters their transforms
//! need, then the conversion back to the declared format.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::buffer::{bitstream_version, DecoderBuffer};
use crate::error::{corrupt, DracoError, Result};
use crate::mesh::{AttributeKind, DataType, DracoAttribute};
use crate::prediction::{
    MeshContext, OctahedronToolBox, ParentPositions, PredictionMethod, PredictionScheme,
    Transform, TransformKind,
};
use crate::symbols::{decode_symbols, symbol_to_signed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueCoding {
    Generic,
    Integer,
    Quantized,
    Normals,
}

impl ValueCoding {
    fn from_id(id: u8) -> Result<Self> {
        Ok(match id {
            0 => Self::Generic,
            1 => Self::Integer,
            2 => Self::Quantized,
            3 => Self::Normals,
            other => return Err(DracoError::Unsupported(format!("value decoder {other}"))),
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeSlot {
    pub kind: AttributeKind,
    pub data_type: DataType,
    pub components: usize,
    pub normalized: bool,
    pub unique_id: u32,
    pub coding: ValueCoding,
    portable: Option<Vec<i32>>,
    values: Vec<f32>,
    point_to_value: Vec<u32>,
    quantization: Option<Quantization>,
    normal_bits: u32,
}

impl AttributeSlot {
    fn portable_components(&self) -> usize {
        match self.coding {
            ValueCoding::Normals => 2,
            _ => self.components,
        }
    }

    pub fn into_attribute(self) -> DracoAttribute {
        DracoAttribute {
            unique_id: self.unique_id,
            kind: self.kind,
            data_type: self.data_type,
            components: self.components,
            normalized: self.normalized,
            values: self.values,
            point_to_value: self.point_to_value,
        }
    }
}

#[derive(Debug, Clone)]
struct Quantization {
    min: Vec<f32>,
    range: f32,
    bits: u32,
}

/// Reads one decoder's attribute descriptors and value decoder ids, appending
/// to `slots`. Returns the slot indices the decoder owns.
pub(crate) fn decode_group_descriptors(
    buffer: &mut DecoderBuffer<'_>,
    slots: &mut Vec<AttributeSlot>,
) -> Result<Vec<usize>> {
    let num_attributes = buffer.read_count()? as usize;
    if num_attributes == 0 {
        return corrupt("attributes decoder without attributes");
    }
    if num_attributes > 5 * buffer.remaining_size() {
        return Err(DracoError::UnexpectedEnd("attribute descriptors"));
    }
    let first = slots.len();
    for _ in 0..num_attributes {
        let kind = AttributeKind::from_id(buffer.read_u8()?)?;
        let data_type = DataType::from_id(buffer.read_u8()?)?;
        let components = usize::from(buffer.read_u8()?);
        if components == 0 {
            return corrupt("attribute without components");
        }
        let normalized = buffer.read_u8()? > 0;
        let unique_id = if buffer.version() < bitstream_version(1, 3) {
            u32::from(buffer.read_u16()?)
        } else {
            buffer.read_varint_u32()?
        };
        slots.push(AttributeSlot {
            kind,
            data_type,
            components,
            normalized,
            unique_id,
            coding: ValueCoding::Generic,
            portable: None,
            values: Vec::new(),
            point_to_value: Vec::new(),
            quantization: None,
            normal_bits: 0,
        });
    }
    for slot in &mut slots[first..] {
        let coding = ValueCoding::from_id(buffer.read_u8()?)?;
        let float = slot.data_type == DataType::Float32;
        match coding {
            ValueCoding::Quantized | ValueCoding::Normals if !float => {
                return corrupt("quantized attributes must be 32-bit floats");
            }
            ValueCoding::Normals if slot.components != 3 => {
                return corrupt("normal attributes must have three components");
            }
            _ => {}
        }
        slot.coding = coding;
    }
    Ok((first..slots.len()).collect())
}

/// Value order of one attributes decoder.
pub(crate) struct Sequence<'m> {
    /// Point owning each value, in stream order.
    pub point_ids: &'m [u32],
    pub point_to_value: Vec<u32>,
    pub mesh: Option<MeshContext<'m>>,
}

/// Decodes every attribute of one group in stream order.
pub(crate) fn decode_group(
    buffer: &mut DecoderBuffer<'_>,
    group: &[usize],
    sequence: &Sequence<'_>,
    slots: &mut [AttributeSlot],
) -> Result<()> {
    for &index in group {
        let slot = &slots[index];
        let components = slot.portable_components();
        let coding = slot.coding;
        let data_type = slot.data_type;
        match coding {
            ValueCoding::Generic => {
                let count = sequence.point_ids.len() * components;
                slots[index].values = decode_raw_values(buffer, data_type, count)?;
            }
            _ => {
                let portable = {
                    let parent = position_parent(slots);
                    decode_integer_values(buffer, components, coding, sequence, parent)?
                };
                slots[index].portable = Some(portable);
            }
        }
        slots[index].point_to_value = sequence.point_to_value.clone();
    }

    for &index in group {
        let slot = &mut slots[index];
        match slot.coding {
            ValueCoding::Quantized => {
                let min = (0..slot.components)
                    .map(|_| buffer.read_f32())
                    .collect::<Result<Vec<_>>>()?;
                let range = buffer.read_f32()?;
                let bits = u32::from(buffer.read_u8()?);
                if !(1..=30).contains(&bits) {
                    return corrupt(format!("quantization bits {bits}"));
                }
                slot.quantization = Some(Quantization { min, range, bits });
            }
            ValueCoding::Normals => {
                slot.normal_bits = u32::from(buffer.read_u8()?);
            }
            ValueCoding::Generic | ValueCoding::Integer => {}
        }
    }

    for &index in group {
        let slot = &mut slots[index];
        let portable = slot.portable.as_deref().unwrap_or(&[]);
        let values = match slot.coding {
            ValueCoding::Generic => continue,
            ValueCoding::Integer => store_integers(portable, slot.data_type)?,
            ValueCoding::Quantized => {
                let Some(q) = &slot.quantization else {
                    return corrupt("missing quantization parameters");
                };
                dequantize(portable, q)
            }
            ValueCoding::Normals => {
                let tool_box = OctahedronToolBox::new(slot.normal_bits)?;
                portable
                    .chunks_exact(2)
                    .flat_map(|st| tool_box.quantized_octahedral_to_unit_vector(st[0], st[1]))
                    .collect()
            }
        };
        trace!(
            unique_id = slot.unique_id,
            kind = ?slot.kind,
            values = values.len() / slot.components,
            "decoded draco attribute"
        );
        slot.values = values;
    }
    Ok(())
}

/// Integer positions usable as a prediction parent, if already decoded.
fn position_parent<'s>(slots: &'s [AttributeSlot]) -> Option<ParentPositions<'s>> {
    let position = slots.iter().find(|s| s.kind == AttributeKind::Position)?;
    if position.components != 3 {
        return None;
    }
    let values = position.portable.as_deref()?;
    Some(ParentPositions {
        values,
        components: 3,
        point_to_value: &position.point_to_value,
    })
}

fn decode_integer_values(
    buffer: &mut DecoderBuffer<'_>,
    components: usize,
    coding: ValueCoding,
    sequence: &Sequence<'_>,
    parent: Option<ParentPositions<'_>>,
) -> Result<Vec<i32>> {
    let mut scheme = None;
    if let Some(method) = PredictionMethod::from_id(buffer.read_i8()?)? {
        let kind = TransformKind::from_id(buffer.read_i8()?)?;
        let supported = match coding {
            ValueCoding::Normals => matches!(
                kind,
                TransformKind::NormalOctahedron | TransformKind::NormalOctahedronCanonicalized
            ),
            _ => kind == TransformKind::Wrap,
        };
        if supported {
            scheme = Some(PredictionScheme::new(
                method,
                Transform::new(kind),
                sequence.mesh,
                parent,
            )?);
        }
    }

    let num_values = sequence.point_ids.len() * components;
    let compressed = buffer.read_u8()?;
    let mut values: Vec<i32> = if compressed > 0 {
        decode_symbols(buffer, num_values, components)?
            .into_iter()
            .map(|s| s as i32)
            .collect()
    } else {
        let num_bytes = usize::from(buffer.read_u8()?);
        match num_bytes {
            0 => vec![0; num_values],
            1..=4 => buffer
                .read_bytes(num_bytes * num_values, "raw integer values")?
                .chunks_exact(num_bytes)
                .map(|bytes| LittleEndian::read_uint(bytes, num_bytes) as u32 as i32)
                .collect(),
            _ => return corrupt(format!("raw integer width {num_bytes}")),
        }
    };

    let positive = scheme
        .as_ref()
        .is_some_and(PredictionScheme::corrections_positive);
    if !positive {
        for value in &mut values {
            *value = symbol_to_signed(*value as u32);
        }
    }
    if let Some(scheme) = &mut scheme {
        trace!(method = ?scheme.method(), "reverting attribute prediction");
        scheme.decode_prediction_data(buffer)?;
        scheme.compute_original_values(&mut values, components, sequence.point_ids)?;
    }
    Ok(values)
}

fn decode_raw_values(
    buffer: &mut DecoderBuffer<'_>,
    data_type: DataType,
    count: usize,
) -> Result<Vec<f32>> {
    let width = data_type.byte_length();
    let bytes = buffer.read_bytes(width * count, "raw attribute values")?;
    Ok(bytes
        .chunks_exact(width)
        .map(|b| match data_type {
            DataType::Int8 => b[0] as i8 as f32,
            DataType::Uint8 => f32::from(b[0]),
            DataType::Bool => f32::from(u8::from(b[0] != 0)),
            DataType::Int16 => f32::from(LittleEndian::read_i16(b)),
            DataType::Uint16 => f32::from(LittleEndian::read_u16(b)),
            DataType::Int32 => LittleEndian::read_i32(b) as f32,
            DataType::Uint32 => LittleEndian::read_u32(b) as f32,
            DataType::Int64 => LittleEndian::read_i64(b) as f32,
            DataType::Uint64 => LittleEndian::read_u64(b) as f32,
            DataType::Float32 => LittleEndian::read_f32(b),
            DataType::Float64 => LittleEndian::read_f64(b) as f32,
        })
        .collect())
}

/// Casts portable integers into the declared integer type.
fn store_integers(portable: &[i32], data_type: DataType) -> Result<Vec<f32>> {
    let cast = |v: i32| match data_type {
        DataType::Int8 => Some(v as i8 as f32),
        DataType::Uint8 => Some(v as u8 as f32),
        DataType::Int16 => Some(v as i16 as f32),
        DataType::Uint16 => Some(v as u16 as f32),
        DataType::Int32 => Some(v as f32),
        DataType::Uint32 => Some(v as u32 as f32),
        _ => None,
    };
    if cast(0).is_none() {
        return Err(DracoError::Unsupported(format!(
            "integer coding for {data_type:?} attributes"
        )));
    }
    Ok(portable.iter().filter_map(|&v| cast(v)).collect())
}

fn dequantize(portable: &[i32], q: &Quantization) -> Vec<f32> {
    let max_quantized = ((1u32 << q.bits) - 1) as f32;
    let delta = q.range / max_quantized;
    let components = q.min.len().max(1);
    portable
        .iter()
        .enumerate()
        .map(|(i, &v)| v as f32 * delta + q.min[i % components])
        .collect()
}
