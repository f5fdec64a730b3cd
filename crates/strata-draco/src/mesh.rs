use crate::error::{corrupt, Result};

/// Semantic of a decoded attribute as the bitstream declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
    TexCoord,
    Generic,
    Tangent,
    Material,
    Joints,
    Weights,
}

impl AttributeKind {
    pub fn from_id(id: u8) -> Result<Self> {
        Ok(match id {
            0 => Self::Position,
            1 => Self::Normal,
            2 => Self::Color,
            3 => Self::TexCoord,
            4 => Self::Generic,
            5 => Self::Tangent,
            6 => Self::Material,
            7 => Self::Joints,
            8 => Self::Weights,
            other => return corrupt(format!("attribute type {other}")),
        })
    }
}

/// Storage type the encoder recorded for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    pub fn from_id(id: u8) -> Result<Self> {
        Ok(match id {
            1 => Self::Int8,
            2 => Self::Uint8,
            3 => Self::Int16,
            4 => Self::Uint16,
            5 => Self::Int32,
            6 => Self::Uint32,
            7 => Self::Int64,
            8 => Self::Uint64,
            9 => Self::Float32,
            10 => Self::Float64,
            11 => Self::Bool,
            other => return corrupt(format!("attribute data type {other}")),
        })
    }

    pub fn byte_length(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Bool => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }
}

/// One decoded attribute: unique values plus the value each point uses.
#[derive(Debug, Clone, PartialEq)]
pub struct DracoAttribute {
    pub unique_id: u32,
    pub kind: AttributeKind,
    pub data_type: DataType,
    pub components: usize,
    pub normalized: bool,
    pub(crate) values: Vec<f32>,
    pub(crate) point_to_value: Vec<u32>,
}

impl DracoAttribute {
    pub fn num_values(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    /// Components of the value mapped to `point`, empty when out of range.
    pub fn point_value(&self, point: usize) -> &[f32] {
        let Some(&value) = self.point_to_value.get(point) else {
            return &[];
        };
        let start = value as usize * self.components;
        self.values
            .get(start..start + self.components)
            .unwrap_or(&[])
    }

    /// Values expanded to one entry per point, ready for a vertex buffer.
    pub fn point_values(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.point_to_value.len() * self.components);
        for point in 0..self.point_to_value.len() {
            out.extend_from_slice(self.point_value(point));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DracoMesh {
    pub faces: Vec<[u32; 3]>,
    pub num_points: usize,
    pub attributes: Vec<DracoAttribute>,
}

impl DracoMesh {
    /// Flattened triangle list.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    pub fn attribute_by_unique_id(&self, unique_id: u32) -> Option<&DracoAttribute> {
        self.attributes.iter().find(|a| a.unique_id == unique_id)
    }

    pub fn named_attribute(&self, kind: AttributeKind) -> Option<&DracoAttribute> {
        self.attributes.iter().find(|a| a.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_values_follow_mapping() {
        let attribute = DracoAttribute {
            unique_id: 0,
            kind: AttributeKind::Position,
            data_type: DataType::Float32,
            components: 2,
            normalized: false,
            values: vec![0.0, 1.0, 2.0, 3.0],
            point_to_value: vec![1, 0, 1],
        };
        assert_eq!(attribute.num_values(), 2);
        assert_eq!(attribute.point_value(0), &[2.0, 3.0]);
        assert!(attribute.point_value(9).is_empty());
        assert_eq!(attribute.point_values(), vec![2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        assert!(AttributeKind::from_id(9).is_err());
        assert!(DataType::from_id(0).is_err());
        assert_eq!(DataType::from_id(9).unwrap().byte_length(), 4);
    }
}
