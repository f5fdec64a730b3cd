//! Buffers, buffer views and typed accessor reads.
//!
//! An [`Accessor`] only describes a stream. Reading goes through an
//! [`AccessorReader`], which resolves `accessor -> bufferView -> buffer -> arena`
//! once, bounds-checks the whole stream up front and then applies the sparse
//! overlay transparently on every typed getter.

use std::collections::BTreeMap;
use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use num_traits::{AsPrimitive, Bounded};

use crate::convert::{convert_mat4, convert_quat, convert_vec3};

// ============================================================================
// Element layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    #[default]
    F32,
}

impl ComponentType {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::I8),
            5121 => Some(ComponentType::U8),
            5122 => Some(ComponentType::I16),
            5123 => Some(ComponentType::U16),
            5125 => Some(ComponentType::U32),
            5126 => Some(ComponentType::F32),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessorType {
    #[default]
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "SCALAR" => Some(AccessorType::Scalar),
            "VEC2" => Some(AccessorType::Vec2),
            "VEC3" => Some(AccessorType::Vec3),
            "VEC4" => Some(AccessorType::Vec4),
            "MAT2" => Some(AccessorType::Mat2),
            "MAT3" => Some(AccessorType::Mat3),
            "MAT4" => Some(AccessorType::Mat4),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        let (columns, rows) = self.shape();
        columns * rows
    }

    /// (columns, rows)
    fn shape(self) -> (usize, usize) {
        match self {
            AccessorType::Scalar => (1, 1),
            AccessorType::Vec2 => (1, 2),
            AccessorType::Vec3 => (1, 3),
            AccessorType::Vec4 => (1, 4),
            AccessorType::Mat2 => (2, 2),
            AccessorType::Mat3 => (3, 3),
            AccessorType::Mat4 => (4, 4),
        }
    }
}

/// Byte layout of one element. Matrix columns start on 4-byte boundaries.
#[derive(Debug, Clone, Copy)]
struct ElementLayout {
    rows: usize,
    column_stride: usize,
    component_size: usize,
    size: usize,
}

impl ElementLayout {
    fn new(accessor_type: AccessorType, component_type: ComponentType) -> Self {
        let (columns, rows) = accessor_type.shape();
        let component_size = component_type.size();
        let column_stride = if columns > 1 {
            (rows * component_size + 3) / 4 * 4
        } else {
            rows * component_size
        };
        Self {
            rows,
            column_stride,
            component_size,
            size: columns * column_stride,
        }
    }

    fn component_offset(&self, component: usize) -> usize {
        (component / self.rows) * self.column_stride + (component % self.rows) * self.component_size
    }
}

// ============================================================================
// Buffers and views
// ============================================================================

/// A glTF buffer. Its bytes, when loaded, are a range of the asset arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    pub name: String,
    pub byte_length: usize,
    pub uri: Option<String>,
    pub data: Option<Range<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferView {
    pub name: String,
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Zero means tightly packed.
    pub byte_stride: usize,
}

/// Borrowed view of the asset's byte storage used to resolve accessors.
#[derive(Debug, Clone, Copy)]
pub struct ByteSource<'a> {
    pub arena: &'a [u8],
    pub buffers: &'a [Buffer],
    pub buffer_views: &'a [BufferView],
}

impl<'a> ByteSource<'a> {
    pub fn buffer_bytes(&self, buffer: usize) -> Option<&'a [u8]> {
        let range = self.buffers.get(buffer)?.data.clone()?;
        self.arena.get(range)
    }

    pub fn view_bytes(&self, view: usize) -> Option<&'a [u8]> {
        let view = self.buffer_views.get(view)?;
        let bytes = self.buffer_bytes(view.buffer)?;
        let end = view.byte_offset.checked_add(view.byte_length)?;
        bytes.get(view.byte_offset..end)
    }
}

// ============================================================================
// Accessor
// ============================================================================

/// Where an accessor's dense data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessorState {
    /// Malformed accessor; reads as absent.
    #[default]
    Invalid,
    /// Declared without a `bufferView`. Draco primitives fill these in later;
    /// a sparse-only accessor reads from a zero base.
    Pending,
    Backed { buffer_view: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseIndices {
    pub buffer_view: usize,
    pub byte_offset: usize,
    pub component_type: ComponentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseValues {
    pub buffer_view: usize,
    pub byte_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accessor {
    pub name: String,
    pub state: AccessorState,
    pub byte_offset: usize,
    pub count: usize,
    pub accessor_type: AccessorType,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Set on vertex attribute accessors when `KHR_mesh_quantization` is required.
    pub quantized: bool,
    pub sparse: Option<Sparse>,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl Accessor {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.state == AccessorState::Pending
    }

    /// Whether the accessor can produce data: backed, or sparse over a zero base.
    pub fn is_valid(&self) -> bool {
        match self.state {
            AccessorState::Invalid => false,
            AccessorState::Pending => self.sparse.is_some(),
            AccessorState::Backed { .. } => true,
        }
    }

    pub fn element_size(&self) -> usize {
        ElementLayout::new(self.accessor_type, self.component_type).size
    }

    /// Replace a pending accessor's storage with a freshly created view.
    pub fn back_with(&mut self, buffer_view: usize, component_type: ComponentType) {
        self.state = AccessorState::Backed { buffer_view };
        self.byte_offset = 0;
        self.component_type = component_type;
        self.normalized = false;
    }
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Strided<'a> {
    bytes: &'a [u8],
    stride: usize,
}

#[derive(Debug, Clone)]
struct SparseOverlay<'a> {
    /// Element index -> position in `values`.
    positions: BTreeMap<u32, usize>,
    values: &'a [u8],
}

/// Bounds-checked typed reads of one accessor.
#[derive(Debug, Clone)]
pub struct AccessorReader<'a> {
    accessor: &'a Accessor,
    layout: ElementLayout,
    dense: Option<Strided<'a>>,
    sparse: Option<SparseOverlay<'a>>,
}

impl<'a> AccessorReader<'a> {
    /// `None` when the accessor is invalid, still pending without a sparse
    /// block, or any referenced range falls outside its buffer.
    pub fn new(accessor: &'a Accessor, source: &ByteSource<'a>) -> Option<Self> {
        let layout = ElementLayout::new(accessor.accessor_type, accessor.component_type);

        let dense = match accessor.state {
            AccessorState::Invalid => return None,
            AccessorState::Pending if accessor.sparse.is_none() => return None,
            AccessorState::Pending => None,
            AccessorState::Backed { buffer_view } => {
                let view = source.buffer_views.get(buffer_view)?;
                let bytes = source.view_bytes(buffer_view)?.get(accessor.byte_offset..)?;
                let stride = if view.byte_stride > 0 { view.byte_stride } else { layout.size };
                if accessor.count > 0 {
                    let needed = (accessor.count - 1).checked_mul(stride)?.checked_add(layout.size)?;
                    if needed > bytes.len() {
                        return None;
                    }
                }
                Some(Strided { bytes, stride })
            }
        };

        let sparse = match &accessor.sparse {
            None => None,
            Some(sparse) => Some(Self::sparse_overlay(sparse, accessor.count, layout, source)?),
        };

        Some(Self {
            accessor,
            layout,
            dense,
            sparse,
        })
    }

    fn sparse_overlay(
        sparse: &Sparse,
        count: usize,
        layout: ElementLayout,
        source: &ByteSource<'a>,
    ) -> Option<SparseOverlay<'a>> {
        let index_size = sparse.indices.component_type.size();
        let index_bytes = source
            .view_bytes(sparse.indices.buffer_view)?
            .get(sparse.indices.byte_offset..)?
            .get(..sparse.count.checked_mul(index_size)?)?;
        let values = source
            .view_bytes(sparse.values.buffer_view)?
            .get(sparse.values.byte_offset..)?
            .get(..sparse.count.checked_mul(layout.size)?)?;

        let mut positions = BTreeMap::new();
        for (position, raw) in index_bytes.chunks_exact(index_size).enumerate() {
            let index = match sparse.indices.component_type {
                ComponentType::U8 => u32::from(raw[0]),
                ComponentType::U16 => u32::from(LittleEndian::read_u16(raw)),
                ComponentType::U32 => LittleEndian::read_u32(raw),
                _ => return None,
            };
            if index as usize >= count {
                return None;
            }
            // Later entries win on duplicates.
            positions.insert(index, position);
        }
        Some(SparseOverlay { positions, values })
    }

    pub fn accessor(&self) -> &'a Accessor {
        self.accessor
    }

    pub fn count(&self) -> usize {
        self.accessor.count
    }

    /// Raw bytes of element `index`; `None` for the zero base of sparse-only data.
    fn element(&self, index: usize) -> Option<&'a [u8]> {
        if let Some(sparse) = &self.sparse {
            if let Some(&position) = sparse.positions.get(&(index as u32)) {
                let start = position * self.layout.size;
                return sparse.values.get(start..start + self.layout.size);
            }
        }
        let dense = self.dense?;
        let start = index * dense.stride;
        dense.bytes.get(start..start + self.layout.size)
    }

    fn component_f32(&self, element: &[u8], component: usize) -> f32 {
        let at = self.layout.component_offset(component);
        let normalized = self.accessor.normalized;
        match self.accessor.component_type {
            ComponentType::I8 => integer(element[at] as i8, normalized),
            ComponentType::U8 => integer(element[at], normalized),
            ComponentType::I16 => integer(LittleEndian::read_i16(&element[at..]), normalized),
            ComponentType::U16 => integer(LittleEndian::read_u16(&element[at..]), normalized),
            ComponentType::U32 => integer(LittleEndian::read_u32(&element[at..]), normalized),
            ComponentType::F32 => LittleEndian::read_f32(&element[at..]),
        }
    }

    fn component_u32(&self, element: &[u8], component: usize) -> u32 {
        let at = self.layout.component_offset(component);
        match self.accessor.component_type {
            ComponentType::I8 => (element[at] as i8).max(0) as u32,
            ComponentType::U8 => u32::from(element[at]),
            ComponentType::I16 => LittleEndian::read_i16(&element[at..]).max(0) as u32,
            ComponentType::U16 => u32::from(LittleEndian::read_u16(&element[at..])),
            ComponentType::U32 => LittleEndian::read_u32(&element[at..]),
            ComponentType::F32 => LittleEndian::read_f32(&element[at..]).max(0.0) as u32,
        }
    }

    /// First `N` components of element `index`; components the type lacks read as zero.
    fn read<const N: usize>(&self, index: usize) -> Option<[f32; N]> {
        if index >= self.accessor.count {
            return None;
        }
        let mut out = [0.0; N];
        if let Some(element) = self.element(index) {
            let available = self.accessor.accessor_type.components().min(N);
            for (component, value) in out.iter_mut().enumerate().take(available) {
                *value = self.component_f32(element, component);
            }
        }
        Some(out)
    }

    pub fn scalar_f32(&self, index: usize) -> Option<f32> {
        self.read::<1>(index).map(|[v]| v)
    }

    pub fn scalar_u32(&self, index: usize) -> Option<u32> {
        if index >= self.accessor.count {
            return None;
        }
        Some(self.element(index).map_or(0, |element| self.component_u32(element, 0)))
    }

    pub fn vec2(&self, index: usize) -> Option<Vec2> {
        self.read::<2>(index).map(Vec2::from_array)
    }

    pub fn vec3(&self, index: usize) -> Option<Vec3> {
        self.read::<3>(index).map(Vec3::from_array)
    }

    pub fn vec4(&self, index: usize) -> Option<Vec4> {
        self.read::<4>(index).map(Vec4::from_array)
    }

    /// Column-major 4x4 matrix, without basis change.
    pub fn mat4(&self, index: usize) -> Option<Mat4> {
        self.read::<16>(index).map(|m| Mat4::from_cols_array(&m))
    }

    fn collect<T>(&self, get: impl Fn(&Self, usize) -> Option<T>) -> Vec<T> {
        (0..self.accessor.count).filter_map(|i| get(self, i)).collect()
    }

    pub fn f32_array(&self) -> Vec<f32> {
        self.collect(Self::scalar_f32)
    }

    pub fn u32_array(&self) -> Vec<u32> {
        self.collect(Self::scalar_u32)
    }

    pub fn vec2_array(&self) -> Vec<Vec2> {
        self.collect(Self::vec2)
    }

    pub fn vec3_array(&self) -> Vec<Vec3> {
        self.collect(Self::vec3)
    }

    pub fn vec4_array(&self) -> Vec<Vec4> {
        self.collect(Self::vec4)
    }

    pub fn mat4_array(&self) -> Vec<Mat4> {
        self.collect(Self::mat4)
    }

    /// Positions, normals and other directions in the converted frame.
    pub fn coord_array(&self) -> Vec<Vec3> {
        self.collect(|r, i| r.vec3(i).map(convert_vec3))
    }

    /// Rotations in the converted frame.
    pub fn quat_array(&self) -> Vec<Quat> {
        self.collect(|r, i| r.vec4(i).map(|v| convert_quat(Quat::from_vec4(v))))
    }

    /// Matrices in the converted frame.
    pub fn converted_mat4_array(&self) -> Vec<Mat4> {
        self.collect(|r, i| r.mat4(i).map(convert_mat4))
    }
}

fn integer<T>(value: T, normalized: bool) -> f32
where
    T: AsPrimitive<f32> + Bounded,
{
    if normalized {
        (value.as_() / T::max_value().as_()).max(-1.0)
    } else {
        value.as_()
    }
}

// ============================================================================
// Attribute semantics
// ============================================================================

/// Vertex attribute semantics with typing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
}

impl AttributeSemantic {
    /// Parse a glTF attribute name. Application-specific `_NAME` attributes and
    /// unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let set = |prefix: &str| name.strip_prefix(prefix).and_then(|n| n.parse::<u32>().ok());
        match name {
            "POSITION" => Some(AttributeSemantic::Position),
            "NORMAL" => Some(AttributeSemantic::Normal),
            "TANGENT" => Some(AttributeSemantic::Tangent),
            _ => set("TEXCOORD_")
                .map(AttributeSemantic::TexCoord)
                .or_else(|| set("COLOR_").map(AttributeSemantic::Color))
                .or_else(|| set("JOINTS_").map(AttributeSemantic::Joints))
                .or_else(|| set("WEIGHTS_").map(AttributeSemantic::Weights)),
        }
    }

    /// Attributes affected by `KHR_mesh_quantization`.
    pub fn is_quantizable(self) -> bool {
        matches!(
            self,
            AttributeSemantic::Position
                | AttributeSemantic::Normal
                | AttributeSemantic::Tangent
                | AttributeSemantic::TexCoord(_)
        )
    }
}

/// What an accessor is used for, for [`is_valid_data_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUsage {
    Attribute(AttributeSemantic),
    Indices,
}

/// glTF per-semantic typing rules, widened by `KHR_mesh_quantization` when
/// the accessor is flagged quantized.
pub fn is_valid_data_type(usage: DataUsage, accessor: &Accessor) -> bool {
    use AccessorType as T;
    use ComponentType as C;

    let ty = accessor.accessor_type;
    let ct = accessor.component_type;
    let norm = accessor.normalized;
    let quantized = accessor.quantized;

    let float = ct == C::F32;
    let unorm_8_16 = norm && matches!(ct, C::U8 | C::U16);
    let snorm_8_16 = norm && matches!(ct, C::I8 | C::I16);
    let any_8_16 = matches!(ct, C::I8 | C::U8 | C::I16 | C::U16);

    match usage {
        DataUsage::Indices => ty == T::Scalar && !norm && matches!(ct, C::U8 | C::U16 | C::U32),
        DataUsage::Attribute(semantic) => match semantic {
            AttributeSemantic::Position => ty == T::Vec3 && (float || (quantized && any_8_16)),
            AttributeSemantic::Normal => ty == T::Vec3 && (float || (quantized && snorm_8_16)),
            AttributeSemantic::Tangent => ty == T::Vec4 && (float || (quantized && snorm_8_16)),
            AttributeSemantic::TexCoord(_) => {
                ty == T::Vec2 && (float || unorm_8_16 || (quantized && any_8_16))
            }
            AttributeSemantic::Color(_) => matches!(ty, T::Vec3 | T::Vec4) && (float || unorm_8_16),
            AttributeSemantic::Joints(_) => ty == T::Vec4 && !norm && matches!(ct, C::U8 | C::U16),
            AttributeSemantic::Weights(_) => ty == T::Vec4 && (float || unorm_8_16),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn source_for<'a>(arena: &'a [u8], buffers: &'a [Buffer], views: &'a [BufferView]) -> ByteSource<'a> {
        ByteSource {
            arena,
            buffers,
            buffer_views: views,
        }
    }

    fn whole_buffer(len: usize) -> Vec<Buffer> {
        vec![Buffer {
            byte_length: len,
            data: Some(0..len),
            ..Default::default()
        }]
    }

    #[test]
    fn test_interleaved_vec3() {
        // Two elements, stride 16 (vec3 + 4 padding bytes).
        let mut arena = Vec::new();
        for v in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]] {
            for c in v {
                arena.write_f32::<LittleEndian>(c).unwrap();
            }
            arena.write_u32::<LittleEndian>(0xDEAD_BEEF).unwrap();
        }
        let buffers = whole_buffer(arena.len());
        let views = vec![BufferView {
            buffer: 0,
            byte_length: arena.len(),
            byte_stride: 16,
            ..Default::default()
        }];
        let accessor = Accessor {
            state: AccessorState::Backed { buffer_view: 0 },
            count: 2,
            accessor_type: AccessorType::Vec3,
            ..Default::default()
        };
        let source = source_for(&arena, &buffers, &views);
        let reader = AccessorReader::new(&accessor, &source).unwrap();
        assert_eq!(reader.vec3_array(), vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
        assert_eq!(reader.coord_array()[1], Vec3::new(4.0, 6.0, 5.0));
        assert_eq!(reader.vec3(2), None);
    }

    #[test]
    fn test_out_of_range_is_unreadable() {
        let arena = vec![0u8; 8];
        let buffers = whole_buffer(8);
        let views = vec![BufferView {
            buffer: 0,
            byte_length: 8,
            ..Default::default()
        }];
        let accessor = Accessor {
            state: AccessorState::Backed { buffer_view: 0 },
            count: 3,
            ..Default::default()
        };
        assert!(AccessorReader::new(&accessor, &source_for(&arena, &buffers, &views)).is_none());
    }

    #[test]
    fn test_normalized_components() {
        let arena = vec![255u8, 0, 128, 0x81];
        let buffers = whole_buffer(4);
        let views = vec![BufferView {
            buffer: 0,
            byte_length: 4,
            ..Default::default()
        }];
        let unsigned = Accessor {
            state: AccessorState::Backed { buffer_view: 0 },
            count: 1,
            accessor_type: AccessorType::Vec4,
            component_type: ComponentType::U8,
            normalized: true,
            ..Default::default()
        };
        let source = source_for(&arena, &buffers, &views);
        let v = AccessorReader::new(&unsigned, &source).unwrap().vec4(0).unwrap();
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 0.0);
        assert!((v.z - 128.0 / 255.0).abs() < 1e-6);

        let signed = Accessor {
            component_type: ComponentType::I8,
            ..unsigned
        };
        let v = AccessorReader::new(&signed, &source).unwrap().vec4(0).unwrap();
        assert_eq!(v.x, -1.0 / 127.0);
        // -127 maps to exactly -1.
        assert_eq!(v.w, -1.0);
    }

    #[test]
    fn test_sparse_only_accessor_reads_zero_base() {
        let mut arena = Vec::new();
        arena.write_u16::<LittleEndian>(2).unwrap();
        arena.write_u16::<LittleEndian>(0).unwrap();
        arena.write_f32::<LittleEndian>(7.5).unwrap();
        let buffers = whole_buffer(arena.len());
        let views = vec![
            BufferView {
                buffer: 0,
                byte_length: 4,
                ..Default::default()
            },
            BufferView {
                buffer: 0,
                byte_offset: 4,
                byte_length: 4,
                ..Default::default()
            },
        ];
        let accessor = Accessor {
            state: AccessorState::Pending,
            count: 4,
            sparse: Some(Sparse {
                count: 1,
                indices: SparseIndices {
                    buffer_view: 0,
                    byte_offset: 0,
                    component_type: ComponentType::U16,
                },
                values: SparseValues {
                    buffer_view: 1,
                    byte_offset: 0,
                },
            }),
            ..Default::default()
        };
        let reader = AccessorReader::new(&accessor, &source_for(&arena, &buffers, &views)).unwrap();
        assert_eq!(reader.f32_array(), vec![0.0, 0.0, 7.5, 0.0]);
    }

    #[test]
    fn test_mat3_columns_are_padded() {
        // MAT3 of i8: three 3-byte columns, each padded to 4 bytes.
        let arena: Vec<u8> = vec![1, 2, 3, 0, 4, 5, 6, 0, 7, 8, 9, 0];
        let buffers = whole_buffer(arena.len());
        let views = vec![BufferView {
            buffer: 0,
            byte_length: arena.len(),
            ..Default::default()
        }];
        let accessor = Accessor {
            state: AccessorState::Backed { buffer_view: 0 },
            count: 1,
            accessor_type: AccessorType::Mat3,
            component_type: ComponentType::I8,
            ..Default::default()
        };
        assert_eq!(accessor.element_size(), 12);
        let reader = AccessorReader::new(&accessor, &source_for(&arena, &buffers, &views)).unwrap();
        assert_eq!(reader.read::<9>(0).unwrap(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_semantic_parsing() {
        assert_eq!(AttributeSemantic::parse("TEXCOORD_1"), Some(AttributeSemantic::TexCoord(1)));
        assert_eq!(AttributeSemantic::parse("JOINTS_0"), Some(AttributeSemantic::Joints(0)));
        assert_eq!(AttributeSemantic::parse("_BATCHID"), None);
        assert_eq!(AttributeSemantic::parse("COLOR_x"), None);
    }

    #[test]
    fn test_quantization_widens_position() {
        let mut accessor = Accessor {
            state: AccessorState::Backed { buffer_view: 0 },
            accessor_type: AccessorType::Vec3,
            component_type: ComponentType::U16,
            ..Default::default()
        };
        let position = DataUsage::Attribute(AttributeSemantic::Position);
        assert!(!is_valid_data_type(position, &accessor));
        accessor.quantized = true;
        assert!(is_valid_data_type(position, &accessor));
        assert!(!is_valid_data_type(DataUsage::Attribute(AttributeSemantic::Normal), &accessor));
    }

    #[test]
    fn test_index_rules() {
        let accessor = Accessor {
            accessor_type: AccessorType::Scalar,
            component_type: ComponentType::U16,
            ..Default::default()
        };
        assert!(is_valid_data_type(DataUsage::Indices, &accessor));
        let floats = Accessor {
            component_type: ComponentType::F32,
            ..accessor
        };
        assert!(!is_valid_data_type(DataUsage::Indices, &floats));
    }
}
