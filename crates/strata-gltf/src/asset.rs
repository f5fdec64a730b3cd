//! The in-memory asset graph.
//!
//! Entities refer to each other by index into the arrays of [`Asset`]; absent
//! references are `None`. All payload bytes live in [`Asset::arena`] and
//! entities hold byte ranges into it.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::PathBuf;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::accessor::{Accessor, AccessorReader, AttributeSemantic, Buffer, BufferView, ByteSource};
use crate::convert::Transform;
use crate::extensions::Extension;
use crate::uri::ImageFormat;

/// String-valued extras of an entity.
pub type Extras = BTreeMap<String, String>;

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraData {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub generator_name: String,
    pub version: f64,
    pub extras: Vec<ExtraData>,
}

impl Metadata {
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|extra| extra.name == name)
            .map(|extra| extra.value.as_str())
    }
}

// ============================================================================
// Meshes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    pub fn from_gl(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(PrimitiveMode::Points),
            1 => Some(PrimitiveMode::Lines),
            2 => Some(PrimitiveMode::LineLoop),
            3 => Some(PrimitiveMode::LineStrip),
            4 => Some(PrimitiveMode::Triangles),
            5 => Some(PrimitiveMode::TriangleStrip),
            6 => Some(PrimitiveMode::TriangleFan),
            _ => None,
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(
            self,
            PrimitiveMode::Triangles | PrimitiveMode::TriangleStrip | PrimitiveMode::TriangleFan
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMapping {
    pub material: usize,
    pub variants: Vec<usize>,
}

/// `KHR_draco_mesh_compression` payload of a primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DracoCompression {
    pub buffer_view: usize,
    /// Semantic -> attribute id inside the compressed stream.
    pub attributes: BTreeMap<AttributeSemantic, u32>,
}

pub type AttributeMap = BTreeMap<AttributeSemantic, usize>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitive {
    pub mode: PrimitiveMode,
    pub material: Option<usize>,
    pub indices: Option<usize>,
    pub attributes: AttributeMap,
    pub targets: Vec<AttributeMap>,
    pub variant_mappings: Vec<VariantMapping>,
    pub draco: Option<DracoCompression>,
    pub extras: Extras,
}

impl Primitive {
    /// Converted-frame positions.
    pub fn positions(&self, asset: &Asset) -> Option<Vec<Vec3>> {
        let position = *self.attributes.get(&AttributeSemantic::Position)?;
        Some(asset.accessor_reader(position)?.coord_array())
    }

    /// Triangle list expanded from the index stream (or the implicit one) and
    /// the primitive mode. `None` for non-triangle modes or unreadable data.
    pub fn triangles(&self, asset: &Asset) -> Option<Vec<[u32; 3]>> {
        let position = *self.attributes.get(&AttributeSemantic::Position)?;
        let vertex_count = asset.accessor_reader(position)?.count();
        let indices = match self.indices {
            Some(indices) => asset.accessor_reader(indices)?.u32_array(),
            None => (0..vertex_count as u32).collect(),
        };

        let triangles = match self.mode {
            PrimitiveMode::Triangles => indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect(),
            PrimitiveMode::TriangleStrip => indices
                .windows(3)
                .enumerate()
                .map(|(i, w)| if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
                .collect(),
            PrimitiveMode::TriangleFan => match indices.split_first() {
                Some((&hub, rest)) => rest.windows(2).map(|w| [hub, w[0], w[1]]).collect(),
                None => Vec::new(),
            },
            _ => return None,
        };
        Some(triangles)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub unique_id: String,
    pub primitives: Vec<Primitive>,
    pub weights: Vec<f32>,
    pub target_names: Vec<String>,
    pub extras: Extras,
}

// ============================================================================
// Nodes and scenes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    None,
    Transform,
    Joint,
    Mesh,
    MeshSkinned,
    Camera,
    Light,
}

/// `EXT_lights_ies` reference on a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IesLightRef {
    pub light: usize,
    pub multiplier: f32,
    pub color: Option<Vec3>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub index: usize,
    pub name: String,
    pub unique_id: String,
    pub transform: Transform,
    pub children: Vec<usize>,
    pub kind: NodeKind,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub camera: Option<usize>,
    pub light: Option<usize>,
    pub light_ies: Option<IesLightRef>,
    pub weights: Vec<f32>,
    pub extras: Extras,

    /// Nearest parent of any kind.
    pub parent: Option<usize>,
    /// Nearest ancestor that is a joint.
    pub parent_joint: Option<usize>,
    /// Topmost joint reached through `parent_joint`; joints only.
    pub root_joint: Option<usize>,

    /// Skin index -> converted global inverse bind matrix.
    pub skin_global_inverse_bind: BTreeMap<usize, Mat4>,
    /// Skin index -> local bind matrix derived from the inverse bind matrices.
    pub skin_local_bind: BTreeMap<usize, Mat4>,
    /// Local bind pose; `None` means the local transform stands in.
    pub local_bind_pose: Option<Transform>,
    /// Synthesised common parent for a skin's disjoint root joints.
    pub is_proxy_root: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    pub name: String,
    pub unique_id: String,
    pub nodes: Vec<usize>,
    pub extras: Extras,
}

// ============================================================================
// Cameras and lights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        aspect_ratio: f32,
        yfov: f32,
        znear: f32,
        zfar: f32,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: String,
    pub unique_id: String,
    pub projection: Projection,
    /// First node that references this camera.
    pub node: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    Spot { inner_cone_angle: f32, outer_cone_angle: f32 },
}

/// `KHR_lights_punctual` light.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub unique_id: String,
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub range: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IesSource {
    File(PathBuf),
    BufferView { buffer_view: usize, mime_type: String },
}

/// `EXT_lights_ies` light profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IesLight {
    pub name: String,
    pub unique_id: String,
    pub source: Option<IesSource>,
}

// ============================================================================
// Skins and animations
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skin {
    pub name: String,
    pub unique_id: String,
    pub inverse_bind_matrices: Option<usize>,
    pub joints: Vec<usize>,
    /// The `skeleton` declared in the file.
    pub skeleton: Option<usize>,
    /// The common root computed while consolidating root joints. Kept next to
    /// `skeleton` because the two may disagree.
    pub common_root: Option<usize>,
    /// Referenced by at least one node.
    pub used: bool,
    pub extras: Extras,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LINEAR" => Some(Interpolation::Linear),
            "STEP" => Some(Interpolation::Step),
            "CUBICSPLINE" => Some(Interpolation::CubicSpline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

impl AnimationPath {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "translation" => Some(AnimationPath::Translation),
            "rotation" => Some(AnimationPath::Rotation),
            "scale" => Some(AnimationPath::Scale),
            "weights" => Some(AnimationPath::Weights),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationChannel {
    pub sampler: usize,
    pub node: usize,
    pub path: AnimationPath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Animation {
    pub name: String,
    pub unique_id: String,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<AnimationChannel>,
}

// ============================================================================
// Images, samplers and textures
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub unique_id: String,
    pub uri: Option<String>,
    /// Resolved path of an external image.
    pub file_path: Option<PathBuf>,
    pub mime_type: String,
    pub format: ImageFormat,
    pub buffer_view: Option<usize>,
    /// Encoded bytes in the arena, when embedded or loaded.
    pub data: Option<Range<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            9728 => Some(Filter::Nearest),
            9729 => Some(Filter::Linear),
            9984 => Some(Filter::NearestMipmapNearest),
            9985 => Some(Filter::LinearMipmapNearest),
            9986 => Some(Filter::NearestMipmapLinear),
            9987 => Some(Filter::LinearMipmapLinear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl Wrap {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            10497 => Some(Wrap::Repeat),
            33648 => Some(Wrap::MirroredRepeat),
            33071 => Some(Wrap::ClampToEdge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sampler {
    pub name: String,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub unique_id: String,
    pub source: Option<usize>,
    /// `None` uses the default sampler.
    pub sampler: Option<usize>,
}

// ============================================================================
// Materials
// ============================================================================

/// `KHR_texture_transform` of a texture reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub offset: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub tex_coord: Option<u32>,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            tex_coord: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureMap {
    pub texture: Option<usize>,
    pub tex_coord: u32,
    pub transform: Option<TextureTransform>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetallicRoughness {
    pub map: TextureMap,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

impl Default for MetallicRoughness {
    fn default() -> Self {
        Self {
            map: TextureMap::default(),
            metallic_factor: 1.0,
            roughness_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularGlossiness {
    pub diffuse: TextureMap,
    pub diffuse_factor: Vec4,
    pub map: TextureMap,
    pub specular_factor: Vec3,
    pub glossiness_factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clearcoat {
    pub factor: f32,
    pub map: TextureMap,
    pub roughness_factor: f32,
    pub roughness_map: TextureMap,
    pub normal_map: TextureMap,
    pub normal_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transmission {
    pub factor: f32,
    pub map: TextureMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sheen {
    pub color_factor: Vec3,
    pub color_map: TextureMap,
    pub roughness_factor: f32,
    pub roughness_map: TextureMap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specular {
    pub factor: f32,
    pub map: TextureMap,
    pub color_factor: Vec3,
    pub color_map: TextureMap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iridescence {
    pub factor: f32,
    pub map: TextureMap,
    pub ior: f32,
    pub thickness_minimum: f32,
    pub thickness_maximum: f32,
    pub thickness_map: TextureMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anisotropy {
    pub strength: f32,
    pub rotation: f32,
    pub map: TextureMap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    pub thickness_factor: f32,
    pub thickness_map: TextureMap,
    /// `None` is infinite.
    pub attenuation_distance: Option<f32>,
    pub attenuation_color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingKind {
    OcclusionRoughnessMetallic,
    RoughnessMetallicOcclusion,
    NormalRoughnessMetallic,
}

/// MSFT packed texture layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub kind: PackingKind,
    pub map: TextureMap,
    pub normal_map: TextureMap,
}

/// Every texture reference a material can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    BaseColor,
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
    Diffuse,
    SpecularGlossiness,
    Clearcoat,
    ClearcoatRoughness,
    ClearcoatNormal,
    Transmission,
    SheenColor,
    SheenRoughness,
    Specular,
    SpecularColor,
    Iridescence,
    IridescenceThickness,
    Anisotropy,
    VolumeThickness,
    Packing,
    PackingNormal,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 21] = [
        TextureSlot::BaseColor,
        TextureSlot::MetallicRoughness,
        TextureSlot::Normal,
        TextureSlot::Occlusion,
        TextureSlot::Emissive,
        TextureSlot::Diffuse,
        TextureSlot::SpecularGlossiness,
        TextureSlot::Clearcoat,
        TextureSlot::ClearcoatRoughness,
        TextureSlot::ClearcoatNormal,
        TextureSlot::Transmission,
        TextureSlot::SheenColor,
        TextureSlot::SheenRoughness,
        TextureSlot::Specular,
        TextureSlot::SpecularColor,
        TextureSlot::Iridescence,
        TextureSlot::IridescenceThickness,
        TextureSlot::Anisotropy,
        TextureSlot::VolumeThickness,
        TextureSlot::Packing,
        TextureSlot::PackingNormal,
    ];

    /// Slots whose texture is sampled as a tangent-space normal map.
    pub fn is_normal_map(self) -> bool {
        matches!(
            self,
            TextureSlot::Normal | TextureSlot::ClearcoatNormal | TextureSlot::PackingNormal
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub unique_id: String,
    pub base_color: TextureMap,
    pub base_color_factor: Vec4,
    pub metallic_roughness: MetallicRoughness,
    pub normal: TextureMap,
    pub normal_scale: f32,
    pub occlusion: TextureMap,
    pub occlusion_strength: f32,
    pub emissive: TextureMap,
    pub emissive_factor: Vec3,
    pub emissive_strength: Option<f32>,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
    pub unlit: bool,
    pub ior: Option<f32>,
    pub specular_glossiness: Option<SpecularGlossiness>,
    pub clearcoat: Option<Clearcoat>,
    pub transmission: Option<Transmission>,
    pub sheen: Option<Sheen>,
    pub specular: Option<Specular>,
    pub iridescence: Option<Iridescence>,
    pub anisotropy: Option<Anisotropy>,
    pub volume: Option<Volume>,
    pub packing: Option<Packing>,
    pub extras: Extras,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            unique_id: String::new(),
            base_color: TextureMap::default(),
            base_color_factor: Vec4::ONE,
            metallic_roughness: MetallicRoughness::default(),
            normal: TextureMap::default(),
            normal_scale: 1.0,
            occlusion: TextureMap::default(),
            occlusion_strength: 1.0,
            emissive: TextureMap::default(),
            emissive_factor: Vec3::ZERO,
            emissive_strength: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            unlit: false,
            ior: None,
            specular_glossiness: None,
            clearcoat: None,
            transmission: None,
            sheen: None,
            specular: None,
            iridescence: None,
            anisotropy: None,
            volume: None,
            packing: None,
            extras: Extras::new(),
        }
    }
}

impl Material {
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureMap> {
        match slot {
            TextureSlot::BaseColor => Some(&self.base_color),
            TextureSlot::MetallicRoughness => Some(&self.metallic_roughness.map),
            TextureSlot::Normal => Some(&self.normal),
            TextureSlot::Occlusion => Some(&self.occlusion),
            TextureSlot::Emissive => Some(&self.emissive),
            TextureSlot::Diffuse => self.specular_glossiness.as_ref().map(|s| &s.diffuse),
            TextureSlot::SpecularGlossiness => self.specular_glossiness.as_ref().map(|s| &s.map),
            TextureSlot::Clearcoat => self.clearcoat.as_ref().map(|c| &c.map),
            TextureSlot::ClearcoatRoughness => self.clearcoat.as_ref().map(|c| &c.roughness_map),
            TextureSlot::ClearcoatNormal => self.clearcoat.as_ref().map(|c| &c.normal_map),
            TextureSlot::Transmission => self.transmission.as_ref().map(|t| &t.map),
            TextureSlot::SheenColor => self.sheen.as_ref().map(|s| &s.color_map),
            TextureSlot::SheenRoughness => self.sheen.as_ref().map(|s| &s.roughness_map),
            TextureSlot::Specular => self.specular.as_ref().map(|s| &s.map),
            TextureSlot::SpecularColor => self.specular.as_ref().map(|s| &s.color_map),
            TextureSlot::Iridescence => self.iridescence.as_ref().map(|i| &i.map),
            TextureSlot::IridescenceThickness => self.iridescence.as_ref().map(|i| &i.thickness_map),
            TextureSlot::Anisotropy => self.anisotropy.as_ref().map(|a| &a.map),
            TextureSlot::VolumeThickness => self.volume.as_ref().map(|v| &v.thickness_map),
            TextureSlot::Packing => self.packing.as_ref().map(|p| &p.map),
            TextureSlot::PackingNormal => self.packing.as_ref().map(|p| &p.normal_map),
        }
    }

    pub fn texture_mut(&mut self, slot: TextureSlot) -> Option<&mut TextureMap> {
        match slot {
            TextureSlot::BaseColor => Some(&mut self.base_color),
            TextureSlot::MetallicRoughness => Some(&mut self.metallic_roughness.map),
            TextureSlot::Normal => Some(&mut self.normal),
            TextureSlot::Occlusion => Some(&mut self.occlusion),
            TextureSlot::Emissive => Some(&mut self.emissive),
            TextureSlot::Diffuse => self.specular_glossiness.as_mut().map(|s| &mut s.diffuse),
            TextureSlot::SpecularGlossiness => self.specular_glossiness.as_mut().map(|s| &mut s.map),
            TextureSlot::Clearcoat => self.clearcoat.as_mut().map(|c| &mut c.map),
            TextureSlot::ClearcoatRoughness => self.clearcoat.as_mut().map(|c| &mut c.roughness_map),
            TextureSlot::ClearcoatNormal => self.clearcoat.as_mut().map(|c| &mut c.normal_map),
            TextureSlot::Transmission => self.transmission.as_mut().map(|t| &mut t.map),
            TextureSlot::SheenColor => self.sheen.as_mut().map(|s| &mut s.color_map),
            TextureSlot::SheenRoughness => self.sheen.as_mut().map(|s| &mut s.roughness_map),
            TextureSlot::Specular => self.specular.as_mut().map(|s| &mut s.map),
            TextureSlot::SpecularColor => self.specular.as_mut().map(|s| &mut s.color_map),
            TextureSlot::Iridescence => self.iridescence.as_mut().map(|i| &mut i.map),
            TextureSlot::IridescenceThickness => self.iridescence.as_mut().map(|i| &mut i.thickness_map),
            TextureSlot::Anisotropy => self.anisotropy.as_mut().map(|a| &mut a.map),
            TextureSlot::VolumeThickness => self.volume.as_mut().map(|v| &mut v.thickness_map),
            TextureSlot::Packing => self.packing.as_mut().map(|p| &mut p.map),
            TextureSlot::PackingNormal => self.packing.as_mut().map(|p| &mut p.normal_map),
        }
    }

    /// Texture indices referenced through each populated slot.
    pub fn texture_references(&self) -> impl Iterator<Item = (TextureSlot, usize)> + '_ {
        TextureSlot::ALL
            .into_iter()
            .filter_map(|slot| Some((slot, self.texture(slot)?.texture?)))
    }
}

// ============================================================================
// Asset
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Asset {
    pub name: String,
    pub metadata: Metadata,
    /// Owns every payload byte: BIN chunk, decoded data URIs, external files
    /// and decompressed Draco streams.
    pub arena: Vec<u8>,

    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub meshes: Vec<Mesh>,
    pub scenes: Vec<Scene>,
    pub default_scene: Option<usize>,
    pub nodes: Vec<Node>,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub ies_lights: Vec<IesLight>,
    /// `KHR_materials_variants` names.
    pub variants: Vec<String>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
    pub images: Vec<Image>,
    pub samplers: Vec<Sampler>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,

    pub extensions_used: Vec<String>,
    pub extensions_required: Vec<String>,
    pub processed_extensions: BTreeSet<Extension>,
    /// Joints disagree on their local bind pose across skins; bind poses are
    /// ignored for the whole asset.
    pub has_abnormal_inverse_bind_matrices: bool,
}

impl Asset {
    pub fn byte_source(&self) -> ByteSource<'_> {
        ByteSource {
            arena: &self.arena,
            buffers: &self.buffers,
            buffer_views: &self.buffer_views,
        }
    }

    pub fn accessor_reader(&self, accessor: usize) -> Option<AccessorReader<'_>> {
        AccessorReader::new(self.accessors.get(accessor)?, &self.byte_source())
    }

    /// Append bytes to the arena and return their range.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Range<usize> {
        let start = self.arena.len();
        self.arena.extend_from_slice(bytes);
        start..self.arena.len()
    }

    pub fn image_bytes(&self, image: usize) -> Option<&[u8]> {
        let range = self.images.get(image)?.data.clone()?;
        self.arena.get(range)
    }

    pub fn node_by_unique_id(&self, unique_id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.unique_id == unique_id)
    }

    /// Nodes referenced by no scene and no other node's children.
    pub fn orphan_nodes(&self) -> Vec<usize> {
        let mut referenced = vec![false; self.nodes.len()];
        let roots = self.scenes.iter().flat_map(|scene| scene.nodes.iter());
        let children = self.nodes.iter().flat_map(|node| node.children.iter());
        for &index in roots.chain(children) {
            if let Some(flag) = referenced.get_mut(index) {
                *flag = true;
            }
        }
        (0..self.nodes.len()).filter(|&i| !referenced[i]).collect()
    }

    /// `extensionsUsed` split into names the reader understands and the rest.
    pub fn extensions_used_split(&self) -> (Vec<&str>, Vec<&str>) {
        self.extensions_used
            .iter()
            .map(String::as_str)
            .partition(|name| Extension::from_name(name).is_some())
    }
}
