//! glTF file reader.
//!
//! [`FileReader::read_file`] runs the import as a sequence of phases. Each
//! phase walks one top-level JSON array; an Error-severity message emitted
//! during a phase aborts the read and no asset is returned. Warnings never
//! abort.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::accessor::{
    Accessor, AccessorState, AccessorType, AttributeSemantic, Buffer, BufferView, ComponentType, Sparse,
    SparseIndices, SparseValues,
};
use crate::animation::DEFAULT_PAYLOAD_BATCH_SIZE;
use crate::asset::{
    AlphaMode, Animation, AnimationChannel, AnimationPath, AnimationSampler, Asset, AttributeMap, Camera,
    ExtraData, Filter, Image, Interpolation, Material, Mesh, Metadata, MetallicRoughness, Node, Primitive,
    PrimitiveMode, Projection, Sampler, Scene, Skin, Texture, Wrap,
};
use crate::convert::Transform;
use crate::draco::{self, DracoDecoder};
use crate::error::{GltfError, Result};
use crate::extensions::{self, Extension, ExtensionContext};
use crate::glb;
use crate::messages::{MessageLog, Severity};
use crate::names;
use crate::schema::{
    string_extras, version_number, AccessorDef, AnimationDef, AssetInfo, BufferDef, BufferViewDef, CameraDef,
    Document, ImageDef, MaterialDef, MeshDef, NodeDef, OrthographicDef, PerspectiveDef, SamplerDef, SceneDef,
    SkinDef, TextureDef,
};
use crate::skeleton;
use crate::textures;
use crate::uri::{is_buffer_mime_type, is_data_uri, percent_decode, DataUri, ImageFormat};
use crate::validation;

// ============================================================================
// Options and outcome
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadOptions {
    /// Read external image files into the arena.
    pub load_image_data: bool,
    /// Keep the string extras of the `asset` object in [`Metadata`].
    pub load_metadata: bool,
    /// Queries per worker batch in batched animation payload retrieval.
    pub payload_batch_size: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            load_image_data: false,
            load_metadata: false,
            payload_batch_size: DEFAULT_PAYLOAD_BATCH_SIZE,
        }
    }
}

/// Result of one read. `asset` is `None` when an error aborted the read;
/// `metadata` is filled as soon as the JSON parsed.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub asset: Option<Asset>,
    pub metadata: Metadata,
    pub messages: MessageLog,
}

impl ReadOutcome {
    pub fn is_success(&self) -> bool {
        self.asset.is_some()
    }
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Clone, Default)]
pub struct FileReader {
    options: ReadOptions,
    draco: Option<Arc<dyn DracoDecoder>>,
}

impl fmt::Debug for FileReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReader")
            .field("options", &self.options)
            .field("draco", &self.draco.is_some())
            .finish()
    }
}

impl FileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options, draco: None }
    }

    pub fn with_draco_decoder(mut self, decoder: Arc<dyn DracoDecoder>) -> Self {
        self.draco = Some(decoder);
        self
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read a `.gltf` or `.glb` file.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read_file(&self, path: impl AsRef<Path>) -> ReadOutcome {
        let path = path.as_ref();
        let mut outcome = ReadOutcome::default();
        outcome.asset = self.import(path, &mut outcome.metadata, &mut outcome.messages);
        match &outcome.asset {
            Some(asset) => info!(
                name = %asset.name,
                nodes = asset.nodes.len(),
                meshes = asset.meshes.len(),
                warnings = outcome.messages.count(Severity::Warning),
                "glTF asset read"
            ),
            None => debug!(error = outcome.messages.first_error(), "glTF read aborted"),
        }
        outcome
    }

    /// [`Self::read_file`] with the first error turned into [`GltfError::ImportFailed`].
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Asset> {
        let path = path.as_ref();
        let ReadOutcome { asset, messages, .. } = self.read_file(path);
        asset.ok_or_else(|| {
            let reason = messages.first_error().unwrap_or("unknown error");
            GltfError::ImportFailed(format!("{}: {}", path.display(), reason))
        })
    }

    fn import(&self, path: &Path, metadata: &mut Metadata, log: &mut MessageLog) -> Option<Asset> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(%err, "read failed");
                log.error(format!("Can't load file: {}", path.display()));
                return None;
            }
        };

        let extension = path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase);
        let (json, bin) = match extension.as_deref() {
            Some("gltf") => (bytes.as_slice(), None),
            Some("glb") => match glb::split(&bytes) {
                Ok(chunks) => (chunks.json, chunks.bin),
                Err(err) => {
                    log.error(err.to_string());
                    return None;
                }
            },
            _ => {
                log.error("Invalid extension.");
                return None;
            }
        };

        let document: Document = match serde_json::from_slice(&json_text(json)) {
            Ok(document) => document,
            Err(err) => {
                debug!(%err, "JSON parse failed");
                log.error("Problem loading JSON.");
                return None;
            }
        };

        *metadata = read_metadata(&document.asset, self.options.load_metadata);
        if !check_version(&document.asset, metadata, log) {
            return None;
        }
        let unsupported = extensions::unsupported_required(&document.extensions_required);
        if !unsupported.is_empty() {
            log.error(format!("Required extension(s) not supported: {}.", unsupported.join(", ")));
            return None;
        }

        let resource_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let builder = AssetBuilder {
            document: &document,
            bin,
            resource_dir,
            options: &self.options,
            draco: self.draco.as_deref(),
            asset: Asset {
                name: asset_name(path, &document.asset),
                metadata: metadata.clone(),
                ..Default::default()
            },
            log: &mut *log,
        };
        let mut asset = builder.build()?;

        names::generate_names(&mut asset);
        let duplicates = textures::resolve_texture_conflicts(&mut asset);
        if !duplicates.is_empty() {
            debug!(?duplicates, "textures duplicated for normal maps");
        }

        let problems = validation::validate(&asset);
        if !problems.is_empty() {
            for problem in &problems {
                debug!(problem = %problem, "invalid reference");
            }
            log.warning(format!(
                "For GLTF Asset [{}] not all imported objects are valid.",
                asset.name
            ));
        }
        Some(asset)
    }
}

/// JSON bytes as UTF-8, transcoding UTF-16 and dropping a byte order mark.
fn json_text(bytes: &[u8]) -> Cow<'_, [u8]> {
    let utf16 = |big_endian: bool, body: &[u8]| {
        let units = body.chunks_exact(2).map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        });
        let text: String = char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        Cow::Owned(text.into_bytes())
    };
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Cow::Borrowed(rest),
        [0xFF, 0xFE, rest @ ..] => utf16(false, rest),
        [0xFE, 0xFF, rest @ ..] => utf16(true, rest),
        _ => Cow::Borrowed(bytes),
    }
}

fn read_metadata(info: &AssetInfo, load_extras: bool) -> Metadata {
    let extras = if load_extras {
        string_extras(info.extras.as_ref())
            .into_iter()
            .map(|(name, value)| ExtraData { name, value })
            .collect()
    } else {
        Vec::new()
    };
    Metadata {
        generator_name: info.generator.clone().unwrap_or_default(),
        version: info.version.as_ref().and_then(version_number).unwrap_or(0.0),
        extras,
    }
}

/// A readable `minVersion` decides on its own; `version` is only consulted
/// without one.
fn check_version(info: &AssetInfo, metadata: &Metadata, log: &mut MessageLog) -> bool {
    if let Some(min_version) = info.min_version.as_ref().and_then(version_number) {
        if min_version > 2.0 {
            log.error("This importer supports glTF version 2.0 (or compatible) assets.");
            return false;
        }
        return true;
    }
    if metadata.version < 2.0 {
        log.error("This importer supports glTF asset version 2.0 or later.");
        return false;
    }
    true
}

/// File stem, except that a file called `scene` is named after the asset's
/// `title` extra or its directory.
fn asset_name(path: &Path, info: &AssetInfo) -> String {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or_default();
    if !stem.eq_ignore_ascii_case("scene") {
        return stem.to_owned();
    }
    if let Some(title) = string_extras(info.extras.as_ref()).remove("title") {
        return title;
    }
    path.parent()
        .and_then(Path::file_name)
        .and_then(OsStr::to_str)
        .unwrap_or(stem)
        .to_owned()
}

// ============================================================================
// Asset builder
// ============================================================================

struct AssetBuilder<'a> {
    document: &'a Document,
    bin: Option<&'a [u8]>,
    resource_dir: &'a Path,
    options: &'a ReadOptions,
    draco: Option<&'a dyn DracoDecoder>,
    asset: Asset,
    log: &'a mut MessageLog,
}

impl<'a> AssetBuilder<'a> {
    fn build(mut self) -> Option<Asset> {
        let doc = self.document;

        let ok = self.phase("buffers", &doc.buffers, Self::setup_buffer)
            && self.phase("bufferViews", &doc.buffer_views, Self::setup_buffer_view)
            && self.phase("accessors", &doc.accessors, Self::setup_accessor)
            && self.phase("meshes", &doc.meshes, Self::setup_mesh)
            && self.phase("nodes", &doc.nodes, Self::setup_node)
            && self.phase("scenes", &doc.scenes, Self::setup_scene)
            && self.phase("cameras", &doc.cameras, Self::setup_camera)
            && self.phase("skins", &doc.skins, Self::setup_skin);
        if !ok {
            return None;
        }

        // Proxy joints may rewrite scene roots; animation channels are read after.
        let mark = self.log.mark();
        skeleton::resolve_skeletons(&mut self.asset, self.log);
        if self.log.has_errors_since(mark) {
            return None;
        }

        let ok = self.phase("animations", &doc.animations, Self::setup_animation)
            && self.phase("images", &doc.images, Self::setup_image)
            && self.phase("samplers", &doc.samplers, Self::setup_sampler)
            && self.phase("textures", &doc.textures, Self::setup_texture)
            && self.phase("materials", &doc.materials, Self::setup_material);
        if !ok {
            return None;
        }

        self.asset.default_scene = doc.scene;
        self.asset.extensions_used = doc.extensions_used.clone();
        self.asset.extensions_required = doc.extensions_required.clone();
        if self.quantization_required() {
            self.asset.processed_extensions.insert(Extension::MeshQuantization);
        }
        extensions::apply_asset_extensions(&doc.extensions, &mut self.asset, self.resource_dir, self.log);
        Some(self.asset)
    }

    /// Run `setup` for every element; `false` if it emitted an error.
    fn phase<T>(&mut self, label: &'static str, defs: &'a [T], setup: fn(&mut Self, usize, &'a T)) -> bool {
        debug!(phase = label, count = defs.len(), "building");
        let mark = self.log.mark();
        for (index, def) in defs.iter().enumerate() {
            setup(self, index, def);
        }
        !self.log.has_errors_since(mark)
    }

    fn extension_context(&mut self) -> ExtensionContext<'_> {
        ExtensionContext {
            processed: &mut self.asset.processed_extensions,
            log: &mut *self.log,
        }
    }

    fn quantization_required(&self) -> bool {
        let name = Extension::MeshQuantization.name();
        self.document.extensions_required.iter().any(|required| required == name)
    }

    // ------------------------------------------------------------------------
    // Buffers and accessors
    // ------------------------------------------------------------------------

    fn setup_buffer(&mut self, _index: usize, def: &'a BufferDef) {
        let bytes: std::result::Result<Cow<'a, [u8]>, String> = match def.uri.as_deref() {
            Some(uri) if is_data_uri(uri) => DataUri::parse(uri)
                .ok()
                .filter(|data_uri| is_buffer_mime_type(data_uri.mime_type))
                .and_then(|data_uri| data_uri.decode().ok())
                .filter(|decoded| decoded.len() == def.byte_length)
                .map(Cow::Owned)
                .ok_or_else(|| "Problem decoding buffer from data URI.".to_owned()),
            Some(uri) => {
                let path = self.resource_dir.join(percent_decode(uri));
                match fs::read(&path) {
                    Ok(data) if data.len() == def.byte_length => Ok(Cow::Owned(data)),
                    Ok(_) => Err("Buffer file size does not match.".to_owned()),
                    Err(_) => Err(format!("Could not load file: '{}'", path.display())),
                }
            }
            None => match self.bin {
                None | Some([]) => Err("Buffer from BIN chunk is missing or empty.".to_owned()),
                Some(bin) if bin.len() < def.byte_length => Err("Buffer from BIN chunk is too small.".to_owned()),
                Some(bin) => Ok(Cow::Borrowed(&bin[..def.byte_length])),
            },
        };

        let data = match bytes {
            Ok(bytes) => Some(self.asset.push_bytes(&bytes)),
            Err(message) => {
                self.log.error(message);
                None
            }
        };
        self.asset.buffers.push(Buffer {
            name: def.name.clone().unwrap_or_default(),
            byte_length: def.byte_length,
            uri: def.uri.clone(),
            data,
        });
    }

    fn setup_buffer_view(&mut self, index: usize, def: &'a BufferViewDef) {
        let buffer = def.buffer.filter(|&buffer| buffer < self.asset.buffers.len());
        if buffer.is_none() {
            self.log.warning(format!("Invalid buffer index for buffer view {}.", index));
        }
        self.asset.buffer_views.push(BufferView {
            name: def.name.clone().unwrap_or_default(),
            // Out of range on purpose: reads through this view fail.
            buffer: buffer.unwrap_or(usize::MAX),
            byte_offset: def.byte_offset,
            byte_length: def.byte_length,
            byte_stride: def.byte_stride.unwrap_or(0),
        });
    }

    fn setup_accessor(&mut self, index: usize, def: &'a AccessorDef) {
        let accessor = match self.accessor_from(def) {
            Some(accessor) => accessor,
            None => {
                self.log.warning(format!("Invalid accessor {}; it will be ignored.", index));
                Accessor::invalid()
            }
        };
        self.asset.accessors.push(accessor);
    }

    fn accessor_from(&self, def: &AccessorDef) -> Option<Accessor> {
        let views = self.asset.buffer_views.len();
        let accessor_type = AccessorType::from_token(&def.accessor_type)?;
        let component_type = ComponentType::from_gl(def.component_type)?;

        let sparse = match &def.sparse {
            None => None,
            Some(sparse) => Some(Sparse {
                count: sparse.count,
                indices: SparseIndices {
                    buffer_view: sparse.indices.buffer_view.filter(|&v| v < views)?,
                    byte_offset: sparse.indices.byte_offset,
                    component_type: ComponentType::from_gl(sparse.indices.component_type)
                        .filter(|ct| matches!(ct, ComponentType::U8 | ComponentType::U16 | ComponentType::U32))?,
                },
                values: SparseValues {
                    buffer_view: sparse.values.buffer_view.filter(|&v| v < views)?,
                    byte_offset: sparse.values.byte_offset,
                },
            }),
        };

        let state = match def.buffer_view {
            Some(buffer_view) if buffer_view < views => AccessorState::Backed { buffer_view },
            Some(_) => return None,
            None => AccessorState::Pending,
        };

        Some(Accessor {
            name: def.name.clone().unwrap_or_default(),
            state,
            byte_offset: def.byte_offset,
            count: def.count,
            accessor_type,
            component_type,
            normalized: def.normalized,
            quantized: false,
            sparse,
            min: def.min.clone(),
            max: def.max.clone(),
        })
    }

    // ------------------------------------------------------------------------
    // Meshes
    // ------------------------------------------------------------------------

    fn attribute_map(&self, attributes: &BTreeMap<String, usize>) -> AttributeMap {
        attributes
            .iter()
            .filter_map(|(name, &accessor)| {
                let semantic = AttributeSemantic::parse(name);
                if semantic.is_none() {
                    debug!(attribute = %name, "skipping unknown attribute");
                }
                Some((semantic?, accessor))
            })
            .collect()
    }

    fn setup_mesh(&mut self, index: usize, def: &'a MeshDef) {
        let quantized = self.quantization_required();
        let mut mesh = Mesh {
            name: def.name.clone().unwrap_or_default(),
            weights: def.weights.clone(),
            target_names: target_names(def.extras.as_ref()),
            extras: string_extras(def.extras.as_ref()),
            ..Default::default()
        };

        for (primitive_index, primitive_def) in def.primitives.iter().enumerate() {
            let code = primitive_def.mode.unwrap_or(4);
            let mode = PrimitiveMode::from_gl(code).filter(|mode| mode.is_supported());
            let Some(mode) = mode else {
                let label = PrimitiveMode::from_gl(code).map_or_else(|| code.to_string(), |m| format!("{:?}", m));
                self.log.warning(format!(
                    "Primitive Mode[{}] in Primitive[{}] (in Mesh[{}]) is currently not supported. Geometry won't be imported.",
                    label, primitive_index, index
                ));
                continue;
            };

            let attributes = self.attribute_map(&primitive_def.attributes);
            if quantized {
                for (semantic, &accessor) in &attributes {
                    if semantic.is_quantizable() {
                        if let Some(accessor) = self.asset.accessors.get_mut(accessor) {
                            accessor.quantized = true;
                        }
                    }
                }
            }

            let mut primitive = Primitive {
                mode,
                material: primitive_def.material,
                indices: primitive_def.indices,
                attributes,
                targets: primitive_def
                    .targets
                    .iter()
                    .map(|target| self.attribute_map(target))
                    .collect(),
                extras: string_extras(primitive_def.extras.as_ref()),
                ..Default::default()
            };

            self.extension_context().apply_primitive(&primitive_def.extensions, &mut primitive);
            draco::decompress_primitive(&mut self.asset, &primitive, self.draco, self.log);
            mesh.primitives.push(primitive);
        }

        if let Some(first) = mesh.primitives.first() {
            let targets = first.targets.len();
            if mesh.primitives.iter().any(|primitive| primitive.targets.len() != targets) {
                self.log.warning("Number of Primitive.Targets is not consistent across the Mesh.");
            }
        }
        self.asset.meshes.push(mesh);
    }

    // ------------------------------------------------------------------------
    // Nodes, scenes, cameras and skins
    // ------------------------------------------------------------------------

    fn setup_node(&mut self, index: usize, def: &'a NodeDef) {
        let transform = match &def.matrix {
            Some(matrix) => Transform::from_gltf_matrix(matrix),
            None => Transform::from_gltf_trs(
                def.translation.unwrap_or([0.0; 3]),
                def.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]),
                def.scale.unwrap_or([1.0; 3]),
            ),
        };
        let mut node = Node {
            index,
            name: def.name.clone().unwrap_or_default(),
            transform,
            children: def.children.clone(),
            mesh: def.mesh,
            skin: def.skin,
            camera: def.camera,
            weights: def.weights.clone(),
            extras: string_extras(def.extras.as_ref()),
            ..Default::default()
        };
        self.extension_context().apply_node(&def.extensions, &mut node);
        self.asset.nodes.push(node);
    }

    fn setup_scene(&mut self, _index: usize, def: &'a SceneDef) {
        self.asset.scenes.push(Scene {
            name: def.name.clone().unwrap_or_default(),
            unique_id: String::new(),
            nodes: def.nodes.clone(),
            extras: string_extras(def.extras.as_ref()),
        });
    }

    fn setup_camera(&mut self, index: usize, def: &'a CameraDef) {
        let name = def.name.clone().unwrap_or_default();
        let projection = match def.camera_type.as_str() {
            "perspective" => {
                let fallback = PerspectiveDef::default();
                let p = def.perspective.as_ref().unwrap_or(&fallback);
                Projection::Perspective {
                    aspect_ratio: p.aspect_ratio.unwrap_or(1.0),
                    yfov: p.yfov,
                    znear: p.znear,
                    zfar: p.zfar.unwrap_or(p.znear + 10.0),
                }
            }
            "orthographic" => {
                let fallback = OrthographicDef::default();
                let o = def.orthographic.as_ref().unwrap_or(&fallback);
                Projection::Orthographic {
                    xmag: o.xmag,
                    ymag: o.ymag,
                    znear: o.znear,
                    zfar: o.zfar,
                }
            }
            other => {
                self.log.error(format!("Invalid camera type: {}", other));
                return;
            }
        };

        let node = self.asset.nodes.iter().position(|node| node.camera == Some(index));
        if node.is_none() {
            self.log
                .warning(format!("No camera node found for camera {}('{}')", index, name));
        }
        self.asset.cameras.push(Camera {
            name,
            unique_id: String::new(),
            projection,
            node,
        });
    }

    fn setup_skin(&mut self, _index: usize, def: &'a SkinDef) {
        self.asset.skins.push(Skin {
            name: def.name.clone().unwrap_or_default(),
            inverse_bind_matrices: def.inverse_bind_matrices,
            joints: def.joints.clone(),
            skeleton: def.skeleton,
            extras: string_extras(def.extras.as_ref()),
            ..Default::default()
        });
    }

    // ------------------------------------------------------------------------
    // Animations, images, samplers, textures and materials
    // ------------------------------------------------------------------------

    fn setup_animation(&mut self, index: usize, def: &'a AnimationDef) {
        let samplers = def
            .samplers
            .iter()
            .map(|sampler| {
                let interpolation = match sampler.interpolation.as_deref() {
                    None => Interpolation::Linear,
                    Some(token) => Interpolation::from_token(token).unwrap_or_else(|| {
                        self.log.warning(format!(
                            "Unknown interpolation '{}' in animation {}; using LINEAR.",
                            token, index
                        ));
                        Interpolation::Linear
                    }),
                };
                AnimationSampler {
                    input: sampler.input,
                    output: sampler.output,
                    interpolation,
                }
            })
            .collect();

        let mut channels = Vec::with_capacity(def.channels.len());
        for channel in &def.channels {
            let Some(node) = channel.target.node else {
                continue;
            };
            match AnimationPath::from_token(&channel.target.path) {
                Some(path) => channels.push(AnimationChannel {
                    sampler: channel.sampler,
                    node,
                    path,
                }),
                None => self.log.warning(format!(
                    "Unknown animation path '{}' in animation {}.",
                    channel.target.path, index
                )),
            }
        }

        self.asset.animations.push(Animation {
            name: def.name.clone().unwrap_or_default(),
            unique_id: String::new(),
            samplers,
            channels,
        });
    }

    fn setup_image(&mut self, _index: usize, def: &'a ImageDef) {
        let mut image = Image {
            name: def.name.clone().unwrap_or_default(),
            uri: def.uri.clone(),
            mime_type: def.mime_type.clone().unwrap_or_default(),
            buffer_view: def.buffer_view,
            ..Default::default()
        };

        match def.uri.as_deref() {
            Some(uri) if is_data_uri(uri) => {
                let decoded = DataUri::parse(uri).ok().and_then(|data_uri| {
                    let format = ImageFormat::from_mime_type(data_uri.mime_type);
                    let bytes = data_uri.decode().ok()?;
                    (format != ImageFormat::Unknown).then(|| (data_uri.mime_type.to_owned(), format, bytes))
                });
                match decoded {
                    Some((mime_type, format, bytes)) => {
                        image.mime_type = mime_type;
                        image.format = format;
                        image.data = Some(self.asset.push_bytes(&bytes));
                    }
                    None => self.log.error("Problem decoding image from data URI."),
                }
            }
            Some(uri) => {
                let path = self.resource_dir.join(percent_decode(uri));
                image.format = ImageFormat::from_filename(uri);
                if self.options.load_image_data {
                    match fs::read(&path) {
                        Ok(bytes) => image.data = Some(self.asset.push_bytes(&bytes)),
                        Err(_) => self.log.error("Could not load image file."),
                    }
                }
                image.file_path = Some(path);
            }
            None => {
                image.format = ImageFormat::from_mime_type(&image.mime_type);
                // Embedded images already live in the arena.
                image.data = def.buffer_view.and_then(|view| {
                    let view = self.asset.buffer_views.get(view)?;
                    let buffer = self.asset.buffers.get(view.buffer)?.data.clone()?;
                    let start = buffer.start.checked_add(view.byte_offset)?;
                    let end = start.checked_add(view.byte_length)?;
                    (end <= buffer.end).then_some(start..end)
                });
            }
        }
        self.asset.images.push(image);
    }

    fn setup_sampler(&mut self, _index: usize, def: &'a SamplerDef) {
        self.asset.samplers.push(Sampler {
            name: def.name.clone().unwrap_or_default(),
            min_filter: def.min_filter.and_then(Filter::from_gl).unwrap_or_default(),
            mag_filter: def.mag_filter.and_then(Filter::from_gl).unwrap_or_default(),
            wrap_s: def.wrap_s.and_then(Wrap::from_gl).unwrap_or_default(),
            wrap_t: def.wrap_t.and_then(Wrap::from_gl).unwrap_or_default(),
        });
    }

    fn setup_texture(&mut self, _index: usize, def: &'a TextureDef) {
        let source = match def.source {
            Some(source) if source < self.asset.images.len() => Some(source),
            Some(source) => {
                self.log.warning(format!("Invalid texture source index: {}", source));
                None
            }
            None => None,
        };
        let mut texture = Texture {
            name: def.name.clone().unwrap_or_default(),
            unique_id: String::new(),
            source,
            sampler: def.sampler.filter(|&sampler| sampler < self.asset.samplers.len()),
        };
        self.extension_context().apply_texture(&def.extensions, &mut texture);
        self.asset.textures.push(texture);
    }

    fn setup_material(&mut self, _index: usize, def: &'a MaterialDef) {
        let pbr = def.pbr_metallic_roughness.as_ref();
        let mut ctx = self.extension_context();
        let mut material = Material {
            name: def.name.clone().unwrap_or_default(),
            base_color: ctx.texture_map(pbr.and_then(|p| p.base_color_texture.as_ref())),
            base_color_factor: pbr
                .and_then(|p| p.base_color_factor)
                .map_or(Vec4::ONE, Vec4::from_array),
            metallic_roughness: MetallicRoughness {
                map: ctx.texture_map(pbr.and_then(|p| p.metallic_roughness_texture.as_ref())),
                metallic_factor: pbr.and_then(|p| p.metallic_factor).unwrap_or(1.0),
                roughness_factor: pbr.and_then(|p| p.roughness_factor).unwrap_or(1.0),
            },
            normal: ctx.texture_map(def.normal_texture.as_ref()),
            normal_scale: def.normal_texture.as_ref().and_then(|t| t.scale).unwrap_or(1.0),
            occlusion: ctx.texture_map(def.occlusion_texture.as_ref()),
            occlusion_strength: def.occlusion_texture.as_ref().and_then(|t| t.strength).unwrap_or(1.0),
            emissive: ctx.texture_map(def.emissive_texture.as_ref()),
            emissive_factor: def.emissive_factor.map_or(Vec3::ZERO, Vec3::from_array),
            alpha_mode: match def.alpha_mode.as_deref() {
                Some("MASK") => AlphaMode::Mask,
                Some("BLEND") => AlphaMode::Blend,
                _ => AlphaMode::Opaque,
            },
            alpha_cutoff: def.alpha_cutoff.unwrap_or(0.5),
            double_sided: def.double_sided,
            extras: string_extras(def.extras.as_ref()),
            ..Default::default()
        };
        ctx.apply_material(&def.extensions, &mut material);
        self.asset.materials.push(material);
    }
}

/// `extras.targetNames` of a mesh.
fn target_names(extras: Option<&Value>) -> Vec<String> {
    extras
        .and_then(|extras| extras.get("targetNames"))
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_text_transcodes_utf16() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "{}".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(json_text(&bytes).as_ref(), b"{}");
        assert_eq!(json_text(b"\xEF\xBB\xBF{}").as_ref(), b"{}");
    }

    #[test]
    fn test_asset_name_for_generic_scene_file() {
        let info: AssetInfo = serde_json::from_value(serde_json::json!({ "extras": { "title": "Lantern" } })).unwrap();
        assert_eq!(asset_name(Path::new("/models/lantern/scene.gltf"), &info), "Lantern");
        assert_eq!(asset_name(Path::new("/models/lantern/scene.gltf"), &AssetInfo::default()), "lantern");
        assert_eq!(asset_name(Path::new("/models/lantern/Lamp.glb"), &info), "Lamp");
    }

    #[test]
    fn test_version_checks() {
        let mut log = MessageLog::new();
        let newer: AssetInfo = serde_json::from_value(serde_json::json!({ "version": "2.0", "minVersion": "2.1" })).unwrap();
        let metadata = read_metadata(&newer, false);
        assert!(!check_version(&newer, &metadata, &mut log));

        let current: AssetInfo = serde_json::from_value(serde_json::json!({ "version": "2.0" })).unwrap();
        let metadata = read_metadata(&current, false);
        assert!(check_version(&current, &metadata, &mut log));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_min_version_overrides_version() {
        let mut log = MessageLog::new();
        let compatible: AssetInfo =
            serde_json::from_value(serde_json::json!({ "version": "1.0", "minVersion": "2.0" })).unwrap();
        let metadata = read_metadata(&compatible, false);
        assert!(check_version(&compatible, &metadata, &mut log));

        let no_version: AssetInfo = serde_json::from_value(serde_json::json!({ "minVersion": "1.1" })).unwrap();
        let metadata = read_metadata(&no_version, false);
        assert!(check_version(&no_version, &metadata, &mut log));
        assert!(log.is_empty());

        let old: AssetInfo = serde_json::from_value(serde_json::json!({ "version": "1.0" })).unwrap();
        let metadata = read_metadata(&old, false);
        assert!(!check_version(&old, &metadata, &mut log));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_default_options() {
        let options: ReadOptions = serde_json::from_str(r#"{ "loadImageData": true }"#).unwrap();
        assert!(options.load_image_data);
        assert_eq!(options.payload_batch_size, DEFAULT_PAYLOAD_BATCH_SIZE);
    }
}
