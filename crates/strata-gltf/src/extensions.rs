//! Extension dispatch.
//!
//! Names are looked up once in a static table and mapped to [`Extension`].
//! Each entity kind has a handler that matches the extensions it implements,
//! mutates the entity in place and returns the names it consumed. A shared
//! [`reconcile`] step then warns about every declared name left over.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use glam::{Vec2, Vec3, Vec4};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::accessor::AttributeSemantic;
use crate::asset::{
    Anisotropy, Asset, Clearcoat, DracoCompression, IesLight, IesLightRef, IesSource, Iridescence, Light,
    LightKind, Material, Node, Packing, PackingKind, Primitive, Sheen, Specular, SpecularGlossiness, Texture,
    TextureMap, TextureTransform, Transmission, VariantMapping, Volume,
};
use crate::messages::MessageLog;
use crate::schema::{ExtensionMap, TextureInfo};
use crate::uri::percent_decode;

// ============================================================================
// Extension table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Extension {
    LightsPunctual,
    LightsIes,
    MaterialsVariants,
    DracoMeshCompression,
    MeshQuantization,
    TextureTransform,
    MaterialsUnlit,
    MaterialsPbrSpecularGlossiness,
    MaterialsClearcoat,
    MaterialsTransmission,
    MaterialsSheen,
    MaterialsIor,
    MaterialsSpecular,
    MaterialsEmissiveStrength,
    MaterialsIridescence,
    MaterialsAnisotropy,
    MaterialsVolume,
    PackingNormalRoughnessMetallic,
    PackingOcclusionRoughnessMetallic,
    TextureBasisu,
    TextureWebp,
}

const EXTENSION_NAMES: [(Extension, &str); 21] = [
    (Extension::LightsPunctual, "KHR_lights_punctual"),
    (Extension::LightsIes, "EXT_lights_ies"),
    (Extension::MaterialsVariants, "KHR_materials_variants"),
    (Extension::DracoMeshCompression, "KHR_draco_mesh_compression"),
    (Extension::MeshQuantization, "KHR_mesh_quantization"),
    (Extension::TextureTransform, "KHR_texture_transform"),
    (Extension::MaterialsUnlit, "KHR_materials_unlit"),
    (Extension::MaterialsPbrSpecularGlossiness, "KHR_materials_pbrSpecularGlossiness"),
    (Extension::MaterialsClearcoat, "KHR_materials_clearcoat"),
    (Extension::MaterialsTransmission, "KHR_materials_transmission"),
    (Extension::MaterialsSheen, "KHR_materials_sheen"),
    (Extension::MaterialsIor, "KHR_materials_ior"),
    (Extension::MaterialsSpecular, "KHR_materials_specular"),
    (Extension::MaterialsEmissiveStrength, "KHR_materials_emissive_strength"),
    (Extension::MaterialsIridescence, "KHR_materials_iridescence"),
    (Extension::MaterialsAnisotropy, "KHR_materials_anisotropy"),
    (Extension::MaterialsVolume, "KHR_materials_volume"),
    (Extension::PackingNormalRoughnessMetallic, "MSFT_packing_normalRoughnessMetallic"),
    (Extension::PackingOcclusionRoughnessMetallic, "MSFT_packing_occlusionRoughnessMetallic"),
    (Extension::TextureBasisu, "KHR_texture_basisu"),
    (Extension::TextureWebp, "EXT_texture_webp"),
];

fn name_table() -> &'static HashMap<&'static str, Extension> {
    static TABLE: OnceLock<HashMap<&'static str, Extension>> = OnceLock::new();
    TABLE.get_or_init(|| EXTENSION_NAMES.iter().map(|&(ext, name)| (name, ext)).collect())
}

impl Extension {
    pub fn from_name(name: &str) -> Option<Self> {
        name_table().get(name).copied()
    }

    pub fn name(self) -> &'static str {
        EXTENSION_NAMES
            .iter()
            .find(|(ext, _)| *ext == self)
            .map_or("", |(_, name)| name)
    }

    /// Recognised by the table but without behaviour.
    pub fn is_implemented(self) -> bool {
        !matches!(self, Extension::TextureBasisu | Extension::TextureWebp)
    }

    pub fn all() -> impl Iterator<Item = Extension> {
        EXTENSION_NAMES.iter().map(|&(ext, _)| ext)
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names from `extensionsRequired` the reader cannot honour.
pub fn unsupported_required<'a>(required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .map(String::as_str)
        .filter(|name| !Extension::from_name(name).is_some_and(Extension::is_implemented))
        .collect()
}

// ============================================================================
// Reconcile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionTarget {
    Asset,
    Node,
    Primitive,
    Material,
    Texture,
    TextureInfo,
}

impl fmt::Display for ExtensionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtensionTarget::Asset => "asset",
            ExtensionTarget::Node => "node",
            ExtensionTarget::Primitive => "primitive",
            ExtensionTarget::Material => "material",
            ExtensionTarget::Texture => "texture",
            ExtensionTarget::TextureInfo => "texture info",
        };
        f.write_str(label)
    }
}

/// Names consumed by one handler call.
pub type Consumed<'a> = BTreeSet<&'a str>;

/// Warn about every declared extension the handler did not consume.
pub fn reconcile(target: ExtensionTarget, declared: &ExtensionMap, consumed: &Consumed<'_>, log: &mut MessageLog) {
    for name in declared.keys() {
        if !consumed.contains(name.as_str()) {
            log.warning(format!("Extension '{}' is not supported for {}.", name, target));
        }
    }
}

fn recognized_but_unimplemented(ext: Extension, log: &mut MessageLog) {
    log.warning(format!("Extension '{}' is recognized but not implemented.", ext));
}

fn payload<T: DeserializeOwned>(name: &str, value: &Value, log: &mut MessageLog) -> Option<T> {
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log.warning(format!("Extension '{}' has a malformed payload: {}", name, err));
            None
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LightsPunctualDef {
    lights: Vec<PunctualLightDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PunctualLightDef {
    name: Option<String>,
    #[serde(rename = "type")]
    light_type: String,
    color: [f32; 3],
    intensity: f32,
    range: Option<f32>,
    spot: Option<SpotDef>,
}

impl Default for PunctualLightDef {
    fn default() -> Self {
        Self {
            name: None,
            light_type: String::new(),
            color: [1.0; 3],
            intensity: 1.0,
            range: None,
            spot: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpotDef {
    inner_cone_angle: f32,
    outer_cone_angle: f32,
}

impl Default for SpotDef {
    fn default() -> Self {
        Self {
            inner_cone_angle: 0.0,
            outer_cone_angle: std::f32::consts::FRAC_PI_4,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LightsIesDef {
    lights: Vec<IesLightDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IesLightDef {
    name: Option<String>,
    uri: Option<String>,
    buffer_view: Option<usize>,
    mime_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VariantsDef {
    variants: Vec<VariantNameDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VariantNameDef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NodeLightDef {
    light: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeIesDef {
    light: usize,
    #[serde(default = "one")]
    multiplier: f32,
    color: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DracoDef {
    buffer_view: usize,
    #[serde(default)]
    attributes: std::collections::BTreeMap<String, u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VariantMappingsDef {
    mappings: Vec<VariantMappingDef>,
}

#[derive(Debug, Deserialize)]
struct VariantMappingDef {
    material: usize,
    #[serde(default)]
    variants: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextureTransformDef {
    offset: [f32; 2],
    rotation: f32,
    scale: [f32; 2],
    tex_coord: Option<u32>,
}

impl Default for TextureTransformDef {
    fn default() -> Self {
        Self {
            offset: [0.0; 2],
            rotation: 0.0,
            scale: [1.0; 2],
            tex_coord: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpecularGlossinessDef {
    diffuse_factor: [f32; 4],
    diffuse_texture: Option<TextureInfo>,
    specular_factor: [f32; 3],
    glossiness_factor: f32,
    specular_glossiness_texture: Option<TextureInfo>,
}

impl Default for SpecularGlossinessDef {
    fn default() -> Self {
        Self {
            diffuse_factor: [1.0; 4],
            diffuse_texture: None,
            specular_factor: [1.0; 3],
            glossiness_factor: 1.0,
            specular_glossiness_texture: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ClearcoatDef {
    clearcoat_factor: f32,
    clearcoat_texture: Option<TextureInfo>,
    clearcoat_roughness_factor: f32,
    clearcoat_roughness_texture: Option<TextureInfo>,
    clearcoat_normal_texture: Option<TextureInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TransmissionDef {
    transmission_factor: f32,
    transmission_texture: Option<TextureInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SheenDef {
    sheen_color_factor: [f32; 3],
    sheen_color_texture: Option<TextureInfo>,
    sheen_roughness_factor: f32,
    sheen_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct IorDef {
    ior: f32,
}

impl Default for IorDef {
    fn default() -> Self {
        Self { ior: 1.5 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpecularDef {
    specular_factor: f32,
    specular_texture: Option<TextureInfo>,
    specular_color_factor: [f32; 3],
    specular_color_texture: Option<TextureInfo>,
}

impl Default for SpecularDef {
    fn default() -> Self {
        Self {
            specular_factor: 1.0,
            specular_texture: None,
            specular_color_factor: [1.0; 3],
            specular_color_texture: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EmissiveStrengthDef {
    emissive_strength: f32,
}

impl Default for EmissiveStrengthDef {
    fn default() -> Self {
        Self { emissive_strength: 1.0 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IridescenceDef {
    iridescence_factor: f32,
    iridescence_texture: Option<TextureInfo>,
    iridescence_ior: f32,
    iridescence_thickness_minimum: f32,
    iridescence_thickness_maximum: f32,
    iridescence_thickness_texture: Option<TextureInfo>,
}

impl Default for IridescenceDef {
    fn default() -> Self {
        Self {
            iridescence_factor: 0.0,
            iridescence_texture: None,
            iridescence_ior: 1.3,
            iridescence_thickness_minimum: 100.0,
            iridescence_thickness_maximum: 400.0,
            iridescence_thickness_texture: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnisotropyDef {
    anisotropy_strength: f32,
    anisotropy_rotation: f32,
    anisotropy_texture: Option<TextureInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeDef {
    thickness_factor: f32,
    thickness_texture: Option<TextureInfo>,
    attenuation_distance: Option<f32>,
    attenuation_color: [f32; 3],
}

impl Default for VolumeDef {
    fn default() -> Self {
        Self {
            thickness_factor: 0.0,
            thickness_texture: None,
            attenuation_distance: None,
            attenuation_color: [1.0; 3],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PackingOrmDef {
    occlusion_roughness_metallic_texture: Option<TextureInfo>,
    roughness_metallic_occlusion_texture: Option<TextureInfo>,
    normal_texture: Option<TextureInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PackingNrmDef {
    normal_roughness_metallic_texture: Option<TextureInfo>,
}

fn one() -> f32 {
    1.0
}

// ============================================================================
// Handlers
// ============================================================================

/// State shared by the handlers of one read.
pub struct ExtensionContext<'a> {
    pub processed: &'a mut BTreeSet<Extension>,
    pub log: &'a mut MessageLog,
}

impl ExtensionContext<'_> {
    fn mark(&mut self, ext: Extension) {
        self.processed.insert(ext);
    }

    /// A texture reference, with `KHR_texture_transform` applied.
    pub fn texture_map(&mut self, info: Option<&TextureInfo>) -> TextureMap {
        let Some(info) = info else {
            return TextureMap::default();
        };
        let mut map = TextureMap {
            texture: info.index,
            tex_coord: info.tex_coord,
            transform: None,
        };

        let mut consumed = Consumed::new();
        for (name, value) in &info.extensions {
            match Extension::from_name(name) {
                Some(Extension::TextureTransform) => {
                    consumed.insert(name.as_str());
                    if let Some(def) = payload::<TextureTransformDef>(name, value, self.log) {
                        map.transform = Some(TextureTransform {
                            offset: Vec2::from_array(def.offset),
                            rotation: def.rotation,
                            scale: Vec2::from_array(def.scale),
                            tex_coord: def.tex_coord,
                        });
                        self.mark(Extension::TextureTransform);
                    }
                }
                Some(ext) if !ext.is_implemented() => {
                    consumed.insert(name.as_str());
                    recognized_but_unimplemented(ext, self.log);
                }
                _ => {}
            }
        }
        reconcile(ExtensionTarget::TextureInfo, &info.extensions, &consumed, self.log);
        map
    }

    pub fn apply_node(&mut self, extensions: &ExtensionMap, node: &mut Node) {
        let mut consumed = Consumed::new();
        for (name, value) in extensions {
            match Extension::from_name(name) {
                Some(Extension::LightsPunctual) => {
                    consumed.insert(name.as_str());
                    if let Some(def) = payload::<NodeLightDef>(name, value, self.log) {
                        node.light = Some(def.light);
                        self.mark(Extension::LightsPunctual);
                    }
                }
                Some(Extension::LightsIes) => {
                    consumed.insert(name.as_str());
                    if let Some(def) = payload::<NodeIesDef>(name, value, self.log) {
                        node.light_ies = Some(IesLightRef {
                            light: def.light,
                            multiplier: def.multiplier,
                            color: def.color.map(Vec3::from_array),
                        });
                        self.mark(Extension::LightsIes);
                    }
                }
                Some(ext) if !ext.is_implemented() => {
                    consumed.insert(name.as_str());
                    recognized_but_unimplemented(ext, self.log);
                }
                _ => {}
            }
        }
        reconcile(ExtensionTarget::Node, extensions, &consumed, self.log);
    }

    /// Primitive extensions that only record data. Draco payloads are
    /// recorded here and decompressed by the builder.
    pub fn apply_primitive(&mut self, extensions: &ExtensionMap, primitive: &mut Primitive) {
        let mut consumed = Consumed::new();
        for (name, value) in extensions {
            match Extension::from_name(name) {
                Some(Extension::MaterialsVariants) => {
                    consumed.insert(name.as_str());
                    if let Some(def) = payload::<VariantMappingsDef>(name, value, self.log) {
                        primitive.variant_mappings = def
                            .mappings
                            .into_iter()
                            .map(|m| VariantMapping {
                                material: m.material,
                                variants: m.variants,
                            })
                            .collect();
                        self.mark(Extension::MaterialsVariants);
                    }
                }
                Some(Extension::DracoMeshCompression) => {
                    consumed.insert(name.as_str());
                    if let Some(def) = payload::<DracoDef>(name, value, self.log) {
                        let attributes = def
                            .attributes
                            .iter()
                            .filter_map(|(semantic, &id)| Some((AttributeSemantic::parse(semantic)?, id)))
                            .collect();
                        primitive.draco = Some(DracoCompression {
                            buffer_view: def.buffer_view,
                            attributes,
                        });
                        self.mark(Extension::DracoMeshCompression);
                    }
                }
                Some(ext) if !ext.is_implemented() => {
                    consumed.insert(name.as_str());
                    recognized_but_unimplemented(ext, self.log);
                }
                _ => {}
            }
        }
        reconcile(ExtensionTarget::Primitive, extensions, &consumed, self.log);
    }

    pub fn apply_material(&mut self, extensions: &ExtensionMap, material: &mut Material) {
        let mut consumed = Consumed::new();
        for (name, value) in extensions {
            let Some(ext) = Extension::from_name(name) else {
                continue;
            };
            let handled = match ext {
                Extension::MaterialsUnlit => {
                    material.unlit = true;
                    true
                }
                Extension::MaterialsPbrSpecularGlossiness => {
                    payload::<SpecularGlossinessDef>(name, value, self.log).map(|def| {
                        material.specular_glossiness = Some(SpecularGlossiness {
                            diffuse: self.texture_map(def.diffuse_texture.as_ref()),
                            diffuse_factor: Vec4::from_array(def.diffuse_factor),
                            map: self.texture_map(def.specular_glossiness_texture.as_ref()),
                            specular_factor: Vec3::from_array(def.specular_factor),
                            glossiness_factor: def.glossiness_factor,
                        });
                    })
                    .is_some()
                }
                Extension::MaterialsClearcoat => payload::<ClearcoatDef>(name, value, self.log)
                    .map(|def| {
                        material.clearcoat = Some(Clearcoat {
                            factor: def.clearcoat_factor,
                            map: self.texture_map(def.clearcoat_texture.as_ref()),
                            roughness_factor: def.clearcoat_roughness_factor,
                            roughness_map: self.texture_map(def.clearcoat_roughness_texture.as_ref()),
                            normal_map: self.texture_map(def.clearcoat_normal_texture.as_ref()),
                            normal_scale: def.clearcoat_normal_texture.as_ref().and_then(|t| t.scale).unwrap_or(1.0),
                        });
                    })
                    .is_some(),
                Extension::MaterialsTransmission => payload::<TransmissionDef>(name, value, self.log)
                    .map(|def| {
                        material.transmission = Some(Transmission {
                            factor: def.transmission_factor,
                            map: self.texture_map(def.transmission_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::MaterialsSheen => payload::<SheenDef>(name, value, self.log)
                    .map(|def| {
                        material.sheen = Some(Sheen {
                            color_factor: Vec3::from_array(def.sheen_color_factor),
                            color_map: self.texture_map(def.sheen_color_texture.as_ref()),
                            roughness_factor: def.sheen_roughness_factor,
                            roughness_map: self.texture_map(def.sheen_roughness_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::MaterialsIor => payload::<IorDef>(name, value, self.log)
                    .map(|def| material.ior = Some(def.ior))
                    .is_some(),
                Extension::MaterialsSpecular => payload::<SpecularDef>(name, value, self.log)
                    .map(|def| {
                        material.specular = Some(Specular {
                            factor: def.specular_factor,
                            map: self.texture_map(def.specular_texture.as_ref()),
                            color_factor: Vec3::from_array(def.specular_color_factor),
                            color_map: self.texture_map(def.specular_color_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::MaterialsEmissiveStrength => payload::<EmissiveStrengthDef>(name, value, self.log)
                    .map(|def| material.emissive_strength = Some(def.emissive_strength))
                    .is_some(),
                Extension::MaterialsIridescence => payload::<IridescenceDef>(name, value, self.log)
                    .map(|def| {
                        material.iridescence = Some(Iridescence {
                            factor: def.iridescence_factor,
                            map: self.texture_map(def.iridescence_texture.as_ref()),
                            ior: def.iridescence_ior,
                            thickness_minimum: def.iridescence_thickness_minimum,
                            thickness_maximum: def.iridescence_thickness_maximum,
                            thickness_map: self.texture_map(def.iridescence_thickness_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::MaterialsAnisotropy => payload::<AnisotropyDef>(name, value, self.log)
                    .map(|def| {
                        material.anisotropy = Some(Anisotropy {
                            strength: def.anisotropy_strength,
                            rotation: def.anisotropy_rotation,
                            map: self.texture_map(def.anisotropy_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::MaterialsVolume => payload::<VolumeDef>(name, value, self.log)
                    .map(|def| {
                        material.volume = Some(Volume {
                            thickness_factor: def.thickness_factor,
                            thickness_map: self.texture_map(def.thickness_texture.as_ref()),
                            attenuation_distance: def.attenuation_distance.filter(|d| d.is_finite()),
                            attenuation_color: Vec3::from_array(def.attenuation_color),
                        });
                    })
                    .is_some(),
                Extension::PackingOcclusionRoughnessMetallic => payload::<PackingOrmDef>(name, value, self.log)
                    .map(|def| {
                        let (kind, packed) = match def.occlusion_roughness_metallic_texture.as_ref() {
                            Some(orm) => (PackingKind::OcclusionRoughnessMetallic, Some(orm)),
                            None => (
                                PackingKind::RoughnessMetallicOcclusion,
                                def.roughness_metallic_occlusion_texture.as_ref(),
                            ),
                        };
                        material.packing = Some(Packing {
                            kind,
                            map: self.texture_map(packed),
                            normal_map: self.texture_map(def.normal_texture.as_ref()),
                        });
                    })
                    .is_some(),
                Extension::PackingNormalRoughnessMetallic => payload::<PackingNrmDef>(name, value, self.log)
                    .map(|def| {
                        material.packing = Some(Packing {
                            kind: PackingKind::NormalRoughnessMetallic,
                            map: self.texture_map(def.normal_roughness_metallic_texture.as_ref()),
                            normal_map: TextureMap::default(),
                        });
                    })
                    .is_some(),
                ext if !ext.is_implemented() => {
                    consumed.insert(name.as_str());
                    recognized_but_unimplemented(ext, self.log);
                    continue;
                }
                _ => continue,
            };
            consumed.insert(name.as_str());
            if handled {
                self.mark(ext);
            }
        }
        reconcile(ExtensionTarget::Material, extensions, &consumed, self.log);
    }

    pub fn apply_texture(&mut self, extensions: &ExtensionMap, _texture: &mut Texture) {
        let mut consumed = Consumed::new();
        for name in extensions.keys() {
            if let Some(ext) = Extension::from_name(name).filter(|ext| !ext.is_implemented()) {
                consumed.insert(name.as_str());
                recognized_but_unimplemented(ext, self.log);
            }
        }
        reconcile(ExtensionTarget::Texture, extensions, &consumed, self.log);
    }
}

/// Asset-level arrays: punctual lights, IES profiles and material variants.
pub fn apply_asset_extensions(extensions: &ExtensionMap, asset: &mut Asset, resource_dir: &Path, log: &mut MessageLog) {
    let mut consumed = Consumed::new();
    for (name, value) in extensions {
        match Extension::from_name(name) {
            Some(Extension::LightsPunctual) => {
                consumed.insert(name.as_str());
                if let Some(def) = payload::<LightsPunctualDef>(name, value, log) {
                    for (index, light) in def.lights.into_iter().enumerate() {
                        asset.lights.push(punctual_light(index, light, log));
                    }
                    asset.processed_extensions.insert(Extension::LightsPunctual);
                }
            }
            Some(Extension::LightsIes) => {
                consumed.insert(name.as_str());
                if let Some(def) = payload::<LightsIesDef>(name, value, log) {
                    for light in def.lights {
                        asset.ies_lights.push(ies_light(light, resource_dir));
                    }
                    asset.processed_extensions.insert(Extension::LightsIes);
                }
            }
            Some(Extension::MaterialsVariants) => {
                consumed.insert(name.as_str());
                if let Some(def) = payload::<VariantsDef>(name, value, log) {
                    asset.variants = def.variants.into_iter().map(|v| v.name).collect();
                    asset.processed_extensions.insert(Extension::MaterialsVariants);
                }
            }
            Some(ext) if !ext.is_implemented() => {
                consumed.insert(name.as_str());
                recognized_but_unimplemented(ext, log);
            }
            _ => {}
        }
    }
    reconcile(ExtensionTarget::Asset, extensions, &consumed, log);
}

fn punctual_light(index: usize, def: PunctualLightDef, log: &mut MessageLog) -> Light {
    let kind = match def.light_type.as_str() {
        "directional" => LightKind::Directional,
        "point" => LightKind::Point,
        "spot" => {
            let spot = def.spot.unwrap_or_default();
            LightKind::Spot {
                inner_cone_angle: spot.inner_cone_angle,
                outer_cone_angle: spot.outer_cone_angle,
            }
        }
        other => {
            log.warning(format!("Invalid light type '{}' for light {}; using a point light.", other, index));
            LightKind::Point
        }
    };
    Light {
        name: def.name.unwrap_or_default(),
        unique_id: String::new(),
        kind,
        color: Vec3::from_array(def.color),
        intensity: def.intensity,
        range: def.range.filter(|r| *r > 0.0),
    }
}

fn ies_light(def: IesLightDef, resource_dir: &Path) -> IesLight {
    let source = match (def.uri, def.buffer_view) {
        (Some(uri), _) => Some(IesSource::File(resource_dir.join(percent_decode(&uri)))),
        (None, Some(buffer_view)) => Some(IesSource::BufferView {
            buffer_view,
            mime_type: def.mime_type.unwrap_or_default(),
        }),
        (None, None) => None,
    };
    IesLight {
        name: def.name.unwrap_or_default(),
        unique_id: String::new(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extension_map(value: Value) -> ExtensionMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_name_table_round_trip() {
        for ext in Extension::all() {
            assert_eq!(Extension::from_name(ext.name()), Some(ext));
        }
        assert_eq!(Extension::from_name("KHR_unknown"), None);
    }

    #[test]
    fn test_unsupported_required() {
        let required = vec![
            "KHR_mesh_quantization".to_string(),
            "KHR_texture_basisu".to_string(),
            "VENDOR_thing".to_string(),
        ];
        assert_eq!(unsupported_required(&required), vec!["KHR_texture_basisu", "VENDOR_thing"]);
    }

    #[test]
    fn test_material_extensions_and_reconcile() {
        let mut processed = BTreeSet::new();
        let mut log = MessageLog::new();
        let mut material = Material::default();
        let extensions = extension_map(json!({
            "KHR_materials_clearcoat": {
                "clearcoatFactor": 0.5,
                "clearcoatNormalTexture": { "index": 2, "scale": 0.25 }
            },
            "KHR_materials_ior": {},
            "KHR_lights_punctual": { "light": 0 },
            "VENDOR_custom": {}
        }));
        ExtensionContext {
            processed: &mut processed,
            log: &mut log,
        }
        .apply_material(&extensions, &mut material);

        let clearcoat = material.clearcoat.unwrap();
        assert_eq!(clearcoat.factor, 0.5);
        assert_eq!(clearcoat.normal_map.texture, Some(2));
        assert_eq!(clearcoat.normal_scale, 0.25);
        assert_eq!(material.ior, Some(1.5));
        assert!(processed.contains(&Extension::MaterialsClearcoat));
        assert!(processed.contains(&Extension::MaterialsIor));

        let warnings: Vec<_> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            warnings,
            vec![
                "Extension 'KHR_lights_punctual' is not supported for material.",
                "Extension 'VENDOR_custom' is not supported for material.",
            ]
        );
    }

    #[test]
    fn test_texture_transform() {
        let mut processed = BTreeSet::new();
        let mut log = MessageLog::new();
        let info: TextureInfo = serde_json::from_value(json!({
            "index": 1,
            "extensions": { "KHR_texture_transform": { "offset": [0.5, 0.0], "scale": [2.0, 2.0] } }
        }))
        .unwrap();
        let map = ExtensionContext {
            processed: &mut processed,
            log: &mut log,
        }
        .texture_map(Some(&info));
        let transform = map.transform.unwrap();
        assert_eq!(transform.offset, Vec2::new(0.5, 0.0));
        assert_eq!(transform.scale, Vec2::new(2.0, 2.0));
        assert!(log.is_empty());
    }

    #[test]
    fn test_texture_basisu_is_recognized_only() {
        let mut processed = BTreeSet::new();
        let mut log = MessageLog::new();
        let extensions = extension_map(json!({ "KHR_texture_basisu": { "source": 0 } }));
        ExtensionContext {
            processed: &mut processed,
            log: &mut log,
        }
        .apply_texture(&extensions, &mut Texture::default());
        assert_eq!(log.len(), 1);
        assert!(log.iter().all(|m| m.text.contains("recognized but not implemented")));
        assert!(processed.is_empty());
    }

    #[test]
    fn test_asset_lights() {
        let mut asset = Asset::default();
        let mut log = MessageLog::new();
        let extensions = extension_map(json!({
            "KHR_lights_punctual": { "lights": [
                { "type": "spot", "spot": { "outerConeAngle": 0.5 } },
                { "type": "directional", "intensity": 3.0 }
            ]},
            "EXT_lights_ies": { "lights": [{ "uri": "profiles/lamp%201.ies" }] }
        }));
        apply_asset_extensions(&extensions, &mut asset, Path::new("/assets"), &mut log);
        assert_eq!(asset.lights.len(), 2);
        assert_eq!(
            asset.lights[0].kind,
            LightKind::Spot {
                inner_cone_angle: 0.0,
                outer_cone_angle: 0.5
            }
        );
        assert_eq!(asset.lights[1].intensity, 3.0);
        assert_eq!(
            asset.ies_lights[0].source,
            Some(IesSource::File(Path::new("/assets/profiles/lamp 1.ies").to_path_buf()))
        );
        assert!(log.is_empty());
    }
}
