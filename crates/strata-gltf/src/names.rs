//! Default names and unique ids for every entity of an asset.

use crate::asset::{Animation, Asset, Camera, Image, IesLight, Light, Material, Mesh, Node, Scene, Skin, Texture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Mesh,
    Node,
    Scene,
    Camera,
    Light,
    IesLight,
    Skin,
    Animation,
    Image,
    Sampler,
    Texture,
    Material,
}

impl EntityKind {
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Mesh => "Mesh",
            EntityKind::Node => "Node",
            EntityKind::Scene => "Scene",
            EntityKind::Camera => "Camera",
            EntityKind::Light => "Light",
            EntityKind::IesLight => "IESLight",
            EntityKind::Skin => "Skin",
            EntityKind::Animation => "Animation",
            EntityKind::Image => "Image",
            EntityKind::Sampler => "Sampler",
            EntityKind::Texture => "Texture",
            EntityKind::Material => "Material",
        }
    }
}

pub fn default_name(kind: EntityKind, index: usize) -> String {
    format!("{}_{}", kind.tag(), index)
}

/// Prefix of the unique ids of one entity kind; the id is the prefix followed
/// by the entity index.
pub fn unique_id_prefix(asset_name: &str, kind: EntityKind) -> String {
    format!("{}_{}_", asset_name, kind.tag())
}

/// `name`, or the default name it would get during name generation.
pub(crate) fn display_name(name: &str, kind: EntityKind, index: usize) -> String {
    if name.is_empty() {
        default_name(kind, index)
    } else {
        name.to_owned()
    }
}

trait Identified {
    fn identity(&mut self) -> (&mut String, &mut String);
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn identity(&mut self) -> (&mut String, &mut String) {
                (&mut self.name, &mut self.unique_id)
            }
        })*
    };
}

identified!(Mesh, Node, Scene, Camera, Light, IesLight, Skin, Animation, Image, Texture, Material);

fn fill<T: Identified>(items: &mut [T], asset_name: &str, kind: EntityKind) {
    let prefix = unique_id_prefix(asset_name, kind);
    for (index, item) in items.iter_mut().enumerate() {
        let (name, unique_id) = item.identity();
        if name.is_empty() {
            *name = default_name(kind, index);
        }
        *unique_id = format!("{}{}", prefix, index);
    }
}

/// Fill empty names with `<Kind>_<index>` and assign every entity its unique id.
pub fn generate_names(asset: &mut Asset) {
    let asset_name = asset.name.clone();
    fill(&mut asset.meshes, &asset_name, EntityKind::Mesh);
    fill(&mut asset.nodes, &asset_name, EntityKind::Node);
    fill(&mut asset.scenes, &asset_name, EntityKind::Scene);
    fill(&mut asset.cameras, &asset_name, EntityKind::Camera);
    fill(&mut asset.lights, &asset_name, EntityKind::Light);
    fill(&mut asset.ies_lights, &asset_name, EntityKind::IesLight);
    fill(&mut asset.skins, &asset_name, EntityKind::Skin);
    fill(&mut asset.animations, &asset_name, EntityKind::Animation);
    fill(&mut asset.images, &asset_name, EntityKind::Image);
    fill(&mut asset.textures, &asset_name, EntityKind::Texture);
    fill(&mut asset.materials, &asset_name, EntityKind::Material);

    for (index, sampler) in asset.samplers.iter_mut().enumerate() {
        if sampler.name.is_empty() {
            sampler.name = default_name(EntityKind::Sampler, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_names() {
        let mut asset = Asset {
            name: "robot".into(),
            nodes: vec![
                Node {
                    name: "hip".into(),
                    ..Default::default()
                },
                Node::default(),
            ],
            ..Default::default()
        };
        generate_names(&mut asset);
        assert_eq!(asset.nodes[0].name, "hip");
        assert_eq!(asset.nodes[1].name, "Node_1");
        assert_eq!(asset.nodes[1].unique_id, "robot_Node_1");
        assert_eq!(asset.node_by_unique_id("robot_Node_0"), Some(0));
    }
}
