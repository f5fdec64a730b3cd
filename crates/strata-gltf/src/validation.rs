//! Post-build reference check: every stored index is absent or in range.

use crate::accessor::AccessorState;
use crate::asset::{Asset, IesSource};

struct Checker<'a> {
    problems: &'a mut Vec<String>,
}

impl Checker<'_> {
    fn index(&mut self, what: &str, owner: usize, index: usize, len: usize) {
        if index >= len {
            self.problems
                .push(format!("{} of entity {} refers to {} (only {} available)", what, owner, index, len));
        }
    }

    fn optional(&mut self, what: &str, owner: usize, index: Option<usize>, len: usize) {
        if let Some(index) = index {
            self.index(what, owner, index, len);
        }
    }
}

/// Describe every dangling reference of `asset`. Empty means valid.
pub fn validate(asset: &Asset) -> Vec<String> {
    let mut problems = Vec::new();
    let mut check = Checker { problems: &mut problems };

    let buffers = asset.buffers.len();
    let views = asset.buffer_views.len();
    let accessors = asset.accessors.len();
    let nodes = asset.nodes.len();
    let materials = asset.materials.len();
    let textures = asset.textures.len();

    for (i, view) in asset.buffer_views.iter().enumerate() {
        check.index("bufferView.buffer", i, view.buffer, buffers);
    }

    for (i, accessor) in asset.accessors.iter().enumerate() {
        if let AccessorState::Backed { buffer_view } = accessor.state {
            check.index("accessor.bufferView", i, buffer_view, views);
        }
        if let Some(sparse) = &accessor.sparse {
            check.index("accessor.sparse.indices", i, sparse.indices.buffer_view, views);
            check.index("accessor.sparse.values", i, sparse.values.buffer_view, views);
        }
    }

    for (i, mesh) in asset.meshes.iter().enumerate() {
        for primitive in &mesh.primitives {
            check.optional("primitive.material", i, primitive.material, materials);
            check.optional("primitive.indices", i, primitive.indices, accessors);
            let targets = primitive.targets.iter().flat_map(|target| target.values());
            for &accessor in primitive.attributes.values().chain(targets) {
                check.index("primitive.attribute", i, accessor, accessors);
            }
            for mapping in &primitive.variant_mappings {
                check.index("primitive.variant.material", i, mapping.material, materials);
                for &variant in &mapping.variants {
                    check.index("primitive.variant", i, variant, asset.variants.len());
                }
            }
            if let Some(draco) = &primitive.draco {
                check.index("primitive.draco.bufferView", i, draco.buffer_view, views);
            }
        }
    }

    for (i, node) in asset.nodes.iter().enumerate() {
        for &child in &node.children {
            check.index("node.child", i, child, nodes);
        }
        check.optional("node.mesh", i, node.mesh, asset.meshes.len());
        check.optional("node.skin", i, node.skin, asset.skins.len());
        check.optional("node.camera", i, node.camera, asset.cameras.len());
        check.optional("node.light", i, node.light, asset.lights.len());
        check.optional("node.lightIes", i, node.light_ies.map(|r| r.light), asset.ies_lights.len());
        check.optional("node.parent", i, node.parent, nodes);
        check.optional("node.parentJoint", i, node.parent_joint, nodes);
        check.optional("node.rootJoint", i, node.root_joint, nodes);
    }

    for (i, scene) in asset.scenes.iter().enumerate() {
        for &root in &scene.nodes {
            check.index("scene.node", i, root, nodes);
        }
    }
    check.optional("asset.scene", 0, asset.default_scene, asset.scenes.len());

    for (i, camera) in asset.cameras.iter().enumerate() {
        check.optional("camera.node", i, camera.node, nodes);
    }

    for (i, light) in asset.ies_lights.iter().enumerate() {
        if let Some(IesSource::BufferView { buffer_view, .. }) = &light.source {
            check.index("iesLight.bufferView", i, *buffer_view, views);
        }
    }

    for (i, skin) in asset.skins.iter().enumerate() {
        check.optional("skin.inverseBindMatrices", i, skin.inverse_bind_matrices, accessors);
        for &joint in &skin.joints {
            check.index("skin.joint", i, joint, nodes);
        }
        check.optional("skin.skeleton", i, skin.skeleton, nodes);
        check.optional("skin.commonRoot", i, skin.common_root, nodes);
    }

    for (i, animation) in asset.animations.iter().enumerate() {
        for sampler in &animation.samplers {
            check.index("animation.sampler.input", i, sampler.input, accessors);
            check.index("animation.sampler.output", i, sampler.output, accessors);
        }
        for channel in &animation.channels {
            check.index("animation.channel.sampler", i, channel.sampler, animation.samplers.len());
            check.index("animation.channel.node", i, channel.node, nodes);
        }
    }

    for (i, image) in asset.images.iter().enumerate() {
        check.optional("image.bufferView", i, image.buffer_view, views);
    }

    for (i, texture) in asset.textures.iter().enumerate() {
        check.optional("texture.source", i, texture.source, asset.images.len());
        check.optional("texture.sampler", i, texture.sampler, asset.samplers.len());
    }

    for (i, material) in asset.materials.iter().enumerate() {
        for (_, texture) in material.texture_references() {
            check.index("material.texture", i, texture, textures);
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Node, Scene};

    #[test]
    fn test_dangling_child_is_reported() {
        let mut asset = Asset {
            nodes: vec![Node {
                children: vec![3],
                ..Default::default()
            }],
            scenes: vec![Scene {
                nodes: vec![0],
                ..Default::default()
            }],
            ..Default::default()
        };
        let problems = validate(&asset);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("node.child"));

        asset.nodes[0].children.clear();
        assert!(validate(&asset).is_empty());
    }
}
