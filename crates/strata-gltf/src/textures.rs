//! Split textures sampled both as normal maps and as colour data.
//!
//! Normal maps need a green-channel flip on import that must not leak into
//! the texture's other uses, so such a texture is duplicated and the material's
//! normal-map references are moved to the copy.

use std::collections::{BTreeMap, BTreeSet};

use crate::asset::{Asset, TextureSlot};
use crate::names::{unique_id_prefix, EntityKind};

/// Returns `(original, duplicate)` texture index pairs, in ascending original order.
pub fn resolve_texture_conflicts(asset: &mut Asset) -> Vec<(usize, usize)> {
    let texture_count = asset.textures.len();
    let mut affected: BTreeMap<usize, Vec<(usize, TextureSlot)>> = BTreeMap::new();

    for (material_index, material) in asset.materials.iter().enumerate() {
        let mut normal = BTreeSet::new();
        let mut colour = BTreeSet::new();
        for (slot, texture) in material.texture_references() {
            if texture >= texture_count {
                continue;
            }
            if slot.is_normal_map() {
                normal.insert(texture);
            } else {
                colour.insert(texture);
            }
        }

        for &texture in normal.intersection(&colour) {
            let references = affected.entry(texture).or_default();
            for slot in TextureSlot::ALL.into_iter().filter(|slot| slot.is_normal_map()) {
                if material.texture(slot).and_then(|map| map.texture) == Some(texture) {
                    references.push((material_index, slot));
                }
            }
        }
    }

    let prefix = unique_id_prefix(&asset.name, EntityKind::Texture);
    let mut duplicates = Vec::with_capacity(affected.len());
    for (texture, references) in affected {
        let duplicate = asset.textures.len();
        let mut copy = asset.textures[texture].clone();
        copy.name.push_str("_greenFlipped");
        copy.unique_id = format!("{}{}", prefix, duplicate);
        asset.textures.push(copy);

        for (material, slot) in references {
            if let Some(map) = asset.materials[material].texture_mut(slot) {
                map.texture = Some(duplicate);
            }
        }
        duplicates.push((texture, duplicate));
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Clearcoat, Material, Texture, TextureMap};

    fn map(texture: usize) -> TextureMap {
        TextureMap {
            texture: Some(texture),
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_normal_texture_is_duplicated() {
        let mut asset = Asset {
            name: "crate".into(),
            textures: vec![
                Texture {
                    name: "albedo".into(),
                    ..Default::default()
                },
                Texture {
                    name: "packed".into(),
                    ..Default::default()
                },
            ],
            materials: vec![
                Material {
                    base_color: map(1),
                    normal: map(1),
                    clearcoat: Some(Clearcoat {
                        normal_map: map(1),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                // Normal map only: no conflict.
                Material {
                    base_color: map(0),
                    normal: map(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let duplicates = resolve_texture_conflicts(&mut asset);
        assert_eq!(duplicates, vec![(1, 2)]);
        assert_eq!(asset.textures[2].name, "packed_greenFlipped");
        assert_eq!(asset.textures[2].unique_id, "crate_Texture_2");

        let first = &asset.materials[0];
        assert_eq!(first.base_color.texture, Some(1));
        assert_eq!(first.normal.texture, Some(2));
        assert_eq!(first.clearcoat.unwrap().normal_map.texture, Some(2));
        assert_eq!(asset.materials[1].normal.texture, Some(1));
    }
}
