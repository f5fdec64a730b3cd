//! Quantified invariants of the skeleton resolver over generated hierarchies.

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Mat4, Quat, Vec3};
use proptest::prelude::*;

use strata_gltf::accessor::{Accessor, AccessorState, AccessorType, Buffer, BufferView};
use strata_gltf::asset::{Node, NodeKind, Scene, Skin};
use strata_gltf::skeleton::resolve_skeletons;
use strata_gltf::{Asset, MessageLog};

/// A forest where node `i` hangs below `parents[i]` (always an earlier node),
/// a skin over the flagged joints and a skinned mesh node as an extra root.
fn forest(parents: &[Option<usize>], joints: &[bool]) -> Asset {
    let count = parents.len();
    let mut nodes: Vec<Node> = (0..count)
        .map(|index| Node {
            index,
            ..Default::default()
        })
        .collect();
    for (child, parent) in parents.iter().enumerate() {
        if let Some(parent) = *parent {
            nodes[parent].children.push(child);
        }
    }
    nodes.push(Node {
        index: count,
        mesh: Some(0),
        skin: Some(0),
        ..Default::default()
    });

    let mut roots: Vec<usize> = (0..count).filter(|&i| parents[i].is_none()).collect();
    roots.push(count);

    Asset {
        nodes,
        scenes: vec![Scene {
            nodes: roots,
            ..Default::default()
        }],
        skins: vec![Skin {
            joints: (0..count).filter(|&i| joints[i]).collect(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn forest_strategy() -> impl Strategy<Value = (Vec<Option<usize>>, Vec<bool>)> {
    (1usize..14).prop_flat_map(|count| {
        let parents = (0..count)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::weighted(0.8, 0..i).boxed()
                }
            })
            .collect::<Vec<_>>();
        (parents, prop::collection::vec(any::<bool>(), count))
    })
}

fn reachable(asset: &Asset) -> Vec<usize> {
    let mut seen = vec![false; asset.nodes.len()];
    let mut stack: Vec<usize> = asset.scenes.iter().flat_map(|s| s.nodes.iter().copied()).collect();
    let mut out = Vec::new();
    while let Some(index) = stack.pop() {
        if std::mem::replace(&mut seen[index], true) {
            continue;
        }
        out.push(index);
        stack.extend(asset.nodes[index].children.iter().copied());
    }
    out
}

proptest! {
    #[test]
    fn prop_parent_links_match_children((parents, joints) in forest_strategy()) {
        let mut asset = forest(&parents, &joints);
        resolve_skeletons(&mut asset, &mut MessageLog::new());

        let roots: Vec<usize> = asset.scenes[0].nodes.clone();
        for index in reachable(&asset) {
            match asset.nodes[index].parent {
                None => prop_assert!(roots.contains(&index), "node {} has no parent", index),
                Some(parent) => {
                    prop_assert!(!roots.contains(&index));
                    prop_assert!(asset.nodes[parent].children.contains(&index));
                }
            }
        }
    }

    #[test]
    fn prop_root_joint_is_reachable_top_joint((parents, joints) in forest_strategy()) {
        let mut asset = forest(&parents, &joints);
        resolve_skeletons(&mut asset, &mut MessageLog::new());

        for (index, node) in asset.nodes.iter().enumerate().filter(|(_, n)| n.kind == NodeKind::Joint) {
            let root = node.root_joint;
            prop_assert!(root.is_some(), "joint {} without root joint", index);
            let root = root.unwrap_or(index);
            prop_assert_eq!(asset.nodes[root].parent_joint, None);

            let mut current = index;
            let mut steps = 0;
            while current != root {
                let next = asset.nodes[current].parent_joint;
                prop_assert!(next.is_some() && steps <= asset.nodes.len());
                current = next.unwrap_or(root);
                steps += 1;
            }
        }
    }

    #[test]
    fn prop_resolution_is_idempotent((parents, joints) in forest_strategy()) {
        let mut asset = forest(&parents, &joints);
        resolve_skeletons(&mut asset, &mut MessageLog::new());
        let nodes = asset.nodes.clone();
        let scenes = asset.scenes.clone();

        resolve_skeletons(&mut asset, &mut MessageLog::new());
        prop_assert_eq!(asset.nodes.len(), nodes.len());
        prop_assert_eq!(&asset.scenes, &scenes);
        for (before, after) in nodes.iter().zip(&asset.nodes) {
            prop_assert_eq!(before.parent, after.parent);
            prop_assert_eq!(before.root_joint, after.root_joint);
        }
    }
}

// ============================================================================
// Bind pose round trip
// ============================================================================

/// A joint chain with the given local transforms and inverse bind matrices
/// derived from them, stored the way glTF stores them.
fn chain_with_bind_matrices(locals: &[(Vec3, f32)]) -> Asset {
    let count = locals.len();
    let mut global = Mat4::IDENTITY;
    let mut bytes = Vec::new();
    for &(translation, angle) in locals {
        global *= Mat4::from_rotation_translation(Quat::from_rotation_y(angle), translation);
        for value in global.inverse().to_cols_array() {
            bytes.write_f32::<LittleEndian>(value).unwrap();
        }
    }

    let mut asset = Asset::default();
    let range = asset.push_bytes(&bytes);
    asset.buffers.push(Buffer {
        byte_length: bytes.len(),
        data: Some(range),
        ..Default::default()
    });
    asset.buffer_views.push(BufferView {
        buffer: 0,
        byte_length: bytes.len(),
        ..Default::default()
    });
    asset.accessors.push(Accessor {
        state: AccessorState::Backed { buffer_view: 0 },
        count,
        accessor_type: AccessorType::Mat4,
        ..Default::default()
    });

    asset.nodes = (0..count)
        .map(|index| Node {
            index,
            children: if index + 1 < count { vec![index + 1] } else { Vec::new() },
            ..Default::default()
        })
        .collect();
    asset.nodes.push(Node {
        index: count,
        mesh: Some(0),
        skin: Some(0),
        ..Default::default()
    });
    asset.scenes.push(Scene {
        nodes: vec![0, count],
        ..Default::default()
    });
    asset.skins.push(Skin {
        inverse_bind_matrices: Some(0),
        joints: (0..count).collect(),
        ..Default::default()
    });
    asset
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_local_bind_poses_compose_to_global(
        locals in prop::collection::vec(
            ((-5.0f32..5.0, -5.0f32..5.0, -5.0f32..5.0), -3.0f32..3.0),
            1..6,
        )
    ) {
        let locals: Vec<(Vec3, f32)> = locals
            .into_iter()
            .map(|((x, y, z), angle)| (Vec3::new(x, y, z), angle))
            .collect();
        let mut asset = chain_with_bind_matrices(&locals);
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);
        prop_assert!(!asset.has_abnormal_inverse_bind_matrices);
        prop_assert!(log.is_empty());

        let mut composed = Mat4::IDENTITY;
        for joint in 0..locals.len() {
            let node = &asset.nodes[joint];
            let local = node.local_bind_pose;
            prop_assert!(local.is_some(), "joint {} has no bind pose", joint);
            composed *= local.map(|t| t.to_matrix()).unwrap_or(Mat4::IDENTITY);

            let global = node.skin_global_inverse_bind[&0].inverse();
            prop_assert!(
                composed.abs_diff_eq(global, 1e-3),
                "joint {}: {:?} != {:?}", joint, composed, global
            );
        }
    }
}
