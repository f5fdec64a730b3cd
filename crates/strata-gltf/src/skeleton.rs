//! Skeleton topology resolution.
//!
//! Runs once the node and skin arrays are complete:
//!
//! 1. mark skins referenced by a node as used, warn about the rest;
//! 2. classify every node's kind, promoting joints of used skins;
//! 3. walk the scenes to assign `parent` and `parent_joint`;
//! 4. give every used skin a single root joint, inserting proxy joints where
//!    the skin's joint trees hang off different points;
//! 5. derive per-skin global and local bind matrices from the inverse bind
//!    matrices and settle each joint's local bind pose.
//!
//! Proxies are joints themselves, so a second run finds every skin already
//! consolidated and inserts nothing.

use std::collections::{BTreeMap, BTreeSet};

use glam::Mat4;

use crate::asset::{Asset, Node, NodeKind};
use crate::convert::Transform;
use crate::messages::MessageLog;
use crate::names::{display_name, EntityKind};

const PROXY_ROOT_SUFFIX: &str = "_ProxyTrueRootJoint";
const BIND_POSE_TOLERANCE: f32 = 1e-4;

/// Local bind matrices of the asset, or the joints that disagree across skins.
#[derive(Debug, Clone, PartialEq)]
pub enum BindPoseResult {
    /// `(node, local bind matrix)` for every joint with a derivable pose.
    Consistent(Vec<(usize, Mat4)>),
    /// Names of the joints with different local bind matrices in different skins.
    Conflicting(Vec<String>),
}

pub fn resolve_skeletons(asset: &mut Asset, log: &mut MessageLog) {
    mark_used_skins(asset, log);
    classify_nodes(asset, log);
    assign_parents(asset);

    for skin in 0..asset.skins.len() {
        if asset.skins[skin].used && consolidate_root_joints(asset, skin, log) {
            assign_parents(asset);
        }
    }
    assign_common_roots(asset);
    assign_root_joints(asset);

    match compute_bind_poses(asset) {
        BindPoseResult::Consistent(poses) => {
            asset.has_abnormal_inverse_bind_matrices = false;
            for (node, local) in poses {
                asset.nodes[node].local_bind_pose = Some(Transform::from_matrix(local));
            }
        }
        BindPoseResult::Conflicting(names) => {
            log.warning(format!(
                "The same Joint(s) are used in multiple Skins with multiple different InverseBindMatrix values, \
                 which is not supported. Ignoring InverseBindMatrices for the entire Import. \
                 Offending Joints' Names: {}.",
                names.join(", ")
            ));
            asset.has_abnormal_inverse_bind_matrices = true;
            for node in asset.nodes.iter_mut().filter(|node| !node.is_proxy_root) {
                node.local_bind_pose = None;
            }
        }
    }
}

// ============================================================================
// Usage and kinds
// ============================================================================

fn mark_used_skins(asset: &mut Asset, log: &mut MessageLog) {
    let used: BTreeSet<usize> = asset.nodes.iter().filter_map(|node| node.skin).collect();
    let mut unused = Vec::new();
    for (index, skin) in asset.skins.iter_mut().enumerate() {
        skin.used = used.contains(&index);
        if !skin.used {
            unused.push(index.to_string());
        }
    }
    if !unused.is_empty() {
        log.warning(format!("Skin objects unused. At indices: {}.", unused.join(", ")));
    }
}

fn intrinsic_kind(node: &Node) -> NodeKind {
    if node.is_proxy_root {
        NodeKind::Joint
    } else if node.mesh.is_some() {
        if node.skin.is_some() {
            NodeKind::MeshSkinned
        } else {
            NodeKind::Mesh
        }
    } else if node.camera.is_some() {
        NodeKind::Camera
    } else if node.light.is_some() || node.light_ies.is_some() {
        NodeKind::Light
    } else if !node.transform.is_identity() {
        NodeKind::Transform
    } else {
        NodeKind::None
    }
}

fn classify_nodes(asset: &mut Asset, log: &mut MessageLog) {
    for node in &mut asset.nodes {
        node.kind = intrinsic_kind(node);
    }

    let mut conflicting = BTreeSet::new();
    for skin in asset.skins.iter().filter(|skin| skin.used) {
        for &joint in &skin.joints {
            let Some(node) = asset.nodes.get_mut(joint) else {
                continue;
            };
            match node.kind {
                NodeKind::None | NodeKind::Transform | NodeKind::Joint => node.kind = NodeKind::Joint,
                _ => {
                    conflicting.insert(joint);
                }
            }
        }
    }
    for joint in conflicting {
        let node = &asset.nodes[joint];
        log.warning(format!(
            "Node '{}' is used as a joint but is already a {:?} node; keeping its kind.",
            display_name(&node.name, EntityKind::Node, joint),
            node.kind
        ));
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

/// Depth-first walk from every scene root. A node reached a second time keeps
/// its first parent and is not descended into again.
fn assign_parents(asset: &mut Asset) {
    let count = asset.nodes.len();
    for node in &mut asset.nodes {
        node.parent = None;
        node.parent_joint = None;
    }

    let mut visited = vec![false; count];
    let mut stack: Vec<(usize, Option<usize>)> = Vec::new();
    for scene in &asset.scenes {
        for &root in &scene.nodes {
            if root >= count || visited[root] {
                continue;
            }
            visited[root] = true;
            stack.push((root, None));

            while let Some((index, parent_joint)) = stack.pop() {
                asset.nodes[index].parent_joint = parent_joint;
                let joint_for_children = if asset.nodes[index].kind == NodeKind::Joint {
                    Some(index)
                } else {
                    parent_joint
                };
                let children = asset.nodes[index].children.clone();
                for child in children.into_iter().rev() {
                    if child < count && !visited[child] {
                        visited[child] = true;
                        asset.nodes[child].parent = Some(index);
                        stack.push((child, joint_for_children));
                    }
                }
            }
        }
    }
}

/// Number of parent steps to the top of the hierarchy.
fn root_distance(nodes: &[Node], index: usize) -> usize {
    let mut distance = 0;
    let mut current = index;
    while let Some(parent) = nodes[current].parent {
        distance += 1;
        current = parent;
        if distance > nodes.len() {
            break;
        }
    }
    distance
}

/// `index` followed by its ancestors.
fn ancestors(nodes: &[Node], index: usize) -> Vec<usize> {
    let mut chain = vec![index];
    let mut current = index;
    while let Some(parent) = nodes[current].parent {
        if chain.len() > nodes.len() {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Topmost joint above `index` following `parent_joint` while `within` accepts
/// the next ancestor.
fn top_joint(nodes: &[Node], index: usize, within: impl Fn(usize) -> bool) -> usize {
    let mut current = index;
    let mut steps = 0;
    while let Some(parent) = nodes[current].parent_joint.filter(|&parent| within(parent)) {
        current = parent;
        steps += 1;
        if steps > nodes.len() {
            break;
        }
    }
    current
}

/// Distinct topmost joints of a skin's joint trees. Joints of other skins
/// above them do not count.
fn skin_roots(asset: &Asset, skin: usize) -> BTreeSet<usize> {
    let joints: BTreeSet<usize> = asset.skins[skin].joints.iter().copied().collect();
    joints
        .iter()
        .filter(|&&joint| asset.nodes.get(joint).is_some_and(|node| node.kind == NodeKind::Joint))
        .map(|&joint| top_joint(&asset.nodes, joint, |parent| joints.contains(&parent)))
        .collect()
}

// ============================================================================
// Root consolidation
// ============================================================================

/// Returns `true` when a proxy was inserted.
fn consolidate_root_joints(asset: &mut Asset, skin: usize, log: &mut MessageLog) -> bool {
    let mut grouped: BTreeMap<Option<usize>, Vec<usize>> = BTreeMap::new();
    for root in skin_roots(asset, skin) {
        grouped.entry(asset.nodes[root].parent).or_default().push(root);
    }

    let depth = |key: &Option<usize>| key.map_or(0, |parent| root_distance(&asset.nodes, parent) + 1);
    let mut groups: Vec<(Option<usize>, Vec<usize>)> = grouped.into_iter().collect();
    groups.sort_by(|(a, _), (b, _)| depth(b).cmp(&depth(a)).then(a.cmp(b)));

    if let Some(skeleton) = asset.skins[skin].skeleton.filter(|&s| s < asset.nodes.len()) {
        let skeleton_distance = root_distance(&asset.nodes, skeleton);
        let not_common = groups
            .iter()
            .filter_map(|(key, members)| match members.as_slice() {
                [single] => Some(*single),
                _ => *key,
            })
            .any(|candidate| skeleton_distance > root_distance(&asset.nodes, candidate));
        if not_common {
            log.warning("Skeleton node is not a common root.");
        }
    }

    let mut inserted = false;
    for (key, members) in groups {
        if members.len() >= 2 {
            insert_proxy_root(asset, key, &members);
            inserted = true;
        }
    }
    inserted
}

/// Append a proxy joint as the common parent of `members`, whose shared parent is `key`.
fn insert_proxy_root(asset: &mut Asset, key: Option<usize>, members: &[usize]) -> usize {
    let proxy = asset.nodes.len();
    let mut node = Node {
        index: proxy,
        kind: NodeKind::Joint,
        is_proxy_root: true,
        local_bind_pose: Some(Transform::IDENTITY),
        ..Default::default()
    };

    match key {
        Some(parent) => {
            node.name = format!("{}{}", asset.nodes[parent].name, PROXY_ROOT_SUFFIX);
            node.children = std::mem::replace(&mut asset.nodes[parent].children, vec![proxy]);

            if asset.scenes.iter().any(|scene| scene.nodes.contains(&parent)) {
                for root in asset.scenes.iter_mut().flat_map(|scene| scene.nodes.iter_mut()) {
                    if *root == parent {
                        *root = proxy;
                    }
                }
                node.transform = asset.nodes[parent].transform;
                asset.nodes[parent].children.clear();
            }
        }
        None => {
            node.name = PROXY_ROOT_SUFFIX.to_owned();
            node.children = members.to_vec();
            for scene in &mut asset.scenes {
                let before = scene.nodes.len();
                scene.nodes.retain(|root| !members.contains(root));
                if scene.nodes.len() != before {
                    scene.nodes.push(proxy);
                }
            }
        }
    }

    asset.nodes.push(node);
    proxy
}

fn assign_common_roots(asset: &mut Asset) {
    for skin in 0..asset.skins.len() {
        if !asset.skins[skin].used {
            asset.skins[skin].common_root = None;
            continue;
        }
        let roots: Vec<usize> = skin_roots(asset, skin).into_iter().collect();
        let common_root = match roots.as_slice() {
            [] => None,
            [single] => Some(*single),
            [first, rest @ ..] => {
                let others: Vec<BTreeSet<usize>> = rest
                    .iter()
                    .map(|&root| ancestors(&asset.nodes, root).into_iter().collect())
                    .collect();
                ancestors(&asset.nodes, *first)
                    .into_iter()
                    .find(|candidate| others.iter().all(|chain| chain.contains(candidate)))
            }
        };
        asset.skins[skin].common_root = common_root;
    }
}

fn assign_root_joints(asset: &mut Asset) {
    for index in 0..asset.nodes.len() {
        let root_joint = (asset.nodes[index].kind == NodeKind::Joint).then(|| top_joint(&asset.nodes, index, |_| true));
        asset.nodes[index].root_joint = root_joint;
    }
}

// ============================================================================
// Bind poses
// ============================================================================

/// Fill every joint's per-skin global inverse bind and local bind matrices and
/// check them for cross-skin conflicts.
///
/// Only used skins whose inverse bind matrix accessor is readable and holds one
/// matrix per joint contribute.
pub fn compute_bind_poses(asset: &mut Asset) -> BindPoseResult {
    for node in &mut asset.nodes {
        node.skin_global_inverse_bind.clear();
        node.skin_local_bind.clear();
    }

    let mut qualifying = Vec::new();
    for (index, skin) in asset.skins.iter().enumerate().filter(|(_, skin)| skin.used) {
        let Some(reader) = skin
            .inverse_bind_matrices
            .and_then(|accessor| asset.accessor_reader(accessor))
        else {
            continue;
        };
        if reader.count() != skin.joints.len() {
            continue;
        }
        let matrices = reader.converted_mat4_array();
        if matrices.len() == skin.joints.len() {
            qualifying.push((index, skin.joints.clone(), matrices));
        }
    }

    for (skin, joints, matrices) in &qualifying {
        for (&joint, &matrix) in joints.iter().zip(matrices) {
            if let Some(node) = asset.nodes.get_mut(joint) {
                node.skin_global_inverse_bind.insert(*skin, matrix);
            }
        }
    }

    for (skin, joints, _) in &qualifying {
        for &joint in joints {
            let Some(node) = asset.nodes.get(joint) else {
                continue;
            };
            let Some(&global) = node.skin_global_inverse_bind.get(skin) else {
                continue;
            };
            // A parent joint outside this skin still anchors the chain through
            // any inverse bind matrix it has.
            let parent_global = node.parent_joint.and_then(|parent| {
                let matrices = &asset.nodes[parent].skin_global_inverse_bind;
                matrices.get(skin).or_else(|| matrices.values().next()).copied()
            });
            let local = match parent_global {
                Some(parent_global) => parent_global * global.inverse(),
                None => global.inverse(),
            };
            asset.nodes[joint].skin_local_bind.insert(*skin, local);
        }
    }

    let conflicting: Vec<String> = asset
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            let mut locals = node.skin_local_bind.values();
            match locals.next() {
                Some(first) => locals.any(|other| !other.abs_diff_eq(*first, BIND_POSE_TOLERANCE)),
                None => false,
            }
        })
        .map(|(index, node)| display_name(&node.name, EntityKind::Node, index))
        .collect();

    if !conflicting.is_empty() {
        return BindPoseResult::Conflicting(conflicting);
    }

    BindPoseResult::Consistent(
        asset
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.skin_local_bind.values().next().map(|local| (index, *local)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Scene, Skin};
    use glam::Vec3;

    fn node(children: Vec<usize>) -> Node {
        Node {
            children,
            ..Default::default()
        }
    }

    /// 0 (transform root) -> {1, 2}; 1 -> 3; 2 -> 4. Skin joints 1..=4, mesh on 5.
    fn split_skeleton() -> Asset {
        let mut nodes = vec![node(vec![1, 2, 5]), node(vec![3]), node(vec![4]), node(vec![]), node(vec![]), node(vec![])];
        nodes[0].name = "Armature".into();
        nodes[5].mesh = Some(0);
        nodes[5].skin = Some(0);
        for (index, node) in nodes.iter_mut().enumerate() {
            node.index = index;
        }
        Asset {
            nodes,
            scenes: vec![Scene {
                nodes: vec![0],
                ..Default::default()
            }],
            skins: vec![Skin {
                joints: vec![1, 2, 3, 4],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_disjoint_roots_get_one_proxy() {
        let mut asset = split_skeleton();
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert_eq!(asset.nodes.len(), 7);
        let proxy = &asset.nodes[6];
        assert!(proxy.is_proxy_root);
        assert_eq!(proxy.kind, NodeKind::Joint);
        assert_eq!(proxy.name, "Armature_ProxyTrueRootJoint");
        assert_eq!(proxy.children, vec![1, 2, 5]);
        assert_eq!(proxy.local_bind_pose, Some(Transform::IDENTITY));

        // The armature is a plain transform root, so the proxy replaces it.
        assert_eq!(asset.scenes[0].nodes, vec![6]);
        assert_eq!(asset.nodes[1].parent, Some(6));
        assert_eq!(asset.nodes[1].parent_joint, Some(6));
        assert_eq!(asset.nodes[3].root_joint, Some(6));
        assert_eq!(asset.skins[0].common_root, Some(6));
        assert_eq!(asset.nodes[5].kind, NodeKind::MeshSkinned);
        assert!(log.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut asset = split_skeleton();
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);
        let first = asset.nodes.clone();
        resolve_skeletons(&mut asset, &mut log);
        assert_eq!(asset.nodes.len(), first.len());
        assert_eq!(asset.nodes, first);
    }

    /// 0 -> {1, 4, 5}; 1 -> 2; 2 -> 3. Skin 0 binds 1..=3 on mesh 4, skin 1
    /// binds the nested 2..=3 on mesh 5.
    fn nested_skins() -> Asset {
        let mut nodes = vec![node(vec![1, 4, 5]), node(vec![2]), node(vec![3]), node(vec![]), node(vec![]), node(vec![])];
        nodes[4].mesh = Some(0);
        nodes[4].skin = Some(0);
        nodes[5].mesh = Some(1);
        nodes[5].skin = Some(1);
        for (index, node) in nodes.iter_mut().enumerate() {
            node.index = index;
        }
        Asset {
            nodes,
            scenes: vec![Scene {
                nodes: vec![0],
                ..Default::default()
            }],
            skins: vec![
                Skin {
                    joints: vec![1, 2, 3],
                    ..Default::default()
                },
                Skin {
                    joints: vec![2, 3],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_skin_roots_stop_at_own_joints() {
        let mut asset = nested_skins();
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert_eq!(asset.nodes.len(), 6);
        assert_eq!(skin_roots(&asset, 0), BTreeSet::from([1]));
        assert_eq!(skin_roots(&asset, 1), BTreeSet::from([2]));
        assert_eq!(asset.skins[0].common_root, Some(1));
        assert_eq!(asset.skins[1].common_root, Some(2));
        assert_eq!(asset.nodes[3].root_joint, Some(1));
    }

    #[test]
    fn test_nested_skin_siblings_get_proxy_below_outer_joint() {
        let mut asset = nested_skins();
        // 1 -> {2, 6}, skin 1 binds the siblings 2 and 6 only.
        asset.nodes.push(Node {
            index: 6,
            ..Default::default()
        });
        asset.nodes[1].children.push(6);
        asset.skins[0].joints.push(6);
        asset.skins[1].joints = vec![2, 6];
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert_eq!(asset.nodes.len(), 8);
        let proxy = &asset.nodes[7];
        assert!(proxy.is_proxy_root);
        assert_eq!(proxy.parent, Some(1));
        assert_eq!(proxy.children, vec![2, 6]);
        assert_eq!(asset.skins[1].common_root, Some(7));
        assert_eq!(asset.skins[0].common_root, Some(1));
    }

    #[test]
    fn test_proxy_replaces_mesh_scene_root() {
        let mut asset = split_skeleton();
        asset.nodes[0].mesh = Some(0);
        asset.nodes[0].transform = Transform {
            translation: Vec3::new(0.0, 2.0, 0.0),
            ..Transform::IDENTITY
        };
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert_eq!(asset.nodes.len(), 7);
        assert_eq!(asset.scenes[0].nodes, vec![6]);
        assert_eq!(asset.nodes[6].children, vec![1, 2, 5]);
        assert!(asset.nodes[0].children.is_empty());
        assert_eq!(asset.nodes[6].transform, asset.nodes[0].transform);
        assert_eq!(asset.nodes[1].parent, Some(6));
        assert_eq!(asset.skins[0].common_root, Some(6));
    }

    #[test]
    fn test_unused_skin_and_joint_kind_conflicts_warn() {
        let mut asset = split_skeleton();
        asset.skins.push(Skin::default());
        asset.nodes[4].camera = Some(0);
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        let texts: Vec<_> = log.iter().map(|m| m.text.clone()).collect();
        assert!(texts.contains(&"Skin objects unused. At indices: 1.".to_string()));
        assert!(texts.iter().any(|t| t.starts_with("Node 'Node_4' is used as a joint")));
        assert_eq!(asset.nodes[4].kind, NodeKind::Camera);
    }

    #[test]
    fn test_declared_skeleton_below_candidate_warns() {
        let mut asset = split_skeleton();
        asset.skins[0].skeleton = Some(3);
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(asset.skins[0].skeleton, Some(3));
        assert_eq!(asset.skins[0].common_root, Some(6));
    }

    #[test]
    fn test_parentless_joint_roots_share_a_new_scene_root() {
        let mut asset = Asset {
            nodes: vec![node(vec![]), node(vec![]), node(vec![])],
            scenes: vec![Scene {
                nodes: vec![0, 1, 2],
                ..Default::default()
            }],
            skins: vec![Skin {
                joints: vec![0, 1],
                ..Default::default()
            }],
            ..Default::default()
        };
        asset.nodes[2].mesh = Some(0);
        asset.nodes[2].skin = Some(0);
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert_eq!(asset.nodes[3].name, "_ProxyTrueRootJoint");
        assert_eq!(asset.nodes[3].children, vec![0, 1]);
        assert_eq!(asset.scenes[0].nodes, vec![2, 3]);
        assert_eq!(asset.nodes[0].parent, Some(3));
    }

    /// Appends a MAT4 accessor holding `matrices` and returns its index.
    fn push_matrices(asset: &mut Asset, matrices: &[Mat4]) -> usize {
        use crate::accessor::{Accessor, AccessorState, AccessorType, Buffer, BufferView};
        use byteorder::{LittleEndian, WriteBytesExt};

        let mut bytes = Vec::new();
        for value in matrices.iter().flat_map(|m| m.to_cols_array()) {
            bytes.write_f32::<LittleEndian>(value).unwrap();
        }
        let range = asset.push_bytes(&bytes);
        asset.buffers.push(Buffer {
            byte_length: bytes.len(),
            data: Some(range),
            ..Default::default()
        });
        asset.buffer_views.push(BufferView {
            buffer: asset.buffers.len() - 1,
            byte_length: bytes.len(),
            ..Default::default()
        });
        asset.accessors.push(Accessor {
            state: AccessorState::Backed {
                buffer_view: asset.buffer_views.len() - 1,
            },
            count: matrices.len(),
            accessor_type: AccessorType::Mat4,
            ..Default::default()
        });
        asset.accessors.len() - 1
    }

    /// Chain 0 -> 1 -> 2, joints 0 and 1, skinned mesh on 2.
    fn chain() -> Asset {
        let mut asset = Asset {
            nodes: vec![node(vec![1]), node(vec![2]), node(vec![])],
            scenes: vec![Scene {
                nodes: vec![0],
                ..Default::default()
            }],
            ..Default::default()
        };
        asset.nodes[2].mesh = Some(0);
        asset.nodes[2].skin = Some(0);
        asset
    }

    fn inverse_translation(y: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, y, 0.0)).inverse()
    }

    #[test]
    fn test_bind_poses_from_inverse_bind_matrices() {
        let mut asset = chain();
        let ibm = push_matrices(&mut asset, &[inverse_translation(1.0), inverse_translation(3.0)]);
        asset.skins.push(Skin {
            inverse_bind_matrices: Some(ibm),
            joints: vec![0, 1],
            ..Default::default()
        });
        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert!(!asset.has_abnormal_inverse_bind_matrices);
        // glTF +Y maps to +Z.
        let root = asset.nodes[0].local_bind_pose.unwrap();
        let child = asset.nodes[1].local_bind_pose.unwrap();
        assert!(root.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
        assert!(child.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        assert_eq!(asset.nodes[2].local_bind_pose, None);
    }

    #[test]
    fn test_conflicting_inverse_bind_matrices_disable_bind_poses() {
        let mut asset = chain();
        asset.nodes[1].name = "forearm".into();
        asset.nodes.push(Node {
            index: 3,
            mesh: Some(0),
            skin: Some(1),
            ..Default::default()
        });
        asset.nodes[1].children.push(3);
        let first = push_matrices(&mut asset, &[inverse_translation(1.0), inverse_translation(3.0)]);
        let second = push_matrices(&mut asset, &[inverse_translation(1.0), inverse_translation(5.0)]);
        for ibm in [first, second] {
            asset.skins.push(Skin {
                inverse_bind_matrices: Some(ibm),
                joints: vec![0, 1],
                ..Default::default()
            });
        }

        let mut log = MessageLog::new();
        resolve_skeletons(&mut asset, &mut log);

        assert!(asset.has_abnormal_inverse_bind_matrices);
        assert!(asset.nodes.iter().all(|node| node.local_bind_pose.is_none()));
        assert_eq!(log.len(), 1);
        let text = &log.iter().next().unwrap().text;
        assert!(text.ends_with("Offending Joints' Names: forearm."));
    }
}
