//! Skeleton extraction from the scene node tree.
//!
//! Only nodes whose names are registered bones take part; every other node
//! is transparent and its children attach to the nearest bone above it.

use hashbrown::HashSet;
use rig_common::{BoneHierarchy, BoneId};

use crate::registry::BoneRegistry;
use crate::scene::SceneNode;

/// Link the bones under `node` into `hierarchy`.
///
/// `ancestor` is the nearest bone above `node` (`None` at the top). A bone
/// already in `visited` is skipped along with its whole subtree, so a bone
/// name appearing at several nodes is linked to one parent only and the
/// table stays acyclic. `visited` persists across calls: every model in a
/// session shares it.
pub fn build_skeleton(
    node: &SceneNode,
    ancestor: Option<BoneId>,
    bones: &BoneRegistry,
    visited: &mut HashSet<BoneId>,
    hierarchy: &mut BoneHierarchy,
) {
    match bones.get(&node.name) {
        Some(bone) => {
            if !visited.insert(bone) {
                return;
            }
            if let Some(parent) = ancestor {
                // Registry ids are always below MAX_BONES
                let linked = hierarchy.link(parent, bone);
                debug_assert!(linked, "bone id {} or {} outside the table", parent, bone);
            }
            for child in &node.children {
                build_skeleton(child, Some(bone), bones, visited, hierarchy);
            }
        }
        None => {
            for child in &node.children {
                build_skeleton(child, ancestor, bones, visited, hierarchy);
            }
        }
    }
}

/// First node in pre-order whose name is a registered bone.
///
/// This is the first bone met in traversal order, which is not necessarily
/// the shallowest one when sibling subtrees both contain bones.
pub fn find_root_bone<'a>(node: &'a SceneNode, bones: &BoneRegistry) -> Option<&'a SceneNode> {
    if bones.contains(&node.name) {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_root_bone(child, bones))
}
