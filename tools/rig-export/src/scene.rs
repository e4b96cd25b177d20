//! In-memory scene import.
//!
//! This is what the compilers consume: a node tree, meshes with per-bone
//! weight lists, and animation channels keyed in ticks. Importers (see
//! [`crate::import`]) fill it in from a file format; tests build it by hand.

use glam::{Mat4, Quat, Vec3};

/// Node in the scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
        }
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// First node named `name`, searching this node then its subtrees in
    /// order (pre-order depth first)
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// One vertex influenced by a bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// Bone referenced by a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBone {
    /// Name of the node this bone binds to
    pub name: String,
    /// Inverse bind pose
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

/// Mesh as imported, before packing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    /// Polygon index lists; the compiler only accepts triangles
    pub faces: Vec<Vec<u32>>,
    pub bones: Vec<SceneBone>,
}

/// Vector key in ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneVectorKey {
    pub time: f64,
    pub value: Vec3,
}

/// Rotation key in ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneQuatKey {
    pub time: f64,
    pub value: Quat,
}

/// Keys driving one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeChannel {
    pub node_name: String,
    pub position_keys: Vec<SceneVectorKey>,
    pub rotation_keys: Vec<SceneQuatKey>,
    pub scaling_keys: Vec<SceneVectorKey>,
}

/// Animation clip as imported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneAnimation {
    pub name: String,
    /// Length in ticks
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: Vec<NodeChannel>,
}

/// Complete import of one scene file
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub root: SceneNode,
    pub meshes: Vec<SceneMesh>,
    pub animations: Vec<SceneAnimation>,
}

impl Scene {
    pub fn new(root: SceneNode) -> Self {
        Self {
            root,
            meshes: Vec::new(),
            animations: Vec::new(),
        }
    }
}

/// Print a node tree with each node's local transform, one row per line
pub fn print_nodes(
    node: &SceneNode,
    depth: usize,
    out: &mut impl std::fmt::Write,
) -> std::fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(out, "{}{}", indent, node.name)?;

    let rows = node.transform.transpose().to_cols_array_2d();
    for row in rows {
        writeln!(
            out,
            "{}{:.6} {:.6} {:.6} {:.6}",
            indent, row[0], row[1], row[2], row[3]
        )?;
    }

    for child in &node.children {
        print_nodes(child, depth + 1, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SceneNode {
        SceneNode::new("Root", Mat4::IDENTITY)
            .with_child(
                SceneNode::new("Armature", Mat4::IDENTITY)
                    .with_child(SceneNode::new("Hips", Mat4::from_translation(Vec3::Y))),
            )
            .with_child(SceneNode::new("Hips", Mat4::from_translation(Vec3::X)))
    }

    #[test]
    fn test_find_is_preorder_first_match() {
        let root = tree();
        let hips = root.find("Hips").unwrap();
        assert_eq!(hips.transform, Mat4::from_translation(Vec3::Y));
        assert!(root.find("Missing").is_none());
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_print_nodes_indents_children() {
        let mut out = String::new();
        print_nodes(&tree(), 0, &mut out).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Root");
        assert_eq!(lines[1], "1.000000 0.000000 0.000000 0.000000");
        assert_eq!(lines[5], "  Armature");
        assert_eq!(lines[10], "    Hips");
        // Translation shows up in the last column of the first row
        assert_eq!(lines[16], "  1.000000 0.000000 0.000000 1.000000");
    }
}
