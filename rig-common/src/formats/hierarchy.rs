//! Bone hierarchy format (bones.pack)
//!
//! # Layout
//! ```text
//! repeat MAX_BONES:
//!   u32 child_count
//!   child_count x s32 child_id
//! ```
//!
//! The table always spans the full fixed capacity; unused and leaf slots are
//! written with `child_count = 0`.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use super::serialization::{DecodeError, PackReader};
use super::{BoneId, MAX_BONES, bone_index};

/// Parent -> children adjacency table indexed by bone id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneHierarchy {
    children: Vec<Vec<BoneId>>,
}

impl Default for BoneHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl BoneHierarchy {
    /// Empty table with every slot present
    pub fn new() -> Self {
        Self {
            children: vec![Vec::new(); MAX_BONES],
        }
    }

    /// Append `child` to the children of `parent`.
    ///
    /// Returns `false` if either id lies outside the table.
    pub fn link(&mut self, parent: BoneId, child: BoneId) -> bool {
        match (bone_index(parent), bone_index(child)) {
            (Some(parent), Some(_)) => {
                self.children[parent].push(child);
                true
            }
            _ => false,
        }
    }

    /// Children of a bone in discovery order; empty for unknown ids
    pub fn children(&self, bone_id: BoneId) -> &[BoneId] {
        bone_index(bone_id)
            .map(|index| self.children[index].as_slice())
            .unwrap_or(&[])
    }

    /// Number of parent -> child links in the table
    pub fn link_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    /// Decode a complete bones.pack buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = PackReader::new(bytes);
        let mut hierarchy = Self::new();

        for slot in hierarchy.children.iter_mut() {
            let child_count = reader.read_count("child", 4)?;
            slot.reserve_exact(child_count);
            for _ in 0..child_count {
                let child = reader.read_i32()?;
                if bone_index(child).is_none() {
                    return Err(DecodeError::BoneIdOutOfRange(child));
                }
                slot.push(child);
            }
        }

        reader.finish()?;
        Ok(hierarchy)
    }
}

/// Write a complete bones.pack stream
pub fn write_hierarchy<W: Write>(w: &mut W, hierarchy: &BoneHierarchy) -> io::Result<()> {
    for children in &hierarchy.children {
        w.write_u32::<LittleEndian>(children.len() as u32)?;
        for &child in children {
            w.write_i32::<LittleEndian>(child)?;
        }
    }
    Ok(())
}
