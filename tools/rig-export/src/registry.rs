//! Name -> id registries for one compile session.
//!
//! Bone ids are dense and handed out in first-seen order. Every model
//! compiled in the same session shares the registry, so a bone name maps to
//! the same id in every model and in every animation.

use hashbrown::HashMap;
use rig_common::{AnimationId, BoneId, MAX_BONES};

use crate::error::CompileError;

/// Bone name -> [`BoneId`]
#[derive(Debug, Clone, Default)]
pub struct BoneRegistry {
    ids: HashMap<String, BoneId>,
    names: Vec<String>,
}

impl BoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, assigning the next one if the name is new.
    ///
    /// Fails once [`MAX_BONES`] distinct names are registered.
    pub fn register(&mut self, name: &str) -> Result<BoneId, CompileError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        if self.names.len() == MAX_BONES {
            return Err(CompileError::BoneCapacityExceeded {
                name: name.to_string(),
            });
        }

        let id = self.names.len() as BoneId;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Ok(id)
    }

    /// Id of an already registered bone
    pub fn lookup(&self, name: &str) -> Result<BoneId, CompileError> {
        self.get(name)
            .ok_or_else(|| CompileError::UnknownBone(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<BoneId> {
        self.ids.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Name registered under `id`
    pub fn name(&self, id: BoneId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.names.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Animation name -> [`AnimationId`]
#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    ids: HashMap<String, AnimationId>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id to a new name. Returns `None` if the name was already
    /// registered (the first clip with a name wins).
    pub fn register_new(&mut self, name: &str) -> Option<AnimationId> {
        if self.ids.contains_key(name) {
            return None;
        }
        let id = self.ids.len() as AnimationId;
        self.ids.insert(name.to_string(), id);
        Some(id)
    }

    pub fn get(&self, name: &str) -> Option<AnimationId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
