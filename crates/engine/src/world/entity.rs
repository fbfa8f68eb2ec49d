use slotmap::{new_key_type, SlotMap};

use super::position::BlockPos;

new_key_type! {
    /// Opaque handle for a block entity. Chunks store it next to the voxel
    /// that hosts the entity; the entity's own state lives elsewhere.
    pub struct EntityId;
}

/// What the store knows about a block entity: where it is anchored and an
/// opaque kind code for whichever system owns its behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityAnchor {
    pub pos: BlockPos,
    pub kind: u16,
}

/// All block-entity anchors in the world.
pub struct EntityRegistry {
    anchors: SlotMap<EntityId, EntityAnchor>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            anchors: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, anchor: EntityAnchor) -> EntityId {
        self.anchors.insert(anchor)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<EntityAnchor> {
        self.anchors.remove(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityAnchor> {
        self.anchors.get(id)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
