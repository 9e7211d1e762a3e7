//! Generational entity storage.
//!
//! The document hands out [`EntityHandle`]s instead of references. A handle
//! stays valid while its slot holds the same generation: despawning keeps the
//! generation so the entity can be restored into the same slot, while reusing
//! the slot for a new entity bumps it and turns every old handle stale.

use std::fmt;

use super::layer::LayerId;

/// Handle to an entity in a [`SceneDocument`](super::SceneDocument).
///
/// Two handles are equal if they point at the same slot and generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    /// Slot index of this handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 2D position in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The entity attributes the editing core cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    /// Display name.
    pub name: String,
    pub position: Position,
    /// Layer the entity belongs to.
    pub layer: LayerId,
}

struct Slot {
    generation: u32,
    data: Option<EntityData>,
}

/// Slot storage backing the document's entities.
#[derive(Default)]
pub(crate) struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EntityStore {
    pub fn spawn(&mut self, data: EntityData) -> EntityHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.data = Some(data);
            return EntityHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        EntityHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&EntityData> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityData> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    pub fn despawn(&mut self, handle: EntityHandle) -> Option<EntityData> {
        let data = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .data
            .take()?;
        self.free.push(handle.index);
        self.live -= 1;
        Some(data)
    }

    /// Returns `true` if `handle`'s slot is empty and was not reused since.
    pub fn can_restore(&self, handle: EntityHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.data.is_none())
    }

    /// Puts `data` back into the slot `handle` was issued for.
    pub fn restore(&mut self, handle: EntityHandle, data: EntityData) -> bool {
        if !self.can_restore(handle) {
            return false;
        }
        self.free.retain(|&index| index != handle.index);
        self.slots[handle.index as usize].data = Some(data);
        self.live += 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &EntityData)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.data.as_ref().map(|data| {
                (
                    EntityHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    data,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.live
    }
}
