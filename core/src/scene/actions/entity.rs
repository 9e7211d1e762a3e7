use std::collections::HashSet;

use crate::abstract_editor::{EditAction, EditActionError, EditActionResult};
use crate::scene::{EntityData, EntityHandle, LayerId, Position, SceneDocument};

/// Moves one entity. Consecutive moves of the same entity merge, so a drag
/// becomes a single undo step.
#[derive(Debug, Clone)]
pub struct MoveEntityAction {
    entity: EntityHandle,
    from: Position,
    to: Position,
}

impl MoveEntityAction {
    /// Captures the entity's current position as the undo state.
    ///
    /// Fails if the entity is gone, or if its layer is locked.
    pub fn new(document: &SceneDocument, entity: EntityHandle, to: Position) -> EditActionResult<Self> {
        let from = document.entity(entity)?.position;
        if !document.is_entity_editable(entity) {
            return Err(EditActionError::illegal(format!(
                "{entity} is on a locked layer"
            )));
        }
        Ok(Self { entity, from, to })
    }

    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    pub fn from(&self) -> Position {
        self.from
    }

    pub fn to(&self) -> Position {
        self.to
    }
}

impl EditAction<SceneDocument> for MoveEntityAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        document.set_entity_position(self.entity, self.to)?;
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        document.set_entity_position(self.entity, self.from)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Entity Move"
    }

    fn merge(
        &mut self,
        other: Box<dyn EditAction<SceneDocument>>,
    ) -> Option<Box<dyn EditAction<SceneDocument>>> {
        if let Some(next) = other.as_any().downcast_ref::<Self>()
            && next.entity == self.entity
        {
            self.to = next.to;
            return None;
        }
        Some(other)
    }
}

/// Removes a set of entities, keeping snapshots so undo can put them back
/// into their original slots.
#[derive(Debug)]
pub struct EntitiesRemovedAction {
    entities: Vec<EntityHandle>,
    removed: Vec<(EntityHandle, EntityData)>,
    description: String,
}

impl EntitiesRemovedAction {
    /// Repeated handles are removed once.
    pub fn new(mut entities: Vec<EntityHandle>) -> Self {
        let mut seen = HashSet::with_capacity(entities.len());
        entities.retain(|entity| seen.insert(*entity));
        let description = if entities.len() == 1 {
            "Remove Entity".to_string()
        } else {
            "Remove Entities".to_string()
        };
        Self {
            entities,
            removed: Vec::new(),
            description,
        }
    }

    /// Removes every entity currently on `layer`.
    pub fn for_layer(document: &SceneDocument, layer: LayerId) -> EditActionResult<Self> {
        if document.layer(layer).is_none() {
            return Err(EditActionError::stale(format!("{layer} no longer exists")));
        }
        Ok(Self::new(document.entities_on_layer(layer)))
    }

    pub fn entities(&self) -> &[EntityHandle] {
        &self.entities
    }
}

impl EditAction<SceneDocument> for EntitiesRemovedAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        for &entity in &self.entities {
            document.entity(entity)?;
        }

        self.removed.clear();
        for &entity in &self.entities {
            let data = document.despawn_entity(entity)?;
            self.removed.push((entity, data));
        }
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        for (entity, data) in &self.removed {
            document.check_restore(*entity, data)?;
        }

        for (entity, data) in self.removed.drain(..) {
            document.restore_entity(entity, data)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
