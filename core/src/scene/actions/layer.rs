use std::fmt;

use crate::abstract_editor::{ActionGroup, EditAction, EditActionError, EditActionResult, MonoAction};
use crate::scene::{Layer, LayerId, SceneDocument};

use super::entity::EntitiesRemovedAction;

/// Appends a layer and makes it active.
///
/// Undo removes the layer and reactivates the previously active one. Redo
/// re-inserts the very same layer, so later history entries that refer to
/// its [`LayerId`] stay valid.
#[derive(Debug)]
pub struct LayerAddedAction {
    name: String,
    layer: Option<LayerId>,
    /// The removed layer, kept between undo and redo.
    saved: Option<Layer>,
    previous_active: Option<LayerId>,
}

impl LayerAddedAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer: None,
            saved: None,
            previous_active: None,
        }
    }

    /// The created layer, once applied.
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }
}

impl EditAction<SceneDocument> for LayerAddedAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        let previous_active = document.active_layer_id();
        let id = match &self.saved {
            Some(layer) => {
                document.insert_layer(layer.clone())?;
                layer.id()
            }
            None => document.add_layer(&self.name)?,
        };
        document.set_active_layer(id)?;

        self.layer = Some(id);
        self.saved = None;
        self.previous_active = previous_active;
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        let id = self
            .layer
            .ok_or_else(|| EditActionError::illegal("layer was never added"))?;
        let layer = document.remove_layer(id)?;
        self.saved = Some(layer);

        if let Some(previous) = self.previous_active
            && document.layer(previous).is_some()
        {
            document.set_active_layer(previous)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Add Layer"
    }
}

/// Removes an empty layer.
///
/// Undo puts it back at its old position and makes it active again.
#[derive(Debug)]
pub struct LayerRemovedAction {
    layer: LayerId,
    saved: Option<Layer>,
}

impl LayerRemovedAction {
    pub fn new(layer: LayerId) -> Self {
        Self { layer, saved: None }
    }
}

impl EditAction<SceneDocument> for LayerRemovedAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        self.saved = Some(document.remove_layer(self.layer)?);
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        let layer = self
            .saved
            .clone()
            .ok_or_else(|| EditActionError::illegal("layer was never removed"))?;
        document.insert_layer(layer)?;
        self.saved = None;
        document.set_active_layer(self.layer)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Remove Layer"
    }
}

/// Builds the "Delete Layer" group: every entity on the layer is removed,
/// then the layer itself.
///
/// Undo runs in reverse, restoring the layer before its entities.
pub fn delete_layer_action(
    document: &SceneDocument,
    layer: LayerId,
) -> EditActionResult<ActionGroup<SceneDocument>> {
    if document.layer(layer).is_none() {
        return Err(EditActionError::stale(format!("{layer} no longer exists")));
    }
    if document.layer_count() == 1 {
        return Err(EditActionError::illegal("cannot remove the only layer"));
    }

    let mut group = ActionGroup::new("Delete Layer");
    let entities = EntitiesRemovedAction::for_layer(document, layer)?;
    if !entities.entities().is_empty() {
        group.add(Box::new(entities))?;
    }
    group.add(Box::new(LayerRemovedAction::new(layer)))?;
    group.finalize();
    Ok(group)
}

/// Direction for [`LayerMovedAction`], relative to the layer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards index 0.
    Up,
    Down,
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// Swaps a layer with its neighbour.
///
/// Swapping the order keys twice restores them, so the same step serves as
/// apply and undo. The layer that was active at construction is reselected
/// after every swap.
#[derive(Debug)]
pub struct LayerMovedAction {
    layer: LayerId,
    neighbour: LayerId,
    direction: MoveDirection,
    current: Option<LayerId>,
}

impl LayerMovedAction {
    /// Moves the active layer.
    pub fn new(document: &SceneDocument, direction: MoveDirection) -> EditActionResult<Self> {
        let layer = document
            .active_layer_id()
            .ok_or_else(|| EditActionError::illegal("no active layer"))?;
        Self::for_layer(document, layer, direction)
    }

    /// Moves `layer`, failing if it has no neighbour in `direction`.
    pub fn for_layer(
        document: &SceneDocument,
        layer: LayerId,
        direction: MoveDirection,
    ) -> EditActionResult<Self> {
        let index = document
            .layer_index(layer)
            .ok_or_else(|| EditActionError::stale(format!("{layer} no longer exists")))?;
        let neighbour = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1),
        }
        .and_then(|i| document.layers().get(i))
        .ok_or_else(|| {
            EditActionError::illegal(format!("{layer} cannot move {direction}"))
        })?;

        Ok(Self {
            layer,
            neighbour: neighbour.id(),
            direction,
            current: document.active_layer_id(),
        })
    }

    pub fn direction(&self) -> MoveDirection {
        self.direction
    }
}

impl MonoAction for LayerMovedAction {
    type Target = SceneDocument;

    fn do_action(&mut self, document: &mut SceneDocument) -> EditActionResult {
        document.swap_layer_order(self.layer, self.neighbour)?;
        document.force_sort_layers();
        if let Some(current) = self.current {
            document.set_active_layer(current)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Move Layer"
    }
}

/// Shows or hides a layer.
#[derive(Debug)]
pub struct ToggleLayerVisibilityAction {
    layer: LayerId,
}

impl ToggleLayerVisibilityAction {
    pub fn new(layer: LayerId) -> Self {
        Self { layer }
    }
}

impl MonoAction for ToggleLayerVisibilityAction {
    type Target = SceneDocument;

    fn do_action(&mut self, document: &mut SceneDocument) -> EditActionResult {
        let visible = document
            .layer(self.layer)
            .ok_or_else(|| EditActionError::stale(format!("{} no longer exists", self.layer)))?
            .is_visible();
        document.set_layer_visible(self.layer, !visible)
    }

    fn name(&self) -> &str {
        "Hide/Show Layer"
    }
}

/// Locks or unlocks a layer.
#[derive(Debug)]
pub struct ToggleLayerLockAction {
    layer: LayerId,
}

impl ToggleLayerLockAction {
    pub fn new(layer: LayerId) -> Self {
        Self { layer }
    }
}

impl MonoAction for ToggleLayerLockAction {
    type Target = SceneDocument;

    fn do_action(&mut self, document: &mut SceneDocument) -> EditActionResult {
        let locked = document
            .layer(self.layer)
            .ok_or_else(|| EditActionError::stale(format!("{} no longer exists", self.layer)))?
            .is_locked();
        document.set_layer_locked(self.layer, !locked)
    }

    fn name(&self) -> &str {
        "Lock/Unlock Layer"
    }
}

#[derive(Debug)]
pub struct RenameLayerAction {
    layer: LayerId,
    from: String,
    to: String,
}

impl RenameLayerAction {
    pub fn new(document: &SceneDocument, layer: LayerId, to: impl Into<String>) -> EditActionResult<Self> {
        let from = document
            .layer(layer)
            .ok_or_else(|| EditActionError::stale(format!("{layer} no longer exists")))?
            .name()
            .to_string();
        Ok(Self {
            layer,
            from,
            to: to.into(),
        })
    }
}

impl EditAction<SceneDocument> for RenameLayerAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        document.rename_layer(self.layer, &self.to)?;
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        document.rename_layer(self.layer, &self.from)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Rename Layer"
    }
}

/// Changes the active layer. Not recorded in history.
#[derive(Debug)]
pub struct SelectLayerAction {
    layer: LayerId,
    previous: Option<LayerId>,
}

impl SelectLayerAction {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            previous: None,
        }
    }
}

impl EditAction<SceneDocument> for SelectLayerAction {
    fn apply(&mut self, document: &mut SceneDocument) -> EditActionResult {
        self.previous = document.set_active_layer(self.layer)?;
        Ok(())
    }

    fn undo(&mut self, document: &mut SceneDocument) -> EditActionResult {
        if let Some(previous) = self.previous {
            document.set_active_layer(previous)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Select Layer"
    }

    fn is_recorded(&self) -> bool {
        false
    }

    fn modifies_content(&self) -> bool {
        false
    }
}
