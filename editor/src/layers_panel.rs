//! Headless view model of the layers dialog.
//!
//! The panel mirrors the document's layer list into rows, keeps track of
//! which buttons are enabled and turns user requests into actions. Requests
//! never touch the document: they are pushed to the shared
//! [`ActionQueue`] and executed by the editor through the history.
//!
//! The panel's state is shared with a document listener through a `Weak`
//! reference, so dropping the panel detaches the listener on the next event.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use vellum_core::abstract_editor::{ActionQueue, EditActionError};
use vellum_core::scene::actions::{
    LayerAddedAction, LayerMovedAction, MoveDirection, MoveEntityAction, RenameLayerAction,
    SelectLayerAction, ToggleLayerLockAction, ToggleLayerVisibilityAction, delete_layer_action,
};
use vellum_core::scene::{
    EntityHandle, EventFilter, LayerChange, LayerId, ListenerId, ListenerStatus, Position,
    SceneDocument, SceneEvent, SceneEventKind,
};

/// One line of the layer list.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub active: bool,
}

/// Requests the panel refuses before building an action.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("a layer named \"{0}\" already exists")]
    DuplicateName(String),
    #[error("layer name must not be empty")]
    EmptyName,
    #[error("no entity selected")]
    NoSelection,
    #[error(transparent)]
    Action(#[from] EditActionError),
}

#[derive(Debug, Default)]
struct PanelState {
    rows: Vec<LayerRow>,
    selected_entity: Option<EntityHandle>,
    needs_redraw: bool,
}

impl PanelState {
    fn refresh(&mut self, document: &SceneDocument) {
        let active = document.active_layer_id();
        self.rows = document
            .layers()
            .iter()
            .map(|layer| LayerRow {
                id: layer.id(),
                name: layer.name().to_string(),
                visible: layer.is_visible(),
                locked: layer.is_locked(),
                active: Some(layer.id()) == active,
            })
            .collect();
        self.needs_redraw = true;
    }

    fn on_event(&mut self, document: &SceneDocument, event: &SceneEvent) {
        match event {
            SceneEvent::EntityRemoved(entity) => {
                if self.selected_entity == Some(*entity) {
                    self.selected_entity = None;
                }
                return;
            }
            SceneEvent::LayerDataChanged {
                layer,
                change: LayerChange::Locked(true),
            } => {
                let on_layer = self
                    .selected_entity
                    .and_then(|e| document.entity(e).ok())
                    .is_some_and(|data| data.layer == *layer);
                if on_layer {
                    log::debug!("Clearing selection on locked {layer}");
                    self.selected_entity = None;
                }
            }
            _ => {}
        }
        self.refresh(document);
    }

    fn active_index(&self) -> Option<usize> {
        self.rows.iter().position(|row| row.active)
    }
}

/// View model of the layers dialog.
#[derive(Debug)]
pub struct LayersPanel {
    state: Arc<Mutex<PanelState>>,
    queue: Arc<ActionQueue<SceneDocument>>,
    listener: ListenerId,
}

impl LayersPanel {
    /// Builds the rows from `document` and subscribes to its layer events.
    pub fn attach(document: &mut SceneDocument, queue: Arc<ActionQueue<SceneDocument>>) -> Self {
        let mut state = PanelState::default();
        state.refresh(document);
        let state = Arc::new(Mutex::new(state));

        let weak: Weak<Mutex<PanelState>> = Arc::downgrade(&state);
        let filter = EventFilter::only(
            SceneEventKind::LAYER_KINDS
                .into_iter()
                .chain([SceneEventKind::EntityRemoved]),
        );
        let listener = document.add_listener(filter, move |document, event| {
            let Some(state) = weak.upgrade() else {
                return ListenerStatus::Detach;
            };
            state.lock().on_event(document, event);
            ListenerStatus::Keep
        });

        Self {
            state,
            queue,
            listener,
        }
    }

    /// Unsubscribes from `document` right away instead of on the next event.
    pub fn detach(self, document: &mut SceneDocument) {
        document.remove_listener(self.listener);
    }

    pub fn rows(&self) -> Vec<LayerRow> {
        self.state.lock().rows.clone()
    }

    /// Returns `true` once after the rows changed.
    pub fn take_redraw(&self) -> bool {
        std::mem::take(&mut self.state.lock().needs_redraw)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.lock().active_index()
    }

    pub fn can_move_up(&self) -> bool {
        self.active_index().is_some_and(|index| index > 0)
    }

    pub fn can_move_down(&self) -> bool {
        let state = self.state.lock();
        state
            .active_index()
            .is_some_and(|index| index + 1 < state.rows.len())
    }

    pub fn can_remove(&self) -> bool {
        let state = self.state.lock();
        state.rows.len() > 1 && state.active_index().is_some()
    }

    pub fn selected_entity(&self) -> Option<EntityHandle> {
        self.state.lock().selected_entity
    }

    pub fn request_add(&self, document: &SceneDocument, name: &str) -> Result<(), PanelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PanelError::EmptyName);
        }
        if document.layer_exists(name) {
            return Err(PanelError::DuplicateName(name.to_string()));
        }
        self.queue.push(Box::new(LayerAddedAction::new(name)));
        Ok(())
    }

    /// Deletes the active layer together with its entities.
    pub fn request_remove(&self, document: &SceneDocument) -> Result<(), PanelError> {
        let layer = document
            .active_layer_id()
            .ok_or_else(|| EditActionError::illegal("no active layer"))?;
        self.queue
            .push(Box::new(delete_layer_action(document, layer)?));
        Ok(())
    }

    /// Moves the active layer one step.
    pub fn request_move(
        &self,
        document: &SceneDocument,
        direction: MoveDirection,
    ) -> Result<(), PanelError> {
        let action = LayerMovedAction::new(document, direction)?;
        self.queue.push(Box::new(action));
        Ok(())
    }

    pub fn request_rename(
        &self,
        document: &SceneDocument,
        layer: LayerId,
        name: &str,
    ) -> Result<(), PanelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PanelError::EmptyName);
        }
        if let Some(other) = document.layer_by_name(name)
            && other.id() != layer
        {
            return Err(PanelError::DuplicateName(name.to_string()));
        }
        let action = RenameLayerAction::new(document, layer, name)?;
        self.queue.push(Box::new(action));
        Ok(())
    }

    pub fn toggle_visibility(&self, layer: LayerId) {
        self.queue
            .push(Box::new(ToggleLayerVisibilityAction::new(layer)));
    }

    pub fn toggle_lock(&self, layer: LayerId) {
        self.queue.push(Box::new(ToggleLayerLockAction::new(layer)));
    }

    /// Makes `layer` active.
    pub fn select(&self, layer: LayerId) {
        self.queue.push(Box::new(SelectLayerAction::new(layer)));
    }

    /// Selects an entity for direct manipulation.
    ///
    /// Entities on locked layers cannot be selected.
    pub fn select_entity(
        &self,
        document: &SceneDocument,
        entity: EntityHandle,
    ) -> Result<(), PanelError> {
        document.entity(entity)?;
        if !document.is_entity_editable(entity) {
            return Err(EditActionError::illegal(format!("{entity} is on a locked layer")).into());
        }
        self.state.lock().selected_entity = Some(entity);
        Ok(())
    }

    /// Moves the selected entity.
    pub fn request_move_entity(
        &self,
        document: &SceneDocument,
        to: Position,
    ) -> Result<(), PanelError> {
        let entity = self.selected_entity().ok_or(PanelError::NoSelection)?;
        let action = MoveEntityAction::new(document, entity, to)?;
        self.queue.push(Box::new(action));
        Ok(())
    }
}
