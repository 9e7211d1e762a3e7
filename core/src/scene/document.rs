//! The scene document under edit.

use std::fmt;

use super::entity::{EntityData, EntityHandle, EntityStore, Position};
use super::layer::{Layer, LayerId};
use super::notify::{
    EventFilter, LayerChange, ListenerId, ListenerStatus, Listeners, SceneEvent,
};
use crate::abstract_editor::{EditActionError, EditActionResult, Editable};

/// Name of the layer every new document starts with.
pub const DEFAULT_LAYER_NAME: &str = "Background";

/// An ordered set of layers and the entities placed on them.
///
/// The public API is read-only. Mutation goes through crate-private methods
/// that the edit actions in [`super::actions`] call, so outside code changes
/// a document only by executing actions through an
/// [`EditActionHistory`](crate::abstract_editor::EditActionHistory).
///
/// Every mutator validates its input before touching anything and fires one
/// [`SceneEvent`] per change once the change is applied.
pub struct SceneDocument {
    /// Sorted by ascending order key.
    layers: Vec<Layer>,
    active: Option<LayerId>,
    entities: EntityStore,
    listeners: Listeners,
    next_layer_id: u32,
    next_order: i32,
}

impl Editable for SceneDocument {}

impl SceneDocument {
    /// Creates a document holding a single [`DEFAULT_LAYER_NAME`] layer.
    pub fn new() -> Self {
        SceneBuilder::new().build()
    }

    fn empty() -> Self {
        Self {
            layers: Vec::new(),
            active: None,
            entities: EntityStore::default(),
            listeners: Listeners::default(),
            next_layer_id: 0,
            next_order: 0,
        }
    }

    // ---------------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------------

    /// All layers, sorted by order key.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Returns `true` if a layer called `name` exists.
    pub fn layer_exists(&self, name: &str) -> bool {
        self.layer_by_name(name).is_some()
    }

    /// Position of the layer in [`layers`](Self::layers).
    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.layer(id))
    }

    fn resolve_layer(&self, id: LayerId) -> EditActionResult<&Layer> {
        self.layer(id)
            .ok_or_else(|| EditActionError::stale(format!("{id} no longer exists")))
    }

    fn resolve_layer_mut(&mut self, id: LayerId) -> EditActionResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or_else(|| EditActionError::stale(format!("{id} no longer exists")))
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Resolves a handle, failing with [`EditActionError::StaleReference`]
    /// if the entity is gone.
    pub fn entity(&self, handle: EntityHandle) -> EditActionResult<&EntityData> {
        self.entities
            .get(handle)
            .ok_or_else(|| EditActionError::stale(format!("{handle} no longer exists")))
    }

    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.get(handle).is_some()
    }

    /// All live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &EntityData)> {
        self.entities.iter()
    }

    pub fn entities_on_layer(&self, layer: LayerId) -> Vec<EntityHandle> {
        self.entities
            .iter()
            .filter(|(_, data)| data.layer == layer)
            .map(|(handle, _)| handle)
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the entity is alive and its layer is not locked.
    pub fn is_entity_editable(&self, handle: EntityHandle) -> bool {
        self.entities
            .get(handle)
            .and_then(|data| self.layer(data.layer))
            .is_some_and(|layer| !layer.locked)
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    /// Registers a listener for the events accepted by `filter`.
    pub fn add_listener(
        &mut self,
        filter: EventFilter,
        callback: impl FnMut(&SceneDocument, &SceneEvent) -> ListenerStatus + 'static,
    ) -> ListenerId {
        self.listeners.add(filter, Box::new(callback))
    }

    /// Unregisters a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self, event: SceneEvent) {
        if self.listeners.entries.is_empty() {
            return;
        }
        log::trace!("Dispatching {event:?}");

        let kind = event.kind();
        let mut entries = std::mem::take(&mut self.listeners.entries);
        let before = entries.len();
        let document = &*self;
        entries.retain_mut(|entry| {
            !entry.filter.matches(kind)
                || (entry.callback)(document, &event) == ListenerStatus::Keep
        });
        if entries.len() != before {
            log::debug!("{} listener(s) detached", before - entries.len());
        }
        self.listeners.entries = entries;
    }

    // ---------------------------------------------------------------------
    // Mutators used by actions
    // ---------------------------------------------------------------------

    /// Appends a new layer after all existing ones.
    pub(crate) fn add_layer(&mut self, name: &str) -> EditActionResult<LayerId> {
        if self.layer_exists(name) {
            return Err(EditActionError::illegal(format!(
                "a layer named \"{name}\" already exists"
            )));
        }

        let id = LayerId::new(self.next_layer_id);
        self.next_layer_id += 1;
        let order = self.next_order;
        self.next_order += 1;

        self.layers.push(Layer::new(id, name, order));
        self.notify(SceneEvent::LayerAdded(id));
        Ok(id)
    }

    /// Puts a previously removed layer back at the position its order key
    /// gives it.
    pub(crate) fn insert_layer(&mut self, layer: Layer) -> EditActionResult {
        if self.layer(layer.id).is_some() {
            return Err(EditActionError::illegal(format!("{} is already present", layer.id)));
        }
        if self.layers.iter().any(|other| other.order == layer.order) {
            return Err(EditActionError::illegal(format!(
                "order key {} is taken",
                layer.order
            )));
        }
        if self.layer_exists(&layer.name) {
            return Err(EditActionError::illegal(format!(
                "a layer named \"{}\" already exists",
                layer.name
            )));
        }

        let id = layer.id;
        self.next_layer_id = self.next_layer_id.max(id.index() + 1);
        self.next_order = self.next_order.max(layer.order + 1);
        let index = self.layers.partition_point(|other| other.order < layer.order);
        self.layers.insert(index, layer);
        self.notify(SceneEvent::LayerInserted(id));
        Ok(())
    }

    /// Removes an empty layer and returns it.
    ///
    /// The last remaining layer cannot be removed. If the active layer is
    /// removed the first remaining layer becomes active.
    pub(crate) fn remove_layer(&mut self, id: LayerId) -> EditActionResult<Layer> {
        let index = self
            .layer_index(id)
            .ok_or_else(|| EditActionError::stale(format!("{id} no longer exists")))?;
        if self.layers.len() == 1 {
            return Err(EditActionError::illegal("cannot remove the only layer"));
        }
        let remaining = self.entities.iter().filter(|(_, e)| e.layer == id).count();
        if remaining > 0 {
            return Err(EditActionError::illegal(format!(
                "{id} still holds {remaining} entities"
            )));
        }

        let layer = self.layers.remove(index);
        let was_active = self.active == Some(id);
        if was_active {
            self.active = self.layers.first().map(|l| l.id);
        }

        // Listeners must never see an active id that no longer resolves.
        self.notify(SceneEvent::LayerRemoved(id));
        if was_active {
            self.notify(SceneEvent::ActiveLayerChanged {
                previous: Some(id),
                current: self.active,
            });
        }
        Ok(layer)
    }

    /// Makes `id` the active layer and returns the previously active one.
    pub(crate) fn set_active_layer(&mut self, id: LayerId) -> EditActionResult<Option<LayerId>> {
        self.resolve_layer(id)?;
        let previous = self.active;
        if previous != Some(id) {
            self.active = Some(id);
            self.notify(SceneEvent::ActiveLayerChanged {
                previous,
                current: Some(id),
            });
        }
        Ok(previous)
    }

    /// Exchanges the order keys of two layers.
    ///
    /// Leaves the layer list unsorted until
    /// [`force_sort_layers`](Self::force_sort_layers) runs, so it fires no
    /// event of its own.
    pub(crate) fn swap_layer_order(&mut self, a: LayerId, b: LayerId) -> EditActionResult {
        let ia = self
            .layer_index(a)
            .ok_or_else(|| EditActionError::stale(format!("{a} no longer exists")))?;
        let ib = self
            .layer_index(b)
            .ok_or_else(|| EditActionError::stale(format!("{b} no longer exists")))?;

        let order_a = self.layers[ia].order;
        self.layers[ia].order = self.layers[ib].order;
        self.layers[ib].order = order_a;
        Ok(())
    }

    /// Re-sorts layers by order key and fires [`SceneEvent::LayersSorted`].
    pub(crate) fn force_sort_layers(&mut self) {
        self.layers.sort_by_key(|layer| layer.order);
        self.notify(SceneEvent::LayersSorted);
    }

    pub(crate) fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> EditActionResult {
        self.resolve_layer_mut(id)?.visible = visible;
        self.notify(SceneEvent::LayerDataChanged {
            layer: id,
            change: LayerChange::Visibility(visible),
        });
        Ok(())
    }

    pub(crate) fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> EditActionResult {
        self.resolve_layer_mut(id)?.locked = locked;
        self.notify(SceneEvent::LayerDataChanged {
            layer: id,
            change: LayerChange::Locked(locked),
        });
        Ok(())
    }

    /// Renames a layer and returns its old name.
    pub(crate) fn rename_layer(&mut self, id: LayerId, name: &str) -> EditActionResult<String> {
        if let Some(other) = self.layer_by_name(name)
            && other.id != id
        {
            return Err(EditActionError::illegal(format!(
                "a layer named \"{name}\" already exists"
            )));
        }

        let layer = self.resolve_layer_mut(id)?;
        let from = std::mem::replace(&mut layer.name, name.to_string());
        self.notify(SceneEvent::LayerDataChanged {
            layer: id,
            change: LayerChange::Renamed {
                from: from.clone(),
                to: name.to_string(),
            },
        });
        Ok(from)
    }

    /// Moves an entity and returns its previous position.
    pub(crate) fn set_entity_position(
        &mut self,
        handle: EntityHandle,
        position: Position,
    ) -> EditActionResult<Position> {
        let data = self
            .entities
            .get_mut(handle)
            .ok_or_else(|| EditActionError::stale(format!("{handle} no longer exists")))?;
        let previous = std::mem::replace(&mut data.position, position);
        self.notify(SceneEvent::EntityMoved(handle));
        Ok(previous)
    }

    /// Removes an entity, keeping its slot restorable.
    pub(crate) fn despawn_entity(&mut self, handle: EntityHandle) -> EditActionResult<EntityData> {
        let data = self
            .entities
            .despawn(handle)
            .ok_or_else(|| EditActionError::stale(format!("{handle} no longer exists")))?;
        self.notify(SceneEvent::EntityRemoved(handle));
        Ok(data)
    }

    /// Checks that [`restore_entity`](Self::restore_entity) would succeed.
    pub(crate) fn check_restore(&self, handle: EntityHandle, data: &EntityData) -> EditActionResult {
        if !self.entities.can_restore(handle) {
            return Err(EditActionError::stale(format!(
                "the slot of {handle} was reused"
            )));
        }
        if self.layer(data.layer).is_none() {
            return Err(EditActionError::illegal(format!(
                "cannot restore {handle}: {} does not exist",
                data.layer
            )));
        }
        Ok(())
    }

    /// Puts a despawned entity back into its old slot.
    pub(crate) fn restore_entity(&mut self, handle: EntityHandle, data: EntityData) -> EditActionResult {
        self.check_restore(handle, &data)?;
        self.entities.restore(handle, data);
        self.notify(SceneEvent::EntityRestored(handle));
        Ok(())
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SceneDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneDocument")
            .field("layers", &self.layers)
            .field("active", &self.active)
            .field("entities", &self.entities.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Builds the initial contents of a [`SceneDocument`].
///
/// Documents are mutated through actions once editing starts; the builder
/// covers what a loader would produce before any history exists. No events
/// are fired while building.
///
/// ```ignore
/// let mut builder = SceneBuilder::new();
/// let background = builder.add_layer("Background")?;
/// let tree = builder.spawn_entity("Tree", background, Position::new(4.0, 2.0))?;
/// let document = builder.build();
/// ```
#[derive(Debug)]
pub struct SceneBuilder {
    document: SceneDocument,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            document: SceneDocument::empty(),
        }
    }

    /// Appends a layer. Names must be unique.
    pub fn add_layer(&mut self, name: &str) -> EditActionResult<LayerId> {
        self.document.add_layer(name)
    }

    /// Places a new entity on `layer`.
    pub fn spawn_entity(
        &mut self,
        name: &str,
        layer: LayerId,
        position: Position,
    ) -> EditActionResult<EntityHandle> {
        self.document.resolve_layer(layer)?;
        Ok(self.document.entities.spawn(EntityData {
            name: name.to_string(),
            position,
            layer,
        }))
    }

    /// Finishes the document.
    ///
    /// A document without layers gets a [`DEFAULT_LAYER_NAME`] layer. The
    /// first layer becomes active.
    pub fn build(mut self) -> SceneDocument {
        if self.document.layers.is_empty() {
            let id = LayerId::new(self.document.next_layer_id);
            self.document.next_layer_id += 1;
            self.document.next_order += 1;
            self.document
                .layers
                .push(Layer::new(id, DEFAULT_LAYER_NAME, 0));
        }
        self.document.active = self.document.layers.first().map(|layer| layer.id);
        self.document
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
