//! Change notifications emitted by [`SceneDocument`](super::SceneDocument).
//!
//! Every structural mutation of the document fires exactly one
//! [`SceneEvent`] after the change has been applied. Listeners are called
//! synchronously, in registration order, on the mutating thread.
//!
//! Listeners see the document through a shared reference only, so they can
//! read it but cannot mutate it or register further listeners while an event
//! is being dispatched. Views that want to react with an edit push an action
//! into an [`ActionQueue`](crate::abstract_editor::ActionQueue) instead.

use std::fmt;

use super::document::SceneDocument;
use super::entity::EntityHandle;
use super::layer::LayerId;

/// What changed on a layer in [`SceneEvent::LayerDataChanged`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayerChange {
    Visibility(bool),
    Locked(bool),
    Renamed { from: String, to: String },
}

/// A document change, with the data a view needs to refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A new layer was appended.
    LayerAdded(LayerId),
    /// A previously removed layer was put back at its old position.
    LayerInserted(LayerId),
    LayerRemoved(LayerId),
    /// Layer order keys changed.
    LayersSorted,
    ActiveLayerChanged {
        previous: Option<LayerId>,
        current: Option<LayerId>,
    },
    LayerDataChanged {
        layer: LayerId,
        change: LayerChange,
    },
    EntityMoved(EntityHandle),
    EntityRemoved(EntityHandle),
    EntityRestored(EntityHandle),
}

impl SceneEvent {
    /// The payload-free tag of this event.
    pub fn kind(&self) -> SceneEventKind {
        match self {
            Self::LayerAdded(_) => SceneEventKind::LayerAdded,
            Self::LayerInserted(_) => SceneEventKind::LayerInserted,
            Self::LayerRemoved(_) => SceneEventKind::LayerRemoved,
            Self::LayersSorted => SceneEventKind::LayersSorted,
            Self::ActiveLayerChanged { .. } => SceneEventKind::ActiveLayerChanged,
            Self::LayerDataChanged { .. } => SceneEventKind::LayerDataChanged,
            Self::EntityMoved(_) => SceneEventKind::EntityMoved,
            Self::EntityRemoved(_) => SceneEventKind::EntityRemoved,
            Self::EntityRestored(_) => SceneEventKind::EntityRestored,
        }
    }
}

/// Tag of a [`SceneEvent`], used for topic filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEventKind {
    LayerAdded,
    LayerInserted,
    LayerRemoved,
    LayersSorted,
    ActiveLayerChanged,
    LayerDataChanged,
    EntityMoved,
    EntityRemoved,
    EntityRestored,
}

impl SceneEventKind {
    /// Kinds that describe changes to the layer list or a layer's data.
    pub const LAYER_KINDS: [SceneEventKind; 6] = [
        Self::LayerAdded,
        Self::LayerInserted,
        Self::LayerRemoved,
        Self::LayersSorted,
        Self::ActiveLayerChanged,
        Self::LayerDataChanged,
    ];

    /// Kinds that describe changes to entities.
    pub const ENTITY_KINDS: [SceneEventKind; 3] =
        [Self::EntityMoved, Self::EntityRemoved, Self::EntityRestored];
}

/// Topic filter chosen at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// Deliver every event.
    #[default]
    All,
    /// Deliver only events of the listed kinds.
    Only(Vec<SceneEventKind>),
}

impl EventFilter {
    pub fn only(kinds: impl IntoIterator<Item = SceneEventKind>) -> Self {
        Self::Only(kinds.into_iter().collect())
    }

    /// Filter for layer list and layer data events.
    pub fn layers() -> Self {
        Self::only(SceneEventKind::LAYER_KINDS)
    }

    /// Filter for entity events.
    pub fn entities() -> Self {
        Self::only(SceneEventKind::ENTITY_KINDS)
    }

    pub fn matches(&self, kind: SceneEventKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(kinds) => kinds.contains(&kind),
        }
    }
}

/// Identifies a registered listener for [`SceneDocument::remove_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Returned by a listener to stay registered or to be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Keep,
    /// Remove this listener once the current dispatch is over.
    Detach,
}

pub(crate) type ListenerFn = Box<dyn FnMut(&SceneDocument, &SceneEvent) -> ListenerStatus>;

pub(crate) struct ListenerEntry {
    pub id: ListenerId,
    pub filter: EventFilter,
    pub callback: ListenerFn,
}

/// The document's listener set.
#[derive(Default)]
pub(crate) struct Listeners {
    /// Taken out of the document while an event is dispatched.
    pub entries: Vec<ListenerEntry>,
    next_id: u64,
}

impl Listeners {
    pub fn add(&mut self, filter: EventFilter, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            id,
            filter,
            callback,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
