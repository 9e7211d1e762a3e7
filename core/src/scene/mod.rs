//! A minimal 2D scene document and the actions that edit it.
//!
//! - [`SceneDocument`]: layers with stable ids and order keys, plus a
//!   generational entity store
//! - [`SceneBuilder`]: initial contents before editing starts
//! - [`SceneEvent`]: change notifications delivered to listeners
//! - [`actions`]: undoable edits executed through
//!   [`EditActionHistory`](crate::abstract_editor::EditActionHistory)

pub mod actions;
mod document;
mod entity;
mod layer;
mod notify;

pub use document::{DEFAULT_LAYER_NAME, SceneBuilder, SceneDocument};
pub use entity::{EntityData, EntityHandle, Position};
pub use layer::{Layer, LayerId};
pub use notify::{
    EventFilter, LayerChange, ListenerId, ListenerStatus, SceneEvent, SceneEventKind,
};
