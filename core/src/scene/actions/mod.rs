//! Undoable edits of a [`SceneDocument`](super::SceneDocument).
//!
//! Dual-state actions keep before/after snapshots of what they touch
//! ([`MoveEntityAction`], [`RenameLayerAction`]). Mono-state actions flip or
//! swap something and implement [`MonoAction`](crate::abstract_editor::MonoAction)
//! ([`LayerMovedAction`], [`ToggleLayerVisibilityAction`],
//! [`ToggleLayerLockAction`]).

mod entity;
mod layer;

pub use entity::{EntitiesRemovedAction, MoveEntityAction};
pub use layer::{
    LayerAddedAction, LayerMovedAction, LayerRemovedAction, MoveDirection, RenameLayerAction,
    SelectLayerAction, ToggleLayerLockAction, ToggleLayerVisibilityAction, delete_layer_action,
};
