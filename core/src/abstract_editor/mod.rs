//! Abstract editor framework for reversible editing operations.
//!
//! This module provides the foundational traits and types for building
//! an undo/redo-capable editor. It knows nothing about scenes or layers;
//! [`crate::scene`] implements the concrete document and its actions.
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`EditAction`]: an edit operation (Command pattern)
//! - [`MonoAction`]: an edit whose apply and undo are one self-inverse step
//! - [`ActionGroup`]: a sealed sequence of actions forming one undo step
//! - [`EditActionHistory`]: undo/redo stack managing action sequences
//! - [`ActionQueue`]: deferred submission from views holding `&self`
//!
//! # Recorded vs non-recorded actions
//!
//! By default, actions are **recorded** in the undo/redo history. Override
//! [`EditAction::is_recorded`] to return `false` for transient operations
//! like changing the active layer that should not be undoable.
//!
//! Recorded actions can return `false` from [`EditAction::modifies_content`]
//! to indicate they represent UI state rather than document edits. They are
//! undoable but [`EditActionHistory::has_unsaved_changes`] ignores them.

mod action;
mod action_queue;
mod group;
mod history;

pub use action::{
    AsAny, EditAction, EditActionError, EditActionResult, Editable, HistoryDirection, MonoAction,
};
pub use action_queue::ActionQueue;
pub use group::ActionGroup;
pub use history::{DEFAULT_MAX_UNDO, EditActionHistory};
