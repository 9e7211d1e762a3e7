//! Editable targets and reversible editor actions.
//!
//! This module defines the core abstractions for an undo/redo editor system:
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`EditAction`]: a reversible edit operation (Command pattern)
//! - [`MonoAction`]: an edit whose forward and backward steps are the same
//!   self-inverse operation
//! - [`EditActionError`] / [`EditActionResult`]: error handling for actions
//!
//! EditActions are self-contained: each implementation internally stores whatever
//! data it needs (target handles, before/after snapshots, etc.).

use std::any::Any;
use std::fmt;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Used by
/// [`EditAction::merge`] to downcast `&dyn EditAction<T>` to the
/// concrete action type for merging.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker trait for types that serve as editing targets.
///
/// Implement this on any type that actions can operate on, such as a scene
/// document, a palette, a tile map, etc.
pub trait Editable: 'static {}

/// Which history stack an operation was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditActionError {
    /// A handle held by the action no longer resolves to a live target.
    #[error("stale reference: {0}")]
    StaleReference(String),
    /// The target is in a state that does not allow this operation.
    #[error("illegal state: {0}")]
    IllegalState(String),
    /// Undo or redo was requested with nothing on the corresponding stack.
    #[error("nothing to {0}")]
    EmptyHistory(HistoryDirection),
    /// A child of an action group failed; the children that already ran
    /// were reverted, so the target is as it was before the group ran.
    #[error("group step {index} failed and was rolled back: {source}")]
    GroupAborted {
        index: usize,
        source: Box<EditActionError>,
    },
    /// A child of an action group failed and reverting the earlier children
    /// failed too. The target is left partially modified.
    #[error("group step {index} failed, target left partially modified: {source}")]
    GroupPartiallyApplied {
        index: usize,
        source: Box<EditActionError>,
    },
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

impl EditActionError {
    /// Shorthand for [`EditActionError::StaleReference`].
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::StaleReference(msg.into())
    }

    /// Shorthand for [`EditActionError::IllegalState`].
    pub fn illegal(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }
}

/// Result type for action operations.
pub type EditActionResult<T = ()> = Result<T, EditActionError>;

/// A reversible editor action (Command pattern).
///
/// EditActions encapsulate a single logical edit and capture enough state to
/// undo the change and redo it. Each implementation stores its own data
/// internally; there is no prescribed property system.
///
/// # Stale targets
///
/// Targets are referenced by handle, never owned. Implementations must
/// re-resolve every handle at the start of [`apply`](Self::apply) and
/// [`undo`](Self::undo) and fail with [`EditActionError::StaleReference`]
/// *before* touching the target if any of them is gone.
///
/// # Merging
///
/// Actions that represent incremental changes (e.g. each mouse move during
/// a drag) can override [`merge`](Self::merge) so that consecutive actions
/// coalesce into one undo step. Use [`AsAny::as_any`] on the `other`
/// action to downcast it to the concrete type.
///
/// # Object Safety
///
/// This trait is dyn-compatible so that different action types can be stored
/// in a single [`EditActionHistory`](super::EditActionHistory) undo/redo stack as
/// `Box<dyn EditAction<T>>`.
pub trait EditAction<T: Editable>: fmt::Debug + AsAny + Send {
    /// Applies the action to the target (forward / redo direction).
    fn apply(&mut self, target: &mut T) -> EditActionResult;

    /// Reverses the action (undo direction).
    ///
    /// Must restore the target to the state before [`apply`](Self::apply)
    /// was called, for every field the action touched.
    fn undo(&mut self, target: &mut T) -> EditActionResult;

    /// A short, human-readable description for display in the edit menu.
    ///
    /// Examples: `"Entity Move"`, `"Add Layer"`, `"Delete Layer"`.
    fn description(&self) -> &str;

    /// Tries to merge `other` into `self`, taking ownership.
    ///
    /// If the actions are compatible (e.g. consecutive drags on the same
    /// entity), `self` absorbs `other`'s effect and returns `None`
    /// (the other action is consumed). Otherwise returns `Some(other)`
    /// back to the caller.
    ///
    /// Returns `Some(other)` by default (no merging).
    fn merge(&mut self, other: Box<dyn EditAction<T>>) -> Option<Box<dyn EditAction<T>>> {
        Some(other)
    }

    /// Whether this action is recorded in the undo/redo history.
    ///
    /// Return `false` for transient operations that should not be undoable,
    /// such as changing which layer is active.
    ///
    /// Default: `true`.
    fn is_recorded(&self) -> bool {
        true
    }

    /// Whether executing this action prevents the next recorded action
    /// from merging with the previous undo entry.
    ///
    /// Only meaningful for non-recorded actions (`is_recorded() == false`).
    ///
    /// Default: `false`.
    fn breaks_merge(&self) -> bool {
        false
    }

    /// Whether this action changes document content.
    ///
    /// Recorded actions that only touch UI state return `false`; they stay
    /// undoable but do not count towards unsaved changes.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }
}

/// An action whose forward and backward steps are one and the same.
///
/// [`do_action`](Self::do_action) must be self-inverse: running it twice
/// returns the target to its original state (a swap, a boolean flip).
/// Every `MonoAction` is an [`EditAction`] whose `apply` and `undo` both
/// call `do_action`.
///
/// The edited type is an associated type rather than a parameter, so the
/// blanket [`EditAction`] impl cannot overlap with generic actions such as
/// [`ActionGroup`](super::ActionGroup).
///
/// ```ignore
/// #[derive(Debug)]
/// struct ToggleGrid;
///
/// impl MonoAction for ToggleGrid {
///     type Target = Canvas;
///
///     fn do_action(&mut self, canvas: &mut Canvas) -> EditActionResult {
///         canvas.grid = !canvas.grid;
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "Toggle Grid"
///     }
/// }
/// ```
pub trait MonoAction: fmt::Debug + Send + 'static {
    /// The type this action edits.
    type Target: Editable;

    /// Runs the self-inverse operation.
    fn do_action(&mut self, target: &mut Self::Target) -> EditActionResult;

    /// The label reported as [`EditAction::description`].
    fn name(&self) -> &str;
}

impl<A: MonoAction> EditAction<A::Target> for A {
    fn apply(&mut self, target: &mut A::Target) -> EditActionResult {
        self.do_action(target)
    }

    fn undo(&mut self, target: &mut A::Target) -> EditActionResult {
        self.do_action(target)
    }

    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
        flag: bool,
    }

    impl Editable for Counter {}

    #[derive(Debug)]
    struct Add {
        amount: i32,
    }

    impl EditAction<Counter> for Add {
        fn apply(&mut self, target: &mut Counter) -> EditActionResult {
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Counter) -> EditActionResult {
            target.value -= self.amount;
            Ok(())
        }

        fn description(&self) -> &str {
            "Add"
        }
    }

    #[derive(Debug)]
    struct Flip;

    impl MonoAction for Flip {
        type Target = Counter;

        fn do_action(&mut self, target: &mut Counter) -> EditActionResult {
            target.flag = !target.flag;
            Ok(())
        }

        fn name(&self) -> &str {
            "Flip"
        }
    }

    fn counter() -> Counter {
        Counter {
            value: 0,
            flag: false,
        }
    }

    #[test]
    fn apply_modifies_target() {
        let mut counter = counter();
        let mut action = Add { amount: 5 };
        action.apply(&mut counter).unwrap();
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn undo_reverses_apply() {
        let mut counter = counter();
        let mut action = Add { amount: 5 };
        action.apply(&mut counter).unwrap();
        action.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
    }

    #[test]
    fn action_error_display() {
        assert_eq!(
            EditActionError::stale("entity 42").to_string(),
            "stale reference: entity 42"
        );
        assert_eq!(
            EditActionError::illegal("group is finalized").to_string(),
            "illegal state: group is finalized"
        );
        assert_eq!(
            EditActionError::EmptyHistory(HistoryDirection::Redo).to_string(),
            "nothing to redo"
        );
        assert_eq!(
            EditActionError::GroupAborted {
                index: 2,
                source: Box::new(EditActionError::stale("layer 7")),
            }
            .to_string(),
            "group step 2 failed and was rolled back: stale reference: layer 7"
        );
        assert_eq!(
            EditActionError::Custom("something went wrong".into()).to_string(),
            "something went wrong"
        );
    }

    #[test]
    fn action_is_dyn_compatible() {
        let mut counter = counter();
        let mut boxed: Box<dyn EditAction<Counter>> = Box::new(Add { amount: 3 });
        boxed.apply(&mut counter).unwrap();
        assert_eq!(counter.value, 3);
        boxed.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
    }

    #[test]
    fn default_flags() {
        let action = Add { amount: 1 };
        assert!(action.is_recorded());
        assert!(!action.breaks_merge());
        assert!(action.modifies_content());
    }

    #[test]
    fn mono_action_apply_and_undo_share_the_operation() {
        let mut counter = counter();
        let mut boxed: Box<dyn EditAction<Counter>> = Box::new(Flip);
        boxed.apply(&mut counter).unwrap();
        assert!(counter.flag);
        boxed.undo(&mut counter).unwrap();
        assert!(!counter.flag);
        assert_eq!(boxed.description(), "Flip");
    }

    #[test]
    fn mono_action_twice_is_identity() {
        let mut counter = counter();
        let mut action = Flip;
        action.do_action(&mut counter).unwrap();
        action.do_action(&mut counter).unwrap();
        assert!(!counter.flag);
    }
}
