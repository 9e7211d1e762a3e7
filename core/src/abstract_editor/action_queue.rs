//! Deferred action submission for views that only hold shared references.
//!
//! Listeners receive `&SceneDocument` while a notification is dispatched and
//! panels are usually borrowed immutably while they are drawn, so neither can
//! call [`EditActionHistory::execute`](super::EditActionHistory::execute)
//! directly. They push into an [`ActionQueue`] instead and the editor drains
//! it once the current mutation has finished.

use std::fmt;

use parking_lot::Mutex;

use super::action::{EditAction, Editable};

/// A queue of pending [`EditAction`]s, fillable through `&self`.
pub struct ActionQueue<T: Editable> {
    queue: Mutex<Vec<Box<dyn EditAction<T>>>>,
}

impl<T: Editable> ActionQueue<T> {
    /// Creates a new empty action queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues an action.
    pub fn push(&self, action: Box<dyn EditAction<T>>) {
        log::trace!("Queued \"{}\"", action.description());
        self.queue.lock().push(action);
    }

    /// Drains all queued actions, returning them in submission order.
    pub fn drain(&self) -> Vec<Box<dyn EditAction<T>>> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of actions waiting to be executed.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns `true` if there are no queued actions.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T: Editable> Default for ActionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for ActionQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.len())
            .finish()
    }
}
