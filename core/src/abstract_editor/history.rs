//! Undo/redo action history.
//!
//! [`EditActionHistory`] manages a linear undo/redo stack of [`EditAction`] trait
//! objects. When a new action is pushed after undoing, the redo stack is
//! cleared: the timeline forked and the undone future is gone.

use std::collections::VecDeque;
use std::fmt;

use super::action::{EditAction, EditActionError, EditActionResult, Editable, HistoryDirection};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Manages an undo/redo stack of editor actions.
///
/// The undo stack is a bounded [`VecDeque`]. When it exceeds `max_undo`,
/// the oldest action is dropped from the front. The redo stack is an
/// unbounded [`Vec`] (it can never grow larger than the undo stack was).
///
/// # Failure policy
///
/// - A failed [`execute`](Self::execute) leaves both stacks untouched.
/// - A failed [`undo`](Self::undo) or [`redo`](Self::redo) puts the action
///   back on the stack it was popped from and returns the error, so the
///   history never silently loses an entry.
///
/// # Example
///
/// ```ignore
/// let mut history = EditActionHistory::new(50);
/// let mut document = SceneBuilder::new().build();
///
/// history.execute(Box::new(LayerAddedAction::new("FX")), &mut document)?;
/// history.undo(&mut document)?;
/// history.redo(&mut document)?;
/// ```
pub struct EditActionHistory<T: Editable> {
    undo_stack: VecDeque<Box<dyn EditAction<T>>>,
    redo_stack: Vec<Box<dyn EditAction<T>>>,
    max_undo: usize,
    merge_broken: bool,
    /// Tracks distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)` where `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)` where `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: the save point is permanently unreachable (capacity
    ///   overflow dropped it, or the redo branch holding it was discarded).
    save_distance: Option<i64>,
}

impl<T: Editable> EditActionHistory<T> {
    /// Creates a new empty action history with the given maximum undo depth.
    ///
    /// When the undo stack exceeds `max_undo`, the oldest action is dropped.
    /// A fresh history counts as saved.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            merge_broken: false,
            save_distance: Some(0),
        }
    }

    /// Applies an action to the target and, if the action is
    /// [recorded](EditAction::is_recorded), pushes it onto the undo stack.
    ///
    /// **Recorded actions** (the default) clear the redo stack and attempt
    /// to [merge](EditAction::merge) with the top of the undo stack.
    ///
    /// **Non-recorded actions** are applied but never pushed onto either
    /// stack. If such an action also returns `true` from
    /// [`breaks_merge`](EditAction::breaks_merge), the next recorded action
    /// will not merge with the previous undo entry.
    ///
    /// If the action fails, neither stack changes and the error is returned.
    pub fn execute(
        &mut self,
        mut action: Box<dyn EditAction<T>>,
        target: &mut T,
    ) -> EditActionResult {
        if let Err(e) = action.apply(target) {
            log::debug!("Execute \"{}\" failed: {e}", action.description());
            return Err(e);
        }

        if !action.is_recorded() {
            if action.breaks_merge() {
                self.merge_broken = true;
            }
            return Ok(());
        }

        log::debug!("Executed \"{}\"", action.description());
        let is_content = action.modifies_content();

        if !self.redo_stack.is_empty() {
            log::trace!("Discarding {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
        // The save point lived on the discarded branch.
        if is_content
            && let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }

        if !self.merge_broken
            && let Some(last) = self.undo_stack.back_mut()
        {
            match last.merge(action) {
                None => {
                    if is_content && self.save_distance == Some(0) {
                        self.save_distance = None;
                    }
                    return Ok(());
                }
                Some(returned) => action = returned,
            }
        }
        self.merge_broken = false;

        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }

        self.push_undo(action);
        Ok(())
    }

    /// Undoes the most recent action.
    ///
    /// Returns [`EditActionError::EmptyHistory`] if the undo stack is empty.
    /// If the action's undo fails, the action stays on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> EditActionResult {
        let mut action = self
            .undo_stack
            .pop_back()
            .ok_or(EditActionError::EmptyHistory(HistoryDirection::Undo))?;

        if let Err(e) = action.undo(target) {
            log::warn!("Undo \"{}\" failed: {e}", action.description());
            self.undo_stack.push_back(action);
            return Err(e);
        }

        log::debug!("Undid \"{}\"", action.description());
        if action.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d -= 1;
        }
        self.redo_stack.push(action);
        Ok(())
    }

    /// Redoes the most recently undone action.
    ///
    /// Returns [`EditActionError::EmptyHistory`] if the redo stack is empty.
    /// If re-applying fails, the action stays on the redo stack.
    pub fn redo(&mut self, target: &mut T) -> EditActionResult {
        let mut action = self
            .redo_stack
            .pop()
            .ok_or(EditActionError::EmptyHistory(HistoryDirection::Redo))?;

        if let Err(e) = action.apply(target) {
            log::warn!("Redo \"{}\" failed: {e}", action.description());
            self.redo_stack.push(action);
            return Err(e);
        }

        log::debug!("Redid \"{}\"", action.description());
        if action.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d += 1;
        }
        self.push_undo(action);
        Ok(())
    }

    fn push_undo(&mut self, action: Box<dyn EditAction<T>>) {
        self.undo_stack.push_back(action);
        if self.undo_stack.len() > self.max_undo {
            if let Some(dropped) = self.undo_stack.pop_front() {
                log::trace!("Undo limit reached, dropping \"{}\"", dropped.description());
            }
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Returns `true` if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns an iterator over undo action descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|a| a.description())
    }

    /// Returns an iterator over redo action descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|a| a.description())
    }

    /// Returns the number of actions in the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of actions in the redo stack.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns the maximum undo depth.
    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state.
    ///
    /// Also `true` when the save point became unreachable (dropped by
    /// capacity overflow, or left behind on a discarded redo branch).
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Clears both undo and redo stacks and resets the merge-broken flag.
    ///
    /// The saved state survives only if the target currently matches it.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.merge_broken = false;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> Default for EditActionHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl<T: Editable> fmt::Debug for EditActionHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditActionHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("merge_broken", &self.merge_broken)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test target: a value plus a freeze switch that makes every action fail.
    struct Tally {
        value: i32,
        frozen: bool,
    }

    impl Editable for Tally {}

    impl Tally {
        fn new(value: i32) -> Self {
            Self {
                value,
                frozen: false,
            }
        }

        fn check(&self) -> EditActionResult {
            if self.frozen {
                Err(EditActionError::illegal("tally is frozen"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Debug)]
    struct Add {
        amount: i32,
        label: &'static str,
    }

    fn add(amount: i32) -> Box<Add> {
        Box::new(Add {
            amount,
            label: "Add",
        })
    }

    fn labelled(amount: i32, label: &'static str) -> Box<Add> {
        Box::new(Add { amount, label })
    }

    impl EditAction<Tally> for Add {
        fn apply(&mut self, target: &mut Tally) -> EditActionResult {
            target.check()?;
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Tally) -> EditActionResult {
            target.check()?;
            target.value -= self.amount;
            Ok(())
        }

        fn description(&self) -> &str {
            self.label
        }
    }

    /// Mergeable action: consecutive drags keep the first `from`, take the last `to`.
    #[derive(Debug)]
    struct Drag {
        from: i32,
        to: i32,
    }

    impl EditAction<Tally> for Drag {
        fn apply(&mut self, target: &mut Tally) -> EditActionResult {
            target.value = self.to;
            Ok(())
        }

        fn undo(&mut self, target: &mut Tally) -> EditActionResult {
            target.value = self.from;
            Ok(())
        }

        fn description(&self) -> &str {
            "Drag"
        }

        fn merge(&mut self, other: Box<dyn EditAction<Tally>>) -> Option<Box<dyn EditAction<Tally>>> {
            if let Some(other) = other.as_any().downcast_ref::<Drag>() {
                self.to = other.to;
                return None;
            }
            Some(other)
        }
    }

    /// Non-recorded action, optionally breaking the merge chain.
    #[derive(Debug)]
    struct Transient {
        breaks: bool,
    }

    impl EditAction<Tally> for Transient {
        fn apply(&mut self, _target: &mut Tally) -> EditActionResult {
            Ok(())
        }

        fn undo(&mut self, _target: &mut Tally) -> EditActionResult {
            unreachable!("non-recorded actions are never undone");
        }

        fn description(&self) -> &str {
            "Transient"
        }

        fn is_recorded(&self) -> bool {
            false
        }

        fn breaks_merge(&self) -> bool {
            self.breaks
        }
    }

    /// Recorded action that only touches UI state.
    #[derive(Debug)]
    struct Highlight;

    impl EditAction<Tally> for Highlight {
        fn apply(&mut self, _target: &mut Tally) -> EditActionResult {
            Ok(())
        }

        fn undo(&mut self, _target: &mut Tally) -> EditActionResult {
            Ok(())
        }

        fn description(&self) -> &str {
            "Highlight"
        }

        fn modifies_content(&self) -> bool {
            false
        }
    }

    fn history() -> EditActionHistory<Tally> {
        EditActionHistory::new(DEFAULT_MAX_UNDO)
    }

    #[test]
    fn execute_applies_and_pushes() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(add(5), &mut tally).unwrap();

        assert_eq!(tally.value, 5);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn undo_then_redo_round_trip() {
        let mut history = history();
        let mut tally = Tally::new(10);

        history.execute(add(5), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        assert_eq!(tally.value, 10);
        assert_eq!((history.undo_count(), history.redo_count()), (0, 1));

        history.redo(&mut tally).unwrap();
        assert_eq!(tally.value, 15);
        assert_eq!((history.undo_count(), history.redo_count()), (1, 0));
    }

    #[test]
    fn forked_timeline_cannot_be_redone() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(labelled(1, "a"), &mut tally).unwrap();
        history.execute(labelled(2, "b"), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        history.execute(labelled(4, "c"), &mut tally).unwrap();

        assert_eq!(
            history.redo(&mut tally),
            Err(EditActionError::EmptyHistory(HistoryDirection::Redo))
        );
        assert_eq!(tally.value, 5);
        let undos: Vec<&str> = history.undo_descriptions().collect();
        assert_eq!(undos, vec!["c", "a"]);
    }

    #[test]
    fn empty_stacks_report_direction() {
        let mut history = history();
        let mut tally = Tally::new(0);

        assert_eq!(
            history.undo(&mut tally),
            Err(EditActionError::EmptyHistory(HistoryDirection::Undo))
        );
        assert_eq!(
            history.redo(&mut tally),
            Err(EditActionError::EmptyHistory(HistoryDirection::Redo))
        );
    }

    #[test]
    fn failed_execute_does_not_push() {
        let mut history = history();
        let mut tally = Tally::new(0);
        history.execute(add(1), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();

        tally.frozen = true;
        assert!(history.execute(add(3), &mut tally).is_err());

        assert_eq!(tally.value, 0);
        assert_eq!(history.undo_count(), 0);
        // The redo branch survives a failed execute.
        assert_eq!(history.redo_count(), 1);
    }

    #[test]
    fn failed_undo_keeps_action_on_undo_stack() {
        let mut history = history();
        let mut tally = Tally::new(0);
        history.execute(add(7), &mut tally).unwrap();

        tally.frozen = true;
        assert!(matches!(
            history.undo(&mut tally),
            Err(EditActionError::IllegalState(_))
        ));
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);

        tally.frozen = false;
        history.undo(&mut tally).unwrap();
        assert_eq!(tally.value, 0);
    }

    #[test]
    fn failed_redo_keeps_action_on_redo_stack() {
        let mut history = history();
        let mut tally = Tally::new(0);
        history.execute(add(7), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();

        tally.frozen = true;
        assert!(history.redo(&mut tally).is_err());
        assert_eq!(history.redo_count(), 1);
        assert_eq!(history.undo_count(), 0);

        tally.frozen = false;
        history.redo(&mut tally).unwrap();
        assert_eq!(tally.value, 7);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = EditActionHistory::new(2);
        let mut tally = Tally::new(0);

        for amount in [1, 2, 3] {
            history.execute(add(amount), &mut tally).unwrap();
        }
        assert_eq!(history.undo_count(), 2);

        history.undo(&mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        assert_eq!(tally.value, 1);
        assert!(history.undo(&mut tally).is_err());
    }

    #[test]
    fn descriptions_most_recent_first() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(labelled(1, "first"), &mut tally).unwrap();
        history.execute(labelled(1, "second"), &mut tally).unwrap();
        let undos: Vec<&str> = history.undo_descriptions().collect();
        assert_eq!(undos, vec!["second", "first"]);

        history.undo(&mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        let redos: Vec<&str> = history.redo_descriptions().collect();
        assert_eq!(redos, vec!["first", "second"]);
    }

    #[test]
    fn consecutive_drags_merge() {
        let mut history = history();
        let mut tally = Tally::new(0);

        for (from, to) in [(0, 10), (10, 20), (20, 30)] {
            history.execute(Box::new(Drag { from, to }), &mut tally).unwrap();
        }
        assert_eq!(history.undo_count(), 1);

        history.undo(&mut tally).unwrap();
        assert_eq!(tally.value, 0);
    }

    #[test]
    fn merge_chain_broken_by_transient() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history
            .execute(Box::new(Drag { from: 0, to: 10 }), &mut tally)
            .unwrap();
        history
            .execute(Box::new(Transient { breaks: false }), &mut tally)
            .unwrap();
        history
            .execute(Box::new(Drag { from: 10, to: 20 }), &mut tally)
            .unwrap();
        assert_eq!(history.undo_count(), 1);

        history
            .execute(Box::new(Transient { breaks: true }), &mut tally)
            .unwrap();
        history
            .execute(Box::new(Drag { from: 20, to: 30 }), &mut tally)
            .unwrap();
        assert_eq!(history.undo_count(), 2);
    }

    #[test]
    fn transient_does_not_clear_redo() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(add(1), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        history
            .execute(Box::new(Transient { breaks: false }), &mut tally)
            .unwrap();

        assert_eq!(history.redo_count(), 1);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn save_point_tracking() {
        let mut history = history();
        let mut tally = Tally::new(0);
        assert!(!history.has_unsaved_changes());

        history.execute(add(1), &mut tally).unwrap();
        assert!(history.has_unsaved_changes());

        history.mark_saved();
        history.execute(add(1), &mut tally).unwrap();
        assert!(history.has_unsaved_changes());

        history.undo(&mut tally).unwrap();
        assert!(!history.has_unsaved_changes());

        history.undo(&mut tally).unwrap();
        assert!(history.has_unsaved_changes());

        history.redo(&mut tally).unwrap();
        assert!(!history.has_unsaved_changes());
    }

    #[test]
    fn save_point_lost_on_fork() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(add(1), &mut tally).unwrap();
        history.mark_saved();
        history.undo(&mut tally).unwrap();
        history.execute(add(2), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();

        // Back at the pre-save state, but the save point itself is gone.
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn save_point_lost_on_overflow() {
        let mut history = EditActionHistory::new(1);
        let mut tally = Tally::new(0);

        history.mark_saved();
        history.execute(add(1), &mut tally).unwrap();
        history.execute(add(1), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();

        assert!(history.has_unsaved_changes());
        assert!(!history.can_undo());
    }

    #[test]
    fn ui_only_actions_do_not_dirty() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(Box::new(Highlight), &mut tally).unwrap();
        assert_eq!(history.undo_count(), 1);
        assert!(!history.has_unsaved_changes());

        history.undo(&mut tally).unwrap();
        assert!(!history.has_unsaved_changes());
    }

    #[test]
    fn clear_keeps_save_only_at_current_state() {
        let mut history = history();
        let mut tally = Tally::new(0);

        history.execute(add(1), &mut tally).unwrap();
        history.mark_saved();
        history.clear();
        assert!(!history.has_unsaved_changes());
        assert!(!history.can_undo() && !history.can_redo());

        history.execute(add(1), &mut tally).unwrap();
        history.undo(&mut tally).unwrap();
        history.clear();
        assert!(!history.has_unsaved_changes());

        history.execute(add(1), &mut tally).unwrap();
        history.clear();
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn debug_impl() {
        let history = EditActionHistory::<Tally>::default();
        let debug = format!("{history:?}");
        assert!(debug.contains("EditActionHistory"));
        assert!(debug.contains("undo_count"));
        assert_eq!(history.max_undo(), DEFAULT_MAX_UNDO);
    }
}
