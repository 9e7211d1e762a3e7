//! Composite actions executed and undone as a single history entry.

use std::fmt;

use super::action::{EditAction, EditActionError, EditActionResult, Editable};

/// An ordered, sealed sequence of actions that forms one undo step.
///
/// Children are added with [`add`](Self::add) and the group is sealed with
/// [`finalize`](Self::finalize). A finalized group rejects new children and
/// an unfinalized group refuses to run, so apply and undo always walk the
/// same fixed sequence.
///
/// `apply` runs children in insertion order; `undo` runs them in reverse,
/// because later children may depend on state established by earlier ones
/// (removing a layer's entities before the layer itself, then restoring the
/// layer before its entities).
///
/// If a child fails, the children that already ran are reverted in reverse
/// order and [`EditActionError::GroupAborted`] is returned. If reverting
/// fails as well the group reports [`EditActionError::GroupPartiallyApplied`]
/// instead.
pub struct ActionGroup<T: Editable> {
    description: String,
    children: Vec<Box<dyn EditAction<T>>>,
    finalized: bool,
}

impl<T: Editable> ActionGroup<T> {
    /// Creates an empty, open group.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            children: Vec::new(),
            finalized: false,
        }
    }

    /// Appends a child action.
    ///
    /// Fails with [`EditActionError::IllegalState`] once the group is finalized.
    pub fn add(&mut self, child: Box<dyn EditAction<T>>) -> EditActionResult {
        if self.finalized {
            return Err(EditActionError::illegal(format!(
                "cannot add \"{}\" to finalized group \"{}\"",
                child.description(),
                self.description
            )));
        }
        self.children.push(child);
        Ok(())
    }

    /// Seals the group. Calling it again has no effect.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Returns `true` once [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of child actions.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn ensure_finalized(&self) -> EditActionResult {
        if self.finalized {
            Ok(())
        } else {
            Err(EditActionError::illegal(format!(
                "group \"{}\" was not finalized",
                self.description
            )))
        }
    }
}

impl<T: Editable> fmt::Debug for ActionGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGroup")
            .field("description", &self.description)
            .field("children", &self.children)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl<T: Editable> EditAction<T> for ActionGroup<T> {
    fn apply(&mut self, target: &mut T) -> EditActionResult {
        self.ensure_finalized()?;

        for index in 0..self.children.len() {
            let Err(source) = self.children[index].apply(target) else {
                continue;
            };
            log::warn!(
                "\"{}\" step {index} (\"{}\") failed: {source}",
                self.description,
                self.children[index].description()
            );

            // Revert what already ran, newest first.
            for done in self.children[..index].iter_mut().rev() {
                if let Err(e) = done.undo(target) {
                    log::error!("Rolling back \"{}\" failed: {e}", done.description());
                    return Err(EditActionError::GroupPartiallyApplied {
                        index,
                        source: Box::new(source),
                    });
                }
            }
            return Err(EditActionError::GroupAborted {
                index,
                source: Box::new(source),
            });
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut T) -> EditActionResult {
        self.ensure_finalized()?;

        for index in (0..self.children.len()).rev() {
            let Err(source) = self.children[index].undo(target) else {
                continue;
            };
            log::warn!(
                "Undo of \"{}\" step {index} (\"{}\") failed: {source}",
                self.description,
                self.children[index].description()
            );

            // Re-apply what was already undone, oldest first, so the group
            // stays fully applied.
            for undone in self.children[index + 1..].iter_mut() {
                if let Err(e) = undone.apply(target) {
                    log::error!("Re-applying \"{}\" failed: {e}", undone.description());
                    return Err(EditActionError::GroupPartiallyApplied {
                        index,
                        source: Box::new(source),
                    });
                }
            }
            return Err(EditActionError::GroupAborted {
                index,
                source: Box::new(source),
            });
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn modifies_content(&self) -> bool {
        self.children.iter().any(|c| c.modifies_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstract_editor::{EditActionHistory, HistoryDirection};

    /// Target that records every call made by the children.
    #[derive(Default)]
    struct Journal {
        calls: Vec<String>,
        value: i32,
        reject_apply: Option<&'static str>,
        reject_undo: Option<&'static str>,
    }

    impl Editable for Journal {}

    #[derive(Debug)]
    struct Step {
        name: &'static str,
        amount: i32,
    }

    fn step(name: &'static str, amount: i32) -> Box<Step> {
        Box::new(Step { name, amount })
    }

    impl EditAction<Journal> for Step {
        fn apply(&mut self, target: &mut Journal) -> EditActionResult {
            if target.reject_apply == Some(self.name) {
                return Err(EditActionError::stale(self.name));
            }
            target.calls.push(format!("apply {}", self.name));
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Journal) -> EditActionResult {
            if target.reject_undo == Some(self.name) {
                return Err(EditActionError::stale(self.name));
            }
            target.calls.push(format!("undo {}", self.name));
            target.value -= self.amount;
            Ok(())
        }

        fn description(&self) -> &str {
            self.name
        }
    }

    fn group_of(names: &[&'static str]) -> ActionGroup<Journal> {
        let mut group = ActionGroup::new("Batch");
        for (i, &name) in names.iter().enumerate() {
            group.add(step(name, 1 << i)).unwrap();
        }
        group.finalize();
        group
    }

    #[test]
    fn apply_in_order_undo_in_reverse() {
        let mut journal = Journal::default();
        let mut group = group_of(&["c1", "c2", "c3"]);

        group.apply(&mut journal).unwrap();
        assert_eq!(journal.value, 7);
        group.undo(&mut journal).unwrap();
        assert_eq!(journal.value, 0);

        assert_eq!(
            journal.calls,
            vec!["apply c1", "apply c2", "apply c3", "undo c3", "undo c2", "undo c1"]
        );
    }

    #[test]
    fn add_after_finalize_is_rejected() {
        let mut group = group_of(&["c1"]);
        let err = group.add(step("late", 1)).unwrap_err();
        assert!(matches!(err, EditActionError::IllegalState(_)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn unfinalized_group_refuses_to_run() {
        let mut journal = Journal::default();
        let mut group = ActionGroup::new("Open");
        group.add(step("c1", 1)).unwrap();

        assert!(!group.is_finalized());
        assert!(matches!(
            group.apply(&mut journal),
            Err(EditActionError::IllegalState(_))
        ));
        assert!(journal.calls.is_empty());
    }

    #[test]
    fn failing_child_rolls_back_prefix() {
        let mut journal = Journal {
            reject_apply: Some("c3"),
            ..Default::default()
        };
        let mut group = group_of(&["c1", "c2", "c3", "c4"]);

        let err = group.apply(&mut journal).unwrap_err();
        assert_eq!(
            err,
            EditActionError::GroupAborted {
                index: 2,
                source: Box::new(EditActionError::stale("c3")),
            }
        );
        assert_eq!(journal.value, 0);
        assert_eq!(
            journal.calls,
            vec!["apply c1", "apply c2", "undo c2", "undo c1"]
        );
    }

    #[test]
    fn failed_rollback_is_reported_as_partial() {
        let mut journal = Journal {
            reject_apply: Some("c3"),
            reject_undo: Some("c1"),
            ..Default::default()
        };
        let mut group = group_of(&["c1", "c2", "c3"]);

        let err = group.apply(&mut journal).unwrap_err();
        assert!(matches!(
            err,
            EditActionError::GroupPartiallyApplied { index: 2, .. }
        ));
        // c1 is still applied.
        assert_eq!(journal.value, 1);
    }

    #[test]
    fn failing_undo_reapplies_suffix() {
        let mut journal = Journal::default();
        let mut group = group_of(&["c1", "c2", "c3"]);
        group.apply(&mut journal).unwrap();

        journal.reject_undo = Some("c2");
        journal.calls.clear();
        let err = group.undo(&mut journal).unwrap_err();

        assert!(matches!(err, EditActionError::GroupAborted { index: 1, .. }));
        assert_eq!(journal.value, 7);
        assert_eq!(journal.calls, vec!["undo c3", "apply c3"]);
    }

    #[test]
    fn group_is_one_history_entry() {
        let mut journal = Journal::default();
        let mut history = EditActionHistory::new(10);

        history
            .execute(Box::new(group_of(&["c1", "c2"])), &mut journal)
            .unwrap();
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.undo_descriptions().next(), Some("Batch"));

        history.undo(&mut journal).unwrap();
        assert_eq!(journal.value, 0);
        assert_eq!(
            history.undo(&mut journal),
            Err(EditActionError::EmptyHistory(HistoryDirection::Undo))
        );
    }

    #[test]
    fn aborted_group_is_not_recorded() {
        let mut journal = Journal {
            reject_apply: Some("c2"),
            ..Default::default()
        };
        let mut history = EditActionHistory::new(10);

        let result = history.execute(Box::new(group_of(&["c1", "c2"])), &mut journal);
        assert!(matches!(result, Err(EditActionError::GroupAborted { .. })));
        assert_eq!(history.undo_count(), 0);
        assert_eq!(journal.value, 0);
    }
}
