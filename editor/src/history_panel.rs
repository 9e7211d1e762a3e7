use std::fmt::Write;

use vellum_core::abstract_editor::{EditActionHistory, Editable};

/// Renders the undo/redo action history as text.
///
/// Redo entries come first, the next one to redo closest to the cursor,
/// followed by the undo entries, most recent first.
pub fn render_history<T: Editable>(history: &EditActionHistory<T>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Undo: {} | Redo: {}{}",
        history.undo_count(),
        history.redo_count(),
        if history.has_unsaved_changes() {
            " | unsaved"
        } else {
            ""
        }
    );

    let redo: Vec<&str> = history.redo_descriptions().collect();
    for desc in redo.iter().rev() {
        let _ = writeln!(out, "  REDO {desc}");
    }

    out.push_str("▸ current\n");

    for desc in history.undo_descriptions() {
        let _ = writeln!(out, "  UNDO {desc}");
    }
    out
}
