//! The editor session: document, history, action queue and panels.

use std::fmt::Write;
use std::sync::Arc;

use vellum_core::abstract_editor::{ActionQueue, EditActionError, EditActionHistory, EditActionResult};
use vellum_core::scene::{EntityHandle, LayerId, Position, SceneDocument};

use crate::commands::{Command, HELP};
use crate::config::EditorConfig;
use crate::history_panel::render_history;
use crate::layers_panel::{LayersPanel, PanelError};

/// Errors surfaced to the user while running a command.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no layer named \"{0}\"")]
    UnknownLayer(String),
    #[error("no entity named \"{0}\"")]
    UnknownEntity(String),
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    Action(#[from] EditActionError),
}

/// What the front end should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Continue; print the text if there is any.
    Continue(Option<String>),
    Quit,
}

/// One editing session over a [`SceneDocument`].
pub struct SceneEditor {
    name: String,
    document: SceneDocument,
    history: EditActionHistory<SceneDocument>,
    queue: Arc<ActionQueue<SceneDocument>>,
    layers_panel: LayersPanel,
}

impl SceneEditor {
    pub fn new(name: impl Into<String>, config: &EditorConfig) -> EditActionResult<Self> {
        let mut document = config.build_document()?;
        let queue = Arc::new(ActionQueue::new());
        let layers_panel = LayersPanel::attach(&mut document, queue.clone());
        let name = name.into();
        log::info!(
            "Opened \"{name}\" with {} layers, {} entities, undo depth {}",
            document.layer_count(),
            document.entity_count(),
            config.max_undo
        );

        Ok(Self {
            name,
            document,
            history: EditActionHistory::new(config.max_undo),
            queue,
            layers_panel,
        })
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    pub fn history(&self) -> &EditActionHistory<SceneDocument> {
        &self.history
    }

    pub fn layers_panel(&self) -> &LayersPanel {
        &self.layers_panel
    }

    /// Window title, with a `*` while there are unsaved changes.
    pub fn title(&self) -> String {
        if self.history.has_unsaved_changes() {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Executes every queued action through the history.
    ///
    /// Failed actions are logged and skipped; their errors are returned in
    /// submission order.
    pub fn drain_actions(&mut self) -> Vec<EditActionError> {
        let mut failures = Vec::new();
        for action in self.queue.drain() {
            if let Err(e) = self.history.execute(action, &mut self.document) {
                log::warn!("Action failed: {e}");
                failures.push(e);
            }
        }
        failures
    }

    pub fn undo(&mut self) -> EditActionResult {
        self.history.undo(&mut self.document).inspect_err(|e| {
            log::warn!("Undo failed: {e}");
        })
    }

    pub fn redo(&mut self) -> EditActionResult {
        self.history.redo(&mut self.document).inspect_err(|e| {
            log::warn!("Redo failed: {e}");
        })
    }

    /// Records the current state as saved. Persisting the document is up to
    /// the caller.
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
        log::info!("Marked \"{}\" as saved", self.name);
    }

    fn layer_named(&self, name: &str) -> Result<LayerId, EditorError> {
        self.document
            .layer_by_name(name)
            .map(|layer| layer.id())
            .ok_or_else(|| EditorError::UnknownLayer(name.to_string()))
    }

    fn entity_named(&self, name: &str) -> Result<EntityHandle, EditorError> {
        self.document
            .entities()
            .find(|(_, data)| data.name == name)
            .map(|(handle, _)| handle)
            .ok_or_else(|| EditorError::UnknownEntity(name.to_string()))
    }

    /// Runs one command: panel requests are queued and drained right away.
    pub fn run_command(&mut self, command: Command) -> Result<CommandOutcome, EditorError> {
        let panel = &self.layers_panel;
        let document = &self.document;
        match command {
            Command::AddLayer(name) => panel.request_add(document, &name)?,
            Command::RemoveLayer => panel.request_remove(document)?,
            Command::RenameLayer { layer, to } => {
                let layer = self.layer_named(&layer)?;
                panel.request_rename(document, layer, &to)?;
            }
            Command::MoveLayer(direction) => panel.request_move(document, direction)?,
            Command::SelectLayer(name) => panel.select(self.layer_named(&name)?),
            Command::SetVisibility { layer, visible } => {
                let layer = self.layer_named(&layer)?;
                if document.layer(layer).is_some_and(|l| l.is_visible() != visible) {
                    panel.toggle_visibility(layer);
                }
            }
            Command::SetLocked { layer, locked } => {
                let layer = self.layer_named(&layer)?;
                if document.layer(layer).is_some_and(|l| l.is_locked() != locked) {
                    panel.toggle_lock(layer);
                }
            }
            Command::PickEntity(name) => {
                let entity = self.entity_named(&name)?;
                panel.select_entity(document, entity)?;
            }
            Command::MoveEntity { x, y } => {
                panel.request_move_entity(document, Position::new(x, y))?;
            }
            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,
            Command::Save => self.mark_saved(),
            Command::Layers => return Ok(CommandOutcome::Continue(Some(self.render_layers()))),
            Command::Entities => {
                return Ok(CommandOutcome::Continue(Some(self.render_entities())));
            }
            Command::History => {
                return Ok(CommandOutcome::Continue(Some(render_history(&self.history))));
            }
            Command::Help => return Ok(CommandOutcome::Continue(Some(HELP.to_string()))),
            Command::Quit => return Ok(CommandOutcome::Quit),
        }

        if let Some(e) = self.drain_actions().into_iter().next() {
            return Err(e.into());
        }
        Ok(CommandOutcome::Continue(None))
    }

    /// Text rendering of the layers panel.
    pub fn render_layers(&self) -> String {
        let panel = &self.layers_panel;
        let mut out = String::new();
        for row in panel.rows() {
            let _ = writeln!(
                out,
                "{} {} {} {}",
                if row.active { '>' } else { ' ' },
                if row.visible { 'V' } else { '-' },
                if row.locked { 'L' } else { '-' },
                row.name
            );
        }
        let _ = write!(
            out,
            "[up: {}] [down: {}] [remove: {}]",
            on_off(panel.can_move_up()),
            on_off(panel.can_move_down()),
            on_off(panel.can_remove())
        );
        out
    }

    fn render_entities(&self) -> String {
        let selected = self.layers_panel.selected_entity();
        let mut lines = Vec::new();
        for (handle, data) in self.document.entities() {
            let layer = self
                .document
                .layer(data.layer)
                .map(|l| l.name())
                .unwrap_or("?");
            lines.push(format!(
                "{} {} ({}, {}) on {layer}",
                if selected == Some(handle) { '*' } else { ' ' },
                data.name,
                data.position.x,
                data.position.y
            ));
        }
        if lines.is_empty() {
            "no entities".to_string()
        } else {
            lines.join("\n")
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
