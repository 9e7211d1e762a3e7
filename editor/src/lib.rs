//! # Vellum Editor
//!
//! Headless editor shell over [`vellum_core`]: configuration, the layers and
//! history panels, and a line-oriented command front end.

pub mod commands;
pub mod config;
pub mod editor;
pub mod history_panel;
pub mod layers_panel;

pub use commands::{Command, CommandError};
pub use config::{ConfigError, EditorConfig};
pub use editor::{CommandOutcome, EditorError, SceneEditor};
pub use layers_panel::{LayerRow, LayersPanel, PanelError};
