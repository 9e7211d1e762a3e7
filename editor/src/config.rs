//! Editor configuration loaded from `editor.toml`.
//!
//! ```toml
//! max_undo = 200
//! log_level = "debug"
//! layers = ["Background", "Props", "FX"]
//!
//! [[entities]]
//! name = "Tree"
//! layer = "Props"
//! x = 4.0
//! y = 2.5
//! ```

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use vellum_core::abstract_editor::{DEFAULT_MAX_UNDO, EditActionError};
use vellum_core::scene::{DEFAULT_LAYER_NAME, Position, SceneBuilder, SceneDocument};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "editor.toml";

/// Top-level editor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Maximum number of undo steps kept in history.
    pub max_undo: usize,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: Option<String>,
    /// Layer created when `layers` is empty.
    pub default_layer: String,
    /// Initial layers, first to last.
    pub layers: Vec<String>,
    /// Entities placed on the initial layers.
    pub entities: Vec<EntityConfig>,
}

/// An entity in the initial scene.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub name: String,
    pub layer: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
            log_level: None,
            default_layer: DEFAULT_LAYER_NAME.into(),
            layers: Vec::new(),
            entities: Vec::new(),
        }
    }
}

/// Errors from reading or validating the editor configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl EditorConfig {
    /// Parses and validates configuration text. `path` is only used in
    /// error messages.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_undo == 0 {
            return Err(ConfigError::Invalid("max_undo must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for name in self.layer_names() {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("layer names must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate layer \"{name}\"")));
            }
        }

        for entity in &self.entities {
            if !seen.contains(entity.layer.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "entity \"{}\" is on unknown layer \"{}\"",
                    entity.name, entity.layer
                )));
            }
        }
        Ok(())
    }

    /// Initial layer names, falling back to `default_layer`.
    pub fn layer_names(&self) -> Vec<&str> {
        if self.layers.is_empty() {
            vec![self.default_layer.as_str()]
        } else {
            self.layers.iter().map(String::as_str).collect()
        }
    }

    /// Builds the document the editor starts with.
    pub fn build_document(&self) -> Result<SceneDocument, EditActionError> {
        let mut builder = SceneBuilder::new();
        let mut ids = Vec::new();
        for name in self.layer_names() {
            ids.push((name, builder.add_layer(name)?));
        }

        for entity in &self.entities {
            let layer = ids
                .iter()
                .find(|(name, _)| *name == entity.layer)
                .map(|(_, id)| *id)
                .ok_or_else(|| {
                    EditActionError::illegal(format!("unknown layer \"{}\"", entity.layer))
                })?;
            builder.spawn_entity(&entity.name, layer, Position::new(entity.x, entity.y))?;
        }
        Ok(builder.build())
    }
}

/// Loads the configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    EditorConfig::from_toml(&content, path)
}

/// Loads the configuration, using defaults if the file does not exist.
///
/// Any other read, parse or validation failure is returned.
pub fn load_or_default(path: &Path) -> Result<EditorConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(EditorConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<EditorConfig, ConfigError> {
        EditorConfig::from_toml(content, Path::new("editor.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.max_undo, DEFAULT_MAX_UNDO);
        assert_eq!(config.layer_names(), vec![DEFAULT_LAYER_NAME]);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
            max_undo = 20
            log_level = "debug"
            layers = ["Ground", "Props"]

            [[entities]]
            name = "Tree"
            layer = "Props"
            x = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.max_undo, 20);
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let document = config.build_document().unwrap();
        let names: Vec<&str> = document.layers().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["Ground", "Props"]);
        let (_, tree) = document.entities().next().unwrap();
        assert_eq!(tree.name, "Tree");
        assert_eq!(tree.position, Position::new(1.5, 0.0));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(parse("max_undo = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            parse(r#"layers = ["A", "A"]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse(
                r#"
                [[entities]]
                name = "Ghost"
                layer = "Nowhere"
                "#
            ),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let err = parse("max_undo = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("editor.toml"));
        assert!(matches!(parse("colour = 1"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_falls_back() {
        let path = Path::new("does/not/exist/editor.toml");
        assert!(matches!(load_config(path), Err(ConfigError::Read { .. })));
        let config = load_or_default(path).unwrap();
        assert_eq!(config.max_undo, DEFAULT_MAX_UNDO);
    }
}
