//! # Vellum Core
//!
//! Undoable editing of 2D scenes: the generic action framework in
//! [`abstract_editor`] and the scene document with its actions in [`scene`].

pub mod abstract_editor;
pub mod scene;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
