//! Scene layers.

use std::fmt;

/// Stable identity of a layer.
///
/// Ids are handed out by the owning [`SceneDocument`](super::SceneDocument)
/// and never reused, so a removed layer that is later re-inserted (by undo)
/// keeps the identity that other history entries refer to. The position of a
/// layer is a separate field, see [`Layer::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u32);

impl LayerId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw numeric value of the id.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// A named layer grouping entities.
///
/// Fields are read-only outside the crate; they change only through the
/// document's mutators, which the edit actions call.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    /// Order key. Layers are kept sorted by ascending key; reordering swaps
    /// keys and never touches `id`.
    pub(crate) order: i32,
    pub(crate) visible: bool,
    pub(crate) locked: bool,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: impl Into<String>, order: i32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            visible: true,
            locked: false,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Order key; lower keys come first.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Invisible layers stay in the model but are not rendered.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Entities on a locked layer cannot be manipulated directly.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
