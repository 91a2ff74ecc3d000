//! `input` module payloads.
//!
//! An action sequence is a list of input sources, each tagged by `type`, and
//! each carrying its own list of actions tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::identifiers::BrowsingContextId;

use super::script::SharedReference;

// ============================================================================
// Commands
// ============================================================================

/// Input module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatch an action sequence.
    #[serde(rename = "input.performActions")]
    PerformActions {
        /// Target context.
        context: BrowsingContextId,
        /// One entry per input source.
        actions: Vec<SourceActions>,
    },

    /// Release every pressed key and button.
    #[serde(rename = "input.releaseActions")]
    ReleaseActions {
        /// Target context.
        context: BrowsingContextId,
    },

    /// Set the files of an `<input type="file">`.
    #[serde(rename = "input.setFiles")]
    SetFiles {
        /// Target context.
        context: BrowsingContextId,
        /// File input element.
        element: SharedReference,
        /// Absolute file paths.
        files: Vec<String>,
    },
}

// ============================================================================
// Sources
// ============================================================================

/// Actions of one input source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceActions {
    /// Source that only pauses.
    None {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<NoneAction>,
    },
    /// Keyboard.
    Key {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<KeyAction>,
    },
    /// Mouse, pen or touch.
    Pointer {
        /// Source id.
        id: String,
        /// Pointer kind.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<PointerParameters>,
        /// Actions.
        actions: Vec<PointerAction>,
    },
    /// Scroll wheel.
    Wheel {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<WheelAction>,
    },
}

impl SourceActions {
    /// Returns the source id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::None { id, .. }
            | Self::Key { id, .. }
            | Self::Pointer { id, .. }
            | Self::Wheel { id, .. } => id,
        }
    }

    /// Returns the number of actions (ticks) in this source.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None { actions, .. } => actions.len(),
            Self::Key { actions, .. } => actions.len(),
            Self::Pointer { actions, .. } => actions.len(),
            Self::Wheel { actions, .. } => actions.len(),
        }
    }

    /// Returns `true` if this source has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pointer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    /// Mouse.
    Mouse,
    /// Pen.
    Pen,
    /// Touch.
    Touch,
}

/// Pointer source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerParameters {
    /// Pointer kind.
    #[serde(rename = "pointerType")]
    pub pointer_type: PointerType,
}

// ============================================================================
// Actions
// ============================================================================

/// Action of a `none` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoneAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
}

/// Action of a `key` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Press a key.
    KeyDown {
        /// Key value, one grapheme or a WebDriver key code point.
        value: String,
    },
    /// Release a key.
    KeyUp {
        /// Key value.
        value: String,
    },
}

/// Action of a `pointer` source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Press a button.
    PointerDown {
        /// Button index.
        button: u32,
    },
    /// Release a button.
    PointerUp {
        /// Button index.
        button: u32,
    },
    /// Move the pointer.
    PointerMove {
        /// X offset from the origin.
        x: f64,
        /// Y offset from the origin.
        y: f64,
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
        /// Coordinate origin.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<Origin>,
    },
}

/// Action of a `wheel` source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WheelAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Scroll.
    Scroll {
        /// X position.
        x: i64,
        /// Y position.
        y: i64,
        /// Horizontal delta.
        #[serde(rename = "deltaX")]
        delta_x: i64,
        /// Vertical delta.
        #[serde(rename = "deltaY")]
        delta_y: i64,
        /// Milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
        /// Coordinate origin.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<Origin>,
    },
}

// ============================================================================
// Origin
// ============================================================================

/// Coordinate origin of a pointer move or scroll.
///
/// Serializes as `"viewport"`, `"pointer"`, or
/// `{"type": "element", "element": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OriginRepr", into = "OriginRepr")]
pub enum Origin {
    /// Viewport top-left.
    Viewport,
    /// Current pointer position.
    Pointer,
    /// Centre of an element.
    Element(SharedReference),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OriginRepr {
    Keyword(OriginKeyword),
    Element(ElementOrigin),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OriginKeyword {
    Viewport,
    Pointer,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename = "element")]
struct ElementOrigin {
    element: SharedReference,
}

impl From<OriginRepr> for Origin {
    fn from(repr: OriginRepr) -> Self {
        match repr {
            OriginRepr::Keyword(OriginKeyword::Viewport) => Self::Viewport,
            OriginRepr::Keyword(OriginKeyword::Pointer) => Self::Pointer,
            OriginRepr::Element(origin) => Self::Element(origin.element),
        }
    }
}

impl From<Origin> for OriginRepr {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Viewport => Self::Keyword(OriginKeyword::Viewport),
            Origin::Pointer => Self::Keyword(OriginKeyword::Pointer),
            Origin::Element(element) => Self::Element(ElementOrigin { element }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
