//! Command wrapper over all protocol modules.
//!
//! Each module defines its own command enum, adjacently tagged as
//! `{"method": "...", "params": {...}}`. [`Command`] wraps them untagged so a
//! [`Request`](super::Request) can flatten any of them next to its `id`.
//!
//! # Command Modules
//!
//! | Module | Enum |
//! |--------|------|
//! | `session` | [`SessionCommand`] |
//! | `browser` | [`BrowserCommand`] |
//! | `browsingContext` | [`BrowsingContextCommand`] |
//! | `network` | [`NetworkCommand`] |
//! | `script` | [`ScriptCommand`] |
//! | `input` | [`InputCommand`] |
//! | `storage` | [`StorageCommand`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use super::browser::BrowserCommand;
use super::browsing_context::BrowsingContextCommand;
use super::input::InputCommand;
use super::network::NetworkCommand;
use super::script::ScriptCommand;
use super::session::SessionCommand;
use super::storage::StorageCommand;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Session module commands.
    Session(SessionCommand),
    /// Browser module commands.
    Browser(BrowserCommand),
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Network module commands.
    Network(NetworkCommand),
    /// Script module commands.
    Script(ScriptCommand),
    /// Input module commands.
    Input(InputCommand),
    /// Storage module commands.
    Storage(StorageCommand),
    /// A command not modelled by this crate (extension modules, newer methods).
    Raw(RawCommand),
}

impl Command {
    /// Returns the wire method name, e.g. `browsingContext.navigate`.
    #[must_use]
    pub fn method(&self) -> String {
        match self {
            Self::Raw(raw) => raw.method.clone(),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|value| value.get("method").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// RawCommand
// ============================================================================

/// An untyped command: method name plus free-form params.
#[derive(Debug, Clone, Serialize)]
pub struct RawCommand {
    /// Method in `module.methodName` format.
    pub method: String,
    /// Parameters object.
    pub params: Value,
}

impl RawCommand {
    /// Creates a raw command.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
