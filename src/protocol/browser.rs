//! `browser` module payloads.

use serde::{Deserialize, Serialize};

use crate::identifiers::{ClientWindowId, UserContextId};

// ============================================================================
// Commands
// ============================================================================

/// Browser module commands for user contexts and client windows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowserCommand {
    /// Close the browser and end every session.
    #[serde(rename = "browser.close")]
    Close {},

    /// Create a new user context.
    #[serde(rename = "browser.createUserContext")]
    CreateUserContext {},

    /// List user contexts.
    #[serde(rename = "browser.getUserContexts")]
    GetUserContexts {},

    /// Remove a user context and close its browsing contexts.
    #[serde(rename = "browser.removeUserContext")]
    RemoveUserContext {
        /// User context to remove.
        #[serde(rename = "userContext")]
        user_context: UserContextId,
    },

    /// List client windows.
    #[serde(rename = "browser.getClientWindows")]
    GetClientWindows {},
}

// ============================================================================
// Types
// ============================================================================

/// One entry of a user context list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserContextInfo {
    /// User context id.
    #[serde(rename = "userContext")]
    pub user_context: UserContextId,
}

/// Result of `browser.getUserContexts`, unwrapped by the module proxy.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetUserContextsResult {
    #[serde(rename = "userContexts")]
    pub user_contexts: Vec<UserContextInfo>,
}

/// Client window display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientWindowState {
    /// Fullscreen.
    Fullscreen,
    /// Maximized.
    Maximized,
    /// Minimized.
    Minimized,
    /// Normal.
    Normal,
}

/// Client window information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientWindowInfo {
    /// Whether the window has focus.
    pub active: bool,
    /// Window id.
    #[serde(rename = "clientWindow")]
    pub client_window: ClientWindowId,
    /// Display state.
    pub state: ClientWindowState,
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
    /// Screen x position.
    pub x: i32,
    /// Screen y position.
    pub y: i32,
}

/// Result of `browser.getClientWindows`, unwrapped by the module proxy.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetClientWindowsResult {
    #[serde(rename = "clientWindows")]
    pub client_windows: Vec<ClientWindowInfo>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_contexts_result() {
        let result: GetUserContextsResult = serde_json::from_value(json!({
            "userContexts": [{ "userContext": "default" }, { "userContext": "uc-2" }]
        }))
        .expect("parse");

        let ids: Vec<_> = result
            .user_contexts
            .into_iter()
            .map(|info| info.user_context)
            .collect();
        assert_eq!(ids, vec![UserContextId::new("default"), UserContextId::new("uc-2")]);
    }

    #[test]
    fn test_client_window_state_rejects_unknown() {
        let result = serde_json::from_value::<ClientWindowState>(json!("floating"));
        assert!(result.is_err());
    }
}
