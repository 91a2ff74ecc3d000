//! `session` module payloads.

use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContextId, SubscriptionId, UserContextId};

// ============================================================================
// Commands
// ============================================================================

/// Session module commands for status and event subscriptions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum SessionCommand {
    /// Query whether the remote end can create new sessions.
    #[serde(rename = "session.status")]
    Status {},

    /// Enable events on the remote end.
    #[serde(rename = "session.subscribe")]
    Subscribe(SubscribeParameters),

    /// Disable events on the remote end.
    #[serde(rename = "session.unsubscribe")]
    Unsubscribe(UnsubscribeParameters),

    /// End the session.
    #[serde(rename = "session.end")]
    End {},
}

/// Parameters for `session.subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubscribeParameters {
    /// Event names or module names.
    pub events: Vec<String>,

    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,

    /// Restrict to these user contexts.
    #[serde(rename = "userContexts", skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
}

/// Parameters for `session.unsubscribe`.
///
/// Either by subscription id or by the legacy event/context attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnsubscribeParameters {
    /// Remove subscriptions by id.
    ById {
        /// Subscription ids returned by `session.subscribe`.
        subscriptions: Vec<SubscriptionId>,
    },
    /// Remove by event names and contexts.
    ByAttributes {
        /// Event names or module names.
        events: Vec<String>,
        /// Contexts the subscription was scoped to.
        #[serde(skip_serializing_if = "Option::is_none")]
        contexts: Option<Vec<BrowsingContextId>>,
    },
}

// ============================================================================
// Results
// ============================================================================

/// Result of `session.status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStatus {
    /// Whether a new session could be created.
    pub ready: bool,
    /// Implementation-defined message.
    #[serde(default)]
    pub message: String,
}

/// Result of `session.subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubscribeResult {
    /// Subscription id; absent on remote ends implementing the older
    /// attribute-based unsubscribe only.
    #[serde(default)]
    pub subscription: Option<SubscriptionId>,
}

// ============================================================================
// Tests
// ============================================================================
