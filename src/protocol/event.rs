//! Typed event decoding.
//!
//! The dispatch loop routes raw [`Event`]s by method name. Subscribers that
//! want typed payloads call [`Event::parse`], which maps known methods onto
//! [`ParsedEvent`] and leaves everything else as [`ParsedEvent::Unknown`].
//!
//! # Event Types
//!
//! | Module | Events |
//! |--------|--------|
//! | `browsingContext` | `contextCreated`, `contextDestroyed`, `navigationStarted`, `fragmentNavigated`, `domContentLoaded`, `load`, `downloadWillBegin`, `navigationAborted`, `navigationFailed`, `userPromptOpened`, `userPromptClosed` |
//! | `network` | `beforeRequestSent`, `responseStarted`, `responseCompleted`, `authRequired`, `fetchError` |
//! | `script` | `message`, `realmCreated`, `realmDestroyed` |
//! | `log` | `entryAdded` |

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

use super::browsing_context::{
    BrowsingContextInfo, DownloadWillBegin, NavigationInfo, UserPromptClosed, UserPromptOpened,
};
use super::log::LogEntry;
use super::message::Event;
use super::network::{BeforeRequestSent, FetchError, ResponseEvent};
use super::script::{RealmDestroyed, RealmInfo, ScriptMessage};

// ============================================================================
// Event Names
// ============================================================================

/// Wire names of the events this crate decodes.
pub mod names {
    /// `browsingContext.contextCreated`
    pub const CONTEXT_CREATED: &str = "browsingContext.contextCreated";
    /// `browsingContext.contextDestroyed`
    pub const CONTEXT_DESTROYED: &str = "browsingContext.contextDestroyed";
    /// `browsingContext.navigationStarted`
    pub const NAVIGATION_STARTED: &str = "browsingContext.navigationStarted";
    /// `browsingContext.fragmentNavigated`
    pub const FRAGMENT_NAVIGATED: &str = "browsingContext.fragmentNavigated";
    /// `browsingContext.domContentLoaded`
    pub const DOM_CONTENT_LOADED: &str = "browsingContext.domContentLoaded";
    /// `browsingContext.load`
    pub const LOAD: &str = "browsingContext.load";
    /// `browsingContext.downloadWillBegin`
    pub const DOWNLOAD_WILL_BEGIN: &str = "browsingContext.downloadWillBegin";
    /// `browsingContext.navigationAborted`
    pub const NAVIGATION_ABORTED: &str = "browsingContext.navigationAborted";
    /// `browsingContext.navigationFailed`
    pub const NAVIGATION_FAILED: &str = "browsingContext.navigationFailed";
    /// `browsingContext.userPromptOpened`
    pub const USER_PROMPT_OPENED: &str = "browsingContext.userPromptOpened";
    /// `browsingContext.userPromptClosed`
    pub const USER_PROMPT_CLOSED: &str = "browsingContext.userPromptClosed";

    /// `network.beforeRequestSent`
    pub const BEFORE_REQUEST_SENT: &str = "network.beforeRequestSent";
    /// `network.responseStarted`
    pub const RESPONSE_STARTED: &str = "network.responseStarted";
    /// `network.responseCompleted`
    pub const RESPONSE_COMPLETED: &str = "network.responseCompleted";
    /// `network.authRequired`
    pub const AUTH_REQUIRED: &str = "network.authRequired";
    /// `network.fetchError`
    pub const FETCH_ERROR: &str = "network.fetchError";

    /// `script.message`
    pub const SCRIPT_MESSAGE: &str = "script.message";
    /// `script.realmCreated`
    pub const REALM_CREATED: &str = "script.realmCreated";
    /// `script.realmDestroyed`
    pub const REALM_DESTROYED: &str = "script.realmDestroyed";

    /// `log.entryAdded`
    pub const LOG_ENTRY_ADDED: &str = "log.entryAdded";
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed event payloads.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// A browsing context was created.
    ContextCreated(BrowsingContextInfo),
    /// A browsing context was destroyed.
    ContextDestroyed(BrowsingContextInfo),
    /// A navigation started.
    NavigationStarted(NavigationInfo),
    /// A same-document navigation happened.
    FragmentNavigated(NavigationInfo),
    /// `DOMContentLoaded` fired.
    DomContentLoaded(NavigationInfo),
    /// `load` fired.
    Load(NavigationInfo),
    /// A download is about to start.
    DownloadWillBegin(DownloadWillBegin),
    /// A navigation was aborted.
    NavigationAborted(NavigationInfo),
    /// A navigation failed.
    NavigationFailed(NavigationInfo),
    /// A user prompt opened.
    UserPromptOpened(UserPromptOpened),
    /// A user prompt closed.
    UserPromptClosed(UserPromptClosed),

    /// A request is about to be sent.
    BeforeRequestSent(BeforeRequestSent),
    /// Response headers arrived.
    ResponseStarted(ResponseEvent),
    /// A response completed.
    ResponseCompleted(ResponseEvent),
    /// An auth challenge arrived.
    AuthRequired(ResponseEvent),
    /// A request failed.
    FetchError(FetchError),

    /// A script posted to a channel.
    ScriptMessage(ScriptMessage),
    /// A realm was created.
    RealmCreated(RealmInfo),
    /// A realm was destroyed.
    RealmDestroyed(RealmDestroyed),

    /// A log entry was added.
    LogEntryAdded(LogEntry),

    /// An event this crate does not model.
    Unknown(Event),
}

impl Event {
    /// Decodes the params into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a known event has malformed params.
    pub fn parse(&self) -> Result<ParsedEvent> {
        use names::*;

        let parsed = match self.method.as_str() {
            CONTEXT_CREATED => ParsedEvent::ContextCreated(self.decode()?),
            CONTEXT_DESTROYED => ParsedEvent::ContextDestroyed(self.decode()?),
            NAVIGATION_STARTED => ParsedEvent::NavigationStarted(self.decode()?),
            FRAGMENT_NAVIGATED => ParsedEvent::FragmentNavigated(self.decode()?),
            DOM_CONTENT_LOADED => ParsedEvent::DomContentLoaded(self.decode()?),
            LOAD => ParsedEvent::Load(self.decode()?),
            DOWNLOAD_WILL_BEGIN => ParsedEvent::DownloadWillBegin(self.decode()?),
            NAVIGATION_ABORTED => ParsedEvent::NavigationAborted(self.decode()?),
            NAVIGATION_FAILED => ParsedEvent::NavigationFailed(self.decode()?),
            USER_PROMPT_OPENED => ParsedEvent::UserPromptOpened(self.decode()?),
            USER_PROMPT_CLOSED => ParsedEvent::UserPromptClosed(self.decode()?),

            BEFORE_REQUEST_SENT => ParsedEvent::BeforeRequestSent(self.decode()?),
            RESPONSE_STARTED => ParsedEvent::ResponseStarted(self.decode()?),
            RESPONSE_COMPLETED => ParsedEvent::ResponseCompleted(self.decode()?),
            AUTH_REQUIRED => ParsedEvent::AuthRequired(self.decode()?),
            FETCH_ERROR => ParsedEvent::FetchError(self.decode()?),

            SCRIPT_MESSAGE => ParsedEvent::ScriptMessage(self.decode()?),
            REALM_CREATED => ParsedEvent::RealmCreated(self.decode()?),
            REALM_DESTROYED => ParsedEvent::RealmDestroyed(self.decode()?),

            LOG_ENTRY_ADDED => ParsedEvent::LogEntryAdded(self.decode()?),

            _ => ParsedEvent::Unknown(self.clone()),
        };

        Ok(parsed)
    }

    /// Decodes the params into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming the event if the params do not match.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.params)
            .map_err(|e| Error::decode(format!("{}: {e}", self.method)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{BrowsingContextId, RealmId};
    use serde_json::json;

    #[test]
    fn test_load_event_parsing() {
        let event = Event::new(
            names::LOAD,
            json!({ "context": "c1", "navigation": "n1", "timestamp": 5, "url": "https://example.com" }),
        );

        match event.parse().expect("parse") {
            ParsedEvent::Load(info) => {
                assert_eq!(info.context, BrowsingContextId::new("c1"));
                assert_eq!(info.url, "https://example.com");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_realm_created_parsing() {
        let event = Event::new(
            names::REALM_CREATED,
            json!({ "realm": "r1", "origin": "null", "type": "dedicated-worker" }),
        );

        match event.parse().expect("parse") {
            ParsedEvent::RealmCreated(info) => assert_eq!(info.realm, RealmId::new("r1")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_known_event_is_decode_error() {
        let event = Event::new(names::LOAD, json!({ "context": 42 }));
        let err = event.parse().expect_err("should fail");
        assert!(matches!(err, Error::Decode { ref message } if message.starts_with(names::LOAD)));
    }

    #[test]
    fn test_unknown_event() {
        let event = Event::new("custom.unknownEvent", json!({ "foo": "bar" }));
        match event.parse().expect("parse") {
            ParsedEvent::Unknown(raw) => assert_eq!(raw.method, "custom.unknownEvent"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }
}
