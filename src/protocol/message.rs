//! Wire envelopes: command requests, responses and events.
//!
//! Every frame on the transport is one JSON object. The dispatch loop only
//! needs to know whether a frame is a response (it has an `id`) or an event
//! (`"type": "event"`); payloads stay as [`Value`] until a module decodes them.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, CommandId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "module.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Correlation id allocated by the correlator.
    pub id: CommandId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a request for an already allocated id.
    #[inline]
    #[must_use]
    pub fn new(id: CommandId, command: Command) -> Self {
        Self { id, command }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "type": "success", "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "type": "error", "error": "no such frame", "message": "..." }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Success or error outcome.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcome carried by a [`Response`], discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outcome {
    /// Successful response.
    Success {
        /// Command-specific result object.
        #[serde(default)]
        result: Value,
    },
    /// Error response.
    Error {
        /// Error code.
        error: String,
        /// Error message.
        #[serde(default)]
        message: String,
        /// Remote stack trace.
        #[serde(default)]
        stacktrace: Option<String>,
    },
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Extracts the result value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response was an error.
    pub fn into_result(self) -> Result<Value> {
        match self.outcome {
            Outcome::Success { result } => Ok(result),
            Outcome::Error {
                error,
                message,
                stacktrace,
            } => Err(Error::protocol(error, message, stacktrace)),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "method": "module.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the module name from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Returns the browsing context the event is scoped to, if any.
    ///
    /// Looks at `params.context` first and then at `params.source.context`
    /// (script and log events).
    #[must_use]
    pub fn context(&self) -> Option<BrowsingContextId> {
        self.params
            .get("context")
            .and_then(Value::as_str)
            .or_else(|| {
                self.params
                    .get("source")
                    .and_then(|source| source.get("context"))
                    .and_then(Value::as_str)
            })
            .map(BrowsingContextId::new)
    }
}

// ============================================================================
// Incoming
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Response to a command.
    Response(Response),
    /// Unsolicited event.
    Event(Event),
}

impl Incoming {
    /// Classifies a raw text frame.
    ///
    /// A frame with a numeric `id` is a response; a frame with
    /// `"type": "event"` is an event. Anything else is a decode error,
    /// including error frames whose `id` is null.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the frame cannot be classified.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::decode(format!("frame is not JSON: {e}")))?;

        if value.get("id").is_some_and(Value::is_u64) {
            let response = serde_json::from_value(value)
                .map_err(|e| Error::decode(format!("malformed response: {e}")))?;
            return Ok(Self::Response(response));
        }

        match value.get("type").and_then(Value::as_str) {
            Some("event") => {
                let event = serde_json::from_value(value)
                    .map_err(|e| Error::decode(format!("malformed event: {e}")))?;
                Ok(Self::Event(event))
            }
            Some("error") => {
                let code = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Err(Error::decode(format!(
                    "error frame without command id: {code}: {message}"
                )))
            }
            other => Err(Error::decode(format!(
                "unclassifiable frame with type {other:?}"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, RawCommand};
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let command = Command::Raw(RawCommand::new(
            "browsingContext.navigate",
            json!({ "context": "abc", "url": "https://example.com" }),
        ));

        let request = Request::new(CommandId::new(3), command);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["id"], 3);
        assert_eq!(value["method"], "browsingContext.navigate");
        assert_eq!(value["params"]["url"], "https://example.com");
    }

    #[test]
    fn test_success_response() {
        let json_str = r#"{"id": 5, "type": "success", "result": {"context": "abc"}}"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_success());
        assert_eq!(response.id, CommandId::new(5));

        let result = response.into_result().expect("should succeed");
        assert_eq!(result["context"], "abc");
    }

    #[test]
    fn test_error_response() {
        let json_str = r#"{
            "id": 6,
            "type": "error",
            "error": "no such frame",
            "message": "Browsing context not found",
            "stacktrace": "at foo"
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(!response.is_success());

        let err = response.into_result().expect_err("should fail");
        match err {
            Error::Protocol {
                code,
                message,
                stacktrace,
            } => {
                assert_eq!(code, "no such frame");
                assert_eq!(message, "Browsing context not found");
                assert_eq!(stacktrace.as_deref(), Some("at foo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_response_and_event() {
        let response = Incoming::parse(r#"{"id": 1, "type": "success", "result": {}}"#)
            .expect("classify");
        assert!(matches!(response, Incoming::Response(_)));

        let event = Incoming::parse(
            r#"{"type": "event", "method": "browsingContext.load", "params": {"context": "c1"}}"#,
        )
        .expect("classify");

        match event {
            Incoming::Event(event) => {
                assert_eq!(event.module(), "browsingContext");
                assert_eq!(event.event_name(), "load");
                assert_eq!(event.context(), Some(BrowsingContextId::new("c1")));
            }
            Incoming::Response(_) => panic!("expected event"),
        }
    }

    #[test]
    fn test_classify_rejects_garbage() {
        assert!(matches!(
            Incoming::parse("not json"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            Incoming::parse(r#"{"type": "error", "id": null, "error": "invalid argument"}"#),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            Incoming::parse(r#"{"type": "mystery"}"#),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_event_context_from_source() {
        let event = Event::new(
            "log.entryAdded",
            json!({ "source": { "realm": "r1", "context": "c9" } }),
        );
        assert_eq!(event.context(), Some(BrowsingContextId::new("c9")));

        let unscoped = Event::new("browser.userContextCreated", json!({}));
        assert_eq!(unscoped.context(), None);
    }
}
