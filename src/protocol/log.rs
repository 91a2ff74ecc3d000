//! `log` module payloads.
//!
//! Unlike the other tagged unions in this crate, [`LogEntry`] accepts unknown
//! `type` tags: the protocol defines a generic entry shape that new entry
//! kinds share, so they decode as [`LogEntry::Generic`].

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::script::{RemoteValue, Source, StackTrace};

// ============================================================================
// Types
// ============================================================================

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

/// Fields every log entry carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseLogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Realm and context that logged.
    pub source: Source,
    /// Rendered text.
    #[serde(default)]
    pub text: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Stack at the log call.
    #[serde(rename = "stackTrace", default)]
    pub stack_trace: Option<StackTrace>,
}

/// A `log.entryAdded` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// `console.*` call.
    Console {
        /// Common fields.
        base: BaseLogEntry,
        /// Console method, e.g. `log` or `warn`.
        method: String,
        /// Serialized arguments.
        args: Vec<RemoteValue>,
    },
    /// Uncaught JavaScript error.
    Javascript {
        /// Common fields.
        base: BaseLogEntry,
    },
    /// Any other entry type.
    Generic {
        /// The `type` tag as received.
        entry_type: String,
        /// Common fields.
        base: BaseLogEntry,
    },
}

impl LogEntry {
    /// Returns the common fields.
    #[must_use]
    pub fn base(&self) -> &BaseLogEntry {
        match self {
            Self::Console { base, .. } | Self::Javascript { base } | Self::Generic { base, .. } => {
                base
            }
        }
    }

    /// Returns the rendered text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.base().text.as_deref()
    }

    /// Returns the severity.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.base().level
    }
}

#[derive(Deserialize)]
struct ConsoleFields {
    method: String,
    #[serde(default)]
    args: Vec<RemoteValue>,
}

impl<'de> Deserialize<'de> for LogEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let entry_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("type"))?
            .to_owned();

        let base = BaseLogEntry::deserialize(&value).map_err(de::Error::custom)?;

        match entry_type.as_str() {
            "console" => {
                let fields = ConsoleFields::deserialize(&value).map_err(de::Error::custom)?;
                Ok(Self::Console {
                    base,
                    method: fields.method,
                    args: fields.args,
                })
            }
            "javascript" => Ok(Self::Javascript { base }),
            _ => Ok(Self::Generic { entry_type, base }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::BrowsingContextId;
    use serde_json::json;

    fn base_json(entry_type: &str) -> Value {
        json!({
            "type": entry_type,
            "level": "info",
            "source": { "realm": "r1", "context": "c1" },
            "text": "hello",
            "timestamp": 42
        })
    }

    #[test]
    fn test_console_entry() {
        let mut raw = base_json("console");
        raw["method"] = json!("log");
        raw["args"] = json!([{ "type": "string", "value": "hello" }]);

        let entry: LogEntry = serde_json::from_value(raw).expect("parse");
        match entry {
            LogEntry::Console { method, args, base } => {
                assert_eq!(method, "log");
                assert_eq!(args[0].as_str(), Some("hello"));
                assert_eq!(base.source.context, Some(BrowsingContextId::new("c1")));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_javascript_entry() {
        let mut raw = base_json("javascript");
        raw["level"] = json!("error");
        let entry: LogEntry = serde_json::from_value(raw).expect("parse");
        assert!(matches!(entry, LogEntry::Javascript { .. }));
        assert_eq!(entry.level(), LogLevel::Error);
    }

    #[test]
    fn test_unknown_type_is_generic() {
        let entry: LogEntry = serde_json::from_value(base_json("worker")).expect("parse");
        match entry {
            LogEntry::Generic { entry_type, .. } => assert_eq!(entry_type, "worker"),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_missing_type_is_error() {
        let mut raw = base_json("console");
        raw.as_object_mut().expect("object").remove("type");
        assert!(serde_json::from_value::<LogEntry>(raw).is_err());
    }
}
