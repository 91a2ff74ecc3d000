//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Assigned by | Wire form |
//! |------|-------------|-----------|
//! | [`CommandId`] | local end | unsigned integer |
//! | [`BrowsingContextId`] | remote end | string |
//! | [`InterceptId`] | remote end | string |
//! | [`RequestId`] | remote end | string |
//! | [`SubscriptionId`] | remote end | string |
//! | [`UserContextId`] | remote end | string |
//! | [`RealmId`] | remote end | string |
//! | [`PreloadScriptId`] | remote end | string |
//! | [`NavigationId`] | remote end | string |
//! | [`SharedId`] | remote end | string |
//! | [`ClientWindowId`] | remote end | string |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier of a command sent by the local end.
///
/// Allocated from a per-session counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates a command id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// String Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates an identifier from a string.
            #[inline]
            #[must_use]
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }
    };
}

string_id!(
    /// Browsing context (tab, window or frame) identifier.
    BrowsingContextId
);

string_id!(
    /// Network intercept identifier assigned by `network.addIntercept`.
    InterceptId
);

string_id!(
    /// Network request identifier, stable across redirects of one request.
    RequestId
);

string_id!(
    /// Remote subscription identifier returned by `session.subscribe`.
    SubscriptionId
);

string_id!(
    /// User context (profile partition) identifier.
    UserContextId
);

string_id!(
    /// Script realm identifier.
    RealmId
);

string_id!(
    /// Preload script identifier.
    PreloadScriptId
);

string_id!(
    /// Navigation identifier.
    NavigationId
);

string_id!(
    /// Shared reference to a DOM node, valid across realms.
    SharedId
);

string_id!(
    /// Client (OS-level) window identifier.
    ClientWindowId
);

// ============================================================================
// Tests
// ============================================================================
