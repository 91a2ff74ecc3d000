//! Session lifecycle state.

use std::fmt;

/// Lifecycle of a session.
///
/// Transitions only move forward: `Connecting → Open → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Transport is being established.
    Connecting,
    /// Commands and subscriptions are accepted.
    Open,
    /// Teardown in progress; only cleanup commands are sent.
    Closing,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Returns `true` if commands and subscriptions are accepted.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    /// Returns `true` once teardown has started.
    #[inline]
    #[must_use]
    pub fn is_closing_or_closed(self) -> bool {
        self >= Self::Closing
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_matches_lifecycle() {
        assert!(SessionState::Connecting < SessionState::Open);
        assert!(SessionState::Closing.is_closing_or_closed());
        assert!(!SessionState::Open.is_closing_or_closed());
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
