//! Event subscription fabric.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `router` | Local subscriber registry and per-subscription workers |
//! | `subscription` | Local handlers paired with remote `session.subscribe` |

// ============================================================================
// Submodules
// ============================================================================

/// Local subscriber registry.
pub mod router;

/// Remote-aware subscriptions.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use router::{EventHandler, EventRouter, SubscriptionToken};
pub use subscription::Subscription;
