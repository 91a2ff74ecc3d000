//! Network interception.
//!
//! An intercept pauses matching requests in the browser until a handler
//! decides what happens to them.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | Live intercepts, blocked-event routing, teardown |
//! | `request` | [`InterceptedRequest`] and its terminal actions |
//! | `pattern` | Local URL pattern matching |
//!
//! # Example
//!
//! ```ignore
//! use bidi_webdriver::network::InterceptPhase;
//! use bidi_webdriver::protocol::network::AddInterceptParameters;
//!
//! let params = AddInterceptParameters::new(vec![InterceptPhase::BeforeRequestSent]);
//! let intercept = session
//!     .add_intercept(params, |request| async move {
//!         if request.url().ends_with(".png") {
//!             request.fail_request().await
//!         } else {
//!             request.continue_request().await
//!         }
//!     })
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::{Error, Result};
use crate::identifiers::{InterceptId, RequestId};

// ============================================================================
// Submodules
// ============================================================================

pub(crate) mod pattern;
pub mod registry;
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use crate::protocol::network::InterceptPhase;
pub use registry::InterceptRegistry;
pub use request::{InterceptedRequest, PausedEvent};

// ============================================================================
// InterceptHandler
// ============================================================================

/// Handler invoked once per paused request.
pub type InterceptHandler =
    Arc<dyn Fn(InterceptedRequest) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Boxes an async closure into an [`InterceptHandler`].
pub fn intercept_handler<F, Fut>(handler: F) -> InterceptHandler
where
    F: Fn(InterceptedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |request| handler(request).boxed())
}

// ============================================================================
// InterceptFault
// ============================================================================

/// An intercept handler failed without resolving its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptFault {
    /// Intercept whose handler failed.
    pub intercept: InterceptId,
    /// Request that was force-failed.
    pub request: RequestId,
    /// Phase the request was paused in.
    pub phase: InterceptPhase,
    /// Handler error or panic message.
    pub message: String,
}

impl InterceptFault {
    /// Converts the fault into an [`Error::InterceptHandlerFault`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::intercept_handler_fault(self.request, self.message)
    }
}
