//! Paused request handles.
//!
//! An [`InterceptedRequest`] is handed to the intercept handler for one
//! request paused in one phase. The browser does not move on until exactly
//! one terminal action reaches it.
//!
//! A terminal action the browser rejects, or that times out, leaves the
//! request paused: the handle accepts another action, and if the handler
//! finishes without one getting through the registry fails the request.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, InterceptId, RequestId};
use crate::protocol::network::{
    AuthAction, AuthCredentials, BeforeRequestSent, ContinueRequestParameters,
    ContinueResponseParameters, ContinueWithAuthParameters, NetworkEventBase,
    ProvideResponseParameters, RequestData, ResponseData, ResponseEvent,
};
use crate::protocol::{Command, NetworkCommand};
use crate::transport::Connection;

use super::InterceptPhase;

// ============================================================================
// Constants
// ============================================================================

const PAUSED: u8 = 0;
const RESOLVED: u8 = 1;
const ABORTED: u8 = 2;
/// A terminal action was sent but never took effect.
const UNDELIVERED: u8 = 3;

// ============================================================================
// PausedEvent
// ============================================================================

/// Event that paused a request.
#[derive(Debug, Clone)]
pub enum PausedEvent {
    /// Paused before the request was sent.
    Request(BeforeRequestSent),
    /// Paused on response headers or an auth challenge.
    Response(ResponseEvent),
}

impl PausedEvent {
    /// Returns the fields common to every network event.
    #[must_use]
    pub fn base(&self) -> &NetworkEventBase {
        match self {
            Self::Request(event) => &event.base,
            Self::Response(event) => &event.base,
        }
    }
}

// ============================================================================
// InterceptedRequest
// ============================================================================

/// A request paused by an intercept.
///
/// Clones share resolution state: a terminal action on any clone resolves
/// them all.
#[derive(Clone)]
pub struct InterceptedRequest {
    inner: Arc<RequestInner>,
}

struct RequestInner {
    intercept: InterceptId,
    phase: InterceptPhase,
    event: PausedEvent,
    state: AtomicU8,
    /// Why the last terminal action did not take effect.
    undelivered: Mutex<Option<String>>,
    connection: Connection,
}

impl fmt::Debug for InterceptedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedRequest")
            .field("request", self.request_id())
            .field("intercept", &self.inner.intercept)
            .field("phase", &self.inner.phase)
            .field("url", &self.url())
            .finish()
    }
}

impl InterceptedRequest {
    pub(crate) fn new(
        intercept: InterceptId,
        phase: InterceptPhase,
        event: PausedEvent,
        connection: Connection,
    ) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                intercept,
                phase,
                event,
                state: AtomicU8::new(PAUSED),
                undelivered: Mutex::new(None),
                connection,
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Request id.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.inner.event.base().request.request
    }

    /// Intercept whose handler received this request.
    #[inline]
    #[must_use]
    pub fn intercept_id(&self) -> &InterceptId {
        &self.inner.intercept
    }

    /// Phase the request is paused in.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> InterceptPhase {
        self.inner.phase
    }

    /// Request URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.event.base().request.url
    }

    /// HTTP method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.inner.event.base().request.method
    }

    /// Full request data.
    #[inline]
    #[must_use]
    pub fn request(&self) -> &RequestData {
        &self.inner.event.base().request
    }

    /// Response data, in the response and auth phases.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseData> {
        match &self.inner.event {
            PausedEvent::Request(_) => None,
            PausedEvent::Response(event) => Some(&event.response),
        }
    }

    /// Originating browsing context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&BrowsingContextId> {
        self.inner.event.base().context.as_ref()
    }

    /// The event that paused the request.
    #[inline]
    #[must_use]
    pub fn event(&self) -> &PausedEvent {
        &self.inner.event
    }

    /// Returns `true` while the browser still waits for a decision.
    ///
    /// That is until a terminal action is delivered or the session closes.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.inner.state.load(Ordering::Acquire), PAUSED | UNDELIVERED)
    }

    // ========================================================================
    // Terminal Actions
    // ========================================================================

    /// Lets the request proceed unmodified.
    ///
    /// # Errors
    ///
    /// See [`InterceptedRequest::continue_request_with`].
    pub async fn continue_request(&self) -> Result<()> {
        self.continue_request_with(ContinueRequestParameters::new(self.request_id().clone()))
            .await
    }

    /// Lets the request proceed with modifications.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] outside `beforeRequestSent`, or if
    ///   `params.request` names another request
    /// - [`Error::DoubleResolution`] if already resolved
    /// - [`Error::SessionClosed`] if the session closed while paused
    /// - the command's own error; the request then stays paused
    pub async fn continue_request_with(&self, params: ContinueRequestParameters) -> Result<()> {
        self.check_phase("continue_request", &[InterceptPhase::BeforeRequestSent])?;
        self.check_request(&params.request)?;
        self.resolve(NetworkCommand::ContinueRequest(params)).await
    }

    /// Lets the response proceed unmodified.
    ///
    /// # Errors
    ///
    /// See [`InterceptedRequest::continue_response_with`].
    pub async fn continue_response(&self) -> Result<()> {
        self.continue_response_with(ContinueResponseParameters::new(self.request_id().clone()))
            .await
    }

    /// Lets the response proceed with modifications.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] outside `responseStarted`/`authRequired`
    /// - [`Error::DoubleResolution`] if already resolved
    /// - [`Error::SessionClosed`] if the session closed while paused
    /// - the command's own error; the request then stays paused
    pub async fn continue_response_with(&self, params: ContinueResponseParameters) -> Result<()> {
        self.check_phase(
            "continue_response",
            &[InterceptPhase::ResponseStarted, InterceptPhase::AuthRequired],
        )?;
        self.check_request(&params.request)?;
        self.resolve(NetworkCommand::ContinueResponse(params)).await
    }

    /// Fails the request with a network error.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] in `authRequired` (use
    ///   [`InterceptedRequest::cancel_auth`])
    /// - [`Error::DoubleResolution`] if already resolved
    /// - [`Error::SessionClosed`] if the session closed while paused
    /// - the command's own error; the request then stays paused
    pub async fn fail_request(&self) -> Result<()> {
        self.check_phase(
            "fail_request",
            &[InterceptPhase::BeforeRequestSent, InterceptPhase::ResponseStarted],
        )?;
        self.resolve(NetworkCommand::FailRequest {
            request: self.request_id().clone(),
        })
        .await
    }

    /// Completes the request with a synthetic response.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `params.request` names another request
    /// - [`Error::DoubleResolution`] if already resolved
    /// - [`Error::SessionClosed`] if the session closed while paused
    /// - the command's own error; the request then stays paused
    pub async fn provide_response(&self, params: ProvideResponseParameters) -> Result<()> {
        self.check_request(&params.request)?;
        self.resolve(NetworkCommand::ProvideResponse(params)).await
    }

    /// Answers the auth challenge with credentials.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] outside `authRequired`
    /// - [`Error::DoubleResolution`] if already resolved
    /// - [`Error::SessionClosed`] if the session closed while paused
    /// - the command's own error; the request then stays paused
    pub async fn continue_with_auth(&self, credentials: AuthCredentials) -> Result<()> {
        self.auth(AuthAction::ProvideCredentials { credentials }).await
    }

    /// Cancels the auth challenge.
    ///
    /// # Errors
    ///
    /// As [`InterceptedRequest::continue_with_auth`].
    pub async fn cancel_auth(&self) -> Result<()> {
        self.auth(AuthAction::Cancel).await
    }

    /// Lets the browser handle the auth challenge.
    ///
    /// # Errors
    ///
    /// As [`InterceptedRequest::continue_with_auth`].
    pub async fn default_auth(&self) -> Result<()> {
        self.auth(AuthAction::Default).await
    }

    async fn auth(&self, action: AuthAction) -> Result<()> {
        self.check_phase("continue_with_auth", &[InterceptPhase::AuthRequired])?;
        self.resolve(NetworkCommand::ContinueWithAuth(ContinueWithAuthParameters {
            request: self.request_id().clone(),
            action,
        }))
        .await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_phase(&self, action: &str, allowed: &[InterceptPhase]) -> Result<()> {
        if allowed.contains(&self.inner.phase) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "{action} is not allowed in phase {:?}",
                self.inner.phase
            )))
        }
    }

    fn check_request(&self, request: &RequestId) -> Result<()> {
        if request == self.request_id() {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "parameters name request {request}, handle is for {}",
                self.request_id()
            )))
        }
    }

    /// Claims the single resolution slot.
    fn claim(&self) -> Result<()> {
        let mut current = self.inner.state.load(Ordering::Acquire);
        loop {
            match current {
                PAUSED | UNDELIVERED => {}
                ABORTED => return Err(Error::SessionClosed),
                _ => return Err(Error::double_resolution(self.request_id().clone())),
            }
            match self.inner.state.compare_exchange_weak(
                current,
                RESOLVED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    async fn resolve(&self, command: NetworkCommand) -> Result<()> {
        self.claim()?;
        debug!(request = %self.request_id(), phase = ?self.inner.phase, "Resolving paused request");

        let result = self.inner.connection.send(Command::Network(command)).await;
        if let Err(e) = &result {
            *self.inner.undelivered.lock() = Some(e.to_string());
            let _ = self.inner.state.compare_exchange(
                RESOLVED,
                UNDELIVERED,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            debug!(request = %self.request_id(), error = %e, "Terminal action not delivered");
        }
        result.map(|_| ())
    }

    /// Returns why the last terminal action failed, if the request is still
    /// paused because of it.
    pub(crate) fn undelivered(&self) -> Option<String> {
        if self.inner.state.load(Ordering::Acquire) == UNDELIVERED {
            self.inner.undelivered.lock().clone()
        } else {
            None
        }
    }

    /// Sends the phase's pass-through action if still paused.
    pub(crate) async fn resolve_default(&self) -> Result<()> {
        self.resolve(pass_command(self.inner.phase, self.request_id().clone()))
            .await
    }

    /// Sends the phase's failing action if still paused.
    pub(crate) async fn force_fail(&self) -> Result<()> {
        self.resolve(fail_command(self.inner.phase, self.request_id().clone()))
            .await
    }

    /// Marks the request aborted by session teardown.
    ///
    /// Returns the failing command to send if the request was still paused.
    pub(crate) fn abort(&self) -> Option<Command> {
        let mut current = self.inner.state.load(Ordering::Acquire);
        while matches!(current, PAUSED | UNDELIVERED) {
            match self.inner.state.compare_exchange_weak(
                current,
                ABORTED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(Command::Network(fail_command(
                        self.inner.phase,
                        self.request_id().clone(),
                    )));
                }
                Err(actual) => current = actual,
            }
        }
        None
    }
}

/// Command that lets a request paused in `phase` proceed unmodified.
pub(super) fn pass_command(phase: InterceptPhase, request: RequestId) -> NetworkCommand {
    match phase {
        InterceptPhase::BeforeRequestSent => {
            NetworkCommand::ContinueRequest(ContinueRequestParameters::new(request))
        }
        InterceptPhase::ResponseStarted => {
            NetworkCommand::ContinueResponse(ContinueResponseParameters::new(request))
        }
        InterceptPhase::AuthRequired => {
            NetworkCommand::ContinueWithAuth(ContinueWithAuthParameters {
                request,
                action: AuthAction::Default,
            })
        }
    }
}

/// Command that fails a request paused in `phase`.
pub(super) fn fail_command(phase: InterceptPhase, request: RequestId) -> NetworkCommand {
    match phase {
        InterceptPhase::AuthRequired => {
            NetworkCommand::ContinueWithAuth(ContinueWithAuthParameters {
                request,
                action: AuthAction::Cancel,
            })
        }
        InterceptPhase::BeforeRequestSent | InterceptPhase::ResponseStarted => {
            NetworkCommand::FailRequest { request }
        }
    }
}
