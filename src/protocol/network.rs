//! `network` module payloads.
//!
//! Blocked network events (`isBlocked == true`) carry the ids of the
//! intercepts that paused them; the interception registry decodes those
//! events into the structs below.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, InterceptId, NavigationId, RequestId};

// ============================================================================
// Commands
// ============================================================================

/// Network module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum NetworkCommand {
    /// Register an intercept.
    #[serde(rename = "network.addIntercept")]
    AddIntercept(AddInterceptParameters),

    /// Remove an intercept.
    #[serde(rename = "network.removeIntercept")]
    RemoveIntercept {
        /// Intercept id.
        intercept: InterceptId,
    },

    /// Resume a request paused in `beforeRequestSent`.
    #[serde(rename = "network.continueRequest")]
    ContinueRequest(ContinueRequestParameters),

    /// Resume a request paused in `responseStarted` or `authRequired`.
    #[serde(rename = "network.continueResponse")]
    ContinueResponse(ContinueResponseParameters),

    /// Answer an authentication challenge.
    #[serde(rename = "network.continueWithAuth")]
    ContinueWithAuth(ContinueWithAuthParameters),

    /// Fail a paused request with a network error.
    #[serde(rename = "network.failRequest")]
    FailRequest {
        /// Paused request.
        request: RequestId,
    },

    /// Complete a paused request with a synthetic response.
    #[serde(rename = "network.provideResponse")]
    ProvideResponse(ProvideResponseParameters),

    /// Enable or bypass the network cache.
    #[serde(rename = "network.setCacheBehavior")]
    SetCacheBehavior {
        /// Cache mode.
        #[serde(rename = "cacheBehavior")]
        cache_behavior: CacheBehavior,
        /// Restrict to these top-level contexts.
        #[serde(skip_serializing_if = "Option::is_none")]
        contexts: Option<Vec<BrowsingContextId>>,
    },
}

// ============================================================================
// Command Parameters
// ============================================================================

/// Network phase at which an intercept pauses requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterceptPhase {
    /// Before the request is sent.
    BeforeRequestSent,
    /// After response headers arrive.
    ResponseStarted,
    /// On an authentication challenge.
    AuthRequired,
}

impl InterceptPhase {
    /// Returns the event name this phase pauses on.
    #[must_use]
    pub const fn event_method(self) -> &'static str {
        match self {
            Self::BeforeRequestSent => "network.beforeRequestSent",
            Self::ResponseStarted => "network.responseStarted",
            Self::AuthRequired => "network.authRequired",
        }
    }

    /// Maps an event name back to its phase.
    #[must_use]
    pub fn from_event_method(method: &str) -> Option<Self> {
        match method {
            "network.beforeRequestSent" => Some(Self::BeforeRequestSent),
            "network.responseStarted" => Some(Self::ResponseStarted),
            "network.authRequired" => Some(Self::AuthRequired),
            _ => None,
        }
    }
}

/// Parameters for `network.addIntercept`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddInterceptParameters {
    /// Phases to pause in; must not be empty.
    pub phases: Vec<InterceptPhase>,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
    /// Match only these URLs.
    #[serde(rename = "urlPatterns", skip_serializing_if = "Option::is_none")]
    pub url_patterns: Option<Vec<UrlPattern>>,
}

impl AddInterceptParameters {
    /// Intercepts every request in the given phases.
    #[inline]
    #[must_use]
    pub fn new(phases: Vec<InterceptPhase>) -> Self {
        Self {
            phases,
            contexts: None,
            url_patterns: None,
        }
    }

    /// Restricts the intercept to URL patterns.
    #[inline]
    #[must_use]
    pub fn with_url_patterns(mut self, patterns: Vec<UrlPattern>) -> Self {
        self.url_patterns = Some(patterns);
        self
    }

    /// Restricts the intercept to contexts.
    #[inline]
    #[must_use]
    pub fn with_contexts(mut self, contexts: Vec<BrowsingContextId>) -> Self {
        self.contexts = Some(contexts);
        self
    }
}

/// URL pattern of an intercept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlPattern {
    /// A URL compared after parsing.
    String {
        /// URL string.
        pattern: String,
    },
    /// Component-wise match; absent components match anything.
    Pattern {
        /// Scheme without `:`.
        #[serde(skip_serializing_if = "Option::is_none")]
        protocol: Option<String>,
        /// Host name.
        #[serde(skip_serializing_if = "Option::is_none")]
        hostname: Option<String>,
        /// Port as decimal string.
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<String>,
        /// Path.
        #[serde(skip_serializing_if = "Option::is_none")]
        pathname: Option<String>,
        /// Query without `?`.
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    },
}

impl UrlPattern {
    /// String pattern.
    #[inline]
    #[must_use]
    pub fn string(pattern: impl Into<String>) -> Self {
        Self::String {
            pattern: pattern.into(),
        }
    }
}

/// Body or header value, either UTF-8 text or base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BytesValue {
    /// UTF-8 text.
    String {
        /// Value.
        value: String,
    },
    /// Base64-encoded bytes.
    Base64 {
        /// Encoded value.
        value: String,
    },
}

impl BytesValue {
    /// Text value.
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    /// Encodes raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Base64 {
            value: BASE64.encode(bytes),
        }
    }

    /// Decodes to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a base64 value is malformed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::String { value } => Ok(value.as_bytes().to_vec()),
            Self::Base64 { value } => BASE64
                .decode(value)
                .map_err(|e| Error::decode(format!("invalid base64 value: {e}"))),
        }
    }

    /// Returns the text, if this is a string value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            Self::Base64 { .. } => None,
        }
    }
}

/// HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
}

impl Header {
    /// Text header.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::text(value),
        }
    }
}

/// Cookie sent with a continued request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieHeader {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
}

/// `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict.
    Strict,
    /// Lax.
    Lax,
    /// None.
    None,
    /// Browser default.
    Default,
}

/// `Set-Cookie` header of a continued or provided response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetCookieHeader {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// `HttpOnly`.
    #[serde(rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Expires` date string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    /// `Max-Age` in seconds.
    #[serde(rename = "maxAge", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `SameSite`.
    #[serde(rename = "sameSite", skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

impl SetCookieHeader {
    /// Text cookie with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::text(value),
            domain: None,
            http_only: None,
            expiry: None,
            max_age: None,
            path: None,
            same_site: None,
            secure: None,
        }
    }
}

/// Username and password for an auth challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "password")]
pub struct AuthCredentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl AuthCredentials {
    /// Creates password credentials.
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Parameters for `network.continueRequest`.
#[derive(Debug, Clone, Serialize)]
pub struct ContinueRequestParameters {
    /// Paused request.
    pub request: RequestId,
    /// Replacement body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BytesValue>,
    /// Replacement cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<CookieHeader>>,
    /// Replacement headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Replacement method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Replacement URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ContinueRequestParameters {
    /// Continues unmodified.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            body: None,
            cookies: None,
            headers: None,
            method: None,
            url: None,
        }
    }
}

/// Parameters for `network.continueResponse`.
#[derive(Debug, Clone, Serialize)]
pub struct ContinueResponseParameters {
    /// Paused request.
    pub request: RequestId,
    /// Replacement cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<SetCookieHeader>>,
    /// Credentials for an auth challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<AuthCredentials>,
    /// Replacement headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Replacement reason phrase.
    #[serde(rename = "reasonPhrase", skip_serializing_if = "Option::is_none")]
    pub reason_phrase: Option<String>,
    /// Replacement status code.
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ContinueResponseParameters {
    /// Continues unmodified.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            cookies: None,
            credentials: None,
            headers: None,
            reason_phrase: None,
            status_code: None,
        }
    }
}

/// Parameters for `network.provideResponse`.
#[derive(Debug, Clone, Serialize)]
pub struct ProvideResponseParameters {
    /// Paused request.
    pub request: RequestId,
    /// Response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BytesValue>,
    /// Response cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<SetCookieHeader>>,
    /// Response headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Reason phrase.
    #[serde(rename = "reasonPhrase", skip_serializing_if = "Option::is_none")]
    pub reason_phrase: Option<String>,
    /// Status code.
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ProvideResponseParameters {
    /// Empty response with browser defaults.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            body: None,
            cookies: None,
            headers: None,
            reason_phrase: None,
            status_code: None,
        }
    }
}

/// Parameters for `network.continueWithAuth`.
#[derive(Debug, Clone, Serialize)]
pub struct ContinueWithAuthParameters {
    /// Paused request.
    pub request: RequestId,
    /// What to do with the challenge.
    #[serde(flatten)]
    pub action: AuthAction,
}

/// Answer to an auth challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AuthAction {
    /// Answer with credentials.
    ProvideCredentials {
        /// Credentials.
        credentials: AuthCredentials,
    },
    /// Let the browser handle the challenge.
    Default,
    /// Cancel the challenge.
    Cancel,
}

/// Cache mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBehavior {
    /// Browser default.
    Default,
    /// Bypass the cache.
    Bypass,
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddInterceptResult {
    pub intercept: InterceptId,
}

// ============================================================================
// Event Data
// ============================================================================

/// Cookie as reported by the remote end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    pub domain: String,
    /// Path.
    pub path: String,
    /// Serialized size in bytes.
    pub size: u64,
    /// `HttpOnly`.
    #[serde(rename = "httpOnly")]
    pub http_only: bool,
    /// `Secure`.
    pub secure: bool,
    /// `SameSite`.
    #[serde(rename = "sameSite")]
    pub same_site: SameSite,
    /// Expiry in seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// Request as seen in network events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestData {
    /// Request id.
    pub request: RequestId,
    /// URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Request cookies.
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    /// Header bytes.
    #[serde(rename = "headersSize", default)]
    pub headers_size: u64,
    /// Body bytes.
    #[serde(rename = "bodySize", default)]
    pub body_size: Option<u64>,
    /// Fetch destination, e.g. `document`.
    #[serde(default)]
    pub destination: String,
    /// Initiator type, e.g. `script`.
    #[serde(rename = "initiatorType", default)]
    pub initiator_type: Option<String>,
    /// Fetch timing info.
    #[serde(default)]
    pub timings: Option<Value>,
}

impl RequestData {
    /// Returns the first header value with the given name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&BytesValue> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| &h.value)
    }
}

/// Authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthChallenge {
    /// Scheme, e.g. `Basic`.
    pub scheme: String,
    /// Realm.
    pub realm: String,
}

/// Response body size info.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseContent {
    /// Decoded body size.
    pub size: u64,
}

/// Response as seen in network events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseData {
    /// URL.
    pub url: String,
    /// Protocol, e.g. `http/1.1`.
    #[serde(default)]
    pub protocol: String,
    /// Status code.
    pub status: u16,
    /// Status text.
    #[serde(rename = "statusText", default)]
    pub status_text: String,
    /// Served from cache.
    #[serde(rename = "fromCache", default)]
    pub from_cache: bool,
    /// Response headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// MIME type.
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    /// Bytes received.
    #[serde(rename = "bytesReceived", default)]
    pub bytes_received: u64,
    /// Header bytes.
    #[serde(rename = "headersSize", default)]
    pub headers_size: Option<u64>,
    /// Body bytes.
    #[serde(rename = "bodySize", default)]
    pub body_size: Option<u64>,
    /// Content info.
    #[serde(default)]
    pub content: ResponseContent,
    /// Auth challenges, for 401 responses.
    #[serde(rename = "authChallenges", default)]
    pub auth_challenges: Option<Vec<AuthChallenge>>,
}

/// Who started a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Initiator {
    /// Initiator kind.
    #[serde(rename = "type", default)]
    pub initiator_type: Option<String>,
    /// Request that caused this one.
    #[serde(default)]
    pub request: Option<RequestId>,
    /// Script line.
    #[serde(rename = "lineNumber", default)]
    pub line_number: Option<u64>,
    /// Script column.
    #[serde(rename = "columnNumber", default)]
    pub column_number: Option<u64>,
}

/// Fields shared by every network event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkEventBase {
    /// Originating context.
    #[serde(default)]
    pub context: Option<BrowsingContextId>,
    /// Whether the request is paused.
    #[serde(rename = "isBlocked", default)]
    pub is_blocked: bool,
    /// Navigation the request belongs to.
    #[serde(default)]
    pub navigation: Option<NavigationId>,
    /// Redirects so far.
    #[serde(rename = "redirectCount", default)]
    pub redirect_count: u64,
    /// Request data.
    pub request: RequestData,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: u64,
    /// Intercepts that paused the request.
    #[serde(default)]
    pub intercepts: Option<Vec<InterceptId>>,
}

// ============================================================================
// Events
// ============================================================================

/// `network.beforeRequestSent` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeforeRequestSent {
    /// Common fields.
    #[serde(flatten)]
    pub base: NetworkEventBase,
    /// Initiator.
    #[serde(default)]
    pub initiator: Option<Initiator>,
}

/// `network.responseStarted`, `network.responseCompleted` and
/// `network.authRequired` events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEvent {
    /// Common fields.
    #[serde(flatten)]
    pub base: NetworkEventBase,
    /// Response data.
    pub response: ResponseData,
}

/// `network.fetchError` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchError {
    /// Common fields.
    #[serde(flatten)]
    pub base: NetworkEventBase,
    /// Error description.
    #[serde(rename = "errorText")]
    pub error_text: String,
}

// ============================================================================
// Tests
// ============================================================================
