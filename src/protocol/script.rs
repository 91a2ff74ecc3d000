//! `script` module payloads.
//!
//! Remote values and local values are tagged unions keyed by `"type"`.
//! Decoding a [`RemoteValue`] with a tag this crate does not know is a hard
//! decode error.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContextId, PreloadScriptId, RealmId, SharedId, UserContextId};

// ============================================================================
// Commands
// ============================================================================

/// Script module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptCommand {
    /// Evaluate an expression.
    #[serde(rename = "script.evaluate")]
    Evaluate(EvaluateParameters),

    /// Call a function declaration.
    #[serde(rename = "script.callFunction")]
    CallFunction(CallFunctionParameters),

    /// Register a script run before any page script.
    #[serde(rename = "script.addPreloadScript")]
    AddPreloadScript(AddPreloadScriptParameters),

    /// Remove a preload script.
    #[serde(rename = "script.removePreloadScript")]
    RemovePreloadScript {
        /// Script id.
        script: PreloadScriptId,
    },

    /// Release handles owned by the local end.
    #[serde(rename = "script.disown")]
    Disown {
        /// Handles to release.
        handles: Vec<String>,
        /// Realm or context the handles live in.
        target: Target,
    },

    /// List realms.
    #[serde(rename = "script.getRealms")]
    GetRealms {
        /// Restrict to one browsing context.
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<BrowsingContextId>,
        /// Restrict to one realm type.
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        realm_type: Option<RealmType>,
    },
}

/// Parameters for `script.evaluate`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateParameters {
    /// Expression source.
    pub expression: String,
    /// Where to evaluate.
    pub target: Target,
    /// Await a returned promise.
    #[serde(rename = "awaitPromise")]
    pub await_promise: bool,
    /// Ownership of returned handles.
    #[serde(rename = "resultOwnership", skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    /// Serialization limits.
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Treat the call as a user activation.
    #[serde(rename = "userActivation", skip_serializing_if = "Option::is_none")]
    pub user_activation: Option<bool>,
}

impl EvaluateParameters {
    /// Evaluates `expression` in `target`, awaiting returned promises.
    #[must_use]
    pub fn new(expression: impl Into<String>, target: Target) -> Self {
        Self {
            expression: expression.into(),
            target,
            await_promise: true,
            result_ownership: None,
            serialization_options: None,
            user_activation: None,
        }
    }
}

/// Parameters for `script.callFunction`.
#[derive(Debug, Clone, Serialize)]
pub struct CallFunctionParameters {
    /// Function declaration source.
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    /// Await a returned promise.
    #[serde(rename = "awaitPromise")]
    pub await_promise: bool,
    /// Where to call.
    pub target: Target,
    /// Call arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<LocalValue>>,
    /// `this` binding.
    #[serde(rename = "this", skip_serializing_if = "Option::is_none")]
    pub this: Option<LocalValue>,
    /// Ownership of returned handles.
    #[serde(rename = "resultOwnership", skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    /// Serialization limits.
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Treat the call as a user activation.
    #[serde(rename = "userActivation", skip_serializing_if = "Option::is_none")]
    pub user_activation: Option<bool>,
}

impl CallFunctionParameters {
    /// Calls `function_declaration` in `target` with no arguments.
    #[must_use]
    pub fn new(function_declaration: impl Into<String>, target: Target) -> Self {
        Self {
            function_declaration: function_declaration.into(),
            await_promise: true,
            target,
            arguments: None,
            this: None,
            result_ownership: None,
            serialization_options: None,
            user_activation: None,
        }
    }

    /// Sets the call arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<LocalValue>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Parameters for `script.addPreloadScript`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddPreloadScriptParameters {
    /// Function declaration source.
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    /// Channels passed as arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<ChannelValue>>,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
    /// Sandbox name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
    /// Restrict to these user contexts.
    #[serde(rename = "userContexts", skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
}

// ============================================================================
// Target & Options
// ============================================================================

/// Where a script runs: a realm, or a context with optional sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Target {
    /// A browsing context's realm, optionally sandboxed.
    Context {
        /// Browsing context.
        context: BrowsingContextId,
        /// Sandbox name.
        #[serde(skip_serializing_if = "Option::is_none")]
        sandbox: Option<String>,
    },
    /// A specific realm.
    Realm {
        /// Realm id.
        realm: RealmId,
    },
}

impl Target {
    /// Targets the default realm of a context.
    #[inline]
    #[must_use]
    pub fn context(context: BrowsingContextId) -> Self {
        Self::Context {
            context,
            sandbox: None,
        }
    }

    /// Targets a realm.
    #[inline]
    #[must_use]
    pub fn realm(realm: RealmId) -> Self {
        Self::Realm { realm }
    }
}

/// Ownership of handles in returned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOwnership {
    /// Keep objects alive until disowned.
    Root,
    /// No handles.
    None,
}

/// Shadow tree serialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeShadowTree {
    /// No shadow roots.
    None,
    /// Open shadow roots only.
    Open,
    /// All shadow roots.
    All,
}

/// Limits for remote value serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SerializationOptions {
    /// DOM depth.
    #[serde(rename = "maxDomDepth", skip_serializing_if = "Option::is_none")]
    pub max_dom_depth: Option<u64>,
    /// Object depth.
    #[serde(rename = "maxObjectDepth", skip_serializing_if = "Option::is_none")]
    pub max_object_depth: Option<u64>,
    /// Shadow tree mode.
    #[serde(rename = "includeShadowTree", skip_serializing_if = "Option::is_none")]
    pub include_shadow_tree: Option<IncludeShadowTree>,
}

// ============================================================================
// Number
// ============================================================================

/// A JavaScript number, including the values JSON cannot carry.
///
/// `NaN`, `-0`, `Infinity` and `-Infinity` travel as strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidiNumber(pub f64);

impl Serialize for BidiNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if value == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else if value == 0.0 && value.is_sign_negative() {
            serializer.serialize_str("-0")
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl<'de> Deserialize<'de> for BidiNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl Visitor<'_> for NumberVisitor {
            type Value = BidiNumber;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or one of NaN, -0, Infinity, -Infinity")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<BidiNumber, E> {
                Ok(BidiNumber(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BidiNumber, E> {
                Ok(BidiNumber(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BidiNumber, E> {
                Ok(BidiNumber(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BidiNumber, E> {
                match v {
                    "NaN" => Ok(BidiNumber(f64::NAN)),
                    "-0" => Ok(BidiNumber(-0.0)),
                    "Infinity" => Ok(BidiNumber(f64::INFINITY)),
                    "-Infinity" => Ok(BidiNumber(f64::NEG_INFINITY)),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

// ============================================================================
// References
// ============================================================================

/// Reference to a DOM node shared across realms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReference {
    /// Shared node id.
    #[serde(rename = "sharedId")]
    pub shared_id: SharedId,
    /// Handle, when the node is also owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl SharedReference {
    /// Creates a reference from a shared id.
    #[inline]
    #[must_use]
    pub fn new(shared_id: SharedId) -> Self {
        Self {
            shared_id,
            handle: None,
        }
    }
}

/// Reference to a remote object by handle or shared id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteReference {
    /// Object handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Shared node id.
    #[serde(rename = "sharedId", skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<SharedId>,
}

// ============================================================================
// LocalValue
// ============================================================================

/// A value sent from the local end as a script argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocalValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// A string.
    String {
        /// Value.
        value: String,
    },
    /// A number.
    Number {
        /// Value.
        value: BidiNumber,
    },
    /// A boolean.
    Boolean {
        /// Value.
        value: bool,
    },
    /// A BigInt in decimal string form.
    Bigint {
        /// Value.
        value: String,
    },
    /// An array.
    Array {
        /// Elements.
        value: Vec<LocalValue>,
    },
    /// A `Date` from its ISO string.
    Date {
        /// Value.
        value: String,
    },
    /// A `Map`.
    Map {
        /// Entries.
        value: Vec<(LocalKey, LocalValue)>,
    },
    /// A plain object.
    Object {
        /// Entries.
        value: Vec<(LocalKey, LocalValue)>,
    },
    /// A `RegExp`.
    Regexp {
        /// Pattern and flags.
        value: RegExpValue,
    },
    /// A `Set`.
    Set {
        /// Elements.
        value: Vec<LocalValue>,
    },
    /// A channel the remote end can post `script.message` events through.
    Channel {
        /// Channel properties.
        value: ChannelProperties,
    },
    /// A reference to an existing remote object.
    #[serde(untagged)]
    Reference(RemoteReference),
}

/// Key of an object or map entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalKey {
    /// String key.
    String(String),
    /// Arbitrary key (maps only).
    Value(LocalValue),
}

impl From<&str> for LocalValue {
    fn from(value: &str) -> Self {
        Self::String {
            value: value.to_owned(),
        }
    }
}

impl From<String> for LocalValue {
    fn from(value: String) -> Self {
        Self::String { value }
    }
}

impl From<bool> for LocalValue {
    fn from(value: bool) -> Self {
        Self::Boolean { value }
    }
}

impl From<f64> for LocalValue {
    fn from(value: f64) -> Self {
        Self::Number {
            value: BidiNumber(value),
        }
    }
}

impl From<i64> for LocalValue {
    fn from(value: i64) -> Self {
        Self::Number {
            value: BidiNumber(value as f64),
        }
    }
}

impl From<SharedReference> for LocalValue {
    fn from(reference: SharedReference) -> Self {
        Self::Reference(RemoteReference {
            handle: reference.handle,
            shared_id: Some(reference.shared_id),
        })
    }
}

/// Regular expression source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegExpValue {
    /// Pattern.
    pub pattern: String,
    /// Flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// Channel properties for `script.message` delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelProperties {
    /// Channel id chosen by the local end.
    pub channel: String,
    /// Serialization limits for posted data.
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Ownership of posted handles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<ResultOwnership>,
}

/// A channel argument for preload scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "channel")]
pub struct ChannelValue {
    /// Channel properties.
    pub value: ChannelProperties,
}

impl ChannelValue {
    /// Creates a channel argument with default options.
    #[inline]
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            value: ChannelProperties {
                channel: channel.into(),
                serialization_options: None,
                ownership: None,
            },
        }
    }
}

// ============================================================================
// RemoteValue
// ============================================================================

/// A value serialized by the remote end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// A string.
    String {
        /// Value.
        value: String,
    },
    /// A number.
    Number {
        /// Value.
        value: BidiNumber,
    },
    /// A boolean.
    Boolean {
        /// Value.
        value: bool,
    },
    /// A BigInt in decimal string form.
    Bigint {
        /// Value.
        value: String,
    },
    /// A symbol.
    Symbol(HandleValue),
    /// An array.
    Array(CollectionValue),
    /// A plain object.
    Object(MappingValue),
    /// A function.
    Function(HandleValue),
    /// A `RegExp`.
    Regexp(RegExpRemoteValue),
    /// A `Date`.
    Date(DateRemoteValue),
    /// A `Map`.
    Map(MappingValue),
    /// A `Set`.
    Set(CollectionValue),
    /// A `WeakMap`.
    Weakmap(HandleValue),
    /// A `WeakSet`.
    Weakset(HandleValue),
    /// A generator.
    Generator(HandleValue),
    /// An `Error`.
    Error(HandleValue),
    /// A `Proxy`.
    Proxy(HandleValue),
    /// A `Promise`.
    Promise(HandleValue),
    /// A typed array.
    Typedarray(HandleValue),
    /// An `ArrayBuffer`.
    Arraybuffer(HandleValue),
    /// A `NodeList`.
    Nodelist(CollectionValue),
    /// An `HTMLCollection`.
    Htmlcollection(CollectionValue),
    /// A DOM node.
    Node(NodeRemoteValue),
    /// A window proxy.
    Window(WindowProxyRemoteValue),
}

impl RemoteValue {
    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number { value } => Some(value.0),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean { value } => Some(*value),
            _ => None,
        }
    }

    /// Returns the node, if this is a node.
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeRemoteValue> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// Remote object carrying only handle information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleValue {
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
}

/// Array-like remote value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionValue {
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Elements, absent past the depth limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<RemoteValue>>,
}

/// Object-like remote value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingValue {
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Entries, absent past the depth limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<(RemoteKey, RemoteValue)>>,
}

/// Key of a remote object or map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteKey {
    /// String key.
    String(String),
    /// Arbitrary key (maps only).
    Value(RemoteValue),
}

/// Remote `RegExp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegExpRemoteValue {
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Pattern and flags.
    pub value: RegExpValue,
}

/// Remote `Date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRemoteValue {
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// ISO date string.
    pub value: String,
}

/// Remote window proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProxyRemoteValue {
    /// Window properties.
    pub value: WindowProxyProperties,
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
}

/// Window proxy properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProxyProperties {
    /// Browsing context of the window.
    pub context: BrowsingContextId,
}

/// Remote DOM node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRemoteValue {
    /// Shared id usable from other realms.
    #[serde(rename = "sharedId", default, skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<SharedId>,
    /// Handle, when owned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Id stable within one serialization.
    #[serde(rename = "internalId", default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    /// Node properties, absent past the depth limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeProperties>,
}

impl NodeRemoteValue {
    /// Returns a shared reference usable as input origin or argument.
    #[must_use]
    pub fn shared_reference(&self) -> Option<SharedReference> {
        self.shared_id.clone().map(|shared_id| SharedReference {
            shared_id,
            handle: self.handle.clone(),
        })
    }
}

/// DOM node properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    /// DOM `nodeType`.
    #[serde(rename = "nodeType")]
    pub node_type: u32,
    /// Number of children.
    #[serde(rename = "childNodeCount")]
    pub child_node_count: u32,
    /// Element attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Serialized children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRemoteValue>>,
    /// Element local name.
    #[serde(rename = "localName", default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Shadow root mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Namespace URI.
    #[serde(rename = "namespaceURI", default, skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,
    /// Text node value.
    #[serde(rename = "nodeValue", default, skip_serializing_if = "Option::is_none")]
    pub node_value: Option<String>,
    /// Attached shadow root.
    #[serde(rename = "shadowRoot", default, skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<Box<NodeRemoteValue>>,
}

// ============================================================================
// Results
// ============================================================================

/// Result of `script.evaluate` / `script.callFunction`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvaluateResult {
    /// Completed normally.
    Success {
        /// Returned value.
        result: RemoteValue,
        /// Realm the script ran in.
        realm: RealmId,
    },
    /// Threw.
    Exception {
        /// Exception details.
        #[serde(rename = "exceptionDetails")]
        exception_details: ExceptionDetails,
        /// Realm the script ran in.
        realm: RealmId,
    },
}

impl EvaluateResult {
    /// Returns the value, or the exception details if the script threw.
    pub fn into_result(self) -> Result<RemoteValue, ExceptionDetails> {
        match self {
            Self::Success { result, .. } => Ok(result),
            Self::Exception {
                exception_details, ..
            } => Err(exception_details),
        }
    }
}

/// Details of a thrown exception.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExceptionDetails {
    /// Column of the throw site.
    #[serde(rename = "columnNumber")]
    pub column_number: u64,
    /// Line of the throw site.
    #[serde(rename = "lineNumber")]
    pub line_number: u64,
    /// Thrown value.
    pub exception: RemoteValue,
    /// Stack at the throw site.
    #[serde(rename = "stackTrace")]
    pub stack_trace: StackTrace,
    /// String form of the exception.
    pub text: String,
}

/// JavaScript stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StackTrace {
    /// Frames, innermost first.
    #[serde(rename = "callFrames", default)]
    pub call_frames: Vec<StackFrame>,
}

/// One stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StackFrame {
    /// Column number.
    #[serde(rename = "columnNumber")]
    pub column_number: u64,
    /// Function name.
    #[serde(rename = "functionName")]
    pub function_name: String,
    /// Line number.
    #[serde(rename = "lineNumber")]
    pub line_number: u64,
    /// Script URL.
    pub url: String,
}

/// Result of `script.addPreloadScript`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddPreloadScriptResult {
    pub script: PreloadScriptId,
}

/// Realm kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmType {
    /// Window realm.
    Window,
    /// Dedicated worker.
    DedicatedWorker,
    /// Shared worker.
    SharedWorker,
    /// Service worker.
    ServiceWorker,
    /// Generic worker.
    Worker,
    /// Paint worklet.
    PaintWorklet,
    /// Audio worklet.
    AudioWorklet,
    /// Generic worklet.
    Worklet,
}

/// Realm information.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealmInfo {
    /// Realm id.
    pub realm: RealmId,
    /// Serialized origin.
    pub origin: String,
    /// Realm kind.
    #[serde(rename = "type")]
    pub realm_type: RealmType,
    /// Owning browsing context for window realms.
    #[serde(default)]
    pub context: Option<BrowsingContextId>,
    /// Sandbox name for sandboxed window realms.
    #[serde(default)]
    pub sandbox: Option<String>,
}

/// Result of `script.getRealms`, unwrapped by the module proxy.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetRealmsResult {
    pub realms: Vec<RealmInfo>,
}

// ============================================================================
// Events
// ============================================================================

/// Origin of a script-side event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    /// Realm.
    pub realm: RealmId,
    /// Browsing context, for window realms.
    #[serde(default)]
    pub context: Option<BrowsingContextId>,
}

/// `script.message` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptMessage {
    /// Channel id.
    pub channel: String,
    /// Posted data.
    pub data: RemoteValue,
    /// Sender.
    pub source: Source,
}

/// `script.realmDestroyed` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealmDestroyed {
    /// Destroyed realm.
    pub realm: RealmId,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_special_numbers() {
        let value: RemoteValue =
            serde_json::from_value(json!({ "type": "number", "value": "-Infinity" }))
                .expect("parse");
        assert_eq!(value.as_f64(), Some(f64::NEG_INFINITY));

        let negative_zero = serde_json::to_value(BidiNumber(-0.0)).expect("serialize");
        assert_eq!(negative_zero, json!("-0"));

        let plain = serde_json::to_value(BidiNumber(1.5)).expect("serialize");
        assert_eq!(plain, json!(1.5));
    }

    #[test]
    fn test_nested_remote_object() {
        let value: RemoteValue = serde_json::from_value(json!({
            "type": "object",
            "value": [
                ["name", { "type": "string", "value": "bidi" }],
                ["tags", { "type": "array", "value": [{ "type": "null" }] }]
            ]
        }))
        .expect("parse");

        let RemoteValue::Object(mapping) = value else {
            panic!("expected object");
        };
        let entries = mapping.value.expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, RemoteKey::String("name".into()));
        assert_eq!(entries[0].1.as_str(), Some("bidi"));
        assert!(matches!(entries[1].1, RemoteValue::Array(_)));
    }

    #[test]
    fn test_unknown_remote_tag_is_error() {
        let result = serde_json::from_value::<RemoteValue>(json!({ "type": "hologram" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_node_remote_value() {
        let value: RemoteValue = serde_json::from_value(json!({
            "type": "node",
            "sharedId": "node-7",
            "value": {
                "nodeType": 1,
                "childNodeCount": 0,
                "localName": "button",
                "attributes": { "id": "go" }
            }
        }))
        .expect("parse");

        let node = value.as_node().expect("node");
        let props = node.value.as_ref().expect("props");
        assert_eq!(props.local_name.as_deref(), Some("button"));
        assert_eq!(
            node.shared_reference().map(|r| r.shared_id),
            Some(SharedId::new("node-7"))
        );
    }

    #[test]
    fn test_evaluate_exception() {
        let result: EvaluateResult = serde_json::from_value(json!({
            "type": "exception",
            "realm": "r1",
            "exceptionDetails": {
                "columnNumber": 1,
                "lineNumber": 0,
                "exception": { "type": "error" },
                "stackTrace": { "callFrames": [] },
                "text": "ReferenceError: x is not defined"
            }
        }))
        .expect("parse");

        let details = result.into_result().expect_err("exception");
        assert_eq!(details.text, "ReferenceError: x is not defined");
    }

    #[test]
    fn test_local_value_serialization() {
        let value = LocalValue::Object {
            value: vec![(LocalKey::String("a".into()), LocalValue::from(1_i64))],
        };
        assert_eq!(
            serde_json::to_value(&value).expect("serialize"),
            json!({ "type": "object", "value": [["a", { "type": "number", "value": 1.0 }]] })
        );

        let reference = LocalValue::from(SharedReference::new(SharedId::new("n1")));
        assert_eq!(
            serde_json::to_value(&reference).expect("serialize"),
            json!({ "sharedId": "n1" })
        );
    }

    #[test]
    fn test_channel_value_tag() {
        assert_eq!(
            serde_json::to_value(ChannelValue::new("ch")).expect("serialize"),
            json!({ "type": "channel", "value": { "channel": "ch" } })
        );
    }

    #[test]
    fn test_target_untagged() {
        let target = Target::context(BrowsingContextId::new("c1"));
        assert_eq!(
            serde_json::to_value(&target).expect("serialize"),
            json!({ "context": "c1" })
        );
    }
}
