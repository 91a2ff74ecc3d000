//! `browsingContext` module payloads.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContextId, ClientWindowId, NavigationId, UserContextId};

use super::script::{NodeRemoteValue, SerializationOptions, SharedReference};

// ============================================================================
// Commands
// ============================================================================

/// BrowsingContext module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// Bring a top-level context to the foreground.
    #[serde(rename = "browsingContext.activate")]
    Activate {
        /// Target context.
        context: BrowsingContextId,
    },

    /// Capture a screenshot.
    #[serde(rename = "browsingContext.captureScreenshot")]
    CaptureScreenshot(CaptureScreenshotParameters),

    /// Close a top-level context.
    #[serde(rename = "browsingContext.close")]
    Close {
        /// Target context.
        context: BrowsingContextId,
        /// Run `beforeunload` handlers.
        #[serde(rename = "promptUnload", skip_serializing_if = "Option::is_none")]
        prompt_unload: Option<bool>,
    },

    /// Open a new tab or window.
    #[serde(rename = "browsingContext.create")]
    Create(CreateParameters),

    /// Get the context tree.
    #[serde(rename = "browsingContext.getTree")]
    GetTree {
        /// Depth limit.
        #[serde(rename = "maxDepth", skip_serializing_if = "Option::is_none")]
        max_depth: Option<u32>,
        /// Subtree root.
        #[serde(skip_serializing_if = "Option::is_none")]
        root: Option<BrowsingContextId>,
    },

    /// Accept or dismiss an open user prompt.
    #[serde(rename = "browsingContext.handleUserPrompt")]
    HandleUserPrompt {
        /// Context showing the prompt.
        context: BrowsingContextId,
        /// Accept instead of dismiss.
        #[serde(skip_serializing_if = "Option::is_none")]
        accept: Option<bool>,
        /// Text typed into a `prompt()`.
        #[serde(rename = "userText", skip_serializing_if = "Option::is_none")]
        user_text: Option<String>,
    },

    /// Find nodes.
    #[serde(rename = "browsingContext.locateNodes")]
    LocateNodes(LocateNodesParameters),

    /// Navigate to a URL.
    #[serde(rename = "browsingContext.navigate")]
    Navigate {
        /// Target context.
        context: BrowsingContextId,
        /// Destination URL.
        url: String,
        /// Readiness to wait for.
        #[serde(skip_serializing_if = "Option::is_none")]
        wait: Option<ReadinessState>,
    },

    /// Render the document to PDF.
    #[serde(rename = "browsingContext.print")]
    Print(PrintParameters),

    /// Reload the document.
    #[serde(rename = "browsingContext.reload")]
    Reload {
        /// Target context.
        context: BrowsingContextId,
        /// Bypass the cache.
        #[serde(rename = "ignoreCache", skip_serializing_if = "Option::is_none")]
        ignore_cache: Option<bool>,
        /// Readiness to wait for.
        #[serde(skip_serializing_if = "Option::is_none")]
        wait: Option<ReadinessState>,
    },

    /// Set or reset the viewport.
    #[serde(rename = "browsingContext.setViewport")]
    SetViewport(SetViewportParameters),

    /// Move through session history.
    #[serde(rename = "browsingContext.traverseHistory")]
    TraverseHistory {
        /// Target context.
        context: BrowsingContextId,
        /// Steps, negative for back.
        delta: i64,
    },
}

// ============================================================================
// Command Parameters
// ============================================================================

/// Parameters for `browsingContext.captureScreenshot`.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureScreenshotParameters {
    /// Target context.
    pub context: BrowsingContextId,
    /// Viewport or full document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<ScreenshotOrigin>,
    /// Image format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    /// Clip region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipRectangle>,
}

impl CaptureScreenshotParameters {
    /// Full viewport PNG of a context.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId) -> Self {
        Self {
            context,
            origin: None,
            format: None,
            clip: None,
        }
    }
}

/// Screenshot origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotOrigin {
    /// Visible viewport.
    Viewport,
    /// Whole document.
    Document,
}

/// Screenshot image format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFormat {
    /// MIME type, e.g. `image/jpeg`.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Lossy quality in `0.0..=1.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

/// Screenshot clip region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipRectangle {
    /// A rectangle in CSS pixels.
    Box {
        /// Left.
        x: f64,
        /// Top.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// The bounding box of an element.
    Element {
        /// Element reference.
        element: SharedReference,
    },
}

/// Kind of context `browsingContext.create` opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateType {
    /// New tab.
    Tab,
    /// New window.
    Window,
}

/// Parameters for `browsingContext.create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateParameters {
    /// Tab or window.
    #[serde(rename = "type")]
    pub create_type: CreateType,
    /// Context to open next to.
    #[serde(rename = "referenceContext", skip_serializing_if = "Option::is_none")]
    pub reference_context: Option<BrowsingContextId>,
    /// Open without focusing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    /// User context to open in.
    #[serde(rename = "userContext", skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContextId>,
}

impl CreateParameters {
    /// Opens a context of the given type with defaults.
    #[inline]
    #[must_use]
    pub fn new(create_type: CreateType) -> Self {
        Self {
            create_type,
            reference_context: None,
            background: None,
            user_context: None,
        }
    }
}

/// Parameters for `browsingContext.locateNodes`.
#[derive(Debug, Clone, Serialize)]
pub struct LocateNodesParameters {
    /// Target context.
    pub context: BrowsingContextId,
    /// How to find nodes.
    pub locator: Locator,
    /// Result limit, at least 1.
    #[serde(rename = "maxNodeCount", skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<u32>,
    /// Serialization limits for returned nodes.
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Search roots.
    #[serde(rename = "startNodes", skip_serializing_if = "Option::is_none")]
    pub start_nodes: Option<Vec<SharedReference>>,
}

impl LocateNodesParameters {
    /// Locates every match of `locator` in `context`.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId, locator: Locator) -> Self {
        Self {
            context,
            locator,
            max_node_count: None,
            serialization_options: None,
            start_nodes: None,
        }
    }
}

/// Node locator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Locator {
    /// CSS selector.
    Css {
        /// Selector.
        value: String,
    },
    /// XPath expression.
    Xpath {
        /// Expression.
        value: String,
    },
    /// Rendered text.
    InnerText {
        /// Text to match.
        value: String,
        /// Case-insensitive match.
        #[serde(rename = "ignoreCase", skip_serializing_if = "Option::is_none")]
        ignore_case: Option<bool>,
        /// Full or partial match.
        #[serde(rename = "matchType", skip_serializing_if = "Option::is_none")]
        match_type: Option<TextMatchType>,
        /// Depth limit below the start nodes.
        #[serde(rename = "maxDepth", skip_serializing_if = "Option::is_none")]
        max_depth: Option<u32>,
    },
    /// Accessible name and role.
    Accessibility {
        /// Name and role.
        value: AccessibilityQuery,
    },
    /// The container element of a child context.
    Context {
        /// Child context.
        value: ContextQuery,
    },
}

impl Locator {
    /// CSS selector locator.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            value: selector.into(),
        }
    }

    /// XPath locator.
    #[inline]
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::Xpath {
            value: expression.into(),
        }
    }

    /// Full, case-sensitive text locator.
    #[inline]
    #[must_use]
    pub fn inner_text(text: impl Into<String>) -> Self {
        Self::InnerText {
            value: text.into(),
            ignore_case: None,
            match_type: None,
            max_depth: None,
        }
    }
}

/// Text match mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMatchType {
    /// Whole text.
    Full,
    /// Substring.
    Partial,
}

/// Accessibility locator value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibilityQuery {
    /// Accessible name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ARIA role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Context locator value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextQuery {
    /// Child context.
    pub context: BrowsingContextId,
}

/// Navigation readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Return immediately.
    None,
    /// Wait for `DOMContentLoaded`.
    Interactive,
    /// Wait for `load`.
    #[default]
    Complete,
}

/// Parameters for `browsingContext.print`.
#[derive(Debug, Clone, Serialize)]
pub struct PrintParameters {
    /// Target context.
    pub context: BrowsingContextId,
    /// Print backgrounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    /// Margins in centimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<PrintMargin>,
    /// Page orientation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<PrintOrientation>,
    /// Page size in centimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PrintPage>,
    /// Pages or ranges such as `"1-3"`.
    #[serde(rename = "pageRanges", skip_serializing_if = "Option::is_none")]
    pub page_ranges: Option<Vec<String>>,
    /// Scale in `0.1..=2.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Shrink content to page width.
    #[serde(rename = "shrinkToFit", skip_serializing_if = "Option::is_none")]
    pub shrink_to_fit: Option<bool>,
}

impl PrintParameters {
    /// Prints a context with defaults.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId) -> Self {
        Self {
            context,
            background: None,
            margin: None,
            orientation: None,
            page: None,
            page_ranges: None,
            scale: None,
            shrink_to_fit: None,
        }
    }
}

/// Print margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrintMargin {
    /// Bottom.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    /// Left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    /// Right.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    /// Top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintOrientation {
    /// Portrait.
    Portrait,
    /// Landscape.
    Landscape,
}

/// Page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrintPage {
    /// Height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Parameters for `browsingContext.setViewport`.
#[derive(Debug, Clone, Serialize)]
pub struct SetViewportParameters {
    /// Target top-level context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
    /// Viewport size; `null` restores the default.
    pub viewport: Option<Viewport>,
    /// Device pixel ratio, positive.
    #[serde(rename = "devicePixelRatio", skip_serializing_if = "Option::is_none")]
    pub device_pixel_ratio: Option<f64>,
    /// Apply to these user contexts instead of one context.
    #[serde(rename = "userContexts", skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
}

impl SetViewportParameters {
    /// Sets the viewport of `context`; `None` restores the default.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId, viewport: Option<Viewport>) -> Self {
        Self {
            context: Some(context),
            viewport,
            device_pixel_ratio: None,
            user_contexts: None,
        }
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

// ============================================================================
// Results
// ============================================================================

/// A node of the browsing context tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrowsingContextInfo {
    /// Context id.
    pub context: BrowsingContextId,
    /// Current URL.
    pub url: String,
    /// Child contexts, absent past the depth limit.
    #[serde(default)]
    pub children: Option<Vec<BrowsingContextInfo>>,
    /// Parent context.
    #[serde(default)]
    pub parent: Option<BrowsingContextId>,
    /// Owning user context.
    #[serde(rename = "userContext", default)]
    pub user_context: Option<UserContextId>,
    /// Containing client window.
    #[serde(rename = "clientWindow", default)]
    pub client_window: Option<ClientWindowId>,
    /// Context that opened this one.
    #[serde(rename = "originalOpener", default)]
    pub original_opener: Option<BrowsingContextId>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetTreeResult {
    pub contexts: Vec<BrowsingContextInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateResult {
    pub context: BrowsingContextId,
}

/// Base64 payload of a screenshot or print result.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataResult {
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LocateNodesResult {
    pub nodes: Vec<NodeRemoteValue>,
}

/// Result of `browsingContext.navigate` and `browsingContext.reload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavigateResult {
    /// Navigation id, absent for same-document navigations.
    #[serde(default)]
    pub navigation: Option<NavigationId>,
    /// Final URL.
    pub url: String,
}

// ============================================================================
// Events
// ============================================================================

/// Payload of navigation lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavigationInfo {
    /// Navigating context.
    pub context: BrowsingContextId,
    /// Navigation id.
    #[serde(default)]
    pub navigation: Option<NavigationId>,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Target URL.
    pub url: String,
}

/// `browsingContext.downloadWillBegin` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadWillBegin {
    /// Navigation fields.
    #[serde(flatten)]
    pub navigation: NavigationInfo,
    /// File name proposed by the page.
    #[serde(rename = "suggestedFilename")]
    pub suggested_filename: String,
}

/// User prompt kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPromptType {
    /// `alert()`.
    Alert,
    /// `beforeunload` dialog.
    Beforeunload,
    /// `confirm()`.
    Confirm,
    /// `prompt()`.
    Prompt,
}

/// `browsingContext.userPromptOpened` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserPromptOpened {
    /// Context showing the prompt.
    pub context: BrowsingContextId,
    /// Configured handler, e.g. `accept` or `ignore`.
    #[serde(default)]
    pub handler: Option<String>,
    /// Prompt message.
    pub message: String,
    /// Prompt kind.
    #[serde(rename = "type")]
    pub prompt_type: UserPromptType,
    /// Default text of a `prompt()`.
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<String>,
}

/// `browsingContext.userPromptClosed` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserPromptClosed {
    /// Context that showed the prompt.
    pub context: BrowsingContextId,
    /// Accepted or dismissed.
    pub accepted: bool,
    /// Prompt kind.
    #[serde(rename = "type")]
    pub prompt_type: UserPromptType,
    /// Text entered into a `prompt()`.
    #[serde(rename = "userText", default)]
    pub user_text: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locator_tags() {
        let locator = Locator::InnerText {
            value: "Sign in".into(),
            ignore_case: Some(true),
            match_type: Some(TextMatchType::Partial),
            max_depth: None,
        };
        assert_eq!(
            serde_json::to_value(&locator).expect("serialize"),
            json!({ "type": "innerText", "value": "Sign in", "ignoreCase": true, "matchType": "partial" })
        );

        assert_eq!(
            serde_json::to_value(Locator::xpath("//a")).expect("serialize"),
            json!({ "type": "xpath", "value": "//a" })
        );
    }

    #[test]
    fn test_clip_rectangle_tag_first() {
        let clip = ClipRectangle::Box {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 20.0,
        };
        let text = serde_json::to_string(&clip).expect("serialize");
        assert!(text.starts_with(r#"{"type":"box""#), "got {text}");
    }

    #[test]
    fn test_viewport_reset_serializes_null() {
        let params = SetViewportParameters {
            context: Some(BrowsingContextId::new("c1")),
            viewport: None,
            device_pixel_ratio: None,
            user_contexts: None,
        };
        assert_eq!(
            serde_json::to_value(&params).expect("serialize"),
            json!({ "context": "c1", "viewport": null })
        );
    }

    #[test]
    fn test_context_tree_decode() {
        let result: GetTreeResult = serde_json::from_value(json!({
            "contexts": [{
                "context": "top",
                "url": "about:blank",
                "userContext": "default",
                "children": [{ "context": "frame", "url": "about:blank", "parent": "top" }]
            }]
        }))
        .expect("parse");

        let top = &result.contexts[0];
        let children = top.children.as_ref().expect("children");
        assert_eq!(children[0].parent, Some(BrowsingContextId::new("top")));
    }

    #[test]
    fn test_download_will_begin_flatten() {
        let event: DownloadWillBegin = serde_json::from_value(json!({
            "context": "c1",
            "navigation": "n1",
            "timestamp": 1,
            "url": "https://example.com/file.zip",
            "suggestedFilename": "file.zip"
        }))
        .expect("parse");
        assert_eq!(event.suggested_filename, "file.zip");
        assert_eq!(event.navigation.context, BrowsingContextId::new("c1"));
    }
}
