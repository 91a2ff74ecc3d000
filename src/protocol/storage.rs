//! `storage` module payloads.

use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContextId, UserContextId};

use super::network::{BytesValue, Cookie, SameSite};

// ============================================================================
// Commands
// ============================================================================

/// Storage module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum StorageCommand {
    /// Read cookies.
    #[serde(rename = "storage.getCookies")]
    GetCookies {
        /// Match filter.
        #[serde(skip_serializing_if = "Option::is_none")]
        filter: Option<CookieFilter>,
        /// Storage partition.
        #[serde(skip_serializing_if = "Option::is_none")]
        partition: Option<PartitionDescriptor>,
    },

    /// Write a cookie.
    #[serde(rename = "storage.setCookie")]
    SetCookie {
        /// Cookie to store.
        cookie: PartialCookie,
        /// Storage partition.
        #[serde(skip_serializing_if = "Option::is_none")]
        partition: Option<PartitionDescriptor>,
    },

    /// Delete cookies.
    #[serde(rename = "storage.deleteCookies")]
    DeleteCookies {
        /// Match filter.
        #[serde(skip_serializing_if = "Option::is_none")]
        filter: Option<CookieFilter>,
        /// Storage partition.
        #[serde(skip_serializing_if = "Option::is_none")]
        partition: Option<PartitionDescriptor>,
    },
}

// ============================================================================
// Types
// ============================================================================

/// Cookie match filter; absent fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CookieFilter {
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BytesValue>,
    /// Domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// `HttpOnly`.
    #[serde(rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `SameSite`.
    #[serde(rename = "sameSite", skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl CookieFilter {
    /// Matches cookies by name.
    #[inline]
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Cookie to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialCookie {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    pub domain: String,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `HttpOnly`.
    #[serde(rename = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `SameSite`.
    #[serde(rename = "sameSite", skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Expiry in seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl PartialCookie {
    /// Text cookie for a domain.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::text(value),
            domain: domain.into(),
            path: None,
            http_only: None,
            secure: None,
            same_site: None,
            expiry: None,
        }
    }
}

/// Storage partition selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PartitionDescriptor {
    /// Partition of a browsing context.
    Context {
        /// Context.
        context: BrowsingContextId,
    },
    /// Explicit storage key.
    StorageKey {
        /// User context.
        #[serde(rename = "userContext", skip_serializing_if = "Option::is_none")]
        user_context: Option<UserContextId>,
        /// Origin of the partition.
        #[serde(rename = "sourceOrigin", skip_serializing_if = "Option::is_none")]
        source_origin: Option<String>,
    },
}

/// Partition the remote end actually used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartitionKey {
    /// User context.
    #[serde(rename = "userContext", default)]
    pub user_context: Option<UserContextId>,
    /// Origin of the partition.
    #[serde(rename = "sourceOrigin", default)]
    pub source_origin: Option<String>,
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetCookiesResult {
    pub cookies: Vec<Cookie>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PartitionKeyResult {
    #[serde(rename = "partitionKey", default)]
    pub partition_key: PartitionKey,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partition_descriptor_tags() {
        let by_context = PartitionDescriptor::Context {
            context: BrowsingContextId::new("c1"),
        };
        assert_eq!(
            serde_json::to_value(&by_context).expect("serialize"),
            json!({ "type": "context", "context": "c1" })
        );

        let by_key = PartitionDescriptor::StorageKey {
            user_context: None,
            source_origin: Some("https://example.com".into()),
        };
        assert_eq!(
            serde_json::to_value(&by_key).expect("serialize"),
            json!({ "type": "storageKey", "sourceOrigin": "https://example.com" })
        );
    }

    #[test]
    fn test_get_cookies_result() {
        let result: GetCookiesResult = serde_json::from_value(json!({
            "cookies": [{
                "name": "sid",
                "value": { "type": "string", "value": "abc" },
                "domain": "example.com",
                "path": "/",
                "size": 6,
                "httpOnly": true,
                "secure": true,
                "sameSite": "lax"
            }],
            "partitionKey": { "userContext": "default" }
        }))
        .expect("parse");

        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies[0].same_site, SameSite::Lax);
        assert_eq!(result.cookies[0].value.as_text(), Some("abc"));
    }

    #[test]
    fn test_partition_key_result() {
        let result: PartitionKeyResult =
            serde_json::from_value(json!({ "partitionKey": { "userContext": "default" } }))
                .expect("parse");
        assert_eq!(
            result.partition_key.user_context,
            Some(UserContextId::new("default"))
        );
    }

    #[test]
    fn test_filter_by_name() {
        assert_eq!(
            serde_json::to_value(CookieFilter::by_name("sid")).expect("serialize"),
            json!({ "name": "sid" })
        );
    }
}
