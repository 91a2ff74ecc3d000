//! Local URL pattern matching.
//!
//! Blocked events normally list the intercepts that paused them. When a
//! remote end omits that list, the registry falls back to matching the
//! request URL against each intercept's patterns itself.

use url::Url;

use crate::protocol::network::UrlPattern;

/// Returns `true` if `url` matches any pattern, or if there are no patterns.
pub(crate) fn matches_any(patterns: Option<&[UrlPattern]>, url: &str) -> bool {
    let Some(patterns) = patterns else {
        return true;
    };
    if patterns.is_empty() {
        return true;
    }

    let Ok(url) = Url::parse(url) else {
        return false;
    };
    patterns.iter().any(|pattern| matches(pattern, &url))
}

/// Returns `true` if `url` matches `pattern`.
pub(crate) fn matches(pattern: &UrlPattern, url: &Url) -> bool {
    match pattern {
        UrlPattern::String { pattern } => match Url::parse(pattern) {
            Ok(expected) => {
                expected.scheme() == url.scheme()
                    && expected.host_str() == url.host_str()
                    && expected.port_or_known_default() == url.port_or_known_default()
                    && expected.path() == url.path()
                    && expected.query() == url.query()
            }
            Err(_) => false,
        },

        UrlPattern::Pattern {
            protocol,
            hostname,
            port,
            pathname,
            search,
        } => {
            let protocol_ok = protocol.as_deref().is_none_or(|p| {
                p.trim_end_matches(':').eq_ignore_ascii_case(url.scheme())
            });

            let hostname_ok = hostname.as_deref().is_none_or(|h| {
                url.host_str().is_some_and(|host| host.eq_ignore_ascii_case(h))
            });

            let port_ok = port.as_deref().is_none_or(|p| {
                match (p.parse::<u16>().ok(), url.port_or_known_default()) {
                    (Some(expected), Some(actual)) => expected == actual,
                    // An empty port means the scheme's default port.
                    _ => p.is_empty() && url.port().is_none(),
                }
            });

            let pathname_ok = pathname.as_deref().is_none_or(|p| {
                let p = p.strip_prefix('/').unwrap_or(p);
                url.path().strip_prefix('/').unwrap_or(url.path()) == p
            });

            let search_ok = search.as_deref().is_none_or(|s| {
                let s = s.strip_prefix('?').unwrap_or(s);
                url.query().unwrap_or_default() == s
            });

            protocol_ok && hostname_ok && port_ok && pathname_ok && search_ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(hostname: Option<&str>, pathname: Option<&str>) -> UrlPattern {
        UrlPattern::Pattern {
            protocol: None,
            hostname: hostname.map(str::to_owned),
            port: None,
            pathname: pathname.map(str::to_owned),
            search: None,
        }
    }

    #[test]
    fn test_string_pattern_normalizes() {
        let url = Url::parse("https://Example.com:443/a?b=1").expect("url");
        assert!(matches(&UrlPattern::string("https://example.com/a?b=1"), &url));
        assert!(!matches(&UrlPattern::string("https://example.com/a"), &url));
    }

    #[test]
    fn test_component_pattern() {
        let url = Url::parse("https://api.example.com/v1/users?page=2").expect("url");
        assert!(matches(&pattern(Some("api.example.com"), None), &url));
        assert!(matches(&pattern(None, Some("v1/users")), &url));
        assert!(!matches(&pattern(Some("example.com"), None), &url));

        let with_search = UrlPattern::Pattern {
            protocol: Some("https:".into()),
            hostname: None,
            port: Some("443".into()),
            pathname: None,
            search: Some("?page=2".into()),
        };
        assert!(matches(&with_search, &url));
    }

    #[test]
    fn test_no_patterns_match_everything() {
        assert!(matches_any(None, "https://anything.test/"));
        assert!(matches_any(Some(&[]), "https://anything.test/"));
        assert!(!matches_any(
            Some(&[pattern(Some("other.test"), None)]),
            "https://anything.test/"
        ));
    }
}
