//! Shared request identity for catalog, metadata and artifact HTTP clients.
//!
//! The catalog host only answers browser-like traffic that carries the public
//! portal as Referer/Origin, so every client sends the same header set.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};

/// Origin of the public portal that fronts the catalog.
pub const PORTAL_ORIGIN: &str = "https://basic.smartedu.cn";

/// Referer sent with every request.
const PORTAL_REFERER: &str = "https://basic.smartedu.cn/";

/// Browser User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

/// Default headers attached to every client built by [`crate::http_client`].
#[must_use]
pub(crate) fn portal_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(PORTAL_REFERER));
    headers.insert(ORIGIN, HeaderValue::from_static(PORTAL_ORIGIN));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_headers_carry_referer_and_origin() {
        let headers = portal_headers();
        assert_eq!(headers.get(REFERER).unwrap(), PORTAL_REFERER);
        assert_eq!(headers.get(ORIGIN).unwrap(), PORTAL_ORIGIN);
        assert!(
            PORTAL_REFERER.starts_with(PORTAL_ORIGIN),
            "referer must live under the portal origin"
        );
    }

    #[test]
    fn test_browser_user_agent_looks_like_a_browser() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(!BROWSER_USER_AGENT.contains("  "), "no doubled spaces from line continuation");
    }
}
