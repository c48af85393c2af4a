//! Client key derivation for attempt limiting.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Key used when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the client key for a request.
///
/// With `trust_proxy_headers` the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise, or when neither header is usable, the peer IP is
/// used.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(headers) {
            return ip;
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let first_forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = first_forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.10:51234".parse().unwrap())
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_peer_address() {
        assert_eq!(client_key(&HeaderMap::new(), peer(), false), "192.0.2.10");
    }

    #[test]
    fn test_proxy_headers_ignored_when_untrusted() {
        let h = headers(&[("X-Forwarded-For", "203.0.113.1")]);
        assert_eq!(client_key(&h, peer(), false), "192.0.2.10");
    }

    #[test]
    fn test_first_forwarded_entry() {
        let h = headers(&[
            ("X-Forwarded-For", "203.0.113.1, 10.0.0.1"),
            ("X-Real-IP", "203.0.113.9"),
        ]);
        assert_eq!(client_key(&h, peer(), true), "203.0.113.1");
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("X-Real-IP", "203.0.113.9")]);
        assert_eq!(client_key(&h, peer(), true), "203.0.113.9");
    }

    #[test]
    fn test_trusted_without_headers_uses_peer() {
        assert_eq!(client_key(&HeaderMap::new(), peer(), true), "192.0.2.10");
    }

    #[test]
    fn test_unknown_client() {
        assert_eq!(client_key(&HeaderMap::new(), None, false), UNKNOWN_CLIENT);
    }
}
