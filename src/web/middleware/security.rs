//! Response hardening headers.

use axum::{
    body::Body,
    http::{header, header::HeaderValue, HeaderName, Request},
    middleware::Next,
    response::Response,
};

/// Headers stamped on every response, error responses included.
///
/// Login and `/me` bodies carry tokens and identities, so nothing is cacheable.
const HARDENING_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::CACHE_CONTROL, "no-store"),
    (header::PRAGMA, "no-cache"),
];

pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in HARDENING_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}
