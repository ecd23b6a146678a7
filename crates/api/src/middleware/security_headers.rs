//! Security headers middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;

/// Security header names.
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const REFERRER_POLICY: &str = "referrer-policy";
}

/// Adds security headers to every response.
///
/// Registration URLs carry the link token, so `Referrer-Policy: no-referrer`
/// keeps it out of third-party logs. HSTS is only sent when
/// `security.hsts_enabled` is set.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let response_headers = response.headers_mut();

    response_headers.insert(
        header::HeaderName::from_static(headers::X_CONTENT_TYPE_OPTIONS),
        HeaderValue::from_static("nosniff"),
    );
    response_headers.insert(
        header::HeaderName::from_static(headers::X_FRAME_OPTIONS),
        HeaderValue::from_static("DENY"),
    );
    response_headers.insert(
        header::HeaderName::from_static(headers::REFERRER_POLICY),
        HeaderValue::from_static("no-referrer"),
    );

    if state.config.security.hsts_enabled {
        response_headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_constants_are_valid_names() {
        for name in [
            headers::X_CONTENT_TYPE_OPTIONS,
            headers::X_FRAME_OPTIONS,
            headers::REFERRER_POLICY,
        ] {
            assert!(header::HeaderName::from_bytes(name.as_bytes()).is_ok());
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
        }
    }
}
