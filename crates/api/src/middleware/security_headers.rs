//! Security headers added to every response.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Whether to send `Strict-Transport-Security`.
#[derive(Debug, Clone, Copy)]
pub struct HstsPolicy(pub bool);

fn apply_security_headers(headers: &mut HeaderMap, hsts: HstsPolicy) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );

    if hsts.0 {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }
}

/// Adds `nosniff`, `DENY` framing, the legacy XSS filter and, when enabled,
/// HSTS.
pub async fn security_headers_middleware(
    State(hsts): State<HstsPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), hsts);
    response
}
