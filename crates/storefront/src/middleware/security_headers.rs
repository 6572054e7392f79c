//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! The CSP is locked down to same-origin except `img-src`, which also allows
//! the host that serves uploaded images (Cloudinary or the Supabase project)
//! when one of those backends is configured.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Build the `Content-Security-Policy` value.
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' data: <image origin>;
/// connect-src 'self';
/// manifest-src 'self';
/// worker-src 'self';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none'
/// ```
#[must_use]
pub fn content_security_policy(image_origin: Option<&str>) -> String {
    let img_src = match image_origin {
        Some(origin) => format!("'self' data: {origin}"),
        None => "'self' data:".to_string(),
    };

    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src {img_src}; \
         connect-src 'self'; \
         manifest-src 'self'; \
         worker-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// `Cache-Control: no-store` is only set when the handler did not choose its
/// own caching, so static files and the service worker keep theirs.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let csp = content_security_policy(state.config().storage.image_origin().as_deref());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Provider images do not send CORP headers, so require-corp would block them.
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_local_backend() {
        let csp = content_security_policy(None);
        assert!(csp.contains("img-src 'self' data:;"));
        assert!(csp.contains("script-src 'self';"));
        assert!(!csp.contains("cloudinary"));
    }

    #[test]
    fn test_csp_includes_image_origin() {
        let csp = content_security_policy(Some("https://res.cloudinary.com"));
        assert!(csp.contains("img-src 'self' data: https://res.cloudinary.com;"));
        assert!(HeaderValue::from_str(&csp).is_ok());
    }
}
