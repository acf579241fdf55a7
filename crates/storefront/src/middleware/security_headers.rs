//! Security headers for a page that lives inside Telegram.
//!
//! The Mini App is framed by Telegram Web, shows catalog media from
//! whatever hosts the spreadsheet links to, and embeds a third-party payment
//! page, so the policy is looser than a standalone site's. Scripts and
//! styles stay restricted.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

/// Content Security Policy.
///
/// ```text
/// default-src 'self';
/// script-src 'self' https://telegram.org https://unpkg.com;
/// style-src 'self' 'unsafe-inline';
/// img-src 'self' https: data:;
/// media-src 'self' https:;
/// connect-src 'self';
/// frame-src https:;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'self' https://web.telegram.org
/// ```
const CSP: &str = "default-src 'self'; \
                   script-src 'self' https://telegram.org https://unpkg.com; \
                   style-src 'self' 'unsafe-inline'; \
                   img-src 'self' https: data:; \
                   media-src 'self' https:; \
                   connect-src 'self'; \
                   frame-src https:; \
                   object-src 'none'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'self' https://web.telegram.org";

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), geolocation=(), microphone=(), usb=(), payment=*",
        ),
    );

    response
}
