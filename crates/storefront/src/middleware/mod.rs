//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, framing by Telegram Web)
//! 5. Session layer (tower-sessions with in-memory store)
//!
//! The Telegram identity is an extractor rather than a layer: handlers that
//! need it ask for [`Identity`].

pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod telegram;

pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use telegram::{INIT_DATA_HEADER, Identity, parse_init_data};
