//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Security headers
//! 5. Rate limiting on mutating routes (governor)

pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use rate_limit::{cart_rate_limiter, review_rate_limiter};
pub use security_headers::security_headers_middleware;
pub use session::{ShopperSession, create_session_layer};
