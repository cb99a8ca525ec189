//! HTTP middleware: authentication, security headers, rate limiting and
//! request validation.

pub mod auth;
pub mod ip;
pub mod rate_limit;
pub mod security_headers;
pub mod validation;

pub use auth::AuthUser;
pub use rate_limit::EndpointRateLimiter;
