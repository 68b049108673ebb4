//! Admin authentication and request throttling

pub mod admin;
pub mod password;
pub mod rate_limit;

pub use admin::{AdminClaims, AdminIdentity, admin_auth_middleware, create_token};
pub use rate_limit::RateLimiter;
