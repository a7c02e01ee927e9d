//! API middleware.
//!
//! - `audit`: request logging, applied to every route
//! - `auth`: admin bearer-token guard, admin routes only
//! - `rate`: per-client rate limit, chat route only

pub mod audit;
pub mod auth;
pub mod rate;
