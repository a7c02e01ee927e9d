//! HTTP API for the Ekitsa marketplace.
//!
//! Resource routes for labs, tests, doctors, blog posts, health records,
//! bookings and appointments, plus the lab-owner wizard and dashboard,
//! admin analytics and the AI chat proxy. Everything is nested under
//! `/api/`; see `router` for the middleware stack.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, start_server, ApiServer, ServerError};
pub use types::ApiContext;
