//! API endpoint handlers.
//!
//! One module per resource. Handlers open a connection, call the domain
//! module and map its errors through `ApiError`.

pub mod admin;
pub mod appointments;
pub mod blog;
pub mod bookings;
pub mod chat;
pub mod doctors;
pub mod health;
pub mod health_records;
pub mod lab_owner;
pub mod labs;
