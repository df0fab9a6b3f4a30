//! Resource API modules
//!
//! One module per backend area. Each function maps one logical operation
//! to exactly one HTTP call and returns the unwrapped body untouched;
//! interpreting it is the service layer's job.

pub mod admin;
pub mod auth;
pub mod bookings;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use bookings::BookingsApi;
