//! HTTP API layer for sitecraft.
//!
//! This crate exposes the storefront as a JSON API:
//!
//! - **Endpoints**: customer operations and the staff area under `/admin`
//! - **Extractors**: the authenticated user
//! - **Middleware**: bearer-token authentication and the admin gate
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
