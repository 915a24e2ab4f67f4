//! Core business logic for sitecraft.

pub mod services;

pub use services::*;
