//! Domain layer for the school rating backend.
//!
//! This crate contains:
//! - Domain models (users, invitation links, redemptions)
//! - Request types with their validation rules
//! - Domain error types

pub mod errors;
pub mod models;

pub use errors::LinkError;
