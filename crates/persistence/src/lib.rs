//! Persistence layer for the school rating backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

pub use error::RepositoryError;
