//! Shared utilities for the School Rating backend.
//!
//! This crate provides functionality used by every other crate:
//! - Invitation token generation and fingerprinting
//! - Password hashing with Argon2id
//! - JWT access token handling
//! - Common validation rules

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;
