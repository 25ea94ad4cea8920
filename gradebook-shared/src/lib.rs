//! # Gradebook Shared Library
//!
//! This crate contains the domain types, data access and grading rules used by
//! the Gradebook API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, session tokens, OTP codes and auth middleware
//! - `db`: Connection pool and migrations
//! - `grading`: Grade calculation, ranking, bulk entry and exam summaries
//! - `mail`: Outgoing email transport

pub mod auth;
pub mod db;
pub mod grading;
pub mod mail;
pub mod models;

/// Current version of the Gradebook shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
