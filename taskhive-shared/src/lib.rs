//! # Taskhive Shared Library
//!
//! This crate contains shared types, business logic, and utilities used across
//! the Taskhive API server and recurrence worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `access`: Role table, role resolver, and task access evaluator
//! - `dto`: Request/response field transformation (alias mapping, null safety)
//! - `auth`: JWT and password utilities plus auth middleware
//! - `db`: Database pool helpers

pub mod access;
pub mod auth;
pub mod db;
pub mod dto;
pub mod models;

/// Current version of the Taskhive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
