//! # Taskboard Shared Library
//!
//! This crate contains the domain types, persistence and business logic used
//! by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `db`: Connection pool and migrations
//! - `repository`: Repository traits with PostgreSQL and in-memory backends
//! - `services`: User and task item business rules
//! - `error`: Repository and service error types

pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
