//! # TaskBoard Shared Library
//!
//! Shared types and business logic for the TaskBoard task-assignment system,
//! used by the API server (and any future tooling binaries).
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations (users, tasks)
//! - `auth`: Password hashing, JWT tokens, and the authorization matrix
//! - `db`: Connection pool and migration utilities
//! - `task_id`: Human-readable task identifier allocation

pub mod auth;
pub mod db;
pub mod models;
pub mod task_id;

/// Current version of the TaskBoard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
