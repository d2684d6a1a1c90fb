//! Durable storage for users, tags, issues, and the issue-tag junction.

pub mod schema;
mod sqlite;

pub use sqlite::{ListFilters, SqliteStore};
