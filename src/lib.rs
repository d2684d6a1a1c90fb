//! `tickets` - an issue-tracking record store backed by SQLite.
//!
//! Issues carry a denormalized view of their relations (creator, optional
//! assignee, zero-or-more tags). The crate's core is the relational assembly
//! and filtering layer: [`assemble`] rebuilds fully-populated aggregates from
//! normalized rows with a constant number of batch lookups, and [`service`]
//! exposes the boundary operations (create/update/delete/query for issues
//! and tags) with every cross-entity reference validated before writes.

pub mod assemble;
pub mod cli;
pub mod directory;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod validation;

pub use error::{Result, TicketsError};
pub use model::{Issue, IssueAggregate, IssueFilter, Status, Tag, User};
pub use storage::SqliteStore;
