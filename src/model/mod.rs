//! Core data types for `tickets`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `User` - An account in the user directory
//! - `Tag` - A named label attachable to issues
//! - `Issue` - The core work item (normalized row)
//! - `IssueAggregate` - An issue with its relations resolved
//! - Input types for the boundary operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = crate::error::TicketsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not started" => Ok(Self::NotStarted),
            "in progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(crate::error::TicketsError::InvalidStatus {
                status: other.to_string(),
            }),
        }
    }
}

/// An account in the user directory.
///
/// The credential digest never crosses the serialization boundary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,

    /// Unique email address.
    pub email: String,

    /// Salted SHA-256 digest of the password. Opaque to callers.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A named label attachable to issues.
///
/// Names are case-sensitive unique across all tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,

    /// Tag name (1-50 chars).
    pub name: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The primary issue entity, as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub id: i64,

    /// Title (1-255 chars).
    pub title: String,

    /// Detailed description (unbounded, may be empty).
    pub description: String,

    /// Workflow status.
    #[serde(default)]
    pub status: Status,

    /// Assigned user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,

    /// Creating user. Set once at creation, never changed.
    pub creator_id: i64,

    /// Creation timestamp. Immutable.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp. Bumped on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// An issue with its relations resolved for presentation.
///
/// This is the only issue representation exposed across the service boundary.
/// Tag order follows the junction lookup order and is not guaranteed sorted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueAggregate {
    #[serde(flatten)]
    pub issue: Issue,
    pub creator: User,
    pub assignee: Option<User>,
    pub tags: Vec<Tag>,
}

/// Input for creating an issue.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateIssueInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `not started` when omitted.
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
}

/// Input for updating an issue. Fields set to `None` are left unchanged.
///
/// `assignee_id` is doubly optional: `None` means "leave unchanged",
/// `Some(None)` means "unassign", `Some(Some(id))` means "assign to id".
/// `tag_ids: Some(v)` replaces the full tag set with `v` (empty `v` clears);
/// `tag_ids: None` leaves the tag set untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateIssueInput {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub assignee_id: Option<Option<i64>>,
    pub tag_ids: Option<Vec<i64>>,
}

impl UpdateIssueInput {
    /// True when no field beyond the id is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignee_id.is_none()
            && self.tag_ids.is_none()
    }
}

/// Sparse filter over issues. Absent fields mean "no constraint".
#[derive(Debug, Clone, Deserialize, Default)]
pub struct IssueFilter {
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub tag_id: Option<i64>,
}
