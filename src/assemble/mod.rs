//! Batch relation assembly.
//!
//! Reconstructs fully-populated issue aggregates from normalized rows using
//! the fan-out/fan-in pattern: collect distinct foreign-key sets up front,
//! issue one set-membership lookup per relation kind, then resolve through
//! in-memory maps. For n issues this performs at most three lookups total,
//! never one per row.

use crate::error::{Result, TicketsError};
use crate::model::{Issue, IssueAggregate, Tag, User};
use std::collections::HashMap;

/// Read-only relation lookups the assembler runs against.
///
/// `SqliteStore` implements this; tests wrap it to observe lookup counts.
pub trait RelationSource {
    /// Batch-load users by id. Ids with no row are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lookup fails.
    fn users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>>;

    /// Batch-load tags grouped by issue id via the junction, preserving the
    /// underlying lookup order within each group.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lookup fails.
    fn tags_for_issues(&self, issue_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>>;
}

/// Attach creator, assignee, and tag relations to a batch of issues.
///
/// Deterministic and side-effect free: output order matches input order, and
/// an empty input returns an empty output without issuing any lookups.
///
/// # Errors
///
/// Returns `Integrity` when a stored creator or assignee reference fails to
/// resolve. Both are data-integrity faults: every reference was validated at
/// write time, so a miss here means the store lost a row it should have kept.
pub fn assemble<S: RelationSource>(source: &S, issues: Vec<Issue>) -> Result<Vec<IssueAggregate>> {
    if issues.is_empty() {
        return Ok(Vec::new());
    }

    let creator_ids = distinct(issues.iter().map(|issue| issue.creator_id));
    let assignee_ids = distinct(issues.iter().filter_map(|issue| issue.assignee_id));
    let issue_ids: Vec<i64> = issues.iter().map(|issue| issue.id).collect();

    let creators = source.users_by_ids(&creator_ids)?;
    let assignees = if assignee_ids.is_empty() {
        HashMap::new()
    } else {
        source.users_by_ids(&assignee_ids)?
    };
    let mut tags_by_issue = source.tags_for_issues(&issue_ids)?;

    issues
        .into_iter()
        .map(|issue| {
            let creator = creators.get(&issue.creator_id).cloned().ok_or_else(|| {
                TicketsError::Integrity {
                    message: format!(
                        "issue {} references missing creator {}",
                        issue.id, issue.creator_id
                    ),
                }
            })?;

            let assignee = issue
                .assignee_id
                .map(|assignee_id| {
                    assignees.get(&assignee_id).cloned().ok_or_else(|| {
                        TicketsError::Integrity {
                            message: format!(
                                "issue {} references missing assignee {}",
                                issue.id, assignee_id
                            ),
                        }
                    })
                })
                .transpose()?;

            let tags = tags_by_issue.remove(&issue.id).unwrap_or_default();

            Ok(IssueAggregate {
                issue,
                creator,
                assignee,
                tags,
            })
        })
        .collect()
}

fn distinct(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
