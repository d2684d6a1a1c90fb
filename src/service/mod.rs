//! Boundary operations for the issue store.
//!
//! Each function mirrors one operation of the external contract: validate
//! cross-entity references, perform the write through `SqliteStore`, then
//! hand the result to the assembler so callers only ever see fully-populated
//! aggregates. Every reference is validated before the corresponding write is
//! attempted; the store should never have to reject a write this layer did
//! not already know would fail.

use crate::assemble::{self, RelationSource};
use crate::error::{Result, TicketsError};
use crate::model::{
    CreateIssueInput, Issue, IssueAggregate, IssueFilter, Tag, UpdateIssueInput,
};
use crate::storage::{ListFilters, SqliteStore};
use crate::validation;
use serde::Serialize;

/// Wire-shaped deletion outcome. `success` reflects whether a row existed to
/// delete; deleting a missing row is a no-op, not an error.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub success: bool,
}

/// Create an issue on behalf of `creator_id`.
///
/// # Errors
///
/// Fails with a validation error when the creator, the assignee, or any
/// supplied tag id does not exist. Invalid tag ids are collected into one
/// error naming all of them, so no bad reference is silently dropped.
pub fn create_issue(
    store: &mut SqliteStore,
    input: &CreateIssueInput,
    creator_id: i64,
) -> Result<IssueAggregate> {
    validation::validate_create_issue(input)?;

    // Creation requires an authenticated actor; a missing creator means the
    // caller handed us a dangling id.
    if !store.user_exists(creator_id)? {
        return Err(TicketsError::InvalidReferences {
            entity: "Creator",
            ids: vec![creator_id],
        });
    }

    if let Some(assignee_id) = input.assignee_id {
        if !store.user_exists(assignee_id)? {
            return Err(TicketsError::InvalidReferences {
                entity: "Assignee",
                ids: vec![assignee_id],
            });
        }
    }

    if let Some(ref tag_ids) = input.tag_ids {
        let missing = store.filter_missing_tag_ids(tag_ids)?;
        if !missing.is_empty() {
            return Err(TicketsError::InvalidReferences {
                entity: "Tags",
                ids: missing,
            });
        }
    }

    let issue = store.create_issue(input, creator_id)?;
    tracing::info!(issue_id = issue.id, creator_id, "issue created");
    assemble_one(store, issue)
}

/// Patch an issue. Absent fields are left unchanged; `assignee_id:
/// Some(None)` unassigns; `tag_ids` replaces the full tag set when present.
///
/// # Errors
///
/// `NotFound` when the issue id does not exist; validation errors for bad
/// references, checked before anything is written.
pub fn update_issue(store: &mut SqliteStore, input: &UpdateIssueInput) -> Result<IssueAggregate> {
    validation::validate_update_issue(input)?;

    if store.get_issue(input.id)?.is_none() {
        return Err(TicketsError::NotFound {
            entity: "Issue",
            id: input.id,
        });
    }

    if let Some(Some(assignee_id)) = input.assignee_id {
        if !store.user_exists(assignee_id)? {
            return Err(TicketsError::InvalidReferences {
                entity: "Assignee",
                ids: vec![assignee_id],
            });
        }
    }

    if let Some(ref tag_ids) = input.tag_ids {
        let missing = store.filter_missing_tag_ids(tag_ids)?;
        if !missing.is_empty() {
            return Err(TicketsError::InvalidReferences {
                entity: "Tags",
                ids: missing,
            });
        }
    }

    let issue = store.update_issue(input)?;
    tracing::info!(issue_id = issue.id, "issue updated");
    assemble_one(store, issue)
}

/// Delete an issue and its junction rows.
///
/// # Errors
///
/// Returns an error only on database failure; a missing id yields
/// `success: false`.
pub fn delete_issue(store: &mut SqliteStore, id: i64) -> Result<DeleteResult> {
    let success = store.delete_issue(id)?;
    tracing::info!(issue_id = id, success, "issue deleted");
    Ok(DeleteResult { success })
}

/// Query issues with an optional sparse filter and assemble the results.
///
/// Scalar predicates (`assignee_id`, `status`) combine with AND and are
/// pushed to storage; `tag_id` is resolved through the junction and applied
/// as a membership post-filter. An empty intersection is an empty result.
///
/// # Errors
///
/// Returns an error if a lookup fails or assembly hits an integrity fault.
pub fn get_issues(store: &SqliteStore, filter: &IssueFilter) -> Result<Vec<IssueAggregate>> {
    let scalar = ListFilters {
        assignee_id: filter.assignee_id,
        status: filter.status,
    };
    let mut issues = store.list_issues(&scalar)?;

    if let Some(tag_id) = filter.tag_id {
        let tagged = store.issue_ids_with_tag(tag_id)?;
        issues.retain(|issue| tagged.contains(&issue.id));
    }

    assemble::assemble(store, issues)
}

/// Look up a single issue aggregate.
///
/// # Errors
///
/// Returns an error if a lookup fails or assembly hits an integrity fault;
/// a missing id is `Ok(None)`.
pub fn get_issue_by_id(store: &SqliteStore, id: i64) -> Result<Option<IssueAggregate>> {
    match store.get_issue(id)? {
        Some(issue) => assemble_one(store, issue).map(Some),
        None => Ok(None),
    }
}

/// Create a tag. The storage-level unique constraint on name is the source
/// of truth for create-time uniqueness.
///
/// # Errors
///
/// `Uniqueness` on a duplicate name, validation error on a bad name.
pub fn create_tag(store: &mut SqliteStore, name: &str) -> Result<Tag> {
    validation::validate_tag_name(name)?;
    let tag = store.insert_tag(name)?;
    tracing::info!(tag_id = tag.id, name, "tag created");
    Ok(tag)
}

/// Rename a tag, pre-checking that no *other* tag holds the target name.
/// Renaming a tag to its own current name always succeeds.
///
/// # Errors
///
/// `NotFound` for a missing tag, `Uniqueness` when another tag owns the
/// name (whether caught by the pre-check or a racing constraint violation).
pub fn update_tag(store: &mut SqliteStore, id: i64, name: &str) -> Result<Tag> {
    validation::validate_tag_name(name)?;

    if store.get_tag(id)?.is_none() {
        return Err(TicketsError::NotFound { entity: "Tag", id });
    }

    if store.tag_name_taken_by_other(name, id)? {
        return Err(TicketsError::Uniqueness {
            entity: "Tag",
            field: "name",
            value: name.to_string(),
        });
    }

    store.update_tag_name(id, name)
}

/// Delete a tag and its junction rows, leaving issues intact but tag-less.
///
/// # Errors
///
/// Returns an error only on database failure; a missing id yields
/// `success: false`.
pub fn delete_tag(store: &mut SqliteStore, id: i64) -> Result<DeleteResult> {
    let success = store.delete_tag(id)?;
    tracing::info!(tag_id = id, success, "tag deleted");
    Ok(DeleteResult { success })
}

/// List all tags ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_tags(store: &SqliteStore) -> Result<Vec<Tag>> {
    store.list_tags()
}

fn assemble_one<S: RelationSource>(source: &S, issue: Issue) -> Result<IssueAggregate> {
    let mut aggregates = assemble::assemble(source, vec![issue])?;
    aggregates.pop().ok_or_else(|| TicketsError::Integrity {
        message: "assembler returned no aggregate for a single issue".to_string(),
    })
}
