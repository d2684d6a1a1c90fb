//! Boundary-contract tests for the issue operations.
//!
//! Covers reference validation (all invalid tag ids in one error), tag
//! round-trips, replace-all semantics, and deletion outcomes.

mod common;

use common::{fixtures, test_db};
use std::collections::HashSet;
use tickets::model::{CreateIssueInput, Status, UpdateIssueInput};
use tickets::{service, TicketsError};

#[test]
fn create_fails_when_creator_missing() {
    let mut store = test_db();

    let err = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: "orphan".to_string(),
            ..Default::default()
        },
        999,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        TicketsError::InvalidReferences { entity: "Creator", .. }
    ));
}

#[test]
fn create_fails_when_assignee_missing() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");

    let err = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: "bad assignee".to_string(),
            assignee_id: Some(777),
            ..Default::default()
        },
        creator.id,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        TicketsError::InvalidReferences { entity: "Assignee", ids } if ids == vec![777]
    ));
}

#[test]
fn create_collects_all_invalid_tag_ids_in_one_error() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let real = fixtures::tag(&mut store, "real");

    let err = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: "bad tags".to_string(),
            tag_ids: Some(vec![real.id, 501, 502]),
            ..Default::default()
        },
        creator.id,
    )
    .unwrap_err();

    match err {
        TicketsError::InvalidReferences { entity: "Tags", ids } => {
            assert_eq!(ids, vec![501, 502]);
        }
        other => panic!("expected InvalidReferences for tags, got {other}"),
    }
    // Nothing was written.
    assert!(service::get_issues(&store, &Default::default())
        .unwrap()
        .is_empty());
}

#[test]
fn create_then_get_by_id_returns_same_tag_set() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let a = fixtures::tag(&mut store, "a");
    let b = fixtures::tag(&mut store, "b");

    let created = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: "round trip".to_string(),
            tag_ids: Some(vec![a.id, b.id]),
            ..Default::default()
        },
        creator.id,
    )
    .unwrap();

    let fetched = service::get_issue_by_id(&store, created.issue.id)
        .unwrap()
        .expect("issue exists");

    let expected: HashSet<i64> = [a.id, b.id].into();
    let actual: HashSet<i64> = fetched.tags.iter().map(|t| t.id).collect();
    assert_eq!(actual, expected);
    assert_eq!(fetched.creator.email, "creator@example.com");
    assert!(fetched.assignee.is_none());
}

#[test]
fn get_issue_by_id_returns_none_for_missing() {
    let store = test_db();
    assert!(service::get_issue_by_id(&store, 31_337).unwrap().is_none());
}

#[test]
fn update_missing_issue_is_not_found() {
    let mut store = test_db();

    let err = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: 404,
            title: Some("ghost".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();

    assert!(matches!(err, TicketsError::NotFound { entity: "Issue", id: 404 }));
}

#[test]
fn update_fails_when_assignee_missing() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let created = fixtures::issue(&mut store, creator.id, "unassigned");

    let err = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            assignee_id: Some(Some(888)),
            ..Default::default()
        },
    )
    .unwrap_err();

    assert!(matches!(
        err,
        TicketsError::InvalidReferences { entity: "Assignee", ids } if ids == vec![888]
    ));

    // The bad update wrote nothing.
    let fetched = service::get_issue_by_id(&store, created.issue.id)
        .unwrap()
        .unwrap();
    assert!(fetched.assignee.is_none());
    assert_eq!(fetched.issue.updated_at, created.issue.updated_at);
}

#[test]
fn update_validates_references_before_writing() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let created = fixtures::issue(&mut store, creator.id, "stable");

    let err = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            title: Some("would change".to_string()),
            tag_ids: Some(vec![900, 901]),
            ..Default::default()
        },
    )
    .unwrap_err();

    assert!(matches!(err, TicketsError::InvalidReferences { entity: "Tags", .. }));

    // The bad update wrote nothing.
    let fetched = service::get_issue_by_id(&store, created.issue.id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.issue.title, "stable");
    assert!(fetched.tags.is_empty());
}

#[test]
fn replace_all_tag_update_is_idempotent() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let a = fixtures::tag(&mut store, "a");
    let b = fixtures::tag(&mut store, "b");
    let created = fixtures::issue_with(
        &mut store,
        creator.id,
        "retag",
        Status::NotStarted,
        None,
        &[a.id, b.id],
    );

    let update = UpdateIssueInput {
        id: created.issue.id,
        tag_ids: Some(vec![a.id]),
        ..Default::default()
    };
    let first = service::update_issue(&mut store, &update).unwrap();
    let second = service::update_issue(&mut store, &update).unwrap();

    let ids = |tags: &[tickets::Tag]| tags.iter().map(|t| t.id).collect::<Vec<_>>();
    assert_eq!(ids(&first.tags), vec![a.id]);
    assert_eq!(ids(&second.tags), vec![a.id]);
}

#[test]
fn empty_tag_list_clears_and_absent_leaves_unchanged() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let a = fixtures::tag(&mut store, "a");
    let created =
        fixtures::issue_with(&mut store, creator.id, "tags", Status::NotStarted, None, &[a.id]);

    // Absent tag_ids field: tags untouched.
    let untouched = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            title: Some("renamed".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(untouched.tags.len(), 1);

    // Explicit empty list: clear all tags.
    let cleared = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            tag_ids: Some(vec![]),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(cleared.tags.is_empty());
}

#[test]
fn update_reassign_and_unassign() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let worker = fixtures::user(&mut store, "worker@example.com");
    let created = fixtures::issue(&mut store, creator.id, "handoff");

    let assigned = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            assignee_id: Some(Some(worker.id)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(
        assigned.assignee.as_ref().map(|u| u.email.as_str()),
        Some("worker@example.com")
    );

    let unassigned = service::update_issue(
        &mut store,
        &UpdateIssueInput {
            id: created.issue.id,
            assignee_id: Some(None),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(unassigned.assignee.is_none());
}

#[test]
fn delete_issue_reports_existence() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let created = fixtures::issue(&mut store, creator.id, "short-lived");

    let first = service::delete_issue(&mut store, created.issue.id).unwrap();
    assert!(first.success);

    let second = service::delete_issue(&mut store, created.issue.id).unwrap();
    assert!(!second.success);
}

#[test]
fn create_rejects_empty_and_oversized_titles() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");

    let empty = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: String::new(),
            ..Default::default()
        },
        creator.id,
    );
    assert!(empty.is_err());

    let oversized = service::create_issue(
        &mut store,
        &CreateIssueInput {
            title: "x".repeat(256),
            ..Default::default()
        },
        creator.id,
    );
    assert!(oversized.is_err());
}
