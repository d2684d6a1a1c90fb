//! Filter-evaluator tests: scalar pushdown, junction post-filter, and their
//! conjunction.

mod common;

use common::{fixtures, test_db};
use tickets::model::{IssueFilter, Status};
use tickets::service;

#[test]
fn no_filter_returns_every_issue() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    fixtures::issue(&mut store, creator.id, "one");
    fixtures::issue(&mut store, creator.id, "two");

    let all = service::get_issues(&store, &IssueFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn status_and_assignee_combine_with_and() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let alice = fixtures::user(&mut store, "alice@example.com");
    let bob = fixtures::user(&mut store, "bob@example.com");

    fixtures::issue_with(&mut store, creator.id, "alice done", Status::Done, Some(alice.id), &[]);
    fixtures::issue_with(
        &mut store,
        creator.id,
        "alice wip",
        Status::InProgress,
        Some(alice.id),
        &[],
    );
    fixtures::issue_with(&mut store, creator.id, "bob done", Status::Done, Some(bob.id), &[]);

    let filter = IssueFilter {
        assignee_id: Some(alice.id),
        status: Some(Status::Done),
        tag_id: None,
    };
    let results = service::get_issues(&store, &filter).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].issue.title, "alice done");
}

#[test]
fn absent_assignee_filter_is_no_constraint_not_match_null() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let alice = fixtures::user(&mut store, "alice@example.com");

    fixtures::issue_with(&mut store, creator.id, "assigned", Status::Done, Some(alice.id), &[]);
    fixtures::issue_with(&mut store, creator.id, "unassigned", Status::Done, None, &[]);

    let filter = IssueFilter {
        status: Some(Status::Done),
        ..Default::default()
    };
    assert_eq!(service::get_issues(&store, &filter).unwrap().len(), 2);
}

#[test]
fn tag_filter_intersects_with_scalar_filters() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let bug = fixtures::tag(&mut store, "bug");
    let feature = fixtures::tag(&mut store, "feature");

    let i1 = fixtures::issue_with(&mut store, creator.id, "I1", Status::Done, None, &[bug.id]);
    fixtures::issue_with(&mut store, creator.id, "I2", Status::Done, None, &[feature.id]);
    fixtures::issue_with(&mut store, creator.id, "I3", Status::InProgress, None, &[bug.id]);

    let filter = IssueFilter {
        assignee_id: None,
        status: Some(Status::Done),
        tag_id: Some(bug.id),
    };
    let results = service::get_issues(&store, &filter).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].issue.id, i1.issue.id);
}

#[test]
fn empty_intersection_is_an_empty_result_not_an_error() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let bug = fixtures::tag(&mut store, "bug");
    fixtures::issue_with(&mut store, creator.id, "wip bug", Status::InProgress, None, &[bug.id]);

    let filter = IssueFilter {
        assignee_id: None,
        status: Some(Status::Done),
        tag_id: Some(bug.id),
    };
    assert!(service::get_issues(&store, &filter).unwrap().is_empty());
}

#[test]
fn tag_filter_with_unused_tag_returns_empty() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let lonely = fixtures::tag(&mut store, "lonely");
    fixtures::issue(&mut store, creator.id, "untagged");

    let filter = IssueFilter {
        tag_id: Some(lonely.id),
        ..Default::default()
    };
    assert!(service::get_issues(&store, &filter).unwrap().is_empty());
}

#[test]
fn results_are_assembled_aggregates() {
    let mut store = test_db();
    let creator = fixtures::user(&mut store, "creator@example.com");
    let alice = fixtures::user(&mut store, "alice@example.com");
    let bug = fixtures::tag(&mut store, "bug");
    fixtures::issue_with(
        &mut store,
        creator.id,
        "full",
        Status::InProgress,
        Some(alice.id),
        &[bug.id],
    );

    let results = service::get_issues(&store, &IssueFilter::default()).unwrap();
    assert_eq!(results.len(), 1);
    let aggregate = &results[0];
    assert_eq!(aggregate.creator.email, "creator@example.com");
    assert_eq!(
        aggregate.assignee.as_ref().map(|u| u.email.as_str()),
        Some("alice@example.com")
    );
    assert_eq!(aggregate.tags[0].name, "bug");
}
