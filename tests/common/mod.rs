//! Shared helpers for integration tests: real `SQLite` stores, no mocks.
#![allow(dead_code)]

use tickets::storage::SqliteStore;

/// An in-memory store with the schema applied.
pub fn test_db() -> SqliteStore {
    SqliteStore::open_memory().expect("open in-memory store")
}

/// A store backed by a temp file, for tests that reopen the database.
pub fn test_db_with_dir() -> (SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SqliteStore::open(&dir.path().join("tickets.db")).expect("open store");
    (store, dir)
}

pub mod fixtures {
    use tickets::model::{CreateIssueInput, IssueAggregate, Status, Tag, User};
    use tickets::storage::SqliteStore;
    use tickets::{directory, service};

    pub fn user(store: &mut SqliteStore, email: &str) -> User {
        directory::register_user(store, email, "hunter22").expect("register user")
    }

    pub fn tag(store: &mut SqliteStore, name: &str) -> Tag {
        service::create_tag(store, name).expect("create tag")
    }

    pub fn issue(store: &mut SqliteStore, creator_id: i64, title: &str) -> IssueAggregate {
        let input = CreateIssueInput {
            title: title.to_string(),
            ..Default::default()
        };
        service::create_issue(store, &input, creator_id).expect("create issue")
    }

    pub fn issue_with(
        store: &mut SqliteStore,
        creator_id: i64,
        title: &str,
        status: Status,
        assignee_id: Option<i64>,
        tag_ids: &[i64],
    ) -> IssueAggregate {
        let input = CreateIssueInput {
            title: title.to_string(),
            description: String::new(),
            status: Some(status),
            assignee_id,
            tag_ids: if tag_ids.is_empty() {
                None
            } else {
                Some(tag_ids.to_vec())
            },
        };
        service::create_issue(store, &input, creator_id).expect("create issue")
    }
}
