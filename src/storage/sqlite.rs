//! `SQLite` storage implementation.
//!
//! `SqliteStore` is the entity store: point lookups, equality/set-membership
//! filters, and the transactional writes the mutation paths compose. Batch
//! relation lookups chunk their id sets to stay under the `SQLite` variable
//! limit.

use crate::error::{Result, TicketsError};
use crate::model::{CreateIssueInput, Issue, Status, Tag, UpdateIssueInput, User};
use crate::storage::schema::apply_schema;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// SQLite has a finite variable limit (default 999). Chunk to avoid query failures.
const SQLITE_VAR_LIMIT: usize = 900;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

/// Scalar issue filters pushed down to the storage layer as equality
/// predicates. The tag filter spans the junction table and is applied by the
/// caller as a set intersection.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub assignee_id: Option<i64>,
    pub status: Option<Status>,
}

impl SqliteStore {
    /// Open a connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Execute a mutation inside an immediate transaction.
    ///
    /// Compound writes (issue + junction rows) must appear as a single
    /// durable unit; everything in `f` commits or rolls back together.
    ///
    /// # Errors
    ///
    /// Returns the closure's error after rolling back, or a database error
    /// from the transaction machinery itself.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        tracing::debug!(op, "mutation committed");
        Ok(result)
    }

    // === Users ===

    /// Insert a user row.
    ///
    /// # Errors
    ///
    /// Returns `Uniqueness` on an email collision.
    pub fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User> {
        let created_at = Utc::now();
        let id = self.mutate("insert_user", |tx| {
            tx.execute(
                "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)",
                rusqlite::params![email, password_hash, created_at.to_rfc3339()],
            )
            .map_err(|e| map_unique(e, "User", "email", email))?;
            Ok(tx.last_insert_rowid())
        })?;

        Ok(User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, password_hash, created_at FROM users WHERE id = ?")?;
        Ok(stmt.query_row([id], user_from_row).optional()?)
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, password_hash, created_at FROM users WHERE email = ?")?;
        Ok(stmt.query_row([email], user_from_row).optional()?)
    }

    /// Check whether a user id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn user_exists(&self, id: i64) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM users WHERE id = ?")?;
        Ok(stmt.exists([id])?)
    }

    /// Batch-load users by id. One set-membership query per chunk, never one
    /// per id. Ids absent from the table are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut map = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(SQLITE_VAR_LIMIT) {
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let sql = format!(
                "SELECT id, email, password_hash, created_at FROM users WHERE id IN ({})",
                placeholders.join(",")
            );

            let params: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params.as_slice(), user_from_row)?;
            for row in rows {
                let user = row?;
                map.insert(user.id, user);
            }
        }

        Ok(map)
    }

    // === Tags ===

    /// Insert a tag row. The UNIQUE constraint on name is the source of
    /// truth for tag-name uniqueness on create.
    ///
    /// # Errors
    ///
    /// Returns `Uniqueness` on a name collision.
    pub fn insert_tag(&mut self, name: &str) -> Result<Tag> {
        let created_at = Utc::now();
        let id = self.mutate("insert_tag", |tx| {
            tx.execute(
                "INSERT INTO tags (name, created_at) VALUES (?, ?)",
                rusqlite::params![name, created_at.to_rfc3339()],
            )
            .map_err(|e| map_unique(e, "Tag", "name", name))?;
            Ok(tx.last_insert_rowid())
        })?;

        Ok(Tag {
            id,
            name: name.to_string(),
            created_at,
        })
    }

    /// Get a tag by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM tags WHERE id = ?")?;
        Ok(stmt.query_row([id], tag_from_row).optional()?)
    }

    /// List all tags ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// Check whether any tag other than `id` carries `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn tag_name_taken_by_other(&self, name: &str, id: i64) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM tags WHERE name = ? AND id != ?")?;
        Ok(stmt.exists(rusqlite::params![name, id])?)
    }

    /// Rename a tag. Callers run the uniqueness pre-check first; a racing
    /// insert can still trip the constraint, which maps to `Uniqueness`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tag is absent, `Uniqueness` on collision.
    pub fn update_tag_name(&mut self, id: i64, name: &str) -> Result<Tag> {
        self.mutate("update_tag_name", |tx| {
            let rows = tx
                .execute(
                    "UPDATE tags SET name = ? WHERE id = ?",
                    rusqlite::params![name, id],
                )
                .map_err(|e| map_unique(e, "Tag", "name", name))?;
            if rows == 0 {
                return Err(TicketsError::NotFound { entity: "Tag", id });
            }
            Ok(())
        })?;

        self.get_tag(id)?
            .ok_or(TicketsError::NotFound { entity: "Tag", id })
    }

    /// Delete a tag and every junction row referencing it, as one unit.
    /// Issues keep their other tags. Returns whether the tag row existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn delete_tag(&mut self, id: i64) -> Result<bool> {
        self.mutate("delete_tag", |tx| {
            tx.execute("DELETE FROM issue_tags WHERE tag_id = ?", [id])?;
            let rows = tx.execute("DELETE FROM tags WHERE id = ?", [id])?;
            Ok(rows > 0)
        })
    }

    /// Return the supplied ids that do not name an existing tag, validated
    /// against a single tag listing. Input order is preserved so the caller
    /// can report every invalid id in one error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn filter_missing_tag_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare("SELECT id FROM tags")?;
        let existing: HashSet<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;

        Ok(ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect())
    }

    // === Issues ===

    /// Insert an issue row plus its junction rows in one transaction.
    ///
    /// Reference validation happens before this is called; the transaction
    /// boundary guarantees the issue and its tag set appear together.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn create_issue(&mut self, input: &CreateIssueInput, creator_id: i64) -> Result<Issue> {
        let now = Utc::now();
        let status = input.status.unwrap_or_default();

        let id = self.mutate("create_issue", |tx| {
            tx.execute(
                "INSERT INTO issues (title, description, status, assignee_id, creator_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    input.title,
                    input.description,
                    status.as_str(),
                    input.assignee_id,
                    creator_id,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            let issue_id = tx.last_insert_rowid();

            if let Some(ref tag_ids) = input.tag_ids {
                insert_junction_rows(tx, issue_id, tag_ids)?;
            }

            Ok(issue_id)
        })?;

        Ok(Issue {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            status,
            assignee_id: input.assignee_id,
            creator_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an issue by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_issue(&self, id: i64) -> Result<Option<Issue>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, status, assignee_id, creator_id, created_at, updated_at
             FROM issues WHERE id = ?",
        )?;
        Ok(stmt.query_row([id], issue_from_row).optional()?)
    }

    /// List issues with scalar filters pushed down as equality predicates.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_issues(&self, filters: &ListFilters) -> Result<Vec<Issue>> {
        let mut sql = String::from(
            "SELECT id, title, description, status, assignee_id, creator_id, created_at, updated_at
             FROM issues WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(assignee_id) = filters.assignee_id {
            sql.push_str(" AND assignee_id = ?");
            params.push(Box::new(assignee_id));
        }

        if let Some(status) = filters.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(params_refs.as_slice(), issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    /// Patch an issue's fields and, when a tag set is supplied, replace its
    /// junction rows, all in one transaction. `updated_at` is refreshed on
    /// every call, even when nothing else changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the issue doesn't exist.
    #[allow(clippy::too_many_lines)]
    pub fn update_issue(&mut self, updates: &UpdateIssueInput) -> Result<Issue> {
        let id = updates.id;
        if self.get_issue(id)?.is_none() {
            return Err(TicketsError::NotFound { entity: "Issue", id });
        }

        self.mutate("update_issue", |tx| {
            let mut set_clauses: Vec<String> = vec![];
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

            let mut add_update = |field: &str, val: Box<dyn rusqlite::ToSql>| {
                set_clauses.push(format!("{field} = ?"));
                params.push(val);
            };

            if let Some(ref title) = updates.title {
                add_update("title", Box::new(title.clone()));
            }

            if let Some(ref description) = updates.description {
                add_update("description", Box::new(description.clone()));
            }

            if let Some(status) = updates.status {
                add_update("status", Box::new(status.as_str().to_string()));
            }

            // Some(None) unassigns; None leaves the assignee untouched.
            if let Some(assignee_id) = updates.assignee_id {
                add_update("assignee_id", Box::new(assignee_id));
            }

            // Always refresh updated_at, even for a no-op field update.
            set_clauses.push("updated_at = ?".to_string());
            params.push(Box::new(Utc::now().to_rfc3339()));

            let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
            params.push(Box::new(id));

            let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
            tx.execute(&sql, params_refs.as_slice())?;

            // Replace-all tag reconciliation: delete-then-insert, never a diff.
            if let Some(ref tag_ids) = updates.tag_ids {
                tx.execute("DELETE FROM issue_tags WHERE issue_id = ?", [id])?;
                insert_junction_rows(tx, id, tag_ids)?;
            }

            Ok(())
        })?;

        self.get_issue(id)?
            .ok_or(TicketsError::NotFound { entity: "Issue", id })
    }

    /// Delete an issue and every junction row referencing it, as one unit.
    /// Tags themselves are left untouched. Returns whether the issue row
    /// existed; deleting a missing issue is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn delete_issue(&mut self, id: i64) -> Result<bool> {
        self.mutate("delete_issue", |tx| {
            tx.execute("DELETE FROM issue_tags WHERE issue_id = ?", [id])?;
            let rows = tx.execute("DELETE FROM issues WHERE id = ?", [id])?;
            Ok(rows > 0)
        })
    }

    // === Junction lookups ===

    /// The set of issue ids associated with a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn issue_ids_with_tag(&self, tag_id: i64) -> Result<HashSet<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT issue_id FROM issue_tags WHERE tag_id = ?")?;
        let ids = stmt
            .query_map([tag_id], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    /// Batch-load tags for multiple issues via the junction-joined-to-tag
    /// view, grouped by issue id. Per-issue order follows junction insertion
    /// order. Issues with no tags are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn tags_for_issues(&self, issue_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        if issue_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut map: HashMap<i64, Vec<Tag>> = HashMap::new();
        for chunk in issue_ids.chunks(SQLITE_VAR_LIMIT) {
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let sql = format!(
                "SELECT j.issue_id, t.id, t.name, t.created_at
                 FROM issue_tags j
                 JOIN tags t ON t.id = j.tag_id
                 WHERE j.issue_id IN ({})
                 ORDER BY j.rowid",
                placeholders.join(",")
            );

            let params: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params.as_slice(), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Tag {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        created_at: parse_ts(row, 3)?,
                    },
                ))
            })?;

            for row in rows {
                let (issue_id, tag) = row?;
                map.entry(issue_id).or_default().push(tag);
            }
        }

        Ok(map)
    }
}

impl crate::assemble::RelationSource for SqliteStore {
    fn users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        Self::users_by_ids(self, ids)
    }

    fn tags_for_issues(&self, issue_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        Self::tags_for_issues(self, issue_ids)
    }
}

fn insert_junction_rows(tx: &Transaction, issue_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO issue_tags (issue_id, tag_id) VALUES (?, ?)")?;
    for tag_id in tag_ids {
        stmt.execute(rusqlite::params![issue_id, tag_id])?;
    }
    Ok(())
}

/// Map a UNIQUE-constraint violation to `Uniqueness`; pass others through.
fn map_unique(
    err: rusqlite::Error,
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> TicketsError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            return TicketsError::Uniqueness {
                entity,
                field,
                value: value.to_string(),
            };
        }
    }
    TicketsError::Database(err)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_ts(row, 3)?,
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_ts(row, 2)?,
    })
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status_str: String = row.get(3)?;
    let status = Status::from_str(&status_str).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("invalid status: {status_str}").into(),
        )
    })?;

    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status,
        assignee_id: row.get(4)?,
        creator_id: row.get(5)?,
        created_at: parse_ts(row, 6)?,
        updated_at: parse_ts(row, 7)?,
    })
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
