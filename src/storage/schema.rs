//! Database schema definitions.

use rusqlite::{Connection, Result};

/// The complete SQL schema for the tickets database.
///
/// Uniqueness lives in the schema where it is the source of truth: user
/// email, tag name (case-sensitive), and the (issue_id, tag_id) pair on the
/// junction table. Foreign keys are declared without cascades; the deletion
/// paths remove junction rows themselves inside their transaction.
pub const SCHEMA_SQL: &str = r"
    -- Users
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    -- Tags
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        CHECK (length(name) >= 1 AND length(name) <= 50)
    );

    -- Issues
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'not started',
        assignee_id INTEGER REFERENCES users(id),
        creator_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK (length(title) >= 1 AND length(title) <= 255),
        CHECK (status IN ('not started', 'in progress', 'done'))
    );

    CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
    CREATE INDEX IF NOT EXISTS idx_issues_assignee_id ON issues(assignee_id);
    CREATE INDEX IF NOT EXISTS idx_issues_creator_id ON issues(creator_id);

    -- Issue <-> Tag junction (many-to-many)
    CREATE TABLE IF NOT EXISTS issue_tags (
        issue_id INTEGER NOT NULL REFERENCES issues(id),
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (issue_id, tag_id)
    );
    CREATE INDEX IF NOT EXISTS idx_issue_tags_tag_id ON issue_tags(tag_id);
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Enable foreign keys
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}
