//! Database Connection and Setup
//!
//! Opens the SQLite database and runs migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection slot; `None` until `init_db` has run
#[derive(Clone, Default)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
}

impl DbState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

/// Open (or create) the database at `db_path` and migrate it.
///
/// `:memory:` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Storage(format!("Failed to open db: {}", e)))?;

    run_migrations(&conn)?;

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);
    log::info!("Layout database ready at {}", db_path.display());
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS layout_preferences (
            user_id TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            kind TEXT NOT NULL,
            schema_version TEXT NOT NULL DEFAULT 'v0',
            document TEXT NOT NULL,
            PRIMARY KEY (user_id, scope_key)
        )",
        [],
    )?;

    if !column_exists(conn, "layout_preferences", "updated_at")? {
        conn.execute(
            "ALTER TABLE layout_preferences ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0",
            [],
        )
        .map_err(|e| DomainError::Storage(format!("Failed to add updated_at: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_migrations_are_repeatable() {
        let state = init_db(&PathBuf::from(":memory:")).await.unwrap();
        let guard = state.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        run_migrations(conn).unwrap();
        assert!(column_exists(conn, "layout_preferences", "updated_at").unwrap());
    }

    #[tokio::test]
    async fn test_uninitialized_state() {
        assert!(!DbState::new().is_initialized().await);
    }
}
