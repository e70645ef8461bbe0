//! SQLite Preference Repository
//!
//! One row per (user, scope). Each save is a single `INSERT OR REPLACE`, so
//! a document is either fully replaced or not touched at all.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::{recover_stored, PreferenceStore, StoredRow};
use crate::domain::{DomainError, DomainResult, PreferenceDocument, Scope, UserId};

pub struct SqlitePreferenceStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqlitePreferenceStore {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// Raw row for (user, scope), undecoded
    pub async fn load_row(&self, user: &UserId, scope: &Scope) -> DomainResult<Option<StoredRow>> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        let row = conn
            .query_row(
                "SELECT kind, schema_version, document FROM layout_preferences
                 WHERE user_id = ?1 AND scope_key = ?2",
                params![user.as_str(), scope.key()],
                |row| {
                    Ok(StoredRow {
                        kind: row.get(0)?,
                        schema_version: row.get(1)?,
                        document: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Milliseconds timestamp of the last save for (user, scope)
    pub async fn updated_at(&self, user: &UserId, scope: &Scope) -> DomainResult<Option<i64>> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        let updated = conn
            .query_row(
                "SELECT updated_at FROM layout_preferences WHERE user_id = ?1 AND scope_key = ?2",
                params![user.as_str(), scope.key()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(updated)
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn load(&self, user: &UserId, scope: &Scope) -> DomainResult<Option<PreferenceDocument>> {
        let row = self.load_row(user, scope).await?;
        Ok(recover_stored(user, scope, row))
    }

    async fn save(
        &self,
        user: &UserId,
        scope: &Scope,
        document: &PreferenceDocument,
    ) -> DomainResult<()> {
        let row = StoredRow::encode(scope, document)?;

        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO layout_preferences
                (user_id, scope_key, kind, schema_version, document, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.as_str(),
                scope.key(),
                row.kind,
                row.schema_version,
                row.document,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;

        Ok(())
    }
}
