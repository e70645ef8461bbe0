//! In-memory Preference Repository
//!
//! Same codec and validation as the SQLite store, without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::traits::{recover_stored, PreferenceStore, StoredRow};
use crate::domain::{DomainResult, PreferenceDocument, Scope, UserId};

#[derive(Default)]
pub struct InMemoryPreferenceStore {
    rows: Mutex<HashMap<(UserId, String), StoredRow>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row as-is, bypassing validation
    pub async fn put_raw(&self, user: &UserId, scope: &Scope, row: StoredRow) {
        self.rows.lock().await.insert((user.clone(), scope.key()), row);
    }

    pub async fn raw(&self, user: &UserId, scope: &Scope) -> Option<StoredRow> {
        self.rows.lock().await.get(&(user.clone(), scope.key())).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self, user: &UserId, scope: &Scope) -> DomainResult<Option<PreferenceDocument>> {
        let row = self.raw(user, scope).await;
        Ok(recover_stored(user, scope, row))
    }

    async fn save(
        &self,
        user: &UserId,
        scope: &Scope,
        document: &PreferenceDocument,
    ) -> DomainResult<()> {
        let row = StoredRow::encode(scope, document)?;
        self.rows.lock().await.insert((user.clone(), scope.key()), row);
        Ok(())
    }
}
