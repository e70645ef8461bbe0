//! Repository Layer - Core Traits
//!
//! Defines the preference store interface and the row codec shared by
//! every implementation (SQLite, in-memory).

use async_trait::async_trait;

use crate::domain::{
    DocumentKind, DomainError, DomainResult, PreferenceDocument, Scope, UserId, SCHEMA_VERSION,
};

/// One layout document per (user, scope).
///
/// `load` treats undecodable rows as absent. `save` replaces the whole
/// document or leaves the stored one untouched.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored document, or `None` if never saved or no longer valid
    async fn load(&self, user: &UserId, scope: &Scope) -> DomainResult<Option<PreferenceDocument>>;

    /// Validate and overwrite the document for (user, scope)
    async fn save(
        &self,
        user: &UserId,
        scope: &Scope,
        document: &PreferenceDocument,
    ) -> DomainResult<()>;
}

/// Raw persisted form of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub kind: String,
    pub schema_version: String,
    pub document: String,
}

impl StoredRow {
    /// Validate `document` for `scope` and serialize it
    pub fn encode(scope: &Scope, document: &PreferenceDocument) -> DomainResult<Self> {
        document.validate_for(scope)?;
        Ok(Self {
            kind: document.kind().as_str().to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            document: document.to_json()?,
        })
    }

    /// Decode for `scope`, failing with `StoredDataInvalid`
    pub fn decode(&self, scope: &Scope) -> DomainResult<PreferenceDocument> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(DomainError::StoredDataInvalid(format!(
                "unsupported schema version '{}'",
                self.schema_version
            )));
        }
        let kind: DocumentKind = scope.document_kind();
        if self.kind != kind.as_str() {
            return Err(DomainError::StoredDataInvalid(format!(
                "expected {} document, found '{}'",
                kind.as_str(),
                self.kind
            )));
        }
        PreferenceDocument::from_json(kind, &self.document)
            .map_err(|e| DomainError::StoredDataInvalid(e.to_string()))
    }
}

/// Decode a loaded row, logging and discarding it when invalid
pub(crate) fn recover_stored(
    user: &UserId,
    scope: &Scope,
    row: Option<StoredRow>,
) -> Option<PreferenceDocument> {
    let row = row?;
    match row.decode(scope) {
        Ok(document) => Some(document),
        Err(e) => {
            log::warn!("Ignoring stored layout for user {} scope {}: {}", user, scope, e);
            None
        }
    }
}
