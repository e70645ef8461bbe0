//! Repository Integration Tests
//!
//! Tests for SqlitePreferenceStore with in-memory and file-backed SQLite.

#[cfg(test)]
mod tests {
    use crate::domain::{
        DomainError, Element, PreferenceDocument, Scope, TreeLayout, UserId, SCHEMA_VERSION,
    };
    use crate::repository::{init_db, PreferenceStore, SqlitePreferenceStore};
    use rusqlite::params;
    use std::path::PathBuf;

    async fn setup_test_db() -> SqlitePreferenceStore {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        let db_state = init_db(&db_path).await.expect("Failed to init test DB");
        SqlitePreferenceStore::new(db_state.conn.clone())
    }

    fn user() -> UserId {
        UserId::new("jon.doe")
    }

    fn columns() -> PreferenceDocument {
        PreferenceDocument::Flat(vec![
            Element::new("email", "Email", true),
            Element::new("id", "ID", false),
        ])
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let repo = setup_test_db().await;
        let loaded = repo.load(&user(), &Scope::AppIndex).await.expect("Load failed");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repo = setup_test_db().await;
        let scope = Scope::list_view("users", "user");

        repo.save(&user(), &scope, &columns()).await.expect("Save failed");

        let loaded = repo.load(&user(), &scope).await.expect("Load failed");
        assert_eq!(loaded, Some(columns()));
        assert!(repo.updated_at(&user(), &scope).await.unwrap().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_save_overwrites_wholesale() {
        let repo = setup_test_db().await;
        let scope = Scope::list_view("users", "user");

        repo.save(&user(), &scope, &columns()).await.unwrap();
        let replacement = PreferenceDocument::Flat(vec![Element::new("role", "Role", true)]);
        repo.save(&user(), &scope, &replacement).await.unwrap();

        assert_eq!(repo.load(&user(), &scope).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_documents_are_per_user_and_scope() {
        let repo = setup_test_db().await;
        let scope = Scope::list_view("users", "user");

        repo.save(&user(), &scope, &columns()).await.unwrap();

        let other_user = repo.load(&UserId::new("jane.doe"), &scope).await.unwrap();
        let other_scope = repo.load(&user(), &Scope::list_view("blog", "post")).await.unwrap();
        assert!(other_user.is_none());
        assert!(other_scope.is_none());
    }

    #[tokio::test]
    async fn test_invalid_save_leaves_state_untouched() {
        let repo = setup_test_db().await;
        let scope = Scope::list_view("users", "user");
        repo.save(&user(), &scope, &columns()).await.unwrap();

        let duplicate = PreferenceDocument::Flat(vec![
            Element::new("id", "ID", true),
            Element::new("id", "ID", false),
        ]);
        let err = repo.save(&user(), &scope, &duplicate).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(repo.load(&user(), &scope).await.unwrap(), Some(columns()));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_rejected_on_save() {
        let repo = setup_test_db().await;
        let err = repo.save(&user(), &Scope::AppIndex, &columns()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_corrupt_row_loads_as_none() {
        let scope = Scope::AppIndex;
        let db_state = init_db(&PathBuf::from(":memory:")).await.unwrap();
        let repo = SqlitePreferenceStore::new(db_state.conn.clone());
        {
            let guard = db_state.conn.lock().await;
            let conn = guard.as_ref().unwrap();
            conn.execute(
                "INSERT INTO layout_preferences (user_id, scope_key, kind, schema_version, document)
                 VALUES (?1, ?2, 'tree', ?3, ?4)",
                params!["jon.doe", scope.key(), SCHEMA_VERSION, r#"{"app_list": "nope"}"#],
            )
            .unwrap();
        }

        assert!(repo.load(&user(), &scope).await.unwrap().is_none());
        assert!(repo.load_row(&user(), &scope).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tree_document_round_trip() {
        let repo = setup_test_db().await;
        let tree = TreeLayout::default()
            .with_app_list(vec![Element::new("blog", "Blog", false)])
            .with_model_list("blog", vec![Element::new("Post", "Posts", true)]);
        let doc = PreferenceDocument::Tree(tree);

        repo.save(&user(), &Scope::AppIndex, &doc).await.unwrap();

        assert_eq!(repo.load(&user(), &Scope::AppIndex).await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn test_file_backed_db_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flexlist.db");
        let scope = Scope::list_view("users", "user");

        {
            let state = init_db(&path).await.unwrap();
            let repo = SqlitePreferenceStore::new(state.conn.clone());
            repo.save(&user(), &scope, &columns()).await.unwrap();
        }

        let state = init_db(&path).await.unwrap();
        let repo = SqlitePreferenceStore::new(state.conn.clone());
        assert_eq!(repo.load(&user(), &scope).await.unwrap(), Some(columns()));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let repo = setup_test_db().await;
        let scope = Scope::list_view("users", "user");
        let first = PreferenceDocument::Flat(vec![Element::new("a", "A", true)]);
        let second = PreferenceDocument::Flat(vec![Element::new("b", "B", true)]);

        repo.save(&user(), &scope, &first).await.unwrap();
        repo.save(&user(), &scope, &second).await.unwrap();

        assert_eq!(repo.load(&user(), &scope).await.unwrap(), Some(second));
    }
}
