//! FlexList Layout Engine
//!
//! Per-user ordering and visibility of admin console lists and indexes.
//!
//! Layered architecture:
//! - domain: Elements, scopes, documents and errors
//! - reconcile: Merge/edit of element levels and the recursion guard
//! - source: What the host console currently offers
//! - repository: Preference storage (SQLite, in-memory)
//! - engine: Render and edit paths
//! - commands: Edit protocol handlers

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod domain;
pub mod engine;
pub mod reconcile;
pub mod repository;
pub mod source;

pub use commands::{LayoutCommands, Method, ProtocolResponse};
pub use config::FlexListConfig;
pub use domain::{DomainError, DomainResult, Element, ElementEdit, ModelRef, Scope, UserId};
pub use engine::{AppView, LayoutEngine, LayoutView, ModelView};
pub use reconcile::RequestContext;
pub use source::{AuthoritativeSource, StaticSource};

use repository::{init_db, SqlitePreferenceStore};

/// Start logging, open the preference database and wire the handlers.
///
/// A logger installed earlier (by the host or a previous call) is kept.
pub async fn bootstrap(
    config: &FlexListConfig,
    source: Arc<dyn AuthoritativeSource>,
) -> DomainResult<LayoutCommands> {
    if let Err(e) = rolling_logger::init_logger_with_capacity(
        &config.log_dir,
        &config.app_name,
        config.log_buffer_lines,
    ) {
        log::debug!("Keeping existing logger: {}", e);
    }

    let db_state = init_db(&config.db_path).await?;
    let store = Arc::new(SqlitePreferenceStore::new(db_state.conn.clone()));
    let engine = Arc::new(LayoutEngine::new(source, store));
    Ok(LayoutCommands::new(engine, config.route_prefix.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceElement;

    #[tokio::test]
    async fn test_bootstrap_persists_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlexListConfig {
            db_path: dir.path().join("layouts.db"),
            log_dir: dir.path().join("logs"),
            ..FlexListConfig::default()
        };
        let source: Arc<dyn AuthoritativeSource> = Arc::new(
            StaticSource::new()
                .with_model("users", "User", "Users")
                .with_list_display(
                    "users",
                    "User",
                    vec![SourceElement::from_name("email"), SourceElement::from_name("id")],
                ),
        );
        let route = "daf/apps/users/models/user/list_display/";
        let body = br#"{"data":[{"name":"id","visible":true},{"name":"email","visible":false}]}"#;

        let commands = bootstrap(&config, source.clone()).await.unwrap();
        let ctx = RequestContext::new(UserId::new("jon.doe"));
        assert_eq!(commands.handle(&ctx, Method::Post, route, body).await.status, 200);
        drop(commands);

        let commands = bootstrap(&config, source).await.unwrap();
        let ctx = RequestContext::new(UserId::new("jon.doe"));
        let names = commands
            .engine()
            .visible_list_display(&ctx, &ModelRef::new("users", "User"))
            .await
            .unwrap();
        assert_eq!(names, vec!["id"]);
    }
}
