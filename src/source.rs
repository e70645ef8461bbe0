//! Authoritative Source
//!
//! The host console decides what exists: which apps and models the user may
//! see, and which columns a model's list view declares. The engine never
//! caches these answers beyond one request.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{DomainError, DomainResult, ModelRef, SourceElement};
use crate::reconcile::RequestContext;

/// Ground-truth listings, already filtered by the host's own permissions
#[async_trait]
pub trait AuthoritativeSource: Send + Sync {
    /// Apps on the index page, in display order
    async fn app_list(&self, ctx: &RequestContext) -> DomainResult<Vec<SourceElement>>;

    /// Models of one app, in display order
    async fn model_list(
        &self,
        ctx: &RequestContext,
        app_label: &str,
    ) -> DomainResult<Vec<SourceElement>>;

    /// Declared list-view columns of a model, or `None` when the model does
    /// not expose a customizable list view
    async fn list_display(
        &self,
        ctx: &RequestContext,
        model: &ModelRef,
    ) -> DomainResult<Option<Vec<SourceElement>>>;
}

#[derive(Debug, Clone)]
struct StaticModel {
    entry: SourceElement,
    list_display: Option<Vec<SourceElement>>,
}

#[derive(Debug, Clone)]
struct StaticApp {
    entry: SourceElement,
    models: Vec<StaticModel>,
}

/// Fixed registry of apps, models and columns.
///
/// Suits hosts whose registry is known at startup; it can be changed at
/// runtime to reflect deployments that add, rename or remove entries.
#[derive(Default)]
pub struct StaticSource {
    apps: RwLock<Vec<StaticApp>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, app_label: &str, description: &str) -> Self {
        self.add_app(app_label, description);
        self
    }

    pub fn with_model(self, app_label: &str, model: &str, description: &str) -> Self {
        self.add_model(app_label, model, description);
        self
    }

    pub fn with_list_display(self, app_label: &str, model: &str, columns: Vec<SourceElement>) -> Self {
        self.set_list_display(app_label, model, Some(columns));
        self
    }

    pub fn add_app(&self, app_label: &str, description: &str) {
        if let Ok(mut apps) = self.apps.write() {
            let label = app_label.to_lowercase();
            match apps.iter_mut().find(|app| app.entry.name == label) {
                Some(app) => app.entry.description = description.to_string(),
                None => apps.push(StaticApp {
                    entry: SourceElement::new(label, description),
                    models: Vec::new(),
                }),
            }
        }
    }

    pub fn remove_app(&self, app_label: &str) {
        if let Ok(mut apps) = self.apps.write() {
            let label = app_label.to_lowercase();
            apps.retain(|app| app.entry.name != label);
        }
    }

    /// Add a model (or relabel it); the app is created if missing
    pub fn add_model(&self, app_label: &str, model: &str, description: &str) {
        let label = app_label.to_lowercase();
        if !self.has_app(&label) {
            self.add_app(&label, &crate::domain::default_description(&label));
        }
        if let Ok(mut apps) = self.apps.write() {
            if let Some(app) = apps.iter_mut().find(|app| app.entry.name == label) {
                match app.models.iter_mut().find(|m| m.entry.name == model) {
                    Some(existing) => existing.entry.description = description.to_string(),
                    None => app.models.push(StaticModel {
                        entry: SourceElement::new(model, description),
                        list_display: None,
                    }),
                }
            }
        }
    }

    pub fn remove_model(&self, app_label: &str, model: &str) {
        let label = app_label.to_lowercase();
        if let Ok(mut apps) = self.apps.write() {
            if let Some(app) = apps.iter_mut().find(|app| app.entry.name == label) {
                app.models.retain(|m| m.entry.name != model);
            }
        }
    }

    /// Declare (or clear) the list-view columns of an existing model
    pub fn set_list_display(&self, app_label: &str, model: &str, columns: Option<Vec<SourceElement>>) {
        let target = ModelRef::new(app_label, model);
        if let Ok(mut apps) = self.apps.write() {
            let found = apps
                .iter_mut()
                .filter(|app| app.entry.name == target.app_label)
                .flat_map(|app| app.models.iter_mut())
                .find(|m| m.entry.name.to_lowercase() == target.model_name);
            if let Some(found) = found {
                found.list_display = columns;
            }
        }
    }

    fn has_app(&self, label: &str) -> bool {
        self.apps
            .read()
            .map(|apps| apps.iter().any(|app| app.entry.name == label))
            .unwrap_or(false)
    }

    fn read_apps(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, Vec<StaticApp>>> {
        self.apps
            .read()
            .map_err(|_| DomainError::AdapterUnavailable("registry lock poisoned".to_string()))
    }
}

#[async_trait]
impl AuthoritativeSource for StaticSource {
    async fn app_list(&self, _ctx: &RequestContext) -> DomainResult<Vec<SourceElement>> {
        let apps = self.read_apps()?;
        Ok(apps.iter().map(|app| app.entry.clone()).collect())
    }

    async fn model_list(
        &self,
        _ctx: &RequestContext,
        app_label: &str,
    ) -> DomainResult<Vec<SourceElement>> {
        let label = app_label.to_lowercase();
        let apps = self.read_apps()?;
        let app = apps
            .iter()
            .find(|app| app.entry.name == label)
            .ok_or_else(|| DomainError::AdapterUnavailable(format!("unknown app '{}'", label)))?;
        Ok(app.models.iter().map(|m| m.entry.clone()).collect())
    }

    async fn list_display(
        &self,
        _ctx: &RequestContext,
        model: &ModelRef,
    ) -> DomainResult<Option<Vec<SourceElement>>> {
        let apps = self.read_apps()?;
        let found = apps
            .iter()
            .filter(|app| app.entry.name == model.app_label)
            .flat_map(|app| app.models.iter())
            .find(|m| m.entry.name.to_lowercase() == model.model_name)
            .ok_or_else(|| DomainError::AdapterUnavailable(format!("unknown model '{}'", model)))?;
        Ok(found.list_display.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    fn ctx() -> RequestContext {
        RequestContext::new(UserId::new("jane.doe"))
    }

    fn registry() -> StaticSource {
        StaticSource::new()
            .with_app("Blog", "Blog")
            .with_model("blog", "Post", "Posts")
            .with_list_display("blog", "Post", vec![SourceElement::from_name("title")])
            .with_model("users", "User", "Users")
    }

    #[tokio::test]
    async fn test_lists_in_registration_order() {
        let source = registry();
        let apps = source.app_list(&ctx()).await.unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["blog", "users"]);
        assert_eq!(apps[1].description, "Users");
    }

    #[tokio::test]
    async fn test_list_display_opt_in() {
        let source = registry();
        let post = source.list_display(&ctx(), &ModelRef::new("blog", "post")).await.unwrap();
        let user = source.list_display(&ctx(), &ModelRef::new("users", "user")).await.unwrap();
        assert_eq!(post.unwrap()[0].description, "Title");
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_unknown_app_is_unavailable() {
        let err = registry().model_list(&ctx(), "shop").await.unwrap_err();
        assert!(matches!(err, DomainError::AdapterUnavailable(_)));
    }

    #[tokio::test]
    async fn test_runtime_changes_are_visible() {
        let source = registry();
        source.remove_model("blog", "Post");
        source.add_model("blog", "Comment", "Comments");
        let models = source.model_list(&ctx(), "blog").await.unwrap();
        assert_eq!(models, vec![SourceElement::new("Comment", "Comments")]);
    }
}
