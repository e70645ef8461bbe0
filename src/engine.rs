//! Layout Engine
//!
//! Reads: live snapshot from the source, stored document from the store,
//! merged level by level. Writes: submitted level checked against the live
//! snapshot, folded into the scope's document, saved whole.
//!
//! Every public entry point takes the request's recursion guard. A call that
//! finds the guard taken answers from the snapshots the enclosing call has
//! already fetched, unmerged, and never calls the source again.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::{
    DomainError, DomainResult, Element, ElementEdit, ModelRef, PreferenceDocument, Scope,
    SourceElement, TreeLayout,
};
use crate::reconcile::{apply_edit, edited_document, merge, GuardToken, RequestContext};
use crate::repository::PreferenceStore;
use crate::source::AuthoritativeSource;

const APP_LIST_KEY: &str = "app_list";

fn model_list_key(app_label: &str) -> String {
    format!("model_list:{}", app_label.to_lowercase())
}

fn list_display_key(model: &ModelRef) -> String {
    format!("list_display:{}", model)
}

/// A model entry of an index page with its merged columns, if it has a
/// customizable list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelView {
    #[serde(flatten)]
    pub element: Element,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_display: Option<Vec<Element>>,
}

/// An app entry of the index page with its models
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppView {
    #[serde(flatten)]
    pub element: Element,
    pub models: Vec<ModelView>,
}

/// Merged view of one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LayoutView {
    Columns(Vec<Element>),
    Apps(Vec<AppView>),
    Models(Vec<ModelView>),
}

pub struct LayoutEngine {
    source: Arc<dyn AuthoritativeSource>,
    store: Arc<dyn PreferenceStore>,
}

impl LayoutEngine {
    pub fn new(source: Arc<dyn AuthoritativeSource>, store: Arc<dyn PreferenceStore>) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    pub fn source(&self) -> &Arc<dyn AuthoritativeSource> {
        &self.source
    }

    // ========================================================================
    // Render path
    // ========================================================================

    /// Merged view of `scope` for the acting user
    pub async fn read(&self, ctx: &RequestContext, scope: &Scope) -> DomainResult<LayoutView> {
        let Some(_token) = self.enter(ctx, scope)? else {
            return Ok(self.unmerged(ctx, scope));
        };

        match scope {
            Scope::ListView(model) => {
                let columns = self
                    .merged_columns(ctx, model, None)
                    .await?
                    .ok_or_else(|| no_list_view(model))?;
                Ok(LayoutView::Columns(columns))
            }
            Scope::AppIndex => Ok(LayoutView::Apps(self.merged_index(ctx).await?)),
            Scope::AppSubIndex(app_label) => {
                let index = self.load_tree(ctx, &Scope::AppIndex).await?;
                let models = self.merged_models(ctx, app_label, index.as_ref()).await?;
                Ok(LayoutView::Models(models))
            }
        }
    }

    /// Names of the visible columns of `model`, in display order
    pub async fn visible_list_display(
        &self,
        ctx: &RequestContext,
        model: &ModelRef,
    ) -> DomainResult<Vec<String>> {
        match self.read(ctx, &Scope::ListView(model.clone())).await? {
            LayoutView::Columns(columns) => Ok(columns
                .into_iter()
                .filter(|column| column.visible)
                .map(|column| column.name)
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Index page as rendered: hidden apps, models and columns removed
    pub async fn visible_app_list(&self, ctx: &RequestContext) -> DomainResult<Vec<AppView>> {
        let apps = match self.read(ctx, &Scope::AppIndex).await? {
            LayoutView::Apps(apps) => apps,
            _ => return Ok(Vec::new()),
        };

        Ok(apps
            .into_iter()
            .filter(|app| app.element.visible)
            .map(|mut app| {
                app.models.retain(|model| model.element.visible);
                for model in app.models.iter_mut() {
                    if let Some(columns) = model.list_display.as_mut() {
                        columns.retain(|column| column.visible);
                    }
                }
                app
            })
            .collect())
    }

    // ========================================================================
    // Edit path
    // ========================================================================

    /// Persist a submitted ordering/visibility for the top level of `scope`.
    ///
    /// Returns the document that was stored. An edit issued from inside a
    /// running reconciliation of the same request fails with
    /// `RecursionDetected` and saves nothing.
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        submitted: &[ElementEdit],
    ) -> DomainResult<PreferenceDocument> {
        let _token = ctx.guard().try_acquire().map_err(|e| {
            log::warn!("Refusing nested layout edit of {} for {}", scope, ctx.user());
            e
        })?;

        let authoritative = self.level_snapshot(ctx, scope).await?;
        let level = apply_edit(submitted, &authoritative);
        let stored = self.store.load(ctx.user(), scope).await?;
        let document = edited_document(scope, stored, level);

        self.store.save(ctx.user(), scope, &document).await?;
        log::info!("Saved layout {} for {}", scope, ctx.user());
        Ok(document)
    }

    // ========================================================================
    // Merging
    // ========================================================================

    async fn merged_index(&self, ctx: &RequestContext) -> DomainResult<Vec<AppView>> {
        let index = self.load_tree(ctx, &Scope::AppIndex).await?;
        let apps = self.fetch_app_list(ctx).await?;
        let merged = merge(index.as_ref().map(|tree| tree.app_list.as_slice()), &apps);

        let mut views = Vec::with_capacity(merged.len());
        for app in merged {
            let models = if app.visible {
                self.merged_models(ctx, &app.name, index.as_ref()).await?
            } else {
                self.fetch_model_list(ctx, &app.name)
                    .await?
                    .iter()
                    .map(|model| ModelView {
                        element: Element::from_source(model),
                        list_display: None,
                    })
                    .collect()
            };
            views.push(AppView { element: app, models });
        }
        Ok(views)
    }

    /// Models of one app. The app's own sub-index document wins over the
    /// copy nested in the index document.
    async fn merged_models(
        &self,
        ctx: &RequestContext,
        app_label: &str,
        index: Option<&TreeLayout>,
    ) -> DomainResult<Vec<ModelView>> {
        let sub = self.load_tree(ctx, &Scope::app_sub_index(app_label)).await?;
        let models = self.fetch_model_list(ctx, app_label).await?;
        let stored = match sub.as_ref() {
            Some(tree) => Some(tree.model_list(app_label)),
            None => index.map(|tree| tree.model_list(app_label)),
        };

        let mut views = Vec::new();
        for model in merge(stored, &models) {
            let list_display = if model.visible {
                let model_ref = ModelRef::new(app_label, &model.name);
                let nested = sub
                    .as_ref()
                    .and_then(|tree| tree.list_display(app_label, &model.name))
                    .or_else(|| index.and_then(|tree| tree.list_display(app_label, &model.name)));
                self.merged_columns(ctx, &model_ref, nested).await?
            } else {
                None
            };
            views.push(ModelView {
                element: model,
                list_display,
            });
        }
        Ok(views)
    }

    /// Columns of one model, `None` if it has no customizable list view.
    /// `nested` is used only when the list view has no document of its own.
    async fn merged_columns(
        &self,
        ctx: &RequestContext,
        model: &ModelRef,
        nested: Option<&[Element]>,
    ) -> DomainResult<Option<Vec<Element>>> {
        let Some(columns) = self.fetch_list_display(ctx, model).await? else {
            return Ok(None);
        };
        let stored = self.load_flat(ctx, &Scope::ListView(model.clone())).await?;
        let stored = stored.as_deref().or(nested);
        Ok(Some(merge(stored, &columns)))
    }

    // ========================================================================
    // Recursion fallback
    // ========================================================================

    fn enter<'c>(
        &self,
        ctx: &'c RequestContext,
        scope: &Scope,
    ) -> DomainResult<Option<GuardToken<'c>>> {
        match ctx.guard().try_acquire() {
            Ok(token) => Ok(Some(token)),
            Err(DomainError::RecursionDetected) => {
                log::warn!(
                    "Recursive layout read of {} for {}; answering unmerged",
                    scope,
                    ctx.user()
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn unmerged(&self, ctx: &RequestContext, scope: &Scope) -> LayoutView {
        match scope {
            Scope::ListView(model) => LayoutView::Columns(
                as_elements(&ctx.guard().snapshot(&list_display_key(model)).unwrap_or_default()),
            ),
            Scope::AppIndex => LayoutView::Apps(
                ctx.guard()
                    .snapshot(APP_LIST_KEY)
                    .unwrap_or_default()
                    .iter()
                    .map(|app| AppView {
                        element: Element::from_source(app),
                        models: self.unmerged_models(ctx, &app.name),
                    })
                    .collect(),
            ),
            Scope::AppSubIndex(app_label) => {
                LayoutView::Models(self.unmerged_models(ctx, app_label))
            }
        }
    }

    fn unmerged_models(&self, ctx: &RequestContext, app_label: &str) -> Vec<ModelView> {
        ctx.guard()
            .snapshot(&model_list_key(app_label))
            .unwrap_or_default()
            .iter()
            .map(|model| ModelView {
                element: Element::from_source(model),
                list_display: ctx
                    .guard()
                    .snapshot(&list_display_key(&ModelRef::new(app_label, &model.name)))
                    .map(|columns| as_elements(&columns)),
            })
            .collect()
    }

    // ========================================================================
    // Source and store access
    // ========================================================================

    async fn level_snapshot(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
    ) -> DomainResult<Vec<SourceElement>> {
        match scope {
            Scope::ListView(model) => self
                .fetch_list_display(ctx, model)
                .await?
                .ok_or_else(|| no_list_view(model)),
            Scope::AppIndex => self.fetch_app_list(ctx).await,
            Scope::AppSubIndex(app_label) => self.fetch_model_list(ctx, app_label).await,
        }
    }

    async fn fetch_app_list(&self, ctx: &RequestContext) -> DomainResult<Vec<SourceElement>> {
        let apps = self
            .source
            .app_list(ctx)
            .await
            .map_err(|e| source_failure("app list", e))?;
        ctx.guard().record_snapshot(APP_LIST_KEY, &apps);
        Ok(apps)
    }

    async fn fetch_model_list(
        &self,
        ctx: &RequestContext,
        app_label: &str,
    ) -> DomainResult<Vec<SourceElement>> {
        let models = self
            .source
            .model_list(ctx, app_label)
            .await
            .map_err(|e| source_failure(&format!("models of {}", app_label), e))?;
        ctx.guard().record_snapshot(&model_list_key(app_label), &models);
        Ok(models)
    }

    async fn fetch_list_display(
        &self,
        ctx: &RequestContext,
        model: &ModelRef,
    ) -> DomainResult<Option<Vec<SourceElement>>> {
        let columns = self
            .source
            .list_display(ctx, model)
            .await
            .map_err(|e| source_failure(&format!("columns of {}", model), e))?;
        if let Some(columns) = columns.as_ref() {
            ctx.guard().record_snapshot(&list_display_key(model), columns);
        }
        Ok(columns)
    }

    async fn load_tree(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
    ) -> DomainResult<Option<TreeLayout>> {
        Ok(match self.store.load(ctx.user(), scope).await? {
            Some(PreferenceDocument::Tree(tree)) => Some(tree),
            _ => None,
        })
    }

    async fn load_flat(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
    ) -> DomainResult<Option<Vec<Element>>> {
        Ok(match self.store.load(ctx.user(), scope).await? {
            Some(PreferenceDocument::Flat(elements)) => Some(elements),
            _ => None,
        })
    }
}

fn as_elements(sources: &[SourceElement]) -> Vec<Element> {
    sources.iter().map(Element::from_source).collect()
}

fn no_list_view(model: &ModelRef) -> DomainError {
    DomainError::NotFound(format!("{} has no customizable list view", model))
}

fn source_failure(what: &str, e: DomainError) -> DomainError {
    log::error!("Failed to list {}: {}", what, e);
    e
}
