//! Preference Document
//!
//! The persisted per-user, per-scope layout. List views store a flat array
//! of elements; index pages store a tree:
//!
//! ```json
//! {
//!   "app_list": [{"name": "blog", "description": "Blog", "visible": true}],
//!   "apps": {
//!     "blog": {
//!       "model_list": [{"name": "Post", "description": "Posts", "visible": true}],
//!       "models": {"post": {"list_display": [...]}}
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::element::Element;
use super::error::{DomainError, DomainResult};
use super::scope::{DocumentKind, Scope};

/// Version tag written next to every stored document
pub const SCHEMA_VERSION: &str = "v0";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelLayout {
    pub list_display: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppLayout {
    pub model_list: Vec<Element>,
    pub models: BTreeMap<String, ModelLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeLayout {
    pub app_list: Vec<Element>,
    pub apps: BTreeMap<String, AppLayout>,
}

impl TreeLayout {
    pub fn app(&self, app_label: &str) -> Option<&AppLayout> {
        self.apps.get(&app_label.to_lowercase())
    }

    pub fn model_list(&self, app_label: &str) -> &[Element] {
        self.app(app_label)
            .map(|app| app.model_list.as_slice())
            .unwrap_or(&[])
    }

    pub fn list_display(&self, app_label: &str, model_name: &str) -> Option<&[Element]> {
        self.app(app_label)?
            .models
            .get(&model_name.to_lowercase())
            .map(|model| model.list_display.as_slice())
    }

    /// Same tree with the app level replaced
    pub fn with_app_list(mut self, app_list: Vec<Element>) -> Self {
        self.app_list = app_list;
        self
    }

    /// Same tree with one app's model level replaced; its `models` are kept
    pub fn with_model_list(mut self, app_label: &str, model_list: Vec<Element>) -> Self {
        self.apps
            .entry(app_label.to_lowercase())
            .or_default()
            .model_list = model_list;
        self
    }

    fn validate(&self) -> DomainResult<()> {
        check_level(&self.app_list, "app_list")?;
        for (app_label, app) in &self.apps {
            check_level(&app.model_list, &format!("apps.{}.model_list", app_label))?;
            for (model_name, model) in &app.models {
                check_level(
                    &model.list_display,
                    &format!("apps.{}.models.{}.list_display", app_label, model_name),
                )?;
            }
        }
        Ok(())
    }
}

/// A layout document, shaped by the scope it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceDocument {
    Flat(Vec<Element>),
    Tree(TreeLayout),
}

impl PreferenceDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            PreferenceDocument::Flat(_) => DocumentKind::Flat,
            PreferenceDocument::Tree(_) => DocumentKind::Tree,
        }
    }

    pub fn as_tree(&self) -> Option<&TreeLayout> {
        match self {
            PreferenceDocument::Tree(tree) => Some(tree),
            PreferenceDocument::Flat(_) => None,
        }
    }

    /// Schema checks: unique, non-empty names at every level
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            PreferenceDocument::Flat(elements) => check_level(elements, "list_display"),
            PreferenceDocument::Tree(tree) => tree.validate(),
        }
    }

    /// Schema checks plus the shape `scope` requires
    pub fn validate_for(&self, scope: &Scope) -> DomainResult<()> {
        if self.kind() != scope.document_kind() {
            return Err(DomainError::Validation(format!(
                "{} document cannot be stored for scope {}",
                self.kind().as_str(),
                scope
            )));
        }
        self.validate()
    }

    pub fn to_json(&self) -> DomainResult<String> {
        let json = match self {
            PreferenceDocument::Flat(elements) => serde_json::to_string(elements)?,
            PreferenceDocument::Tree(tree) => serde_json::to_string(tree)?,
        };
        Ok(json)
    }

    /// Parse and validate a document of the given shape
    pub fn from_json(kind: DocumentKind, json: &str) -> DomainResult<Self> {
        let document = match kind {
            DocumentKind::Flat => PreferenceDocument::Flat(serde_json::from_str(json)?),
            DocumentKind::Tree => PreferenceDocument::Tree(serde_json::from_str(json)?),
        };
        document.validate()?;
        Ok(document)
    }
}

fn check_level(elements: &[Element], path: &str) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(elements.len());
    for element in elements {
        if element.name.is_empty() {
            return Err(DomainError::Validation(format!("empty name in {}", path)));
        }
        if !seen.insert(element.name.as_str()) {
            return Err(DomainError::Validation(format!(
                "duplicate name '{}' in {}",
                element.name, path
            )));
        }
    }
    Ok(())
}
