//! Scope and identity
//!
//! A scope names what is being customized: one model's list view, the app
//! index, or one app's model index.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{DomainError, DomainResult};

/// Acting user, as identified by the host console's session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A model addressed by app label and model name, both lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelRef {
    pub app_label: String,
    pub model_name: String,
}

impl ModelRef {
    pub fn new(app_label: &str, model_name: &str) -> Self {
        Self {
            app_label: app_label.to_lowercase(),
            model_name: model_name.to_lowercase(),
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

/// Shape of the document stored for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Flat,
    Tree,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Flat => "flat",
            DocumentKind::Tree => "tree",
        }
    }
}

/// Unit of customization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    ListView(ModelRef),
    AppIndex,
    AppSubIndex(String),
}

impl Scope {
    pub fn list_view(app_label: &str, model_name: &str) -> Self {
        Scope::ListView(ModelRef::new(app_label, model_name))
    }

    pub fn app_sub_index(app_label: &str) -> Self {
        Scope::AppSubIndex(app_label.to_lowercase())
    }

    /// Stable storage key
    pub fn key(&self) -> String {
        match self {
            Scope::ListView(model) => format!("list_view:{}", model),
            Scope::AppIndex => "app_index".to_string(),
            Scope::AppSubIndex(app) => format!("app_sub_index:{}", app),
        }
    }

    pub fn document_kind(&self) -> DocumentKind {
        match self {
            Scope::ListView(_) => DocumentKind::Flat,
            Scope::AppIndex | Scope::AppSubIndex(_) => DocumentKind::Tree,
        }
    }

    /// Console route for this scope, without leading prefix
    pub fn route(&self) -> String {
        match self {
            Scope::ListView(model) => format!(
                "apps/{}/models/{}/list_display/",
                model.app_label, model.model_name
            ),
            Scope::AppIndex => "app_list/".to_string(),
            Scope::AppSubIndex(app) => format!("apps/{}/model_list/", app),
        }
    }

    /// Resolve a console route (`[prefix]app_list/`, `[prefix]apps/<app>/model_list/`,
    /// `[prefix]apps/<app>/models/<model>/list_display/`) to its scope.
    pub fn from_route(path: &str, prefix: &str) -> DomainResult<Scope> {
        let not_found = || DomainError::NotFound(format!("No layout route for '{}'", path));
        let trimmed = path.trim_start_matches('/');
        let prefix = prefix.trim_matches('/');
        let rest = if prefix.is_empty() {
            trimmed
        } else {
            trimmed
                .strip_prefix(prefix)
                .and_then(|r| r.strip_prefix('/'))
                .ok_or_else(not_found)?
        };

        let caps = route_pattern()
            .captures(rest.trim_end_matches('/'))
            .ok_or_else(not_found)?;

        if caps.get(1).is_some() {
            return Ok(Scope::AppIndex);
        }
        if let Some(app) = caps.get(2) {
            return Ok(Scope::app_sub_index(&decode_segment(app.as_str())));
        }
        match (caps.get(3), caps.get(4)) {
            (Some(app), Some(model)) => Ok(Scope::list_view(
                &decode_segment(app.as_str()),
                &decode_segment(model.as_str()),
            )),
            _ => Err(not_found()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn route_pattern() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| {
        Regex::new(
            r"^(?:(app_list)|apps/([^/]+)/model_list|apps/([^/]+)/models/([^/]+)/list_display)$",
        )
        .expect("route pattern is valid")
    })
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ref_is_lowercased() {
        let model = ModelRef::new("Blog", "Post");
        assert_eq!(model.to_string(), "blog.post");
    }

    #[test]
    fn test_scope_keys_are_distinct() {
        assert_eq!(Scope::list_view("blog", "post").key(), "list_view:blog.post");
        assert_eq!(Scope::AppIndex.key(), "app_index");
        assert_eq!(Scope::app_sub_index("Blog").key(), "app_sub_index:blog");
    }

    #[test]
    fn test_document_kind_by_scope() {
        assert_eq!(Scope::list_view("a", "b").document_kind(), DocumentKind::Flat);
        assert_eq!(Scope::AppIndex.document_kind(), DocumentKind::Tree);
        assert_eq!(Scope::app_sub_index("a").document_kind(), DocumentKind::Tree);
    }

    #[test]
    fn test_from_route() {
        assert_eq!(Scope::from_route("daf/app_list/", "daf/").unwrap(), Scope::AppIndex);
        assert_eq!(
            Scope::from_route("/daf/apps/blog/model_list", "daf/").unwrap(),
            Scope::app_sub_index("blog")
        );
        assert_eq!(
            Scope::from_route("apps/users/models/User/list_display/", "").unwrap(),
            Scope::list_view("users", "user")
        );
    }

    #[test]
    fn test_from_route_decodes_segments() {
        let scope = Scope::from_route("daf/apps/contact%5Fmessages/model_list/", "daf").unwrap();
        assert_eq!(scope, Scope::app_sub_index("contact_messages"));
    }

    #[test]
    fn test_from_route_round_trips_route() {
        let scope = Scope::list_view("blog", "post");
        assert_eq!(Scope::from_route(&scope.route(), "").unwrap(), scope);
    }

    #[test]
    fn test_from_route_requires_prefix() {
        for path in ["app_list/", "dafapp_list/", "other/app_list/", "daf"] {
            let err = Scope::from_route(path, "daf/").unwrap_err();
            assert!(matches!(err, DomainError::NotFound(_)), "{}", path);
        }
        assert_eq!(Scope::from_route("/daf/app_list", "/daf/").unwrap(), Scope::AppIndex);
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let err = Scope::from_route("daf/apps/blog/", "daf/").unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
