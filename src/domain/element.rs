//! Element Types
//!
//! An element is one reorderable, hideable entry: a list column, an app on
//! the index page, or a model inside an app.

use serde::{Deserialize, Serialize};

use super::describe;

/// A named entry with its display label and visibility.
///
/// This is also the stored representation, so unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Element {
    /// Identity within its sibling list
    pub name: String,
    /// Display label; always refreshed from the live source when read
    pub description: String,
    pub visible: bool,
}

impl Element {
    pub fn new(name: impl Into<String>, description: impl Into<String>, visible: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            visible,
        }
    }

    /// Visible element built from a live source entry
    pub fn from_source(source: &SourceElement) -> Self {
        Self::new(source.name.clone(), source.description.clone(), true)
    }
}

/// An entry as reported by the authoritative source (no visibility)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceElement {
    pub name: String,
    pub description: String,
}

impl SourceElement {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Entry whose label is inferred from the name (`created_at` -> `Created At`)
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = describe::default_description(&name);
        Self { name, description }
    }

    /// List column entry labelled the way the console labels columns
    pub fn column(name: impl Into<String>, label: Option<&str>, model_verbose_name: Option<&str>) -> Self {
        let name = name.into();
        let description = describe::column_description(&name, label, model_verbose_name);
        Self { name, description }
    }
}

/// One submitted entry of an edit: name and requested visibility.
///
/// A `description` sent by the client is accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementEdit {
    pub name: String,
    pub visible: bool,
}

impl ElementEdit {
    pub fn new(name: impl Into<String>, visible: bool) -> Self {
        Self {
            name: name.into(),
            visible,
        }
    }
}

impl From<&Element> for ElementEdit {
    fn from(element: &Element) -> Self {
        Self::new(element.name.clone(), element.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_rejects_unknown_keys() {
        let json = r#"{"name":"id","description":"ID","visible":true,"width":3}"#;
        assert!(serde_json::from_str::<Element>(json).is_err());
    }

    #[test]
    fn test_element_requires_boolean_visibility() {
        let json = r#"{"name":"id","description":"ID","visible":"yes"}"#;
        assert!(serde_json::from_str::<Element>(json).is_err());
    }

    #[test]
    fn test_edit_ignores_client_description() {
        let json = r#"{"name":"email","description":"Hacked","visible":false}"#;
        let edit: ElementEdit = serde_json::from_str(json).unwrap();
        assert_eq!(edit, ElementEdit::new("email", false));
    }

    #[test]
    fn test_source_from_name_infers_label() {
        let source = SourceElement::from_name("created_at");
        assert_eq!(source.description, "Created At");
    }

    #[test]
    fn test_source_column_labels() {
        assert_eq!(SourceElement::column("email", Some(" e-mail "), None).description, "E-Mail");
        assert_eq!(SourceElement::column("__str__", None, Some("blog post")).description, "Blog Post");
        assert_eq!(SourceElement::column("is_staff", None, None).description, "Is Staff");
    }
}
