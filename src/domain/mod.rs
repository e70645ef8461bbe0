//! Domain Layer
//!
//! Elements, scopes, preference documents and the error taxonomy.
//! Nothing here touches storage or the host console.

mod describe;
mod document;
mod element;
mod error;
mod scope;

pub use describe::{column_description, default_description, title_case};
pub use document::{AppLayout, ModelLayout, PreferenceDocument, TreeLayout, SCHEMA_VERSION};
pub use element::{Element, ElementEdit, SourceElement};
pub use error::{DomainError, DomainResult};
pub use scope::{DocumentKind, ModelRef, Scope, UserId};
