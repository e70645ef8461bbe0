//! Reconciler
//!
//! Pure merge/edit logic per element level, and the guard that keeps a
//! request from reconciling inside its own reconciliation.

mod guard;
mod merge;

pub use guard::{GuardToken, RecursionGuard, RequestContext};
pub use merge::{apply_edit, edited_document, merge};
