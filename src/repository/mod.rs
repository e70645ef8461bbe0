//! Repository Layer
//!
//! Preference storage abstractions and implementations.

mod db;
mod memory_repo;
mod preference_repo;
mod traits;

#[cfg(test)]
mod tests;

pub use db::{init_db, DbState};
pub use memory_repo::InMemoryPreferenceStore;
pub use preference_repo::SqlitePreferenceStore;
pub use traits::{PreferenceStore, StoredRow};
