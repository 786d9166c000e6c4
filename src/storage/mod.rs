//! SQLite-backed persistence for projects, categories, items, and their chains

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult};
