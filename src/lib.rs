//! Ordo: scoped linked-list ordering for collaborative todo backends
//!
//! Users of a project board expect to drag categories and todo items into an
//! order of their own and have it stick. Ordo persists that order as a
//! per-scope doubly-linked list: an auxiliary order table holds one row per
//! positioned item, with nullable `left_id`/`right_id` columns naming its
//! neighbors. There is no linked-list primitive in SQLite, so every splice is
//! a handful of dependent reads and writes that must land together — the
//! engine wraps each operation in one transaction and validates neighbor
//! assignments before touching anything.
//!
//! # Core Concepts
//!
//! - **Scope**: the grouping key one ordering lives under — a project (for
//!   its categories) or a category (for its items). Chains in different
//!   scopes never interact.
//! - **Order record**: one item's position in one scope's chain. Items
//!   without a record are implicitly sequenced by creation order; a record
//!   appears the first time an item is explicitly placed.
//! - **Splice / detach**: inserting a node between two neighbors, or removing
//!   it while relinking its former neighbors to each other.
//!
//! The engine never materializes the sorted view; read endpoints return rows
//! in a stable arbitrary order together with their neighbor pointers, and
//! consumers walk the chain themselves.
//!
//! # Example
//!
//! ```
//! use ordo::SqliteStore;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let project = store.create_project("spring cleaning").unwrap();
//! let category = store
//!     .create_category(project.id, "kitchen", None)
//!     .unwrap();
//! let scrub = store.create_item(category.id, "scrub the oven", None).unwrap();
//! let defrost = store.create_item(category.id, "defrost the freezer", None).unwrap();
//!
//! // Put "scrub the oven" right after "defrost the freezer".
//! store
//!     .move_item(category.id, scrub.id, Some(defrost.id), None)
//!     .unwrap();
//! ```

pub mod domain;
pub mod order;
pub mod scope;
pub mod storage;

pub use domain::{CategoryId, ItemId, Project, ProjectId, TodoCategory, TodoItem};
pub use order::{OrderError, OrderRecord, OrderResult, OrderScope, OrderStore};
pub use scope::{CategoryInProject, ItemInCategory};
pub use storage::{SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
