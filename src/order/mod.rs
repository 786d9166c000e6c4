//! The ordering engine: per-scope doubly-linked lists over SQLite rows
//!
//! Each ordered collection is keyed by a scope id (a project for categories,
//! a category for items) and stored in an order table with one row per
//! positioned item. `left_id`/`right_id` name the item's neighbors within
//! the same scope; a null left marks the head of the chain and a null right
//! marks the tail.
//!
//! The engine is generic over [`OrderScope`], the seam that maps one domain
//! relationship onto a concrete order table, and exposes its operations
//! through [`OrderStore`], which is blanket-implemented for every scope.
//! Every operation takes a [`rusqlite::Transaction`], so a splice cannot be
//! issued outside an enclosing transaction: either the whole relink commits
//! or none of it does.

mod engine;
mod guard;


pub use engine::OrderStore;
pub use guard::validate;

use rusqlite::Transaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while relinking a chain
///
/// The first three are synchronous validation failures: the request is
/// rejected, nothing is written, and retrying without changing the inputs
/// cannot succeed. Database errors roll the enclosing transaction back.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(
        "cyclic order: item {item_id} cannot neighbor itself (left={left_id:?}, right={right_id:?})"
    )]
    CyclicOrder {
        item_id: i64,
        left_id: Option<i64>,
        right_id: Option<i64>,
    },

    #[error(
        "conflicting neighbor: item {claimed_by} already sits next to {neighbor_id}; \
         placing item {item_id} there would contradict the existing chain"
    )]
    ConflictingNeighbor {
        item_id: i64,
        neighbor_id: i64,
        claimed_by: i64,
    },

    #[error("item {0} has no place in this scope")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for engine operations
pub type OrderResult<T> = Result<T, OrderError>;

/// One item's position within one scope's chain
///
/// At most one record exists per `(scope, item)` pair. Both neighbor ids are
/// optional; an item that appears in neither column of any record is
/// unordered and sequenced by creation order on the read side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// The positioned item
    pub item_id: i64,
    /// The neighbor displayed immediately before this item, if any
    pub left_id: Option<i64>,
    /// The neighbor displayed immediately after this item, if any
    pub right_id: Option<i64>,
}

impl OrderRecord {
    /// A record with no neighbors on either side
    pub fn unlinked(item_id: i64) -> Self {
        Self {
            item_id,
            left_id: None,
            right_id: None,
        }
    }

    /// Whether this record is the head of its chain
    pub fn is_head(&self) -> bool {
        self.left_id.is_none()
    }

    /// Whether this record is the tail of its chain
    pub fn is_tail(&self) -> bool {
        self.right_id.is_none()
    }
}

/// Maps one domain relationship onto a generic `(scope, item)` order table
///
/// Implementations supply the table/column names the engine splices through
/// plus the scope-membership and creation-order queries it cannot express
/// generically. The two real instantiations live in [`crate::scope`].
pub trait OrderScope {
    /// Order table name
    const TABLE: &'static str;
    /// Column holding the scope id
    const SCOPE_COL: &'static str;
    /// Column holding the ordered item id
    const ITEM_COL: &'static str;

    /// Whether `item_id` belongs to the scope's collection at all
    fn in_scope(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<bool>;

    /// Most recently created item in the scope other than `except`
    ///
    /// Fallback tail used by `append` when no explicit chain exists yet.
    fn latest_created(tx: &Transaction<'_>, scope_id: i64, except: i64)
        -> OrderResult<Option<i64>>;

    /// Earliest created item in the scope other than `except`
    ///
    /// Fallback head, the mirror of [`OrderScope::latest_created`].
    fn earliest_created(
        tx: &Transaction<'_>,
        scope_id: i64,
        except: i64,
    ) -> OrderResult<Option<i64>>;
}
