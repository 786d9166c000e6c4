//! Todo items: ordered within their owning category

use super::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(i64);

impl ItemId {
    /// Wrap a raw database id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A todo item
///
/// Items belong to exactly one category. A freshly created item carries no
/// order record — consumers show unordered items by creation order — and
/// gets one the first time it is explicitly placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: ItemId,
    /// The owning category
    pub category_id: CategoryId,
    /// Human-readable title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Whether the item is marked done
    pub is_done: bool,
    /// When the item was created
    pub created_at: DateTime<Utc>,
}
