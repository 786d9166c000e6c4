//! Todo categories: ordered within each project they are attached to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a todo category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(i64);

impl CategoryId {
    /// Wrap a raw database id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A todo category
///
/// A category may be attached to several projects at once; its position is
/// tracked separately per project, so reordering it on one board never
/// disturbs the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCategory {
    /// Unique identifier
    pub id: CategoryId,
    /// Human-readable title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// When the category was created
    pub created_at: DateTime<Utc>,
}
