//! Projects: the scope within which categories are ordered

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(i64);

impl ProjectId {
    /// Wrap a raw database id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project: a shared board holding an ordered set of categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,
    /// Human-readable title
    pub title: String,
    /// When the project was created
    pub created_at: DateTime<Utc>,
}
