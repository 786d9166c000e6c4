//! Storage error taxonomy

use crate::domain::{CategoryId, ItemId, ProjectId};
use crate::order::OrderError;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("todo item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("category {category_id} already belongs to project {project_id}")]
    AlreadyAttached {
        category_id: CategoryId,
        project_id: ProjectId,
    },

    #[error("category {category_id} does not belong to project {project_id}")]
    NotAttached {
        category_id: CategoryId,
        project_id: ProjectId,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
