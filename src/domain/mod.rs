//! Domain row types shared by the storage layer and the ordering engine

mod category;
mod item;
mod project;

pub use category::{CategoryId, TodoCategory};
pub use item::{ItemId, TodoItem};
pub use project::{Project, ProjectId};
