//! SQLite storage backend
//!
//! One database file holds the domain tables and the two order tables. The
//! store owns the connection behind a mutex and opens one immediate
//! transaction per mutating call, so every engine splice runs under SQLite's
//! write lock and either commits whole or rolls back whole.

use super::traits::{StorageError, StorageResult};
use crate::domain::{CategoryId, ItemId, Project, ProjectId, TodoCategory, TodoItem};
use crate::order::{OrderRecord, OrderStore};
use crate::scope::{CategoryInProject, ItemInCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed store for projects, categories, items, and their chains
///
/// Thread-safe via an internal mutex on the connection. The order tables
/// carry the per-scope uniqueness and self-reference check constraints, so a
/// relink that would corrupt a chain fails at the database even if it slips
/// past validation.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        Self::init_schema(&conn)?;
        info!(path = %path.as_ref().display(), "opened store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize the database schema
    pub(crate) fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS project (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS todo_category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
            );

            -- A category may sit on several project boards at once.
            CREATE TABLE IF NOT EXISTS todo_category_project (
                category_id INTEGER NOT NULL
                    REFERENCES todo_category(id) ON DELETE CASCADE,
                project_id INTEGER NOT NULL
                    REFERENCES project(id) ON DELETE CASCADE,
                PRIMARY KEY (category_id, project_id)
            );

            CREATE TABLE IF NOT EXISTS todo_item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL
                    REFERENCES todo_category(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                is_done INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_todo_item_category
                ON todo_item(category_id);

            -- One chain per project over its categories. The uniqueness
            -- constraints guarantee at most one node claims a given neighbor
            -- from either side; the checks rule out self-references and
            -- degenerate left == right pairs.
            CREATE TABLE IF NOT EXISTS todo_category_order (
                project_id INTEGER NOT NULL
                    REFERENCES project(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL
                    REFERENCES todo_category(id) ON DELETE CASCADE,
                left_id INTEGER,
                right_id INTEGER,
                PRIMARY KEY (project_id, category_id),
                UNIQUE (project_id, left_id),
                UNIQUE (project_id, right_id),
                CHECK (category_id != left_id),
                CHECK (category_id != right_id),
                CHECK (left_id IS NULL OR left_id != right_id)
            );

            -- One chain per category over its items; same shape.
            CREATE TABLE IF NOT EXISTS todo_item_order (
                category_id INTEGER NOT NULL
                    REFERENCES todo_category(id) ON DELETE CASCADE,
                item_id INTEGER NOT NULL
                    REFERENCES todo_item(id) ON DELETE CASCADE,
                left_id INTEGER,
                right_id INTEGER,
                PRIMARY KEY (category_id, item_id),
                UNIQUE (category_id, left_id),
                UNIQUE (category_id, right_id),
                CHECK (item_id != left_id),
                CHECK (item_id != right_id),
                CHECK (left_id IS NULL OR left_id != right_id)
            );

            PRAGMA foreign_keys = ON;

            -- WAL mode for concurrent reads during writes.
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    // === Projects ===

    /// Create a project
    pub fn create_project(&self, title: &str) -> StorageResult<Project> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO project (title, created_at) VALUES (?1, ?2)",
            params![title, created_at.to_rfc3339()],
        )?;
        let id = ProjectId::new(tx.last_insert_rowid());
        tx.commit()?;

        Ok(Project {
            id,
            title: title.to_string(),
            created_at,
        })
    }

    /// Load a project by id
    pub fn get_project(&self, id: ProjectId) -> StorageResult<Option<Project>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, title, created_at FROM project WHERE id = ?1",
                params![id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, title, created_at)| {
            Ok(Project {
                id: ProjectId::new(id),
                title,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .transpose()
    }

    /// List all projects in creation order
    pub fn list_projects(&self) -> StorageResult<Vec<Project>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, title, created_at FROM project ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut projects = Vec::new();
        for row in rows {
            let (id, title, created_at) = row?;
            projects.push(Project {
                id: ProjectId::new(id),
                title,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(projects)
    }

    /// Delete a project and its category chain
    ///
    /// Categories left attached to no project afterwards are removed along
    /// with their items. Returns false when the project did not exist.
    pub fn delete_project(&self, id: ProjectId) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let deleted = tx.execute("DELETE FROM project WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Ok(false);
        }
        collect_orphan_categories(&tx)?;
        tx.commit()?;
        Ok(true)
    }

    // === Categories ===

    /// Create a category inside a project
    ///
    /// The new category is appended at the tail of the project's chain, so
    /// it receives an order record immediately.
    pub fn create_category(
        &self,
        project_id: ProjectId,
        title: &str,
        description: Option<&str>,
    ) -> StorageResult<TodoCategory> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_project(&tx, project_id)?;

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO todo_category (title, description, created_at) VALUES (?1, ?2, ?3)",
            params![title, description, created_at.to_rfc3339()],
        )?;
        let id = CategoryId::new(tx.last_insert_rowid());

        tx.execute(
            "INSERT INTO todo_category_project (category_id, project_id) VALUES (?1, ?2)",
            params![id.get(), project_id.get()],
        )?;

        CategoryInProject::append(&tx, project_id.get(), id.get())?;
        tx.commit()?;

        Ok(TodoCategory {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
            created_at,
        })
    }

    /// Update a category's title and/or description
    ///
    /// `None` leaves a field unchanged; `Some(None)` clears the description.
    pub fn update_category(
        &self,
        id: CategoryId,
        title: Option<&str>,
        description: Option<Option<&str>>,
    ) -> StorageResult<TodoCategory> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut category) = category_row(&tx, id)? else {
            return Err(StorageError::CategoryNotFound(id));
        };
        if let Some(title) = title {
            category.title = title.to_string();
        }
        if let Some(description) = description {
            category.description = description.map(str::to_string);
        }
        tx.execute(
            "UPDATE todo_category SET title = ?2, description = ?3 WHERE id = ?1",
            params![id.get(), category.title, category.description],
        )?;
        tx.commit()?;
        Ok(category)
    }

    /// List a project's categories in id order, each with its order record
    ///
    /// The returned order is the arbitrary stable one; reconstructing the
    /// user-visible sequence from the neighbor pointers is the consumer's
    /// job.
    pub fn list_categories(
        &self,
        project_id: ProjectId,
    ) -> StorageResult<Vec<(TodoCategory, Option<OrderRecord>)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.title, c.description, c.created_at,
                    o.category_id, o.left_id, o.right_id
             FROM todo_category c
             JOIN todo_category_project a ON a.category_id = c.id
             LEFT JOIN todo_category_order o
                 ON o.project_id = a.project_id AND o.category_id = c.id
             WHERE a.project_id = ?1
             ORDER BY c.id ASC",
        )?;
        let rows = stmt.query_map(params![project_id.get()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<i64>>(6)?,
            ))
        })?;

        let mut categories = Vec::new();
        for row in rows {
            let (id, title, description, created_at, ordered_id, left_id, right_id) = row?;
            let order = ordered_id.map(|item_id| OrderRecord {
                item_id,
                left_id,
                right_id,
            });
            categories.push((
                TodoCategory {
                    id: CategoryId::new(id),
                    title,
                    description,
                    created_at: parse_timestamp(&created_at)?,
                },
                order,
            ));
        }
        Ok(categories)
    }

    /// Attach an existing category to another project
    ///
    /// The category is placed at the head of the new project's chain. Its
    /// positions on other boards are untouched.
    pub fn attach_category(
        &self,
        category_id: CategoryId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_project(&tx, project_id)?;
        if category_row(&tx, category_id)?.is_none() {
            return Err(StorageError::CategoryNotFound(category_id));
        }
        if is_attached(&tx, category_id, project_id)? {
            return Err(StorageError::AlreadyAttached {
                category_id,
                project_id,
            });
        }

        tx.execute(
            "INSERT INTO todo_category_project (category_id, project_id) VALUES (?1, ?2)",
            params![category_id.get(), project_id.get()],
        )?;

        let head = CategoryInProject::head_item(&tx, project_id.get(), category_id.get())?;
        CategoryInProject::move_to(&tx, project_id.get(), category_id.get(), None, head)?;
        tx.commit()?;
        Ok(())
    }

    /// Detach a category from one project
    ///
    /// Relinks that project's chain around the category and removes its
    /// order record for that scope only. A category detached from its last
    /// project is deleted outright, items included; returns true in that
    /// case.
    pub fn detach_category(
        &self,
        category_id: CategoryId,
        project_id: ProjectId,
    ) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !is_attached(&tx, category_id, project_id)? {
            return Err(StorageError::NotAttached {
                category_id,
                project_id,
            });
        }

        CategoryInProject::detach(&tx, project_id.get(), category_id.get())?;
        tx.execute(
            "DELETE FROM todo_category_project WHERE category_id = ?1 AND project_id = ?2",
            params![category_id.get(), project_id.get()],
        )?;

        let remaining: i64 = tx.query_row(
            "SELECT COUNT(*) FROM todo_category_project WHERE category_id = ?1",
            params![category_id.get()],
            |row| row.get(0),
        )?;
        let orphaned = remaining == 0;
        if orphaned {
            tx.execute(
                "DELETE FROM todo_category WHERE id = ?1",
                params![category_id.get()],
            )?;
        }
        tx.commit()?;
        Ok(orphaned)
    }

    /// Move a category between two neighbors on one project's board
    pub fn move_category(
        &self,
        project_id: ProjectId,
        category_id: CategoryId,
        left: Option<CategoryId>,
        right: Option<CategoryId>,
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        CategoryInProject::move_to(
            &tx,
            project_id.get(),
            category_id.get(),
            left.map(CategoryId::get),
            right.map(CategoryId::get),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// All category order records for one project, in item-id order
    pub fn category_records(&self, project_id: ProjectId) -> StorageResult<Vec<OrderRecord>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let records = CategoryInProject::records(&tx, project_id.get())?;
        Ok(records)
    }

    // === Items ===

    /// Create a todo item inside a category
    ///
    /// New items carry no order record: they are implicitly sequenced by
    /// creation order until the first explicit move.
    pub fn create_item(
        &self,
        category_id: CategoryId,
        title: &str,
        description: Option<&str>,
    ) -> StorageResult<TodoItem> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if category_row(&tx, category_id)?.is_none() {
            return Err(StorageError::CategoryNotFound(category_id));
        }

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO todo_item (category_id, title, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                category_id.get(),
                title,
                description,
                created_at.to_rfc3339()
            ],
        )?;
        let id = ItemId::new(tx.last_insert_rowid());
        tx.commit()?;

        Ok(TodoItem {
            id,
            category_id,
            title: title.to_string(),
            description: description.map(str::to_string),
            is_done: false,
            created_at,
        })
    }

    /// Load an item by id
    pub fn get_item(&self, id: ItemId) -> StorageResult<Option<TodoItem>> {
        let conn = self.conn.lock().unwrap();
        item_row(&conn, id)
    }

    /// Update an item's title and/or description
    ///
    /// `None` leaves a field unchanged; `Some(None)` clears the description.
    pub fn update_item(
        &self,
        id: ItemId,
        title: Option<&str>,
        description: Option<Option<&str>>,
    ) -> StorageResult<TodoItem> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut item) = item_row(&tx, id)? else {
            return Err(StorageError::ItemNotFound(id));
        };
        if let Some(title) = title {
            item.title = title.to_string();
        }
        if let Some(description) = description {
            item.description = description.map(str::to_string);
        }
        tx.execute(
            "UPDATE todo_item SET title = ?2, description = ?3 WHERE id = ?1",
            params![id.get(), item.title, item.description],
        )?;
        tx.commit()?;
        Ok(item)
    }

    /// Mark an item done or not done
    pub fn set_item_done(&self, id: ItemId, done: bool) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE todo_item SET is_done = ?2 WHERE id = ?1",
            params![id.get(), done],
        )?;
        if updated == 0 {
            return Err(StorageError::ItemNotFound(id));
        }
        Ok(())
    }

    /// List a category's items newest-first, each with its order record
    ///
    /// Newest-first is the stable arbitrary order consumers start from
    /// before walking the neighbor pointers.
    pub fn list_items(
        &self,
        category_id: CategoryId,
    ) -> StorageResult<Vec<(TodoItem, Option<OrderRecord>)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT i.id, i.category_id, i.title, i.description, i.is_done, i.created_at,
                    o.item_id, o.left_id, o.right_id
             FROM todo_item i
             LEFT JOIN todo_item_order o
                 ON o.category_id = i.category_id AND o.item_id = i.id
             WHERE i.category_id = ?1
             ORDER BY i.id DESC",
        )?;
        let rows = stmt.query_map(params![category_id.get()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<i64>>(6)?,
                row.get::<_, Option<i64>>(7)?,
                row.get::<_, Option<i64>>(8)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, cat, title, description, is_done, created_at, ordered_id, left_id, right_id) =
                row?;
            let order = ordered_id.map(|item_id| OrderRecord {
                item_id,
                left_id,
                right_id,
            });
            items.push((
                TodoItem {
                    id: ItemId::new(id),
                    category_id: CategoryId::new(cat),
                    title,
                    description,
                    is_done,
                    created_at: parse_timestamp(&created_at)?,
                },
                order,
            ));
        }
        Ok(items)
    }

    /// Move an item between two neighbors inside its category
    pub fn move_item(
        &self,
        category_id: CategoryId,
        item_id: ItemId,
        left: Option<ItemId>,
        right: Option<ItemId>,
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ItemInCategory::move_to(
            &tx,
            category_id.get(),
            item_id.get(),
            left.map(ItemId::get),
            right.map(ItemId::get),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Move an item into another category
    ///
    /// Two explicit engine calls: detach from the old category's chain, then
    /// append at the tail of the new one. The old chain closes around the
    /// gap; the new scope gets a fresh record.
    pub fn move_item_to_category(
        &self,
        item_id: ItemId,
        new_category_id: CategoryId,
    ) -> StorageResult<TodoItem> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(item) = item_row(&tx, item_id)? else {
            return Err(StorageError::ItemNotFound(item_id));
        };
        if category_row(&tx, new_category_id)?.is_none() {
            return Err(StorageError::CategoryNotFound(new_category_id));
        }
        if item.category_id == new_category_id {
            return Ok(item);
        }

        ItemInCategory::detach(&tx, item.category_id.get(), item_id.get())?;
        tx.execute(
            "UPDATE todo_item SET category_id = ?2 WHERE id = ?1",
            params![item_id.get(), new_category_id.get()],
        )?;
        ItemInCategory::append(&tx, new_category_id.get(), item_id.get())?;
        tx.commit()?;

        Ok(TodoItem {
            category_id: new_category_id,
            ..item
        })
    }

    /// Delete an item, closing its category's chain around it
    pub fn delete_item(&self, item_id: ItemId) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(item) = item_row(&tx, item_id)? else {
            return Ok(false);
        };

        ItemInCategory::detach(&tx, item.category_id.get(), item_id.get())?;
        tx.execute("DELETE FROM todo_item WHERE id = ?1", params![item_id.get()])?;
        tx.commit()?;
        Ok(true)
    }

    /// All item order records for one category, in item-id order
    pub fn item_records(&self, category_id: CategoryId) -> StorageResult<Vec<OrderRecord>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let records = ItemInCategory::records(&tx, category_id.get())?;
        Ok(records)
    }
}

/// Parse an RFC 3339 timestamp stored as TEXT
fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

fn ensure_project(tx: &Transaction<'_>, id: ProjectId) -> StorageResult<()> {
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM project WHERE id = ?1)",
        params![id.get()],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StorageError::ProjectNotFound(id))
    }
}

fn is_attached(
    tx: &Transaction<'_>,
    category_id: CategoryId,
    project_id: ProjectId,
) -> StorageResult<bool> {
    let attached: bool = tx.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM todo_category_project WHERE category_id = ?1 AND project_id = ?2
         )",
        params![category_id.get(), project_id.get()],
        |row| row.get(0),
    )?;
    Ok(attached)
}

fn category_row(conn: &Connection, id: CategoryId) -> StorageResult<Option<TodoCategory>> {
    let row = conn
        .query_row(
            "SELECT id, title, description, created_at FROM todo_category WHERE id = ?1",
            params![id.get()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, title, description, created_at)| {
        Ok(TodoCategory {
            id: CategoryId::new(id),
            title,
            description,
            created_at: parse_timestamp(&created_at)?,
        })
    })
    .transpose()
}

fn item_row(conn: &Connection, id: ItemId) -> StorageResult<Option<TodoItem>> {
    let row = conn
        .query_row(
            "SELECT id, category_id, title, description, is_done, created_at
             FROM todo_item WHERE id = ?1",
            params![id.get()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, category_id, title, description, is_done, created_at)| {
        Ok(TodoItem {
            id: ItemId::new(id),
            category_id: CategoryId::new(category_id),
            title,
            description,
            is_done,
            created_at: parse_timestamp(&created_at)?,
        })
    })
    .transpose()
}

/// Remove categories no longer attached to any project
///
/// Their items and order rows go with them via the cascade constraints.
fn collect_orphan_categories(tx: &Transaction<'_>) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM todo_category
         WHERE id NOT IN (SELECT category_id FROM todo_category_project)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn record_for(records: &[OrderRecord], item_id: i64) -> Option<OrderRecord> {
        records.iter().copied().find(|r| r.item_id == item_id)
    }

    #[test]
    fn test_create_and_list_projects() {
        let store = create_test_store();
        let a = store.create_project("alpha").unwrap();
        let b = store.create_project("beta").unwrap();

        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, a.id);
        assert_eq!(projects[0].title, "alpha");
        assert_eq!(projects[1].id, b.id);

        assert!(store.get_project(a.id).unwrap().is_some());
        assert!(store
            .get_project(ProjectId::new(9999))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_category_creation_appends_to_chain() {
        let store = create_test_store();
        let project = store.create_project("board").unwrap();
        let c1 = store.create_category(project.id, "backlog", None).unwrap();
        let c2 = store.create_category(project.id, "doing", None).unwrap();
        let c3 = store.create_category(project.id, "done", None).unwrap();

        let records = store.category_records(project.id).unwrap();
        assert_eq!(records.len(), 3);

        let r1 = record_for(&records, c1.id.get()).unwrap();
        let r2 = record_for(&records, c2.id.get()).unwrap();
        let r3 = record_for(&records, c3.id.get()).unwrap();

        assert_eq!((r1.left_id, r1.right_id), (None, Some(c2.id.get())));
        assert_eq!(
            (r2.left_id, r2.right_id),
            (Some(c1.id.get()), Some(c3.id.get()))
        );
        assert_eq!((r3.left_id, r3.right_id), (Some(c2.id.get()), None));
    }

    #[test]
    fn test_attach_prepends_to_second_project() {
        let store = create_test_store();
        let home = store.create_project("home").unwrap();
        let work = store.create_project("work").unwrap();
        let shared = store.create_category(home.id, "errands", None).unwrap();
        let inbox = store.create_category(work.id, "inbox", None).unwrap();

        store.attach_category(shared.id, work.id).unwrap();

        let records = store.category_records(work.id).unwrap();
        let shared_rec = record_for(&records, shared.id.get()).unwrap();
        let inbox_rec = record_for(&records, inbox.id.get()).unwrap();

        assert_eq!(
            (shared_rec.left_id, shared_rec.right_id),
            (None, Some(inbox.id.get()))
        );
        assert_eq!(inbox_rec.left_id, Some(shared.id.get()));

        // Re-attaching is rejected.
        let err = store.attach_category(shared.id, work.id).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyAttached { .. }));
    }

    #[test]
    fn test_detach_relinks_and_preserves_other_board() {
        let store = create_test_store();
        let home = store.create_project("home").unwrap();
        let work = store.create_project("work").unwrap();

        let a = store.create_category(home.id, "a", None).unwrap();
        let b = store.create_category(home.id, "b", None).unwrap();
        let c = store.create_category(home.id, "c", None).unwrap();
        store.attach_category(b.id, work.id).unwrap();

        let work_before = store.category_records(work.id).unwrap();

        // Detach the middle node from home; a and c relink directly.
        let deleted = store.detach_category(b.id, home.id).unwrap();
        assert!(!deleted, "category still attached to work");

        let records = store.category_records(home.id).unwrap();
        assert!(record_for(&records, b.id.get()).is_none());
        let ra = record_for(&records, a.id.get()).unwrap();
        let rc = record_for(&records, c.id.get()).unwrap();
        assert_eq!((ra.left_id, ra.right_id), (None, Some(c.id.get())));
        assert_eq!((rc.left_id, rc.right_id), (Some(a.id.get()), None));

        // The work board never changed, category id collision included.
        assert_eq!(store.category_records(work.id).unwrap(), work_before);
    }

    #[test]
    fn test_detach_from_last_project_deletes_category() {
        let store = create_test_store();
        let project = store.create_project("solo").unwrap();
        let cat = store.create_category(project.id, "only", None).unwrap();
        let item = store.create_item(cat.id, "task", None).unwrap();

        let deleted = store.detach_category(cat.id, project.id).unwrap();
        assert!(deleted);
        assert!(store.list_categories(project.id).unwrap().is_empty());
        assert!(store.get_item(item.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_project_collects_orphan_categories() {
        let store = create_test_store();
        let home = store.create_project("home").unwrap();
        let work = store.create_project("work").unwrap();
        let orphan = store.create_category(home.id, "only-home", None).unwrap();
        let shared = store.create_category(home.id, "shared", None).unwrap();
        store.attach_category(shared.id, work.id).unwrap();

        assert!(store.delete_project(home.id).unwrap());

        // The shared category survives on the other board; the orphan dies.
        let work_cats = store.list_categories(work.id).unwrap();
        assert_eq!(work_cats.len(), 1);
        assert_eq!(work_cats[0].0.id, shared.id);

        let all_ids: Vec<i64> = work_cats.iter().map(|(c, _)| c.id.get()).collect();
        assert!(!all_ids.contains(&orphan.id.get()));
    }

    #[test]
    fn test_update_distinguishes_unchanged_from_cleared() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store
            .create_category(project.id, "inbox", Some("triage first"))
            .unwrap();
        let item = store
            .create_item(cat.id, "task", Some("with notes"))
            .unwrap();

        // None leaves the description alone.
        let cat = store
            .update_category(cat.id, Some("renamed"), None)
            .unwrap();
        assert_eq!(cat.title, "renamed");
        assert_eq!(cat.description.as_deref(), Some("triage first"));

        // Some(None) resets it to NULL.
        let cat = store.update_category(cat.id, None, Some(None)).unwrap();
        assert_eq!(cat.description, None);

        let item = store
            .update_item(item.id, None, Some(Some("rewritten")))
            .unwrap();
        assert_eq!(item.description.as_deref(), Some("rewritten"));
        let item = store.update_item(item.id, None, Some(None)).unwrap();
        assert_eq!(item.description, None);
        assert_eq!(item.title, "task");

        // The cleared value persisted, not just the returned struct.
        let reloaded = store.get_item(item.id).unwrap().unwrap();
        assert_eq!(reloaded.description, None);
    }

    #[test]
    fn test_items_start_unordered() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store.create_category(project.id, "c", None).unwrap();
        for n in 0..3 {
            store
                .create_item(cat.id, &format!("task {}", n), None)
                .unwrap();
        }

        let items = store.list_items(cat.id).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|(_, order)| order.is_none()));
        // Newest first: the stable arbitrary order of the read side.
        assert!(items.windows(2).all(|w| w[0].0.id.get() > w[1].0.id.get()));
    }

    #[test]
    fn test_move_item_to_category_relinks_both_scopes() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let from = store.create_category(project.id, "from", None).unwrap();
        let to = store.create_category(project.id, "to", None).unwrap();

        let a = store.create_item(from.id, "a", None).unwrap();
        let b = store.create_item(from.id, "b", None).unwrap();
        let c = store.create_item(from.id, "c", None).unwrap();
        let target = store.create_item(to.id, "target", None).unwrap();

        // Build an explicit chain a-b-c in the source category.
        store.move_item(from.id, b.id, Some(a.id), None).unwrap();
        store.move_item(from.id, c.id, Some(b.id), None).unwrap();

        let moved = store.move_item_to_category(b.id, to.id).unwrap();
        assert_eq!(moved.category_id, to.id);

        // Old chain closed around the gap.
        let from_records = store.item_records(from.id).unwrap();
        assert!(record_for(&from_records, b.id.get()).is_none());
        let ra = record_for(&from_records, a.id.get()).unwrap();
        let rc = record_for(&from_records, c.id.get()).unwrap();
        assert_eq!(ra.right_id, Some(c.id.get()));
        assert_eq!(rc.left_id, Some(a.id.get()));

        // Appended at the new category's tail (after its only item).
        let to_records = store.item_records(to.id).unwrap();
        let rb = record_for(&to_records, b.id.get()).unwrap();
        assert_eq!((rb.left_id, rb.right_id), (Some(target.id.get()), None));
    }

    #[test]
    fn test_delete_item_relinks_chain() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store.create_category(project.id, "c", None).unwrap();
        let a = store.create_item(cat.id, "a", None).unwrap();
        let b = store.create_item(cat.id, "b", None).unwrap();
        let c = store.create_item(cat.id, "c", None).unwrap();
        store.move_item(cat.id, b.id, Some(a.id), None).unwrap();
        store.move_item(cat.id, c.id, Some(b.id), None).unwrap();

        assert!(store.delete_item(b.id).unwrap());
        assert!(store.get_item(b.id).unwrap().is_none());

        let records = store.item_records(cat.id).unwrap();
        let ra = record_for(&records, a.id.get()).unwrap();
        let rc = record_for(&records, c.id.get()).unwrap();
        assert_eq!(ra.right_id, Some(c.id.get()));
        assert_eq!(rc.left_id, Some(a.id.get()));
    }

    #[test]
    fn test_failed_move_rolls_back_whole_splice() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store.create_category(project.id, "c", None).unwrap();
        let a = store.create_item(cat.id, "a", None).unwrap();
        let b = store.create_item(cat.id, "b", None).unwrap();
        store.move_item(cat.id, b.id, Some(a.id), None).unwrap();

        let before = store.item_records(cat.id).unwrap();

        let err = store
            .move_item(cat.id, a.id, Some(a.id), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Order(crate::order::OrderError::CyclicOrder { .. })
        ));

        assert_eq!(store.item_records(cat.id).unwrap(), before);
    }

    #[test]
    fn test_unique_neighbor_constraint_enforced_by_schema() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store.create_category(project.id, "c", None).unwrap();
        let a = store.create_item(cat.id, "a", None).unwrap();
        let b = store.create_item(cat.id, "b", None).unwrap();
        let c = store.create_item(cat.id, "c", None).unwrap();
        store.move_item(cat.id, b.id, Some(a.id), None).unwrap();

        // Hand-craft a second claim on the same left neighbor; the schema
        // must refuse it even though the engine was bypassed.
        let conn = store.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO todo_item_order (category_id, item_id, left_id, right_id)
             VALUES (?1, ?2, ?3, NULL)",
            params![cat.id.get(), c.id.get(), a.id.get()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_self_reference_rejected_by_schema() {
        let store = create_test_store();
        let project = store.create_project("p").unwrap();
        let cat = store.create_category(project.id, "c", None).unwrap();
        let a = store.create_item(cat.id, "a", None).unwrap();

        let conn = store.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO todo_item_order (category_id, item_id, left_id, right_id)
             VALUES (?1, ?2, ?2, NULL)",
            params![cat.id.get(), a.id.get()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wal_mode_enabled_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test-wal.db");
        let store = SqliteStore::open(&db_path).unwrap();

        let journal_mode: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode, "wal");
    }

    #[test]
    fn test_reopen_preserves_chain() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test-reopen.db");

        let project_id;
        let first;
        let second;
        {
            let store = SqliteStore::open(&db_path).unwrap();
            let project = store.create_project("persistent").unwrap();
            project_id = project.id;
            first = store.create_category(project.id, "one", None).unwrap().id;
            second = store.create_category(project.id, "two", None).unwrap().id;
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let records = store.category_records(project_id).unwrap();
        let r1 = record_for(&records, first.get()).unwrap();
        assert_eq!(r1.right_id, Some(second.get()));
    }
}
