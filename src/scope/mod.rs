//! The two ordering scopes: categories within a project, items within a category
//!
//! Each adapter maps one domain relationship onto the engine's generic
//! `(scope, item)` pair and supplies the creation-order fallbacks used when a
//! scope has no explicit chain yet. A category attached to several projects
//! has one independent chain position per project; a todo item has exactly
//! one, inside its owning category.

use crate::order::{OrderResult, OrderScope};
use rusqlite::{params, OptionalExtension, Transaction};

/// Categories ordered within one project's board
///
/// Scope id is the project, item id is the category. Membership is the
/// category/project association row, so detaching a category from one
/// project only ever touches that project's chain.
pub struct CategoryInProject;

impl OrderScope for CategoryInProject {
    const TABLE: &'static str = "todo_category_order";
    const SCOPE_COL: &'static str = "project_id";
    const ITEM_COL: &'static str = "category_id";

    fn in_scope(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<bool> {
        let attached: bool = tx.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM todo_category_project
                 WHERE project_id = ?1 AND category_id = ?2
             )",
            params![scope_id, item_id],
            |row| row.get(0),
        )?;
        Ok(attached)
    }

    fn latest_created(
        tx: &Transaction<'_>,
        scope_id: i64,
        except: i64,
    ) -> OrderResult<Option<i64>> {
        let id = tx
            .query_row(
                "SELECT c.id FROM todo_category c
                 JOIN todo_category_project a ON a.category_id = c.id
                 WHERE a.project_id = ?1 AND c.id != ?2
                 ORDER BY c.id DESC LIMIT 1",
                params![scope_id, except],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn earliest_created(
        tx: &Transaction<'_>,
        scope_id: i64,
        except: i64,
    ) -> OrderResult<Option<i64>> {
        let id = tx
            .query_row(
                "SELECT c.id FROM todo_category c
                 JOIN todo_category_project a ON a.category_id = c.id
                 WHERE a.project_id = ?1 AND c.id != ?2
                 ORDER BY c.id ASC LIMIT 1",
                params![scope_id, except],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

/// Todo items ordered within their owning category
///
/// Scope id is the category, item id is the todo item. Moving an item to a
/// different category is never an in-place scope rewrite: the caller
/// detaches it from the old category's chain and appends it to the new one
/// as two separate engine calls.
pub struct ItemInCategory;

impl OrderScope for ItemInCategory {
    const TABLE: &'static str = "todo_item_order";
    const SCOPE_COL: &'static str = "category_id";
    const ITEM_COL: &'static str = "item_id";

    fn in_scope(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<bool> {
        let owned: bool = tx.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM todo_item WHERE category_id = ?1 AND id = ?2
             )",
            params![scope_id, item_id],
            |row| row.get(0),
        )?;
        Ok(owned)
    }

    fn latest_created(
        tx: &Transaction<'_>,
        scope_id: i64,
        except: i64,
    ) -> OrderResult<Option<i64>> {
        let id = tx
            .query_row(
                "SELECT id FROM todo_item
                 WHERE category_id = ?1 AND id != ?2
                 ORDER BY id DESC LIMIT 1",
                params![scope_id, except],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn earliest_created(
        tx: &Transaction<'_>,
        scope_id: i64,
        except: i64,
    ) -> OrderResult<Option<i64>> {
        let id = tx
            .query_row(
                "SELECT id FROM todo_item
                 WHERE category_id = ?1 AND id != ?2
                 ORDER BY id ASC LIMIT 1",
                params![scope_id, except],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
