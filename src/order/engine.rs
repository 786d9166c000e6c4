//! Chain operations: append, move, detach
//!
//! All writes go through [`OrderStore::move_to`], which performs the full
//! splice — validate, detach from the old position, relink both sides of the
//! new position, upsert the moving item's record — inside the caller's
//! transaction. The individual statements are interdependent, so callers
//! must never interleave two operations on the same scope; the storage layer
//! guarantees this by opening an immediate transaction per call.

use super::{guard, OrderRecord, OrderResult, OrderScope};
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

/// Ordering operations over one scope's chain
///
/// Blanket-implemented for every [`OrderScope`], so the two adapter types
/// expose `append`/`move_to`/`detach` directly.
pub trait OrderStore: OrderScope + Sized {
    /// Place `item_id` at the tail of the scope's chain
    ///
    /// The current tail is the record with a null `right_id` (excluding the
    /// moving item); when no explicit chain has been started, the most
    /// recently created item in the scope serves as the implicit tail.
    fn append(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<()> {
        let left = Self::tail_item(tx, scope_id, item_id)?;
        Self::move_to(tx, scope_id, item_id, left, None)
    }

    /// Splice `item_id` between `new_left` and `new_right`
    ///
    /// Either neighbor may be null to mark an end of the chain. The moving
    /// item's record is created on first placement. Fails without mutating
    /// anything when the assignment is cyclic, conflicts with an edge the
    /// splice would not rewrite, or references ids outside the scope.
    fn move_to(
        tx: &Transaction<'_>,
        scope_id: i64,
        item_id: i64,
        new_left: Option<i64>,
        new_right: Option<i64>,
    ) -> OrderResult<()> {
        guard::validate::<Self>(tx, scope_id, item_id, new_left, new_right)?;

        debug!(
            table = Self::TABLE,
            scope_id, item_id, new_left, new_right, "splicing item into chain"
        );

        unlink::<Self>(tx, scope_id, item_id)?;

        if let Some(left) = new_left {
            // Whoever sat immediately after `left` now sits after the moving
            // item instead.
            let sql = format!(
                "UPDATE {table} SET left_id = ?3 \
                 WHERE {scope} = ?1 AND left_id = ?2 AND {item} != ?3",
                table = Self::TABLE,
                scope = Self::SCOPE_COL,
                item = Self::ITEM_COL,
            );
            tx.execute(&sql, params![scope_id, left, item_id])?;
            set_right::<Self>(tx, scope_id, left, Some(item_id))?;
        }

        if let Some(right) = new_right {
            let sql = format!(
                "UPDATE {table} SET right_id = ?3 \
                 WHERE {scope} = ?1 AND right_id = ?2 AND {item} != ?3",
                table = Self::TABLE,
                scope = Self::SCOPE_COL,
                item = Self::ITEM_COL,
            );
            tx.execute(&sql, params![scope_id, right, item_id])?;
            set_left::<Self>(tx, scope_id, right, Some(item_id))?;
        }

        upsert::<Self>(tx, scope_id, item_id, new_left, new_right)
    }

    /// Remove `item_id` from the scope's chain entirely
    ///
    /// Relinks its former neighbors to each other and deletes its record.
    /// A no-op when the item was never explicitly placed. Used when an item
    /// leaves its scope: deleted, or reassigned to a different scope.
    fn detach(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<()> {
        unlink::<Self>(tx, scope_id, item_id)?;

        let sql = format!(
            "DELETE FROM {table} WHERE {scope} = ?1 AND {item} = ?2",
            table = Self::TABLE,
            scope = Self::SCOPE_COL,
            item = Self::ITEM_COL,
        );
        let deleted = tx.execute(&sql, params![scope_id, item_id])?;
        if deleted > 0 {
            debug!(table = Self::TABLE, scope_id, item_id, "detached item from chain");
        }
        Ok(())
    }

    /// Load one item's order record, if it has been explicitly placed
    fn record(
        tx: &Transaction<'_>,
        scope_id: i64,
        item_id: i64,
    ) -> OrderResult<Option<OrderRecord>> {
        let sql = format!(
            "SELECT left_id, right_id FROM {table} WHERE {scope} = ?1 AND {item} = ?2",
            table = Self::TABLE,
            scope = Self::SCOPE_COL,
            item = Self::ITEM_COL,
        );
        let record = tx
            .query_row(&sql, params![scope_id, item_id], |row| {
                Ok(OrderRecord {
                    item_id,
                    left_id: row.get(0)?,
                    right_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    /// All order records in the scope, in item-id order
    fn records(tx: &Transaction<'_>, scope_id: i64) -> OrderResult<Vec<OrderRecord>> {
        let sql = format!(
            "SELECT {item}, left_id, right_id FROM {table} \
             WHERE {scope} = ?1 ORDER BY {item}",
            table = Self::TABLE,
            scope = Self::SCOPE_COL,
            item = Self::ITEM_COL,
        );
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map(params![scope_id], |row| {
            Ok(OrderRecord {
                item_id: row.get(0)?,
                left_id: row.get(1)?,
                right_id: row.get(2)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Last item in the scope, excluding `except`
    ///
    /// Prefers the explicit tail (a record with null `right_id`); falls back
    /// to the scope's most recently created item when no chain exists.
    fn tail_item(tx: &Transaction<'_>, scope_id: i64, except: i64) -> OrderResult<Option<i64>> {
        let sql = format!(
            "SELECT {item} FROM {table} \
             WHERE {scope} = ?1 AND right_id IS NULL AND {item} != ?2 \
             ORDER BY {item} LIMIT 1",
            table = Self::TABLE,
            scope = Self::SCOPE_COL,
            item = Self::ITEM_COL,
        );
        let explicit: Option<i64> = tx
            .query_row(&sql, params![scope_id, except], |row| row.get(0))
            .optional()?;
        match explicit {
            Some(id) => Ok(Some(id)),
            None => Self::latest_created(tx, scope_id, except),
        }
    }

    /// First item in the scope, excluding `except`
    ///
    /// The mirror of [`OrderStore::tail_item`]: the explicit head (null
    /// `left_id`), falling back to the earliest created item.
    fn head_item(tx: &Transaction<'_>, scope_id: i64, except: i64) -> OrderResult<Option<i64>> {
        let sql = format!(
            "SELECT {item} FROM {table} \
             WHERE {scope} = ?1 AND left_id IS NULL AND {item} != ?2 \
             ORDER BY {item} LIMIT 1",
            table = Self::TABLE,
            scope = Self::SCOPE_COL,
            item = Self::ITEM_COL,
        );
        let explicit: Option<i64> = tx
            .query_row(&sql, params![scope_id, except], |row| row.get(0))
            .optional()?;
        match explicit {
            Some(id) => Ok(Some(id)),
            None => Self::earliest_created(tx, scope_id, except),
        }
    }
}

impl<S: OrderScope> OrderStore for S {}

/// Remove `item_id` from its current position without deleting its record
///
/// The bypass-relink half of both `move_to` and `detach`: the node that had
/// `right_id == item_id` inherits the item's old right neighbor, and vice
/// versa, so the chain stays continuous around the gap.
fn unlink<S: OrderScope>(tx: &Transaction<'_>, scope_id: i64, item_id: i64) -> OrderResult<()> {
    let Some(record) = S::record(tx, scope_id, item_id)? else {
        return Ok(());
    };
    let (old_left, old_right) = (record.left_id, record.right_id);

    // Clear the moving item's own pointers first; otherwise the bridge
    // updates below would collide with the per-scope uniqueness constraints.
    let sql = format!(
        "UPDATE {table} SET left_id = NULL, right_id = NULL WHERE {scope} = ?1 AND {item} = ?2",
        table = S::TABLE,
        scope = S::SCOPE_COL,
        item = S::ITEM_COL,
    );
    tx.execute(&sql, params![scope_id, item_id])?;

    // Bridge the gap from both directions.
    let sql = format!(
        "UPDATE {table} SET right_id = ?3 WHERE {scope} = ?1 AND right_id = ?2",
        table = S::TABLE,
        scope = S::SCOPE_COL,
    );
    tx.execute(&sql, params![scope_id, item_id, old_right])?;

    let sql = format!(
        "UPDATE {table} SET left_id = ?3 WHERE {scope} = ?1 AND left_id = ?2",
        table = S::TABLE,
        scope = S::SCOPE_COL,
    );
    tx.execute(&sql, params![scope_id, item_id, old_left])?;

    // The recorded neighbors may hold only one half of the edge; fix them up
    // by id as well.
    if let Some(left) = old_left {
        let sql = format!(
            "UPDATE {table} SET right_id = ?3 WHERE {scope} = ?1 AND {item} = ?2",
            table = S::TABLE,
            scope = S::SCOPE_COL,
            item = S::ITEM_COL,
        );
        tx.execute(&sql, params![scope_id, left, old_right])?;
    }
    if let Some(right) = old_right {
        let sql = format!(
            "UPDATE {table} SET left_id = ?3 WHERE {scope} = ?1 AND {item} = ?2",
            table = S::TABLE,
            scope = S::SCOPE_COL,
            item = S::ITEM_COL,
        );
        tx.execute(&sql, params![scope_id, right, old_left])?;
    }

    Ok(())
}

/// Set one neighbor's `left_id`, creating its record when missing
///
/// A neighbor named in a splice may itself still be unordered; the pointer
/// has to exist afterwards either way.
fn set_left<S: OrderScope>(
    tx: &Transaction<'_>,
    scope_id: i64,
    item_id: i64,
    left_id: Option<i64>,
) -> OrderResult<()> {
    let sql = format!(
        "INSERT INTO {table} ({scope}, {item}, left_id, right_id) VALUES (?1, ?2, ?3, NULL) \
         ON CONFLICT({scope}, {item}) DO UPDATE SET left_id = excluded.left_id",
        table = S::TABLE,
        scope = S::SCOPE_COL,
        item = S::ITEM_COL,
    );
    tx.execute(&sql, params![scope_id, item_id, left_id])?;
    Ok(())
}

/// Set one neighbor's `right_id`, creating its record when missing
fn set_right<S: OrderScope>(
    tx: &Transaction<'_>,
    scope_id: i64,
    item_id: i64,
    right_id: Option<i64>,
) -> OrderResult<()> {
    let sql = format!(
        "INSERT INTO {table} ({scope}, {item}, left_id, right_id) VALUES (?1, ?2, NULL, ?3) \
         ON CONFLICT({scope}, {item}) DO UPDATE SET right_id = excluded.right_id",
        table = S::TABLE,
        scope = S::SCOPE_COL,
        item = S::ITEM_COL,
    );
    tx.execute(&sql, params![scope_id, item_id, right_id])?;
    Ok(())
}

/// Write the moving item's own record with both pointers
fn upsert<S: OrderScope>(
    tx: &Transaction<'_>,
    scope_id: i64,
    item_id: i64,
    left_id: Option<i64>,
    right_id: Option<i64>,
) -> OrderResult<()> {
    let sql = format!(
        "INSERT INTO {table} ({scope}, {item}, left_id, right_id) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT({scope}, {item}) DO UPDATE SET \
             left_id = excluded.left_id, right_id = excluded.right_id",
        table = S::TABLE,
        scope = S::SCOPE_COL,
        item = S::ITEM_COL,
    );
    tx.execute(&sql, params![scope_id, item_id, left_id, right_id])?;
    Ok(())
}
