//! Pre-mutation validation of proposed neighbor assignments
//!
//! [`validate`] runs once at the top of every splice, before anything is
//! written. The engine's own relink steps rewrite the opposing records as
//! they go, so a well-behaved caller never trips these checks; they exist so
//! that a bad assignment fails loudly instead of silently corrupting the
//! chain.

use super::{OrderError, OrderResult, OrderScope};
use rusqlite::{params, OptionalExtension, Transaction};

/// Reject neighbor assignments that would corrupt the scope's chain
///
/// Checks, in order:
/// 1. self-reference or equal left/right — `CyclicOrder`;
/// 2. the item and both named neighbors actually belong to the scope —
///    `NotFound` (defensive; callers pre-validate membership);
/// 3. a third node already sits immediately next to a named neighbor —
///    `ConflictingNeighbor`. Splicing anyway would leave two records
///    claiming the same side of the same neighbor, which the uniqueness
///    constraints on the order table forbid.
pub fn validate<S: OrderScope>(
    tx: &Transaction<'_>,
    scope_id: i64,
    item_id: i64,
    new_left: Option<i64>,
    new_right: Option<i64>,
) -> OrderResult<()> {
    if new_left == Some(item_id)
        || new_right == Some(item_id)
        || (new_left.is_some() && new_left == new_right)
    {
        return Err(OrderError::CyclicOrder {
            item_id,
            left_id: new_left,
            right_id: new_right,
        });
    }

    if !S::in_scope(tx, scope_id, item_id)? {
        return Err(OrderError::NotFound(item_id));
    }
    for neighbor in [new_left, new_right].into_iter().flatten() {
        if !S::in_scope(tx, scope_id, neighbor)? {
            return Err(OrderError::NotFound(neighbor));
        }
    }

    // The only node allowed to sit immediately after `new_left` once the
    // splice lands is the moving item itself, and the only node it may
    // displace there is `new_right` (the engine repoints that one).
    if let Some(left) = new_left {
        let sql = format!(
            "SELECT {item} FROM {table} \
             WHERE {scope} = ?1 AND left_id = ?2 AND {item} != ?3 \
               AND (?4 IS NULL OR {item} != ?4) \
             LIMIT 1",
            table = S::TABLE,
            scope = S::SCOPE_COL,
            item = S::ITEM_COL,
        );
        let claimed_by: Option<i64> = tx
            .query_row(&sql, params![scope_id, left, item_id, new_right], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(claimed_by) = claimed_by {
            return Err(OrderError::ConflictingNeighbor {
                item_id,
                neighbor_id: left,
                claimed_by,
            });
        }
    }

    // Symmetric for the right side: only `new_left` may currently claim the
    // slot immediately before `new_right`.
    if let Some(right) = new_right {
        let sql = format!(
            "SELECT {item} FROM {table} \
             WHERE {scope} = ?1 AND right_id = ?2 AND {item} != ?3 \
               AND (?4 IS NULL OR {item} != ?4) \
             LIMIT 1",
            table = S::TABLE,
            scope = S::SCOPE_COL,
            item = S::ITEM_COL,
        );
        let claimed_by: Option<i64> = tx
            .query_row(&sql, params![scope_id, right, item_id, new_left], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(claimed_by) = claimed_by {
            return Err(OrderError::ConflictingNeighbor {
                item_id,
                neighbor_id: right,
                claimed_by,
            });
        }
    }

    Ok(())
}
