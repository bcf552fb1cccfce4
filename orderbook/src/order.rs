// A single resting order (spec.md §3/§4.1 — component C1).

use common::{OrderId, Price, Qty, Side};

use crate::arena::PoolIndex;

/// One participant's resting order at a price level.
///
/// While resting, `shares > 0` and the order is reachable by exactly one
/// path: the book's id index, and a FIFO walk from its level's `head`. Links
/// are intrusive arena indices rather than pointers (see `arena.rs`).
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub uid: OrderId,
    pub timestamp: u64,
    pub price: Price,
    pub side: Side,
    pub shares: Qty,
    pub(crate) prev: PoolIndex,
    pub(crate) next: PoolIndex,
    pub(crate) level: PoolIndex,
}

impl Order {
    pub(crate) fn new(uid: OrderId, timestamp: u64, price: Price, side: Side, shares: Qty) -> Self {
        Self {
            uid,
            timestamp,
            price,
            side,
            shares,
            prev: PoolIndex::NULL,
            next: PoolIndex::NULL,
            level: PoolIndex::NULL,
        }
    }
}

use crate::arena::{LevelPool, OrderPool};
use crate::level::Level;

#[inline]
fn order_mut(orders: &OrderPool, idx: PoolIndex) -> &mut Order {
    orders
        .get_by_index(idx.get())
        .expect("order index must be valid while the order is resting")
}

#[inline]
fn level_mut(levels: &LevelPool, idx: PoolIndex) -> &mut Level {
    levels
        .get_by_index(idx.get())
        .expect("level index must be valid")
}

/// Reduces a resting order's size by `delta` (spec.md §4.1).
///
/// If `delta >= shares`, the order is fully consumed: `shares` is set to 0
/// and it is unlinked from its level's FIFO (`cancel_in_place`), after
/// subtracting the *pre-zero* remaining size from the level's
/// `total_volume` — not the post-zero amount (spec.md §9's flagged
/// "reduce-to-zero" bug, resolved to subtract before zeroing, not after).
/// Otherwise `delta` is subtracted from both the order's `shares` and its
/// level's `total_volume`.
///
/// Returns `true` if the order was fully consumed (retired).
pub(crate) fn reduce_in_place(
    orders: &OrderPool,
    levels: &LevelPool,
    order_idx: PoolIndex,
    delta: Qty,
) -> bool {
    let (shares, level_idx) = {
        let order = order_mut(orders, order_idx);
        (order.shares, order.level)
    };

    if delta >= shares {
        level_mut(levels, level_idx).total_volume -= shares as u64;
        order_mut(orders, order_idx).shares = 0;
        cancel_in_place(orders, levels, order_idx);
        true
    } else {
        order_mut(orders, order_idx).shares -= delta;
        level_mut(levels, level_idx).total_volume -= delta as u64;
        false
    }
}

/// Splices a resting order out of its level's FIFO (spec.md §4.1).
///
/// Decrements the level's `size`. The order's `level` back-reference is left
/// untouched so callers can still read `parent_limit` (here, `order.level`)
/// after cancellation to drive inside-quote repair, exactly as spec.md §4.1
/// specifies.
pub(crate) fn cancel_in_place(orders: &OrderPool, levels: &LevelPool, order_idx: PoolIndex) {
    let (prev, next, level_idx) = {
        let order = order_mut(orders, order_idx);
        (order.prev, order.next, order.level)
    };

    if prev.is_null() {
        level_mut(levels, level_idx).head = next;
    } else {
        order_mut(orders, prev).next = next;
    }

    if next.is_null() {
        level_mut(levels, level_idx).tail = prev;
    } else {
        order_mut(orders, next).prev = prev;
    }

    level_mut(levels, level_idx).size -= 1;
}
