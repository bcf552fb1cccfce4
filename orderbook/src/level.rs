// One price level: a FIFO of resting orders plus AVL tree linkage
// (spec.md §3/§4.2 — component C2; tree metadata lives on the level itself,
// intrusive, per spec.md §4.3).

use common::Price;

use crate::arena::{OrderPool, PoolIndex};
use crate::order::Order;

/// One distinct price on one side of the book.
///
/// A level remains in its tree and in the price→level map once `size` drops
/// to zero (lazy deletion, spec.md §4.5/§9): re-adding at that price reuses
/// the same node instead of allocating a new one.
#[derive(Debug, Clone, Copy)]
pub struct Level {
    pub price: Price,
    pub size: u32,
    pub total_volume: u64,
    pub(crate) head: PoolIndex,
    pub(crate) tail: PoolIndex,
    pub(crate) parent: PoolIndex,
    pub(crate) left: PoolIndex,
    pub(crate) right: PoolIndex,
    pub(crate) height: i32,
}

impl Level {
    pub(crate) fn new(price: Price) -> Self {
        Self {
            price,
            size: 0,
            total_volume: 0,
            head: PoolIndex::NULL,
            tail: PoolIndex::NULL,
            parent: PoolIndex::NULL,
            left: PoolIndex::NULL,
            right: PoolIndex::NULL,
            height: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Appends `order_idx` to the tail of `level_idx`'s FIFO (spec.md §4.2).
///
/// Updates `prev`/`next`/`head`/`tail`, increments `size`, adds the order's
/// `shares` to `total_volume`, and sets the order's level back-reference.
pub(crate) fn append_order(
    orders: &OrderPool,
    levels: &crate::arena::LevelPool,
    level_idx: PoolIndex,
    order_idx: PoolIndex,
) {
    let shares = orders
        .get_by_index(order_idx.get())
        .expect("order index must be valid")
        .shares;

    let level: &mut Level = levels
        .get_by_index(level_idx.get())
        .expect("level index must be valid");

    let old_tail = level.tail;
    if old_tail.is_null() {
        level.head = order_idx;
        level.tail = order_idx;
    } else {
        level.tail = order_idx;
    }
    level.size += 1;
    level.total_volume += shares as u64;

    let order: &mut Order = orders
        .get_by_index(order_idx.get())
        .expect("order index must be valid");
    order.level = level_idx;
    order.prev = old_tail;
    order.next = PoolIndex::NULL;

    if !old_tail.is_null() {
        let old_tail_order: &mut Order = orders
            .get_by_index(old_tail.get())
            .expect("old tail index must be valid");
        old_tail_order.next = order_idx;
    }
}
