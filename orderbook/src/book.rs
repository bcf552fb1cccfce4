// The book: composes the order/level arenas and both AVL trees, owns the
// id/price indexes and cached inside quotes, and drives matching
// (spec.md §3/§4.4 — component C4).

use std::collections::HashMap;

use common::logging::{LogLevel, Logger};
use common::{log_warn, OrderId, Price, Qty, Side};

use crate::arena::{OrderPool, PoolIndex, ORDER_CAPACITY};
use crate::avl::AvlTree;
use crate::error::BookError;
use crate::level;
use crate::order::{self, Order};

/// A single-instrument limit order book.
///
/// Single-threaded and synchronous: every `add_order`/`reduce_order` call
/// runs to completion — including any matching it triggers — before
/// returning (spec.md §5).
pub struct Book {
    pub(crate) bid_tree: AvlTree,
    pub(crate) ask_tree: AvlTree,
    pub(crate) bid_levels: HashMap<Price, PoolIndex>,
    pub(crate) ask_levels: HashMap<Price, PoolIndex>,
    pub(crate) bid_index: HashMap<OrderId, PoolIndex>,
    pub(crate) ask_index: HashMap<OrderId, PoolIndex>,
    pub(crate) orders: Box<OrderPool>,
    pub(crate) highest_bid: Option<Price>,
    pub(crate) lowest_ask: Option<Price>,
    logger: Logger,
}

impl Book {
    pub fn new() -> Self {
        Self {
            bid_tree: AvlTree::new(),
            ask_tree: AvlTree::new(),
            bid_levels: HashMap::new(),
            ask_levels: HashMap::new(),
            bid_index: HashMap::new(),
            ask_index: HashMap::new(),
            orders: OrderPool::new_boxed(),
            highest_bid: None,
            lowest_ask: None,
            logger: Logger::with_level(LogLevel::Warn),
        }
    }

    /// Adds a new resting order and runs the match loop (spec.md §4.4).
    ///
    /// # Errors
    /// `ZeroShares` if `shares == 0`; `DuplicateUid` if `uid` is already
    /// resting on either side (both are caller contract violations per
    /// spec.md §7, reported as a typed `Err` rather than a panic/abort so
    /// callers can recover); `PoolExhausted` if either arena has no room
    /// left.
    pub fn add_order(
        &mut self,
        uid: OrderId,
        timestamp: u64,
        shares: Qty,
        price: Price,
        is_bid: bool,
    ) -> Result<(), BookError> {
        if shares == 0 {
            return Err(BookError::ZeroShares);
        }
        if self.bid_index.contains_key(&uid) || self.ask_index.contains_key(&uid) {
            log_warn!(self.logger, "duplicate uid rejected on add_order", uid);
            return Err(BookError::DuplicateUid { uid });
        }

        let side = Side::from(is_bid);
        let ptr = match self.orders.allocate() {
            Some(ptr) => ptr,
            None => {
                log_warn!(self.logger, "order pool exhausted on add_order", uid);
                return Err(BookError::PoolExhausted { capacity: ORDER_CAPACITY });
            }
        };
        let order_idx = PoolIndex::new(ptr.index());
        *self.orders.get_mut(&ptr) = Order::new(uid, timestamp, price, side, shares);

        let linked = match side {
            Side::Buy => Self::add_order_to_side(
                &self.orders,
                &mut self.bid_tree,
                &mut self.bid_levels,
                &mut self.bid_index,
                uid,
                order_idx,
                price,
            ),
            Side::Sell => Self::add_order_to_side(
                &self.orders,
                &mut self.ask_tree,
                &mut self.ask_levels,
                &mut self.ask_index,
                uid,
                order_idx,
                price,
            ),
        };
        if let Err(err) = linked {
            // The order was allocated but never linked into any FIFO or
            // index — reclaim the slot rather than leaking it.
            unsafe { self.orders.deallocate_by_index(order_idx.get()) };
            return Err(err);
        }

        match side {
            Side::Buy => {
                self.highest_bid = Some(match self.highest_bid {
                    Some(current) => current.max(price),
                    None => price,
                });
            }
            Side::Sell => {
                self.lowest_ask = Some(match self.lowest_ask {
                    Some(current) => current.min(price),
                    None => price,
                });
            }
        }

        self.run_matching();
        self.debug_validate_or_panic();
        Ok(())
    }

    /// Finds or creates the level for `price` on one side, appends the
    /// order, and indexes it by uid (spec.md §4.4 step 1-2).
    fn add_order_to_side(
        orders: &OrderPool,
        tree: &mut AvlTree,
        levels: &mut HashMap<Price, PoolIndex>,
        id_index: &mut HashMap<OrderId, PoolIndex>,
        uid: OrderId,
        order_idx: PoolIndex,
        price: Price,
    ) -> Result<(), BookError> {
        let level_idx = match levels.get(&price).copied() {
            Some(level_idx) => {
                let was_empty = tree.level(level_idx).is_empty();
                level::append_order(orders, tree.pool(), level_idx, order_idx);
                if was_empty {
                    tree.active_level_count += 1;
                }
                level_idx
            }
            None => {
                let level_idx = tree.insert(price).ok_or(BookError::PoolExhausted {
                    capacity: crate::arena::LEVEL_CAPACITY,
                })?;
                level::append_order(orders, tree.pool(), level_idx, order_idx);
                levels.insert(price, level_idx);
                tree.active_level_count += 1;
                level_idx
            }
        };
        id_index.insert(uid, order_idx);
        Ok(())
    }

    /// Reduces a resting order's size, repairs the cached inside quote if it
    /// was the order's level, and runs the match loop (spec.md §4.4).
    ///
    /// A reduce referencing an unknown `uid` is a silent no-op, absorbing
    /// late reduces that arrive after the order already retired via a
    /// cross (spec.md §4.7/§7).
    pub fn reduce_order(&mut self, uid: OrderId, delta: Qty) -> Result<(), BookError> {
        debug_assert!(delta > 0, "reduce_order precondition violated: delta must be > 0");

        if let Some(&order_idx) = self.bid_index.get(&uid) {
            let price = self.orders.get_by_index(order_idx.get()).unwrap().price;
            let was_inside = self.highest_bid == Some(price);
            let level_idx = Self::reduce_on_side(
                &self.orders,
                &mut self.bid_tree,
                &mut self.bid_index,
                uid,
                order_idx,
                delta,
            );
            if was_inside {
                self.update_inside_bid(level_idx);
            }
        } else if let Some(&order_idx) = self.ask_index.get(&uid) {
            let price = self.orders.get_by_index(order_idx.get()).unwrap().price;
            let was_inside = self.lowest_ask == Some(price);
            let level_idx = Self::reduce_on_side(
                &self.orders,
                &mut self.ask_tree,
                &mut self.ask_index,
                uid,
                order_idx,
                delta,
            );
            if was_inside {
                self.update_inside_ask(level_idx);
            }
        } else {
            return Ok(());
        }

        self.run_matching();
        self.debug_validate_or_panic();
        Ok(())
    }

    /// Applies `reduce` to one resting order and, if it retired, erases it
    /// from the id index and updates `active_level_count`. Returns the
    /// order's level, for the caller to repair the inside quote if needed.
    fn reduce_on_side(
        orders: &OrderPool,
        tree: &mut AvlTree,
        id_index: &mut HashMap<OrderId, PoolIndex>,
        uid: OrderId,
        order_idx: PoolIndex,
        delta: Qty,
    ) -> PoolIndex {
        let level_idx = orders.get_by_index(order_idx.get()).unwrap().level;
        let retired = order::reduce_in_place(orders, tree.pool(), order_idx, delta);
        if retired {
            id_index.remove(&uid);
            unsafe { orders.deallocate_by_index(order_idx.get()) };
            if tree.level(level_idx).is_empty() {
                tree.active_level_count -= 1;
            }
        }
        level_idx
    }

    /// Repairs the cached highest bid after a level at or below it may have
    /// drained (spec.md §4.5).
    pub(crate) fn update_inside_bid(&mut self, start_level: PoolIndex) {
        if self.bid_tree.active_level_count == 0 {
            self.highest_bid = None;
            return;
        }
        if !self.bid_tree.level(start_level).is_empty() {
            return;
        }
        let mut cur = self.bid_tree.predecessor(start_level);
        while !cur.is_null() && self.bid_tree.level(cur).is_empty() {
            cur = self.bid_tree.predecessor(cur);
        }
        self.highest_bid = if cur.is_null() {
            None
        } else {
            Some(self.bid_tree.level(cur).price)
        };
    }

    /// Repairs the cached lowest ask after a level at or above it may have
    /// drained (spec.md §4.5).
    pub(crate) fn update_inside_ask(&mut self, start_level: PoolIndex) {
        if self.ask_tree.active_level_count == 0 {
            self.lowest_ask = None;
            return;
        }
        if !self.ask_tree.level(start_level).is_empty() {
            return;
        }
        let mut cur = self.ask_tree.successor(start_level);
        while !cur.is_null() && self.ask_tree.level(cur).is_empty() {
            cur = self.ask_tree.successor(cur);
        }
        self.lowest_ask = if cur.is_null() {
            None
        } else {
            Some(self.ask_tree.level(cur).price)
        };
    }

    /// The cached best bid, or `None` if the bid side is empty (spec.md §4.4).
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.highest_bid
    }

    /// The cached best ask, or `None` if the ask side is empty (spec.md §4.4).
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.lowest_ask
    }

    /// Aggregate resting volume at `price` on `side`, or 0 if no level
    /// exists there (spec.md §4.4).
    pub fn volume_at(&self, price: Price, side: Side) -> u64 {
        let (levels, tree) = match side {
            Side::Buy => (&self.bid_levels, &self.bid_tree),
            Side::Sell => (&self.ask_levels, &self.ask_tree),
        };
        levels
            .get(&price)
            .map(|&idx| tree.level(idx).total_volume)
            .unwrap_or(0)
    }

    /// Sum of resting volume over levels with prices in `[low, high]`
    /// (spec.md §4.4) — a straightforward bounded in-order tree walk.
    pub fn volume_between(&self, low: Price, high: Price, side: Side) -> u64 {
        let tree = match side {
            Side::Buy => &self.bid_tree,
            Side::Sell => &self.ask_tree,
        };
        Self::volume_between_subtree(tree, tree.root(), low, high)
    }

    fn volume_between_subtree(tree: &AvlTree, node: PoolIndex, low: Price, high: Price) -> u64 {
        if node.is_null() {
            return 0;
        }
        let level = tree.level(node);
        let mut sum = 0u64;
        if level.price > low {
            sum += Self::volume_between_subtree(tree, level.left, low, high);
        }
        if level.price >= low && level.price <= high {
            sum += level.total_volume;
        }
        if level.price < high {
            sum += Self::volume_between_subtree(tree, level.right, low, high);
        }
        sum
    }

    /// One-based FIFO position of `uid` within its level (spec.md §4.4).
    ///
    /// # Errors
    /// `UnknownUid` if `uid` is not currently resting on either side.
    pub fn position_of(&self, uid: OrderId) -> Result<usize, BookError> {
        let order_idx = self
            .bid_index
            .get(&uid)
            .or_else(|| self.ask_index.get(&uid))
            .copied()
            .ok_or(BookError::UnknownUid { uid })?;

        let order = self.orders.get_by_index(order_idx.get()).unwrap();
        let tree = if order.side.is_bid() {
            &self.bid_tree
        } else {
            &self.ask_tree
        };

        let mut cur = tree.level(order.level).head;
        let mut position = 0usize;
        while !cur.is_null() {
            position += 1;
            if cur == order_idx {
                return Ok(position);
            }
            cur = self.orders.get_by_index(cur.get()).unwrap().next;
        }
        // Unreachable under the book's invariants (spec.md §8 invariant 1):
        // a resting order is always reachable from its level's head.
        Err(BookError::UnknownUid { uid })
    }

    /// Runs the debug validator after every event in debug builds only
    /// (spec.md §5's bounded-time guarantee must hold in release).
    #[cfg(debug_assertions)]
    fn debug_validate_or_panic(&self) {
        if let Err(violation) = crate::validator::debug_validate(self) {
            panic!("book invariant violated: {violation}");
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn debug_validate_or_panic(&self) {}
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}
