// The match loop (spec.md §4.6), mirroring `original_source/src/pybook.py`'s
// `Book.update_book`/`execute_trade`: crosses the inside quotes head-to-head
// until the book is no longer crossed, at strict price-time priority (each
// level's FIFO order is insertion order, spec.md §4.2).

use common::Qty;

use crate::book::Book;
use crate::order;

impl Book {
    /// Matches resting orders at the inside quotes until the book is
    /// uncrossed: `lowest_ask > highest_bid`, or one side is empty.
    ///
    /// Each iteration trades the head orders of the inside bid and ask
    /// levels for `min(bid.shares, ask.shares)`, fully consuming at least
    /// one of them. A fully consumed order is unlinked, erased from its
    /// side's id index, and its arena slot reclaimed; if its level emptied,
    /// `active_level_count` is decremented and the inside quote on that side
    /// is repaired before the next iteration.
    pub(crate) fn run_matching(&mut self) {
        loop {
            let (bid_price, ask_price) = match (self.highest_bid, self.lowest_ask) {
                (Some(b), Some(a)) => (b, a),
                _ => break,
            };
            if ask_price > bid_price {
                break;
            }

            let bid_level_idx = *self
                .bid_levels
                .get(&bid_price)
                .expect("cached highest_bid must have a level");
            let ask_level_idx = *self
                .ask_levels
                .get(&ask_price)
                .expect("cached lowest_ask must have a level");

            let bid_order_idx = self.bid_tree.level(bid_level_idx).head;
            let ask_order_idx = self.ask_tree.level(ask_level_idx).head;
            debug_assert!(
                !bid_order_idx.is_null() && !ask_order_idx.is_null(),
                "a non-empty inside level must have a FIFO head"
            );

            let bid_uid = self.orders.get_by_index(bid_order_idx.get()).unwrap().uid;
            let ask_uid = self.orders.get_by_index(ask_order_idx.get()).unwrap().uid;
            let bid_shares = self.orders.get_by_index(bid_order_idx.get()).unwrap().shares;
            let ask_shares = self.orders.get_by_index(ask_order_idx.get()).unwrap().shares;
            let traded: Qty = bid_shares.min(ask_shares);

            let bid_retired = order::reduce_in_place(&self.orders, self.bid_tree.pool(), bid_order_idx, traded);
            if bid_retired {
                self.bid_index.remove(&bid_uid);
                unsafe { self.orders.deallocate_by_index(bid_order_idx.get()) };
                if self.bid_tree.level(bid_level_idx).is_empty() {
                    self.bid_tree.active_level_count -= 1;
                    self.update_inside_bid(bid_level_idx);
                }
            }

            let ask_retired = order::reduce_in_place(&self.orders, self.ask_tree.pool(), ask_order_idx, traded);
            if ask_retired {
                self.ask_index.remove(&ask_uid);
                unsafe { self.orders.deallocate_by_index(ask_order_idx.get()) };
                if self.ask_tree.level(ask_level_idx).is_empty() {
                    self.ask_tree.active_level_count -= 1;
                    self.update_inside_ask(ask_level_idx);
                }
            }
        }
    }
}
