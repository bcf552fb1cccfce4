// Debug-only recursive invariant checker over both trees (spec.md §8,
// [ADD 4.8]'s component C7), ported from
// `original_source/src/pybook.py`'s `rvalidate`: per-node AVL balance,
// height, BST ordering, and price uniqueness, extended here (spec.md
// invariant 2, absent from the Python validator) with a FIFO length/volume
// cross-check per level and a cached-inside-quote check.

use std::collections::HashSet;

use common::Price;

use crate::arena::{OrderPool, PoolIndex};
use crate::avl::AvlTree;
use crate::book::Book;
use crate::error::ValidationError;

/// Walks both trees and checks every invariant named in spec.md §8.
/// Returns the first violation found, or `Ok(())` if the book is consistent.
pub fn debug_validate(book: &Book) -> Result<(), ValidationError> {
    let mut bid_prices = HashSet::new();
    validate_subtree(
        &book.bid_tree,
        &book.orders,
        book.bid_tree.root(),
        None,
        None,
        "bid",
        &mut bid_prices,
    )?;

    let mut ask_prices = HashSet::new();
    validate_subtree(
        &book.ask_tree,
        &book.orders,
        book.ask_tree.root(),
        None,
        None,
        "ask",
        &mut ask_prices,
    )?;

    let actual_bid = highest_non_empty(&book.bid_tree, book.bid_tree.root());
    if actual_bid != book.highest_bid {
        return Err(ValidationError::StaleInsideQuote {
            side: "bid",
            cached: book.highest_bid,
            actual: actual_bid,
        });
    }

    let actual_ask = lowest_non_empty(&book.ask_tree, book.ask_tree.root());
    if actual_ask != book.lowest_ask {
        return Err(ValidationError::StaleInsideQuote {
            side: "ask",
            cached: book.lowest_ask,
            actual: actual_ask,
        });
    }

    if let (Some(bid), Some(ask)) = (book.highest_bid, book.lowest_ask) {
        if ask <= bid {
            return Err(ValidationError::CrossedAtRest { bid, ask });
        }
    }

    Ok(())
}

/// Validates one subtree against `(low, high)` open bounds, returning its
/// height on success so the caller can check its own balance factor.
fn validate_subtree(
    tree: &AvlTree,
    orders: &OrderPool,
    node: PoolIndex,
    low: Option<Price>,
    high: Option<Price>,
    side: &'static str,
    seen: &mut HashSet<Price>,
) -> Result<i32, ValidationError> {
    if node.is_null() {
        return Ok(0);
    }
    let level = tree.level(node);

    if !seen.insert(level.price) {
        return Err(ValidationError::DuplicatePrice { side, price: level.price });
    }
    if low.is_some_and(|lo| level.price <= lo) || high.is_some_and(|hi| level.price >= hi) {
        return Err(ValidationError::BstOrderViolation { side, price: level.price });
    }

    if !level.left.is_null() && tree.level(level.left).parent != node {
        return Err(ValidationError::BadParentPointer { side, price: tree.level(level.left).price });
    }
    if !level.right.is_null() && tree.level(level.right).parent != node {
        return Err(ValidationError::BadParentPointer { side, price: tree.level(level.right).price });
    }

    let left_height = validate_subtree(tree, orders, level.left, low, Some(level.price), side, seen)?;
    let right_height = validate_subtree(tree, orders, level.right, Some(level.price), high, side, seen)?;

    if (left_height - right_height).abs() > 1 {
        return Err(ValidationError::Unbalanced { side, price: level.price });
    }
    let expected_height = 1 + left_height.max(right_height);
    if level.height != expected_height {
        return Err(ValidationError::StaleHeight { side, price: level.price });
    }

    let (fifo_len, fifo_sum) = walk_fifo(orders, level.head);
    if fifo_len != level.size {
        return Err(ValidationError::SizeMismatch {
            side,
            price: level.price,
            size: level.size,
            fifo_len,
        });
    }
    if fifo_sum != level.total_volume {
        return Err(ValidationError::VolumeMismatch {
            side,
            price: level.price,
            total_volume: level.total_volume,
            fifo_sum,
        });
    }

    Ok(expected_height)
}

fn walk_fifo(orders: &OrderPool, head: PoolIndex) -> (u32, u64) {
    let mut count = 0u32;
    let mut sum = 0u64;
    let mut cur = head;
    while !cur.is_null() {
        let order = orders
            .get_by_index(cur.get())
            .expect("fifo order index must be valid while resting");
        count += 1;
        sum += order.shares as u64;
        cur = order.next;
    }
    (count, sum)
}

/// Highest price with a non-empty FIFO, independent of the cached
/// `highest_bid` — checks the bid side's inside quote is not stale.
fn highest_non_empty(tree: &AvlTree, node: PoolIndex) -> Option<Price> {
    if node.is_null() {
        return None;
    }
    let level = tree.level(node);
    if let Some(price) = highest_non_empty(tree, level.right) {
        return Some(price);
    }
    if !level.is_empty() {
        return Some(level.price);
    }
    highest_non_empty(tree, level.left)
}

/// Lowest price with a non-empty FIFO, independent of the cached
/// `lowest_ask` — checks the ask side's inside quote is not stale.
fn lowest_non_empty(tree: &AvlTree, node: PoolIndex) -> Option<Price> {
    if node.is_null() {
        return None;
    }
    let level = tree.level(node);
    if let Some(price) = lowest_non_empty(tree, level.left) {
        return Some(price);
    }
    if !level.is_empty() {
        return Some(level.price);
    }
    lowest_non_empty(tree, level.right)
}
