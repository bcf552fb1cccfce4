// Error taxonomy for the book and its event parser (spec.md §7).
//
// The core distinguishes caller contract violations (typed `Err`, plus a
// debug-time `debug_assert!`) from ordinary race artifacts (the silent
// no-op reduce on an unknown uid, which is not an error at all and so has
// no variant here).

use common::OrderId;

/// A malformed event line (spec.md §6's grammar).
///
/// Parse errors never reach the book — the harness surfaces them to the
/// caller and stops (spec.md §7).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: empty")]
    EmptyLine { line: usize },

    #[error("line {line}: unknown operation {op:?}")]
    UnknownOp { line: usize, op: String },

    #[error("line {line}: missing field {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// A caller contract violation on the book's programmatic surface
/// (spec.md §4.4/§7).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookError {
    #[error("order {uid} is already resting")]
    DuplicateUid { uid: OrderId },

    #[error("shares must be greater than zero")]
    ZeroShares,

    #[error("order arena exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("order {uid} not found")]
    UnknownUid { uid: OrderId },
}

/// An AVL/FIFO invariant violation caught by the debug validator (spec.md §8).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{side} side: duplicate price {price} in tree")]
    DuplicatePrice { side: &'static str, price: i64 },

    #[error("{side} side: price {price} violates BST ordering")]
    BstOrderViolation { side: &'static str, price: i64 },

    #[error("{side} side: level {price} balance factor out of range")]
    Unbalanced { side: &'static str, price: i64 },

    #[error("{side} side: level {price} has stale height")]
    StaleHeight { side: &'static str, price: i64 },

    #[error("{side} side: level {price} has inconsistent parent pointer")]
    BadParentPointer { side: &'static str, price: i64 },

    #[error("{side} side: level {price} size {size} does not match FIFO length {fifo_len}")]
    SizeMismatch {
        side: &'static str,
        price: i64,
        size: u32,
        fifo_len: u32,
    },

    #[error("{side} side: level {price} total_volume {total_volume} does not match FIFO sum {fifo_sum}")]
    VolumeMismatch {
        side: &'static str,
        price: i64,
        total_volume: u64,
        fifo_sum: u64,
    },

    #[error("{side} side: cached best price {cached:?} does not match recomputed best {actual:?}")]
    StaleInsideQuote {
        side: &'static str,
        cached: Option<i64>,
        actual: Option<i64>,
    },

    #[error("bid {bid} crosses ask {ask} at rest")]
    CrossedAtRest { bid: i64, ask: i64 },
}
