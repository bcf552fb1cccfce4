// Core type definitions for the trading system

// Type aliases
pub type OrderId = u64;
pub type Price = i64; // Fixed-point ticks (see orderbook's PRICE_SCALE)
pub type Qty = u32;

// Invalid/sentinel constants
pub const INVALID_ORDER_ID: OrderId = 0;
pub const INVALID_PRICE: Price = i64::MAX;
pub const INVALID_QTY: Qty = u32::MAX;

/// Represents the side of an order (buy or sell)
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy = 1,
    Sell = -1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Returns the side as a sign value (1 for Buy, -1 for Sell)
    #[inline]
    pub fn as_sign(&self) -> i64 {
        *self as i64
    }

    /// True for the bid side (`Buy`).
    #[inline]
    pub fn is_bid(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl From<bool> for Side {
    /// `true` maps to the bid side, `false` to the ask side.
    #[inline]
    fn from(is_bid: bool) -> Self {
        if is_bid { Side::Buy } else { Side::Sell }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_as_sign() {
        assert_eq!(Side::Buy.as_sign(), 1);
        assert_eq!(Side::Sell.as_sign(), -1);
    }

    #[test]
    fn test_side_is_bid_and_from_bool() {
        assert!(Side::Buy.is_bid());
        assert!(!Side::Sell.is_bid());
        assert_eq!(Side::from(true), Side::Buy);
        assert_eq!(Side::from(false), Side::Sell);
    }

    #[test]
    fn test_invalid_constants() {
        assert_eq!(INVALID_ORDER_ID, 0);
        assert_eq!(INVALID_PRICE, i64::MAX);
        assert_eq!(INVALID_QTY, u32::MAX);
    }
}
