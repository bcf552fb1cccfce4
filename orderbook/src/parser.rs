// Turns one text line into a typed `Event` (spec.md §6's grammar, [ADD 4.8]
// — component C6). Any malformed input becomes a `ParseError`; the core
// never has to reject a value the parser could have caught at its own
// boundary.

use common::{Price, Qty};

use crate::error::ParseError;

/// Ticks per unit price (spec.md representation decision, [ADD 3]):
/// `price` fields in the event grammar are decimal literals (`100.0`,
/// `50`), converted to integer ticks by multiplying by this scale.
pub const PRICE_SCALE: f64 = 10_000.0;

/// A parsed event, ready to apply to a `Book` (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Add {
        timestamp: u64,
        uid: Box<str>,
        is_bid: bool,
        price: Price,
        shares: Qty,
    },
    Reduce {
        timestamp: u64,
        uid: Box<str>,
        shares: Qty,
    },
}

/// Parses one line of the event grammar:
///
/// ```text
/// <ts> A <uid> <B|S> <price> <shares>
/// <ts> R <uid> <shares>
/// ```
///
/// `line` is the 1-based line number, used only for error reporting.
pub fn parse_line(line: usize, text: &str) -> Result<Event, ParseError> {
    let mut fields = text.split_whitespace();

    let ts_field = fields.next().ok_or(ParseError::EmptyLine { line })?;
    let timestamp = ts_field
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidField {
            line,
            field: "timestamp",
            value: ts_field.to_string(),
        })?;

    let op = fields.next().ok_or(ParseError::MissingField { line, field: "op" })?;

    match op {
        "A" => {
            let uid = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "uid" })?;
            let side_field = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "side" })?;
            let is_bid = match side_field {
                "B" => true,
                "S" => false,
                other => {
                    return Err(ParseError::InvalidField {
                        line,
                        field: "side",
                        value: other.to_string(),
                    })
                }
            };
            let price_field = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "price" })?;
            let price = parse_price(line, price_field)?;
            let shares_field = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "shares" })?;
            let shares = parse_shares(line, shares_field)?;
            if shares == 0 {
                return Err(ParseError::InvalidField {
                    line,
                    field: "shares",
                    value: shares_field.to_string(),
                });
            }

            Ok(Event::Add {
                timestamp,
                uid: uid.into(),
                is_bid,
                price,
                shares,
            })
        }
        "R" => {
            let uid = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "uid" })?;
            let shares_field = fields
                .next()
                .ok_or(ParseError::MissingField { line, field: "shares" })?;
            let shares = parse_shares(line, shares_field)?;
            if shares == 0 {
                return Err(ParseError::InvalidField {
                    line,
                    field: "shares",
                    value: shares_field.to_string(),
                });
            }

            Ok(Event::Reduce {
                timestamp,
                uid: uid.into(),
                shares,
            })
        }
        other => Err(ParseError::UnknownOp {
            line,
            op: other.to_string(),
        }),
    }
}

fn parse_price(line: usize, field: &str) -> Result<Price, ParseError> {
    let raw: f64 = field.parse().map_err(|_| ParseError::InvalidField {
        line,
        field: "price",
        value: field.to_string(),
    })?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(ParseError::InvalidField {
            line,
            field: "price",
            value: field.to_string(),
        });
    }
    Ok((raw * PRICE_SCALE).round() as Price)
}

fn parse_shares(line: usize, field: &str) -> Result<Qty, ParseError> {
    field.parse::<Qty>().map_err(|_| ParseError::InvalidField {
        line,
        field: "shares",
        value: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_line() {
        let event = parse_line(1, "10000 A order1 B 100.25 500").unwrap();
        assert_eq!(
            event,
            Event::Add {
                timestamp: 10000,
                uid: "order1".into(),
                is_bid: true,
                price: 1_002_500,
                shares: 500,
            }
        );
    }

    #[test]
    fn parses_reduce_line() {
        let event = parse_line(2, "10050 R order1 200").unwrap();
        assert_eq!(
            event,
            Event::Reduce {
                timestamp: 10050,
                uid: "order1".into(),
                shares: 200,
            }
        );
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        let event = parse_line(1, "  10000   A  order1   S   99   10  ").unwrap();
        assert_eq!(
            event,
            Event::Add {
                timestamp: 10000,
                uid: "order1".into(),
                is_bid: false,
                price: 990_000,
                shares: 10,
            }
        );
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(parse_line(3, "   "), Err(ParseError::EmptyLine { line: 3 }));
    }

    #[test]
    fn rejects_unknown_op() {
        assert_eq!(
            parse_line(4, "1 X order1 B 1 1"),
            Err(ParseError::UnknownOp {
                line: 4,
                op: "X".to_string(),
            })
        );
    }

    #[test]
    fn rejects_missing_field() {
        assert_eq!(
            parse_line(5, "1 A order1 B 100.0"),
            Err(ParseError::MissingField { line: 5, field: "shares" })
        );
    }

    #[test]
    fn rejects_zero_shares_on_add_and_reduce() {
        assert!(matches!(
            parse_line(6, "1 A order1 B 100.0 0"),
            Err(ParseError::InvalidField { field: "shares", .. })
        ));
        assert!(matches!(
            parse_line(7, "1 R order1 0"),
            Err(ParseError::InvalidField { field: "shares", .. })
        ));
    }

    #[test]
    fn rejects_invalid_side() {
        assert!(matches!(
            parse_line(8, "1 A order1 Q 100.0 10"),
            Err(ParseError::InvalidField { field: "side", .. })
        ));
    }
}
