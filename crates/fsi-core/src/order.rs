//! Discretization order levels.

use core::fmt;

use crate::CoreError;

/// Polynomial order of a discretization space.
///
/// The set is closed: piecewise-constant, linear and quadratic are the only
/// orders the model builder knows how to wire together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u8"))]
pub enum OrderLevel {
    Const = 0,
    Lin = 1,
    Quad = 2,
}

impl OrderLevel {
    pub const ALL: [OrderLevel; 3] = [OrderLevel::Const, OrderLevel::Lin, OrderLevel::Quad];

    /// Numeric polynomial order.
    pub fn degree(self) -> u8 {
        self as u8
    }

    /// Short label used in topology and basis names.
    pub fn label(self) -> &'static str {
        match self {
            OrderLevel::Const => "const",
            OrderLevel::Lin => "lin",
            OrderLevel::Quad => "quad",
        }
    }

    /// Parse an order level from a map key such as `"1"`.
    pub fn parse_key(key: &str) -> Option<OrderLevel> {
        key.trim()
            .parse::<u64>()
            .ok()
            .and_then(|v| OrderLevel::try_from(v).ok())
    }
}

impl TryFrom<u64> for OrderLevel {
    type Error = CoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderLevel::Const),
            1 => Ok(OrderLevel::Lin),
            2 => Ok(OrderLevel::Quad),
            other => Err(CoreError::OrderOutOfRange { value: other }),
        }
    }
}

impl From<OrderLevel> for u8 {
    fn from(order: OrderLevel) -> Self {
        order.degree()
    }
}

impl fmt::Display for OrderLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degree())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_orders() {
        assert_eq!(OrderLevel::Const.label(), "const");
        assert_eq!(OrderLevel::Lin.label(), "lin");
        assert_eq!(OrderLevel::Quad.label(), "quad");
    }

    #[test]
    fn parse_keys() {
        assert_eq!(OrderLevel::parse_key("0"), Some(OrderLevel::Const));
        assert_eq!(OrderLevel::parse_key("2"), Some(OrderLevel::Quad));
        assert_eq!(OrderLevel::parse_key("3"), None);
        assert_eq!(OrderLevel::parse_key("-1"), None);
        assert_eq!(OrderLevel::parse_key("lin"), None);
    }

    #[test]
    fn out_of_range_is_an_error() {
        assert_eq!(
            OrderLevel::try_from(7),
            Err(CoreError::OrderOutOfRange { value: 7 })
        );
    }
}
