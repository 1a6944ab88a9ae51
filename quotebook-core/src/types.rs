//! Book side and quantity definitions.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Resting quantity at a price level.
///
/// Quantities are kept exactly as received; they are never rounded to the
/// instrument precision.
pub type Quantity = Decimal;

/// Order book side (bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid (buy) side.
    Bid,
    /// Ask (sell) side.
    Ask,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }

    /// Returns true for the bid side.
    #[inline]
    #[must_use]
    pub const fn is_bid(self) -> bool {
        matches!(self, Self::Bid)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => f.write_str("bid"),
            Self::Ask => f.write_str("ask"),
        }
    }
}

/// Accepts both the feed's order-side names (`buy`/`sell`) and the book
/// side names (`bid`/`ask`), case-insensitively.
impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Self::Bid),
            "sell" | "ask" | "offer" => Ok(Self::Ask),
            _ => Err(Error::InvalidSide {
                side: s.to_string(),
            }),
        }
    }
}
