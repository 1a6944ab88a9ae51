//! Error types for quotebook core conversions.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core error type for price and quantity conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input could not be read as a decimal number.
    #[error("invalid decimal input: {input:?}")]
    InvalidDecimal {
        /// Offending input, as received.
        input: String,
    },

    /// Quantity was negative.
    #[error("negative quantity: {quantity}")]
    NegativeQuantity {
        /// Parsed quantity.
        quantity: Decimal,
    },

    /// Requested number of decimal places is not representable.
    #[error("precision out of range: {decimal_places} decimal places, max {max}")]
    PrecisionOutOfRange {
        /// Requested decimal places.
        decimal_places: u32,
        /// Maximum supported decimal places.
        max: u32,
    },

    /// Quote increment was zero, negative or unparseable.
    #[error("invalid quote increment: {increment:?}")]
    InvalidIncrement {
        /// Increment text as received.
        increment: String,
    },

    /// Price cannot be held at the instrument's precision.
    #[error("price {price} cannot be represented with {decimal_places} decimal places")]
    PriceOutOfRange {
        /// Parsed price.
        price: Decimal,
        /// Instrument decimal places.
        decimal_places: u32,
    },

    /// Unknown book side.
    #[error("invalid side: {side:?}")]
    InvalidSide {
        /// Side text as received.
        side: String,
    },
}

/// Result type alias for quotebook core operations.
pub type Result<T> = std::result::Result<T, Error>;
