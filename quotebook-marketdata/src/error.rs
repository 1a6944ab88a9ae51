//! Error types for market data processing.

use quotebook_core::{PriceKey, Quantity, Side};
use thiserror::Error;

/// Rejected price level in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("non-positive quantity {quantity} at {side} {price}")]
pub struct LevelError {
    /// Side the level belongs to.
    pub side: Side,
    /// Price key of the level.
    pub price: PriceKey,
    /// Offending quantity.
    pub quantity: Quantity,
}

/// Error type for market data operations.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Message referenced an instrument that was never registered.
    ///
    /// Instruments are fixed at startup, so this is a configuration error.
    #[error("unregistered instrument: {instrument}")]
    UnregisteredInstrument {
        /// Instrument identifier.
        instrument: String,
    },

    /// Instrument was registered more than once.
    #[error("instrument registered twice: {instrument}")]
    DuplicateInstrument {
        /// Instrument identifier.
        instrument: String,
    },

    /// Snapshot contained a level with a non-positive quantity.
    #[error("malformed snapshot for {instrument}: {source}")]
    MalformedSnapshot {
        /// Instrument identifier.
        instrument: String,
        /// Offending level.
        source: LevelError,
    },

    /// Incremental update arrived before the first snapshot.
    #[error("update for {instrument} before its first snapshot")]
    NotPopulated {
        /// Instrument identifier.
        instrument: String,
    },

    /// Price or size could not be converted.
    #[error("invalid input for {instrument}: {source}")]
    InvalidInput {
        /// Instrument identifier.
        instrument: String,
        /// Conversion error.
        source: quotebook_core::Error,
    },

    /// Instrumentation could not be set up.
    #[error("instrumentation error: {message}")]
    Instrumentation {
        /// Error message.
        message: String,
    },
}

impl MarketDataError {
    /// Returns true for configuration errors, which must halt processing.
    ///
    /// Every other error rejects a single message and leaves the handler
    /// usable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredInstrument { .. } | Self::DuplicateInstrument { .. }
        )
    }

    /// Returns the instrument the error refers to, if any.
    #[must_use]
    pub fn instrument(&self) -> Option<&str> {
        match self {
            Self::UnregisteredInstrument { instrument }
            | Self::DuplicateInstrument { instrument }
            | Self::MalformedSnapshot { instrument, .. }
            | Self::NotPopulated { instrument }
            | Self::InvalidInput { instrument, .. } => Some(instrument),
            Self::Instrumentation { .. } => None,
        }
    }
}

/// Result type alias for market data operations.
pub type Result<T> = std::result::Result<T, MarketDataError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook_core::Precision;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fatal_classification() {
        let err = MarketDataError::UnregisteredInstrument {
            instrument: "X-Y".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.instrument(), Some("X-Y"));

        let err = MarketDataError::NotPopulated {
            instrument: "X-Y".to_string(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_malformed_snapshot_display() {
        let price = Precision::new(2).unwrap().key("10").unwrap();
        let err = MarketDataError::MalformedSnapshot {
            instrument: "X-Y".to_string(),
            source: LevelError {
                side: Side::Bid,
                price,
                quantity: dec!(0),
            },
        };
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "malformed snapshot for X-Y: non-positive quantity 0 at bid 10.00"
        );
    }
}
