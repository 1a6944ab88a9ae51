//! Error types for feed decoding and catalog resolution.

use quotebook_marketdata::MarketDataError;
use thiserror::Error;

/// Error type for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Message or catalog payload was not valid JSON for its shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field could not be converted.
    #[error("invalid field: {0}")]
    Input(#[from] quotebook_core::Error),

    /// Book processing failed.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Configured instrument is missing from the product catalog.
    #[error("instrument not found in catalog: {instrument}")]
    MissingInstrument {
        /// Instrument identifier.
        instrument: String,
    },

    /// IO error while reading a catalog or feed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Returns true for errors that must halt processing.
    ///
    /// Configuration errors and IO failures are fatal; a single bad message
    /// is not.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MissingInstrument { .. } | Self::Io(_) => true,
            Self::MarketData(e) => e.is_fatal(),
            Self::Decode(_) | Self::Input(_) => false,
        }
    }
}

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let err = FeedError::MissingInstrument {
            instrument: "BTC-EUR".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "instrument not found in catalog: BTC-EUR");

        let err = FeedError::from(MarketDataError::UnregisteredInstrument {
            instrument: "BTC-EUR".to_string(),
        });
        assert!(err.is_fatal());

        let err = FeedError::from(MarketDataError::NotPopulated {
            instrument: "BTC-EUR".to_string(),
        });
        assert!(!err.is_fatal());

        let err = FeedError::from(quotebook_core::Error::InvalidSide {
            side: "hold".to_string(),
        });
        assert!(!err.is_fatal());
    }
}
