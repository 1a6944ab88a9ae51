//! Instrument definitions and registration.

use crate::error::{MarketDataError, Result};
use quotebook_core::Precision;
use std::collections::HashMap;

/// Instrument definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Unique instrument identifier, e.g. `"BTC-EUR"`.
    pub id: String,
    /// Price precision, fixed for the instrument's lifetime.
    pub precision: Precision,
}

impl Instrument {
    /// Creates a new instrument definition.
    #[must_use]
    pub fn new(id: impl Into<String>, precision: Precision) -> Self {
        Self {
            id: id.into(),
            precision,
        }
    }

    /// Creates a new instrument definition from a number of decimal places.
    ///
    /// # Errors
    /// Returns an error if `decimal_places` is out of range.
    pub fn with_decimal_places(
        id: impl Into<String>,
        decimal_places: u32,
    ) -> quotebook_core::Result<Self> {
        Ok(Self::new(id, Precision::new(decimal_places)?))
    }
}

/// Registry of the instruments known at startup.
#[derive(Debug, Default, Clone)]
pub struct InstrumentRegistry {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instrument.
    ///
    /// # Errors
    /// Returns [`MarketDataError::DuplicateInstrument`] if the identifier is
    /// already registered.
    pub fn add(&mut self, instrument: Instrument) -> Result<()> {
        if self.instruments.contains_key(&instrument.id) {
            return Err(MarketDataError::DuplicateInstrument {
                instrument: instrument.id,
            });
        }
        self.instruments.insert(instrument.id.clone(), instrument);
        Ok(())
    }

    /// Gets an instrument by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.instruments.get(id)
    }

    /// Gets an instrument, treating an unknown identifier as a configuration
    /// error.
    ///
    /// # Errors
    /// Returns [`MarketDataError::UnregisteredInstrument`] if not registered.
    pub fn require(&self, id: &str) -> Result<&Instrument> {
        self.get(id)
            .ok_or_else(|| MarketDataError::UnregisteredInstrument {
                instrument: id.to_string(),
            })
    }

    /// Returns all instrument identifiers, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.instruments.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if there are no instruments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_add_and_get() {
        let mut registry = InstrumentRegistry::new();
        registry
            .add(Instrument::with_decimal_places("BTC-EUR", 2).unwrap())
            .unwrap();
        registry
            .add(Instrument::with_decimal_places("ETH-BTC", 5).unwrap())
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("ETH-BTC").unwrap().precision.decimal_places(),
            5
        );
        assert_eq!(registry.ids(), vec!["BTC-EUR", "ETH-BTC"]);
    }

    #[test]
    fn test_registry_rejects_duplicate() {
        let mut registry = InstrumentRegistry::new();
        registry
            .add(Instrument::with_decimal_places("BTC-EUR", 2).unwrap())
            .unwrap();
        let err = registry
            .add(Instrument::with_decimal_places("BTC-EUR", 3).unwrap())
            .unwrap_err();
        assert!(matches!(err, MarketDataError::DuplicateInstrument { .. }));
        assert_eq!(
            registry.get("BTC-EUR").unwrap().precision.decimal_places(),
            2
        );
    }

    #[test]
    fn test_registry_require_unknown() {
        let registry = InstrumentRegistry::new();
        let err = registry.require("NOPE").unwrap_err();
        assert!(err.is_fatal());
        assert!(registry.get("NOPE").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_instrument_precision_out_of_range() {
        assert!(Instrument::with_decimal_places("X-Y", 40).is_err());
    }
}
