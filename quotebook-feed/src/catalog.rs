//! Product catalog parsing and instrument precision resolution.
//!
//! The catalog payload is the exchange's product listing: a JSON array of
//! products, each carrying its `quote_increment` as decimal text. Fetching
//! the payload is left to the caller.

use crate::error::{FeedError, Result};
use quotebook_core::Precision;
use quotebook_marketdata::Instrument;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Catalog entry for one product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    /// Product identifier, e.g. `"BTC-EUR"`.
    pub id: String,
    /// Minimum price increment, as decimal text.
    pub quote_increment: String,
    /// Base currency.
    #[serde(default)]
    pub base_currency: Option<String>,
    /// Quote currency.
    #[serde(default)]
    pub quote_currency: Option<String>,
    /// Trading status.
    #[serde(default)]
    pub status: Option<String>,
}

impl Product {
    /// Derives the price precision from the quote increment text.
    ///
    /// # Errors
    /// Returns [`FeedError::Input`] if the increment is not a positive decimal.
    pub fn precision(&self) -> Result<Precision> {
        Ok(Precision::from_increment(&self.quote_increment)?)
    }
}

/// Product catalog keyed by product identifier.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    /// Builds a catalog from products.
    #[must_use]
    pub fn new<I>(products: I) -> Self
    where
        I: IntoIterator<Item = Product>,
    {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        }
    }

    /// Parses a product listing payload.
    ///
    /// # Errors
    /// Returns [`FeedError::Decode`] if the payload is not a product array.
    pub fn from_json(payload: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(payload)?;
        Ok(Self::new(products))
    }

    /// Reads and parses a product listing file.
    ///
    /// # Errors
    /// Returns [`FeedError::Io`] if the file cannot be read and
    /// [`FeedError::Decode`] if it is not a product array.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let payload = std::fs::read_to_string(path)?;
        Self::from_json(&payload)
    }

    /// Gets a product by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Returns the number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Resolves configured product identifiers into instrument definitions.
    ///
    /// # Errors
    /// Returns [`FeedError::MissingInstrument`] (fatal) for the first
    /// identifier absent from the catalog and [`FeedError::Input`] for an
    /// unusable quote increment.
    pub fn resolve<S: AsRef<str>>(&self, product_ids: &[S]) -> Result<Vec<Instrument>> {
        product_ids
            .iter()
            .map(|id| -> Result<Instrument> {
                let id = id.as_ref();
                let product = self.get(id).ok_or_else(|| {
                    tracing::error!(instrument = id, "Instrument not found in catalog");
                    FeedError::MissingInstrument {
                        instrument: id.to_string(),
                    }
                })?;
                let precision = product.precision()?;
                tracing::debug!(
                    "Retrieved quote increment for {}: {} = {} decimal places",
                    id,
                    product.quote_increment,
                    precision.decimal_places()
                );
                Ok(Instrument::new(id, precision))
            })
            .collect()
    }
}
