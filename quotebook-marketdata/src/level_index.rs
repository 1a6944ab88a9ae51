//! Ordered price level index for one side of a book.

use crate::error::LevelError;
use quotebook_core::{PriceKey, Quantity, Side};
use serde::Serialize;
use std::collections::BTreeMap;

/// Price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceLevel {
    /// Fixed-precision price.
    pub price: PriceKey,
    /// Total resting quantity at this level.
    pub quantity: Quantity,
}

impl PriceLevel {
    /// Creates a new price level.
    #[must_use]
    pub const fn new(price: PriceKey, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// Price levels of one book side, keyed by exact price.
///
/// Levels are kept in a `BTreeMap`, so the best level is read from the
/// appropriate end of the map in logarithmic time. Only strictly positive
/// quantities are stored.
#[derive(Debug, Clone)]
pub struct PriceLevelIndex {
    levels: BTreeMap<PriceKey, Quantity>,
    side: Side,
}

impl PriceLevelIndex {
    /// Creates an empty index for the given side.
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            levels: BTreeMap::new(),
            side,
        }
    }

    /// Returns the side this index holds.
    #[inline]
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Inserts a level or replaces the quantity of an existing one.
    ///
    /// A zero quantity removes the level instead of storing it.
    #[inline]
    pub fn upsert(&mut self, price: PriceKey, quantity: Quantity) {
        debug_assert!(!quantity.is_sign_negative() || quantity.is_zero());
        if quantity.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels.insert(price, quantity);
        }
    }

    /// Removes a level.
    ///
    /// Removing a price that is not present is a no-op; the return value
    /// only reports whether a level existed.
    #[inline]
    pub fn remove(&mut self, price: &PriceKey) -> bool {
        self.levels.remove(price).is_some()
    }

    /// Returns the best level: highest price for bids, lowest for asks.
    #[inline]
    #[must_use]
    pub fn best(&self) -> Option<PriceLevel> {
        let entry = match self.side {
            Side::Bid => self.levels.iter().next_back(),
            Side::Ask => self.levels.iter().next(),
        };
        entry.map(|(price, quantity)| PriceLevel::new(*price, *quantity))
    }

    /// Replaces every level with the given set.
    ///
    /// The input is checked before anything is discarded, so a rejected set
    /// leaves the index untouched. When a price appears more than once, the
    /// last occurrence wins.
    ///
    /// # Errors
    /// Returns [`LevelError`] for the first level with a non-positive quantity.
    pub fn replace_all<I>(&mut self, levels: I) -> Result<(), LevelError>
    where
        I: IntoIterator<Item = PriceLevel>,
    {
        let mut replacement = BTreeMap::new();
        for level in levels {
            self.check(&level)?;
            replacement.insert(level.price, level.quantity);
        }
        self.levels = replacement;
        Ok(())
    }

    /// Checks that a level may be stored on this side.
    ///
    /// # Errors
    /// Returns [`LevelError`] if the quantity is zero or negative.
    pub fn check(&self, level: &PriceLevel) -> Result<(), LevelError> {
        if level.quantity.is_zero() || level.quantity.is_sign_negative() {
            return Err(LevelError {
                side: self.side,
                price: level.price,
                quantity: level.quantity,
            });
        }
        Ok(())
    }

    /// Returns the quantity resting at a specific price.
    #[must_use]
    pub fn get(&self, price: &PriceKey) -> Option<Quantity> {
        self.levels.get(price).copied()
    }

    /// Clears all levels.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Returns the number of price levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if there are no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterates over all levels, best first.
    pub fn iter(&self) -> Box<dyn Iterator<Item = PriceLevel> + '_> {
        let levels = self
            .levels
            .iter()
            .map(|(price, quantity)| PriceLevel::new(*price, *quantity));
        match self.side {
            Side::Bid => Box::new(levels.rev()),
            Side::Ask => Box::new(levels),
        }
    }
}
