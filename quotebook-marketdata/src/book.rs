//! Order book management.

use crate::bbo::Bbo;
use crate::error::{MarketDataError, Result};
use crate::level_index::{PriceLevel, PriceLevelIndex};
use quotebook_core::{DecimalInput, Precision, PriceKey, Quantity, RawDecimal, Side};

/// Raw `(price, size)` pair as received in a snapshot.
pub type RawLevel = (RawDecimal, RawDecimal);

/// Full order book for an instrument.
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument_id: String,
    precision: Precision,
    /// Bid side.
    bids: PriceLevelIndex,
    /// Ask side.
    asks: PriceLevelIndex,
}

impl OrderBook {
    /// Creates an empty order book for the given instrument.
    #[must_use]
    pub fn new(instrument_id: impl Into<String>, precision: Precision) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            precision,
            bids: PriceLevelIndex::new(Side::Bid),
            asks: PriceLevelIndex::new(Side::Ask),
        }
    }

    /// Returns the instrument identifier.
    #[must_use]
    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Returns the price precision of this book.
    #[must_use]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Returns the bid side.
    #[must_use]
    pub fn bids(&self) -> &PriceLevelIndex {
        &self.bids
    }

    /// Returns the ask side.
    #[must_use]
    pub fn asks(&self) -> &PriceLevelIndex {
        &self.asks
    }

    /// Returns one side of the book.
    #[must_use]
    pub fn side(&self, side: Side) -> &PriceLevelIndex {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Applies a snapshot, replacing the entire book.
    ///
    /// Both sides are converted and checked before either is replaced, so a
    /// rejected snapshot leaves the previous book intact.
    ///
    /// # Errors
    /// Returns [`MarketDataError::InvalidInput`] for unparseable prices or
    /// sizes and [`MarketDataError::MalformedSnapshot`] for levels with a
    /// non-positive size.
    pub fn apply_snapshot(&mut self, bids: &[RawLevel], asks: &[RawLevel]) -> Result<()> {
        let bid_levels = self.snapshot_levels(Side::Bid, bids)?;
        let ask_levels = self.snapshot_levels(Side::Ask, asks)?;

        self.bids
            .replace_all(bid_levels)
            .map_err(|source| self.malformed(source))?;
        self.asks
            .replace_all(ask_levels)
            .map_err(|source| self.malformed(source))?;
        Ok(())
    }

    fn snapshot_levels(&self, side: Side, levels: &[RawLevel]) -> Result<Vec<PriceLevel>> {
        let index = self.side(side);
        levels
            .iter()
            .map(|(price, size)| -> Result<PriceLevel> {
                let level = PriceLevel::new(
                    self.price_key(price)?,
                    size.as_input()
                        .to_decimal()
                        .map_err(|source| self.invalid(source))?,
                );
                index.check(&level).map_err(|source| self.malformed(source))?;
                Ok(level)
            })
            .collect()
    }

    /// Applies a single incremental level change.
    ///
    /// A zero size removes the level, whether or not it exists; any other
    /// size inserts or replaces it.
    ///
    /// # Errors
    /// Returns [`MarketDataError::InvalidInput`] for unparseable input or a
    /// negative size. The book is unchanged on error.
    pub fn apply_update<'a>(
        &mut self,
        side: Side,
        price: impl Into<DecimalInput<'a>>,
        size: impl Into<DecimalInput<'a>>,
    ) -> Result<()> {
        let (price, quantity) = self.resolve(price, size)?;
        self.apply_level(side, price, quantity);
        Ok(())
    }

    /// Converts a raw change into a price key and quantity without touching
    /// the book.
    ///
    /// # Errors
    /// Returns [`MarketDataError::InvalidInput`] for unparseable input or a
    /// negative size.
    pub fn resolve<'a>(
        &self,
        price: impl Into<DecimalInput<'a>>,
        size: impl Into<DecimalInput<'a>>,
    ) -> Result<(PriceKey, Quantity)> {
        let price = self.price_key(price)?;
        let quantity =
            quotebook_core::parse_quantity(size).map_err(|source| self.invalid(source))?;
        Ok((price, quantity))
    }

    /// Applies an already-resolved change.
    #[inline]
    pub fn apply_level(&mut self, side: Side, price: PriceKey, quantity: Quantity) {
        let index = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        if quantity.is_zero() {
            index.remove(&price);
        } else {
            index.upsert(price, quantity);
        }
    }

    /// Returns the best bid and offer, or `None` if either side is empty.
    #[must_use]
    pub fn best_of_book(&self) -> Option<Bbo> {
        let bid = self.bids.best()?;
        let ask = self.asks.best()?;
        Some(Bbo::new(bid, ask))
    }

    /// Returns true if neither side has any level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Clears the entire book.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    fn price_key<'a>(&self, price: impl Into<DecimalInput<'a>>) -> Result<PriceKey> {
        self.precision
            .key(price)
            .map_err(|source| self.invalid(source))
    }

    fn invalid(&self, source: quotebook_core::Error) -> MarketDataError {
        MarketDataError::InvalidInput {
            instrument: self.instrument_id.clone(),
            source,
        }
    }

    fn malformed(&self, source: crate::error::LevelError) -> MarketDataError {
        MarketDataError::MalformedSnapshot {
            instrument: self.instrument_id.clone(),
            source,
        }
    }
}

/// Single price level change within an incremental update.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelChange {
    /// Side (bid or ask).
    pub side: Side,
    /// Raw price.
    pub price: RawDecimal,
    /// Raw size (0 = delete level).
    pub size: RawDecimal,
}

impl LevelChange {
    /// Creates a new level change.
    #[must_use]
    pub fn new(side: Side, price: impl Into<RawDecimal>, size: impl Into<RawDecimal>) -> Self {
        Self {
            side,
            price: price.into(),
            size: size.into(),
        }
    }
}

/// Incremental book update carrying one or more ordered level changes.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Changes, applied strictly in order.
    pub changes: Vec<LevelChange>,
}

/// Book snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSnapshot {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Bid levels.
    pub bids: Vec<RawLevel>,
    /// Ask levels.
    pub asks: Vec<RawLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(price: &str, size: &str) -> RawLevel {
        (price.into(), size.into())
    }

    fn book() -> OrderBook {
        OrderBook::new("X-Y", Precision::new(2).unwrap())
    }

    fn key(price: &str) -> PriceKey {
        Precision::new(2).unwrap().key(price).unwrap()
    }

    #[test]
    fn test_snapshot_populates_both_sides() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5")], &[raw("10.05", "3")])
            .unwrap();

        let bbo = book.best_of_book().unwrap();
        assert_eq!(bbo.bid_price, key("10.00"));
        assert_eq!(bbo.bid_size, dec!(5));
        assert_eq!(bbo.ask_price, key("10.05"));
        assert_eq!(bbo.ask_size, dec!(3));
    }

    #[test]
    fn test_snapshot_replaces_never_merges() {
        let mut book = book();
        book.apply_snapshot(
            &[raw("10.00", "5"), raw("9.99", "1")],
            &[raw("10.05", "3"), raw("10.06", "2")],
        )
        .unwrap();
        book.apply_update(Side::Bid, "9.98", "7").unwrap();

        book.apply_snapshot(&[raw("8.00", "1")], &[raw("12.00", "2")])
            .unwrap();

        let bids: Vec<_> = book.bids().iter().collect();
        let asks: Vec<_> = book.asks().iter().collect();
        assert_eq!(bids, vec![PriceLevel::new(key("8.00"), dec!(1))]);
        assert_eq!(asks, vec![PriceLevel::new(key("12.00"), dec!(2))]);
    }

    #[test]
    fn test_snapshot_keys_use_precision() {
        let mut book = book();
        book.apply_snapshot(&[raw("1.2300000001", "1"), raw("1.23", "2")], &[])
            .unwrap();
        assert_eq!(book.bids().len(), 1);
        assert_eq!(book.bids().get(&key("1.23")), Some(dec!(2)));
    }

    #[test]
    fn test_malformed_snapshot_keeps_previous_book() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5")], &[raw("10.05", "3")])
            .unwrap();

        // Valid bids, bad ask: neither side may change
        let err = book
            .apply_snapshot(&[raw("9.00", "1")], &[raw("10.10", "0")])
            .unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedSnapshot { .. }));
        assert!(!err.is_fatal());

        let bbo = book.best_of_book().unwrap();
        assert_eq!(bbo.bid_price, key("10.00"));
        assert_eq!(bbo.ask_price, key("10.05"));
    }

    #[test]
    fn test_snapshot_negative_size_is_malformed() {
        let mut book = book();
        let err = book
            .apply_snapshot(&[raw("9.00", "-2")], &[])
            .unwrap_err();
        match err {
            MarketDataError::MalformedSnapshot { instrument, source } => {
                assert_eq!(instrument, "X-Y");
                assert_eq!(source.side, Side::Bid);
                assert_eq!(source.quantity, dec!(-2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_unparseable_price() {
        let mut book = book();
        let err = book
            .apply_snapshot(&[raw("nine", "1")], &[])
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidInput { .. }));
        assert!(book.is_empty());
    }

    #[test]
    fn test_zero_size_update_removes() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5"), raw("9.99", "1")], &[])
            .unwrap();

        book.apply_update(Side::Bid, "10.00", "0").unwrap();
        assert!(book.bids().get(&key("10.00")).is_none());
        assert_eq!(book.bids().best().unwrap().price, key("9.99"));

        // Never existed: still no level, still no error
        book.apply_update(Side::Bid, "5.55", "0").unwrap();
        assert!(book.bids().get(&key("5.55")).is_none());
        assert_eq!(book.bids().len(), 1);
    }

    #[test]
    fn test_zero_size_with_float_noise_removes() {
        let mut book = book();
        book.apply_snapshot(&[], &[raw("1.23", "4")]).unwrap();
        book.apply_update(Side::Ask, 1.230_000_000_1_f64, 0.0_f64)
            .unwrap();
        assert!(book.asks().is_empty());
    }

    #[test]
    fn test_update_last_write_wins() {
        let mut book = book();
        book.apply_snapshot(&[], &[]).unwrap();
        book.apply_update(Side::Ask, "10.05", "1").unwrap();
        book.apply_update(Side::Ask, "10.05", "9").unwrap();
        assert_eq!(book.asks().get(&key("10.05")), Some(dec!(9)));
    }

    #[test]
    fn test_update_negative_size_rejected() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5")], &[]).unwrap();
        let err = book.apply_update(Side::Bid, "10.00", "-1").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidInput { .. }));
        assert_eq!(book.bids().get(&key("10.00")), Some(dec!(5)));
    }

    #[test]
    fn test_one_sided_book_has_no_bbo() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5")], &[]).unwrap();
        assert!(book.best_of_book().is_none());

        book.apply_update(Side::Ask, "10.01", "1").unwrap();
        assert!(book.best_of_book().is_some());
    }

    #[test]
    fn test_clear() {
        let mut book = book();
        book.apply_snapshot(&[raw("10.00", "5")], &[raw("10.05", "3")])
            .unwrap();
        book.clear();
        assert!(book.is_empty());
        assert!(book.best_of_book().is_none());
    }
}
