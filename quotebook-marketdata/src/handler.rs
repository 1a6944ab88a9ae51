//! Market data handler routing snapshots and updates to per-instrument books.

use crate::bbo::{Bbo, BboObserver, BboTracker, NoopObserver};
use crate::book::{BookSnapshot, BookUpdate, LevelChange, OrderBook, RawLevel};
use crate::error::{MarketDataError, Result};
use crate::instrumentation::{Instrumentation, NoopInstrumentation, Operation};
use crate::instruments::{Instrument, InstrumentRegistry};
use quotebook_core::{PriceKey, Quantity, Side};
use std::collections::HashMap;
use std::time::Instant;

/// State of an instrument's book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentState {
    /// Registered, waiting for the first snapshot.
    Registered,
    /// At least one snapshot applied; updates are accepted.
    Populated,
}

/// Counters for processed messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStats {
    /// Snapshots applied.
    pub snapshots: u64,
    /// Update messages applied.
    pub updates: u64,
    /// Individual level changes applied.
    pub level_changes: u64,
    /// BBO changes published.
    pub bbo_changes: u64,
    /// Messages rejected with a non-fatal error.
    pub rejected: u64,
}

struct InstrumentBook {
    book: OrderBook,
    tracker: BboTracker,
    state: InstrumentState,
}

/// Builder for configuring and creating a [`MarketDataHandler`].
pub struct MarketDataHandlerBuilder {
    instruments: Vec<Instrument>,
    observer: Box<dyn BboObserver>,
    instrumentation: Box<dyn Instrumentation>,
}

impl MarketDataHandlerBuilder {
    /// Creates a builder with no instruments, no observer and no
    /// instrumentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            observer: Box::new(NoopObserver),
            instrumentation: Box::new(NoopInstrumentation),
        }
    }

    /// Registers an instrument.
    #[must_use]
    pub fn instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.push(instrument);
        self
    }

    /// Registers several instruments.
    #[must_use]
    pub fn instruments<I>(mut self, instruments: I) -> Self
    where
        I: IntoIterator<Item = Instrument>,
    {
        self.instruments.extend(instruments);
        self
    }

    /// Sets the observer notified on BBO changes.
    #[must_use]
    pub fn observer<O: BboObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Sets the timing hook invoked around book mutations.
    #[must_use]
    pub fn instrumentation<I: Instrumentation + 'static>(mut self, instrumentation: I) -> Self {
        self.instrumentation = Box::new(instrumentation);
        self
    }

    /// Builds the handler.
    ///
    /// # Errors
    /// Returns [`MarketDataError::DuplicateInstrument`] if an instrument was
    /// given twice.
    pub fn build(self) -> Result<MarketDataHandler> {
        let mut registry = InstrumentRegistry::new();
        let mut books = HashMap::with_capacity(self.instruments.len());

        for instrument in self.instruments {
            books.insert(
                instrument.id.clone(),
                InstrumentBook {
                    book: OrderBook::new(instrument.id.clone(), instrument.precision),
                    tracker: BboTracker::new(),
                    state: InstrumentState::Registered,
                },
            );
            registry.add(instrument)?;
        }

        tracing::debug!(instruments = ?registry.ids(), "Market data handler ready");

        Ok(MarketDataHandler {
            registry,
            books,
            observer: self.observer,
            instrumentation: self.instrumentation,
            stats: HandlerStats::default(),
        })
    }
}

impl Default for MarketDataHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Maintains the books of a fixed set of instruments and publishes BBO
/// changes.
///
/// Processing is strictly sequential: each call applies one message, then
/// recomputes the instrument's BBO and notifies the observer before
/// returning.
pub struct MarketDataHandler {
    registry: InstrumentRegistry,
    books: HashMap<String, InstrumentBook>,
    observer: Box<dyn BboObserver>,
    instrumentation: Box<dyn Instrumentation>,
    stats: HandlerStats,
}

impl MarketDataHandler {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> MarketDataHandlerBuilder {
        MarketDataHandlerBuilder::new()
    }

    /// Processes a snapshot message.
    ///
    /// # Errors
    /// See [`MarketDataHandler::apply_snapshot`].
    pub fn on_snapshot(&mut self, snapshot: &BookSnapshot) -> Result<bool> {
        self.apply_snapshot(&snapshot.instrument_id, &snapshot.bids, &snapshot.asks)
    }

    /// Replaces an instrument's book with a snapshot and publishes its BBO
    /// if it changed.
    ///
    /// A snapshot for an already populated instrument is a reset, not an
    /// error.
    ///
    /// # Returns
    /// `true` if the BBO changed and the observer was notified.
    ///
    /// # Errors
    /// Returns [`MarketDataError::UnregisteredInstrument`] (fatal) for an
    /// unknown instrument, [`MarketDataError::MalformedSnapshot`] or
    /// [`MarketDataError::InvalidInput`] for a bad snapshot. A rejected
    /// snapshot empties the book and returns the instrument to
    /// [`InstrumentState::Registered`], so updates are refused until a valid
    /// snapshot arrives. Nothing is published for the cleared book.
    pub fn apply_snapshot(
        &mut self,
        instrument_id: &str,
        bids: &[RawLevel],
        asks: &[RawLevel],
    ) -> Result<bool> {
        tracing::debug!(
            instrument = instrument_id,
            bids = bids.len(),
            asks = asks.len(),
            "Received snapshot"
        );

        let entry = Self::entry(&self.registry, &mut self.books, instrument_id)?;
        let timer = self.instrumentation.enabled().then(Instant::now);
        let applied = entry.book.apply_snapshot(bids, asks);
        if let Some(start) = timer {
            self.instrumentation
                .record(Operation::Snapshot, instrument_id, start.elapsed());
        }
        if let Err(e) = applied {
            // The upstream book was reset; the old levels are no longer valid
            entry.book.clear();
            entry.tracker.reset();
            entry.state = InstrumentState::Registered;
            return Err(self.reject(e));
        }

        entry.state = InstrumentState::Populated;
        self.stats.snapshots += 1;
        Ok(Self::publish(entry, &mut *self.observer, &mut self.stats))
    }

    /// Processes an incremental update message.
    ///
    /// Every change is validated before any is applied, then all are
    /// applied in order and the BBO is recomputed once.
    ///
    /// # Returns
    /// `true` if the BBO changed and the observer was notified.
    ///
    /// # Errors
    /// Returns [`MarketDataError::UnregisteredInstrument`] (fatal) for an
    /// unknown instrument, [`MarketDataError::NotPopulated`] before the
    /// first snapshot and [`MarketDataError::InvalidInput`] for an
    /// unparseable change. The book is unchanged on error.
    pub fn on_update(&mut self, update: &BookUpdate) -> Result<bool> {
        let instrument_id = update.instrument_id.as_str();
        let entry = Self::entry(&self.registry, &mut self.books, instrument_id)?;

        if entry.state != InstrumentState::Populated {
            return Err(self.reject(MarketDataError::NotPopulated {
                instrument: instrument_id.to_string(),
            }));
        }

        let resolved: Result<Vec<(Side, PriceKey, Quantity)>> = update
            .changes
            .iter()
            .map(|change| -> Result<(Side, PriceKey, Quantity)> {
                let (price, quantity) = entry.book.resolve(&change.price, &change.size)?;
                Ok((change.side, price, quantity))
            })
            .collect();
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.reject(e)),
        };

        let timer = self.instrumentation.enabled().then(Instant::now);
        for (side, price, quantity) in &resolved {
            entry.book.apply_level(*side, *price, *quantity);
        }
        if let Some(start) = timer {
            self.instrumentation
                .record(Operation::Update, instrument_id, start.elapsed());
        }

        self.stats.updates += 1;
        self.stats.level_changes += resolved.len() as u64;
        Ok(Self::publish(entry, &mut *self.observer, &mut self.stats))
    }

    /// Applies a single level change as its own message.
    ///
    /// # Errors
    /// See [`MarketDataHandler::on_update`].
    pub fn apply_update(
        &mut self,
        instrument_id: &str,
        side: Side,
        price: &str,
        size: &str,
    ) -> Result<bool> {
        self.on_update(&BookUpdate {
            instrument_id: instrument_id.to_string(),
            changes: vec![LevelChange::new(side, price, size)],
        })
    }

    fn entry<'a>(
        registry: &InstrumentRegistry,
        books: &'a mut HashMap<String, InstrumentBook>,
        instrument_id: &str,
    ) -> Result<&'a mut InstrumentBook> {
        let unregistered = || MarketDataError::UnregisteredInstrument {
            instrument: instrument_id.to_string(),
        };
        let instrument = registry.require(instrument_id).inspect_err(|_| {
            tracing::error!(instrument = instrument_id, "Message for unregistered instrument");
        })?;
        books.get_mut(&instrument.id).ok_or_else(unregistered)
    }

    fn publish(
        entry: &mut InstrumentBook,
        observer: &mut dyn BboObserver,
        stats: &mut HandlerStats,
    ) -> bool {
        if !entry.tracker.recompute(&entry.book, observer) {
            return false;
        }
        stats.bbo_changes += 1;
        if let Some(bbo) = entry.tracker.last() {
            tracing::info!(
                instrument = entry.book.instrument_id(),
                bid_size = %bbo.bid_size,
                bid_price = %bbo.bid_price,
                ask_size = %bbo.ask_size,
                ask_price = %bbo.ask_price,
                "BBO changed"
            );
            if bbo.is_crossed() {
                tracing::warn!(instrument = entry.book.instrument_id(), "Book is crossed");
            }
        }
        true
    }

    fn reject(&mut self, error: MarketDataError) -> MarketDataError {
        self.stats.rejected += 1;
        tracing::warn!(error = %error, "Rejected market data message");
        error
    }

    /// Gets the order book for an instrument.
    #[must_use]
    pub fn book(&self, instrument_id: &str) -> Option<&OrderBook> {
        self.books.get(instrument_id).map(|entry| &entry.book)
    }

    /// Gets the state of an instrument.
    #[must_use]
    pub fn state(&self, instrument_id: &str) -> Option<InstrumentState> {
        self.books.get(instrument_id).map(|entry| entry.state)
    }

    /// Gets the last published BBO of an instrument.
    #[must_use]
    pub fn bbo(&self, instrument_id: &str) -> Option<&Bbo> {
        self.books
            .get(instrument_id)
            .and_then(|entry| entry.tracker.last())
    }

    /// Returns the registered instruments.
    #[must_use]
    pub fn instruments(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// Returns processing counters.
    #[must_use]
    pub fn stats(&self) -> HandlerStats {
        self.stats
    }
}
