//! Best bid and offer tracking.

use crate::book::OrderBook;
use crate::level_index::PriceLevel;
use crossbeam_channel::{Sender, TrySendError};
use quotebook_core::{PriceKey, Quantity};
use serde::Serialize;
use std::fmt;

/// Top of book for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bbo {
    /// Best (highest) bid price.
    pub bid_price: PriceKey,
    /// Quantity at the best bid.
    pub bid_size: Quantity,
    /// Best (lowest) ask price.
    pub ask_price: PriceKey,
    /// Quantity at the best ask.
    pub ask_size: Quantity,
}

impl Bbo {
    /// Builds a BBO from the best level of each side.
    #[must_use]
    pub fn new(bid: PriceLevel, ask: PriceLevel) -> Self {
        Self {
            bid_price: bid.price,
            bid_size: bid.quantity,
            ask_price: ask.price,
            ask_size: ask.quantity,
        }
    }

    /// Returns true if the best bid is at or above the best ask.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        self.bid_price >= self.ask_price
    }
}

impl fmt::Display for Bbo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} -- {} @ {}",
            self.bid_size, self.bid_price, self.ask_size, self.ask_price
        )
    }
}

/// Receives BBO changes.
///
/// Called synchronously on the processing thread, before the next message
/// is applied. A slow observer stalls processing.
pub trait BboObserver {
    /// Called when an instrument's BBO changes.
    ///
    /// # Arguments
    /// * `instrument_id` - Instrument whose BBO changed
    /// * `bbo` - The new BBO
    fn on_bbo(&mut self, instrument_id: &str, bbo: &Bbo);
}

impl<T: BboObserver + ?Sized> BboObserver for Box<T> {
    fn on_bbo(&mut self, instrument_id: &str, bbo: &Bbo) {
        (**self).on_bbo(instrument_id, bbo);
    }
}

/// Observer that ignores every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BboObserver for NoopObserver {
    fn on_bbo(&mut self, _instrument_id: &str, _bbo: &Bbo) {}
}

/// Wrapper to convert a closure into a [`BboObserver`].
pub struct FnObserver<F> {
    observer: F,
}

impl<F> FnObserver<F>
where
    F: FnMut(&str, &Bbo),
{
    /// Creates a new function observer.
    pub fn new(observer: F) -> Self {
        Self { observer }
    }
}

impl<F> BboObserver for FnObserver<F>
where
    F: FnMut(&str, &Bbo),
{
    fn on_bbo(&mut self, instrument_id: &str, bbo: &Bbo) {
        (self.observer)(instrument_id, bbo);
    }
}

/// BBO change as delivered over a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BboEvent {
    /// Instrument identifier.
    pub instrument_id: String,
    /// The new BBO.
    pub bbo: Bbo,
}

/// Observer that forwards changes to a channel for asynchronous delivery.
///
/// Never blocks: when the channel is full the event is dropped and counted.
pub struct ChannelObserver {
    tx: Sender<BboEvent>,
    dropped: u64,
}

impl ChannelObserver {
    /// Creates an observer sending into `tx`.
    #[must_use]
    pub fn new(tx: Sender<BboEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Returns the number of events that could not be delivered.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl BboObserver for ChannelObserver {
    fn on_bbo(&mut self, instrument_id: &str, bbo: &Bbo) {
        let event = BboEvent {
            instrument_id: instrument_id.to_string(),
            bbo: *bbo,
        };
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                tracing::warn!(
                    instrument = %event.instrument_id,
                    dropped = self.dropped,
                    "BBO channel full, dropping event"
                );
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped += 1;
                if self.dropped == 1 {
                    tracing::warn!(
                        instrument = %event.instrument_id,
                        "BBO receiver disconnected"
                    );
                }
            }
        }
    }
}

/// Last published BBO of one instrument.
#[derive(Debug, Default, Clone)]
pub struct BboTracker {
    last: Option<Bbo>,
    changes: u64,
}

impl BboTracker {
    /// Creates a tracker with no published BBO.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the BBO from `book` and publishes it if it changed.
    ///
    /// The first complete BBO is always a change. On change the stored value
    /// is replaced and `observer` is called before returning. When the book
    /// becomes one-sided the stored value is cleared without notification, so
    /// the next complete BBO is published again.
    ///
    /// # Returns
    /// `true` if the observer was notified.
    pub fn recompute(&mut self, book: &OrderBook, observer: &mut dyn BboObserver) -> bool {
        let Some(current) = book.best_of_book() else {
            self.last = None;
            return false;
        };

        if self.last == Some(current) {
            return false;
        }

        self.last = Some(current);
        self.changes += 1;
        observer.on_bbo(book.instrument_id(), &current);
        true
    }

    /// Forgets the last published BBO without notifying, so the next
    /// complete BBO is published again. The change count is kept.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Returns the last published BBO.
    #[must_use]
    pub fn last(&self) -> Option<&Bbo> {
        self.last.as_ref()
    }

    /// Returns how many times the BBO has been published.
    #[must_use]
    pub fn changes(&self) -> u64 {
        self.changes
    }
}
