//! Routes decoded feed messages to the market data handler.

use crate::error::Result;
use crate::messages::FeedMessage;
use quotebook_marketdata::{BookSnapshot, MarketDataHandler};
use std::io::BufRead;

/// What processing one message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Subscription acknowledged for these products.
    Subscribed {
        /// Subscribed product identifiers.
        products: Vec<String>,
    },
    /// Snapshot applied.
    Snapshot {
        /// Instrument identifier.
        instrument: String,
        /// Whether the BBO changed.
        bbo_changed: bool,
    },
    /// Update applied.
    Update {
        /// Instrument identifier.
        instrument: String,
        /// Whether the BBO changed.
        bbo_changed: bool,
    },
    /// Message carried nothing for the books.
    Ignored {
        /// Message type name.
        kind: &'static str,
    },
}

impl FeedOutcome {
    /// Returns true if the message changed a BBO.
    #[must_use]
    pub fn bbo_changed(&self) -> bool {
        match self {
            Self::Snapshot { bbo_changed, .. } | Self::Update { bbo_changed, .. } => *bbo_changed,
            Self::Subscribed { .. } | Self::Ignored { .. } => false,
        }
    }
}

/// Counters for received feed events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventCounts {
    /// Every message received, including rejected ones.
    pub total: u64,
    /// Subscription acknowledgements.
    pub subscriptions: u64,
    /// Snapshots applied.
    pub snapshots: u64,
    /// Updates applied.
    pub updates: u64,
    /// Messages ignored.
    pub ignored: u64,
    /// Messages rejected with a non-fatal error.
    pub rejected: u64,
}

/// Decodes feed messages and applies them to a [`MarketDataHandler`].
pub struct FeedProcessor {
    handler: MarketDataHandler,
    counts: EventCounts,
}

impl FeedProcessor {
    /// Creates a processor driving `handler`.
    #[must_use]
    pub fn new(handler: MarketDataHandler) -> Self {
        Self {
            handler,
            counts: EventCounts::default(),
        }
    }

    /// Decodes and processes one JSON message.
    ///
    /// # Errors
    /// Returns the decode or processing error. Use
    /// [`FeedError::is_fatal`] to decide whether to continue.
    pub fn process_text(&mut self, text: &str) -> Result<FeedOutcome> {
        match FeedMessage::from_json(text) {
            Ok(message) => self.process(message),
            Err(e) => {
                self.counts.total += 1;
                self.counts.rejected += 1;
                Err(e)
            }
        }
    }

    /// Processes one decoded message.
    ///
    /// # Errors
    /// Returns the processing error. Use [`FeedError::is_fatal`] to decide
    /// whether to continue.
    pub fn process(&mut self, message: FeedMessage) -> Result<FeedOutcome> {
        self.counts.total += 1;
        let result = self.route(message);
        if let Err(e) = &result {
            if !e.is_fatal() {
                self.counts.rejected += 1;
            }
        }
        result
    }

    fn route(&mut self, message: FeedMessage) -> Result<FeedOutcome> {
        match message {
            FeedMessage::Subscriptions { channels } => {
                tracing::debug!("Subscriptions: {:?}", channels);
                self.counts.subscriptions += 1;
                let products = channels
                    .into_iter()
                    .flat_map(|channel| channel.product_ids)
                    .collect();
                Ok(FeedOutcome::Subscribed { products })
            }
            FeedMessage::Snapshot(snapshot) => {
                let snapshot = BookSnapshot::from(snapshot);
                let bbo_changed = self.handler.on_snapshot(&snapshot)?;
                self.counts.snapshots += 1;
                Ok(FeedOutcome::Snapshot {
                    instrument: snapshot.instrument_id,
                    bbo_changed,
                })
            }
            FeedMessage::L2Update(message) => {
                let update = message.into_update()?;
                let bbo_changed = self.handler.on_update(&update)?;
                self.counts.updates += 1;
                Ok(FeedOutcome::Update {
                    instrument: update.instrument_id,
                    bbo_changed,
                })
            }
            FeedMessage::Error { message, reason } => {
                tracing::error!(reason = ?reason, "Feed error: {}", message);
                self.counts.ignored += 1;
                Ok(FeedOutcome::Ignored { kind: "error" })
            }
            FeedMessage::Unknown => {
                self.counts.ignored += 1;
                Ok(FeedOutcome::Ignored { kind: "unknown" })
            }
        }
    }

    /// Processes newline-delimited JSON messages until the input ends.
    ///
    /// Blank lines are skipped. Non-fatal errors are logged and the message
    /// is dropped; the first fatal error stops the replay.
    ///
    /// # Errors
    /// Returns the first fatal error, including IO errors from `reader`.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<EventCounts> {
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(e) = self.process_text(line) {
                if e.is_fatal() {
                    tracing::error!(error = %e, "Fatal feed error, stopping");
                    return Err(e);
                }
                tracing::warn!(error = %e, "Dropping feed message");
            }
        }
        tracing::debug!("Total events received: {}", self.counts.total);
        Ok(self.counts)
    }

    /// Returns event counters.
    #[must_use]
    pub fn counts(&self) -> EventCounts {
        self.counts
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &MarketDataHandler {
        &self.handler
    }

    /// Consumes the processor, returning the handler.
    #[must_use]
    pub fn into_handler(self) -> MarketDataHandler {
        self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::FeedError;
    use quotebook_marketdata::{Bbo, FnObserver, MarketDataError};
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    const PRODUCTS: &str = r#"[
        {"id":"X-Y","quote_increment":"0.01"},
        {"id":"BTC-EUR","quote_increment":"0.01000000"}
    ]"#;

    type Published = Rc<RefCell<Vec<String>>>;

    fn processor() -> (FeedProcessor, Published) {
        let instruments = Catalog::from_json(PRODUCTS)
            .unwrap()
            .resolve(&["X-Y", "BTC-EUR"])
            .unwrap();
        let published: Published = Rc::default();
        let sink = Rc::clone(&published);
        let handler = MarketDataHandler::builder()
            .instruments(instruments)
            .observer(FnObserver::new(move |id: &str, bbo: &Bbo| {
                sink.borrow_mut().push(format!("{id}: {bbo}"));
            }))
            .build()
            .unwrap();
        (FeedProcessor::new(handler), published)
    }

    #[test]
    fn test_snapshot_then_update() {
        let (mut processor, published) = processor();

        let outcome = processor
            .process_text(
                r#"{"type":"snapshot","product_id":"X-Y","bids":[["10.00","5"]],"asks":[["10.05","3"]]}"#,
            )
            .unwrap();
        assert_eq!(
            outcome,
            FeedOutcome::Snapshot {
                instrument: "X-Y".to_string(),
                bbo_changed: true
            }
        );

        let outcome = processor
            .process_text(
                r#"{"type":"l2update","product_id":"X-Y","changes":[["buy","10.00","0"],["buy","9.99","2"]]}"#,
            )
            .unwrap();
        assert!(outcome.bbo_changed());

        assert_eq!(
            *published.borrow(),
            vec![
                "X-Y: 5 @ 10.00 -- 3 @ 10.05".to_string(),
                "X-Y: 2 @ 9.99 -- 3 @ 10.05".to_string(),
            ]
        );
        let bbo = processor.handler().bbo("X-Y").unwrap();
        assert_eq!(bbo.bid_size, dec!(2));
    }

    #[test]
    fn test_subscriptions_and_unknown() {
        let (mut processor, published) = processor();
        let outcome = processor
            .process_text(
                r#"{"type":"subscriptions","channels":[{"name":"level2","product_ids":["X-Y"]}]}"#,
            )
            .unwrap();
        assert_eq!(
            outcome,
            FeedOutcome::Subscribed {
                products: vec!["X-Y".to_string()]
            }
        );

        let outcome = processor
            .process_text(r#"{"type":"heartbeat"}"#)
            .unwrap();
        assert_eq!(outcome, FeedOutcome::Ignored { kind: "unknown" });
        assert!(published.borrow().is_empty());

        let counts = processor.counts();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.subscriptions, 1);
        assert_eq!(counts.ignored, 1);
    }

    #[test]
    fn test_unregistered_product_is_fatal() {
        let (mut processor, _) = processor();
        let err = processor
            .process_text(r#"{"type":"snapshot","product_id":"ETH-EUR","bids":[],"asks":[]}"#)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            FeedError::MarketData(MarketDataError::UnregisteredInstrument { .. })
        ));
    }

    #[test]
    fn test_replay_skips_bad_messages() {
        let (mut processor, published) = processor();
        let feed = r#"{"type":"subscriptions","channels":[]}
{"type":"l2update","product_id":"X-Y","changes":[["buy","9.00","1"]]}
{"type":"snapshot","product_id":"X-Y","bids":[["10.00","5"]],"asks":[["10.05","3"]]}

garbage
{"type":"l2update","product_id":"X-Y","changes":[["sell","10.07","1"]]}
{"type":"l2update","product_id":"X-Y","changes":[["sell","10.04","1"]]}
"#;
        let counts = processor.replay(Cursor::new(feed)).unwrap();
        assert_eq!(counts.total, 6);
        assert_eq!(counts.snapshots, 1);
        assert_eq!(counts.updates, 2);
        assert_eq!(counts.rejected, 2);
        assert_eq!(published.borrow().len(), 2);
    }

    #[test]
    fn test_replay_stops_on_fatal() {
        let (mut processor, _) = processor();
        let feed = r#"{"type":"snapshot","product_id":"X-Y","bids":[["10.00","5"]],"asks":[["10.05","3"]]}
{"type":"l2update","product_id":"LTC-EUR","changes":[["buy","1","1"]]}
{"type":"l2update","product_id":"X-Y","changes":[["buy","10.01","1"]]}
"#;
        let err = processor.replay(Cursor::new(feed)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(processor.counts().total, 2);

        let handler = processor.into_handler();
        let bbo = handler.bbo("X-Y").unwrap();
        assert_eq!(bbo.bid_price.to_string(), "10.00");
    }
}
