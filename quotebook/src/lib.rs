//! # quotebook
//!
//! Level 2 order book maintenance with change-gated best bid/offer notification.
//!
//! Books are built from a full snapshot and kept current with incremental
//! level changes. Prices are keyed by exact decimals at each instrument's
//! precision, so `1.2300000001` and `1.23` land on the same level when the
//! instrument quotes in cents. Observers hear about the best bid/offer only
//! when it actually changes.
//!
//! ## Quick Start
//!
//! ```
//! use quotebook::prelude::*;
//!
//! let mut handler = MarketDataHandler::builder()
//!     .instrument(Instrument::with_decimal_places("X-Y", 2)?)
//!     .observer(FnObserver::new(|id: &str, bbo: &Bbo| println!("{id}: {bbo}")))
//!     .build()?;
//!
//! handler.apply_snapshot(
//!     "X-Y",
//!     &[("10.00".into(), "5".into())],
//!     &[("10.05".into(), "3".into())],
//! )?;
//! handler.apply_update("X-Y", Side::Bid, "10.00", "0")?;
//! assert!(handler.bbo("X-Y").is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Price keys, precision, quantities and sides
//! - [`marketdata`] - Price level index, order book, BBO tracking and the handler
//! - [`feed`] - JSON feed messages, product catalog and feed processing

pub mod prelude;

/// Price keys, precision and primitive types.
pub mod core {
    pub use quotebook_core::*;
}

/// Order book maintenance and BBO tracking.
pub mod marketdata {
    pub use quotebook_marketdata::*;
}

/// Feed message decoding and catalog resolution.
pub mod feed {
    pub use quotebook_feed::*;
}

// Re-export commonly used items at the crate root
pub use quotebook_core::{Precision, PriceKey, Side};
pub use quotebook_feed::{Catalog, FeedProcessor};
pub use quotebook_marketdata::{Bbo, BboObserver, MarketDataHandler, OrderBook};
