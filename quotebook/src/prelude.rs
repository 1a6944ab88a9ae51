//! Prelude module for convenient imports.
//!
//! ```
//! use quotebook::prelude::*;
//! ```

// Core types
pub use quotebook_core::{
    DecimalInput, Error as CoreError, Precision, PriceKey, Quantity, RawDecimal, Side,
};

// Market data types
pub use quotebook_marketdata::{
    Bbo, BboEvent, BboObserver, BboTracker, BookSnapshot, BookUpdate, ChannelObserver,
    FnObserver, Instrument, InstrumentRegistry, InstrumentState, Instrumentation, LatencyRecorder,
    LevelChange, MarketDataError, MarketDataHandler, MarketDataHandlerBuilder, NoopObserver,
    Operation, OrderBook, PriceLevel, PriceLevelIndex, TracingInstrumentation,
};

// Feed types
pub use quotebook_feed::{Catalog, FeedError, FeedMessage, FeedOutcome, FeedProcessor};
