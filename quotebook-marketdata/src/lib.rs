//! # quotebook Market Data
//!
//! Order book maintenance and top-of-book tracking.
//!
//! This crate provides:
//! - Ordered price level index per book side
//! - Snapshot and incremental update handling
//! - Best bid/offer change detection with observer notification
//! - Instrument registration and optional timing instrumentation

pub mod bbo;
pub mod book;
pub mod error;
pub mod handler;
pub mod instrumentation;
pub mod instruments;
pub mod level_index;

pub use bbo::{Bbo, BboEvent, BboObserver, BboTracker, ChannelObserver, FnObserver, NoopObserver};
pub use book::{BookSnapshot, BookUpdate, LevelChange, OrderBook, RawLevel};
pub use error::{LevelError, MarketDataError, Result};
pub use handler::{HandlerStats, InstrumentState, MarketDataHandler, MarketDataHandlerBuilder};
pub use instrumentation::{
    Instrumentation, LatencyRecorder, LatencyStats, NoopInstrumentation, Operation,
    TracingInstrumentation,
};
pub use instruments::{Instrument, InstrumentRegistry};
pub use level_index::{PriceLevel, PriceLevelIndex};
