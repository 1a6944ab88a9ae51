//! # quotebook Feed
//!
//! Boundary between a level 2 market data feed and the order books.
//!
//! This crate provides:
//! - JSON feed message types (subscriptions, snapshot, l2update)
//! - Product catalog parsing and instrument precision resolution
//! - A processor that routes decoded messages to a market data handler

pub mod catalog;
pub mod error;
pub mod messages;
pub mod processor;

pub use catalog::{Catalog, Product};
pub use error::{FeedError, Result};
pub use messages::{FeedMessage, L2UpdateMessage, SnapshotMessage, Subscription};
pub use processor::{EventCounts, FeedOutcome, FeedProcessor};
