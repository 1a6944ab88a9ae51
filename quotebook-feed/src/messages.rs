//! Level 2 feed message types.
//!
//! Messages are JSON objects tagged by a `"type"` field:
//!
//! ```text
//! {"type":"snapshot","product_id":"BTC-EUR","bids":[["10101.10","0.45"]],"asks":[["10102.55","0.57"]]}
//! {"type":"l2update","product_id":"BTC-EUR","changes":[["buy","10101.80","0.16"]]}
//! ```

use quotebook_core::{RawDecimal, Side};
use quotebook_marketdata::{BookSnapshot, BookUpdate, LevelChange, RawLevel};
use serde::Deserialize;

use crate::error::Result;

/// Decoded feed message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum FeedMessage {
    /// Subscription acknowledgement.
    #[serde(rename = "subscriptions")]
    Subscriptions {
        /// Subscribed channels.
        #[serde(default)]
        channels: Vec<Subscription>,
    },
    /// Full book snapshot.
    #[serde(rename = "snapshot")]
    Snapshot(SnapshotMessage),
    /// Incremental level changes.
    #[serde(rename = "l2update")]
    L2Update(L2UpdateMessage),
    /// Error reported by the feed.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        #[serde(default)]
        message: String,
        /// Additional reason, if given.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Any other message type.
    #[serde(other)]
    Unknown,
}

impl FeedMessage {
    /// Decodes a message from JSON text.
    ///
    /// # Errors
    /// Returns [`crate::FeedError::Decode`] if the text is not a valid message.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the message type name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subscriptions { .. } => "subscriptions",
            Self::Snapshot(_) => "snapshot",
            Self::L2Update(_) => "l2update",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// One subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    /// Channel name, e.g. `"level2"`.
    pub name: String,
    /// Products subscribed on this channel.
    #[serde(default)]
    pub product_ids: Vec<String>,
}

/// Snapshot message body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapshotMessage {
    /// Instrument identifier.
    pub product_id: String,
    /// Bid levels as `[price, size]`.
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    /// Ask levels as `[price, size]`.
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

impl From<SnapshotMessage> for BookSnapshot {
    fn from(message: SnapshotMessage) -> Self {
        Self {
            instrument_id: message.product_id,
            bids: message.bids,
            asks: message.asks,
        }
    }
}

/// Incremental update message body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct L2UpdateMessage {
    /// Instrument identifier.
    pub product_id: String,
    /// Changes as `[side, price, size]`, in application order.
    pub changes: Vec<(String, RawDecimal, RawDecimal)>,
    /// Exchange timestamp, if present.
    #[serde(default)]
    pub time: Option<String>,
}

impl L2UpdateMessage {
    /// Converts the message into a book update.
    ///
    /// # Errors
    /// Returns [`crate::FeedError::Input`] if a change has an unknown side.
    pub fn into_update(self) -> Result<BookUpdate> {
        let changes = self
            .changes
            .into_iter()
            .map(|(side, price, size)| -> Result<LevelChange> {
                let side: Side = side.parse()?;
                Ok(LevelChange { side, price, size })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BookUpdate {
            instrument_id: self.product_id,
            changes,
        })
    }
}
