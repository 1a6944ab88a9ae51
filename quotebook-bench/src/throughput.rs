//! Throughput measurement.

use quotebook_marketdata::{BookUpdate, MarketDataHandler, Result};
use std::time::{Duration, Instant};

/// Result of a throughput run.
#[derive(Debug, Clone)]
pub struct ThroughputResult {
    /// Update messages applied.
    pub messages: u64,
    /// Messages that changed the BBO.
    pub bbo_changes: u64,
    /// Total duration.
    pub duration: Duration,
}

impl ThroughputResult {
    /// Returns messages per second.
    #[must_use]
    pub fn messages_per_second(&self) -> f64 {
        self.messages as f64 / self.duration.as_secs_f64()
    }

    /// Returns the share of messages that changed the BBO.
    #[must_use]
    pub fn bbo_change_ratio(&self) -> f64 {
        if self.messages == 0 {
            return 0.0;
        }
        self.bbo_changes as f64 / self.messages as f64
    }
}

/// Applies `updates` in order and measures the elapsed time.
///
/// # Errors
/// Returns the first error the handler reports.
pub fn replay_updates(
    handler: &mut MarketDataHandler,
    updates: &[BookUpdate],
) -> Result<ThroughputResult> {
    let start = Instant::now();
    let mut bbo_changes = 0;

    for update in updates {
        if handler.on_update(update)? {
            bbo_changes += 1;
        }
    }

    Ok(ThroughputResult {
        messages: updates.len() as u64,
        bbo_changes,
        duration: start.elapsed(),
    })
}
