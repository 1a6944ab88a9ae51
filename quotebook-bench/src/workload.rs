//! Deterministic synthetic book workloads.

use quotebook_core::{Precision, RawDecimal, Side};
use quotebook_marketdata::{
    BookSnapshot, BookUpdate, Instrument, LevelChange, MarketDataHandler, RawLevel, Result,
};
use rust_decimal::Decimal;

/// Shape of a generated workload.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadConfig {
    /// Levels per side in the snapshot.
    pub depth: usize,
    /// Number of update messages.
    pub updates: usize,
    /// Level changes per update message.
    pub changes_per_update: usize,
    /// Instrument precision.
    pub decimal_places: u32,
    /// Generator seed.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            depth: 100,
            updates: 10_000,
            changes_per_update: 1,
            decimal_places: 2,
            seed: 0x5EED_B00C,
        }
    }
}

/// A snapshot followed by a stream of updates for one instrument.
///
/// Bids sit strictly below the mid and asks strictly above it, so the book
/// never crosses. Roughly one change in four deletes a level.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Instrument the workload is generated for.
    pub instrument: Instrument,
    /// Initial snapshot.
    pub snapshot: BookSnapshot,
    /// Updates, in feed order.
    pub updates: Vec<BookUpdate>,
}

const INSTRUMENT_ID: &str = "BENCH-EUR";
const MID_TICKS: i64 = 1_000_000;

impl Workload {
    /// Generates a workload. Identical configs give identical workloads.
    ///
    /// # Errors
    /// Returns an error if `decimal_places` is out of range.
    pub fn generate(config: WorkloadConfig) -> quotebook_core::Result<Self> {
        let precision = Precision::new(config.decimal_places)?;
        let dp = config.decimal_places;
        let depth = config.depth.max(1) as i64;
        let mut rng = XorShift64::new(config.seed);

        let level = |ticks: i64, size: i64| -> RawLevel {
            (text(ticks, dp), text(size, 0))
        };
        let bids = (0..depth)
            .map(|i| level(MID_TICKS - 1 - i, 1 + i % 10))
            .collect();
        let asks = (0..depth)
            .map(|i| level(MID_TICKS + 1 + i, 1 + i % 10))
            .collect();

        let updates = (0..config.updates)
            .map(|_| BookUpdate {
                instrument_id: INSTRUMENT_ID.to_string(),
                changes: (0..config.changes_per_update.max(1))
                    .map(|_| {
                        let side = if rng.next_u64() & 1 == 0 { Side::Bid } else { Side::Ask };
                        let offset = (rng.next_u64() % depth as u64) as i64;
                        let ticks = match side {
                            Side::Bid => MID_TICKS - 1 - offset,
                            Side::Ask => MID_TICKS + 1 + offset,
                        };
                        let size = if rng.next_u64() % 4 == 0 {
                            0
                        } else {
                            1 + (rng.next_u64() % 100) as i64
                        };
                        LevelChange::new(side, text(ticks, dp), text(size, 0))
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            instrument: Instrument::new(INSTRUMENT_ID, precision),
            snapshot: BookSnapshot {
                instrument_id: INSTRUMENT_ID.to_string(),
                bids,
                asks,
            },
            updates,
        })
    }

    /// Builds a handler for this workload's instrument with the snapshot
    /// already applied.
    ///
    /// # Errors
    /// Returns an error if the handler rejects the snapshot.
    pub fn populated_handler(&self) -> Result<MarketDataHandler> {
        let mut handler = MarketDataHandler::builder()
            .instrument(self.instrument.clone())
            .build()?;
        handler.on_snapshot(&self.snapshot)?;
        Ok(handler)
    }
}

fn text(units: i64, scale: u32) -> RawDecimal {
    RawDecimal::Text(Decimal::new(units, scale).to_string())
}

struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> WorkloadConfig {
        WorkloadConfig {
            depth: 10,
            updates: 200,
            changes_per_update: 2,
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = Workload::generate(small()).unwrap();
        let b = Workload::generate(small()).unwrap();
        assert_eq!(a.snapshot, b.snapshot);
        assert_eq!(a.updates, b.updates);
        assert_eq!(a.updates.len(), 200);
        assert!(a.updates.iter().all(|u| u.changes.len() == 2));
    }

    #[test]
    fn test_snapshot_shape() {
        let workload = Workload::generate(small()).unwrap();
        assert_eq!(workload.snapshot.bids.len(), 10);
        assert_eq!(workload.snapshot.asks.len(), 10);
        assert_eq!(workload.snapshot.bids[0].0, RawDecimal::from("9999.99"));
        assert_eq!(workload.snapshot.asks[0].0, RawDecimal::from("10000.01"));
    }

    #[test]
    fn test_populated_handler_never_crosses() {
        let workload = Workload::generate(small()).unwrap();
        let mut handler = workload.populated_handler().unwrap();
        for update in &workload.updates {
            handler.on_update(update).unwrap();
            if let Some(bbo) = handler.bbo(INSTRUMENT_ID) {
                assert!(!bbo.is_crossed());
            }
        }
    }

    #[test]
    fn test_invalid_precision() {
        let config = WorkloadConfig {
            decimal_places: 40,
            ..WorkloadConfig::default()
        };
        assert!(Workload::generate(config).is_err());
    }
}
