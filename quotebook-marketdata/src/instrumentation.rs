//! Optional timing hooks around book mutations.

use crate::error::{MarketDataError, Result};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Book operation being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Snapshot application.
    Snapshot,
    /// Incremental update application.
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => f.write_str("apply_snapshot"),
            Self::Update => f.write_str("apply_update"),
        }
    }
}

/// Receives the duration of every book mutation.
pub trait Instrumentation {
    /// Returns false to skip timing altogether.
    fn enabled(&self) -> bool {
        true
    }

    /// Records the time spent in one operation.
    fn record(&mut self, operation: Operation, instrument_id: &str, elapsed: Duration);
}

impl<T: Instrumentation + ?Sized> Instrumentation for Box<T> {
    fn enabled(&self) -> bool {
        (**self).enabled()
    }

    fn record(&mut self, operation: Operation, instrument_id: &str, elapsed: Duration) {
        (**self).record(operation, instrument_id, elapsed);
    }
}

/// Instrumentation that measures nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _operation: Operation, _instrument_id: &str, _elapsed: Duration) {}
}

/// Logs every duration at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInstrumentation;

impl Instrumentation for TracingInstrumentation {
    fn record(&mut self, operation: Operation, instrument_id: &str, elapsed: Duration) {
        tracing::debug!(
            instrument = instrument_id,
            "Time spent in {}: {:.6} s",
            operation,
            elapsed.as_secs_f64()
        );
    }
}

/// Latency statistics for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    /// Minimum latency.
    pub min: Duration,
    /// Maximum latency.
    pub max: Duration,
    /// Mean latency.
    pub mean: Duration,
    /// Median latency (p50).
    pub median: Duration,
    /// 99th percentile latency.
    pub p99: Duration,
    /// 99.9th percentile latency.
    pub p999: Duration,
    /// Sample count.
    pub count: u64,
}

struct Histograms {
    snapshot: Histogram<u64>,
    update: Histogram<u64>,
}

impl Histograms {
    fn get_mut(&mut self, operation: Operation) -> &mut Histogram<u64> {
        match operation {
            Operation::Snapshot => &mut self.snapshot,
            Operation::Update => &mut self.update,
        }
    }

    fn get(&self, operation: Operation) -> &Histogram<u64> {
        match operation {
            Operation::Snapshot => &self.snapshot,
            Operation::Update => &self.update,
        }
    }
}

/// Longest duration a histogram can hold; longer samples are clamped to it.
const MAX_TRACKABLE_NANOS: u64 = 60_000_000_000;

/// Collects per-operation latency histograms in nanoseconds.
///
/// Samples range from 1ns to one minute at three significant figures.
/// Clones share the same histograms, so one clone can be handed to the
/// handler while another reads statistics.
#[derive(Clone)]
pub struct LatencyRecorder {
    inner: Arc<Mutex<Histograms>>,
}

impl LatencyRecorder {
    /// Creates a recorder with three significant figures of precision.
    ///
    /// # Errors
    /// Returns [`MarketDataError::Instrumentation`] if the histograms cannot
    /// be allocated.
    pub fn new() -> Result<Self> {
        let histogram = || {
            Histogram::<u64>::new_with_bounds(1, MAX_TRACKABLE_NANOS, 3).map_err(|e| {
                MarketDataError::Instrumentation {
                    message: e.to_string(),
                }
            })
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(Histograms {
                snapshot: histogram()?,
                update: histogram()?,
            })),
        })
    }

    /// Computes statistics for one operation.
    ///
    /// Returns `None` if nothing has been recorded for it.
    #[must_use]
    pub fn stats(&self, operation: Operation) -> Option<LatencyStats> {
        let histograms = self.inner.lock();
        let histogram = histograms.get(operation);
        if histogram.is_empty() {
            return None;
        }

        Some(LatencyStats {
            min: Duration::from_nanos(histogram.min()),
            max: Duration::from_nanos(histogram.max()),
            mean: Duration::from_nanos(histogram.mean() as u64),
            median: Duration::from_nanos(histogram.value_at_quantile(0.5)),
            p99: Duration::from_nanos(histogram.value_at_quantile(0.99)),
            p999: Duration::from_nanos(histogram.value_at_quantile(0.999)),
            count: histogram.len(),
        })
    }

    /// Clears all samples.
    pub fn reset(&self) {
        let mut histograms = self.inner.lock();
        histograms.snapshot.reset();
        histograms.update.reset();
    }
}

impl fmt::Debug for LatencyRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let histograms = self.inner.lock();
        f.debug_struct("LatencyRecorder")
            .field("snapshots", &histograms.snapshot.len())
            .field("updates", &histograms.update.len())
            .finish()
    }
}

impl Instrumentation for LatencyRecorder {
    fn record(&mut self, operation: Operation, _instrument_id: &str, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.inner.lock().get_mut(operation).saturating_record(nanos);
    }
}
