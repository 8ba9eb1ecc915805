//! Per-block latency histogram using HdrHistogram
//!
//! Tracks the wall-clock time of individual block transfers from 1ns to 1 hour
//! with 3 significant digits, so a phase summary can report tail latency next
//! to throughput.

use hdrhistogram::Histogram;
use std::time::Duration;

const MAX_TRACKABLE_NANOS: u64 = 3_600_000_000_000;

/// Latency histogram wrapper
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKABLE_NANOS, 3)
            .expect("Failed to create histogram with valid bounds");

        Self { histogram }
    }

    /// Record a latency sample, clamped to the trackable range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        let value = nanos.clamp(1, MAX_TRACKABLE_NANOS);
        let _ = self.histogram.record(value);
    }

    /// Latency at `percentile` (0.0 - 100.0), or None if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(
            self.histogram.value_at_percentile(percentile),
        ))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.mean() as u64))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Clear all samples, e.g. at the start of a phase
    pub fn reset(&mut self) {
        self.histogram.reset();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let hist = LatencyHistogram::new();
        assert!(hist.is_empty());
        assert_eq!(hist.percentile(50.0), None);
        assert_eq!(hist.max(), None);
    }

    #[test]
    fn test_millisecond_range() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_millis(1));
        hist.record(Duration::from_millis(10));
        hist.record(Duration::from_millis(100));

        assert_eq!(hist.len(), 3);
        let max = hist.max().unwrap();
        assert!(max.as_millis() >= 99 && max.as_millis() <= 101);
        let min = hist.min().unwrap();
        assert!(min.as_micros() >= 999 && min.as_micros() <= 1001);
    }

    #[test]
    fn test_percentiles() {
        let mut hist = LatencyHistogram::new();
        for micros in 1..=100 {
            hist.record(Duration::from_micros(micros));
        }
        let p50 = hist.percentile(50.0).unwrap();
        assert!(p50.as_micros() >= 49 && p50.as_micros() <= 51);
        let p99 = hist.percentile(99.0).unwrap();
        assert!(p99.as_micros() >= 98 && p99.as_micros() <= 100);
    }

    #[test]
    fn test_zero_duration_is_clamped() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::ZERO);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.min(), Some(Duration::from_nanos(1)));
    }

    #[test]
    fn test_reset() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_micros(5));
        hist.reset();
        assert!(hist.is_empty());
    }
}
