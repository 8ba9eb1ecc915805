//! Throughput accounting
//!
//! A [`PhaseStats`] accumulates one phase: every block transfer contributes its
//! wall-clock time and byte count, and after each block the instantaneous and
//! cumulative rates are available. Only time spent inside transfers is
//! counted; waiting on generator workers is not.
//!
//! # Example
//!
//! ```
//! use blockstress::stats::PhaseStats;
//! use std::time::Duration;
//!
//! let mut stats = PhaseStats::new(1024 * 1024);
//! let rate = stats.record(Duration::from_millis(500));
//! assert_eq!(rate.instant_mb_per_sec(), 2.0);
//!
//! let rate = stats.record(Duration::from_millis(1500));
//! assert_eq!(rate.cumulative_mb_per_sec(), 1.0);
//! ```

pub mod histogram;

use crate::config::PhaseKind;
use crate::util::time::{calculate_throughput, to_mb_per_sec};
use histogram::LatencyHistogram;
use serde::Serialize;
use std::time::Duration;

/// Approximate data volume between progress reports
pub const REPORT_BYTES: u64 = 8 * 1024 * 1024;

/// Number of blocks between progress reports for `block_size`
///
/// Inversely proportional to the block size so reports arrive after roughly
/// [`REPORT_BYTES`] regardless of granularity.
pub fn report_interval(block_size: usize) -> u64 {
    (REPORT_BYTES / block_size.max(1) as u64).max(1)
}

/// Rates after a single block, in bytes per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRate {
    /// This block's size over this block's elapsed time
    pub instant: f64,
    /// Phase bytes so far over phase transfer time so far
    pub cumulative: f64,
}

impl BlockRate {
    pub fn instant_mb_per_sec(&self) -> f64 {
        to_mb_per_sec(self.instant)
    }

    pub fn cumulative_mb_per_sec(&self) -> f64 {
        to_mb_per_sec(self.cumulative)
    }
}

/// Running totals for the active phase
#[derive(Debug, Clone)]
pub struct PhaseStats {
    block_size: u64,
    blocks: u64,
    bytes: u64,
    elapsed: Duration,
    last: Option<Duration>,
    latency: LatencyHistogram,
}

impl PhaseStats {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size as u64,
            blocks: 0,
            bytes: 0,
            elapsed: Duration::ZERO,
            last: None,
            latency: LatencyHistogram::new(),
        }
    }

    /// Clear all totals for a new phase
    pub fn reset(&mut self) {
        self.blocks = 0;
        self.bytes = 0;
        self.elapsed = Duration::ZERO;
        self.last = None;
        self.latency.reset();
    }

    /// Account one block transfer that took `elapsed`
    #[inline]
    pub fn record(&mut self, elapsed: Duration) -> BlockRate {
        self.blocks += 1;
        self.bytes += self.block_size;
        self.elapsed += elapsed;
        self.last = Some(elapsed);
        self.latency.record(elapsed);
        BlockRate {
            instant: calculate_throughput(self.block_size, elapsed),
            cumulative: calculate_throughput(self.bytes, self.elapsed),
        }
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Cumulative time spent in transfers
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Rate of the most recent block, or 0.0 before the first one
    pub fn instant_rate(&self) -> f64 {
        self.last
            .map(|d| calculate_throughput(self.block_size, d))
            .unwrap_or(0.0)
    }

    /// Rate over the whole phase so far
    pub fn cumulative_rate(&self) -> f64 {
        calculate_throughput(self.bytes, self.elapsed)
    }

    pub fn latency(&self) -> &LatencyHistogram {
        &self.latency
    }

    /// Snapshot for reporting once the phase is over
    pub fn summary(&self, kind: PhaseKind, iteration: u64, wall_time: Duration) -> PhaseSummary {
        let micros = |d: Option<Duration>| d.map(|d| d.as_secs_f64() * 1_000_000.0).unwrap_or(0.0);
        PhaseSummary {
            kind,
            iteration,
            blocks: self.blocks,
            bytes: self.bytes,
            transfer_secs: self.elapsed.as_secs_f64(),
            wall_secs: wall_time.as_secs_f64(),
            throughput_mb_per_sec: to_mb_per_sec(self.cumulative_rate()),
            latency_p50_us: micros(self.latency.percentile(50.0)),
            latency_p99_us: micros(self.latency.percentile(99.0)),
            latency_max_us: micros(self.latency.max()),
        }
    }
}

/// Totals of one completed phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub kind: PhaseKind,
    /// 1-based iteration number
    pub iteration: u64,
    pub blocks: u64,
    pub bytes: u64,
    /// Time spent inside transfers
    pub transfer_secs: f64,
    /// Wall-clock time of the phase including generator waits
    pub wall_secs: f64,
    pub throughput_mb_per_sec: f64,
    pub latency_p50_us: f64,
    pub latency_p99_us: f64,
    pub latency_max_us: f64,
}
