//! blockstress - deterministic block-device stress tester
//!
//! blockstress writes a reproducible pseudo-random byte stream across a range
//! of fixed-size blocks on a file or block device, then reads every block back
//! and compares it byte for byte against freshly regenerated content.
//!
//! # Architecture
//!
//! - **Content**: each block is a chain of digests keyed by seed and block index
//! - **Generator pool**: worker threads precompute blocks, one ahead per worker
//! - **Disk driver**: full-length positioned transfers; short transfers are fatal
//! - **Coordinator**: write and verify phases in ascending block order
//! - **Stats**: per-block instantaneous and cumulative throughput, latency histograms

pub mod config;
pub mod content;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{Config, RunConfig};
pub use content::{ContentGenerator, DigestAlgorithm};
pub use coordinator::Coordinator;
pub use error::{ConfigError, StressError};

/// Result type used at the crate's edges
pub type Result<T> = anyhow::Result<T>;
