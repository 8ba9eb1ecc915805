//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! A [`Config`] is built once, validated once, and never mutated afterwards;
//! the core receives its [`RunConfig`] by reference.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::content::{ContentGenerator, DigestAlgorithm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default content seed
pub const DEFAULT_SEED: &str = "abcdefghijk";

/// Default block size in bytes
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Complete test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters of the write/verify run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed mixed into every block's content
    pub seed: String,
    /// Block size in bytes (multiple of the digest size)
    pub block_size: usize,
    /// Exclusive upper bound of the block range
    pub block_count: u64,
    /// First block of the range
    pub start_block: u64,
    /// Which phases run each iteration
    pub mode: Mode,
    /// Number of times the phases are repeated
    pub iterations: u64,
    /// Digest used for content generation
    pub digest: DigestAlgorithm,
    /// Upper bound on generator workers (defaults to available parallelism)
    pub workers: Option<usize>,
}

impl RunConfig {
    /// Number of blocks processed by one phase
    #[inline]
    pub fn phase_blocks(&self) -> u64 {
        self.block_count.saturating_sub(self.start_block)
    }

    /// Byte offset of block `index`
    ///
    /// Validation guarantees this cannot overflow for indices below
    /// `block_count`.
    #[inline]
    pub fn offset_of(&self, index: u64) -> u64 {
        index * self.block_size as u64
    }

    /// Bytes moved by one phase, saturating at `u64::MAX`
    pub fn phase_bytes(&self) -> u64 {
        self.phase_blocks().saturating_mul(self.block_size as u64)
    }

    /// Bytes the target must hold for the configured range, or `None` if the
    /// range ends past `u64::MAX`
    pub fn required_size(&self) -> Option<u64> {
        self.block_count.checked_mul(self.block_size as u64)
    }

    /// Generator worker count: available parallelism, capped by the override
    /// and by the number of blocks in a phase
    pub fn worker_count(&self) -> usize {
        let parallelism = self.workers.unwrap_or_else(num_cpus::get).max(1);
        let blocks = usize::try_from(self.phase_blocks()).unwrap_or(usize::MAX);
        parallelism.min(blocks)
    }

    /// Content generator for this run
    pub fn generator(&self) -> ContentGenerator {
        ContentGenerator::new(&self.seed, self.block_size, self.digest)
    }
}

/// Which phases a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Write only
    #[serde(alias = "w")]
    Write,
    /// Read back and verify only
    #[serde(alias = "r", alias = "verify")]
    ReadVerify,
    /// Write, then read back and verify
    #[default]
    #[serde(alias = "rw")]
    Both,
}

impl Mode {
    /// Phases in execution order
    pub fn phases(self) -> &'static [PhaseKind] {
        match self {
            Mode::Write => &[PhaseKind::Write],
            Mode::ReadVerify => &[PhaseKind::Verify],
            Mode::Both => &[PhaseKind::Write, PhaseKind::Verify],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Write => write!(f, "write"),
            Mode::ReadVerify => write!(f, "read-verify"),
            Mode::Both => write!(f, "write + read-verify"),
        }
    }
}

/// One ascending pass over the block range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Write,
    Verify,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Write => write!(f, "write"),
            PhaseKind::Verify => write!(f, "verify"),
        }
    }
}

/// Target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Path to the file or block device; must already exist
    pub path: PathBuf,
    /// Use direct IO (O_DIRECT)
    #[serde(default)]
    pub direct: bool,
    /// Use synchronous IO (O_SYNC)
    #[serde(default)]
    pub sync: bool,
    /// fsync the target at the end of every write phase
    #[serde(default)]
    pub flush: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON summary file path
    pub json_output: Option<PathBuf>,
    /// Suppress per-interval progress lines
    #[serde(default)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config() -> RunConfig {
        RunConfig {
            seed: "abc".to_string(),
            block_size: 64,
            block_count: 4,
            start_block: 0,
            mode: Mode::Both,
            iterations: 1,
            digest: DigestAlgorithm::Sha256,
            workers: None,
        }
    }

    #[test]
    fn test_offsets() {
        let config = run_config();
        assert_eq!(config.offset_of(2), 128);
        assert_eq!(config.phase_bytes(), 256);
        assert_eq!(config.required_size(), Some(256));
    }

    #[test]
    fn test_phase_blocks_with_start() {
        let config = RunConfig {
            start_block: 3,
            block_count: 10,
            ..run_config()
        };
        assert_eq!(config.phase_blocks(), 7);
        assert_eq!(config.phase_bytes(), 7 * 64);
        assert_eq!(config.required_size(), Some(640));
    }

    #[test]
    fn test_sizes_past_u64() {
        let config = RunConfig {
            block_count: 1 << 55,
            block_size: 512,
            ..run_config()
        };
        assert_eq!(config.required_size(), None);
        assert_eq!(config.phase_bytes(), u64::MAX);
    }

    #[test]
    fn test_worker_count_capped_by_blocks() {
        let config = RunConfig {
            workers: Some(16),
            ..run_config()
        };
        assert_eq!(config.worker_count(), 4);

        let config = RunConfig {
            workers: Some(3),
            ..run_config()
        };
        assert_eq!(config.worker_count(), 3);

        let config = RunConfig {
            start_block: 3,
            workers: Some(8),
            ..run_config()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_worker_count_defaults_to_parallelism() {
        let config = RunConfig {
            block_count: 1 << 20,
            ..run_config()
        };
        assert_eq!(config.worker_count(), num_cpus::get().min(1 << 20));
    }

    #[test]
    fn test_mode_phases() {
        assert_eq!(Mode::Write.phases(), &[PhaseKind::Write]);
        assert_eq!(Mode::ReadVerify.phases(), &[PhaseKind::Verify]);
        assert_eq!(Mode::Both.phases(), &[PhaseKind::Write, PhaseKind::Verify]);
    }

    #[test]
    fn test_mode_deserialize_aliases() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: Mode,
        }
        let parse = |s: &str| ::toml::from_str::<Wrapper>(&format!("mode = \"{}\"", s)).unwrap().mode;
        assert_eq!(parse("rw"), Mode::Both);
        assert_eq!(parse("w"), Mode::Write);
        assert_eq!(parse("r"), Mode::ReadVerify);
        assert_eq!(parse("read-verify"), Mode::ReadVerify);
        assert_eq!(parse("both"), Mode::Both);
    }
}
