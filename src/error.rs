//! Error taxonomy
//!
//! Every fault in a run is fatal. Configuration problems are caught before any
//! IO is issued; transfer and verification faults abort the phase at the block
//! where they occur and surface unchanged to the run loop.

use std::fmt;
use std::io;
use thiserror::Error;

/// Direction of a block transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Read,
    Write,
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOp::Read => write!(f, "read"),
            TransferOp::Write => write!(f, "write"),
        }
    }
}

/// Rejected run configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block count must be greater than 0")]
    ZeroBlockCount,

    #[error("block size must be greater than 0")]
    ZeroBlockSize,

    #[error("block size {block_size} is not a multiple of the {digest} digest size ({digest_size} bytes)")]
    MisalignedBlockSize {
        block_size: usize,
        digest: &'static str,
        digest_size: usize,
    },

    #[error("block size {block_size} must be a multiple of 512 bytes for direct IO")]
    DirectIoAlignment { block_size: usize },

    #[error("{block_count} blocks of {block_size} bytes exceed the addressable range")]
    RangeTooLarge { block_count: u64, block_size: usize },

    #[error("start block {start_block} must be less than block count {block_count}")]
    StartBeyondEnd { start_block: u64, block_count: u64 },

    #[error("iteration count must be at least 1")]
    ZeroIterations,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("target is {target_size} bytes but the run needs {required} bytes")]
    TargetTooSmall { target_size: u64, required: u64 },
}

/// Fatal fault raised by the core
#[derive(Debug, Error)]
pub enum StressError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("partial {op} at block {block} (offset {offset}): {transferred} of {expected} bytes")]
    Transfer {
        op: TransferOp,
        block: u64,
        offset: u64,
        transferred: usize,
        expected: usize,
    },

    #[error("{op} failed at block {block} (offset {offset})")]
    Io {
        op: TransferOp,
        block: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("block {block} failed to compare: byte {byte_offset} expected {expected:#04x}, found {actual:#04x}")]
    VerificationMismatch {
        block: u64,
        byte_offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("generator worker {worker} exited before producing block {block}")]
    WorkerLost { worker: usize, block: u64 },

    #[error("failed to spawn generator worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush target after write phase")]
    Flush(#[source] io::Error),
}

impl StressError {
    /// Block index the fault occurred at, if it is tied to one
    pub fn block(&self) -> Option<u64> {
        match self {
            StressError::Transfer { block, .. }
            | StressError::Io { block, .. }
            | StressError::VerificationMismatch { block, .. }
            | StressError::WorkerLost { block, .. } => Some(*block),
            StressError::Config(_) | StressError::Spawn { .. } | StressError::Flush(_) => None,
        }
    }
}
