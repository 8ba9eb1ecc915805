//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Phases to run each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliMode {
    /// Write, then read back and verify
    #[value(alias = "both")]
    Rw,
    /// Write only
    #[value(alias = "write")]
    W,
    /// Read back and verify only
    #[value(aliases = ["verify", "read-verify"])]
    R,
}

/// Digest used to generate block content
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDigest {
    /// SHA-256 (32-byte chunks)
    Sha256,
    /// SHA-512 (64-byte chunks)
    Sha512,
}

/// blockstress - write deterministic content to a disk and verify it reads back
#[derive(Parser, Debug)]
#[command(name = "blockstress")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target path (existing file or block device)
    #[arg(value_name = "PATH")]
    pub target: Option<PathBuf>,

    // === Run Options ===
    /// Seed for block content
    #[arg(long)]
    pub seed: Option<String>,

    /// Exclusive end of the block range (default: target size / block size)
    #[arg(long)]
    pub blocks: Option<u64>,

    /// Block size (e.g., 512, 4k, 1M); must be a multiple of the digest size
    #[arg(short = 'b', long)]
    pub block_size: Option<String>,

    /// First block to process
    #[arg(long)]
    pub start_block: Option<u64>,

    /// Phases to run: rw (write then verify), w (write), r (verify)
    #[arg(long, value_enum)]
    pub mode: Option<CliMode>,

    /// Number of times to repeat the phases
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Content digest
    #[arg(long, value_enum)]
    pub digest: Option<CliDigest>,

    /// Maximum number of generator workers (default: number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    // === Target Options ===
    /// Use O_DIRECT to bypass the page cache
    #[arg(long)]
    pub direct: bool,

    /// Use O_SYNC for synchronous writes
    #[arg(long)]
    pub sync: bool,

    /// fsync the target after every write phase
    #[arg(long)]
    pub flush: bool,

    // === Config & Output ===
    /// TOML configuration file; command-line values take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a JSON summary to this file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Suppress periodic progress lines
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, env = "BLOCKSTRESS_DEBUG")]
    pub debug: bool,

    /// Validate and print the configuration without touching the target
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
