//! Conversion from CLI arguments to configuration values

use super::cli::{CliDigest, CliMode};
use super::Mode;
use crate::content::DigestAlgorithm;
use crate::Result;
use anyhow::Context;

/// Parse a size string (e.g., "4k", "1M", "2G") into bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with('k') || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches('k'), 1024u64)
    } else if s.ends_with('m') || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches('m'), 1024 * 1024)
    } else if s.ends_with('g') || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches('g'), 1024 * 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Parse a block size, which must fit in memory as a single buffer
pub fn parse_block_size(s: &str) -> Result<usize> {
    let bytes = parse_size(s)?;
    usize::try_from(bytes).with_context(|| format!("Block size too large: {}", s))
}

pub fn convert_mode(cli_mode: CliMode) -> Mode {
    match cli_mode {
        CliMode::Rw => Mode::Both,
        CliMode::W => Mode::Write,
        CliMode::R => Mode::ReadVerify,
    }
}

pub fn convert_digest(cli_digest: CliDigest) -> DigestAlgorithm {
    match cli_digest {
        CliDigest::Sha256 => DigestAlgorithm::Sha256,
        CliDigest::Sha512 => DigestAlgorithm::Sha512,
    }
}
