//! Deterministic block content
//!
//! Block contents are a pure function of `(seed, block_size, index)`. A hash
//! state is keyed with the seed and the block index, then the buffer is filled
//! one digest-sized chunk at a time: each chunk is the current digest, and that
//! digest is fed back into the state before the next chunk is produced.
//!
//! The digest function is a strategy parameter ([`DigestAlgorithm`]) so a run
//! can trade chunk size against hashing cost without forking the algorithm.
//!
//! # Example
//!
//! ```
//! use blockstress::content::{ContentGenerator, DigestAlgorithm};
//!
//! let gen = ContentGenerator::new("abc", 64, DigestAlgorithm::Sha256);
//! let mut a = vec![0u8; 64];
//! let mut b = vec![0u8; 64];
//! gen.fill(2, &mut a);
//! gen.fill(2, &mut b);
//! assert_eq!(a, b);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::sync::Arc;

/// Hash function used to chain block content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, 32-byte chunks
    #[default]
    Sha256,
    /// SHA-512, 64-byte chunks
    Sha512,
}

impl DigestAlgorithm {
    /// Output length in bytes; block sizes must be a multiple of it
    pub fn digest_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => <Sha256 as Digest>::output_size(),
            DigestAlgorithm::Sha512 => <Sha512 as Digest>::output_size(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generates block contents for one seed and block size
///
/// Cheap to clone; every generator worker holds its own copy.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    seed: Arc<str>,
    block_size: usize,
    algorithm: DigestAlgorithm,
}

impl ContentGenerator {
    /// Create a generator
    ///
    /// `block_size` must already be validated as a multiple of
    /// `algorithm.digest_size()`.
    pub fn new(seed: &str, block_size: usize, algorithm: DigestAlgorithm) -> Self {
        debug_assert_eq!(block_size % algorithm.digest_size(), 0);
        Self {
            seed: Arc::from(seed),
            block_size,
            algorithm,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Fill `buf` with the contents of block `index`
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly one block long.
    pub fn fill(&self, index: u64, buf: &mut [u8]) {
        assert_eq!(buf.len(), self.block_size, "buffer must be exactly one block");
        match self.algorithm {
            DigestAlgorithm::Sha256 => fill_chained::<Sha256>(&self.seed, index, buf),
            DigestAlgorithm::Sha512 => fill_chained::<Sha512>(&self.seed, index, buf),
        }
    }

    /// Allocate and return the contents of block `index`
    pub fn block(&self, index: u64) -> Vec<u8> {
        let mut buf = vec![0u8; self.block_size];
        self.fill(index, &mut buf);
        buf
    }
}

/// Chained-digest fill for any fixed-output hash
///
/// The seed is length-prefixed so `("ab", 12)` and `("a", 212)` can never key
/// the same state.
fn fill_chained<D: Digest + Clone>(seed: &str, index: u64, buf: &mut [u8]) {
    let mut state = D::new();
    state.update((seed.len() as u64).to_le_bytes());
    state.update(seed.as_bytes());
    state.update(index.to_le_bytes());

    for chunk in buf.chunks_exact_mut(<D as Digest>::output_size()) {
        let digest = state.clone().finalize();
        chunk.copy_from_slice(&digest);
        state.update(&digest);
    }
}
