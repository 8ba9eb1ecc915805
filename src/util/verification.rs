//! Block verification
//!
//! Compares bytes read back from the target against the regenerated
//! expectation. Equality must be exact: the first differing byte fails the
//! block.

use crate::error::StressError;

/// Verification result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// Data matches expected content
    Success,
    /// Data does not match expected content
    Failure {
        /// Offset of first mismatch within the block
        offset: usize,
        /// Expected value
        expected: u8,
        /// Actual value
        actual: u8,
    },
}

/// Compare `actual` against `expected` byte for byte
///
/// A length difference is reported at the first offset past the shorter buffer.
pub fn compare_buffers(expected: &[u8], actual: &[u8]) -> VerificationResult {
    // Fast path: slice equality is vectorized
    if expected == actual {
        return VerificationResult::Success;
    }

    if let Some((offset, (&e, &a))) = expected
        .iter()
        .zip(actual.iter())
        .enumerate()
        .find(|(_, (e, a))| e != a)
    {
        return VerificationResult::Failure {
            offset,
            expected: e,
            actual: a,
        };
    }

    let offset = expected.len().min(actual.len());
    VerificationResult::Failure {
        offset,
        expected: expected.get(offset).copied().unwrap_or(0),
        actual: actual.get(offset).copied().unwrap_or(0),
    }
}

/// Verify block `block`, turning a mismatch into a fatal error
pub fn verify_block(block: u64, expected: &[u8], actual: &[u8]) -> Result<(), StressError> {
    match compare_buffers(expected, actual) {
        VerificationResult::Success => Ok(()),
        VerificationResult::Failure {
            offset,
            expected,
            actual,
        } => Err(StressError::VerificationMismatch {
            block,
            byte_offset: offset,
            expected,
            actual,
        }),
    }
}
