//! Disk IO driver
//!
//! Moves whole blocks between buffers and the target at `index * block_size`.
//! A transfer either moves the full block or fails the run: a transport error
//! or a positioned call that stops short is reported with the block index and
//! never retried. Only `EINTR` is re-issued, since it is not a transfer result.
//!
//! The driver is used by the single consumer thread and owns the one read
//! buffer the verify phase needs.

use crate::config::RunConfig;
use crate::error::{StressError, TransferOp};
use crate::target::Target;
use crate::util::buffer::AlignedBuffer;
use crate::util::verification::verify_block;
use std::io;

/// Block-granular driver over a borrowed target
pub struct DiskDriver<'a> {
    target: &'a mut dyn Target,
    block_size: usize,
    read_buffer: Option<AlignedBuffer>,
}

impl<'a> DiskDriver<'a> {
    pub fn new(target: &'a mut dyn Target, config: &RunConfig) -> Self {
        Self {
            target,
            block_size: config.block_size,
            read_buffer: None,
        }
    }

    #[inline]
    fn offset_of(&self, block: u64) -> u64 {
        block * self.block_size as u64
    }

    /// Write one block of content at its block offset
    pub fn write_block(&mut self, block: u64, content: &[u8]) -> Result<(), StressError> {
        debug_assert_eq!(content.len(), self.block_size);
        let offset = self.offset_of(block);
        let target = &mut *self.target;
        transfer(TransferOp::Write, block, offset, content.len(), |done| {
            target.write_at(&content[done..], offset + done as u64)
        })
    }

    /// Read one block into the driver's read buffer and return it
    pub fn read_block(&mut self, block: u64) -> Result<&[u8], StressError> {
        let offset = self.offset_of(block);
        let block_size = self.block_size;
        let buffer = self
            .read_buffer
            .get_or_insert_with(|| AlignedBuffer::for_block(block_size));
        let target = &mut *self.target;
        {
            let slice = buffer.as_mut_slice();
            transfer(TransferOp::Read, block, offset, block_size, |done| {
                target.read_at(&mut slice[done..], offset + done as u64)
            })?;
        }
        Ok(buffer.as_slice())
    }

    /// Read one block and compare it byte for byte with `expected`
    pub fn verify_block(&mut self, block: u64, expected: &[u8]) -> Result<(), StressError> {
        let actual = self.read_block(block)?;
        verify_block(block, expected, actual)
    }

    /// Force completed writes to stable storage
    pub fn flush(&mut self) -> Result<(), StressError> {
        self.target.flush().map_err(StressError::Flush)
    }
}

/// Drive one positioned transfer to completion
///
/// `step` is called with the number of bytes already moved and returns what
/// the next positioned call moved. A zero return before `length` bytes have
/// moved is a short transfer.
fn transfer<F>(
    op: TransferOp,
    block: u64,
    offset: u64,
    length: usize,
    mut step: F,
) -> Result<(), StressError>
where
    F: FnMut(usize) -> io::Result<usize>,
{
    let mut done = 0;
    while done < length {
        match step(done) {
            Ok(0) => {
                return Err(StressError::Transfer {
                    op,
                    block,
                    offset,
                    transferred: done,
                    expected: length,
                })
            }
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(StressError::Io {
                    op,
                    block,
                    offset,
                    source,
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::content::DigestAlgorithm;
    use crate::target::mock::MemoryTarget;

    fn config() -> RunConfig {
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
    fn test_write_then_read_round_trip() {
        let config = config();
        let generator = config.generator();
        let mut target = MemoryTarget::new(0);
        let mut driver = DiskDriver::new(&mut target, &config);

        let content = generator.block(2);
        driver.write_block(2, &content).unwrap();
        assert_eq!(driver.read_block(2).unwrap(), &content[..]);
        driver.verify_block(2, &content).unwrap();

        assert_eq!(&target.data()[128..192], &content[..]);
    }

    #[test]
    fn test_offsets_are_block_aligned() {
        let config = config();
        let mut target = MemoryTarget::new(256);
        let mut driver = DiskDriver::new(&mut target, &config);
        for block in 0..4 {
            driver.write_block(block, &[0u8; 64]).unwrap();
        }
        let offsets: Vec<u64> = target.operations().iter().map(|op| op.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128, 192]);
    }

    #[test]
    fn test_short_write_is_fatal() {
        let config = config();
        let mut target = MemoryTarget::fixed(100);
        let mut driver = DiskDriver::new(&mut target, &config);

        driver.write_block(0, &[1u8; 64]).unwrap();
        match driver.write_block(1, &[1u8; 64]).unwrap_err() {
            StressError::Transfer { op, block, offset, transferred, expected } => {
                assert_eq!(op, TransferOp::Write);
                assert_eq!(block, 1);
                assert_eq!(offset, 64);
                assert_eq!(transferred, 36);
                assert_eq!(expected, 64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_read_is_fatal() {
        let config = config();
        let mut target = MemoryTarget::new(160);
        let mut driver = DiskDriver::new(&mut target, &config);

        match driver.read_block(2).unwrap_err() {
            StressError::Transfer { op, block, transferred, .. } => {
                assert_eq!(op, TransferOp::Read);
                assert_eq!(block, 2);
                assert_eq!(transferred, 32);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_io_error_is_fatal() {
        let config = config();
        let mut target = MemoryTarget::new(256);
        target.fail_at(TransferOp::Read, 192);
        let mut driver = DiskDriver::new(&mut target, &config);

        let err = driver.read_block(3).unwrap_err();
        assert!(matches!(err, StressError::Io { op: TransferOp::Read, block: 3, .. }));
    }

    #[test]
    fn test_interrupted_call_is_reissued() {
        let config = config();
        let mut target = MemoryTarget::new(256);
        target.interrupt_next(2);
        let mut driver = DiskDriver::new(&mut target, &config);

        driver.write_block(0, &[9u8; 64]).unwrap();
        assert_eq!(&target.data()[..64], &[9u8; 64]);
    }

    #[test]
    fn test_verify_reports_block_and_byte() {
        let config = config();
        let generator = config.generator();
        let mut target = MemoryTarget::new(0);
        let mut driver = DiskDriver::new(&mut target, &config);
        driver.write_block(1, &generator.block(1)).unwrap();
        drop(driver);

        target.flip_byte(64 + 5);
        let mut driver = DiskDriver::new(&mut target, &config);
        match driver.verify_block(1, &generator.block(1)).unwrap_err() {
            StressError::VerificationMismatch { block, byte_offset, .. } => {
                assert_eq!(block, 1);
                assert_eq!(byte_offset, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_flush_reaches_target() {
        let config = config();
        let mut target = MemoryTarget::new(0);
        let mut driver = DiskDriver::new(&mut target, &config);
        driver.flush().unwrap();
        assert_eq!(target.flush_count(), 1);
    }
}
