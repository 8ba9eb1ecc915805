//! In-memory target for testing
//!
//! Behaves like a small file or device held in memory, records every
//! positioned operation, and can inject the faults the driver has to treat as
//! fatal: transport errors, short transfers at the end of a fixed-size device,
//! and bytes that change between the write and read phases.
//!
//! # Example
//!
//! ```
//! use blockstress::target::Target;
//! use blockstress::target::mock::MemoryTarget;
//!
//! let mut target = MemoryTarget::new(128);
//! target.write_at(&[1, 2, 3], 64).unwrap();
//!
//! let mut buf = [0u8; 3];
//! target.read_at(&mut buf, 64).unwrap();
//! assert_eq!(buf, [1, 2, 3]);
//! assert_eq!(target.operations().len(), 2);
//! ```

use super::Target;
use crate::error::TransferOp;
use std::io;

/// Record of a positioned operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub op: TransferOp,
    pub offset: u64,
    pub length: usize,
}

/// In-memory target with fault injection
#[derive(Debug, Default)]
pub struct MemoryTarget {
    data: Vec<u8>,
    fixed_size: bool,
    operations: Vec<OperationRecord>,
    fail_at: Option<(TransferOp, u64)>,
    interrupts: usize,
    corrupt_on_read: Option<u64>,
    flushes: usize,
}

impl MemoryTarget {
    /// Growable target, like a regular file of `size` zero bytes
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
            ..Default::default()
        }
    }

    /// Fixed-size target, like a block device: transfers past the end come up short
    pub fn fixed(size: usize) -> Self {
        Self {
            fixed_size: true,
            ..Self::new(size)
        }
    }

    /// Fail the first `op` that starts at `offset` with an IO error
    pub fn fail_at(&mut self, op: TransferOp, offset: u64) {
        self.fail_at = Some((op, offset));
    }

    /// Return `EINTR` from the next `count` operations
    pub fn interrupt_next(&mut self, count: usize) {
        self.interrupts = count;
    }

    /// Flip the byte at `offset` just before the first read is served
    pub fn corrupt_before_first_read(&mut self, offset: u64) {
        self.corrupt_on_read = Some(offset);
    }

    /// Flip all bits of the byte at `offset`
    pub fn flip_byte(&mut self, offset: u64) {
        self.data[offset as usize] ^= 0xff;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn inject(&mut self, op: TransferOp, offset: u64) -> io::Result<()> {
        if self.interrupts > 0 {
            self.interrupts -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        if self.fail_at == Some((op, offset)) {
            self.fail_at = None;
            return Err(io::Error::new(io::ErrorKind::Other, "injected IO error"));
        }
        Ok(())
    }
}

impl Target for MemoryTarget {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.inject(TransferOp::Read, offset)?;
        if let Some(corrupt) = self.corrupt_on_read.take() {
            self.flip_byte(corrupt);
        }
        self.operations.push(OperationRecord {
            op: TransferOp::Read,
            offset,
            length: buf.len(),
        });

        let start = (offset as usize).min(self.data.len());
        let end = (start + buf.len()).min(self.data.len());
        let count = end - start;
        buf[..count].copy_from_slice(&self.data[start..end]);
        Ok(count)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.inject(TransferOp::Write, offset)?;
        self.operations.push(OperationRecord {
            op: TransferOp::Write,
            offset,
            length: buf.len(),
        });

        let start = offset as usize;
        let mut end = start + buf.len();
        if end > self.data.len() {
            if self.fixed_size {
                end = self.data.len().max(start);
            } else {
                self.data.resize(end, 0);
            }
        }
        let count = end.saturating_sub(start);
        if count > 0 {
            self.data[start..end].copy_from_slice(&buf[..count]);
        }
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn is_fixed_size(&self) -> bool {
        self.fixed_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growable_write_extends() {
        let mut target = MemoryTarget::new(0);
        assert_eq!(target.write_at(&[7u8; 16], 32).unwrap(), 16);
        assert_eq!(target.size(), 48);
        assert_eq!(&target.data()[32..48], &[7u8; 16]);
    }

    #[test]
    fn test_fixed_write_comes_up_short() {
        let mut target = MemoryTarget::fixed(40);
        assert_eq!(target.write_at(&[7u8; 16], 32).unwrap(), 8);
        assert_eq!(target.write_at(&[7u8; 16], 48).unwrap(), 0);
        assert_eq!(target.size(), 40);
    }

    #[test]
    fn test_read_past_end_is_short() {
        let mut target = MemoryTarget::new(10);
        let mut buf = [0u8; 8];
        assert_eq!(target.read_at(&mut buf, 6).unwrap(), 4);
        assert_eq!(target.read_at(&mut buf, 20).unwrap(), 0);
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut target = MemoryTarget::new(64);
        target.fail_at(TransferOp::Write, 32);
        assert!(target.write_at(&[1u8; 8], 0).is_ok());
        assert!(target.write_at(&[1u8; 8], 32).is_err());
        assert!(target.write_at(&[1u8; 8], 32).is_ok());
    }

    #[test]
    fn test_interrupts() {
        let mut target = MemoryTarget::new(64);
        target.interrupt_next(1);
        let err = target.write_at(&[1u8; 8], 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert!(target.write_at(&[1u8; 8], 0).is_ok());
        assert_eq!(target.operations().len(), 1);
    }

    #[test]
    fn test_corrupt_before_first_read() {
        let mut target = MemoryTarget::new(4);
        target.corrupt_before_first_read(2);
        assert_eq!(target.data()[2], 0);

        let mut buf = [0u8; 4];
        target.read_at(&mut buf, 0).unwrap();
        assert_eq!(buf, [0, 0, 0xff, 0]);

        // Only the first read flips it
        target.read_at(&mut buf, 0).unwrap();
        assert_eq!(buf[2], 0xff);
    }
}
