//! Target abstraction
//!
//! A target is the resource under test: a regular file or a raw block device.
//! The core only needs positioned reads and writes against it; it never
//! seeks, and a single consumer thread owns the handle for a whole run.
//!
//! # Target Types
//!
//! - **File**: regular files and block devices opened through the filesystem ([`file::FileTarget`])
//! - **Memory**: in-memory target with fault injection for tests ([`mock::MemoryTarget`])
//!
//! # Example
//!
//! ```no_run
//! use blockstress::target::{Target, OpenFlags};
//! use blockstress::target::file::FileTarget;
//! use std::path::Path;
//!
//! let mut target = FileTarget::open(Path::new("/dev/sdb"), OpenFlags::default())?;
//! let mut buf = vec![0u8; 4096];
//! let read = target.read_at(&mut buf, 0)?;
//! assert_eq!(read, buf.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod file;
pub mod mock;

use std::io;

/// Positioned IO against the resource under test
///
/// Each call issues one positioned transfer and returns how many bytes moved;
/// callers decide what a short count means. Implementations must not keep a
/// file cursor that other calls depend on.
pub trait Target: Send {
    /// Read into `buf` starting at byte `offset`
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write `buf` starting at byte `offset`
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Force written data to stable storage
    fn flush(&mut self) -> io::Result<()>;

    /// Size in bytes (device capacity or current file length)
    fn size(&self) -> u64;

    /// Whether the size is fixed (block devices cannot grow)
    fn is_fixed_size(&self) -> bool {
        false
    }
}

/// Flags applied when opening a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Use O_DIRECT (bypass page cache)
    pub direct: bool,
    /// Use O_SYNC (synchronous writes)
    pub sync: bool,
}
