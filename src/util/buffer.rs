//! Aligned block buffers
//!
//! Block buffers are allocated on a page boundary so the same buffer can be
//! handed to an `O_DIRECT` target without a bounce copy.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;

/// Alignment used for every block buffer
pub const BUFFER_ALIGNMENT: usize = 4096;

/// Memory-aligned, zero-initialized byte buffer
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Create a new zeroed buffer of `size` bytes aligned to `alignment`
    ///
    /// # Panics
    /// Panics if alignment is not a power of 2, if size is 0, or if allocation fails
    pub fn new(size: usize, alignment: usize) -> Self {
        assert!(alignment.is_power_of_two(), "Alignment must be a power of 2");
        assert!(size > 0, "Buffer size must be greater than 0");

        let layout = Layout::from_size_align(size, alignment)
            .expect("Invalid layout parameters");

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }

        AlignedBuffer { ptr, size, layout }
    }

    /// Buffer of one block with the default alignment
    pub fn for_block(block_size: usize) -> Self {
        Self::new(block_size, BUFFER_ALIGNMENT)
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `size` initialized bytes for the life of self.
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.layout.align() == 0
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout.
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("size", &self.size)
            .field("alignment", &self.layout.align())
            .finish()
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}
