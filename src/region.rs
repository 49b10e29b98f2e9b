use std::ptr::NonNull;

use crate::config::MIN_ALIGN;
use crate::error::AllocError;
use crate::memory::{self, align_up};

/// One OS-backed block that the arena bumps through.
///
/// The header lives in the arena's header list, the bytes live in their own
/// page block, so moving the header never moves memory handed out from it.
pub(crate) struct Region {
    data: NonNull<u8>,
    size: usize,
    offset: usize,
    /// Creation order within the owning arena.
    serial: usize,
}

impl Region {
    /// `size` must be a non-zero multiple of the page alignment.
    pub fn new(size: usize, serial: usize) -> Result<Region, AllocError> {
        let data = memory::alloc_pages(size)?;
        trace!("-- init   region #{} of size {}", serial, size);
        Ok(Region { data, size, offset: 0, serial })
    }

    #[inline(always)]
    pub fn serial(&self) -> usize {
        self.serial
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn avail(&self) -> usize {
        debug_assert!(self.offset <= self.size, "region offset past its end");
        self.size - self.offset
    }

    /// Hands out `size` bytes (already aligned) or `None` if they do not fit.
    #[inline]
    pub fn bump(&mut self, size: usize) -> Option<NonNull<u8>> {
        debug_assert_eq!(size % MIN_ALIGN, 0, "bump size must be pre-aligned");
        if self.avail() < size {
            return None;
        }
        let ptr = unsafe { NonNull::new_unchecked(self.data.as_ptr().add(self.offset)) };
        self.offset += size;
        Some(ptr)
    }

    /// Byte offset of `ptr` inside this region's data.
    #[inline(always)]
    pub fn offset_of(&self, ptr: NonNull<u8>) -> usize {
        let offset = ptr.as_ptr() as usize - self.data.as_ptr() as usize;
        debug_assert!(offset <= self.size, "pointer does not belong to this region");
        offset
    }

    /// Moves the bump offset so that the allocation starting at `ptr` ends after
    /// `size` bytes. Returns `false` when the region is too small for that.
    pub fn set_end(&mut self, ptr: NonNull<u8>, size: usize) -> bool {
        let start = self.offset_of(ptr);
        if size > self.size - start {
            return false;
        }
        let end = start + align_up(size, MIN_ALIGN);
        if end > self.size {
            return false;
        }
        self.offset = end;
        true
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Returns the data block to the OS.
    ///
    /// # Safety
    ///
    /// Nothing handed out from this region may be used afterwards.
    pub unsafe fn release(self) {
        memory::dealloc_pages(self.data, self.size);
    }
}
