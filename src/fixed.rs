use std::cell::Cell;
use std::fmt;
use std::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::config::{FixedBufferConfig, MIN_ALIGN};
use crate::error::AllocError;
use crate::memory::{self, block_size};

/// Scratch allocator over one bounded buffer that wraps around when it runs out.
///
/// The buffer is requested on the first allocation and sized to the larger of
/// the first request and the configured byte budget. A request that does not
/// fit in what is left of the buffer is served from the buffer start again,
/// overwriting whatever older allocations live there. A request larger than the
/// whole buffer fails with [`AllocError::ExceedsCapacity`].
///
/// Only the most recent allocation can be given back.
///
/// Good for short-lived values that are consumed right away, such as one
/// formatted string that is printed and forgotten.
pub struct FixedBufferAllocator {
    config: FixedBufferConfig,
    buffer: Cell<Option<NonNull<u8>>>,
    buffer_size: Cell<usize>,
    buffer_off: Cell<usize>,
    last_alloc: Cell<Option<NonNull<u8>>>,
}

impl FixedBufferAllocator {
    /// Creates an allocator with the default budget of five pages.
    ///
    /// # Safety
    ///
    /// Wrapping around hands out memory that older allocations still point to.
    /// The caller must make sure no value allocated here is used after enough
    /// later allocations have been made to wrap the buffer, and in particular that
    /// no two containers backed by this allocator are alive across a wrap.
    pub unsafe fn new() -> FixedBufferAllocator {
        FixedBufferAllocator::with_config(FixedBufferConfig::default())
    }

    /// # Safety
    ///
    /// See [`FixedBufferAllocator::new`].
    pub unsafe fn with_config(config: FixedBufferConfig) -> FixedBufferAllocator {
        FixedBufferAllocator {
            config,
            buffer: Cell::new(None),
            buffer_size: Cell::new(0),
            buffer_off: Cell::new(0),
            last_alloc: Cell::new(None),
        }
    }

    /// Size of the buffer, or `0` before the first allocation.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.get()
    }

    /// Bytes handed out since the buffer start or the last wrap.
    pub fn offset(&self) -> usize {
        self.buffer_off.get()
    }

    /// Releases the buffer. Same as dropping the allocator.
    pub fn free(self) {
        std::mem::drop(self)
    }

    fn buffer(&self, first_request: usize) -> Result<NonNull<u8>, AllocError> {
        if let Some(buffer) = self.buffer.get() {
            return Ok(buffer);
        }
        let size = self.config.buffer_size_for(first_request);
        let buffer = memory::alloc_pages(size)?;
        debug!("fixed buffer of {} bytes", size);
        self.buffer.set(Some(buffer));
        self.buffer_size.set(size);
        self.buffer_off.set(0);
        Ok(buffer)
    }
}

unsafe impl Allocator for FixedBufferAllocator {
    fn raw_alloc(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size > isize::MAX as usize - MIN_ALIGN {
            return Err(AllocError::SizeOverflow);
        }
        let size = block_size(size);
        let buffer = self.buffer(size)?;
        let buffer_size = self.buffer_size.get();

        if size > buffer_size {
            return Err(AllocError::ExceedsCapacity { requested: size, capacity: buffer_size });
        }

        let mut offset = self.buffer_off.get();
        if buffer_size - offset < size {
            debug!("fixed buffer wraps at offset {} for {} bytes", offset, size);
            offset = 0;
        }

        let ptr = unsafe { NonNull::new_unchecked(buffer.as_ptr().add(offset)) };
        self.buffer_off.set(offset + size);
        self.last_alloc.set(Some(ptr));
        Ok(ptr)
    }

    unsafe fn raw_dealloc(&self, ptr: NonNull<u8>, _size: usize) {
        if let (Some(last), Some(buffer)) = (self.last_alloc.get(), self.buffer.get()) {
            if last == ptr {
                self.buffer_off.set(ptr.as_ptr() as usize - buffer.as_ptr() as usize);
                self.last_alloc.set(None);
            }
        }
    }

    unsafe fn raw_resize(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        if let (Some(last), Some(buffer)) = (self.last_alloc.get(), self.buffer.get()) {
            if last == ptr && new_size <= self.buffer_size.get() {
                let start = ptr.as_ptr() as usize - buffer.as_ptr() as usize;
                let end = start + block_size(new_size);
                if end <= self.buffer_size.get() {
                    self.buffer_off.set(end);
                    return Ok(ptr);
                }
            }
        }

        let new_ptr = self.raw_alloc(new_size)?;
        // After a wrap the new block may overlap the old one.
        ptr::copy(ptr.as_ptr(), new_ptr.as_ptr(), old_size.min(new_size));
        Ok(new_ptr)
    }
}

impl Drop for FixedBufferAllocator {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            unsafe { memory::dealloc_pages(buffer, self.buffer_size.get()) };
        }
    }
}

impl fmt::Debug for FixedBufferAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBufferAllocator")
            .field("buffer_size", &self.buffer_size())
            .field("offset", &self.offset())
            .finish()
    }
}
