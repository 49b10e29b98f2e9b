//! OS-backed page blocks and alignment arithmetic.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::config::{MIN_ALIGN, PAGE_ALIGN};
use crate::error::AllocError;

/// Rounds `size` up to the next multiple of `align`, which must be a power of two.
#[inline(always)]
pub const fn align_up(size: usize, align: usize) -> usize {
    size + ((align - (size & (align - 1))) & (align - 1))
}

/// Rounds `size` down to the previous multiple of `align`, which must be a power of two.
#[inline(always)]
pub const fn align_down(size: usize, align: usize) -> usize {
    size - (size & (align - 1))
}

/// Bytes a request of `size` takes from a bump allocator: at least one
/// [`MIN_ALIGN`] unit, so an empty block still has an address of its own.
#[inline(always)]
pub(crate) const fn block_size(size: usize) -> usize {
    if size == 0 {
        MIN_ALIGN
    } else {
        align_up(size, MIN_ALIGN)
    }
}

fn page_layout(size: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(size, PAGE_ALIGN).map_err(|_| AllocError::SizeOverflow)
}

/// Requests a zeroed, [`PAGE_ALIGN`]-aligned block of `size` bytes.
///
/// `size` must be a non-zero multiple of [`PAGE_ALIGN`]. Running out of OS memory
/// aborts the process.
pub(crate) fn alloc_pages(size: usize) -> Result<NonNull<u8>, AllocError> {
    debug_assert!(size > 0 && size % PAGE_ALIGN == 0, "page block size {} is not page aligned", size);
    let layout = page_layout(size)?;
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    match NonNull::new(ptr) {
        Some(ptr) => {
            trace!("-- take   pages of size {}", size);
            Ok(ptr)
        }
        None => alloc::handle_alloc_error(layout),
    }
}

/// Returns a block obtained from [`alloc_pages`].
///
/// # Safety
///
/// `ptr` and `size` must be exactly what `alloc_pages` was called with and returned,
/// and the block must not be used afterwards.
pub(crate) unsafe fn dealloc_pages(ptr: NonNull<u8>, size: usize) {
    trace!("-- return pages of size {}", size);
    let layout = Layout::from_size_align_unchecked(size, PAGE_ALIGN);
    alloc::dealloc(ptr.as_ptr(), layout);
}
