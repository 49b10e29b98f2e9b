//! The allocation capability every container is built on.

use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

use crate::config::MIN_ALIGN;
use crate::error::AllocError;

/// A strategy that hands out raw memory blocks.
///
/// Containers take a `&A` where `A: Allocator + ?Sized` and never look past this
/// trait, so any strategy (or a `&dyn Allocator`) can back any container.
/// Methods take `&self`: one allocator is shared by many containers, and
/// strategies keep their bookkeeping in `Cell`s. No strategy is `Sync`.
///
/// # Safety
///
/// Implementations must return blocks that are aligned to at least
/// [`MIN_ALIGN`], valid for reads and writes of the requested size, and not
/// overlapping any other live block, for as long as the allocator is not
/// mutably borrowed, moved or dropped, and the block was not passed to
/// `raw_dealloc`/`raw_resize`.
pub unsafe trait Allocator {
    /// Allocates `size` bytes.
    fn raw_alloc(&self, size: usize) -> Result<NonNull<u8>, AllocError>;

    /// Gives back a block. Strategies are free to ignore this.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this allocator and `size` must be the size it was
    /// requested with.
    unsafe fn raw_dealloc(&self, ptr: NonNull<u8>, size: usize);

    /// Moves a block to a block of `new_size` bytes, preserving the first
    /// `min(old_size, new_size)` bytes.
    ///
    /// # Safety
    ///
    /// Same as [`Allocator::raw_dealloc`] for `ptr` and `old_size`. On success the
    /// old block must not be used again.
    unsafe fn raw_resize(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let new_ptr = self.raw_alloc(new_size)?;
        ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size.min(new_size));
        self.raw_dealloc(ptr, old_size);
        Ok(new_ptr)
    }
}

unsafe impl<'a, A: Allocator + ?Sized> Allocator for &'a A {
    #[inline(always)]
    fn raw_alloc(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        (**self).raw_alloc(size)
    }

    #[inline(always)]
    unsafe fn raw_dealloc(&self, ptr: NonNull<u8>, size: usize) {
        (**self).raw_dealloc(ptr, size)
    }

    #[inline(always)]
    unsafe fn raw_resize(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        (**self).raw_resize(ptr, old_size, new_size)
    }
}

#[inline(always)]
fn bytes_for<T>(count: usize) -> Result<usize, AllocError> {
    assert!(
        align_of::<T>() <= MIN_ALIGN,
        "type alignment {} exceeds allocator alignment {}",
        align_of::<T>(),
        MIN_ALIGN
    );
    size_of::<T>().checked_mul(count).ok_or(AllocError::SizeOverflow)
}

/// Element-typed helpers, available on every [`Allocator`] including `dyn Allocator`.
pub trait AllocatorExt: Allocator {
    /// Allocates uninitialized room for `count` values of `T`.
    ///
    /// Panics if `T` needs more alignment than [`MIN_ALIGN`].
    #[inline]
    fn alloc<T>(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        let bytes = bytes_for::<T>(count)?;
        Ok(self.raw_alloc(bytes)?.cast())
    }

    /// Gives back room for `count` values of `T`. Values are not dropped.
    ///
    /// # Safety
    ///
    /// See [`Allocator::raw_dealloc`].
    #[inline]
    unsafe fn dealloc<T>(&self, ptr: NonNull<T>, count: usize) {
        let bytes = size_of::<T>() * count;
        self.raw_dealloc(ptr.cast(), bytes)
    }

    /// Moves room for `old_count` values of `T` to room for `new_count` values,
    /// keeping the first `min(old_count, new_count)` values.
    ///
    /// # Safety
    ///
    /// See [`Allocator::raw_resize`].
    #[inline]
    unsafe fn resize<T>(
        &self,
        ptr: NonNull<T>,
        old_count: usize,
        new_count: usize,
    ) -> Result<NonNull<T>, AllocError> {
        let old_bytes = bytes_for::<T>(old_count)?;
        let new_bytes = bytes_for::<T>(new_count)?;
        Ok(self.raw_resize(ptr.cast(), old_bytes, new_bytes)?.cast())
    }

    /// Copies `bytes` into a fresh block followed by a `0` byte.
    fn strdup(&self, bytes: &[u8]) -> Result<NonNull<u8>, AllocError> {
        let len = bytes.len().checked_add(1).ok_or(AllocError::SizeOverflow)?;
        let ptr = self.alloc::<u8>(len)?;
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            *ptr.as_ptr().add(bytes.len()) = 0;
        }
        Ok(ptr)
    }
}

impl<A: Allocator + ?Sized> AllocatorExt for A {}
