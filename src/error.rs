//! Allocation errors.

use thiserror::Error;

/// The recoverable failure of an allocation request.
///
/// Only [`FixedBufferAllocator`](crate::FixedBufferAllocator) ever reports
/// [`AllocError::ExceedsCapacity`]. Running out of OS memory is not reported at
/// all: it aborts the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// A single request is larger than the allocator can ever hold.
    #[error("allocation of {requested} bytes exceeds buffer capacity of {capacity} bytes")]
    ExceedsCapacity {
        /// Requested bytes, after alignment.
        requested: usize,
        /// Total bytes the allocator owns.
        capacity: usize,
    },
    /// The byte size of a typed request does not fit in `usize`.
    #[error("allocation size overflows usize")]
    SizeOverflow,
}

/// Container operations have no way to continue without memory.
#[cold]
#[inline(never)]
pub(crate) fn alloc_failed(err: AllocError) -> ! {
    panic!("allocation failed: {}", err)
}
