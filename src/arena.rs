use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::fmt;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::config::{ArenaConfig, MIN_ALIGN, PAGE_SIZE};
use crate::error::AllocError;
use crate::memory::block_size;
use crate::region::Region;

/// How many region headers fit in one page. The header list grows by this many
/// entries at a time.
const HEADERS_PER_POOL_PAGE: usize = PAGE_SIZE / size_of::<Region>();

#[derive(Clone, Copy)]
struct LastAlloc {
    region: usize,
    ptr: NonNull<u8>,
}

/// Region allocator: bumps through a chain of OS-backed regions and never frees
/// individual allocations.
///
/// Requests are served from the most recently added region that still has room,
/// otherwise a new region is added. Only the most recent allocation can be given
/// back (or resized in place); everything else stays until [`reset`](ArenaAllocator::reset)
/// or until the arena is dropped.
///
/// Resetting needs `&mut self`, so it is impossible while any container still
/// borrows the arena. Raw pointers obtained from [`Allocator::raw_alloc`] are not
/// tracked: after a reset they point to memory that will be handed out again.
pub struct ArenaAllocator {
    config: ArenaConfig,
    /// Region headers; the last entry is the head of the chain.
    regions: RefCell<Vec<Region>>,
    last_alloc: Cell<Option<LastAlloc>>,
}

impl ArenaAllocator {
    /// Creates an empty arena. No memory is requested until the first allocation.
    pub fn new() -> ArenaAllocator {
        ArenaAllocator::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> ArenaAllocator {
        ArenaAllocator {
            config,
            regions: RefCell::new(Vec::new()),
            last_alloc: Cell::new(None),
        }
    }

    /// Bytes still free across all regions. A single allocation can only use
    /// the free bytes of one region.
    pub fn avail(&self) -> usize {
        self.regions.borrow().iter().map(Region::avail).sum()
    }

    /// Total bytes owned across all regions.
    pub fn capacity(&self) -> usize {
        self.regions.borrow().iter().map(Region::size).sum()
    }

    pub fn region_count(&self) -> usize {
        self.regions.borrow().len()
    }

    /// Makes sure at least `bytes` are free in total, adding one region for the
    /// shortfall if needed.
    pub fn reserve(&self, bytes: usize) -> Result<(), AllocError> {
        let avail = self.avail();
        if avail < bytes {
            self.push_region(bytes - avail)?;
        }
        Ok(())
    }

    /// Makes every region empty again without returning memory to the OS.
    ///
    /// The bytes are left as they are. The chain is put back in creation order,
    /// oldest region at the head, so the same sequence of requests after a reset
    /// gets the same addresses as it did on a fresh arena.
    pub fn reset(&mut self) {
        let regions = self.regions.get_mut();
        debug!("reset arena with {} regions", regions.len());
        for region in regions.iter_mut() {
            region.reset();
        }
        regions.sort_unstable_by_key(|region| Reverse(region.serial()));
        self.last_alloc.set(None);
    }

    /// Returns every region to the OS. Same as dropping the arena.
    pub fn free(self) {
        std::mem::drop(self)
    }

    fn push_region(&self, size: usize) -> Result<usize, AllocError> {
        let mut regions = self.regions.borrow_mut();
        let region = Region::new(self.config.region_size_for(size), regions.len())?;
        if regions.len() == regions.capacity() {
            regions.reserve_exact(HEADERS_PER_POOL_PAGE);
        }
        regions.push(region);
        Ok(regions.len() - 1)
    }
}

impl Default for ArenaAllocator {
    fn default() -> Self {
        ArenaAllocator::new()
    }
}

unsafe impl Allocator for ArenaAllocator {
    /// Bumps the first region with room, scanning from the head of the chain.
    ///
    /// Until the first [`reset`](ArenaAllocator::reset) the head is the most
    /// recently added region. A reset puts the oldest region at the head, so the
    /// scan then starts from the oldest one.
    ///
    /// Every block takes at least [`MIN_ALIGN`] bytes, including empty ones, so
    /// no two live blocks start at the same address.
    fn raw_alloc(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size > isize::MAX as usize - MIN_ALIGN {
            return Err(AllocError::SizeOverflow);
        }
        let size = block_size(size);

        {
            let mut regions = self.regions.borrow_mut();
            for (index, region) in regions.iter_mut().enumerate().rev() {
                if let Some(ptr) = region.bump(size) {
                    self.last_alloc.set(Some(LastAlloc { region: index, ptr }));
                    return Ok(ptr);
                }
            }
        }

        let index = self.push_region(size)?;
        let ptr = self.regions.borrow_mut()[index]
            .bump(size)
            .expect("fresh region fits the request it was sized for");
        self.last_alloc.set(Some(LastAlloc { region: index, ptr }));
        Ok(ptr)
    }

    unsafe fn raw_dealloc(&self, ptr: NonNull<u8>, _size: usize) {
        if let Some(last) = self.last_alloc.get() {
            if last.ptr == ptr {
                self.regions.borrow_mut()[last.region].set_end(ptr, 0);
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
        if new_size > isize::MAX as usize - MIN_ALIGN {
            return Err(AllocError::SizeOverflow);
        }
        let last = self.last_alloc.get().filter(|last| last.ptr == ptr);
        if let Some(last) = last {
            if self.regions.borrow_mut()[last.region].set_end(ptr, block_size(new_size)) {
                return Ok(ptr);
            }
        }

        let new_ptr = self.raw_alloc(new_size)?;
        ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size.min(new_size));
        // The old block did not fit its region's tail, so the copy landed in
        // another region and the tail can be given back.
        if let Some(last) = last {
            self.regions.borrow_mut()[last.region].set_end(ptr, 0);
        }
        Ok(new_ptr)
    }
}

impl Drop for ArenaAllocator {
    fn drop(&mut self) {
        let regions = std::mem::take(self.regions.get_mut());
        debug!("release arena with {} regions", regions.len());
        for region in regions {
            unsafe { region.release() };
        }
    }
}

impl fmt::Debug for ArenaAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("regions", &self.region_count())
            .field("capacity", &self.capacity())
            .field("avail", &self.avail())
            .finish()
    }
}
