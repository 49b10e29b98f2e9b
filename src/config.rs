//! Platform constants and allocator configuration.

/// Size of an OS page.
pub const PAGE_SIZE: usize = 4096;

/// Granularity of every block requested from the OS.
#[cfg(windows)]
pub const PAGE_ALIGN: usize = 64 * 1024;
/// Granularity of every block requested from the OS.
#[cfg(not(windows))]
pub const PAGE_ALIGN: usize = PAGE_SIZE;

/// Every allocation handed out by the allocators in this crate is aligned to this.
pub const MIN_ALIGN: usize = std::mem::size_of::<*const u8>();

/// Configuration for [`ArenaAllocator`](crate::ArenaAllocator).
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Smallest region requested from the OS, rounded up to [`PAGE_ALIGN`].
    ///
    /// Larger requests get a region of their own size.
    pub min_region_size: usize,
}

impl ArenaConfig {
    /// One page per region unless a request needs more.
    pub const DEFAULT_MIN_REGION_SIZE: usize = PAGE_ALIGN;

    /// Region size actually requested for an allocation of `size` bytes.
    pub fn region_size_for(&self, size: usize) -> usize {
        crate::memory::align_up(size.max(self.min_region_size).max(1), PAGE_ALIGN)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            min_region_size: Self::DEFAULT_MIN_REGION_SIZE,
        }
    }
}

/// Configuration for [`FixedBufferAllocator`](crate::FixedBufferAllocator).
#[derive(Clone, Debug)]
pub struct FixedBufferConfig {
    /// Byte budget of the single buffer. The buffer is sized on first use to
    /// the larger of this and the first request, rounded up to [`PAGE_ALIGN`].
    pub byte_budget: usize,
}

impl FixedBufferConfig {
    /// Number of pages in the default budget.
    pub const DEFAULT_PAGE_COUNT: usize = 5;

    /// Buffer size for a first request of `first_request` bytes.
    pub fn buffer_size_for(&self, first_request: usize) -> usize {
        crate::memory::align_up(first_request.max(self.byte_budget).max(1), PAGE_ALIGN)
    }
}

impl Default for FixedBufferConfig {
    fn default() -> Self {
        FixedBufferConfig {
            byte_budget: PAGE_SIZE * Self::DEFAULT_PAGE_COUNT,
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn default_scratch_budget_is_five_pages() {
        let config = FixedBufferConfig::default();
        assert_eq!(config.byte_budget, 5 * PAGE_SIZE);
        assert_eq!(config.buffer_size_for(1), align_up_page(5 * PAGE_SIZE));
    }

    #[test]
    fn big_first_request_sizes_the_buffer() {
        let config = FixedBufferConfig { byte_budget: 16 };
        assert_eq!(config.buffer_size_for(PAGE_ALIGN + 1), 2 * PAGE_ALIGN);
    }

    #[test]
    fn region_is_at_least_one_page() {
        let config = ArenaConfig::default();
        assert_eq!(config.region_size_for(0), PAGE_ALIGN);
        assert_eq!(config.region_size_for(10), PAGE_ALIGN);
        assert_eq!(config.region_size_for(PAGE_ALIGN * 3), PAGE_ALIGN * 3);
    }

    fn align_up_page(size: usize) -> usize {
        crate::memory::align_up(size, PAGE_ALIGN)
    }
}
