use std::borrow::Borrow;
use std::fmt;

use crate::allocator::Allocator;
use crate::hash::Hash;
use crate::table::Table;

/// Open-addressing hash set. A [`Table`] whose values take no space, so it
/// probes, grows and iterates exactly like one.
pub struct Set<'a, T, A: Allocator + ?Sized> {
    table: Table<'a, T, (), A>,
}

impl<'a, T, A: Allocator + ?Sized> Set<'a, T, A> {
    pub const DEFAULT_CAPACITY: usize = Table::<'a, T, (), A>::DEFAULT_CAPACITY;

    pub fn new(allocator: &'a A) -> Self {
        Set { table: Table::new(allocator) }
    }

    pub fn alloc(allocator: &'a A, capacity: usize) -> Self {
        Set { table: Table::alloc(allocator, capacity) }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    #[inline]
    pub fn load_percentage(&self) -> usize {
        self.table.load_percentage()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.table.keys()
    }
}

impl<'a, T: Hash + Eq, A: Allocator + ?Sized> Set<'a, T, A> {
    /// Adds `item`, growing first when the set is at 70% load. Adding an item
    /// that is already present changes nothing.
    pub fn put(&mut self, item: T) {
        self.table.put(item, ())
    }

    pub fn has<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.has(item)
    }
}

impl<'a, T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for Set<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
