use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::allocator::{Allocator, AllocatorExt};
use crate::error::{alloc_failed, AllocError};

/// Returned by the `find_index` functions when nothing matches.
pub const NOT_FOUND: usize = usize::MAX;

/// Capacity a full list of `capacity` grows to: roughly 1.5x.
#[inline(always)]
pub const fn grow_capacity(capacity: usize) -> usize {
    ((capacity + 1) * 3) >> 1
}

/// Growable contiguous sequence whose buffer comes from an injected allocator.
///
/// When full, a push moves the items to a buffer of [`grow_capacity`] slots via
/// the allocator's `resize`. The list never gives its memory back on its own;
/// dropping it only drops the items, the bytes belong to the allocator.
///
/// Allocation failures panic, except in the `try_` functions.
pub struct List<'a, T, A: Allocator + ?Sized> {
    items: NonNull<T>,
    count: usize,
    capacity: usize,
    allocator: &'a A,
    _marker: PhantomData<T>,
}

impl<'a, T, A: Allocator + ?Sized> List<'a, T, A> {
    pub const DEFAULT_CAPACITY: usize = 7;

    /// A list with room for [`List::DEFAULT_CAPACITY`] items.
    pub fn new(allocator: &'a A) -> Self {
        List::alloc(allocator, Self::DEFAULT_CAPACITY)
    }

    pub fn alloc(allocator: &'a A, capacity: usize) -> Self {
        List::try_alloc(allocator, capacity).unwrap_or_else(|e| alloc_failed(e))
    }

    pub fn try_alloc(allocator: &'a A, capacity: usize) -> Result<Self, AllocError> {
        let items = allocator.alloc::<T>(capacity)?;
        Ok(List { items, count: 0, capacity, allocator, _marker: PhantomData })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn allocator(&self) -> &'a A {
        self.allocator
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.items.as_ptr(), self.count) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.items.as_ptr(), self.count) }
    }

    #[inline(always)]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.items.as_ptr()
    }

    pub fn push(&mut self, item: T) {
        self.try_push(item).unwrap_or_else(|e| alloc_failed(e))
    }

    /// Appends `item`, growing first if the list is full. On failure the list is
    /// unchanged and `item` is dropped.
    pub fn try_push(&mut self, item: T) -> Result<(), AllocError> {
        if self.count == self.capacity {
            self.try_reserve(grow_capacity(self.capacity))?;
        }
        unsafe { self.items.as_ptr().add(self.count).write(item) };
        self.count += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        Some(unsafe { self.items.as_ptr().add(self.count).read() })
    }

    /// Removes the item at `index`, shifting everything after it one slot left.
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(index < self.count, "remove index {} out of bounds for length {}", index, self.count);
        unsafe {
            let slot = self.items.as_ptr().add(index);
            let item = slot.read();
            ptr::copy(slot.add(1), slot, self.count - index - 1);
            self.count -= 1;
            item
        }
    }

    /// Grows the buffer to exactly `new_capacity` slots. Smaller values do nothing.
    pub fn reserve(&mut self, new_capacity: usize) {
        self.try_reserve(new_capacity).unwrap_or_else(|e| alloc_failed(e))
    }

    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        if new_capacity <= self.capacity {
            return Ok(());
        }
        self.items = unsafe { self.allocator.resize(self.items, self.capacity, new_capacity)? };
        self.capacity = new_capacity;
        Ok(())
    }

    /// Moves every item of `other` to the end of this list.
    pub fn extend<B: Allocator + ?Sized>(&mut self, mut other: List<'_, T, B>) {
        self.reserve(self.count + other.count);
        unsafe {
            ptr::copy_nonoverlapping(other.items.as_ptr(), self.items.as_ptr().add(self.count), other.count);
        }
        self.count += other.count;
        other.count = 0;
    }

    pub fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.reserve(self.count + items.len());
        for item in items {
            self.push(item.clone());
        }
    }

    /// Copies items `start..end` into a new list from the same allocator.
    pub fn copy(&self, start: usize, end: usize) -> List<'a, T, A>
    where
        T: Clone,
    {
        assert!(end >= start, "copy range end {} is before start {}", end, start);
        assert!(end <= self.count, "copy range end {} out of bounds for length {}", end, self.count);
        let mut result = List::alloc(self.allocator, end - start);
        for item in &self.as_slice()[start..end] {
            result.push(item.clone());
        }
        result
    }

    /// Copies every item into a new list backed by `allocator`.
    pub fn copy_in<'b, B: Allocator + ?Sized>(&self, allocator: &'b B) -> List<'b, T, B>
    where
        T: Clone,
    {
        let mut result = List::alloc(allocator, self.count);
        for item in self.as_slice() {
            result.push(item.clone());
        }
        result
    }

    /// Index of the first item equal to `item`, or [`NOT_FOUND`].
    pub fn find_index(&self, item: &T) -> usize
    where
        T: PartialEq,
    {
        self.find_index_by(|candidate| candidate == item)
    }

    /// Index of the first item matching `predicate`, or [`NOT_FOUND`].
    pub fn find_index_by<F: FnMut(&T) -> bool>(&self, predicate: F) -> usize {
        self.as_slice().iter().position(predicate).unwrap_or(NOT_FOUND)
    }

    /// Sets the number of initialized items.
    ///
    /// # Safety
    ///
    /// `count <= capacity` and the first `count` slots must hold initialized items.
    pub(crate) unsafe fn set_len(&mut self, count: usize) {
        debug_assert!(count <= self.capacity);
        self.count = count;
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.items.as_ptr()
    }
}

impl<'a, T, A: Allocator + ?Sized> Drop for List<'a, T, A> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.as_mut_slice() as *mut [T]) };
    }
}

impl<'a, T, A: Allocator + ?Sized> Deref for List<'a, T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T, A: Allocator + ?Sized> DerefMut for List<'a, T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T, A: Allocator + ?Sized> Index<usize> for List<'a, T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(index < self.count, "index {} out of bounds for length {}", index, self.count);
        unsafe { &*self.items.as_ptr().add(index) }
    }
}

impl<'a, T, A: Allocator + ?Sized> IndexMut<usize> for List<'a, T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(index < self.count, "index {} out of bounds for length {}", index, self.count);
        unsafe { &mut *self.items.as_ptr().add(index) }
    }
}

impl<'l, 'a, T, A: Allocator + ?Sized> IntoIterator for &'l List<'a, T, A> {
    type Item = &'l T;
    type IntoIter = slice::Iter<'l, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T: PartialEq, A: Allocator + ?Sized> PartialEq<[T]> for List<'a, T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<'a, 'b, T: PartialEq, A: Allocator + ?Sized, B: Allocator + ?Sized> PartialEq<List<'b, T, B>> for List<'a, T, A> {
    fn eq(&self, other: &List<'b, T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for List<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
