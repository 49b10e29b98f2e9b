use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::allocator::{Allocator, AllocatorExt};
use crate::error::{alloc_failed, AllocError};
use crate::hash::Hash;
use crate::iter::{OccupiedSlots, OCCUPIED};
use crate::optional::Optional;

/// Load, in percent, at which the next `put` grows the table first.
pub const MAX_LOAD_PERCENTAGE: usize = 70;

/// Capacity a table grows to once it reaches [`MAX_LOAD_PERCENTAGE`].
#[inline(always)]
pub const fn grow_capacity(capacity: usize) -> usize {
    (capacity + 1) * 3
}

/// Open-addressing hash map with linear probing.
///
/// Slots live in three parallel buffers from the allocator: a metadata byte per
/// slot (bit 0 set when occupied), the keys and the values. A `put` that finds
/// the table at or above 70% load first rebuilds it at [`grow_capacity`] and
/// abandons the old buffers to the allocator.
///
/// There is no removal, so a probe that reaches a free slot can stop.
pub struct Table<'a, K, V, A: Allocator + ?Sized> {
    meta: NonNull<u8>,
    keys: NonNull<K>,
    values: NonNull<V>,
    count: usize,
    capacity: usize,
    allocator: &'a A,
    _marker: PhantomData<(K, V)>,
}

impl<'a, K, V, A: Allocator + ?Sized> Table<'a, K, V, A> {
    pub const DEFAULT_CAPACITY: usize = 47;

    pub fn new(allocator: &'a A) -> Self {
        Table::alloc(allocator, Self::DEFAULT_CAPACITY)
    }

    pub fn alloc(allocator: &'a A, capacity: usize) -> Self {
        Table::try_alloc(allocator, capacity).unwrap_or_else(|e| alloc_failed(e))
    }

    fn try_alloc(allocator: &'a A, capacity: usize) -> Result<Self, AllocError> {
        assert!(capacity > 0, "table capacity must be greater than zero");
        let meta = allocator.alloc::<u8>(capacity)?;
        let keys = allocator.alloc::<K>(capacity)?;
        let values = allocator.alloc::<V>(capacity)?;
        unsafe { ptr::write_bytes(meta.as_ptr(), 0, capacity) };
        Ok(Table { meta, keys, values, count: 0, capacity, allocator, _marker: PhantomData })
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

    /// `count * 100 / capacity`, rounded down.
    #[inline]
    pub fn load_percentage(&self) -> usize {
        self.count * 100 / self.capacity
    }

    /// Drops every entry and marks all slots free. The capacity stays.
    pub fn clear(&mut self) {
        unsafe {
            self.drop_entries();
            ptr::write_bytes(self.meta.as_ptr(), 0, self.capacity);
        }
        self.count = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.occupied(), keys: self.keys, values: self.values, _marker: PhantomData }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    #[inline(always)]
    fn meta(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.meta.as_ptr(), self.capacity) }
    }

    #[inline(always)]
    fn is_occupied(&self, index: usize) -> bool {
        self.meta()[index] & OCCUPIED != 0
    }

    #[inline(always)]
    unsafe fn key_at(&self, index: usize) -> &K {
        &*self.keys.as_ptr().add(index)
    }

    fn occupied(&self) -> OccupiedSlots<'_> {
        OccupiedSlots::new(self.meta(), self.count)
    }

    unsafe fn drop_entries(&mut self) {
        if !mem::needs_drop::<K>() && !mem::needs_drop::<V>() {
            return;
        }
        let (keys, values) = (self.keys.as_ptr(), self.values.as_ptr());
        for index in OccupiedSlots::new(self.meta(), self.count) {
            ptr::drop_in_place(keys.add(index));
            ptr::drop_in_place(values.add(index));
        }
    }
}

impl<'a, K: Hash + Eq, V, A: Allocator + ?Sized> Table<'a, K, V, A> {
    /// Inserts `value` under `key`, growing the table first when it is at 70% load.
    ///
    /// An existing equal key keeps its slot; its value is replaced and `key` is dropped.
    pub fn put(&mut self, key: K, value: V) {
        if self.load_percentage() >= MAX_LOAD_PERCENTAGE {
            self.rebuild(grow_capacity(self.capacity));
        }
        self.insert(key, value);
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// A copy of the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Optional<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_ref(key).cloned().into()
    }

    pub fn get_ref<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        Some(unsafe { &*self.values.as_ptr().add(index) })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        Some(unsafe { &mut *self.values.as_ptr().add(index) })
    }

    /// Copies every entry into a table from `allocator`, one growth step larger.
    pub fn copy<'b, B: Allocator + ?Sized>(&self, allocator: &'b B) -> Table<'b, K, V, B>
    where
        K: Clone,
        V: Clone,
    {
        let mut result = Table::alloc(allocator, grow_capacity(self.capacity));
        for (key, value) in self.iter() {
            result.insert(key.clone(), value.clone());
        }
        result
    }

    #[inline]
    fn start_index(&self, hash: u64) -> usize {
        (hash % self.capacity as u64) as usize
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let start = self.start_index(key.hash_value());
        let mut index = start;
        loop {
            if !self.is_occupied(index) {
                return None;
            }
            if <K as Borrow<Q>>::borrow(unsafe { self.key_at(index) }) == key {
                return Some(index);
            }
            index = (index + 1) % self.capacity;
            if index == start {
                return None;
            }
        }
    }

    /// Probes for `key` without checking the load. There must be a free slot.
    fn insert(&mut self, key: K, value: V) {
        debug_assert!(self.count < self.capacity);
        let mut index = self.start_index(key.hash_value());
        loop {
            if !self.is_occupied(index) {
                unsafe {
                    self.keys.as_ptr().add(index).write(key);
                    self.values.as_ptr().add(index).write(value);
                    *self.meta.as_ptr().add(index) |= OCCUPIED;
                }
                self.count += 1;
                return;
            }
            if unsafe { self.key_at(index) } == &key {
                unsafe { *self.values.as_ptr().add(index) = value };
                return;
            }
            index = (index + 1) % self.capacity;
        }
    }

    /// Moves every entry into a fresh table of `new_capacity` and takes its place.
    fn rebuild(&mut self, new_capacity: usize) {
        debug!("rebuild table of {} entries: capacity {} -> {}", self.count, self.capacity, new_capacity);
        let mut grown = Table::alloc(self.allocator, new_capacity);
        let (keys, values) = (self.keys.as_ptr(), self.values.as_ptr());
        for index in self.occupied() {
            unsafe { grown.insert(keys.add(index).read(), values.add(index).read()) };
        }
        // Entries now live in `grown`; the old buffers are left to the allocator.
        mem::forget(mem::replace(self, grown));
    }
}

impl<'a, K, V, A: Allocator + ?Sized> Drop for Table<'a, K, V, A> {
    fn drop(&mut self) {
        unsafe { self.drop_entries() };
    }
}

impl<'a, K: fmt::Debug, V: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for Table<'a, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'t, 'a, K, V, A: Allocator + ?Sized> IntoIterator for &'t Table<'a, K, V, A> {
    type Item = (&'t K, &'t V);
    type IntoIter = Iter<'t, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Entries of a [`Table`] in slot order.
pub struct Iter<'t, K, V> {
    slots: OccupiedSlots<'t>,
    keys: NonNull<K>,
    values: NonNull<V>,
    _marker: PhantomData<(&'t K, &'t V)>,
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.slots.next()?;
        unsafe { Some((&*self.keys.as_ptr().add(index), &*self.values.as_ptr().add(index))) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<'t, K, V> ExactSizeIterator for Iter<'t, K, V> {}

#[cfg(test)]
mod table_tests {
    use super::{grow_capacity, Table, MAX_LOAD_PERCENTAGE};
    use crate::dropflag::{DropFlag, Droppable};
    use crate::{ArenaAllocator, Hash};
    use proptest::prelude::*;

    #[test]
    fn put_then_get() {
        let arena = ArenaAllocator::new();
        let mut table = Table::new(&arena);
        assert_eq!(table.capacity(), 47);
        table.put(1u64, "one");
        table.put(2u64, "two");
        assert_eq!(*table.get(&1).get(), "one");
        assert_eq!(*table.get(&2).get(), "two");
        assert!(!table.get(&3).has_value());
        assert!(table.has(&1));
        assert!(!table.has(&48));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn put_existing_key_overwrites() {
        let arena = ArenaAllocator::new();
        let mut table = Table::new(&arena);
        table.put("key", 1);
        table.put("key", 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("key").into_option(), Some(2));
    }

    #[test]
    fn colliding_keys_probe_forward() {
        let arena = ArenaAllocator::new();
        let mut table = Table::alloc(&arena, 10);
        table.put(3u32, 'a');
        table.put(13u32, 'b');
        table.put(23u32, 'c');
        assert_eq!(table.get(&13).into_option(), Some('b'));
        assert_eq!(table.get(&23).into_option(), Some('c'));
        assert!(!table.has(&33));
    }

    #[test]
    fn probe_wraps_to_the_front() {
        let arena = ArenaAllocator::new();
        let mut table = Table::alloc(&arena, 10);
        table.put(9u8, 0);
        table.put(19u8, 1);
        assert_eq!(table.get(&19).into_option(), Some(1));
        assert!(!table.has(&29));
    }

    #[test]
    fn grows_before_crossing_the_load_limit() {
        let arena = ArenaAllocator::new();
        let mut table = Table::alloc(&arena, 10);
        for i in 0..7u64 {
            table.put(i, i * 2);
            assert_eq!(table.capacity(), 10);
        }
        assert_eq!(table.load_percentage(), 70);
        table.put(7, 14);
        assert_eq!(table.capacity(), grow_capacity(10));
        assert_eq!(table.capacity(), 33);
        for i in 0..8u64 {
            assert_eq!(table.get(&i).into_option(), Some(i * 2));
        }
    }

    #[test]
    #[should_panic(expected = "greater than zero")]
    fn zero_capacity_is_rejected() {
        let arena = ArenaAllocator::new();
        Table::<u32, u32, _>::alloc(&arena, 0);
    }

    #[test]
    fn lookup_by_borrowed_form() {
        let owned = std::string::String::from("hello");
        let arena = ArenaAllocator::new();
        let mut table = Table::new(&arena);
        table.put(owned.as_str(), 5usize);
        assert!(table.has("hello"));
        assert_eq!("hello".hash_value(), owned.as_str().hash_value());
        *table.get_mut("hello").unwrap() += 1;
        assert_eq!(table.get_ref("hello"), Some(&6));
    }

    #[test]
    fn iter_visits_every_entry_once() {
        let arena = ArenaAllocator::new();
        let mut table = Table::alloc(&arena, 5);
        for i in 0..100u32 {
            table.put(i, i + 1000);
        }
        let iter = table.iter();
        assert_eq!(iter.len(), 100);
        let mut keys: Vec<u32> = table.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
        assert_eq!(table.values().map(|v| *v as u64).sum::<u64>(), (1000..1100u64).sum());
    }

    #[test]
    fn clear_keeps_capacity() {
        let arena = ArenaAllocator::new();
        let mut table = Table::alloc(&arena, 5);
        for i in 0..20i64 {
            table.put(i, ());
        }
        let capacity = table.capacity();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(!table.has(&3));
        table.put(3, ());
        assert!(table.has(&3));
    }

    #[test]
    fn copy_goes_to_other_allocator() {
        let keep = ArenaAllocator::new();
        let copied = {
            let scratch = ArenaAllocator::new();
            let mut table = Table::new(&scratch);
            table.put(1u16, 10u16);
            table.put(2u16, 20u16);
            table.copy(&keep)
        };
        assert_eq!(copied.capacity(), grow_capacity(47));
        assert_eq!(copied.get(&2).into_option(), Some(20));
        assert_eq!(copied.len(), 2);
    }

    #[test]
    fn entries_dropped_once_across_growth() {
        let arena = ArenaAllocator::new();
        let flag = DropFlag::default();
        let mut table = Table::alloc(&arena, 3);
        for i in 0..50u32 {
            table.put(i, Droppable::with_value(&flag, i as i32));
        }
        assert_eq!(flag.get(), 0);
        table.put(7, Droppable::with_value(&flag, -7));
        assert_eq!(flag.get(), 1);
        assert_eq!(table.get_ref(&7).map(|d| d.value), Some(-7));
        std::mem::drop(table);
        assert_eq!(flag.get(), 51);
    }

    proptest! {
        #[test]
        fn load_stays_under_limit_and_keys_round_trip(
            capacity in 1usize..64,
            keys in proptest::collection::vec(any::<u32>(), 0..400),
        ) {
            let arena = ArenaAllocator::new();
            let mut table = Table::alloc(&arena, capacity);
            let mut expected = std::collections::HashMap::new();
            for (i, key) in keys.iter().enumerate() {
                let below_limit = table.load_percentage() < MAX_LOAD_PERCENTAGE;
                let before = table.capacity();
                table.put(*key, i);
                expected.insert(*key, i);
                if !below_limit {
                    prop_assert_eq!(table.capacity(), grow_capacity(before));
                }
                prop_assert!(table.len() <= table.capacity());
            }
            prop_assert_eq!(table.len(), expected.len());
            for (key, value) in &expected {
                prop_assert_eq!(table.get(key).into_option(), Some(*value));
            }
            prop_assert_eq!(table.has(&u32::MAX), expected.contains_key(&u32::MAX));
        }
    }
}
