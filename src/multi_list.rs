use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::slice;

use crate::allocator::{Allocator, AllocatorExt};
use crate::error::{alloc_failed, AllocError};

/// A row type whose fields are stored in separate column buffers.
///
/// Implemented for tuples of one to eight element types.
///
/// # Safety
///
/// `Ptrs` must hold one buffer per field, and every function must treat each
/// buffer as room for exactly the counts it is given.
pub unsafe trait Columns: Sized {
    /// One pointer per column.
    type Ptrs: Copy;

    fn alloc_columns<A: Allocator + ?Sized>(
        allocator: &A,
        capacity: usize,
    ) -> Result<Self::Ptrs, AllocError>;

    /// Resizes the columns one after another, updating `ptrs` as each one moves.
    ///
    /// # Safety
    ///
    /// `ptrs` must come from `allocator` with room for `old_capacity` rows.
    unsafe fn resize_columns<A: Allocator + ?Sized>(
        allocator: &A,
        ptrs: &mut Self::Ptrs,
        old_capacity: usize,
        new_capacity: usize,
    ) -> Result<(), AllocError>;

    /// # Safety
    ///
    /// `index` must be below the capacity of every column and the slot unused.
    unsafe fn write_row(ptrs: &Self::Ptrs, index: usize, row: Self);

    /// # Safety
    ///
    /// The first `count` slots of every column must hold live values.
    unsafe fn drop_rows(ptrs: &Self::Ptrs, count: usize);
}

/// Access to the column at position `I` of a row type.
///
/// # Safety
///
/// `column` must return the buffer that holds field `I` of every row.
pub unsafe trait Column<const I: usize>: Columns {
    type Item;

    fn column(ptrs: &Self::Ptrs) -> NonNull<Self::Item>;
}

macro_rules! tuple_columns {
    ($( ($($T:ident $idx:tt),+) )+) => {
        $( tuple_columns!(@tuple $($T $idx),+); )+
    };
    (@tuple $($T:ident $idx:tt),+) => {
        unsafe impl<$($T),+> Columns for ($($T,)+) {
            type Ptrs = ($(NonNull<$T>,)+);

            fn alloc_columns<A: Allocator + ?Sized>(
                allocator: &A,
                capacity: usize,
            ) -> Result<Self::Ptrs, AllocError> {
                Ok(($(allocator.alloc::<$T>(capacity)?,)+))
            }

            unsafe fn resize_columns<A: Allocator + ?Sized>(
                allocator: &A,
                ptrs: &mut Self::Ptrs,
                old_capacity: usize,
                new_capacity: usize,
            ) -> Result<(), AllocError> {
                $( ptrs.$idx = allocator.resize(ptrs.$idx, old_capacity, new_capacity)?; )+
                Ok(())
            }

            #[inline(always)]
            unsafe fn write_row(ptrs: &Self::Ptrs, index: usize, row: Self) {
                $( ptrs.$idx.as_ptr().add(index).write(row.$idx); )+
            }

            unsafe fn drop_rows(ptrs: &Self::Ptrs, count: usize) {
                $( ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptrs.$idx.as_ptr(), count)); )+
            }
        }

        tuple_columns!(@each [$($T),+] $($T $idx),+);
    };
    (@each $all:tt $($T:ident $idx:tt),+) => {
        $( tuple_columns!(@one $all $T $idx); )+
    };
    (@one [$($All:ident),+] $T:ident $idx:tt) => {
        unsafe impl<$($All),+> Column<$idx> for ($($All,)+) {
            type Item = $T;

            #[inline(always)]
            fn column(ptrs: &Self::Ptrs) -> NonNull<$T> {
                ptrs.$idx
            }
        }
    };
}

tuple_columns! {
    (T0 0)
    (T0 0, T1 1)
    (T0 0, T1 1, T2 2)
    (T0 0, T1 1, T2 2, T3 3)
    (T0 0, T1 1, T2 2, T3 3, T4 4)
    (T0 0, T1 1, T2 2, T3 3, T4 4, T5 5)
    (T0 0, T1 1, T2 2, T3 3, T4 4, T5 5, T6 6)
    (T0 0, T1 1, T2 2, T3 3, T4 4, T5 5, T6 6, T7 7)
}

/// Capacity a full multi-list of `capacity` rows grows to.
#[inline(always)]
pub const fn grow_capacity(capacity: usize) -> usize {
    if capacity == 0 { 1 } else { capacity * 2 }
}

/// Growable sequence of rows stored column by column: field `I` of every row
/// sits in one contiguous buffer, readable with [`MultiList::items`].
///
/// All columns share one count and one capacity and grow together through the
/// allocator's `resize`. A failed grow can leave the earlier columns already
/// moved to larger blocks; the list itself stays usable at its old capacity.
///
/// ```
/// use compartment::{ArenaAllocator, MultiList};
///
/// let arena = ArenaAllocator::new();
/// let mut points = MultiList::<(f32, f32), _>::new(&arena);
/// points.push((1.0, 2.0));
/// points.push((3.0, 4.0));
/// assert_eq!(points.items::<1>(), &[2.0, 4.0]);
/// ```
pub struct MultiList<'a, R: Columns, A: Allocator + ?Sized> {
    columns: R::Ptrs,
    count: usize,
    capacity: usize,
    allocator: &'a A,
    _marker: PhantomData<R>,
}

impl<'a, R: Columns, A: Allocator + ?Sized> MultiList<'a, R, A> {
    pub const DEFAULT_CAPACITY: usize = 7;

    pub fn new(allocator: &'a A) -> Self {
        MultiList::alloc(allocator, Self::DEFAULT_CAPACITY)
    }

    pub fn alloc(allocator: &'a A, capacity: usize) -> Self {
        MultiList::try_alloc(allocator, capacity).unwrap_or_else(|e| alloc_failed(e))
    }

    pub fn try_alloc(allocator: &'a A, capacity: usize) -> Result<Self, AllocError> {
        let columns = R::alloc_columns(allocator, capacity)?;
        Ok(MultiList { columns, count: 0, capacity, allocator, _marker: PhantomData })
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

    pub fn push(&mut self, row: R) {
        self.try_push(row).unwrap_or_else(|e| alloc_failed(e))
    }

    /// Appends `row`, doubling every column first if the list is full. On failure
    /// no row is added and `row` is dropped.
    pub fn try_push(&mut self, row: R) -> Result<(), AllocError> {
        if self.count == self.capacity {
            self.try_reserve(grow_capacity(self.capacity))?;
        }
        unsafe { R::write_row(&self.columns, self.count, row) };
        self.count += 1;
        Ok(())
    }

    /// Grows every column to exactly `new_capacity` rows. Smaller values do nothing.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        if new_capacity <= self.capacity {
            return Ok(());
        }
        unsafe { R::resize_columns(self.allocator, &mut self.columns, self.capacity, new_capacity)? };
        self.capacity = new_capacity;
        Ok(())
    }

    /// Column `I` of every row, in push order.
    #[inline(always)]
    pub fn items<const I: usize>(&self) -> &[<R as Column<I>>::Item]
    where
        R: Column<I>,
    {
        unsafe { slice::from_raw_parts(R::column(&self.columns).as_ptr(), self.count) }
    }

    #[inline(always)]
    pub fn items_mut<const I: usize>(&mut self) -> &mut [<R as Column<I>>::Item]
    where
        R: Column<I>,
    {
        unsafe { slice::from_raw_parts_mut(R::column(&self.columns).as_ptr(), self.count) }
    }

    /// Field `I` of row `index`.
    pub fn at<const I: usize>(&self, index: usize) -> &<R as Column<I>>::Item
    where
        R: Column<I>,
    {
        assert!(index < self.count, "row {} out of bounds for length {}", index, self.count);
        unsafe { &*R::column(&self.columns).as_ptr().add(index) }
    }

    pub fn at_mut<const I: usize>(&mut self, index: usize) -> &mut <R as Column<I>>::Item
    where
        R: Column<I>,
    {
        assert!(index < self.count, "row {} out of bounds for length {}", index, self.count);
        unsafe { &mut *R::column(&self.columns).as_ptr().add(index) }
    }
}

impl<'a, R: Columns, A: Allocator + ?Sized> Drop for MultiList<'a, R, A> {
    fn drop(&mut self) {
        unsafe { R::drop_rows(&self.columns, self.count) };
    }
}

impl<'a, R: Columns, A: Allocator + ?Sized> fmt::Debug for MultiList<'a, R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiList").field("len", &self.count).field("capacity", &self.capacity).finish()
    }
}
