//! Optional values, with a pointer form that costs no more than the pointer.

use std::fmt;
use std::mem::{size_of, MaybeUninit};
use std::ptr::{self, NonNull};

/// A value that may be absent, stored as an explicit flag next to the payload.
pub struct Optional<T> {
    has_value: bool,
    value: MaybeUninit<T>,
}

impl<T> Optional<T> {
    pub const NONE: Optional<T> = Optional { has_value: false, value: MaybeUninit::uninit() };

    #[inline(always)]
    pub const fn new(value: T) -> Optional<T> {
        Optional { has_value: true, value: MaybeUninit::new(value) }
    }

    #[inline(always)]
    pub const fn none() -> Optional<T> {
        Self::NONE
    }

    #[inline(always)]
    pub fn has_value(&self) -> bool {
        self.has_value
    }

    /// Returns the value, panicking when there is none.
    #[inline]
    pub fn get(&self) -> &T {
        assert!(self.has_value, "Optional::get on an empty value");
        unsafe { self.get_unchecked() }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        assert!(self.has_value, "Optional::get_mut on an empty value");
        unsafe { self.value.assume_init_mut() }
    }

    /// # Safety
    ///
    /// `has_value()` must be true.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self) -> &T {
        self.value.assume_init_ref()
    }

    /// The value, or `other` when there is none.
    #[inline]
    pub fn or_else<'a>(&'a self, other: &'a T) -> &'a T {
        if self.has_value {
            unsafe { self.get_unchecked() }
        } else {
            other
        }
    }

    /// Moves the value out, leaving the optional empty.
    pub fn take(&mut self) -> Option<T> {
        if self.has_value {
            self.has_value = false;
            Some(unsafe { self.value.assume_init_read() })
        } else {
            None
        }
    }

    #[inline]
    pub fn into_option(mut self) -> Option<T> {
        self.take()
    }

    #[inline]
    pub fn as_option(&self) -> Option<&T> {
        if self.has_value {
            Some(unsafe { self.get_unchecked() })
        } else {
            None
        }
    }
}

impl<T> Drop for Optional<T> {
    fn drop(&mut self) {
        if self.has_value {
            unsafe { self.value.assume_init_drop() };
        }
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T: Clone> Clone for Optional<T> {
    fn clone(&self) -> Self {
        match self.as_option() {
            Some(value) => Optional::new(value.clone()),
            None => Optional::NONE,
        }
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Optional::new(value),
            None => Optional::NONE,
        }
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.into_option()
    }
}

impl<T: PartialEq> PartialEq for Optional<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_option() == other.as_option()
    }
}

impl<T: Eq> Eq for Optional<T> {}

impl<T: fmt::Debug> fmt::Debug for Optional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_option() {
            Some(value) => f.debug_tuple("Optional").field(value).finish(),
            None => f.write_str("Optional::NONE"),
        }
    }
}

/// An optional pointer where the null pointer is the absent state.
///
/// There is no flag: the type is exactly as big as `*mut T`.
#[repr(transparent)]
pub struct OptionalPtr<T> {
    ptr: *mut T,
}

const _: () = assert!(size_of::<OptionalPtr<u8>>() == size_of::<*mut u8>());
const _: () = assert!(size_of::<OptionalPtr<[u64; 4]>>() == size_of::<*mut [u64; 4]>());

impl<T> OptionalPtr<T> {
    pub const NONE: OptionalPtr<T> = OptionalPtr { ptr: ptr::null_mut() };

    /// Wraps `ptr`; a null `ptr` is the absent state.
    #[inline(always)]
    pub const fn new(ptr: *mut T) -> OptionalPtr<T> {
        OptionalPtr { ptr }
    }

    #[inline(always)]
    pub fn has_value(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Returns the pointer, panicking when it is null.
    #[inline]
    pub fn get(&self) -> NonNull<T> {
        assert!(self.has_value(), "OptionalPtr::get on a null pointer");
        unsafe { NonNull::new_unchecked(self.ptr) }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    /// # Safety
    ///
    /// The pointer, when not null, must point to a live `T` for `'a`.
    #[inline(always)]
    pub unsafe fn as_ref<'a>(&self) -> Option<&'a T> {
        self.ptr.as_ref()
    }

    /// # Safety
    ///
    /// Same as [`OptionalPtr::as_ref`], and nothing else may access the `T` for `'a`.
    #[inline(always)]
    pub unsafe fn as_mut<'a>(&self) -> Option<&'a mut T> {
        self.ptr.as_mut()
    }
}

impl<T> Clone for OptionalPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OptionalPtr<T> {}

impl<T> Default for OptionalPtr<T> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T> From<NonNull<T>> for OptionalPtr<T> {
    fn from(ptr: NonNull<T>) -> Self {
        OptionalPtr::new(ptr.as_ptr())
    }
}

impl<T> From<Option<NonNull<T>>> for OptionalPtr<T> {
    fn from(ptr: Option<NonNull<T>>) -> Self {
        ptr.map(OptionalPtr::from).unwrap_or(Self::NONE)
    }
}

/// Compares addresses.
impl<T> PartialEq for OptionalPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for OptionalPtr<T> {}

impl<T> fmt::Debug for OptionalPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_value() {
            write!(f, "OptionalPtr({:p})", self.ptr)
        } else {
            f.write_str("OptionalPtr::NONE")
        }
    }
}

#[cfg(test)]
mod optional_tests {
    use super::{Optional, OptionalPtr};
    use crate::dropflag::{DropFlag, Droppable};
    use std::mem::size_of;

    #[test]
    fn pointer_form_has_pointer_size() {
        assert_eq!(size_of::<OptionalPtr<i32>>(), size_of::<*mut i32>());
        assert_eq!(size_of::<OptionalPtr<String>>(), size_of::<*mut String>());
    }

    #[test]
    fn null_is_absent() {
        let mut x = 5;
        assert!(!OptionalPtr::<i32>::NONE.has_value());
        assert!(!OptionalPtr::<i32>::default().has_value());
        assert!(!OptionalPtr::new(std::ptr::null_mut::<i32>()).has_value());
        let some = OptionalPtr::new(&mut x as *mut i32);
        assert!(some.has_value());
        assert_eq!(unsafe { *some.get().as_ptr() }, 5);
        assert_eq!(unsafe { some.as_ref() }, Some(&5));
    }

    #[test]
    #[should_panic(expected = "null pointer")]
    fn get_of_null_panics() {
        OptionalPtr::<u8>::NONE.get();
    }

    #[test]
    fn tagged_form_tracks_presence() {
        let mut empty: Optional<u32> = Optional::none();
        assert!(!empty.has_value());
        assert_eq!(*empty.or_else(&9), 9);
        assert_eq!(empty.take(), None);

        let mut full = Optional::new(3u32);
        assert!(full.has_value());
        assert_eq!(*full.get(), 3);
        *full.get_mut() += 1;
        assert_eq!(*full.or_else(&9), 4);
        assert_eq!(full.clone().into_option(), Some(4));
        assert_ne!(full, Optional::NONE);
        assert_eq!(Optional::<u32>::NONE, Optional::from(None));
    }

    #[test]
    #[should_panic(expected = "empty value")]
    fn get_of_empty_panics() {
        Optional::<u8>::NONE.get();
    }

    #[test]
    fn payload_is_dropped_once() {
        let flag = DropFlag::default();
        let opt = Optional::new(Droppable::new(&flag));
        assert_eq!(flag.get(), 0);
        std::mem::drop(opt);
        assert_eq!(flag.get(), 1);

        let mut opt = Optional::new(Droppable::new(&flag));
        let taken = opt.take();
        std::mem::drop(opt);
        assert_eq!(flag.get(), 1, "taken value is not dropped by the optional");
        std::mem::drop(taken);
        assert_eq!(flag.get(), 2);
    }
}
