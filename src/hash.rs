//! The 64-bit hash capability used by [`Table`](crate::Table) and [`Set`](crate::Set).

const FNV_OFFSET_BASIS: u64 = 0xCBF29CE484222325;
const FNV_PRIME: u64 = 0x100000001B3;

/// FNV-1 over `bytes`: multiply, then xor.
pub fn fnv1(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= *byte as u64;
    }
    hash
}

/// A key that can be placed in the hash containers.
///
/// Keys also need `Eq`. Two values that compare equal must have the same
/// `hash_value`, including across the `Borrow` forms used for lookups.
pub trait Hash {
    fn hash_value(&self) -> u64;
}

macro_rules! identity_hash {
    ($($ty:ty),*) => {
        $(
            impl Hash for $ty {
                #[inline(always)]
                fn hash_value(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

identity_hash!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, bool);

impl Hash for [u8] {
    #[inline]
    fn hash_value(&self) -> u64 {
        fnv1(self)
    }
}

impl Hash for str {
    #[inline]
    fn hash_value(&self) -> u64 {
        fnv1(self.as_bytes())
    }
}

/// References hash like the value behind them.
impl<T: Hash + ?Sized> Hash for &T {
    #[inline(always)]
    fn hash_value(&self) -> u64 {
        (**self).hash_value()
    }
}

/// Raw pointers hash their address.
impl<T> Hash for *const T {
    #[inline(always)]
    fn hash_value(&self) -> u64 {
        *self as usize as u64
    }
}

impl<T> Hash for *mut T {
    #[inline(always)]
    fn hash_value(&self) -> u64 {
        *self as usize as u64
    }
}
