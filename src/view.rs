use std::borrow::Borrow;
use std::fmt;
use std::str::Utf8Error;

use crate::allocator::Allocator;
use crate::hash::{fnv1, Hash};
use crate::string::String;

/// Borrowed run of bytes. Not terminated, and not required to be UTF-8.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StringView<'s> {
    bytes: &'s [u8],
}

impl<'s> StringView<'s> {
    #[inline(always)]
    pub const fn new(bytes: &'s [u8]) -> StringView<'s> {
        StringView { bytes }
    }

    #[inline(always)]
    pub fn count(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &'s [u8] {
        self.bytes
    }

    pub fn as_str(&self) -> Result<&'s str, Utf8Error> {
        std::str::from_utf8(self.bytes)
    }

    /// Bytes `start..end` of this view.
    pub fn view(&self, start: usize, end: usize) -> StringView<'s> {
        assert!(end >= start, "view end {} is before start {}", end, start);
        assert!(end <= self.bytes.len(), "view end {} out of bounds for length {}", end, self.bytes.len());
        StringView { bytes: &self.bytes[start..end] }
    }

    pub fn starts_with<P: AsRef<[u8]>>(&self, prefix: P) -> bool {
        self.bytes.starts_with(prefix.as_ref())
    }

    pub fn ends_with<P: AsRef<[u8]>>(&self, suffix: P) -> bool {
        self.bytes.ends_with(suffix.as_ref())
    }

    /// Copies the bytes into a terminated [`String`] from `allocator`.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_string<'a, A: Allocator + ?Sized>(&self, allocator: &'a A) -> String<'a, A> {
        String::from_bytes(allocator, self.bytes)
    }
}

impl<'s> From<&'s str> for StringView<'s> {
    fn from(value: &'s str) -> Self {
        StringView::new(value.as_bytes())
    }
}

impl<'s> From<&'s [u8]> for StringView<'s> {
    fn from(value: &'s [u8]) -> Self {
        StringView::new(value)
    }
}

impl<'s, const N: usize> From<&'s [u8; N]> for StringView<'s> {
    fn from(value: &'s [u8; N]) -> Self {
        StringView::new(value)
    }
}

impl<'s> AsRef<[u8]> for StringView<'s> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'s> Borrow<[u8]> for StringView<'s> {
    fn borrow(&self) -> &[u8] {
        self.bytes
    }
}

impl<'s> Hash for StringView<'s> {
    #[inline]
    fn hash_value(&self) -> u64 {
        fnv1(self.bytes)
    }
}

impl<'s> PartialEq<str> for StringView<'s> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl<'s, 'o> PartialEq<&'o str> for StringView<'s> {
    fn eq(&self, other: &&'o str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl<'s> PartialEq<StringView<'s>> for str {
    fn eq(&self, other: &StringView<'s>) -> bool {
        self.as_bytes() == other.bytes
    }
}

impl<'s> fmt::Display for StringView<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.bytes.utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_str("\u{FFFD}")?;
            }
        }
        Ok(())
    }
}

impl<'s> fmt::Debug for StringView<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(text) => fmt::Debug::fmt(text, f),
            Err(_) => write!(f, "b\"{}\"", self.bytes.escape_ascii()),
        }
    }
}
