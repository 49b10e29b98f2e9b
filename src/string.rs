use std::borrow::Borrow;
use std::fmt;
use std::str::Utf8Error;

use crate::allocator::Allocator;
use crate::hash::{fnv1, Hash};
use crate::list::List;
use crate::view::StringView;

/// Growable byte string that keeps a `0` byte after its content, so
/// [`cstr`](String::cstr) can be handed out without copying.
///
/// The bytes are not required to be UTF-8.
pub struct String<'a, A: Allocator + ?Sized> {
    /// Content plus terminator; never empty.
    data: List<'a, u8, A>,
}

/// Counts the bytes a format would produce without storing them.
struct CountingSink(usize);

impl fmt::Write for CountingSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

fn formatted_len(args: fmt::Arguments<'_>) -> usize {
    let mut sink = CountingSink(0);
    if fmt::write(&mut sink, args).is_err() {
        panic!("a formatting trait implementation returned an error");
    }
    sink.0
}

impl<'a, A: Allocator + ?Sized> String<'a, A> {
    pub const DEFAULT_CAPACITY: usize = 7;

    pub fn new(allocator: &'a A) -> Self {
        String::alloc(allocator, Self::DEFAULT_CAPACITY)
    }

    /// An empty string with room for `capacity` bytes before it has to grow.
    pub fn alloc(allocator: &'a A, capacity: usize) -> Self {
        let mut data = List::alloc(allocator, capacity + 1);
        data.push(0);
        String { data }
    }

    pub fn from_str(allocator: &'a A, value: &str) -> Self {
        String::from_bytes(allocator, value.as_bytes())
    }

    pub fn from_bytes(allocator: &'a A, bytes: &[u8]) -> Self {
        let mut result = String::alloc(allocator, bytes.len());
        result.append(StringView::new(bytes));
        result
    }

    /// Takes over `list` as the content and terminates it.
    pub fn from_list(mut list: List<'a, u8, A>) -> Self {
        list.push(0);
        String { data: list }
    }

    /// Formats `args` into a string sized exactly for the output.
    pub fn format(allocator: &'a A, args: fmt::Arguments<'_>) -> Self {
        let mut result = String::alloc(allocator, formatted_len(args));
        result.write_formatted(args);
        result
    }

    /// Formats `args` onto the end, growing at most once.
    pub fn format_append(&mut self, args: fmt::Arguments<'_>) {
        self.reserve(self.count() + formatted_len(args));
        self.write_formatted(args);
    }

    fn write_formatted(&mut self, args: fmt::Arguments<'_>) {
        if fmt::Write::write_fmt(self, args).is_err() {
            panic!("a formatting trait implementation returned an error");
        }
    }

    /// Number of content bytes, not counting the terminator.
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.data.len() - 1
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Content bytes that fit before the buffer has to grow.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.capacity() - 1
    }

    #[inline(always)]
    pub fn allocator(&self) -> &'a A {
        self.data.allocator()
    }

    /// Makes room for `capacity` content bytes. Smaller values do nothing.
    pub fn reserve(&mut self, capacity: usize) {
        self.data.reserve(capacity + 1);
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(0);
        let count = self.data.len();
        self.data[count - 2] = byte;
    }

    pub fn append(&mut self, view: StringView<'_>) {
        let bytes = view.as_bytes();
        let count = self.count();
        self.reserve(count + bytes.len());
        unsafe {
            let end = self.data.as_mut_ptr().add(count);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), end, bytes.len());
            *end.add(bytes.len()) = 0;
            self.data.set_len(count + bytes.len() + 1);
        }
    }

    pub fn append_string<B: Allocator + ?Sized>(&mut self, other: &String<'_, B>) {
        self.append(other.as_view());
    }

    pub fn push_str(&mut self, value: &str) {
        self.append(StringView::from(value));
    }

    /// Content followed by the terminator.
    #[inline]
    pub fn cstr(&self) -> &[u8] {
        self.data.as_slice()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data.as_slice()[..self.count()]
    }

    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    #[inline]
    pub fn as_view(&self) -> StringView<'_> {
        StringView::new(self.as_bytes())
    }

    /// Bytes `start..end` of the content.
    pub fn view(&self, start: usize, end: usize) -> StringView<'_> {
        self.as_view().view(start, end)
    }

    pub fn starts_with<P: AsRef<[u8]>>(&self, prefix: P) -> bool {
        self.as_bytes().starts_with(prefix.as_ref())
    }

    pub fn ends_with<P: AsRef<[u8]>>(&self, suffix: P) -> bool {
        self.as_bytes().ends_with(suffix.as_ref())
    }

    /// Copies the content into a string from `allocator`.
    pub fn copy<'b, B: Allocator + ?Sized>(&self, allocator: &'b B) -> String<'b, B> {
        String::from_bytes(allocator, self.as_bytes())
    }
}

/// Builds a [`String`] in the given allocator with `format!` syntax.
///
/// ```
/// use compartment::{format_in, ArenaAllocator};
///
/// let arena = ArenaAllocator::new();
/// let s = format_in!(&arena, "{} + {} = {}", 1, 2, 3);
/// assert_eq!(s, "1 + 2 = 3");
/// ```
#[macro_export]
macro_rules! format_in {
    ($allocator:expr, $($arg:tt)*) => {
        $crate::String::format($allocator, format_args!($($arg)*))
    };
}

impl<'a, A: Allocator + ?Sized> fmt::Write for String<'a, A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl<'a, A: Allocator + ?Sized> fmt::Display for String<'a, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_view(), f)
    }
}

impl<'a, A: Allocator + ?Sized> fmt::Debug for String<'a, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<'a, 'b, A: Allocator + ?Sized, B: Allocator + ?Sized> PartialEq<String<'b, B>> for String<'a, A> {
    fn eq(&self, other: &String<'b, B>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, A: Allocator + ?Sized> Eq for String<'a, A> {}

impl<'a, A: Allocator + ?Sized> PartialEq<str> for String<'a, A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, 's, A: Allocator + ?Sized> PartialEq<&'s str> for String<'a, A> {
    fn eq(&self, other: &&'s str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, 's, A: Allocator + ?Sized> PartialEq<StringView<'s>> for String<'a, A> {
    fn eq(&self, other: &StringView<'s>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, 's, A: Allocator + ?Sized> PartialEq<String<'a, A>> for StringView<'s> {
    fn eq(&self, other: &String<'a, A>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, A: Allocator + ?Sized> Hash for String<'a, A> {
    #[inline]
    fn hash_value(&self) -> u64 {
        fnv1(self.as_bytes())
    }
}

impl<'a, A: Allocator + ?Sized> AsRef<[u8]> for String<'a, A> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'a, A: Allocator + ?Sized> Borrow<[u8]> for String<'a, A> {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod string_tests {
    use super::String;
    use crate::{ArenaAllocator, Hash, List, StringView, Table};
    use proptest::prelude::*;

    #[test]
    fn starts_terminated() {
        let arena = ArenaAllocator::new();
        let s = String::new(&arena);
        assert_eq!(s.count(), 0);
        assert_eq!(s.cstr(), b"\0");
        assert_eq!(s.capacity(), String::<ArenaAllocator>::DEFAULT_CAPACITY);
    }

    #[test]
    fn push_keeps_terminator_last() {
        let arena = ArenaAllocator::new();
        let mut s = String::alloc(&arena, 1);
        for byte in b"abcdef" {
            s.push(*byte);
        }
        assert_eq!(s.cstr(), b"abcdef\0");
        assert_eq!(s, "abcdef");
    }

    #[test]
    fn format_append_and_format_append() {
        let arena = ArenaAllocator::new();
        let mut s = String::format(&arena, format_args!("hello {}!", "world"));
        assert_eq!(s.capacity(), 12);
        s.append(StringView::from(" and friends"));
        s.format_append(format_args!(" from {}", "Rust"));
        assert_eq!(s, "hello world! and friends from Rust");
        assert_eq!(s.cstr().last(), Some(&0));
    }

    #[test]
    fn format_in_macro() {
        let arena = ArenaAllocator::new();
        let s = format_in!(&arena, "{:>4}|{:<3}|", 7, "x");
        assert_eq!(s, "   7|x  |");
    }

    #[test]
    fn append_string_from_another_allocator() {
        let first = ArenaAllocator::new();
        let second = ArenaAllocator::new();
        let mut a = String::from_str(&first, "left-");
        let b = String::from_str(&second, "right");
        a.append_string(&b);
        assert_eq!(a, "left-right");
        assert_eq!(b, "right");
        let copied = a.copy(&second);
        assert_eq!(copied, a);
    }

    #[test]
    fn from_list_adds_terminator() {
        let arena = ArenaAllocator::new();
        let mut list = List::<u8, _>::new(&arena);
        list.extend_from_slice(b"list");
        let s = String::from_list(list);
        assert_eq!(s.count(), 4);
        assert_eq!(s.cstr(), b"list\0");
    }

    #[test]
    fn views_and_affixes() {
        let arena = ArenaAllocator::new();
        let s = String::from_str(&arena, "compartment");
        assert_eq!(s.view(0, 4), "comp");
        assert!(s.starts_with("compart"));
        assert!(s.ends_with("ment"));
        assert!(!s.ends_with("mint"));
        assert_eq!(StringView::from("compartment"), s);
    }

    #[test]
    fn hashes_like_view_and_str() {
        let arena = ArenaAllocator::new();
        let s = String::from_str(&arena, "123");
        assert_eq!(s.hash_value(), 0xD97FFA186C3A60BB);
        assert_eq!(s.hash_value(), s.as_view().hash_value());
    }

    #[test]
    fn table_keyed_by_string_finds_bytes() {
        let arena = ArenaAllocator::new();
        let mut table = Table::new(&arena);
        table.put(String::from_str(&arena, "one"), 1);
        table.put(String::from_str(&arena, "two"), 2);
        assert_eq!(table.get(&b"two"[..]).into_option(), Some(2));
        assert!(!table.has(&b"three"[..]));
    }

    #[test]
    fn display_and_debug() {
        let arena = ArenaAllocator::new();
        let s = String::from_str(&arena, "say \"hi\"");
        assert_eq!(format!("{}", s), "say \"hi\"");
        assert_eq!(format!("{:?}", s), "\"say \\\"hi\\\"\"");
        assert_eq!(s.as_str(), Ok("say \"hi\""));
    }

    proptest! {
        #[test]
        fn terminator_follows_content(pieces in proptest::collection::vec(proptest::collection::vec(1u8..=255, 0..20), 0..20)) {
            let arena = ArenaAllocator::new();
            let mut s = String::alloc(&arena, 0);
            let mut expected = Vec::new();
            for (i, piece) in pieces.iter().enumerate() {
                if i % 2 == 0 {
                    s.append(StringView::new(piece));
                } else {
                    for byte in piece {
                        s.push(*byte);
                    }
                }
                expected.extend_from_slice(piece);
                prop_assert_eq!(s.count(), expected.len());
                prop_assert_eq!(s.cstr().last(), Some(&0));
                prop_assert_eq!(s.as_bytes(), &expected[..]);
            }
        }
    }
}
