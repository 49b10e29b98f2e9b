use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::allocator::{Allocator, AllocatorExt};
use crate::error::alloc_failed;
use crate::optional::OptionalPtr;

struct Node<T> {
    prev: OptionalPtr<Node<T>>,
    next: OptionalPtr<Node<T>>,
    value: T,
}

/// Doubly linked list with one allocation per node.
///
/// Popped nodes are handed back to the allocator, which for the bump
/// allocators only reclaims the most recent one.
pub struct LinkedList<'a, T, A: Allocator + ?Sized> {
    head: OptionalPtr<Node<T>>,
    tail: OptionalPtr<Node<T>>,
    count: usize,
    allocator: &'a A,
    _marker: PhantomData<T>,
}

impl<'a, T, A: Allocator + ?Sized> LinkedList<'a, T, A> {
    /// An empty list. Nothing is allocated until the first node.
    pub fn alloc(allocator: &'a A) -> Self {
        LinkedList { head: OptionalPtr::NONE, tail: OptionalPtr::NONE, count: 0, allocator, _marker: PhantomData }
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
    pub fn allocator(&self) -> &'a A {
        self.allocator
    }

    fn new_node(&self, value: T, prev: OptionalPtr<Node<T>>, next: OptionalPtr<Node<T>>) -> NonNull<Node<T>> {
        let node = self.allocator.alloc::<Node<T>>(1).unwrap_or_else(|e| alloc_failed(e));
        unsafe { node.as_ptr().write(Node { prev, next, value }) };
        node
    }

    pub fn append(&mut self, value: T) {
        let node = self.new_node(value, self.tail, OptionalPtr::NONE);
        match unsafe { self.tail.as_mut() } {
            Some(tail) => tail.next = node.into(),
            None => self.head = node.into(),
        }
        self.tail = node.into();
        self.count += 1;
    }

    pub fn prepend(&mut self, value: T) {
        let node = self.new_node(value, OptionalPtr::NONE, self.head);
        match unsafe { self.head.as_mut() } {
            Some(head) => head.prev = node.into(),
            None => self.tail = node.into(),
        }
        self.head = node.into();
        self.count += 1;
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if !self.head.has_value() {
            return None;
        }
        let node = self.head.get();
        let Node { next, value, .. } = unsafe { node.as_ptr().read() };
        match unsafe { next.as_mut() } {
            Some(next) => next.prev = OptionalPtr::NONE,
            None => self.tail = OptionalPtr::NONE,
        }
        self.head = next;
        self.count -= 1;
        unsafe { self.allocator.dealloc(node, 1) };
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if !self.tail.has_value() {
            return None;
        }
        let node = self.tail.get();
        let Node { prev, value, .. } = unsafe { node.as_ptr().read() };
        match unsafe { prev.as_mut() } {
            Some(prev) => prev.next = OptionalPtr::NONE,
            None => self.head = OptionalPtr::NONE,
        }
        self.tail = prev;
        self.count -= 1;
        unsafe { self.allocator.dealloc(node, 1) };
        Some(value)
    }

    pub fn front(&self) -> Option<&T> {
        unsafe { self.head.as_ref() }.map(|node| &node.value)
    }

    pub fn back(&self) -> Option<&T> {
        unsafe { self.tail.as_ref() }.map(|node| &node.value)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        unsafe { self.head.as_mut() }.map(|node| &mut node.value)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        unsafe { self.tail.as_mut() }.map(|node| &mut node.value)
    }

    /// Front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { next: self.head, remaining: self.count, _marker: PhantomData }
    }
}

impl<'a, T, A: Allocator + ?Sized> Drop for LinkedList<'a, T, A> {
    fn drop(&mut self) {
        while self.pop_back().is_some() {}
    }
}

impl<'a, T: fmt::Debug, A: Allocator + ?Sized> fmt::Debug for LinkedList<'a, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'l, 'a, T, A: Allocator + ?Sized> IntoIterator for &'l LinkedList<'a, T, A> {
    type Item = &'l T;
    type IntoIter = Iter<'l, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'l, T> {
    next: OptionalPtr<Node<T>>,
    remaining: usize,
    _marker: PhantomData<&'l T>,
}

impl<'l, T> Iterator for Iter<'l, T> {
    type Item = &'l T;

    fn next(&mut self) -> Option<&'l T> {
        let node: &'l Node<T> = unsafe { self.next.as_ref() }?;
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'l, T> ExactSizeIterator for Iter<'l, T> {}

#[cfg(test)]
mod linked_tests {
    use super::LinkedList;
    use crate::dropflag::{DropFlag, Droppable};
    use crate::{ArenaAllocator, FixedBufferAllocator};

    #[test]
    fn append_thousand_then_prepend() {
        let arena = ArenaAllocator::new();
        let mut list = LinkedList::alloc(&arena);
        for i in 0..1000 {
            list.append(i);
        }
        assert_eq!(list.len(), 1000);
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.back(), Some(&999));

        list.prepend(1337);
        assert_eq!(list.front(), Some(&1337));
        assert_eq!(list.back(), Some(&999));
        assert_eq!(list.iter().nth(1), Some(&0));
        assert_eq!(list.iter().len(), 1001);
    }

    #[test]
    fn pop_front_relinks_the_new_head() {
        let arena = ArenaAllocator::new();
        let mut list = LinkedList::alloc(&arena);
        list.append('b');
        list.append('c');
        list.prepend('a');
        assert_eq!(list.pop_front(), Some('a'));
        assert_eq!(list.pop_back(), Some('c'));
        assert_eq!(list.front(), list.back());
        assert_eq!(list.pop_front(), Some('b'));
        assert!(list.is_empty());
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);

        list.prepend('z');
        assert_eq!(list.back(), Some(&'z'));
        assert_eq!(list.iter().collect::<String>(), "z");
    }

    #[test]
    fn popped_node_is_reused_by_bump_allocator() {
        let fixed = unsafe { FixedBufferAllocator::new() };
        let mut list = LinkedList::alloc(&fixed);
        list.append(1u64);
        let offset = fixed.offset();
        list.append(2u64);
        list.pop_back();
        assert_eq!(fixed.offset(), offset);
    }

    #[test]
    fn front_mut_and_back_mut() {
        let arena = ArenaAllocator::new();
        let mut list = LinkedList::alloc(&arena);
        list.append(1);
        list.append(2);
        *list.front_mut().unwrap() += 10;
        *list.back_mut().unwrap() += 20;
        assert_eq!(format!("{:?}", list), "[11, 22]");
    }

    #[test]
    fn drop_runs_destructors() {
        let arena = ArenaAllocator::new();
        let flag = DropFlag::default();
        let mut list = LinkedList::alloc(&arena);
        for i in 0..10 {
            list.append(Droppable::with_value(&flag, i));
        }
        std::mem::drop(list.pop_front());
        assert_eq!(flag.get(), 1);
        std::mem::drop(list);
        assert_eq!(flag.get(), 10);
    }
}
