//! Walks the occupied slots of the open-addressing containers.

/// Bit 0 of a slot's metadata byte.
pub(crate) const OCCUPIED: u8 = 1;

/// Yields the index of every occupied slot, in slot order.
///
/// The number of occupied slots is known up front, so this is exact-size and
/// stops scanning once the last one has been found.
#[derive(Clone)]
pub(crate) struct OccupiedSlots<'t> {
    meta: &'t [u8],
    index: usize,
    remaining: usize,
}

impl<'t> OccupiedSlots<'t> {
    pub fn new(meta: &'t [u8], occupied: usize) -> OccupiedSlots<'t> {
        OccupiedSlots { meta, index: 0, remaining: occupied }
    }
}

impl<'t> Iterator for OccupiedSlots<'t> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        while self.index < self.meta.len() {
            let index = self.index;
            self.index += 1;
            if self.meta[index] & OCCUPIED != 0 {
                self.remaining -= 1;
                return Some(index);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'t> ExactSizeIterator for OccupiedSlots<'t> {}
