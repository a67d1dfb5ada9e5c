use std::alloc::{Layout, alloc, dealloc};
use std::num::NonZero;
use std::ptr::NonNull;
use std::slice;

use crate::{Error, Point, Result};

/// A heap-allocated chunk of points within a [`PointChain`][crate::PointChain].
///
/// The header and the point storage live in a single allocation: the points
/// start at the first properly aligned offset past the header. A chunk is
/// created with its first point already known (chunks only come into
/// existence when the previous chunk overflows), so it is never observed
/// empty except transiently while the buffer removes it.
///
/// Chunks never move once allocated, which is what lets the buffer hold a
/// raw tail pointer across moves of the buffer itself.
#[derive(Debug)]
pub(crate) struct Chain {
    /// First point slot, inside the same allocation as the header.
    points: NonNull<Point>,

    /// Number of occupied point slots.
    len: usize,

    /// Total number of point slots in this chunk.
    capacity: NonZero<usize>,

    /// The next chunk in the ownership chain, if any. The buffer owns every
    /// chunk reachable through these links.
    next: Option<NonNull<Chain>>,
}

impl Chain {
    /// Allocates a chunk with room for `capacity` points.
    ///
    /// The returned chunk is owned by the caller and must eventually be
    /// released via [`free()`][Self::free].
    pub(crate) fn allocate(capacity: NonZero<usize>) -> Result<NonNull<Self>> {
        let (layout, points_offset) = Self::layout(capacity)?;

        // SAFETY: The layout is never zero-sized - it contains at least the header.
        let base = unsafe { alloc(layout) };

        let Some(header) = NonNull::new(base.cast::<Self>()) else {
            return Err(Error::AllocationFailed {
                capacity: capacity.get(),
            });
        };

        // SAFETY: The offset was computed by `Layout::extend`, so it stays
        // within the allocation we just made.
        let points = unsafe { header.cast::<u8>().byte_add(points_offset) }.cast::<Point>();

        // SAFETY: Freshly allocated, properly aligned and valid for writes.
        unsafe {
            header.write(Self {
                points,
                len: 0,
                capacity,
                next: None,
            });
        }

        Ok(header)
    }

    /// Releases a chunk allocated by [`allocate()`][Self::allocate].
    ///
    /// `Point` has no drop glue, so releasing the block is all the cleanup
    /// there is - any points still stored are simply forgotten.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `chain` was returned by `allocate()`,
    /// has not been freed before and is not referenced by anything afterwards.
    pub(crate) unsafe fn free(chain: NonNull<Self>) {
        // SAFETY: The header is initialized per the caller's contract.
        let capacity = unsafe { chain.as_ref() }.capacity;

        let (layout, _) = Self::layout(capacity)
            .expect("layout was calculable when the chunk was allocated, so it still is");

        // SAFETY: Same layout as at allocation time; the caller guarantees
        // this is the sole release of the block.
        unsafe {
            dealloc(chain.as_ptr().cast(), layout);
        }
    }

    fn layout(capacity: NonZero<usize>) -> Result<(Layout, usize)> {
        let overflow = |_| Error::AllocationFailed {
            capacity: capacity.get(),
        };

        let points = Layout::array::<Point>(capacity.get()).map_err(overflow)?;
        let (layout, points_offset) = Layout::new::<Self>().extend(points).map_err(overflow)?;

        Ok((layout.pad_to_align(), points_offset))
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity.get()
    }

    #[must_use]
    pub(crate) fn next(&self) -> Option<NonNull<Self>> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<NonNull<Self>>) {
        self.next = next;
    }

    /// The occupied point slots, in insertion order.
    #[must_use]
    pub(crate) fn as_slice(&self) -> &[Point] {
        // SAFETY: The first `len` slots were initialized by `push()` and the
        // storage lives as long as the header we are borrowed from.
        unsafe { slice::from_raw_parts(self.points.as_ptr(), self.len) }
    }

    /// # Panics
    ///
    /// Panics if the chunk is full.
    pub(crate) fn push(&mut self, point: Point) {
        assert!(!self.is_full(), "push into a full chunk");

        // SAFETY: `len < capacity`, so the slot is within the allocation.
        unsafe {
            self.points.add(self.len).write(point);
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("guarded by the fullness check above");
    }

    /// # Panics
    ///
    /// Panics if the chunk is empty.
    pub(crate) fn pop(&mut self) -> Point {
        self.len = self
            .len
            .checked_sub(1)
            .expect("pop from an empty chunk");

        // SAFETY: The slot at the new `len` was initialized by a previous push.
        unsafe { self.points.add(self.len).read() }
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn push_pop_round_trip() {
        let chunk_ptr = Chain::allocate(nz!(4)).unwrap();

        // SAFETY: Freshly allocated, exclusively ours.
        let chunk = unsafe { &mut *chunk_ptr.as_ptr() };

        chunk.push(Point::new(1, 2));
        chunk.push(Point::new(3, 4));

        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.as_slice(), &[Point::new(1, 2), Point::new(3, 4)]);

        assert_eq!(chunk.pop(), Point::new(3, 4));
        assert_eq!(chunk.pop(), Point::new(1, 2));
        assert!(chunk.is_empty());

        // SAFETY: Allocated above, freed exactly once, no references remain.
        unsafe { Chain::free(chunk_ptr) };
    }

    #[test]
    fn fills_to_capacity() {
        let chunk_ptr = Chain::allocate(nz!(2)).unwrap();

        // SAFETY: Freshly allocated, exclusively ours.
        let chunk = unsafe { &mut *chunk_ptr.as_ptr() };

        assert!(!chunk.is_full());
        chunk.push(Point::new(0, 0));
        chunk.push(Point::new(0, 1));
        assert!(chunk.is_full());

        // SAFETY: Allocated above, freed exactly once, no references remain.
        unsafe { Chain::free(chunk_ptr) };
    }

    #[test]
    #[should_panic]
    fn push_when_full_panics() {
        let chunk_ptr = Chain::allocate(nz!(1)).unwrap();

        // SAFETY: Freshly allocated, exclusively ours.
        let chunk = unsafe { &mut *chunk_ptr.as_ptr() };

        chunk.push(Point::new(0, 0));

        // Panics; the chunk leaks, which does not matter in a test.
        chunk.push(Point::new(0, 1));
    }
}
