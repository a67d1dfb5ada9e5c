use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::num::NonZero;
use std::ptr::NonNull;
use std::{fmt, slice};

use new_zealand::nz;

use crate::{Chain, Point, Result};

/// A growable buffer of 2D points stored as a chain of fixed-capacity chunks.
///
/// The first chunk is embedded directly in the buffer, so short point
/// sequences (the overwhelmingly common case when tracing paths) never touch
/// the heap. Once the embedded chunk fills up, further points go into
/// heap-allocated chunks whose capacities double each time, bounding the
/// number of chunks to O(log n) for n points.
///
/// Filled chunks are never reallocated or moved, so points that have been
/// appended stay at a stable address until they are removed. Only the notion
/// of which chunk is the *tail* (the one receiving appends) moves.
///
/// # Removal
///
/// Points are removed strictly from the end via [`pop()`][Self::pop]. When
/// the last point of a heap chunk is removed, that chunk is freed and the
/// previous chunk becomes the tail again. The embedded chunk is never freed,
/// so a buffer that has been emptied appends into it again without
/// allocating.
///
/// # Example
///
/// ```rust
/// use point_chain::{Point, PointChain};
///
/// let mut path = PointChain::<16>::new();
///
/// path.push(Point::new(0, 0))?;
/// path.push(Point::new(100, 0))?;
/// path.push(Point::new(100, 100))?;
///
/// assert_eq!(path.first(), Some(&Point::new(0, 0)));
/// assert_eq!(path.last(), Some(&Point::new(100, 100)));
/// assert_eq!(path.pop(), Some(Point::new(100, 100)));
/// assert_eq!(path.len(), 2);
/// # Ok::<(), point_chain::Error>(())
/// ```
pub struct PointChain<const INLINE_CAPACITY: usize = 16> {
    /// Storage of the embedded head chunk.
    inline: [MaybeUninit<Point>; INLINE_CAPACITY],

    /// Number of points in the embedded head chunk.
    inline_len: usize,

    /// First heap chunk, if any. Transitively owns every later chunk through
    /// the `next` links.
    spill: Option<NonNull<Chain>>,

    /// The chunk currently receiving appends. `None` means the embedded head
    /// chunk is the tail. Heap chunks never move, so this pointer stays valid
    /// when the buffer itself is moved.
    tail: Option<NonNull<Chain>>,

    /// Total number of points across all chunks.
    len: usize,
}

impl<const INLINE_CAPACITY: usize> PointChain<INLINE_CAPACITY> {
    /// Creates an empty buffer. Does not allocate.
    ///
    /// # Panics
    ///
    /// Panics if `INLINE_CAPACITY` is zero.
    #[must_use]
    pub fn new() -> Self {
        assert!(
            INLINE_CAPACITY > 0,
            "PointChain must have non-zero inline capacity"
        );

        Self {
            inline: [MaybeUninit::uninit(); INLINE_CAPACITY],
            inline_len: 0,
            spill: None,
            tail: None,
            len: 0,
        }
    }

    /// The number of points in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of points the buffer can hold without allocating another
    /// chunk, including the points already stored.
    #[must_use]
    pub fn capacity(&self) -> usize {
        let mut capacity = INLINE_CAPACITY;

        let mut next = self.spill;
        while let Some(chunk) = next {
            // SAFETY: Every chunk reachable through the links is owned by
            // this buffer and alive.
            let chunk = unsafe { chunk.as_ref() };

            capacity = capacity
                .checked_add(chunk.capacity().get())
                .expect("total capacity cannot exceed usize - the chunks already fit in memory");
            next = chunk.next();
        }

        capacity
    }

    /// Appends a point after the current last point.
    ///
    /// The fast path stores into spare tail capacity without allocating.
    /// When the tail chunk is full, a new chunk with twice its capacity is
    /// allocated first; if that allocation fails the buffer is left
    /// unchanged and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`][crate::Error::AllocationFailed]
    /// if a new chunk was needed and the system allocator returned no memory.
    pub fn push(&mut self, point: Point) -> Result<()> {
        let tail_has_room = match self.tail {
            None => self.inline_len < INLINE_CAPACITY,
            // SAFETY: The tail pointer always references a live chunk owned
            // by this buffer.
            Some(tail) => !unsafe { tail.as_ref() }.is_full(),
        };

        if tail_has_room {
            match self.tail {
                None => {
                    // SAFETY: Guarded by the room check above.
                    let slot = unsafe { self.inline.get_unchecked_mut(self.inline_len) };
                    slot.write(point);

                    self.inline_len = self
                        .inline_len
                        .checked_add(1)
                        .expect("guarded by the room check above");
                }
                Some(mut tail) => {
                    // SAFETY: Live chunk owned by this buffer; `&mut self`
                    // guarantees no aliasing access.
                    unsafe { tail.as_mut() }.push(point);
                }
            }
        } else {
            self.grow(point)?;
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("point count overflowed usize");

        #[cfg(debug_assertions)]
        self.integrity_check();

        Ok(())
    }

    /// Allocates a new tail chunk with double the previous capacity and
    /// stores `point` as its first element. On failure nothing is linked,
    /// leaving the buffer untouched.
    fn grow(&mut self, point: Point) -> Result<()> {
        let previous_capacity = match self.tail {
            None => NonZero::new(INLINE_CAPACITY).expect("asserted non-zero in new()"),
            // SAFETY: Live chunk owned by this buffer.
            Some(tail) => unsafe { tail.as_ref() }.capacity(),
        };

        let capacity = previous_capacity
            .checked_mul(nz!(2))
            .expect("chunk capacity doubling overflowed usize, yet the previous chunk already fit in memory");

        let mut chunk = Chain::allocate(capacity)?;

        // SAFETY: Freshly allocated and exclusively ours until linked.
        unsafe { chunk.as_mut() }.push(point);

        match self.tail {
            None => self.spill = Some(chunk),
            Some(mut tail) => {
                // SAFETY: Live chunk owned by this buffer; `&mut self`
                // guarantees no aliasing access.
                unsafe { tail.as_mut() }.set_next(Some(chunk));
            }
        }

        self.tail = Some(chunk);
        Ok(())
    }

    /// A reference to the first point ever appended, or `None` when empty.
    ///
    /// The first point lives in the embedded head chunk and its slot is
    /// never overwritten while any points remain.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        if self.is_empty() {
            return None;
        }

        debug_assert!(self.inline_len > 0, "non-empty buffer fills the head chunk first");

        // SAFETY: Slot 0 of the head chunk was initialized by the first push
        // and points are only ever removed tail-first.
        Some(unsafe { self.inline.get_unchecked(0).assume_init_ref() })
    }

    /// A reference to the most recently appended point, or `None` when empty.
    ///
    /// The reference is a transient view: it remains valid only until the
    /// next mutating call (the borrow checker enforces exactly this).
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        if self.is_empty() {
            return None;
        }

        match self.tail {
            None => {
                let index = self
                    .inline_len
                    .checked_sub(1)
                    .expect("non-empty buffer with an inline tail holds inline points");

                // SAFETY: In bounds and initialized by a previous push.
                Some(unsafe { self.inline.get_unchecked(index).assume_init_ref() })
            }
            Some(tail) => {
                // SAFETY: Live chunk owned by this buffer, borrowed for as
                // long as `self` is.
                let chunk = unsafe { tail.as_ref() };

                chunk.as_slice().last()
            }
        }
    }

    /// Removes and returns the last point, or `None` (a no-op) when empty.
    ///
    /// When this empties a heap chunk, the chunk is freed and the previous
    /// chunk becomes the tail again. The embedded head chunk is never freed.
    pub fn pop(&mut self) -> Option<Point> {
        if self.is_empty() {
            return None;
        }

        let point = match self.tail {
            None => {
                self.inline_len = self
                    .inline_len
                    .checked_sub(1)
                    .expect("non-empty buffer with an inline tail holds inline points");

                // SAFETY: In bounds and initialized by a previous push.
                unsafe { self.inline.get_unchecked(self.inline_len).assume_init_read() }
            }
            Some(mut tail) => {
                // SAFETY: Live chunk owned by this buffer; `&mut self`
                // guarantees no aliasing access.
                let chunk = unsafe { tail.as_mut() };

                let point = chunk.pop();

                if chunk.is_empty() {
                    self.remove_tail_chunk();
                }

                point
            }
        };

        self.len = self
            .len
            .checked_sub(1)
            .expect("guarded by the emptiness check above");

        #[cfg(debug_assertions)]
        self.integrity_check();

        Some(point)
    }

    /// Unlinks and frees the (empty) heap tail chunk, restoring the previous
    /// chunk as the tail. Must never leave the tail pointer referencing a
    /// freed chunk.
    fn remove_tail_chunk(&mut self) {
        let tail = self
            .tail
            .take()
            .expect("only called while the tail is a heap chunk");

        let spill = self
            .spill
            .expect("a heap tail implies at least one heap chunk");

        if spill == tail {
            self.spill = None;
        } else {
            let mut prev = spill;

            // SAFETY: The ownership chain is intact; the walk is bounded by
            // the chunk count. (Dereferences are reads of chunks we own.)
            while unsafe { prev.as_ref() }.next() != Some(tail) {
                // SAFETY: As above.
                prev = unsafe { prev.as_ref() }
                    .next()
                    .expect("the tail is reachable from the first heap chunk");
            }

            // SAFETY: Live chunk owned by this buffer; `&mut self`
            // guarantees no aliasing access.
            unsafe { prev.as_mut() }.set_next(None);

            self.tail = Some(prev);
        }

        // SAFETY: Allocated by `Chain::allocate` and unlinked above, so
        // nothing references it anymore.
        unsafe { Chain::free(tail) };
    }

    /// Removes every point and frees every heap chunk, retaining only the
    /// embedded head chunk. Equivalent to popping all points, but O(chunks).
    pub fn clear(&mut self) {
        self.free_heap_chunks();
        self.spill = None;
        self.tail = None;
        self.inline_len = 0;
        self.len = 0;
    }

    /// Iterates over all points in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            current: self.inline_points().iter(),
            next_chunk: self.spill,
            remaining: self.len,
            _buffer: PhantomData,
        }
    }

    /// The occupied slots of the embedded head chunk.
    fn inline_points(&self) -> &[Point] {
        // SAFETY: The first `inline_len` slots are initialized; `MaybeUninit<Point>`
        // has the same layout as `Point`.
        unsafe { slice::from_raw_parts(self.inline.as_ptr().cast::<Point>(), self.inline_len) }
    }

    fn free_heap_chunks(&mut self) {
        let mut next = self.spill;

        while let Some(chunk) = next {
            // SAFETY: Live chunk owned by this buffer.
            next = unsafe { chunk.as_ref() }.next();

            // SAFETY: Allocated by `Chain::allocate`; nothing references it
            // after this point.
            unsafe { Chain::free(chunk) };
        }
    }

    /// The number of heap chunks currently allocated.
    pub(crate) fn heap_chunk_count(&self) -> usize {
        let mut count = 0_usize;

        let mut next = self.spill;
        while let Some(chunk) = next {
            count = count
                .checked_add(1)
                .expect("chunk count is bounded by O(log n) of the point count");

            // SAFETY: Live chunk owned by this buffer.
            next = unsafe { chunk.as_ref() }.next();
        }

        count
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    fn integrity_check(&self) {
        assert!(
            self.inline_len <= INLINE_CAPACITY,
            "head chunk count exceeds its capacity"
        );

        if self.spill.is_some() {
            assert!(
                self.inline_len == INLINE_CAPACITY,
                "head chunk must be full once heap chunks exist"
            );
        }

        let mut observed_len = self.inline_len;
        let mut previous_capacity = INLINE_CAPACITY;
        let mut last_chunk = None;

        let mut next = self.spill;
        while let Some(chunk_ptr) = next {
            // SAFETY: Live chunk owned by this buffer.
            let chunk = unsafe { chunk_ptr.as_ref() };

            assert!(
                chunk.capacity().get() >= previous_capacity,
                "chunk capacities must form a non-decreasing sequence"
            );

            if chunk.next().is_some() {
                assert!(chunk.is_full(), "every chunk except the tail must be full");
            } else {
                assert!(
                    !chunk.is_empty(),
                    "an emptied heap tail must have been freed immediately"
                );
            }

            observed_len = observed_len
                .checked_add(chunk.len())
                .expect("guarded by total point count fitting in usize");
            previous_capacity = chunk.capacity().get();
            last_chunk = Some(chunk_ptr);
            next = chunk.next();
        }

        assert!(
            self.tail == last_chunk,
            "tail must reference the last chunk in the ownership chain"
        );

        assert!(
            self.len == observed_len,
            "running total must match the observed point count"
        );
    }
}

impl<const INLINE_CAPACITY: usize> Default for PointChain<INLINE_CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const INLINE_CAPACITY: usize> Drop for PointChain<INLINE_CAPACITY> {
    fn drop(&mut self) {
        self.free_heap_chunks();
    }
}

impl<const INLINE_CAPACITY: usize> fmt::Debug for PointChain<INLINE_CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointChain")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("heap_chunks", &self.heap_chunk_count())
            .finish_non_exhaustive()
    }
}

// SAFETY: The raw pointers reference heap chunks exclusively owned by the
// buffer and `Point` is plain data, so the whole structure may move between
// threads.
unsafe impl<const INLINE_CAPACITY: usize> Send for PointChain<INLINE_CAPACITY> {}

// SAFETY: There is no interior mutability - a shared reference only permits
// reads, so concurrent shared access is harmless.
unsafe impl<const INLINE_CAPACITY: usize> Sync for PointChain<INLINE_CAPACITY> {}

impl<'c, const INLINE_CAPACITY: usize> IntoIterator for &'c PointChain<INLINE_CAPACITY> {
    type Item = &'c Point;
    type IntoIter = Iter<'c>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the points of a [`PointChain`], in insertion order.
///
/// Walks the embedded head chunk first, then each heap chunk along the
/// ownership chain.
#[derive(Debug)]
pub struct Iter<'c> {
    /// Points remaining in the chunk currently being walked.
    current: slice::Iter<'c, Point>,

    /// The next chunk to walk, if any.
    next_chunk: Option<NonNull<Chain>>,

    /// Points not yet yielded, across all remaining chunks.
    remaining: usize,

    _buffer: PhantomData<&'c [Point]>,
}

impl<'c> Iterator for Iter<'c> {
    type Item = &'c Point;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(point) = self.current.next() {
                self.remaining = self
                    .remaining
                    .checked_sub(1)
                    .expect("remaining tracks exactly the points not yet yielded");

                return Some(point);
            }

            let chunk = self.next_chunk?;

            // SAFETY: The buffer is borrowed for 'c, keeping every chunk
            // alive and unmodified for at least that long.
            let chunk: &'c Chain = unsafe { chunk.as_ref() };

            self.current = chunk.as_slice().iter();
            self.next_chunk = chunk.next();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PointChain<16>: Send, Sync, Debug, Default);

    fn pt(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn smoke_test() {
        let mut buffer = PointChain::<4>::new();

        assert!(buffer.is_empty());
        assert_eq!(buffer.first(), None);
        assert_eq!(buffer.last(), None);

        buffer.push(pt(1, 1)).unwrap();
        buffer.push(pt(2, 2)).unwrap();

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.first(), Some(&pt(1, 1)));
        assert_eq!(buffer.last(), Some(&pt(2, 2)));

        assert_eq!(buffer.pop(), Some(pt(2, 2)));
        assert_eq!(buffer.pop(), Some(pt(1, 1)));
        assert_eq!(buffer.pop(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn first_is_stable_across_growth() {
        let mut buffer = PointChain::<4>::new();

        for i in 0..1000 {
            buffer.push(pt(i, -i)).unwrap();
            assert_eq!(buffer.first(), Some(&pt(0, 0)));
        }
    }

    #[test]
    fn last_tracks_latest_push() {
        let mut buffer = PointChain::<4>::new();

        for i in 0..100 {
            buffer.push(pt(i, i)).unwrap();
            assert_eq!(buffer.last(), Some(&pt(i, i)));
        }
    }

    #[test]
    fn pop_returns_points_in_reverse_order() {
        let mut buffer = PointChain::<4>::new();

        for i in 0..100 {
            buffer.push(pt(i, 0)).unwrap();
        }

        for i in (0..100).rev() {
            assert_eq!(buffer.pop(), Some(pt(i, 0)));
        }

        assert!(buffer.is_empty());
    }

    #[test]
    fn emptied_buffer_reuses_embedded_chunk() {
        let mut buffer = PointChain::<2>::new();

        for i in 0..10 {
            buffer.push(pt(i, 0)).unwrap();
        }

        for _ in 0..10 {
            _ = buffer.pop().unwrap();
        }

        assert!(buffer.is_empty());
        assert_eq!(buffer.heap_chunk_count(), 0);

        // The next push lands in slot 0 of the embedded chunk, no allocation.
        buffer.push(pt(42, 42)).unwrap();

        assert_eq!(buffer.inline_len, 1);
        assert!(buffer.tail.is_none());
        assert_eq!(buffer.first(), Some(&pt(42, 42)));
    }

    #[test]
    fn chunk_count_is_logarithmic() {
        let mut buffer = PointChain::<16>::new();

        for i in 0..1000 {
            buffer.push(pt(i, i)).unwrap();
        }

        // 16 inline + 32 + 64 + 128 + 256 + 512 = 1008 slots.
        assert_eq!(buffer.heap_chunk_count(), 5);
        assert_eq!(buffer.capacity(), 1008);
    }

    #[test]
    fn growth_scenario_with_tiny_head() {
        let mut buffer = PointChain::<2>::new();

        buffer.push(pt(1, 0)).unwrap();
        buffer.push(pt(2, 0)).unwrap();
        buffer.push(pt(3, 0)).unwrap();

        // P3 overflowed into a freshly allocated chunk.
        assert_eq!(buffer.heap_chunk_count(), 1);
        assert_eq!(buffer.last(), Some(&pt(3, 0)));

        // Removing P3 frees that chunk and restores the head as the tail.
        assert_eq!(buffer.pop(), Some(pt(3, 0)));
        assert_eq!(buffer.heap_chunk_count(), 0);
        assert!(buffer.tail.is_none());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.last(), Some(&pt(2, 0)));
    }

    #[test]
    fn pop_walks_back_across_multiple_chunks() {
        let mut buffer = PointChain::<2>::new();

        // 2 inline + 4 + 8 = enough for 14; fill three heap chunks.
        for i in 0..14 {
            buffer.push(pt(i, 0)).unwrap();
        }
        assert_eq!(buffer.heap_chunk_count(), 2);

        // Drain the last chunk entirely; the tail must step back to the
        // previous heap chunk, not to the head.
        for i in (6..14).rev() {
            assert_eq!(buffer.pop(), Some(pt(i, 0)));
        }
        assert_eq!(buffer.heap_chunk_count(), 1);
        assert_eq!(buffer.last(), Some(&pt(5, 0)));
    }

    #[test]
    fn clear_releases_heap_chunks_and_allows_reuse() {
        let mut buffer = PointChain::<2>::new();

        for i in 0..20 {
            buffer.push(pt(i, i)).unwrap();
        }
        assert!(buffer.heap_chunk_count() > 0);

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.heap_chunk_count(), 0);
        assert_eq!(buffer.first(), None);

        buffer.push(pt(7, 7)).unwrap();
        assert_eq!(buffer.first(), Some(&pt(7, 7)));
        assert_eq!(buffer.last(), Some(&pt(7, 7)));
    }

    #[test]
    fn iterates_in_insertion_order_across_chunks() {
        let mut buffer = PointChain::<2>::new();

        for i in 0..50 {
            buffer.push(pt(i, -i)).unwrap();
        }

        let collected: Vec<Point> = buffer.iter().copied().collect();
        let expected: Vec<Point> = (0..50).map(|i| pt(i, -i)).collect();

        assert_eq!(collected, expected);
        assert_eq!(buffer.iter().len(), 50);
    }

    #[test]
    fn iterator_is_fused_and_exact() {
        let mut buffer = PointChain::<4>::new();
        buffer.push(pt(1, 2)).unwrap();

        let mut iter = buffer.iter();
        assert_eq!(iter.size_hint(), (1, Some(1)));
        assert_eq!(iter.next(), Some(&pt(1, 2)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn empty_buffer_iterates_nothing() {
        let buffer = PointChain::<4>::new();

        assert_eq!(buffer.iter().next(), None);
    }

    #[test]
    fn moving_the_buffer_keeps_the_tail_valid() {
        let mut buffer = PointChain::<2>::new();

        for i in 0..5 {
            buffer.push(pt(i, 0)).unwrap();
        }

        // Move the buffer to a new location; the tail pointer references a
        // heap chunk, which did not move.
        let mut moved = buffer;

        moved.push(pt(5, 0)).unwrap();
        assert_eq!(moved.last(), Some(&pt(5, 0)));
        assert_eq!(moved.first(), Some(&pt(0, 0)));
    }

    #[test]
    #[should_panic]
    fn zero_inline_capacity_is_panic() {
        drop(PointChain::<0>::new());
    }
}
