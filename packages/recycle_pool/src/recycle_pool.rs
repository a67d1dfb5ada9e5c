use std::marker::PhantomData;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::{fmt, mem, ptr};

/// A fixed-capacity lock-free pool of recycled objects of one type.
///
/// The pool holds up to `CAPACITY` objects that have been handed back via
/// [`release()`][Self::release], so that a later [`acquire()`][Self::acquire]
/// can reuse one instead of going through the allocator. This trades a small,
/// bounded amount of memory for fewer allocator round trips on hot paths
/// where small objects churn rapidly (e.g. path or glyph structures built
/// per frame).
///
/// # Concurrency
///
/// `acquire` and `release` may be called from any number of threads with no
/// external locking. Every operation is a bounded number of atomic exchanges
/// (at most `CAPACITY`), so no thread ever waits on another. Each slot's
/// content can be claimed by exactly one successful exchange, which rules out
/// the same object being returned to two callers.
///
/// The pool may transiently report empty while a concurrent `release` is in
/// flight. That race is accepted: the cost is one extra allocation by the
/// caller, never a correctness violation.
///
/// An advisory scan-start hint remembers roughly where the last operation
/// succeeded. It is maintained with relaxed atomics and may be arbitrarily
/// stale; it only shortens scans, it never affects the outcome.
///
/// Because construction is `const`, a pool can be a `static`, which is the
/// typical deployment: one process-wide pool per recycled object type.
///
/// # Example
///
/// ```rust
/// use recycle_pool::RecyclePool;
///
/// static POOL: RecyclePool<Vec<u8>, 8> = RecyclePool::new();
///
/// // Nothing has been released yet, so the caller allocates fresh.
/// assert!(POOL.acquire().is_none());
///
/// POOL.release(Box::new(vec![0_u8; 4096]));
///
/// // The next acquire reuses the released object.
/// let recycled = POOL.acquire().expect("just released one");
/// assert_eq!(recycled.len(), 4096);
/// ```
pub struct RecyclePool<T, const CAPACITY: usize = 16> {
    /// Each slot independently holds either null (empty) or a pointer to an
    /// object the pool exclusively owns. Slots transition between the two
    /// states only through atomic exchange.
    slots: [AtomicPtr<T>; CAPACITY],

    /// Advisory index near which the last operation succeeded. Never
    /// authoritative - scans fall back to walking every slot.
    top: AtomicUsize,

    /// The pool owns the objects its slots point to.
    _owner: PhantomData<Box<T>>,
}

impl<T, const CAPACITY: usize> RecyclePool<T, CAPACITY> {
    /// Creates an empty pool.
    ///
    /// # Panics
    ///
    /// Panics if `CAPACITY` is zero (at compile time when used in a `const`
    /// context).
    #[must_use]
    pub const fn new() -> Self {
        assert!(CAPACITY > 0, "RecyclePool must have non-zero capacity");

        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; CAPACITY],
            top: AtomicUsize::new(0),
            _owner: PhantomData,
        }
    }

    /// Takes a previously released object out of the pool, or `None` if no
    /// object is available (the caller then allocates through the normal
    /// path).
    ///
    /// Scans from the highest index downward so recently released objects
    /// are found first, starting near the advisory hint.
    pub fn acquire(&self) -> Option<Box<T>> {
        // Fast path: the slot just below the hint is where the most recent
        // release usually landed.
        let hint = self.top.load(Ordering::Relaxed);
        let index = hint.saturating_sub(1).min(Self::last_index());

        let ptr = self.slot(index).swap(ptr::null_mut(), Ordering::Acquire);
        if !ptr.is_null() {
            self.top.store(index, Ordering::Relaxed);

            // SAFETY: Non-null slot contents always come from
            // `Box::into_raw` in `release()`, and the swap above made us
            // the sole owner.
            return Some(unsafe { Box::from_raw(ptr) });
        }

        // Either empty or contended - fall back to the full scan.
        self.acquire_search()
    }

    #[cfg_attr(test, mutants::skip)] // Scan order is a heuristic; mutants only shuffle it.
    fn acquire_search(&self) -> Option<Box<T>> {
        for index in (0..CAPACITY).rev() {
            let ptr = self.slot(index).swap(ptr::null_mut(), Ordering::Acquire);
            if !ptr.is_null() {
                self.top.store(index, Ordering::Relaxed);

                // SAFETY: As in `acquire()` - published by `Box::into_raw`
                // and claimed by exactly this one successful swap.
                return Some(unsafe { Box::from_raw(ptr) });
            }
        }

        // Observed empty; point the next release at the bottom.
        self.top.store(0, Ordering::Relaxed);
        None
    }

    /// Hands an object back to the pool for later reuse.
    ///
    /// Scans from the lowest index upward, starting near the advisory hint.
    /// If every slot is occupied the object is dropped immediately - the
    /// pool never retains more than `CAPACITY` objects.
    pub fn release(&self, value: Box<T>) {
        let ptr = Box::into_raw(value);

        // Fast path: the slot the hint points at is usually free.
        let hint = self.top.load(Ordering::Relaxed).min(Self::last_index());
        if self.try_publish(hint, ptr) {
            return;
        }

        for index in 0..CAPACITY {
            if self.try_publish(index, ptr) {
                return;
            }
        }

        // Pool full: the object goes back to the allocator instead.
        // SAFETY: We took ownership from `Box::into_raw` above and no slot
        // accepted the pointer, so we still own it exclusively.
        drop(unsafe { Box::from_raw(ptr) });
    }

    fn try_publish(&self, index: usize, ptr: *mut T) -> bool {
        if self
            .slot(index)
            .compare_exchange(ptr::null_mut(), ptr, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let next = index
            .checked_add(1)
            .expect("slot indexes are bounded by CAPACITY");
        self.top.store(next, Ordering::Relaxed);

        true
    }

    /// Drops every retained object and resets the pool to empty.
    ///
    /// This is a teardown operation: the `&mut self` receiver guarantees no
    /// `acquire`/`release` can run concurrently, which the lock-free slots
    /// alone would not allow us to assume.
    pub fn drain(&mut self) {
        for slot in &mut self.slots {
            let ptr = mem::replace(slot.get_mut(), ptr::null_mut());

            if !ptr.is_null() {
                // SAFETY: Published from `Box::into_raw`; exclusive access
                // through `&mut self` means nobody else can claim it.
                drop(unsafe { Box::from_raw(ptr) });
            }
        }

        *self.top.get_mut() = 0;
    }

    /// A relaxed snapshot of how many slots are occupied.
    ///
    /// Under concurrent use the value is stale the moment it is produced;
    /// it exists for diagnostics, not for control flow.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !slot.load(Ordering::Relaxed).is_null())
            .count()
    }

    fn slot(&self, index: usize) -> &AtomicPtr<T> {
        self.slots
            .get(index)
            .expect("slot indexes are always clamped to CAPACITY")
    }

    #[must_use]
    fn last_index() -> usize {
        CAPACITY
            .checked_sub(1)
            .expect("capacity is asserted non-zero at construction")
    }
}

impl<T, const CAPACITY: usize> Default for RecyclePool<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for RecyclePool<T, CAPACITY> {
    fn drop(&mut self) {
        self.drain();
    }
}

impl<T, const CAPACITY: usize> fmt::Debug for RecyclePool<T, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclePool")
            .field("capacity", &CAPACITY)
            .field("occupied", &self.occupied())
            .finish_non_exhaustive()
    }
}

// SAFETY: Sharing the pool across threads transfers exclusively owned boxes
// between threads via acquire/release, which requires `T: Send`. No `&T` is
// ever produced from a shared pool reference, so `T: Sync` is not needed.
unsafe impl<T: Send, const CAPACITY: usize> Sync for RecyclePool<T, CAPACITY> {}
