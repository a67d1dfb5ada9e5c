//! A fixed-capacity, lock-free object-recycling pool.
//!
//! This crate provides [`RecyclePool`], a bounded cache of previously
//! allocated, currently unused objects of one type. Hot paths that churn
//! through small objects (a rasterizer building path or glyph structures per
//! frame) release them into the pool instead of freeing them, and acquire
//! them back instead of allocating.
//!
//! # Key properties
//!
//! - **Lock-free**: `acquire` and `release` are a bounded number of atomic
//!   exchanges; no thread ever blocks on another.
//! - **Bounded**: the pool never retains more than its capacity; excess
//!   releases drop the object immediately.
//! - **No failure modes**: an empty pool and a full pool are both normal
//!   outcomes - the caller falls back to plain allocation or deallocation.
//! - **`const` construction**: pools can be `static`, the usual deployment
//!   for per-type recycling state.
//!
//! # Example
//!
//! ```rust
//! use recycle_pool::RecyclePool;
//!
//! struct PathScratch {
//!     segments: Vec<u32>,
//! }
//!
//! static SCRATCH_POOL: RecyclePool<PathScratch, 16> = RecyclePool::new();
//!
//! // Acquire falls back to allocation when the pool has nothing to offer.
//! let mut scratch = SCRATCH_POOL.acquire().unwrap_or_else(|| {
//!     Box::new(PathScratch {
//!         segments: Vec::new(),
//!     })
//! });
//!
//! scratch.segments.push(42);
//!
//! // Hand the object back for the next user instead of freeing it.
//! scratch.segments.clear();
//! SCRATCH_POOL.release(scratch);
//!
//! assert!(SCRATCH_POOL.acquire().is_some());
//! ```

mod recycle_pool;

pub use recycle_pool::*;
