//! A growable chained point buffer for accumulating polygon vertices.
//!
//! This crate provides [`PointChain`], an append-friendly ordered sequence of
//! 2D integer [`Point`]s designed for the hot path of a vector-graphics
//! rasterizer, where a fresh buffer is created per path, per frame.
//!
//! # Key properties
//!
//! - **No allocation for short paths**: the first chunk of points is embedded
//!   inline in the buffer itself.
//! - **Amortized O(1) appends**: later chunks are heap-allocated with
//!   doubling capacities, so n points need only O(log n) chunks.
//! - **Stable filled chunks**: previously filled chunks are never moved or
//!   reallocated; references into them stay put while the points remain.
//! - **Cheap removal from the end**: popping the last point of a heap chunk
//!   frees that chunk and restores the previous one as the tail.
//! - **Explicit emptiness**: the first/last accessors return [`Option`]
//!   rather than exhibiting undefined behavior on an empty buffer.
//!
//! # Example
//!
//! ```rust
//! use point_chain::{Point, PointChain};
//!
//! // 16 points of inline storage - a typical short path never allocates.
//! let mut contour = PointChain::<16>::new();
//!
//! for i in 0..100 {
//!     contour.push(Point::new(i, i * 2))?;
//! }
//!
//! assert_eq!(contour.len(), 100);
//! assert_eq!(contour.first(), Some(&Point::new(0, 0)));
//! assert_eq!(contour.last(), Some(&Point::new(99, 198)));
//!
//! // Points come back out in reverse insertion order.
//! assert_eq!(contour.pop(), Some(Point::new(99, 198)));
//! # Ok::<(), point_chain::Error>(())
//! ```
//!
//! The buffer is single-threaded by design: one buffer per path, owned by
//! whichever thread builds that path. It is `Send`, so a finished buffer can
//! be handed to another thread wholesale.

mod chain;
mod error;
mod point;
mod point_chain;

pub(crate) use chain::*;
pub use error::*;
pub use point::*;
pub use point_chain::*;
