use thiserror::Error;

/// Errors that can occur when appending points to a [`PointChain`][1].
///
/// [1]: crate::PointChain
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The system allocator could not provide memory for a new chunk.
    ///
    /// The buffer is left in its previous valid state, so the caller may
    /// abandon path construction cleanly or retry after freeing memory.
    #[error("failed to allocate a chunk with room for {capacity} points")]
    AllocationFailed {
        /// The point capacity of the chunk that could not be allocated.
        capacity: usize,
    },
}

/// A specialized `Result` type for point buffer operations, returning the
/// crate's [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
