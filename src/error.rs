//! Error types for fallible construction and loading.

use thiserror::Error;

/// Error variants raised while building or loading an index.
#[derive(Debug, Error)]
pub enum Error {
    /// The input stream ended before delivering the requested number of
    /// bytes. `got` is the offset at which the stream ended.
    #[error("input ended after {got} of {expected} bytes")]
    ShortInput { expected: usize, got: usize },

    /// An I/O error from the input stream or the run-head scratch store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for construction operations.
pub type Result<T> = std::result::Result<T, Error>;
