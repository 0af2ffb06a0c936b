//! Error types for the engine.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// An index or world coordinate fell outside the container it was used to address.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// An argument violated a precondition (bad bit width, value too large for its field,
    /// too many distinct block kinds for a palette to hold).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A region file failed to read or write.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
