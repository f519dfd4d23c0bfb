//! Error types for the page cache.
//!
//! A closed set of transaction errors. Both are plain values returned to
//! the caller; the cache never retries or recovers on its own.

use std::io;

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised by the update transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Another caller holds the update transaction.
    ///
    /// The expected outcome of losing the refresh race: skip the rebuild and
    /// serve the current content.
    #[error("another update is already running")]
    AlreadyUpdating,

    /// The staging buffer was touched outside an update transaction.
    #[error("no update transaction is active")]
    NoActiveTransaction,
}

impl CacheError {
    /// Returns true if the caller can carry on by serving existing content.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CacheError::AlreadyUpdating)
    }

    /// Returns true if this error signals a start/end pairing bug in the caller.
    pub fn is_misuse(&self) -> bool {
        matches!(self, CacheError::NoActiveTransaction)
    }
}

impl From<CacheError> for io::Error {
    fn from(err: CacheError) -> Self {
        let kind = match err {
            CacheError::AlreadyUpdating => io::ErrorKind::WouldBlock,
            CacheError::NoActiveTransaction => io::ErrorKind::NotConnected,
        };
        io::Error::new(kind, err)
    }
}
