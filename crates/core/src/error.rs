//! Storage-side error model.

use thiserror::Error;

/// Result type returned by read-side collaborators (record store, user store).
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reading from an external collaborator.
///
/// The message may contain storage-layer detail (connection strings, query
/// text). Callers must not forward it to untrusted clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the data could not be read back.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
