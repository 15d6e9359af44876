use allocated::AllocErrorWithLayout;

/// Errors reported by the tree and its façades.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An element with an equal key is already present.
    #[error("an element with an equal key is already present")]
    DuplicateKey,

    /// No element with the requested key is present.
    #[error("no element with the requested key is present")]
    KeyNotFound,

    /// The allocator could not provide memory for a new node.
    #[error("node allocation failed: {0:?}")]
    AllocationFailure(AllocErrorWithLayout),

    /// A cursor at the end sentinel was dereferenced or moved out of range.
    #[error("cursor does not refer to an element")]
    InvalidIterator,
}

impl From<AllocErrorWithLayout> for Error {
    fn from(e: AllocErrorWithLayout) -> Self {
        Error::AllocationFailure(e)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Error::DuplicateKey, Error::DuplicateKey)
                | (Error::KeyNotFound, Error::KeyNotFound)
                | (Error::AllocationFailure(_), Error::AllocationFailure(_))
                | (Error::InvalidIterator, Error::InvalidIterator)
        )
    }
}

/// Result type returned by fallible tree operations.
pub type TreeResult<T> = Result<T, Error>;
