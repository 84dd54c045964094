use chain_types::BlockId;

/// Errors surfaced by the persistence-layer collaborator (§6, §7 `StorageError`).
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("block {0} not found")]
    BlockNotFound(BlockId),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("transaction aborted: {0}")]
    Aborted(String),
    #[error("corrupt index entry: {0}")]
    CorruptIndex(String),
}

/// The error type a persistence-transaction closure may abort with. Carries
/// either a caller-supplied `StorageError` or an opaque aborting cause from a
/// collaborator invoked inside the closure (the Chain Mutator maps the latter
/// back to its own error taxonomy at the boundary).
#[derive(Debug)]
pub enum TxAbort<E> {
    Storage(StorageError),
    Caller(E),
}

impl<E> From<StorageError> for TxAbort<E> {
    fn from(e: StorageError) -> Self {
        TxAbort::Storage(e)
    }
}

impl<E> From<sled::Error> for TxAbort<E> {
    fn from(e: sled::Error) -> Self {
        TxAbort::Storage(StorageError::from(e))
    }
}

impl<E> From<bincode::Error> for TxAbort<E> {
    fn from(e: bincode::Error) -> Self {
        TxAbort::Storage(StorageError::from(e))
    }
}
