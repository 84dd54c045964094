use thiserror::Error;

use chain_accounts::AccountError;
use chain_pool::PoolError;
use chain_storage::StorageError;
use chain_types::{BlockId, TxId};

/// Why a precondition on a Chain Mutator operation was rejected. Recoverable —
/// the caller is expected to retry with a different block or simply drop it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("expected height {expected}, got {found}")]
    WrongHeight { expected: u64, found: u64 },
    #[error("expected previous block {expected}, got {found:?}")]
    WrongParent {
        expected: BlockId,
        found: Option<BlockId>,
    },
    #[error("genesis block cannot be deleted")]
    CannotDeleteGenesis,
    #[error("genesis block has already been applied")]
    GenesisAlreadyApplied,
}

/// Errors surfaced by the round-controller component (§4.3). Its shipped
/// implementation lives in this crate, but the interface is still given its
/// own error type per §10.1 so `ChainError` wraps it rather than inlining it.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("round tick failed: {0}")]
    TickFailed(String),
}

/// Errors surfaced by the transaction-executor component (§4.2).
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// The taxonomy of §7: every failure the Chain Mutator can produce. Each
/// collaborator gets its own error type (`chain_accounts::AccountError`,
/// `chain_pool::PoolError`, `chain_storage::StorageError`, this crate's own
/// `RoundError`/`ExecutorError`); `ChainError` wraps them at the boundary
/// rather than re-declaring their variants.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationReason),

    #[error("transaction {tx_id} failed to apply: {source}")]
    TransactionApply {
        tx_id: TxId,
        #[source]
        source: ExecutorError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("transaction pool error: {0}")]
    Pool(#[from] PoolError),

    /// A direct account-store failure outside the per-transaction apply path
    /// (e.g. a lookup during snapshotting or account-balance restoration).
    /// Transaction apply/undo failures go through `TransactionApply` instead,
    /// which carries the failing transaction's id.
    #[error("account store error: {0}")]
    Account(#[from] AccountError),

    #[error("round controller error: {0}")]
    Round(#[from] RoundError),

    /// Undo step failed, parent-load failed, or a round tick failed after a
    /// partial write. Memory tables are now assumed to diverge from storage;
    /// the embedding process must terminate. Never recovered in-process.
    #[error("unrecoverable chain state inconsistency: {detail}")]
    ConsistencyFatal { detail: String },

    /// Orderly shutdown signal from the round controller (see
    /// `RoundTickOutcome::SnapshotComplete`), not a failure.
    #[error("snapshot import complete")]
    SnapshotComplete,
}

impl ChainError {
    /// Whether this error is survivable by the calling process, or whether it
    /// must be propagated to a supervisor for termination (§7).
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChainError::ConsistencyFatal { .. })
    }

    /// Wrap a lower-level cause as a `ConsistencyFatal`, the only way this
    /// variant is ever constructed (§10.1): never via a bare `?`.
    pub fn fatal(detail: impl Into<String>) -> Self {
        ChainError::ConsistencyFatal {
            detail: detail.into(),
        }
    }
}
