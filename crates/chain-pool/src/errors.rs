use chain_types::TxId;

/// Errors surfaced by the transaction-pool collaborator (§6, §7).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("transaction {0} is not present in the pool")]
    NotFound(TxId),
    #[error("transaction {0} is already present in the pool")]
    AlreadyPresent(TxId),
    #[error("pool backend failure: {0}")]
    Backend(String),
}
