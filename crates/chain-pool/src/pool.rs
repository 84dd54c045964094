use std::sync::Arc;

use async_trait::async_trait;
use chain_types::{Transaction, TxId};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::errors::PoolError;

/// The transaction-pool collaborator: a membership set of unconfirmed
/// transactions in arrival order (§6's `receiveTransactions` /
/// `removeUnconfirmedTransaction`). This crate tracks *which* transactions
/// are pending only — applying or undoing a transaction's effect on
/// unconfirmed balances is the Transaction Executor's job (§4.2); the Chain
/// Mutator drives that executor over the list this trait hands back.
#[async_trait]
pub trait TransactionPool: Send + Sync {
    /// Admit transactions into the pool, preserving arrival order. Fails if
    /// a transaction with the same id is already pending.
    async fn receive_transactions(&self, txs: Vec<Transaction>) -> Result<(), PoolError>;

    /// Drop a single transaction from the unconfirmed set, e.g. once it has
    /// been embedded in an applied block.
    async fn remove_unconfirmed_transaction(&self, id: TxId) -> Result<(), PoolError>;

    /// Every transaction currently pending, in the order they were received.
    /// This is the list the Chain Mutator walks for the undo-unconfirmed-pool
    /// step at the start of `applyBlock`.
    async fn unconfirmed_transactions(&self) -> Vec<Transaction>;

    async fn contains(&self, id: TxId) -> bool;

    async fn len(&self) -> usize;
}

/// In-process `TransactionPool` backed by `IndexMap`, grounded on the
/// teacher's `TxPool`/`Mempool` types (`mempool/txpool.rs`), generalized to
/// preserve insertion order (a plain `HashMap` does not) since §4.1's
/// undo-unconfirmed-pool step and §4.1's `deleteLastBlock` reinsertion both
/// depend on arrival order.
#[derive(Default)]
pub struct InMemoryTransactionPool {
    txs: Arc<RwLock<IndexMap<TxId, Transaction>>>,
}

impl InMemoryTransactionPool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionPool for InMemoryTransactionPool {
    async fn receive_transactions(&self, txs: Vec<Transaction>) -> Result<(), PoolError> {
        let mut pool = self.txs.write().await;
        for tx in txs {
            if pool.contains_key(&tx.id) {
                return Err(PoolError::AlreadyPresent(tx.id));
            }
            pool.insert(tx.id, tx);
        }
        Ok(())
    }

    async fn remove_unconfirmed_transaction(&self, id: TxId) -> Result<(), PoolError> {
        let mut pool = self.txs.write().await;
        pool.shift_remove(&id).ok_or(PoolError::NotFound(id))?;
        Ok(())
    }

    async fn unconfirmed_transactions(&self) -> Vec<Transaction> {
        self.txs.read().await.values().cloned().collect()
    }

    async fn contains(&self, id: TxId) -> bool {
        self.txs.read().await.contains_key(&id)
    }

    async fn len(&self) -> usize {
        self.txs.read().await.len()
    }
}
