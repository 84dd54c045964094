use async_trait::async_trait;

use chain_accounts::{Account, AccountStore};
use chain_types::{Block, Transaction, TransactionPayload};

use crate::error::ExecutorError;

/// The Transaction Executor (§4.2): four operations per transaction, each
/// taking the already-resolved sender account and writing type-specific
/// state. Ordering is the Chain Mutator's responsibility, not this trait's —
/// within a block, every unconfirmed effect must succeed before any confirmed
/// effect runs, and undo reverses confirmed-then-unconfirmed per transaction.
///
/// Account mutations run entirely outside the persistence transaction: the
/// account store is async (`tokio::sync::RwLock`-backed) while `sled`'s
/// transaction closure is synchronous, so there is no single scope both can
/// run inside. The Chain Mutator snapshots the touched accounts before
/// calling into this trait and restores them by hand if a later step aborts,
/// rather than relying on the persistence transaction to cover account state.
///
/// `apply`/`undo` take `&mut Account` for the *sender* only; a `Transfer`'s
/// recipient is resolved and written back separately by the Chain Mutator
/// (the sender and recipient may be the same account only on self-transfer,
/// which `apply` does not special-case and simply debits then credits the one
/// in-memory `Account` passed for both).
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn apply_unconfirmed(&self, tx: &Transaction, sender: &mut Account) -> Result<(), ExecutorError>;

    async fn apply(&self, tx: &Transaction, block: &Block, sender: &mut Account) -> Result<(), ExecutorError>;

    async fn undo_unconfirmed(&self, tx: &Transaction, sender: &mut Account) -> Result<(), ExecutorError>;

    async fn undo(&self, tx: &Transaction, block: &Block, sender: &mut Account) -> Result<(), ExecutorError>;
}

/// Handlers for `Transfer` and `Vote`, the two shipped transaction kinds.
/// `Transfer`'s recipient-side credit/debit is applied by the Chain Mutator
/// (it owns fetching and writing back the recipient account); this executor
/// only touches the sender side plus, on confirmed apply/undo, the sender's
/// own debit.
pub struct DefaultExecutor;

#[async_trait]
impl TransactionExecutor for DefaultExecutor {
    async fn apply_unconfirmed(&self, tx: &Transaction, sender: &mut Account) -> Result<(), ExecutorError> {
        match &tx.payload {
            TransactionPayload::Transfer { amount, .. } => {
                sender.debit_unconfirmed(*amount).map_err(ExecutorError::from)
            }
            TransactionPayload::Vote { .. } => Ok(()),
        }
    }

    async fn apply(&self, tx: &Transaction, block: &Block, sender: &mut Account) -> Result<(), ExecutorError> {
        match &tx.payload {
            TransactionPayload::Transfer { amount, .. } => {
                sender.debit_confirmed(*amount).map_err(ExecutorError::from)
            }
            TransactionPayload::Vote { delegate, revoke } => {
                if *revoke {
                    sender.votes.voted_delegates.retain(|d| d != delegate);
                } else if !sender.votes.voted_delegates.contains(delegate) {
                    sender.votes.voted_delegates.push(*delegate);
                }
                sender.votes.last_vote_height = Some(block.height);
                Ok(())
            }
        }
    }

    async fn undo_unconfirmed(&self, tx: &Transaction, sender: &mut Account) -> Result<(), ExecutorError> {
        match &tx.payload {
            TransactionPayload::Transfer { amount, .. } => {
                sender.credit_unconfirmed(*amount).map_err(ExecutorError::from)
            }
            TransactionPayload::Vote { .. } => Ok(()),
        }
    }

    async fn undo(&self, tx: &Transaction, _block: &Block, sender: &mut Account) -> Result<(), ExecutorError> {
        match &tx.payload {
            TransactionPayload::Transfer { amount, .. } => {
                sender.credit_confirmed(*amount).map_err(ExecutorError::from)
            }
            TransactionPayload::Vote { delegate, revoke } => {
                if *revoke {
                    if !sender.votes.voted_delegates.contains(delegate) {
                        sender.votes.voted_delegates.push(*delegate);
                    }
                } else {
                    sender.votes.voted_delegates.retain(|d| d != delegate);
                }
                Ok(())
            }
        }
    }
}
