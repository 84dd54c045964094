use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chain_types::PublicKey;
use tokio::sync::RwLock;

use crate::account::Account;
use crate::errors::AccountError;

/// The account-store collaborator §6 names: `setAccountAndGet` (get-or-create)
/// and `getAccount` (strict lookup), plus a write-back `set` so the
/// Transaction Executor can persist the mutated account it read. The core
/// never reaches past this trait to touch account rows directly.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolve the account for `public_key`, creating an empty one (zero
    /// balances, no votes) if none exists yet. Used on the apply path, where
    /// a sender or recipient may be seen for the first time.
    async fn get_or_create(&self, public_key: PublicKey) -> Result<Account, AccountError>;

    /// Strict lookup; fails with `AccountError::NotFound` if the account has
    /// never been created. Used where the caller's invariants guarantee the
    /// account must already exist (e.g. undoing a transaction that is known
    /// to have applied successfully).
    async fn get(&self, public_key: PublicKey) -> Result<Account, AccountError>;

    /// Write the full account back. The executor reads with `get_or_create`
    /// / `get`, mutates the in-memory value, and writes it back with `set`.
    async fn set(&self, account: Account) -> Result<(), AccountError>;
}

/// In-process `AccountStore` backed by a `RwLock<HashMap>`, grounded on the
/// teacher's `InMemoryState` (`state/in_memory.rs`): same lock discipline,
/// generalized from a single balance to the confirmed/unconfirmed split plus
/// vote bookkeeping this spec requires.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<PublicKey, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_or_create(&self, public_key: PublicKey) -> Result<Account, AccountError> {
        if let Some(account) = self.accounts.read().await.get(&public_key) {
            return Ok(account.clone());
        }
        let mut accounts = self.accounts.write().await;
        Ok(accounts
            .entry(public_key)
            .or_insert_with(|| Account::new(public_key))
            .clone())
    }

    async fn get(&self, public_key: PublicKey) -> Result<Account, AccountError> {
        self.accounts
            .read()
            .await
            .get(&public_key)
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    async fn set(&self, account: Account) -> Result<(), AccountError> {
        self.accounts
            .write()
            .await
            .insert(account.public_key, account);
        Ok(())
    }
}
