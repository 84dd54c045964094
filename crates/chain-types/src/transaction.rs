use chain_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, TxId};

/// Transaction type discriminant. `Transfer` and `Vote` are the two kinds the
/// executor ships handlers for; additional application types are expected to
/// extend this enum without disturbing the genesis-sort or ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Transfer,
    Vote,
}

/// Type-specific transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    Transfer { recipient: PublicKey, amount: u64 },
    Vote { delegate: PublicKey, revoke: bool },
}

impl TransactionPayload {
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionPayload::Transfer { .. } => TransactionKind::Transfer,
            TransactionPayload::Vote { .. } => TransactionKind::Vote,
        }
    }
}

/// A single, immutable state-mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub sender_public_key: PublicKey,
    /// Assigned once the transaction is embedded in a block; `None` while it
    /// sits unconfirmed in the pool.
    pub block_id: Option<BlockId>,
    pub payload: TransactionPayload,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        self.payload.kind()
    }
}
