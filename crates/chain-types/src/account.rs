use serde::{Deserialize, Serialize};

use crate::ids::BlockHeight;

/// The two balance views the chain-mutation core reads and writes through the
/// account store. `confirmed` reflects all committed blocks; `unconfirmed`
/// additionally reflects the pending effect of transactions currently sitting
/// in the transaction pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalances {
    pub confirmed: u64,
    pub unconfirmed: u64,
}

/// Delegate vote bookkeeping for an account, mutated by `VOTE` transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteState {
    pub voted_delegates: Vec<chain_crypto::PublicKey>,
    pub last_vote_height: Option<BlockHeight>,
}
