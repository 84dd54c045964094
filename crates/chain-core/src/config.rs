use chain_types::BlockId;
use serde::{Deserialize, Serialize};

/// Typed configuration every collaborator construction closes over (§10.3).
/// Parsing mechanics (TOML, env-layering) are out of scope for this crate —
/// `chain-node` is the only place a file ever gets deserialized into one of
/// these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// The id the genesis block is expected to have. `saveGenesisBlock`
    /// treats a storage row under this id as proof bootstrap already ran.
    pub genesis_block_id: Option<BlockId>,
    /// Blocks per round, consumed by the Round Controller's shipped
    /// implementation (§4.3) to decide round-boundary ticks.
    pub round_length: u32,
    /// Soft cap on the unconfirmed pool's size; advisory only — this crate's
    /// `InMemoryTransactionPool` does not itself enforce it.
    pub unconfirmed_pool_capacity: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_block_id: None,
            round_length: 101,
            unconfirmed_pool_capacity: 10_000,
        }
    }
}
