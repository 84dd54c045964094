use chain_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use crate::ids::{BlockHeight, BlockId};
use crate::transaction::Transaction;

/// Opaque header fields that are not interpreted by the chain-mutation core
/// itself but are carried through persistence. `height_previous` /
/// `height_prevoted` are the round checkpoint fields the round controller
/// reads and rewrites at round boundaries (see `chain-core::rounds`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub timestamp: u64,
    pub generator_public_key: PublicKey,
    /// Opaque signature bytes; never inspected by this crate.
    pub signature: Vec<u8>,
    pub height_previous: u32,
    pub height_prevoted: u32,
}

/// A finalized unit of state change. Blocks are immutable once received;
/// transaction order within `transactions` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub height: BlockHeight,
    /// `None` only for the genesis block.
    pub previous_block_id: Option<BlockId>,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.height == 1 && self.previous_block_id.is_none()
    }
}
