//! Fixture loading for the `bootstrap`/`apply` subcommands. No wire format or
//! wallet is in scope for this crate — block and transaction ids, and every
//! public key, are derived deterministically from a plain-text seed string so
//! a fixture file can be hand-written without a keygen step. A real peer
//! network or RPC surface would replace this module entirely; it exists only
//! so the chain-mutation core has something to drive from the command line.

use std::path::Path;

use chain_crypto::hash::sha256;
use chain_types::{Block, BlockHeader, BlockId, PublicKey, Transaction, TransactionPayload, TxId};
use ed25519_dalek::SigningKey;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BlockFixture {
    pub id_seed: String,
    pub height: u64,
    pub previous_block_id_seed: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TxFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxFixture {
    Transfer {
        id_seed: String,
        sender_seed: String,
        recipient_seed: String,
        amount: u64,
    },
    Vote {
        id_seed: String,
        sender_seed: String,
        delegate_seed: String,
        #[serde(default)]
        revoke: bool,
    },
}

pub fn key_from_seed(seed: &str) -> PublicKey {
    let hash = sha256(seed.as_bytes());
    let signing = SigningKey::from_bytes(hash.as_bytes());
    PublicKey::from_bytes(&signing.verifying_key().to_bytes()).expect("derived key is always 32 bytes")
}

pub fn block_id_from_seed(seed: &str) -> BlockId {
    sha256(seed.as_bytes()).into()
}

pub fn tx_id_from_seed(seed: &str) -> TxId {
    sha256(seed.as_bytes()).into()
}

impl TxFixture {
    fn into_transaction(self) -> Transaction {
        match self {
            TxFixture::Transfer {
                id_seed,
                sender_seed,
                recipient_seed,
                amount,
            } => Transaction {
                id: tx_id_from_seed(&id_seed),
                sender_public_key: key_from_seed(&sender_seed),
                block_id: None,
                payload: TransactionPayload::Transfer {
                    recipient: key_from_seed(&recipient_seed),
                    amount,
                },
            },
            TxFixture::Vote {
                id_seed,
                sender_seed,
                delegate_seed,
                revoke,
            } => Transaction {
                id: tx_id_from_seed(&id_seed),
                sender_public_key: key_from_seed(&sender_seed),
                block_id: None,
                payload: TransactionPayload::Vote {
                    delegate: key_from_seed(&delegate_seed),
                    revoke,
                },
            },
        }
    }
}

impl BlockFixture {
    fn into_block(self) -> Block {
        let id = block_id_from_seed(&self.id_seed);
        let previous_block_id = self.previous_block_id_seed.as_deref().map(block_id_from_seed);
        let generator_public_key = key_from_seed(&self.id_seed);
        Block {
            id,
            height: self.height,
            previous_block_id,
            header: BlockHeader {
                timestamp: self.height,
                generator_public_key,
                signature: Vec::new(),
                height_previous: 0,
                height_prevoted: 0,
            },
            transactions: self.transactions.into_iter().map(TxFixture::into_transaction).collect(),
        }
    }
}

pub fn load_block_fixture(path: &Path) -> anyhow::Result<Block> {
    let contents = std::fs::read_to_string(path)?;
    let fixture: BlockFixture = serde_json::from_str(&contents)?;
    Ok(fixture.into_block())
}
