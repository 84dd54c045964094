use std::sync::Arc;

use chain_accounts::{AccountStore, InMemoryAccountStore};
use chain_bus::{ChainEvent, TokioBus};
use chain_core::{BlockPersistence, ChainConfig, ChainMutator, DefaultExecutor, DefaultRoundController};
use chain_pool::InMemoryTransactionPool;
use chain_storage::Storage;
use chain_types::{
    Block, BlockHeader, BlockId, PublicKey, Transaction, TransactionPayload, TxId,
};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

pub fn fresh_key() -> PublicKey {
    let signing = SigningKey::generate(&mut OsRng);
    PublicKey::from_bytes(&signing.verifying_key().to_bytes()).unwrap()
}

pub fn block_id(seed: &str) -> BlockId {
    chain_crypto::hash::sha256(seed.as_bytes()).into()
}

pub fn tx_id(seed: &str) -> TxId {
    chain_crypto::hash::sha256(seed.as_bytes()).into()
}

pub fn transfer(seed: &str, sender: PublicKey, recipient: PublicKey, amount: u64) -> Transaction {
    Transaction {
        id: tx_id(seed),
        sender_public_key: sender,
        block_id: None,
        payload: TransactionPayload::Transfer { recipient, amount },
    }
}

pub fn block(seed: &str, height: u64, previous: Option<BlockId>, transactions: Vec<Transaction>) -> Block {
    Block {
        id: block_id(seed),
        height,
        previous_block_id: previous,
        header: BlockHeader {
            timestamp: height,
            generator_public_key: fresh_key(),
            signature: Vec::new(),
            height_previous: 0,
            height_prevoted: 0,
        },
        transactions,
    }
}

pub struct Harness {
    pub mutator: ChainMutator,
    pub accounts: Arc<InMemoryAccountStore>,
    pub bus_events: tokio::sync::broadcast::Receiver<ChainEvent>,
    pub _tempdir: tempfile::TempDir,
}

pub fn build_harness() -> Harness {
    let tempdir = tempfile::tempdir().unwrap();
    let storage = Storage::open(tempdir.path()).unwrap();
    let accounts = Arc::new(InMemoryAccountStore::new());
    let pool = Arc::new(InMemoryTransactionPool::new());
    let bus = Arc::new(TokioBus::new());
    let bus_events = bus.subscribe();
    let executor = Arc::new(DefaultExecutor);
    let rounds = Arc::new(DefaultRoundController::new(101));

    let mutator = ChainMutator::new(
        storage,
        accounts.clone() as Arc<dyn AccountStore>,
        pool as Arc<dyn chain_pool::TransactionPool>,
        bus as Arc<dyn chain_bus::Bus>,
        executor,
        rounds,
        ChainConfig::default(),
    );

    Harness {
        mutator,
        accounts,
        bus_events,
        _tempdir: tempdir,
    }
}

pub async fn bootstrap_genesis(harness: &Harness, genesis: &Block) {
    harness.mutator.save_genesis_block(genesis).await.unwrap();
    harness.mutator.apply_genesis_block(genesis.clone()).await.unwrap();
}

pub const PERSIST: BlockPersistence = BlockPersistence::WriteAndPersist;
