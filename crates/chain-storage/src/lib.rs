//! The persistence-layer collaborator (§6): a `sled`-backed embedded store
//! exposing the atomic transaction primitive every Chain Mutator pipeline
//! step shares. This crate owns storage mechanics only — it knows nothing
//! about apply/undo ordering, account balances or round bookkeeping; that
//! lives in `chain-core`.

pub mod errors;
pub mod storage;

pub use errors::{StorageError, TxAbort};
pub use storage::{PersistenceTx, Storage};

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::hash::sha256;
    use chain_crypto::PublicKey;
    use chain_types::{Block, BlockHeader};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn test_block(height: u64, previous_block_id: Option<chain_types::BlockId>) -> Block {
        let signing = SigningKey::generate(&mut OsRng);
        let generator = PublicKey::from_bytes(&signing.verifying_key().to_bytes()).unwrap();
        Block {
            id: sha256(format!("block-{height}").as_bytes()).into(),
            height,
            previous_block_id,
            header: BlockHeader {
                timestamp: height,
                generator_public_key: generator,
                signature: Vec::new(),
                height_previous: 0,
                height_prevoted: 0,
            },
            transactions: Vec::new(),
        }
    }

    #[test]
    fn save_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let genesis = test_block(1, None);
        let genesis_id = genesis.id;

        storage
            .transaction::<(), ()>(|ptx| ptx.save_block(&genesis))
            .unwrap();

        let fetched = storage.get_block(genesis_id).unwrap().unwrap();
        assert_eq!(fetched.height, 1);
        assert_eq!(storage.max_height().unwrap(), Some(1));
    }

    #[test]
    fn delete_block_removes_height_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let genesis = test_block(1, None);
        let child = test_block(2, Some(genesis.id));

        storage
            .transaction::<(), ()>(|ptx| {
                ptx.save_block(&genesis)?;
                ptx.save_block(&child)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(storage.max_height().unwrap(), Some(2));

        storage
            .transaction::<(), ()>(|ptx| ptx.delete_block(&child))
            .unwrap();

        assert_eq!(storage.max_height().unwrap(), Some(1));
        assert!(storage.get_block(child.id).unwrap().is_none());
        assert!(storage.get_block_by_height(2).unwrap().is_none());
    }

    #[test]
    fn transaction_rolls_back_on_caller_abort() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let genesis = test_block(1, None);

        let result = storage.transaction::<(), &'static str>(|ptx| {
            ptx.save_block(&genesis)?;
            Err(TxAbort::Caller("forced abort"))
        });

        assert!(matches!(result, Err(TxAbort::Caller("forced abort"))));
        assert!(storage.get_block(genesis.id).unwrap().is_none());
    }
}
