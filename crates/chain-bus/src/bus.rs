use tokio::sync::broadcast;

use crate::events::ChainEvent;

const DEFAULT_CAPACITY: usize = 256;

/// The message-bus collaborator (§6): subscribe/emit for `newBlock`,
/// `broadcastBlock` and `transactionsSaved`. Grounded on the
/// publish/subscribe shape the teacher's network layer gestures at
/// (`network/in_memory.rs`), specialized to the three named events.
///
/// Emitting with no subscribers is not an error — the core may run headless
/// in tests with nobody listening — so `emit` only logs when that happens.
pub trait Bus: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ChainEvent>;
    fn emit(&self, event: ChainEvent);
}

pub struct TokioBus {
    sender: broadcast::Sender<ChainEvent>,
}

impl TokioBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for TokioBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TokioBus {
    fn subscribe(&self) -> broadcast::Receiver<ChainEvent> {
        self.sender.subscribe()
    }

    fn emit(&self, event: ChainEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("bus event emitted with no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::hash::sha256;
    use chain_types::{Block, BlockHeader, PublicKey};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn genesis_block() -> Block {
        let signing = SigningKey::generate(&mut OsRng);
        let generator = PublicKey::from_bytes(&signing.verifying_key().to_bytes()).unwrap();
        Block {
            id: sha256(b"genesis").into(),
            height: 1,
            previous_block_id: None,
            header: BlockHeader {
                timestamp: 0,
                generator_public_key: generator,
                signature: Vec::new(),
                height_previous: 0,
                height_prevoted: 0,
            },
            transactions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn subscriber_observes_emitted_event() {
        let bus = TokioBus::new();
        let mut rx = bus.subscribe();

        bus.emit(ChainEvent::NewBlock(genesis_block()));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ChainEvent::NewBlock(b) if b.height == 1));
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = TokioBus::new();
        bus.emit(ChainEvent::TransactionsSaved(Vec::new()));
    }
}
