use chain_types::{Block, Transaction};

/// The three bus topics §6 names. `Clone` so `tokio::sync::broadcast` can
/// hand an owned copy to every subscriber.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// Emitted once a block has been durably committed and the Last-Block
    /// Register updated (§4.1 step 6 of `applyBlock`).
    NewBlock(Block),
    /// The core's only outbound networking touchpoint: `broadcastReducedBlock`
    /// (§4.1). `broadcast` mirrors the flag passed to that call; the
    /// peer-networking collaborator decides what, if anything, to do with it.
    BroadcastBlock { block: Block, broadcast: bool },
    /// Emitted when transactions are newly persisted as part of a block.
    TransactionsSaved(Vec<Transaction>),
}
