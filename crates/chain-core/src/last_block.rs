use std::sync::RwLock;

use chain_types::Block;

/// The in-memory cursor to the current chain tip (§4.4). Single-slot,
/// last-writer-wins; callers outside the Chain Mutator are read-only.
/// `None` only before the genesis block has been applied — every other
/// public Chain Mutator operation requires it to be populated first.
///
/// The `RwLock` here is a plain visibility primitive, not the concurrency
/// control for mutator operations — that is the Chain Mutator's own
/// exclusion lock (§5); this register simply must not tear under concurrent
/// reads while the mutator holds that lock and writes.
#[derive(Default)]
pub struct LastBlockRegister {
    current: RwLock<Option<Block>>,
}

impl LastBlockRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Block> {
        self.current
            .read()
            .expect("last-block register lock poisoned")
            .clone()
    }

    /// Set the new tip. Only the Chain Mutator calls this, and only at the
    /// precise commit boundaries §4.1 names.
    pub(crate) fn set(&self, block: Block) {
        *self
            .current
            .write()
            .expect("last-block register lock poisoned") = Some(block);
    }
}
