use chain_crypto::Hash256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height. Genesis is height 1; never negative, monotonically increasing.
pub type BlockHeight = u64;

/// Opaque block identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(Hash256);

impl BlockId {
    pub fn new(hash: Hash256) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> Hash256 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Hash256> for BlockId {
    fn from(hash: Hash256) -> Self {
        Self(hash)
    }
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(Hash256);

impl TxId {
    pub fn new(hash: Hash256) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> Hash256 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Hash256> for TxId {
    fn from(hash: Hash256) -> Self {
        Self(hash)
    }
}
