//! Core data model shared by the chain-mutation crates: blocks, transactions
//! and the account views the core reads from the account store.
//!
//! These types are intentionally inert — no validation, no persistence, no
//! execution logic lives here. They exist so `chain-core`, `chain-storage`,
//! `chain-accounts` and `chain-pool` can agree on a single vocabulary without
//! depending on each other.

pub mod account;
pub mod block;
pub mod ids;
pub mod transaction;

pub use account::{AccountBalances, VoteState};
pub use block::{Block, BlockHeader};
pub use ids::{BlockId, BlockHeight, TxId};
pub use transaction::{Transaction, TransactionKind, TransactionPayload};

pub use chain_crypto::PublicKey;
