//! The block application and chain mutation core of a delegated-proof-of-
//! stake node: the Chain Mutator, Transaction Executor, Round Controller
//! Interface and Last-Block Register (§2). Everything this crate needs from
//! persistence, accounts, the transaction pool and the message bus is
//! consumed through the traits `chain-storage`, `chain-accounts`,
//! `chain-pool` and `chain-bus` define; this crate owns only ordering,
//! atomicity and reversibility.

pub mod config;
pub mod error;
pub mod executor;
pub mod last_block;
pub mod mutator;
pub mod rounds;

pub use config::ChainConfig;
pub use error::{ChainError, ExecutorError, RoundError, ValidationReason};
pub use executor::{DefaultExecutor, TransactionExecutor};
pub use last_block::LastBlockRegister;
pub use mutator::{BlockPersistence, ChainMutator};
pub use rounds::{DefaultRoundController, RoundController, RoundTickOutcome};
