//! The message-bus collaborator (§6): cross-component notifications for
//! `newBlock`, `broadcastBlock` and `transactionsSaved`.

pub mod bus;
pub mod events;

pub use bus::{Bus, TokioBus};
pub use events::ChainEvent;
