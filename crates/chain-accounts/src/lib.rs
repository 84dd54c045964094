//! The account-store collaborator (§6): resolves public keys to the
//! confirmed/unconfirmed balance views the Transaction Executor reads and
//! writes. The core never touches account rows directly — it only ever goes
//! through `AccountStore`.

pub mod account;
pub mod errors;
pub mod store;

pub use account::Account;
pub use errors::AccountError;
pub use store::{AccountStore, InMemoryAccountStore};
