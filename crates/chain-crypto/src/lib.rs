//! Minimal identity and hashing primitives shared by the chain crates.
//!
//! Signature creation and verification are out of scope here (the node trusts
//! that candidate blocks have already passed that check before reaching the
//! chain core); this crate only owns the opaque id types the core hands
//! around: content hashes and delegate public keys.

pub mod hash;
pub mod public_key;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid hash: {0}")]
    InvalidHash(String),
    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

pub use hash::Hash256;
pub use public_key::PublicKey;
