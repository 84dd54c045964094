/// Errors surfaced by the account-store collaborator (§6, §7).
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account for the given key was not found")]
    NotFound,
    #[error("insufficient confirmed balance: have {available}, need {required}")]
    InsufficientConfirmed { available: u64, required: u64 },
    #[error("insufficient unconfirmed balance: have {available}, need {required}")]
    InsufficientUnconfirmed { available: u64, required: u64 },
    #[error("balance overflow")]
    Overflow,
    #[error("backing store failure: {0}")]
    Backend(String),
}
