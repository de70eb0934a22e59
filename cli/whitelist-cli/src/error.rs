use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("Invalid whitelist entry: {0}")]
    InvalidEntry(String),
    #[error("Leaf not found in whitelist tree")]
    LeafNotFound,
    #[error("Whitelist has no entries")]
    EmptyWhitelist,
    #[error("Duplicate account in whitelist: {0}")]
    DuplicateAccount(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Merkle root has already been set")]
    RootAlreadySet,
    #[error("Merkle root has not been set")]
    RootNotSet,
    #[error("Account has already claimed")]
    AlreadyClaimed,
    #[error("Merkle proof verification failed")]
    InvalidProof,
}

pub type Result<T> = std::result::Result<T, WhitelistError>;
