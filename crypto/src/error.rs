use thiserror::Error;

/// Errors arising from credential operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    Tampered,

    #[error("token has expired")]
    Expired,

    #[error("signing key rejected: {0}")]
    Key(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}
