use sigver_crypto::CredentialError;
use sigver_scorer::ScorerError;
use sigver_store::StoreError;
use thiserror::Error;

/// Failure classes exposed to callers. Each maps to one HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, invalid, expired or revoked credentials.
    Auth,
    /// Authenticated but lacking the required role.
    Forbidden,
    NotFound,
    /// Missing or malformed input.
    Validation,
    /// Duplicate registration.
    Conflict,
    /// The external scorer failed or answered nonsense.
    Dependency,
    /// Storage read or write failed.
    Persistence,
}

/// Errors returned by the account and signature services.
///
/// Display strings are user-facing for the 4xx classes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No file uploaded")]
    NoFileProvided,

    #[error("No reference signature found")]
    NoReferenceSignature,

    #[error("reference signature file {0} is missing")]
    ReferenceFileMissing(String),

    #[error("scorer unavailable: {0}")]
    ScorerUnavailable(#[from] ScorerError),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Not authorized, no token")]
    MissingCredential,

    /// The detail is for logs only; the message never says why.
    #[error("Not authorized, token failed")]
    InvalidCredential(String),

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Signature not found")]
    SignatureNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Not authorized as admin")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NoFileProvided
            | ServiceError::NoReferenceSignature
            | ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::UserExists => ErrorKind::Conflict,
            ServiceError::MissingCredential
            | ServiceError::InvalidCredential(_)
            | ServiceError::InvalidCredentials => ErrorKind::Auth,
            ServiceError::Forbidden => ErrorKind::Forbidden,
            ServiceError::UserNotFound | ServiceError::SignatureNotFound => ErrorKind::NotFound,
            ServiceError::ScorerUnavailable(_) => ErrorKind::Dependency,
            ServiceError::ReferenceFileMissing(_)
            | ServiceError::StorageFailure(_)
            | ServiceError::Internal(_) => ErrorKind::Persistence,
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Hashing(_) | CredentialError::Key(_) => {
                ServiceError::Internal(e.to_string())
            }
            other => ServiceError::InvalidCredential(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy() {
        assert_eq!(ServiceError::NoReferenceSignature.kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::UserExists.kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::InvalidCredentials.kind(), ErrorKind::Auth);
        assert_eq!(
            ServiceError::ReferenceFileMissing("r.png".into()).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            ServiceError::from(ScorerError::Unreachable("x".into())).kind(),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn credential_errors_hide_their_cause() {
        let e = ServiceError::from(CredentialError::Expired);
        assert_eq!(e.kind(), ErrorKind::Auth);
        assert_eq!(e.to_string(), "Not authorized, token failed");

        let e = ServiceError::from(CredentialError::Hashing("oom".into()));
        assert_eq!(e.kind(), ErrorKind::Persistence);
    }
}
