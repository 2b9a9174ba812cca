use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("scorer unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request to scorer failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from scorer: {0}")]
    InvalidResponse(String),
}
