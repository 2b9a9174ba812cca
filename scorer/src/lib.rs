//! External signature scorer.
//!
//! The similarity computation itself happens in a separate HTTP service.
//! This crate owns the contract with it:
//! - `POST {base}/verify-signature/` with multipart fields
//!   `original_signature` and `verification_signature`
//! - the response carries a verdict (`match` bool, or a `result`/`verdict`
//!   string such as `"Genuine"` / `"Forged"`) and optionally a numeric
//!   `similarity`/`similarity_score` in `[0, 1]`
//!
//! The rest of the workspace depends only on [`SignatureScorer`].

pub mod client;
pub mod error;
pub mod verdict;

pub use client::HttpScorer;
pub use error::ScorerError;
pub use verdict::{ScoreInput, ScorerVerdict};

use async_trait::async_trait;

/// Compares a probe signature image against a reference image.
#[async_trait]
pub trait SignatureScorer: Send + Sync {
    async fn score(
        &self,
        reference: &ScoreInput,
        probe: &ScoreInput,
    ) -> Result<ScorerVerdict, ScorerError>;
}
