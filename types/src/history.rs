//! Verification outcomes and the append-only history entries derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::VerificationId;

/// Where a similarity score came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Reported by the external scorer.
    Scorer,
    /// Substituted because the scorer omitted a score.
    Fallback,
}

/// Result of one verification call, returned to the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerificationResult {
    pub is_match: bool,
    /// In `[0, 1]`, higher means more similar.
    pub similarity_score: f64,
    pub score_source: ScoreSource,
}

/// One entry of a user's verification history. Never mutated once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: VerificationId,
    /// Filename of the reference signature that was compared against.
    pub original_signature: String,
    /// Filename of the probe signature.
    pub verification_signature: String,
    pub similarity_score: f64,
    pub is_match: bool,
    pub verified_at: DateTime<Utc>,
}

/// Display form of a [`VerificationRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    pub id: VerificationId,
    pub date: DateTime<Utc>,
    /// Filename of the probe image, if one was recorded.
    pub signature_image: Option<String>,
    pub similarity_score: f64,
    pub is_authentic: bool,
    pub status: String,
}

impl HistoryEntryView {
    pub const AUTHENTIC: &'static str = "Authentic";
    pub const NOT_AUTHENTIC: &'static str = "Not Authentic";
}

impl From<&VerificationRecord> for HistoryEntryView {
    fn from(record: &VerificationRecord) -> Self {
        let status = if record.is_match {
            Self::AUTHENTIC
        } else {
            Self::NOT_AUTHENTIC
        };
        Self {
            id: record.id,
            date: record.verified_at,
            signature_image: Some(record.verification_signature.clone())
                .filter(|name| !name.is_empty()),
            similarity_score: record.similarity_score,
            is_authentic: record.is_match,
            status: status.to_string(),
        }
    }
}
