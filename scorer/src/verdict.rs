//! Scorer inputs and the interpretation of its responses.

use serde::Deserialize;

use crate::ScorerError;

/// One image sent to the scorer.
#[derive(Clone, Debug)]
pub struct ScoreInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// What the scorer decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScorerVerdict {
    pub is_match: bool,
    /// `None` when the scorer reported only a verdict.
    pub similarity: Option<f64>,
}

/// Raw JSON body returned by the scorer.
///
/// Older deployments answer `{"result": "Genuine"}`, newer ones
/// `{"match": true, "similarity_score": 0.91}`; both shapes are accepted,
/// as is a body carrying fields of both. `verdict` is read before `result`,
/// `similarity` before `similarity_score`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScorerResponse {
    #[serde(default, rename = "match")]
    pub is_match: Option<bool>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub similarity_score: Option<f64>,
}

impl ScorerResponse {
    pub(crate) fn into_verdict(self) -> Result<ScorerVerdict, ScorerError> {
        let label = self.verdict.as_deref().or(self.result.as_deref());
        let is_match = match (self.is_match, label) {
            (Some(flag), _) => flag,
            (None, Some(label)) => parse_verdict_label(label)?,
            (None, None) => {
                return Err(ScorerError::InvalidResponse(
                    "response carries no verdict".to_string(),
                ))
            }
        };

        let similarity = self.similarity.or(self.similarity_score);
        if let Some(score) = similarity {
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(ScorerError::InvalidResponse(format!(
                    "similarity {score} is outside [0, 1]"
                )));
            }
        }

        Ok(ScorerVerdict {
            is_match,
            similarity,
        })
    }
}

/// Map a textual verdict onto match / no match. Case-insensitive.
pub fn parse_verdict_label(label: &str) -> Result<bool, ScorerError> {
    match label.trim().to_ascii_lowercase().as_str() {
        "genuine" | "authentic" | "match" | "matched" | "true" => Ok(true),
        "forged" | "forgery" | "not authentic" | "no match" | "mismatch" | "false" => Ok(false),
        other => Err(ScorerError::InvalidResponse(format!(
            "unrecognised verdict '{other}'"
        ))),
    }
}
