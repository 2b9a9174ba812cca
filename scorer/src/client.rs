//! HTTP client for the external similarity scorer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use sigver_types::content_type_for;
use tracing::debug;

use crate::error::ScorerError;
use crate::verdict::{ScoreInput, ScorerResponse, ScorerVerdict};
use crate::SignatureScorer;

/// Default request timeout. Image models can be slow on a cold start.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const VERIFY_PATH: &str = "/verify-signature/";

/// Scorer reached over HTTP.
pub struct HttpScorer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpScorer {
    /// Build a client for the scorer at `base_url`, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScorerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| ScorerError::RequestFailed(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), VERIFY_PATH),
        })
    }

    /// Full URL the scorer is queried at.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SignatureScorer for HttpScorer {
    async fn score(
        &self,
        reference: &ScoreInput,
        probe: &ScoreInput,
    ) -> Result<ScorerVerdict, ScorerError> {
        let form = Form::new()
            .part("original_signature", image_part(reference)?)
            .part("verification_signature", image_part(probe)?);

        debug!(endpoint = %self.endpoint, reference = %reference.filename, probe = %probe.filename, "querying scorer");

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScorerError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ScorerError::Unreachable(format!("connection failed: {e}"))
                } else {
                    ScorerError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ScorerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: ScorerResponse = response.json().await.map_err(|e| {
            ScorerError::InvalidResponse(format!("failed to parse scorer response: {e}"))
        })?;

        body.into_verdict()
    }
}

fn image_part(input: &ScoreInput) -> Result<Part, ScorerError> {
    Part::bytes(input.bytes.clone())
        .file_name(input.filename.clone())
        .mime_str(content_type_for(&input.filename))
        .map_err(|e| ScorerError::RequestFailed(format!("invalid content type: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let scorer = HttpScorer::new("http://127.0.0.1:8000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(scorer.endpoint(), "http://127.0.0.1:8000/verify-signature/");
    }
}
