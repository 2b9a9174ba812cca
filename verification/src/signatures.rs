//! Reference uploads, verification and the history log.

use std::sync::Arc;

use sigver_scorer::{ScoreInput, SignatureScorer};
use sigver_store::StoreError;
use sigver_types::{
    Clock, HistoryEntryView, ScoreSource, SignatureId, SignatureRecord, UserId, VerificationId,
    VerificationRecord, VerificationResult, DEFAULT_PROBE_DESCRIPTION,
    DEFAULT_REFERENCE_DESCRIPTION,
};
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::stores::Stores;
use crate::upload::{stored_filename, Upload};

/// Similarity substituted when the scorer says "match" without a score.
///
/// A stopgap for scorers that only return a label: it is not a measurement
/// and is reported as [`ScoreSource::Fallback`].
pub const FALLBACK_MATCH_SCORE: f64 = 0.85;

/// Similarity substituted when the scorer says "no match" without a score.
pub const FALLBACK_MISMATCH_SCORE: f64 = 0.15;

const PROBE_PREFIX: &str = "verify-";

/// A verification whose probe is stored and whose images are loaded, waiting
/// for the scorer.
#[derive(Debug)]
pub struct PendingVerification {
    owner: UserId,
    reference: ScoreInput,
    probe: ScoreInput,
}

impl PendingVerification {
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Stored filename of the probe.
    pub fn probe_filename(&self) -> &str {
        &self.probe.filename
    }
}

/// Coordinates signature uploads, the external scorer and the history log.
pub struct SignatureService {
    stores: Stores,
    scorer: Arc<dyn SignatureScorer>,
    clock: Arc<dyn Clock>,
}

impl SignatureService {
    pub fn new(stores: Stores, scorer: Arc<dyn SignatureScorer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            scorer,
            clock,
        }
    }

    /// Store a new reference signature for `owner`.
    pub fn upload_reference(
        &self,
        owner: &UserId,
        upload: Upload,
        description: Option<String>,
    ) -> Result<SignatureRecord, ServiceError> {
        if upload.is_empty() {
            return Err(ServiceError::NoFileProvided);
        }
        if !self.stores.users.user_exists(owner)? {
            return Err(ServiceError::UserNotFound);
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_REFERENCE_DESCRIPTION.to_string());
        let record = self.persist_signature(owner, &upload, "", true, description)?;

        info!(user_id = %owner, signature_id = %record.id, file = %record.filename, "reference signature uploaded");
        Ok(record)
    }

    /// Compare `probe` against the owner's newest reference signature.
    ///
    /// The probe is stored before the scorer is called. The history append
    /// afterwards is best-effort: if it fails the verdict is still returned.
    pub async fn verify(
        &self,
        owner: &UserId,
        probe: Upload,
    ) -> Result<VerificationResult, ServiceError> {
        let pending = self.prepare_verification(owner, probe)?;
        let (result, record) = self.score_verification(pending).await?;
        self.record_verification(owner, &record);
        Ok(result)
    }

    /// Storage half of [`verify`](Self::verify) before the scorer call:
    /// pick the reference, read its bytes and store the probe.
    pub fn prepare_verification(
        &self,
        owner: &UserId,
        probe: Upload,
    ) -> Result<PendingVerification, ServiceError> {
        if probe.is_empty() {
            return Err(ServiceError::NoFileProvided);
        }

        let reference = self
            .stores
            .signatures
            .signatures_for_owner(owner, true)?
            .into_iter()
            .next()
            .ok_or(ServiceError::NoReferenceSignature)?;

        let reference_bytes = match self.stores.files.read_file(&reference.locator()) {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound(_)) => {
                warn!(user_id = %owner, signature_id = %reference.id, file = %reference.filename, "reference file missing from storage");
                return Err(ServiceError::ReferenceFileMissing(reference.filename));
            }
            Err(e) => return Err(e.into()),
        };

        let probe_record = self.persist_signature(
            owner,
            &probe,
            PROBE_PREFIX,
            false,
            DEFAULT_PROBE_DESCRIPTION.to_string(),
        )?;

        Ok(PendingVerification {
            owner: *owner,
            reference: ScoreInput {
                filename: reference.filename,
                bytes: reference_bytes,
            },
            probe: ScoreInput {
                filename: probe_record.filename,
                bytes: probe.bytes,
            },
        })
    }

    /// Ask the scorer about a prepared verification. Returns the result for
    /// the caller and the history entry to record.
    pub async fn score_verification(
        &self,
        pending: PendingVerification,
    ) -> Result<(VerificationResult, VerificationRecord), ServiceError> {
        let owner = pending.owner;
        let verdict = self
            .scorer
            .score(&pending.reference, &pending.probe)
            .await
            .inspect_err(|e| error!(user_id = %owner, error = %e, "scorer call failed"))?;

        let (similarity_score, score_source) = match verdict.similarity {
            Some(score) => (score, ScoreSource::Scorer),
            None => {
                let score = if verdict.is_match {
                    FALLBACK_MATCH_SCORE
                } else {
                    FALLBACK_MISMATCH_SCORE
                };
                warn!(user_id = %owner, is_match = verdict.is_match, score, "scorer returned no similarity, using fallback score");
                (score, ScoreSource::Fallback)
            }
        };
        info!(user_id = %owner, is_match = verdict.is_match, similarity_score, "signature verified");

        let record = VerificationRecord {
            id: VerificationId::generate(),
            original_signature: pending.reference.filename,
            verification_signature: pending.probe.filename,
            similarity_score,
            is_match: verdict.is_match,
            verified_at: self.clock.now(),
        };
        let result = VerificationResult {
            is_match: verdict.is_match,
            similarity_score,
            score_source,
        };
        Ok((result, record))
    }

    /// Append `record` to the owner's history. Best-effort: a failure is
    /// logged and otherwise ignored.
    pub fn record_verification(&self, owner: &UserId, record: &VerificationRecord) {
        match self.stores.history.append_verification(owner, record) {
            Ok(seq) => debug!(user_id = %owner, seq, "history entry appended"),
            Err(e) => error!(
                user_id = %owner,
                verification_id = %record.id,
                error = %e,
                "failed to append verification history; result still returned"
            ),
        }
    }

    /// The owner's reference signatures, newest first.
    pub fn reference_signatures(&self, owner: &UserId) -> Result<Vec<SignatureRecord>, ServiceError> {
        Ok(self.stores.signatures.signatures_for_owner(owner, true)?)
    }

    /// The owner's verification history in chronological order.
    pub fn history(&self, owner: &UserId) -> Result<Vec<HistoryEntryView>, ServiceError> {
        if !self.stores.users.user_exists(owner)? {
            return Err(ServiceError::UserNotFound);
        }
        let records = self.stores.history.history_for_user(owner)?;
        Ok(records.iter().map(HistoryEntryView::from).collect())
    }

    /// Look up one of the owner's signatures. Someone else's signature is
    /// reported as not found.
    pub fn get_signature(
        &self,
        owner: &UserId,
        id: &SignatureId,
    ) -> Result<SignatureRecord, ServiceError> {
        match self.stores.signatures.get_signature(id) {
            Ok(record) if record.owner == *owner => Ok(record),
            Ok(_) | Err(StoreError::NotFound(_)) => Err(ServiceError::SignatureNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// The stored image bytes of one of the owner's signatures.
    pub fn read_signature_image(
        &self,
        owner: &UserId,
        id: &SignatureId,
    ) -> Result<(SignatureRecord, Vec<u8>), ServiceError> {
        let record = self.get_signature(owner, id)?;
        match self.stores.files.read_file(&record.locator()) {
            Ok(bytes) => Ok((record, bytes)),
            Err(StoreError::NotFound(_)) => {
                warn!(signature_id = %id, file = %record.filename, "signature file missing from storage");
                Err(ServiceError::SignatureNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete one of the owner's signatures, then its bytes.
    ///
    /// The record and its owner index entry go together; the file removal
    /// afterwards is best-effort.
    pub fn delete_signature(
        &self,
        owner: &UserId,
        id: &SignatureId,
    ) -> Result<SignatureRecord, ServiceError> {
        self.get_signature(owner, id)?;
        let removed = match self.stores.signatures.delete_signature(id) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => return Err(ServiceError::SignatureNotFound),
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.stores.files.delete_file(&removed.locator()) {
            warn!(signature_id = %id, file = %removed.filename, error = %e, "could not remove signature file");
        }
        info!(user_id = %owner, signature_id = %id, is_reference = removed.is_reference, "signature deleted");
        Ok(removed)
    }

    fn persist_signature(
        &self,
        owner: &UserId,
        upload: &Upload,
        prefix: &str,
        is_reference: bool,
        description: String,
    ) -> Result<SignatureRecord, ServiceError> {
        let id = SignatureId::generate();
        let created_at = self.clock.now();
        let filename = stored_filename(prefix, owner, created_at, &id, upload);
        let locator = self.stores.files.put_file(&filename, &upload.bytes)?;

        let record = SignatureRecord {
            id,
            owner: *owner,
            filename: locator.filename.clone(),
            path: locator.path.clone(),
            is_reference,
            description,
            created_at,
        };
        if let Err(e) = self.stores.signatures.put_signature(&record) {
            if let Err(cleanup) = self.stores.files.delete_file(&locator) {
                warn!(file = %locator.filename, error = %cleanup, "could not remove orphaned upload");
            }
            return Err(match e {
                StoreError::NotFound(_) => ServiceError::UserNotFound,
                other => other.into(),
            });
        }
        Ok(record)
    }
}
