//! Signature metadata storage trait.

use crate::StoreError;
use sigver_types::{SignatureId, SignatureRecord, UserId};

/// Trait for signature metadata storage.
///
/// Records are indexed by owner so a user's reference set can be listed
/// without scanning every signature.
pub trait SignatureStore: Send + Sync {
    /// Insert a signature. Fails with [`StoreError::NotFound`] when the owner
    /// does not exist and [`StoreError::Duplicate`] when the id is taken.
    fn put_signature(&self, record: &SignatureRecord) -> Result<(), StoreError>;

    fn get_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError>;

    /// All signatures of `owner` with the given reference flag, newest first
    /// (see [`SignatureRecord::newest_first`]).
    fn signatures_for_owner(
        &self,
        owner: &UserId,
        is_reference: bool,
    ) -> Result<Vec<SignatureRecord>, StoreError>;

    /// Delete a signature and its owner index entry together. Returns the removed record.
    fn delete_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError>;
}
