//! Verification history storage trait.

use crate::StoreError;
use sigver_types::{UserId, VerificationRecord};

/// Append-only log of verification outcomes, keyed by user.
///
/// Entries are returned in append order, which is chronological. There is
/// deliberately no update or delete operation.
pub trait HistoryStore: Send + Sync {
    /// Append one record to `user`'s log and return its sequence number
    /// (1-based, per user).
    fn append_verification(
        &self,
        user: &UserId,
        record: &VerificationRecord,
    ) -> Result<u64, StoreError>;

    fn history_for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, StoreError>;
}
