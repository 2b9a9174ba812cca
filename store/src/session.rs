//! Session revocation storage trait.

use crate::StoreError;
use chrono::{DateTime, Utc};
use sigver_types::SessionId;

/// Tracks sessions that were explicitly ended before their token expired.
pub trait SessionStore: Send + Sync {
    /// Mark a session revoked. `expires_at` is the token expiry, after which
    /// the entry may be purged.
    fn revoke_session(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    fn is_revoked(&self, id: &SessionId) -> Result<bool, StoreError>;

    /// Drop revocations whose token has expired anyway. Returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
