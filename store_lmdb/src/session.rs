//! LMDB implementation of SessionStore.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env};

use sigver_store::session::SessionStore;
use sigver_store::StoreError;
use sigver_types::SessionId;

use crate::keys::{millis_from_sortable, sortable_millis};
use crate::LmdbError;

pub struct LmdbSessionStore {
    pub(crate) env: Arc<Env>,
    pub(crate) revoked_sessions_db: Database<Bytes, Bytes>,
}

impl SessionStore for LmdbSessionStore {
    fn revoke_session(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.revoked_sessions_db
            .put(&mut wtxn, id.as_bytes(), &sortable_millis(expires_at))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn is_revoked(&self, id: &SessionId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .revoked_sessions_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let now_millis = now.timestamp_millis();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let mut expired = Vec::new();
        for result in self.revoked_sessions_db.iter(&wtxn).map_err(LmdbError::from)? {
            let (key, val) = result.map_err(LmdbError::from)?;
            let arr: [u8; 8] = val
                .try_into()
                .map_err(|_| StoreError::Corruption("revocation expiry is not 8 bytes".into()))?;
            if millis_from_sortable(arr) <= now_millis {
                expired.push(key.to_vec());
            }
        }

        for key in &expired {
            self.revoked_sessions_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "purged expired session revocations");
        }
        Ok(expired.len() as u64)
    }
}
