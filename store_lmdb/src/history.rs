//! LMDB implementation of HistoryStore.
//!
//! Each user's log is the key range `user_id ++ seq_be`. The next sequence
//! number is read and bumped inside the same write transaction as the
//! append, so concurrent appends for one user serialise on LMDB's single
//! writer and never share a key.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use sigver_store::history::HistoryStore;
use sigver_store::StoreError;
use sigver_types::{UserId, VerificationRecord};

use crate::keys::history_key;
use crate::LmdbError;

pub struct LmdbHistoryStore {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) history_db: Database<Bytes, Bytes>,
    pub(crate) history_seq_db: Database<Bytes, Bytes>,
}

impl HistoryStore for LmdbHistoryStore {
    fn append_verification(
        &self,
        user: &UserId,
        record: &VerificationRecord,
    ) -> Result<u64, StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .users_db
            .get(&wtxn, user.as_bytes())
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("user {user}")));
        }

        let last = match self
            .history_seq_db
            .get(&wtxn, user.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(val) => {
                let arr: [u8; 8] = val.try_into().map_err(|_| {
                    StoreError::Corruption(format!("history sequence for {user} is not 8 bytes"))
                })?;
                u64::from_be_bytes(arr)
            }
            None => 0,
        };
        let seq = last + 1;

        self.history_db
            .put(&mut wtxn, &history_key(user, seq), &bytes)
            .map_err(LmdbError::from)?;
        self.history_seq_db
            .put(&mut wtxn, user.as_bytes(), &seq.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(seq)
    }

    fn history_for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .history_db
            .prefix_iter(&rtxn, user.as_bytes())
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }
}
