//! LMDB implementation of SignatureStore.
//!
//! Records live in `signatures`; `signatures_by_owner` holds one empty-valued
//! key per record (`owner ++ is_reference ++ created_at ++ id`) so an owner's
//! references come back newest-first from a reverse prefix scan.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use sigver_store::signature::SignatureStore;
use sigver_store::StoreError;
use sigver_types::{SignatureId, SignatureRecord, UserId};

use crate::keys::{owner_index_key, owner_prefix};
use crate::LmdbError;

pub struct LmdbSignatureStore {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) signatures_db: Database<Bytes, Bytes>,
    pub(crate) signatures_by_owner_db: Database<Bytes, Bytes>,
}

impl SignatureStore for LmdbSignatureStore {
    fn put_signature(&self, record: &SignatureRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .users_db
            .get(&wtxn, record.owner.as_bytes())
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("owner {}", record.owner)));
        }
        if self
            .signatures_db
            .get(&wtxn, record.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("signature {}", record.id)));
        }

        self.signatures_db
            .put(&mut wtxn, record.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.signatures_by_owner_db
            .put(&mut wtxn, &owner_index_key(record), &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .signatures_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("signature {id}")))?;
        let record: SignatureRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn signatures_for_owner(
        &self,
        owner: &UserId,
        is_reference: bool,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        let prefix = owner_prefix(owner, is_reference);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .signatures_by_owner_db
            .rev_prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;

        let mut results = Vec::new();
        for result in iter {
            let (key, _) = result.map_err(LmdbError::from)?;
            let id_bytes: [u8; SignatureId::LEN] = key[key.len() - SignatureId::LEN..]
                .try_into()
                .map_err(|_| StoreError::Corruption("short owner index key".to_string()))?;
            let val = self
                .signatures_db
                .get(&rtxn, &id_bytes)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "owner index points at missing signature {}",
                        SignatureId::from_bytes(id_bytes)
                    ))
                })?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn delete_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let record: SignatureRecord = match self
            .signatures_db
            .get(&wtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(val) => bincode::deserialize(val).map_err(LmdbError::from)?,
            None => return Err(StoreError::NotFound(format!("signature {id}"))),
        };

        self.signatures_db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(LmdbError::from)?;
        self.signatures_by_owner_db
            .delete(&mut wtxn, &owner_index_key(&record))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }
}
