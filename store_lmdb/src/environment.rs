//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::history::LmdbHistoryStore;
use crate::migration;
use crate::session::LmdbSessionStore;
use crate::signature::LmdbSignatureStore;
use crate::user::LmdbUserStore;
use crate::LmdbError;

/// Number of named databases the environment needs.
pub const DATABASE_COUNT: u32 = 8;

/// Default map size (1 GiB). LMDB reserves address space, not disk.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) users_by_email_db: Database<Bytes, Bytes>,
    pub(crate) signatures_db: Database<Bytes, Bytes>,
    pub(crate) signatures_by_owner_db: Database<Bytes, Bytes>,
    pub(crate) history_db: Database<Bytes, Bytes>,
    pub(crate) history_seq_db: Database<Bytes, Bytes>,
    pub(crate) revoked_sessions_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path;
        // nothing else maps the same file with incompatible flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let users_db = env.create_database(&mut wtxn, Some("users"))?;
        let users_by_email_db = env.create_database(&mut wtxn, Some("users_by_email"))?;
        let signatures_db = env.create_database(&mut wtxn, Some("signatures"))?;
        let signatures_by_owner_db =
            env.create_database(&mut wtxn, Some("signatures_by_owner"))?;
        let history_db = env.create_database(&mut wtxn, Some("history"))?;
        let history_seq_db = env.create_database(&mut wtxn, Some("history_seq"))?;
        let revoked_sessions_db = env.create_database(&mut wtxn, Some("revoked_sessions"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            users_db,
            users_by_email_db,
            signatures_db,
            signatures_by_owner_db,
            history_db,
            history_seq_db,
            revoked_sessions_db,
            meta_db,
        };

        migration::upgrade(&environment)?;
        tracing::info!(path = %path.display(), "LMDB environment opened");
        Ok(environment)
    }

    /// Open with the default map size.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, DATABASE_COUNT, DEFAULT_MAP_SIZE)
    }

    pub fn user_store(&self) -> LmdbUserStore {
        LmdbUserStore {
            env: Arc::clone(&self.env),
            users_db: self.users_db,
            users_by_email_db: self.users_by_email_db,
        }
    }

    pub fn signature_store(&self) -> LmdbSignatureStore {
        LmdbSignatureStore {
            env: Arc::clone(&self.env),
            users_db: self.users_db,
            signatures_db: self.signatures_db,
            signatures_by_owner_db: self.signatures_by_owner_db,
        }
    }

    pub fn history_store(&self) -> LmdbHistoryStore {
        LmdbHistoryStore {
            env: Arc::clone(&self.env),
            users_db: self.users_db,
            history_db: self.history_db,
            history_seq_db: self.history_seq_db,
        }
    }

    pub fn session_store(&self) -> LmdbSessionStore {
        LmdbSessionStore {
            env: Arc::clone(&self.env),
            revoked_sessions_db: self.revoked_sessions_db,
        }
    }

    pub(crate) fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let val = self.meta_db.get(&rtxn, key.as_bytes())?.map(|b| b.to_vec());
        Ok(val)
    }

    pub(crate) fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db.put(&mut wtxn, key.as_bytes(), value)?;
        wtxn.commit()?;
        Ok(())
    }
}
