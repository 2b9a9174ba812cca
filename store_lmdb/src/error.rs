use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database schema v{found} was written by a newer release (this build reads up to v{supported})")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("no upgrade path from schema v{0}")]
    NoUpgradePath(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for sigver_store::StoreError {
    fn from(e: LmdbError) -> Self {
        use sigver_store::StoreError;
        match e {
            LmdbError::NotFound(key) => StoreError::NotFound(key),
            LmdbError::Duplicate(key) => StoreError::Duplicate(key),
            LmdbError::Serialization(msg) => StoreError::Serialization(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
