use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] sigver_store_lmdb::LmdbError),

    #[error("scorer client error: {0}")]
    Scorer(#[from] sigver_scorer::ScorerError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] sigver_rpc::RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
