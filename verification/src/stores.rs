use std::sync::Arc;

use sigver_store::{FileStore, HistoryStore, SessionStore, SignatureStore, UserStore};

/// Handles to every storage backend the services use.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub signatures: Arc<dyn SignatureStore>,
    pub history: Arc<dyn HistoryStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub files: Arc<dyn FileStore>,
}
