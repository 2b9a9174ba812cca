//! The node: opens storage, wires the services and runs the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use sigver_crypto::{generate_secret, CredentialService};
use sigver_rpc::{AppState, RpcConfig, RpcServer};
use sigver_scorer::{HttpScorer, SignatureScorer};
use sigver_store_lmdb::{DiskFileStore, LmdbEnvironment, DATABASE_COUNT};
use sigver_types::{Clock, SystemClock};
use sigver_verification::{AccountService, SignatureService, Stores};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::shutdown::ShutdownController;
use crate::NodeError;

pub struct SigverNode {
    config: NodeConfig,
    state: AppState,
    shutdown: Arc<ShutdownController>,
}

impl SigverNode {
    /// Open the LMDB environment and upload directory named by `config`
    /// and connect to the configured scorer.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let env = LmdbEnvironment::open(&config.data_dir, DATABASE_COUNT, config.lmdb_map_size)?;
        let files = DiskFileStore::open(config.uploads_path())?;
        info!(data_dir = %config.data_dir.display(), uploads = %files.root().display(), "storage ready");

        let stores = Stores {
            users: Arc::new(env.user_store()),
            signatures: Arc::new(env.signature_store()),
            history: Arc::new(env.history_store()),
            sessions: Arc::new(env.session_store()),
            files: Arc::new(files),
        };
        let scorer = HttpScorer::new(
            &config.scorer_url,
            Duration::from_secs(config.scorer_timeout_secs),
        )?;
        info!(endpoint = scorer.endpoint(), "scorer client ready");

        Self::with_parts(config, stores, Arc::new(scorer), Arc::new(SystemClock))
    }

    /// Assemble a node from already constructed backends.
    pub fn with_parts(
        config: NodeConfig,
        stores: Stores,
        scorer: Arc<dyn SignatureScorer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        config.validate()?;

        let secret = match &config.token_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                warn!("no token_secret configured; using a random one, tokens will not survive a restart");
                generate_secret()
            }
        };
        let credentials = CredentialService::new(
            secret,
            chrono::Duration::days(config.token_ttl_days),
            clock.clone(),
        );

        match stores.sessions.purge_expired(clock.now()) {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "dropped expired session revocations"),
            Err(e) => warn!(error = %e, "could not purge expired session revocations"),
        }

        let accounts = AccountService::new(stores.clone(), credentials, clock.clone())
            .with_admin_emails(&config.admin_emails);
        let signatures = SignatureService::new(stores, scorer, clock);

        Ok(Self {
            config,
            state: AppState {
                accounts: Arc::new(accounts),
                signatures: Arc::new(signatures),
            },
            shutdown: Arc::new(ShutdownController::new()),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle for stopping the node from another task.
    pub fn shutdown_handle(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    fn rpc_server(&self) -> RpcServer {
        RpcServer::new(
            self.config.socket_addr(),
            self.state.clone(),
            RpcConfig {
                max_upload_bytes: self.config.max_upload_bytes,
                cors_allow_any: self.config.cors_allow_any,
            },
        )
    }

    /// Serve on `listener` until shutdown is triggered.
    pub async fn serve(self, listener: TcpListener) -> Result<(), NodeError> {
        let stopping = self.shutdown.notified();
        self.rpc_server().serve(listener, stopping).await?;
        info!("node stopped");
        Ok(())
    }

    /// Bind the configured address, serve, and stop on SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), NodeError> {
        let server = self.rpc_server();
        let listener = server.bind().await?;

        let shutdown = self.shutdown_handle();
        let signals = tokio::spawn(async move { shutdown.wait_for_signal().await });

        let result = self.serve(listener).await;
        signals.abort();
        result
    }
}
