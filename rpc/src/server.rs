//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::map_response;
use axum::routing::{get, post};
use axum::Router;
use sigver_verification::{AccountService, SignatureService};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{envelope_plain_errors, RpcError};
use crate::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub signatures: Arc<SignatureService>,
}

#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Upper bound on any request body, uploads included.
    pub max_upload_bytes: usize,
    /// Allow cross-origin requests from anywhere.
    pub cors_allow_any: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            cors_allow_any: true,
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState, config: &RpcConfig) -> Router {
    let cors = if config.cors_allow_any {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let auth = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/profile", get(handlers::profile))
        .route("/logout", post(handlers::logout))
        .route("/history", get(handlers::history));

    let signatures = Router::new()
        .route("/reference", post(handlers::upload_reference))
        .route("/verify", post(handlers::verify))
        .route("/references", get(handlers::references))
        .route(
            "/:id",
            get(handlers::get_signature).delete(handlers::delete_signature),
        )
        .route("/:id/image", get(handlers::signature_image));

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api/auth", auth)
        .nest("/api/signatures", signatures)
        .route("/api/admin/users", get(handlers::list_users))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(map_response(envelope_plain_errors))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The HTTP server: binds, serves until `shutdown` resolves, then drains.
pub struct RpcServer {
    addr: SocketAddr,
    state: AppState,
    config: RpcConfig,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: AppState, config: RpcConfig) -> Self {
        Self {
            addr,
            state,
            config,
        }
    }

    pub async fn bind(&self) -> Result<TcpListener, RpcError> {
        TcpListener::bind(self.addr)
            .await
            .map_err(|source| RpcError::Bind {
                addr: self.addr,
                source,
            })
    }

    /// Serve on an already bound listener.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state, &self.config);
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "HTTP API listening");
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP API stopped");
        Ok(())
    }

    /// Bind the configured address and serve.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}
