//! The axum router, bind/serve lifecycle, and graceful shutdown handle.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, Request};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use referral_auth::LocalIdentityProvider;
use referral_settings::AppEnv;
use referral_store::StoreAdapter;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth::{require_admin, require_viewer};
use crate::routes;
use crate::state::AppState;

/// Request bodies larger than this are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// HTTP server configuration.
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080, request_timeout: Duration::from_secs(30) }
    }
}

/// Build the router: routes, the per-route auth gate, and the ambient
/// middleware stack (request id, tracing, compression, CORS, panic
/// catching, body size limit).
pub fn build_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/referrals", get(routes::referrals::list_referrals))
        .route("/referrals/{id}", get(routes::referrals::get_referral))
        .layer(from_fn_with_state(state.clone(), require_viewer));

    let admin_only = Router::new()
        .route("/uploads", post(routes::uploads::create_upload))
        .layer(from_fn_with_state(state.clone(), require_admin));

    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/auth/login", post(routes::auth::login));

    public
        .merge(protected)
        .merge(admin_only)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(CatchPanicLayer::new())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}

fn make_request_span<B>(request: &Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        subject_id = tracing::field::Empty,
    )
}

/// Build the identity provider and application state, then bind and start
/// serving. Returns a [`ServerHandle`] for graceful shutdown.
pub async fn start(
    config: ServerConfig,
    store: StoreAdapter,
    environment: AppEnv,
    jwt_secret: &str,
) -> Result<ServerHandle, std::io::Error> {
    let identity = Arc::new(LocalIdentityProvider::new(store.clone(), jwt_secret));
    let state = AppState { store, identity, environment };
    start_with_state(config, state).await
}

/// As [`start`], taking an already-built [`AppState`] — used by tests that
/// need to seed accounts before the server binds.
pub async fn start_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state).layer(TimeoutLayer::new(config.request_timeout));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "referral server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    Ok(ServerHandle { port: local_addr.port(), shutdown_tx: Some(shutdown_tx), server: server_task })
}

/// Handle returned by [`start`]. Call [`ServerHandle::shutdown`] to stop
/// accepting new connections, then [`ServerHandle::drain`] to wait for
/// in-flight requests to complete.
pub struct ServerHandle {
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Signal the server to stop accepting new connections. In-flight
    /// requests continue until they complete. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            tracing::info!("server shutdown initiated");
            let _ = tx.send(());
        }
    }

    /// Wait for the server task to finish after [`shutdown`](Self::shutdown).
    pub async fn drain(self) {
        let _ = self.server.await;
        tracing::debug!("server task drained");
    }
}
