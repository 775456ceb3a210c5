//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router delegating every path to the Dispatcher
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Serve the route manifest for clients that discover routes at runtime
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RpcConfig;
use crate::dispatch::{Dispatcher, RpcRequest, X_RPC_ERROR};
use crate::http::request::request_id_middleware;
use crate::lifecycle::signals;
use crate::routing::{Method, RouteManifest};

/// Where the route manifest is served when enabled. While exposed, GET and
/// HEAD on this path are reserved; other methods still reach the dispatcher.
pub const MANIFEST_PATH: &str = "/__manifest";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub manifest: Arc<RouteManifest>,
}

/// HTTP front end for a [`Dispatcher`].
pub struct RpcServer {
    router: Router,
    config: RpcConfig,
}

impl RpcServer {
    pub fn new(config: RpcConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            manifest: Arc::new(dispatcher.table().manifest()),
            dispatcher,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RpcConfig, state: AppState) -> Router {
        let router: Router<AppState> = Router::new();
        let router = if config.server.expose_manifest {
            router.route(
                MANIFEST_PATH,
                get(manifest_handler).fallback(dispatch_handler),
            )
        } else {
            router
        };

        router
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires or Ctrl+C is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = signals::ctrl_c() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Translate the HTTP request and hand it to the dispatcher.
async fn dispatch_handler(
    State(state): State<AppState>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(method) = Method::try_from(&method) else {
        tracing::debug!(method = %method, path = %uri.path(), "Unsupported method");
        return (
            StatusCode::NOT_FOUND,
            [(X_RPC_ERROR, "not_found")],
            Json(json!({
                "error": "not_found",
                "message": format!("no route for {} {}", method, uri.path()),
            })),
        )
            .into_response();
    };

    let request = RpcRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    state.dispatcher.dispatch(request).await.into_response()
}

async fn manifest_handler(State(state): State<AppState>) -> Json<RouteManifest> {
    Json(state.manifest.as_ref().clone())
}
