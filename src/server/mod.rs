//! HTTP server for the task API.
//!
//! Provides the axum router over `/tasks` and the server lifecycle.

pub mod envelope;
pub mod routes;

pub use envelope::{ApiFailure, Envelope};

use crate::config::{Environment, ServerConfig};
use crate::db::Database;
use crate::error::{ErrorCode, ServiceError};
use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, patch},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reference to the task database.
    pub db: Arc<Database>,
    /// Controls whether internal error causes are sent to clients.
    pub environment: Environment,
}

impl AppState {
    pub fn new(db: Arc<Database>, environment: Environment) -> Self {
        Self { db, environment }
    }

    /// Wrap an error for the response, honoring the environment.
    pub fn reject(&self, error: ServiceError) -> ApiFailure {
        ApiFailure::new(error, self.environment.exposes_internal_errors())
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(Envelope::ok(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Unknown routes answer with a failure envelope rather than an empty 404.
async fn fallback(uri: Uri) -> impl IntoResponse {
    let mut envelope = Envelope::<()>::failure(format!("Route not found: {}", uri.path()));
    envelope.code = Some(ErrorCode::NotFound);
    (StatusCode::NOT_FOUND, Json(envelope))
}

/// Routes for the task resource, relative to its mount point.
fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(routes::list_tasks).post(routes::create_task))
        .route("/stats", get(routes::task_stats))
        .route(
            "/{id}",
            get(routes::get_task)
                .put(routes::update_task)
                .delete(routes::delete_task),
        )
        .route("/{id}/status", patch(routes::patch_task_status))
}

/// Build the router with all routes.
pub fn build_router(state: AppState, cors: bool) -> Router {
    let tasks = task_routes();

    let mut router = Router::new()
        .nest("/tasks", tasks.clone())
        .nest("/api/tasks", tasks)
        .route("/health", get(health))
        .route("/api/health", get(health))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http());

    if cors {
        // Browser clients are served from another origin during development
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// Start the HTTP server.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    db: Arc<Database>,
    config: &ServerConfig,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = AppState::new(db, config.environment);
    let app = build_router(state, config.cors);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task API shutting down");
            })
            .await
        {
            tracing::error!("Task API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
