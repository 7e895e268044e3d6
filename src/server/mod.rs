/*!
Backend sink.

A small `axum` service standing in for the extension's backend: it acknowledges lifecycle
reports, keeps every reported connection, post and message in memory, and serves counts.

Routes (under `/api`):
- `POST /automation/start` `{type, settings}`
- `POST /automation/stop` `{type}`
- `POST /connections` `{profile}`
- `POST /posts` `{content}`
- `POST /messages` `{message}`
- `GET /stats` -> `{connections, posts, messages}`

Write routes reply `{status:"success", message}`; any failure is a 500 with
`{status:"error", message}`.
*/

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::{ActivityLog, AppState};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/automation/start", post(handlers::automation_start))
        .route("/automation/stop", post(handlers::automation_stop))
        .route("/connections", post(handlers::connections))
        .route("/posts", post(handlers::posts))
        .route("/messages", post(handlers::messages))
        .route("/stats", get(handlers::stats));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve_on(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr().context("Listener has no local address")?;
    info!(target: "linkpilot::server", "Backend sink listening on http://{local}/api");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Backend sink failed")?;
    info!(target: "linkpilot::server", "Backend sink stopped");
    Ok(())
}
