// In crates/web-server/src/lib.rs

use app_config::ServerSettings;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use engine::{Engine, EvaluationResponse};
use std::sync::Arc;
use tokio::net::TcpListener;
use types::MetricsRequestBody;

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Creates the main application router with all routes and middleware.
///
/// # Arguments
///
/// * `app_state`: The shared `AppState` holding the evaluation engine.
///
/// # Returns
///
/// The configured `axum::Router`.
pub fn create_router(app_state: AppState) -> Router {
    // Any origin may call the API; the dashboard is served from elsewhere.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new().route("/accounts/metrics", post(evaluate_account_handler));

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// The handler for `POST /api/accounts/metrics`.
/// Evaluates one account and returns its metrics, objectives and provenance.
async fn evaluate_account_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MetricsRequestBody>, JsonRejection>,
) -> Result<Json<EvaluationResponse>> {
    let Json(body) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    let request = body.into_request()?;

    let response = state.engine.evaluate(request).await?;
    Ok(Json(response))
}

/// The main entry point for running the web server.
///
/// Serves the router until the process receives Ctrl-C.
pub async fn run(settings: ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::ServeError)?;

    tracing::info!("Web server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
}
