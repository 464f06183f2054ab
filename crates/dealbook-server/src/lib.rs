//! Dealbook Web Server
//!
//! Axum-based REST API serving sheet records and the year-end dashboard.
//!
//! - `GET /api/health` - liveness and version
//! - `GET /api/sheets` - sheet names in the workbook
//! - `GET /api/sheets/:sheet/records?status=` - sheet records, optionally
//!   filtered by payment status
//! - `GET /api/dashboard?year=` - dashboard over the configured sources
//!
//! Every request recomputes from the workbook or documents; the server keeps
//! no mutable state.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use dealbook_core::export::Workbook;
use dealbook_core::Config;

mod handlers;

/// HTTP-level settings
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub workbook: Workbook,
    pub server: ServerConfig,
}

/// Create the application router
pub fn create_router(config: Config, server: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        workbook: Workbook::new(config.export.workbook.clone()),
        config,
        server: server.clone(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/sheets", get(handlers::list_sheets))
        .route("/sheets/:sheet/records", get(handlers::sheet_records))
        .route("/dashboard", get(handlers::get_dashboard));

    let cors = if server.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(config, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    config: Config,
    host: &str,
    port: u16,
    server: ServerConfig,
) -> anyhow::Result<()> {
    info!(
        "Workbook: {}, dashboard sources: {}",
        config.export.workbook.display(),
        config.sources.len()
    );

    let app = create_router(config, server);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
