//! HTTP surface of an exporter.
//!
//! Serves the landing page on `/`, the exposition output on `/metrics` and a
//! JSON health check on `/health`.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ListenAddress;
use crate::exporter::Scrape;
use crate::publish::EXPOSITION_CONTENT_TYPE;

/// Static landing page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandingPage {
    /// Contents of the `<title>` element.
    pub title: &'static str,
    /// Contents of the `<h2>` heading.
    pub heading: &'static str,
}

impl LandingPage {
    /// Renders the page, linking to `/metrics`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "<html>\n\
             <head><title>{}</title></head>\n\
             <body>\n\
             <h2>{}</h2>\n\
             <p><a href='/metrics'>Metrics</a></p>\n\
             </body>\n\
             </html>\n",
            self.title, self.heading
        )
    }
}

/// State shared by the route handlers.
#[derive(Clone)]
pub struct AppState {
    exporter: Arc<dyn Scrape>,
    landing: LandingPage,
    service: &'static str,
}

impl AppState {
    /// Creates the state for one exporter.
    pub fn new(exporter: Arc<dyn Scrape>, landing: LandingPage, service: &'static str) -> Self {
        Self {
            exporter,
            landing,
            service,
        }
    }

    /// The exporter behind `/metrics`.
    #[must_use]
    pub fn exporter(&self) -> &dyn Scrape {
        self.exporter.as_ref()
    }

    /// Service name reported by `/health`.
    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Creates the router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/metrics", get(metrics))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `listen_address` and serves until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - The address cannot be resolved or bound
/// - A fatal error occurs while serving
pub async fn run_server(listen_address: &ListenAddress, state: AppState) -> Result<()> {
    let service = state.service();
    let app = create_router(state);
    let listener = TcpListener::bind((listen_address.host(), listen_address.port())).await?;
    let local = listener.local_addr()?;

    tracing::info!(%service, addr = %local, "Listening for scrapes");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(%service, "Server shutdown complete");
    Ok(())
}

async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(state.landing.render())
}

/// Runs a collect cycle and returns the exposition text.
///
/// A failed cycle becomes a `502 Bad Gateway` so the scraper records the target
/// as down instead of ingesting a partial result.
async fn metrics(State(state): State<AppState>) -> Response {
    match state.exporter().scrape().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(service = state.service(), error = %e, "Scrape failed");
            (StatusCode::BAD_GATEWAY, format!("Scrape failed: {e}\n")).into_response()
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
