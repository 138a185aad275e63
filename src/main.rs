//! Labbook - a web frontend for a research lab notebook and paper editor.
//!
//! This is the main entry point for the web server.
//! The application is organized into the following modules:
//!
//! - `config`: Environment configuration
//! - `api`: Typed client for the lab API
//! - `auth`: Access token cookie and current user lookup
//! - `notebook`: Timeline filtering, grouping and entry editing
//! - `paper`: Paper drafts, experiment context and assistant endpoints
//! - `templates`: HTML/CSS/JS templates and rendering
//! - `handlers`: HTTP route handlers

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use labbook::config::{Config, DEFAULT_LOG_FILTER};
use labbook::{handlers, paper, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let bind = config.bind;
    let api_url = config.api_url.to_string();

    let state = match AppState::new(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            std::process::exit(1);
        }
    };

    let app = Router::new()
        // Core routes
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/logout", get(handlers::logout))
        // Notebook routes
        .route("/notebook", get(handlers::notebook_page))
        .route("/notebook/save", post(handlers::save_entry))
        .route("/notebook/attachments", post(handlers::upload_attachments))
        .route("/notebook/summary", get(handlers::summary_page))
        .route(
            "/notebook-attachments/{id}/download",
            get(handlers::download_attachment),
        )
        .route("/api/notebook/preview", post(handlers::notebook_preview))
        // Paper routes
        .route("/paper", get(paper::paper_page))
        .route("/paper/print", post(paper::print_paper))
        .route("/paper/load", post(paper::load_from_project))
        .route("/paper/save", post(paper::save_to_project))
        .route("/paper/journals", post(paper::journal_page))
        .route("/api/paper/draft", post(paper::save_draft))
        .route("/api/paper/preview", post(paper::preview))
        .route("/api/journal-match", post(paper::journal_match))
        .route("/api/copilot-chat", post(paper::copilot_chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %bind, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%bind, api = %api_url, "labbook server running");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
    }
}
