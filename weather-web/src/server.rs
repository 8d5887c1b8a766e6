use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use weather_core::{HistoryStore, WeatherProvider};

use crate::{handlers, pages::Pages};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
    pub store: Arc<HistoryStore>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: HistoryStore) -> anyhow::Result<Self> {
        let pages = Pages::new().context("Failed to compile page templates")?;
        Ok(Self {
            provider,
            store: Arc::new(store),
            pages: Arc::new(pages),
        })
    }
}

/// Create the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/history", get(handlers::history_page))
        .route("/graphs", get(handlers::graphs_page))
        .route("/fetch_weather", post(handlers::fetch_weather))
        .route("/fetch_forecast", post(handlers::fetch_forecast))
        .route("/clear_history", post(handlers::clear_history))
        .route("/filter_history", get(handlers::filter_history))
        .route("/get_city_coordinates", get(handlers::get_city_coordinates))
        .route("/get_history", get(handlers::get_history))
        .route("/generate_graph", get(handlers::generate_graph))
        .route("/download_csv", get(handlers::download_csv))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
