// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dispatcher::{DispatcherOptions, MapDispatcher};
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::provider_chain::build_elevation_provider;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_free_line, add_shape, drag_end, drag_move, drag_start, health_check, hide_panel,
    inspect_line, link_points, list_shapes, live_overlay, panel_state, panel_svg, place_point,
    remove_line, remove_point, remove_shape, unlink_line,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("loading line metrics configuration")?;

    // Elevation sources (infrastructure layer)
    let provider = build_elevation_provider(&config.providers);
    tracing::info!("elevation sources: {:?}", provider.source_names());

    // Dispatcher task owns all map state (application layer)
    let (dispatcher, map) = MapDispatcher::new(provider, DispatcherOptions::from(&config));
    tokio::spawn(dispatcher.run());

    let state = Arc::new(AppState { map });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/points", post(place_point))
        .route("/points/:id", delete(remove_point))
        .route("/points/:id/drag-start", post(drag_start))
        .route("/points/:id/drag", post(drag_move))
        .route("/points/:id/drag-end", post(drag_end))
        .route("/lines", post(link_points))
        .route("/lines/free", post(add_free_line))
        .route("/lines/:id", delete(remove_line))
        .route("/lines/:id/inspect", post(inspect_line))
        .route("/lines/:id/unlink", post(unlink_line))
        .route("/shapes", get(list_shapes).post(add_shape))
        .route("/shapes/:id", delete(remove_shape))
        .route("/overlay", get(live_overlay))
        .route("/panel", get(panel_state))
        .route("/panel.svg", get(panel_svg))
        .route("/panel/hide", post(hide_panel))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid server.bind address {}", config.server.bind))?;
    tracing::info!("Starting map-line-metrics service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
