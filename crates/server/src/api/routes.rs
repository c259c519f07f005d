use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::middleware::metrics_middleware;
use super::{handlers, overlays, streams};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Playlists and segments straight from the job directories
    let hls_dir = ServeDir::new(&state.config().streams.output_root);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Streams
        .route("/stream/start", post(streams::start_stream))
        .route("/stream/stop/{id}", post(streams::stop_stream))
        .route("/streams", get(streams::list_streams))
        // Overlays
        .route(
            "/overlays",
            post(overlays::create_overlay).get(overlays::list_overlays),
        )
        .route(
            "/overlays/{id}",
            put(overlays::update_overlay).delete(overlays::delete_overlay),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .nest_service("/hls", hls_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
