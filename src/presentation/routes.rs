// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_visualization, delete_visualization, generate_analysis, health_check, list_insights,
    list_visualizations, update_visualization,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/visualizations",
            get(list_visualizations).post(create_visualization),
        )
        .route(
            "/visualizations/:id",
            put(update_visualization).delete(delete_visualization),
        )
        .route("/visualizations/:id/insights", get(list_insights))
        .route("/analysis", post(generate_analysis))
}

pub fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
