// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dashboard_page, dashboard_state, get_glucose, health_check, method_not_allowed,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/healthz", get(health_check))
        .route(
            "/api/glucose",
            get(get_glucose)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route("/api/dashboard", get(dashboard_state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
