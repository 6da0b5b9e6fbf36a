//! Router builder for the dashboard route

use super::dispatcher::DashboardAction;
use super::handler::dashboard_handler;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Build the dashboard routes
///
/// - GET|POST {mount_path} - every dashboard view
/// - GET /health, /healthz - health check
pub fn build_dashboard_routes(action: DashboardAction, mount_path: &str) -> Router {
    let dashboard_routes = Router::new()
        .route(mount_path, get(dashboard_handler).post(dashboard_handler))
        .with_state(action);

    health_routes()
        .merge(dashboard_routes)
        .layer(TraceLayer::new_for_http())
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "this-dashboard"
    }))
}
