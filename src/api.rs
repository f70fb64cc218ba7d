// HTTP surface for the dashboard
//
// Read-only. Every request runs the whole pipeline again, so a response is
// always as fresh as the store. Fetch failures never surface as HTTP errors:
// the pipeline already turned them into empty sections.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::dashboard::Dashboard;
use crate::presentation::DashboardView;
use crate::store::RecordStore;

pub struct AppState<S> {
    pub dashboard: Arc<Dashboard<S>>,
    pub recent_transactions: usize,
}

impl<S> AppState<S> {
    pub fn new(dashboard: Dashboard<S>, recent_transactions: usize) -> Self {
        AppState {
            dashboard: Arc::new(dashboard),
            recent_transactions,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            dashboard: Arc::clone(&self.dashboard),
            recent_transactions: self.recent_transactions,
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - the raw bundle
async fn get_dashboard<S: RecordStore + 'static>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let data = state.dashboard.load_now().await;
    Json(ApiResponse::ok(data))
}

/// GET /api/dashboard/view - the bundle after presentation rules
async fn get_dashboard_view<S: RecordStore + 'static>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let data = state.dashboard.load_now().await;
    Json(ApiResponse::ok(DashboardView::from_data(&data, state.recent_transactions)))
}

pub fn router<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard::<S>))
        .route("/dashboard/view", get(get_dashboard_view::<S>))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
