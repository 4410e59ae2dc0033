use axum::{Router, routing::get, Json, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

/// GET /api/health
///
/// ```json
/// { "success": true, "data": { "status": "OK", "timestamp": "..." }, "message": "Health check passed" }
/// ```
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success(
        Health {
            status: "OK",
            timestamp: Utc::now().to_rfc3339(),
        },
        "Health check passed",
    ))
}
