//! Development-only inspection routes, never mounted in production.

use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use db::Submission;
use serde::Serialize;

pub fn debug_routes() -> Router<AppState> {
    Router::new().route("/submissions", get(dump_submissions))
}

#[derive(Serialize)]
struct SubmissionDump {
    total: usize,
    submissions: Vec<Submission>,
}

/// GET /api/debug/submissions
///
/// Every stored submission, across all resource links. Used by the
/// `verify_submissions` tool.
async fn dump_submissions(State(app): State<AppState>) -> impl IntoResponse {
    let submissions = app.submissions().store().list();
    Json(ApiResponse::success(
        SubmissionDump {
            total: submissions.len(),
            submissions,
        },
        "All submissions",
    ))
}
