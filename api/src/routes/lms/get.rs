use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use services::moodle::{MoodleClient, MoodleError, config_summary};
use tracing::warn;
use util::config;

#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    /// Comma-separated Moodle course ids.
    pub course_ids: Option<String>,
}

fn client(app: &AppState) -> Result<&MoodleClient, Response> {
    app.moodle().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            MoodleError::NotConfigured.to_string(),
        )
    })
}

fn lms_error_response(err: MoodleError) -> Response {
    warn!(error = %err, "LMS request failed");
    let status = match err {
        MoodleError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        MoodleError::NotFound(_) => StatusCode::NOT_FOUND,
        MoodleError::Http(_) | MoodleError::Api { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string())
}

fn ok<T: Serialize>(data: T, message: &str) -> Response {
    Json(ApiResponse::success(data, message)).into_response()
}

/// GET /api/lms/config
///
/// Connection settings with the token masked. Available even when the
/// LMS is not configured, to help diagnose that.
pub async fn get_config(State(app): State<AppState>) -> Response {
    let summary = match app.moodle() {
        Some(client) => client.summary(),
        None => config_summary(&config::moodle_url(), &config::moodle_token()),
    };
    ok(summary, "LMS configuration")
}

/// GET /api/lms/site-info
pub async fn get_site_info(State(app): State<AppState>) -> Response {
    let client = match client(&app) {
        Ok(c) => c,
        Err(r) => return r,
    };
    match client.site_info().await {
        Ok(info) => ok(info, "Connected to Moodle"),
        Err(e) => lms_error_response(e),
    }
}

/// GET /api/lms/assignments?course_ids=2,3
pub async fn get_assignments(
    State(app): State<AppState>,
    Query(query): Query<AssignmentsQuery>,
) -> Response {
    let client = match client(&app) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let mut course_ids = Vec::new();
    for raw in query.course_ids.as_deref().unwrap_or("").split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<i64>() {
            Ok(id) => course_ids.push(id),
            Err(_) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid course id: {raw}"));
            }
        }
    }

    match client.assignments(&course_ids).await {
        Ok(body) => ok(body, "Assignments retrieved"),
        Err(e) => lms_error_response(e),
    }
}

/// GET /api/lms/courses/{course_id}/assignments
pub async fn get_course_assignments(
    State(app): State<AppState>,
    Path(course_id): Path<i64>,
) -> Response {
    let client = match client(&app) {
        Ok(c) => c,
        Err(r) => return r,
    };
    match client.course_assignments(course_id).await {
        Ok(list) => ok(list, "Course assignments retrieved"),
        Err(e) => lms_error_response(e),
    }
}

/// GET /api/lms/assignments/{assignment_id}/submissions
///
/// Moodle's own submission records joined with user names and file links.
pub async fn get_assignment_submissions(
    State(app): State<AppState>,
    Path(assignment_id): Path<i64>,
) -> Response {
    let client = match client(&app) {
        Ok(c) => c,
        Err(r) => return r,
    };
    match client.assignment_submissions(assignment_id).await {
        Ok(rows) => ok(rows, "Assignment submissions retrieved"),
        Err(e) => lms_error_response(e),
    }
}
