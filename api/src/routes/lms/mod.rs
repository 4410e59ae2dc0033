//! `/api/lms` routes: a thin proxy to the Moodle web-service API.
//! Instructor session required; `503` when the LMS is not configured.

use crate::state::AppState;
use axum::{Router, routing::get};
use get::{
    get_assignment_submissions, get_assignments, get_config, get_course_assignments,
    get_site_info,
};

pub mod get;

pub fn lms_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/site-info", get(get_site_info))
        .route("/assignments", get(get_assignments))
        .route("/courses/{course_id}/assignments", get(get_course_assignments))
        .route(
            "/assignments/{assignment_id}/submissions",
            get(get_assignment_submissions),
        )
}
