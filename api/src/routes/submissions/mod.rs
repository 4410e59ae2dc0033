//! `/api/submissions` routes. Every route needs a session token.
//!
//! - `POST /` → upload (learners)
//! - `GET /` → list (own, or the whole resource link for instructors)
//! - `GET /{submission_id}` → one submission
//! - `POST /{submission_id}/questionnaire` → reflection answers (author)
//! - `POST /{submission_id}/grade` → grade (instructors)
//! - `GET /{submission_id}/download` → stored file

use crate::auth::guards::{allow_instructor, allow_learner};
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use get::{download_submission, get_submission, list_submissions};
use post::{grade_submission, submit_questionnaire, upload_submission};

pub mod common;
pub mod get;
pub mod post;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn submissions_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_submissions).merge(
                post(upload_submission)
                    .route_layer(from_fn(allow_learner))
                    .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
            ),
        )
        .route("/{submission_id}", get(get_submission))
        .route("/{submission_id}/questionnaire", post(submit_questionnaire))
        .route(
            "/{submission_id}/grade",
            post(grade_submission).route_layer(from_fn(allow_instructor)),
        )
        .route("/{submission_id}/download", get(download_submission))
}
