use super::common::{SubmissionListResponse, attachment_disposition};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, service_error_response};
use crate::state::AppState;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use db::Submission;
use tokio_util::io::ReaderStream;
use tracing::error;

/// GET /api/submissions
///
/// Instructors get every submission of the launched resource link plus
/// `stats`; learners get their own submission (zero or one).
pub async fn list_submissions(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    let actor = user.actor();
    let submissions = app.submissions().list_for(&actor);
    let stats = actor
        .instructor
        .then(|| app.submissions().stats(&actor.resource_link_id));

    Json(ApiResponse::success(
        SubmissionListResponse { submissions, stats },
        "Submissions retrieved",
    ))
}

/// GET /api/submissions/{submission_id}
///
/// - `200 OK` for the author or an instructor of the same resource link
/// - `403 Forbidden` otherwise
/// - `404 Not Found`
pub async fn get_submission(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<String>,
) -> Response {
    match app.submissions().get(&user.actor(), &submission_id) {
        Ok(submission) => {
            Json(ApiResponse::<Submission>::success(submission, "Submission retrieved")).into_response()
        }
        Err(e) => service_error_response(e),
    }
}

/// GET /api/submissions/{submission_id}/download
///
/// Streams the stored file with its original name in `Content-Disposition`.
/// `404` when the record or the file on disk is missing.
pub async fn download_submission(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<String>,
) -> Response {
    let (submission, path) = match app.submissions().download(&user.actor(), &submission_id) {
        Ok(found) => found,
        Err(e) => return service_error_response(e),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!(error = %e, file = %path.display(), "Failed to open stored upload");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to open file");
        }
    };

    let mime = mime_guess::from_path(&submission.file.file_name).first_or_octet_stream();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&attachment_disposition(&submission.file.file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Ok(len) = HeaderValue::from_str(&submission.file.file_size.to_string()) {
        headers.insert(header::CONTENT_LENGTH, len);
    }

    (StatusCode::OK, headers, Body::from_stream(ReaderStream::new(file))).into_response()
}
