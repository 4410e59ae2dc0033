use super::common::{GradeRequest, QuestionnaireRequest};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, format_validation_errors, service_error_response};
use crate::state::AppState;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::Submission;
use services::NewUpload;
use validator::Validate;

/// POST /api/submissions (multipart/form-data)
///
/// ### Fields
/// - `file` (required): pdf, doc, docx, zip, rar, txt, jpg, jpeg or png, up to `MAX_UPLOAD_BYTES`
/// - `comments` (optional)
/// - `replace` (optional): id of the caller's existing submission for this assignment
///
/// ### Responses
/// - `201 Created` with the stored submission
/// - `400 Bad Request` missing file, wrong type or too large
/// - `404 Not Found` `replace` names no submission
/// - `409 Conflict` a submission already exists and `replace` was not given
pub async fn upload_submission(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Response {
    let mut file_name = None;
    let mut content_type = None;
    let mut bytes = None;
    let mut comments = String::new();
    let mut replace = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(e.status(), e.body_text()),
        };

        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(b) => bytes = Some(b.to_vec()),
                    Err(e) => return error_response(e.status(), e.body_text()),
                }
            }
            "comments" => comments = field.text().await.unwrap_or_default(),
            "replace" => {
                replace = field
                    .text()
                    .await
                    .ok()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
            }
            _ => {}
        }
    }

    let (Some(file_name), Some(bytes)) = (file_name, bytes) else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let upload = NewUpload {
        file_name,
        content_type,
        bytes,
        comments: comments.trim().to_string(),
        replace,
    };

    match app.submissions().upload(&user.actor(), upload).await {
        Ok(submission) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(submission, "Submission stored")),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// POST /api/submissions/{submission_id}/questionnaire
///
/// ### Request Body
/// ```json
/// {
///   "time_spent": "1-2h",
///   "difficulty": "moderate",
///   "resources_used": ["documentation", "peers"],
///   "challenges": "...",
///   "learnings": "..."
/// }
/// ```
///
/// ### Responses
/// - `200 OK` with the updated submission
/// - `400 Bad Request` invalid answers
/// - `403 Forbidden` not the author
/// - `404 Not Found`
/// - `409 Conflict` already answered
pub async fn submit_questionnaire(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<String>,
    payload: Result<Json<QuestionnaireRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    match app
        .submissions()
        .submit_questionnaire(&user.actor(), &submission_id, req.into_answers())
    {
        Ok(submission) => {
            Json(ApiResponse::<Submission>::success(submission, "Questionnaire saved")).into_response()
        }
        Err(e) => service_error_response(e),
    }
}

/// POST /api/submissions/{submission_id}/grade (instructor only)
///
/// ### Request Body
/// ```json
/// { "score": 8.5, "feedback": "Well argued" }
/// ```
///
/// A later grade replaces the earlier one.
pub async fn grade_submission(
    State(app): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<String>,
    payload: Result<Json<GradeRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    match app
        .submissions()
        .grade(&user.actor(), &submission_id, req.score, req.feedback.trim().to_string())
    {
        Ok(submission) => {
            Json(ApiResponse::<Submission>::success(submission, "Grade saved")).into_response()
        }
        Err(e) => service_error_response(e),
    }
}
