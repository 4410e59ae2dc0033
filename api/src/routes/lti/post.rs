use super::common::{
    LaunchContext, LaunchForm, LaunchResponse, handle_login, launch_view, lti_error_response,
};
use crate::auth::{Claims, generate_jwt};
use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lti::{LoginRequest, LtiError};
use tracing::{error, info};

/// POST /login (form-encoded), same contract as `GET /login`.
pub async fn login_post(State(app): State<AppState>, Form(req): Form<LoginRequest>) -> Response {
    handle_login(&app, req)
}

/// POST /launch
///
/// Receives `id_token` and `state` from the platform. The state is spent
/// first, so it cannot be replayed even when the token turns out bad.
///
/// ### Responses
/// - `200 OK` with a session token, the launch context and the role view
/// - `400 Bad Request` missing token, unknown/expired state, malformed token
/// - `401 Unauthorized` signature, expiry, issuer, audience or nonce failure
/// - `502 Bad Gateway` platform keys could not be fetched
pub async fn launch(State(app): State<AppState>, Form(form): Form<LaunchForm>) -> Response {
    let entry = form
        .state
        .as_deref()
        .and_then(|state| app.oidc_states().consume(state));

    let Some(id_token) = form.id_token.filter(|t| !t.is_empty()) else {
        return lti_error_response(LtiError::MissingParameter("id_token"));
    };
    let Some(entry) = entry else {
        return lti_error_response(LtiError::InvalidState);
    };

    let claims = match app
        .launch_validator()
        .validate(&id_token, &entry.client_id, &entry.nonce)
        .await
    {
        Ok(claims) => claims,
        Err(e) => return lti_error_response(e),
    };

    let (token, expires_at) = match generate_jwt(Claims::from_launch(&claims)) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign session token");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session");
        }
    };

    let context = LaunchContext::from(&claims);
    info!(
        user_id = %context.user_id,
        role = ?context.role,
        resource_link_id = %context.resource_link_id,
        "LTI launch accepted"
    );

    let view = launch_view(&app, &claims);
    Json(ApiResponse::success(
        LaunchResponse {
            token,
            expires_at,
            context,
            view,
        },
        "Launch successful",
    ))
    .into_response()
}
