use super::common::handle_login;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use lti::LoginRequest;
use lti::discovery::{OpenIdConfiguration, ToolRegistration};

/// GET /
///
/// The URLs to paste into the platform's tool registration form.
pub async fn registration(State(app): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(
        ToolRegistration::for_base_url(app.base_url()),
        "LTI 1.3 tool",
    ))
}

/// GET /.well-known/openid-configuration
pub async fn openid_configuration(State(app): State<AppState>) -> impl IntoResponse {
    Json(OpenIdConfiguration::for_base_url(app.base_url()))
}

/// GET /jwks.json
///
/// The tool's public keys; private members never leave the server.
pub async fn jwks(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.tool_keys().public_jwks().clone())
}

/// GET /login?iss=..&login_hint=..&target_link_uri=..&client_id=..
///
/// Third-party initiated login. Answers `303 See Other` towards the
/// platform's authorization endpoint, or `400` naming the bad parameter.
pub async fn login_get(State(app): State<AppState>, Query(req): Query<LoginRequest>) -> Response {
    handle_login(&app, req)
}
