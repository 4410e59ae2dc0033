use crate::routes::common::error_response;
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use db::Submission;
use lti::{LaunchRole, LoginRequest, LtiClaims, LtiError, authorization_redirect};
use serde::{Deserialize, Serialize};
use services::SubmissionStats;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct LaunchForm {
    pub id_token: Option<String>,
    pub state: Option<String>,
}

/// Who launched the tool, and from where.
#[derive(Debug, Serialize)]
pub struct LaunchContext {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: LaunchRole,
    pub resource_link_id: String,
    pub resource_title: String,
    pub context_title: Option<String>,
    pub deployment_id: Option<String>,
}

impl From<&LtiClaims> for LaunchContext {
    fn from(claims: &LtiClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            name: claims.display_name(),
            email: claims.email().to_string(),
            role: claims.role(),
            resource_link_id: claims.resource_link_id(),
            resource_title: claims.resource_title(),
            context_title: claims.context_title(),
            deployment_id: claims.deployment_id.clone(),
        }
    }
}

/// What the launched user gets to see first.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum LaunchView {
    Instructor {
        submissions: Vec<Submission>,
        stats: SubmissionStats,
    },
    Learner {
        submission: Option<Submission>,
    },
}

#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    pub token: String,
    pub expires_at: String,
    pub context: LaunchContext,
    #[serde(flatten)]
    pub view: LaunchView,
}

/// Shared by `GET /login` and `POST /login`: validates the initiation
/// request, remembers a fresh state/nonce and redirects to the platform.
pub fn handle_login(app: &AppState, req: LoginRequest) -> Response {
    let login = match req.validate() {
        Ok(login) => login,
        Err(e) => return lti_error_response(e),
    };

    if !app.platform().is_issuer(&login.iss) {
        warn!(iss = %login.iss, "Login from unknown issuer refused");
        return lti_error_response(LtiError::UnknownIssuer(login.iss));
    }

    let issued = app.oidc_states().issue(&login.client_id);
    match authorization_redirect(app.platform(), &login, &app.launch_url(), &issued) {
        Ok(url) => {
            info!(client_id = %login.client_id, login_hint = %login.login_hint, "OIDC login initiated");
            Redirect::to(url.as_str()).into_response()
        }
        Err(e) => lti_error_response(e),
    }
}

/// The role-specific part of the launch reply.
pub fn launch_view(app: &AppState, claims: &LtiClaims) -> LaunchView {
    let link = claims.resource_link_id();
    match claims.role() {
        LaunchRole::Instructor => LaunchView::Instructor {
            submissions: app.submissions().store().list_for_resource_link(&link),
            stats: app.submissions().stats(&link),
        },
        LaunchRole::Learner => LaunchView::Learner {
            submission: app.submissions().store().find_for_user(&claims.sub, &link),
        },
    }
}

pub fn lti_error_response(err: LtiError) -> Response {
    if err.is_rejection() {
        warn!(error = %err, "Launch rejected");
        return error_response(StatusCode::UNAUTHORIZED, err.to_string());
    }
    let status = match &err {
        LtiError::KeyFetch(_) | LtiError::InvalidKey(_) => StatusCode::BAD_GATEWAY,
        LtiError::ToolKeys(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.to_string())
}
