//! LTI 1.3 endpoints mounted at the server root:
//!
//! - `GET /` → registration summary
//! - `GET /.well-known/openid-configuration`
//! - `GET /jwks.json` → tool public keys
//! - `GET|POST /login` → OIDC login initiation
//! - `POST /launch` → id_token validation and session start

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use get::{jwks, login_get, openid_configuration, registration};
use post::{launch, login_post};

pub mod common;
pub mod get;
pub mod post;

pub fn lti_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(registration))
        .route("/.well-known/openid-configuration", get(openid_configuration))
        .route("/jwks.json", get(jwks))
        .route("/login", get(login_get).post(login_post))
        .route("/launch", post(launch))
}
