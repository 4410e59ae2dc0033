//! HTTP route entry points.
//!
//! - [`lti::lti_routes`] sits at the server root (`/`, `/login`, `/launch`, key discovery).
//! - [`routes`] builds everything under `/api`:
//!   - `/health` → public health check
//!   - `/submissions` → submission workflow (session required)
//!   - `/lms` → Moodle proxy (instructors)
//!   - `/debug` → store dump, mounted only outside production

use crate::auth::guards::{allow_authenticated, allow_instructor};
use crate::routes::{
    debug::debug_routes, health::health_routes, lms::lms_routes,
    submissions::submissions_routes,
};
use crate::state::AppState;
use axum::{Router, middleware::from_fn};
use util::config;

pub mod common;
pub mod debug;
pub mod health;
pub mod lms;
pub mod lti;
pub mod submissions;

/// Builds the `/api` router.
pub fn routes(app_state: AppState) -> Router<AppState> {
    let max_upload = app_state.submissions().max_upload_bytes();
    let mut router: Router<AppState> = Router::new()
        .nest("/health", health_routes())
        .nest(
            "/submissions",
            submissions_routes(max_upload).route_layer(from_fn(allow_authenticated)),
        )
        .nest("/lms", lms_routes().route_layer(from_fn(allow_instructor)));

    if !config::is_production() {
        router = router.nest("/debug", debug_routes());
        tracing::info!("[dev/test] Mounted /debug routes (env = {})", config::env());
    } else {
        tracing::info!("[prod] Skipping /debug routes");
    }

    router
}

/// The complete application: LTI endpoints at the root, API under `/api`.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(lti::lti_routes())
        .nest("/api", routes(app_state.clone()))
        .with_state(app_state)
}
