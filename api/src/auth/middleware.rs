use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::{Origin, UserAgent};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

use crate::auth::claims::AuthUser;

/// Who is calling, as far as the request headers tell.
#[derive(Debug, Default, PartialEq, Eq)]
struct Caller {
    user: Option<String>,
    role: Option<String>,
    resource_link: Option<String>,
    origin: Option<String>,
    user_agent: Option<String>,
}

impl Caller {
    async fn from_parts(parts: &mut Parts) -> Self {
        let session = AuthUser::from_request_parts(parts, &()).await.ok();
        let origin = TypedHeader::<Origin>::from_request_parts(parts, &())
            .await
            .ok()
            .map(|TypedHeader(o)| o.to_string());
        let user_agent = TypedHeader::<UserAgent>::from_request_parts(parts, &())
            .await
            .ok()
            .map(|TypedHeader(ua)| ua.to_string());

        let (user, role, resource_link) = match session {
            Some(AuthUser(c)) => (Some(c.sub), Some(c.role.as_str().to_string()), Some(c.resource_link_id)),
            None => (None, None, None),
        };
        Self {
            user,
            role,
            resource_link,
            origin,
            user_agent,
        }
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Logs each request (CORS preflights excluded) once it has been answered:
/// method, path, status, latency, client ip, and the session user, role
/// and resource link when a valid bearer token is present.
///
/// The server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let caller = Caller::from_parts(&mut parts).await;
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let started = Instant::now();
    let response = next.run(Request::from_parts(parts, body)).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        ip = %addr.ip(),
        user = or_dash(&caller.user),
        role = or_dash(&caller.role),
        resource_link = or_dash(&caller.resource_link),
        origin = or_dash(&caller.origin),
        user_agent = or_dash(&caller.user_agent),
        "Request handled"
    );
    response
}
