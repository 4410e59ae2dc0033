use super::app::{CLIENT_ID, ISSUER};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const PLATFORM_PEM: &[u8] = include_bytes!("../fixtures/platform.pem");

pub const LEARNER_ROLE: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner";
pub const INSTRUCTOR_ROLE: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor";

pub async fn get_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Claims a platform would put in a launch for `user_id` on `link_id`.
pub fn launch_claims(user_id: &str, role: &str, link_id: &str, nonce: &str) -> Value {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    json!({
        "iss": ISSUER,
        "sub": user_id,
        "aud": CLIENT_ID,
        "exp": now + 300,
        "iat": now,
        "nonce": nonce,
        "name": format!("User {user_id}"),
        "email": format!("user{user_id}@example.edu"),
        "https://purl.imsglobal.org/spec/lti/claim/roles": [role],
        "https://purl.imsglobal.org/spec/lti/claim/context": { "id": "c-1", "title": "Databases" },
        "https://purl.imsglobal.org/spec/lti/claim/resource_link": { "id": link_id, "title": "Essay 1" },
        "https://purl.imsglobal.org/spec/lti/claim/deployment_id": "1",
        "https://purl.imsglobal.org/spec/lti/claim/message_type": "LtiResourceLinkRequest",
        "https://purl.imsglobal.org/spec/lti/claim/version": "1.3.0"
    })
}

pub fn sign_platform_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("platform-test-key".into());
    encode(&header, claims, &EncodingKey::from_rsa_pem(PLATFORM_PEM).unwrap()).unwrap()
}

/// Runs `GET /login` and returns the `state` and `nonce` from the redirect.
pub async fn start_login(app: &Router) -> (String, String) {
    let uri = format!(
        "/login?iss={ISSUER}&login_hint=7&target_link_uri=https://tool.example.edu/launch&client_id={CLIENT_ID}"
    );
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let location = res.headers()[header::LOCATION].to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    let q: HashMap<String, String> = url.query_pairs().into_owned().collect();
    (q["state"].clone(), q["nonce"].clone())
}

pub async fn post_launch(app: &Router, id_token: &str, state: &str) -> Response {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id_token", id_token)
        .append_pair("state", state)
        .finish();
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/launch")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Full login → launch handshake; returns the session token.
pub async fn launch_session(app: &Router, user_id: &str, role: &str, link_id: &str) -> String {
    let (state, nonce) = start_login(app).await;
    let token = sign_platform_token(&launch_claims(user_id, role, link_id, &nonce));
    let res = post_launch(app, &token, &state).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = get_json_body(res).await;
    json["data"]["token"].as_str().unwrap().to_string()
}
