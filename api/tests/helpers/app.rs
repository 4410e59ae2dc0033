use api::routes::app;
use api::state::AppState;
use axum::Router;
use lti::{LaunchValidator, PlatformConfig, StaticKeySource, ToolKeySet};
use services::{MoodleClient, MoodleConfig, SubmissionService};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use util::config::AppConfig;
use util::paths;
use util::test_helpers::setup_test_storage_root;

pub const ISSUER: &str = "https://moodle.example.edu";
pub const CLIENT_ID: &str = "tool-client-1";
pub const BASE_URL: &str = "https://tool.example.edu";
pub const MAX_UPLOAD: usize = 64 * 1024;

const PLATFORM_JWKS: &str = include_str!("../fixtures/platform_jwks.json");
const TOOL_KEYS: &str = include_str!("../fixtures/tool_keys.json");

fn build(moodle: Option<MoodleClient>) -> (Router, AppState, TempDir) {
    let tmp = setup_test_storage_root();
    AppConfig::set_env("test");
    AppConfig::set_session_secret("test-session-secret");

    let store = db::open_store().expect("store opens");
    let submissions = SubmissionService::new(Arc::new(store), paths::storage_root(), MAX_UPLOAD);

    let platform = PlatformConfig::new(ISSUER, "/mod/lti/auth.php", "/mod/lti/certs.php");
    let keys = StaticKeySource::from_json(PLATFORM_JWKS).expect("platform jwks");
    let validator = LaunchValidator::new(ISSUER, Arc::new(keys));
    let tool_keys =
        ToolKeySet::from_value(serde_json::from_str(TOOL_KEYS).unwrap()).expect("tool keys");

    let state = AppState::new(
        submissions,
        platform,
        validator,
        tool_keys,
        moodle,
        BASE_URL,
        Duration::from_secs(300),
    );
    (app(state.clone()), state, tmp)
}

/// Router plus its state; keep the `TempDir` alive for the whole test.
pub fn make_test_app() -> (Router, AppState, TempDir) {
    build(None)
}

/// Same, with an LMS client pointed at a port nothing listens on.
pub fn make_test_app_with_moodle() -> (Router, AppState, TempDir) {
    let client = MoodleClient::new(MoodleConfig {
        url: "http://127.0.0.1:9".into(),
        token: "0123456789abcdef".into(),
        accept_invalid_certs: false,
    })
    .unwrap();
    build(Some(client))
}
