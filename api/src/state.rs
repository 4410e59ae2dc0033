//! Application state shared across Axum route handlers.

use anyhow::Context;
use lti::{LaunchValidator, OidcStateStore, PlatformConfig, RemoteKeySource, ToolKeySet};
use services::{MoodleClient, MoodleConfig, SubmissionService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use util::{config, paths};

/// Central application state, cheap to clone.
///
/// Holds the submission service, the in-flight OIDC login states, the
/// launch validator for the configured platform, the tool's public keys and
/// (when configured) the Moodle web-service client.
#[derive(Clone)]
pub struct AppState {
    submissions: SubmissionService,
    oidc_states: Arc<OidcStateStore>,
    launch_validator: LaunchValidator,
    platform: Arc<PlatformConfig>,
    tool_keys: Arc<ToolKeySet>,
    moodle: Option<MoodleClient>,
    base_url: String,
}

impl AppState {
    pub fn new(
        submissions: SubmissionService,
        platform: PlatformConfig,
        launch_validator: LaunchValidator,
        tool_keys: ToolKeySet,
        moodle: Option<MoodleClient>,
        base_url: impl Into<String>,
        state_ttl: Duration,
    ) -> Self {
        Self {
            submissions,
            oidc_states: Arc::new(OidcStateStore::new(state_ttl)),
            launch_validator,
            platform: Arc::new(platform),
            tool_keys: Arc::new(tool_keys),
            moodle,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds the state from the global `AppConfig`: opens the submission
    /// store, loads the tool keys and prepares the platform and LMS clients.
    pub fn from_config() -> anyhow::Result<Self> {
        config::AppConfig::global()
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid configuration")?;

        let store = db::open_store().context("failed to open submission store")?;
        let submissions = SubmissionService::new(
            Arc::new(store),
            paths::storage_root(),
            config::max_upload_bytes(),
        );

        let platform = PlatformConfig::new(
            config::platform_issuer(),
            config::platform_auth_path(),
            config::platform_jwks_path(),
        );
        if platform.issuer.is_empty() {
            warn!("PLATFORM_ISSUER/MOODLE_URL not set; every login will be refused");
        }
        let keys = RemoteKeySource::new(platform.jwks_endpoint())?;
        let launch_validator = LaunchValidator::new(platform.issuer.clone(), Arc::new(keys));

        let tool_keys = match ToolKeySet::load(paths::keys_file()) {
            Ok(keys) => {
                info!(keys = keys.len(), "Tool key set loaded");
                keys
            }
            Err(e) => {
                warn!(error = %e, "Tool key set unavailable; publishing an empty JWKS");
                ToolKeySet::empty()
            }
        };

        let moodle = match MoodleConfig::from_app_config() {
            Some(cfg) => Some(MoodleClient::new(cfg)?),
            None => {
                warn!("MOODLE_URL/MOODLE_TOKEN not set; LMS routes are disabled");
                None
            }
        };

        Ok(Self::new(
            submissions,
            platform,
            launch_validator,
            tool_keys,
            moodle,
            config::base_url(),
            Duration::from_secs(config::oidc_state_ttl_seconds()),
        ))
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.submissions
    }

    pub fn oidc_states(&self) -> &OidcStateStore {
        &self.oidc_states
    }

    pub fn launch_validator(&self) -> &LaunchValidator {
        &self.launch_validator
    }

    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    pub fn tool_keys(&self) -> &ToolKeySet {
        &self.tool_keys
    }

    pub fn moodle(&self) -> Option<&MoodleClient> {
        self.moodle.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where the platform posts the id_token.
    pub fn launch_url(&self) -> String {
        format!("{}/launch", self.base_url)
    }
}
