//! Third-party initiated login (step one of the LTI 1.3 launch).

use crate::error::LtiError;
use crate::state::IssuedState;
use serde::Deserialize;
use url::Url;

/// Where the platform lives and which of its endpoints the handshake uses.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub issuer: String,
    pub auth_path: String,
    pub jwks_path: String,
}

impl PlatformConfig {
    pub fn new(
        issuer: impl Into<String>,
        auth_path: impl Into<String>,
        jwks_path: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into().trim_end_matches('/').to_string(),
            auth_path: auth_path.into(),
            jwks_path: jwks_path.into(),
        }
    }

    pub fn auth_endpoint(&self) -> String {
        format!("{}{}", self.issuer, self.auth_path)
    }

    pub fn jwks_endpoint(&self) -> String {
        format!("{}{}", self.issuer, self.jwks_path)
    }

    pub fn is_issuer(&self, iss: &str) -> bool {
        !self.issuer.is_empty() && self.issuer == iss.trim_end_matches('/')
    }
}

/// Parameters of a login initiation request, as received (GET query or POST form).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub iss: Option<String>,
    pub login_hint: Option<String>,
    pub target_link_uri: Option<String>,
    pub client_id: Option<String>,
    pub lti_message_hint: Option<String>,
    pub lti_deployment_id: Option<String>,
}

/// A login request with every required parameter present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub iss: String,
    pub login_hint: String,
    pub target_link_uri: String,
    pub client_id: String,
    pub lti_message_hint: Option<String>,
    pub lti_deployment_id: Option<String>,
}

fn required(value: Option<String>, name: &'static str) -> Result<String, LtiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(LtiError::MissingParameter(name))
}

impl LoginRequest {
    pub fn validate(self) -> Result<ValidLogin, LtiError> {
        Ok(ValidLogin {
            iss: required(self.iss, "iss")?,
            login_hint: required(self.login_hint, "login_hint")?,
            target_link_uri: required(self.target_link_uri, "target_link_uri")?,
            client_id: required(self.client_id, "client_id")?,
            lti_message_hint: self.lti_message_hint.filter(|h| !h.is_empty()),
            lti_deployment_id: self.lti_deployment_id.filter(|d| !d.is_empty()),
        })
    }
}

/// Builds the OIDC authentication request the browser is redirected to.
///
/// The target comes from `platform`, never from the request's `iss`, which
/// only has to match it.
pub fn authorization_redirect(
    platform: &PlatformConfig,
    login: &ValidLogin,
    redirect_uri: &str,
    issued: &IssuedState,
) -> Result<Url, LtiError> {
    if !platform.is_issuer(&login.iss) {
        return Err(LtiError::UnknownIssuer(login.iss.clone()));
    }

    let mut url = Url::parse(&platform.auth_endpoint())?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "id_token")
            .append_pair("response_mode", "form_post")
            .append_pair("scope", "openid")
            .append_pair("client_id", &login.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("login_hint", &login.login_hint)
            .append_pair("state", &issued.state)
            .append_pair("nonce", &issued.nonce)
            .append_pair("prompt", "none");
        if let Some(hint) = &login.lti_message_hint {
            query.append_pair("lti_message_hint", hint);
        }
    }
    Ok(url)
}
