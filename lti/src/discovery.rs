//! Documents the tool publishes about itself.

use serde::Serialize;

/// URLs a platform administrator needs to register the tool.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolRegistration {
    pub tool_url: String,
    pub initiate_login_url: String,
    pub redirection_uri: String,
    pub public_keyset_url: String,
}

impl ToolRegistration {
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            tool_url: base.to_string(),
            initiate_login_url: format!("{base}/login"),
            redirection_uri: format!("{base}/launch"),
            public_keyset_url: format!("{base}/jwks.json"),
        }
    }
}

/// `/.well-known/openid-configuration` document.
#[derive(Debug, Clone, Serialize)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<&'static str>,
    pub subject_types_supported: Vec<&'static str>,
    pub id_token_signing_alg_values_supported: Vec<&'static str>,
    pub scopes_supported: Vec<&'static str>,
    pub claims_supported: Vec<&'static str>,
}

impl OpenIdConfiguration {
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            issuer: base.to_string(),
            authorization_endpoint: format!("{base}/login"),
            token_endpoint: format!("{base}/token"),
            jwks_uri: format!("{base}/jwks.json"),
            response_types_supported: vec!["id_token"],
            subject_types_supported: vec!["public"],
            id_token_signing_alg_values_supported: vec!["RS256"],
            scopes_supported: vec!["openid"],
            claims_supported: vec!["sub"],
        }
    }
}
