//! Claims carried by an LTI 1.3 `LtiResourceLinkRequest` id_token.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CLAIM_ROLES: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
pub const CLAIM_CONTEXT: &str = "https://purl.imsglobal.org/spec/lti/claim/context";
pub const CLAIM_RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
pub const CLAIM_DEPLOYMENT_ID: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
pub const CLAIM_MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
pub const CLAIM_VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
pub const CLAIM_CUSTOM: &str = "https://purl.imsglobal.org/spec/lti/claim/custom";

/// Role fragments that grant the instructor view.
const INSTRUCTOR_ROLE_MARKERS: [&str; 4] = [
    "Instructor",
    "Administrator",
    "TeachingAssistant",
    "ContentDeveloper",
];

/// `aud` may be a single client id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::One(aud) => aud == client_id,
            Audience::Many(auds) => auds.iter().any(|a| a == client_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextClaim {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLinkClaim {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Who the launching user is, as far as this tool cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchRole {
    Instructor,
    Learner,
}

impl LaunchRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LaunchRole::Instructor => "instructor",
            LaunchRole::Learner => "learner",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtiClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/roles", default)]
    pub roles: Vec<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/context", default)]
    pub context: Option<ContextClaim>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/resource_link", default)]
    pub resource_link: Option<ResourceLinkClaim>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id", default)]
    pub deployment_id: Option<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type", default)]
    pub message_type: Option<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version", default)]
    pub version: Option<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/custom", default)]
    pub custom: Option<Value>,
}

impl LtiClaims {
    /// Name shown for the user: `name`, then `email`, then a generic label.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref().filter(|e| !e.trim().is_empty()))
            .unwrap_or("User")
            .to_string()
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    pub fn is_instructor(&self) -> bool {
        self.roles
            .iter()
            .any(|role| INSTRUCTOR_ROLE_MARKERS.iter().any(|m| role.contains(m)))
    }

    pub fn role(&self) -> LaunchRole {
        if self.is_instructor() {
            LaunchRole::Instructor
        } else {
            LaunchRole::Learner
        }
    }

    pub fn resource_link_id(&self) -> String {
        self.resource_link
            .as_ref()
            .map(|rl| rl.id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "unknown".into())
    }

    pub fn resource_title(&self) -> String {
        self.resource_link
            .as_ref()
            .and_then(|rl| rl.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Assignment".into())
    }

    pub fn context_title(&self) -> Option<String> {
        self.context.as_ref().and_then(|c| c.title.clone())
    }
}
