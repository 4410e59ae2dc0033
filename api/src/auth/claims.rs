use lti::{LaunchRole, LtiClaims};
use serde::{Deserialize, Serialize};
use services::Actor;

/// Session token payload issued after a successful launch.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: LaunchRole,
    pub resource_link_id: String,
    pub resource_title: String,
    #[serde(default)]
    pub context_title: Option<String>,
    pub exp: usize,
}

impl Claims {
    /// Session claims for a verified launch; `exp` is set when the token is signed.
    pub fn from_launch(launch: &LtiClaims) -> Self {
        Self {
            sub: launch.sub.clone(),
            name: launch.display_name(),
            role: launch.role(),
            resource_link_id: launch.resource_link_id(),
            resource_title: launch.resource_title(),
            context_title: launch.context_title(),
            exp: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn is_instructor(&self) -> bool {
        self.0.role == LaunchRole::Instructor
    }

    /// The user as seen by the submission service.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.0.sub.clone(),
            user_name: self.0.name.clone(),
            resource_link_id: self.0.resource_link_id.clone(),
            resource_title: self.0.resource_title.clone(),
            instructor: self.is_instructor(),
        }
    }
}
