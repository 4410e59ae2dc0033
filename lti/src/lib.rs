//! LTI 1.3 launch handshake.
//!
//! 1. The platform calls the tool's login endpoint; [`login`] checks the
//!    parameters, [`state::OidcStateStore`] remembers a fresh state/nonce and
//!    the browser is redirected to the platform's authorization endpoint.
//! 2. The platform posts a signed id_token back to the launch endpoint.
//! 3. [`launch::LaunchValidator`] consumes the state and verifies the token
//!    against the platform JWKS, yielding [`claims::LtiClaims`].

pub mod claims;
pub mod discovery;
pub mod error;
pub mod keys;
pub mod launch;
pub mod login;
pub mod state;

pub use claims::{LaunchRole, LtiClaims};
pub use error::LtiError;
pub use keys::{KeySource, RemoteKeySource, StaticKeySource, ToolKeySet};
pub use launch::LaunchValidator;
pub use login::{LoginRequest, PlatformConfig, ValidLogin, authorization_redirect};
pub use state::{IssuedState, OidcStateStore};
