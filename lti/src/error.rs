use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

/// Everything that can go wrong between login initiation and a validated launch.
#[derive(Debug, Error)]
pub enum LtiError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("unknown platform issuer: {0}")]
    UnknownIssuer(String),
    #[error("invalid or expired state")]
    InvalidState,
    #[error("malformed id_token: {0}")]
    MalformedToken(String),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("no platform key matches kid {0:?}")]
    UnknownKey(Option<String>),
    #[error("unusable platform key: {0}")]
    InvalidKey(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token issuer is not the configured platform")]
    InvalidIssuer,
    #[error("token audience does not include the client id")]
    InvalidAudience,
    #[error("token nonce does not match the login request")]
    InvalidNonce,
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
    #[error("could not fetch platform keys: {0}")]
    KeyFetch(String),
    #[error("tool key set error: {0}")]
    ToolKeys(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl LtiError {
    /// Maps a `jsonwebtoken` verification failure onto the launch error it represents.
    pub fn from_jwt(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => LtiError::InvalidSignature,
            ErrorKind::ExpiredSignature => LtiError::TokenExpired,
            ErrorKind::InvalidIssuer => LtiError::InvalidIssuer,
            ErrorKind::InvalidAudience => LtiError::InvalidAudience,
            ErrorKind::InvalidAlgorithm => LtiError::UnsupportedAlgorithm(err.to_string()),
            ErrorKind::MissingRequiredClaim(claim) => {
                LtiError::InvalidClaims(format!("missing claim {claim}"))
            }
            ErrorKind::ImmatureSignature => LtiError::InvalidClaims("token not yet valid".into()),
            ErrorKind::InvalidSubject => LtiError::InvalidClaims("invalid subject".into()),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                LtiError::MalformedToken(err.to_string())
            }
            ErrorKind::Json(_) => LtiError::InvalidClaims(err.to_string()),
            _ => LtiError::InvalidKey(err.to_string()),
        }
    }

    /// True when the failure is an authentication rejection of the token itself.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LtiError::InvalidSignature
                | LtiError::TokenExpired
                | LtiError::InvalidIssuer
                | LtiError::InvalidAudience
                | LtiError::InvalidNonce
                | LtiError::UnknownKey(_)
                | LtiError::UnsupportedAlgorithm(_)
                | LtiError::InvalidClaims(_)
        )
    }
}
