pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Signs a session token for `claims` and returns it with its expiry (RFC 3339).
pub fn generate_jwt(mut claims: Claims) -> Result<(String, String), jsonwebtoken::errors::Error> {
    let expiry = Utc::now() + Duration::minutes(config::session_duration_minutes());
    claims.exp = expiry.timestamp() as usize;

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::session_secret().as_bytes()),
    )?;

    Ok((token, expiry.to_rfc3339()))
}
