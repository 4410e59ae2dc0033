//! id_token validation (step three of the LTI 1.3 launch).

use crate::claims::LtiClaims;
use crate::error::LtiError;
use crate::keys::{KeySource, select_key};
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies launch tokens issued by one configured platform.
#[derive(Clone)]
pub struct LaunchValidator {
    issuer: String,
    keys: Arc<dyn KeySource>,
}

impl LaunchValidator {
    pub fn new(issuer: impl Into<String>, keys: Arc<dyn KeySource>) -> Self {
        Self {
            issuer: issuer.into().trim_end_matches('/').to_string(),
            keys,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verifies signature, expiry, issuer, audience and nonce, in that order
    /// of trust: nothing in the payload is looked at before the signature
    /// checks out.
    pub async fn validate(
        &self,
        id_token: &str,
        client_id: &str,
        nonce: &str,
    ) -> Result<LtiClaims, LtiError> {
        let header = decode_header(id_token).map_err(|e| LtiError::MalformedToken(e.to_string()))?;
        if !matches!(header.alg, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512) {
            return Err(LtiError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let jwk = self.find_key(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| LtiError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<LtiClaims>(id_token, &key, &validation)
            .map_err(LtiError::from_jwt)?
            .claims;

        if claims.nonce.as_deref() != Some(nonce) {
            warn!(sub = %claims.sub, "Launch nonce mismatch");
            return Err(LtiError::InvalidNonce);
        }

        debug!(sub = %claims.sub, "Launch token verified");
        Ok(claims)
    }

    /// Looks the key up in the cached set, refetching once if the platform
    /// has rotated to a key we have not seen.
    async fn find_key(&self, kid: Option<&str>) -> Result<Jwk, LtiError> {
        let keys = self.keys.key_set(false).await?;
        if let Some(jwk) = select_key(&keys, kid) {
            return Ok(jwk.clone());
        }

        debug!(?kid, "Unknown platform key, refreshing JWKS");
        let keys = self.keys.key_set(true).await?;
        select_key(&keys, kid)
            .cloned()
            .ok_or_else(|| LtiError::UnknownKey(kid.map(str::to_string)))
    }
}
