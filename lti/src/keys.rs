//! Key material on both sides of the launch.
//!
//! - Platform keys: the LMS publishes a JWKS used to verify launch id_tokens.
//!   [`RemoteKeySource`] fetches and caches it; [`StaticKeySource`] serves a
//!   fixed set.
//! - Tool keys: this tool's own key set, published at `/jwks.json` with every
//!   private member removed.

use crate::error::LtiError;
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// JWK members that must never leave the server.
const PRIVATE_MEMBERS: [&str; 8] = ["d", "p", "q", "dp", "dq", "qi", "oth", "k"];

/// Provides the platform's signing keys.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Returns the key set; `refresh` bypasses any cache.
    async fn key_set(&self, refresh: bool) -> Result<JwkSet, LtiError>;
}

/// Fetches the platform JWKS over HTTP and caches it until a refresh is asked for.
pub struct RemoteKeySource {
    client: reqwest::Client,
    url: String,
    cache: RwLock<Option<JwkSet>>,
}

impl RemoteKeySource {
    pub fn new(url: impl Into<String>) -> Result<Self, LtiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LtiError::KeyFetch(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<JwkSet, LtiError> {
        debug!(url = %self.url, "Fetching platform JWKS");
        let keys = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LtiError::KeyFetch(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| LtiError::KeyFetch(e.to_string()))?;
        info!(url = %self.url, keys = keys.keys.len(), "Platform JWKS loaded");
        Ok(keys)
    }
}

#[async_trait]
impl KeySource for RemoteKeySource {
    async fn key_set(&self, refresh: bool) -> Result<JwkSet, LtiError> {
        if !refresh {
            if let Some(cached) = self.cache.read().await.as_ref() {
                return Ok(cached.clone());
            }
        }
        let fresh = self.fetch().await?;
        *self.cache.write().await = Some(fresh.clone());
        Ok(fresh)
    }
}

/// A fixed key set, for platforms configured out of band and for tests.
pub struct StaticKeySource(JwkSet);

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self(keys)
    }

    pub fn from_json(json: &str) -> Result<Self, LtiError> {
        serde_json::from_str(json)
            .map(Self)
            .map_err(|e| LtiError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn key_set(&self, _refresh: bool) -> Result<JwkSet, LtiError> {
        Ok(self.0.clone())
    }
}

/// Picks the verification key for a token: by `kid` when present, otherwise
/// the only key in the set.
pub fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => keys.find(kid),
        None if keys.keys.len() == 1 => keys.keys.first(),
        None => None,
    }
}

/// The tool's own key set, reduced to its public half.
#[derive(Debug, Clone)]
pub struct ToolKeySet {
    public: Value,
}

impl ToolKeySet {
    pub fn empty() -> Self {
        Self {
            public: serde_json::json!({ "keys": [] }),
        }
    }

    /// Loads a JWK set (as written by a key generator, private members
    /// included) from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LtiError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LtiError::ToolKeys(format!("{}: {e}", path.display())))?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| LtiError::ToolKeys(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, LtiError> {
        let keys = value
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| LtiError::ToolKeys("missing \"keys\" array".into()))?;

        let public: Vec<Value> = keys
            .iter()
            .map(|key| {
                let mut key = key.clone();
                if let Some(members) = key.as_object_mut() {
                    for member in PRIVATE_MEMBERS {
                        members.remove(member);
                    }
                }
                key
            })
            .collect();

        Ok(Self {
            public: serde_json::json!({ "keys": public }),
        })
    }

    /// The JWKS document served to platforms.
    pub fn public_jwks(&self) -> &Value {
        &self.public
    }

    pub fn len(&self) -> usize {
        self.public["keys"].as_array().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
