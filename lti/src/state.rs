//! Short-lived OIDC login state.
//!
//! Login initiation stores a `(nonce, client_id)` pair under a random
//! `state` value; the launch that follows must present the same `state`
//! within the TTL, and can do so only once.

use rand::{Rng, distr::Alphanumeric};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

const TOKEN_LEN: usize = 32;

/// Default lifetime of a login state.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct StateEntry {
    pub nonce: String,
    pub client_id: String,
    pub created_at: Instant,
}

/// The values handed to the platform in the authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedState {
    pub state: String,
    pub nonce: String,
}

pub struct OidcStateStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, StateEntry>>,
}

impl Default for OidcStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

impl OidcStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates and remembers a fresh `state`/`nonce` pair for `client_id`,
    /// dropping any entries that have outlived the TTL.
    pub fn issue(&self, client_id: &str) -> IssuedState {
        let issued = IssuedState {
            state: random_token(),
            nonce: random_token(),
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        if entries.len() < before {
            debug!(purged = before - entries.len(), "Expired OIDC states removed");
        }

        entries.insert(
            issued.state.clone(),
            StateEntry {
                nonce: issued.nonce.clone(),
                client_id: client_id.to_string(),
                created_at: Instant::now(),
            },
        );
        issued
    }

    /// Removes `state` and returns its entry if it was still fresh.
    ///
    /// The entry is removed even when it has expired, so a state never
    /// validates twice.
    pub fn consume(&self, state: &str) -> Option<StateEntry> {
        let entry = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(state)?;

        if entry.created_at.elapsed() >= self.ttl {
            debug!("OIDC state presented after expiry");
            return None;
        }
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
