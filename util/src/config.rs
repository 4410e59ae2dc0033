//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};
use tracing::warn;

/// Session secret used when `SESSION_SECRET` is unset outside production.
pub const DEV_SESSION_SECRET: &str = "insecure-development-session-secret";

/// Shortest `SESSION_SECRET` accepted in production.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub platform_issuer: String,
    pub platform_auth_path: String,
    pub platform_jwks_path: String,
    pub moodle_url: String,
    pub moodle_token: String,
    pub moodle_accept_invalid_certs: bool,
    pub session_secret: String,
    pub session_duration_minutes: i64,
    pub storage_root: String,
    pub submissions_file: String,
    pub backup_dir: String,
    pub max_backups: usize,
    pub max_upload_bytes: usize,
    pub keys_file: String,
    pub oidc_state_ttl_seconds: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "Unparsable config value, using the default");
            default
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing values fall back to development defaults. Numeric values that
    /// fail to parse also fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port: u16 = parsed_or("PORT", 3000);
        let moodle_url = var_or("MOODLE_URL", "").trim_end_matches('/').to_string();
        let storage_root = var_or("STORAGE_ROOT", "./data");

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "lti-submissions"),
            log_level: var_or("LOG_LEVEL", "api=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: var_or("LOG_TO_STDOUT", "false") == "true",
            host: var_or("HOST", "127.0.0.1"),
            port,
            base_url: env::var("BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            platform_issuer: env::var("PLATFORM_ISSUER")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| moodle_url.clone()),
            platform_auth_path: var_or("PLATFORM_AUTH_PATH", "/mod/lti/auth.php"),
            platform_jwks_path: var_or("PLATFORM_JWKS_PATH", "/mod/lti/certs.php"),
            moodle_token: var_or("MOODLE_TOKEN", ""),
            moodle_accept_invalid_certs: var_or("MOODLE_ACCEPT_INVALID_CERTS", "false") == "true",
            moodle_url,
            session_secret: var_or("SESSION_SECRET", ""),
            session_duration_minutes: parsed_or("SESSION_DURATION_MINUTES", 120),
            submissions_file: env::var("SUBMISSIONS_FILE")
                .unwrap_or_else(|_| format!("{storage_root}/submissions.json")),
            backup_dir: env::var("BACKUP_DIR").unwrap_or_else(|_| format!("{storage_root}/backups")),
            storage_root,
            max_backups: parsed_or("MAX_BACKUPS", 5),
            max_upload_bytes: parsed_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            keys_file: var_or("KEYS_FILE", "./keys.json"),
            oidc_state_ttl_seconds: parsed_or("OIDC_STATE_TTL_SECONDS", 300),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    /// Refuses settings that are unsafe to run with. In production the
    /// session secret must be set, must not be the development default and
    /// must be at least `MIN_SESSION_SECRET_LEN` bytes.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_production() {
            return Ok(());
        }
        let secret = self.session_secret.trim();
        if secret.is_empty() {
            return Err("SESSION_SECRET is required in production".into());
        }
        if secret == DEV_SESSION_SECRET {
            return Err("SESSION_SECRET must not be the development default in production".into());
        }
        if secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes in production"
            ));
        }
        Ok(())
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_base_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.base_url = value.into());
    }

    pub fn set_platform_issuer(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.platform_issuer = value.into());
    }

    pub fn set_moodle_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.moodle_url = value.into());
    }

    pub fn set_moodle_token(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.moodle_token = value.into());
    }

    pub fn set_session_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.session_secret = value.into());
    }

    pub fn set_storage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.storage_root = value.into());
    }

    pub fn set_submissions_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.submissions_file = value.into());
    }

    pub fn set_backup_dir(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.backup_dir = value.into());
    }

    pub fn set_max_upload_bytes(value: usize) {
        AppConfig::set_field(|cfg| cfg.max_upload_bytes = value);
    }

    pub fn set_keys_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.keys_file = value.into());
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn is_production() -> bool {
    AppConfig::global().is_production()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn base_url() -> String {
    AppConfig::global().base_url.clone()
}

pub fn platform_issuer() -> String {
    AppConfig::global().platform_issuer.clone()
}

pub fn platform_auth_path() -> String {
    AppConfig::global().platform_auth_path.clone()
}

pub fn platform_jwks_path() -> String {
    AppConfig::global().platform_jwks_path.clone()
}

pub fn moodle_url() -> String {
    AppConfig::global().moodle_url.clone()
}

pub fn moodle_token() -> String {
    AppConfig::global().moodle_token.clone()
}

pub fn moodle_accept_invalid_certs() -> bool {
    AppConfig::global().moodle_accept_invalid_certs
}

/// The HS256 session signing secret. Outside production an unset secret
/// falls back to `DEV_SESSION_SECRET`.
pub fn session_secret() -> String {
    let cfg = AppConfig::global();
    if cfg.session_secret.is_empty() && !cfg.is_production() {
        return DEV_SESSION_SECRET.to_string();
    }
    cfg.session_secret.clone()
}

pub fn session_duration_minutes() -> i64 {
    AppConfig::global().session_duration_minutes
}

pub fn storage_root() -> String {
    AppConfig::global().storage_root.clone()
}

pub fn submissions_file() -> String {
    AppConfig::global().submissions_file.clone()
}

pub fn backup_dir() -> String {
    AppConfig::global().backup_dir.clone()
}

pub fn max_backups() -> usize {
    AppConfig::global().max_backups
}

pub fn max_upload_bytes() -> usize {
    AppConfig::global().max_upload_bytes
}

pub fn keys_file() -> String {
    AppConfig::global().keys_file.clone()
}

pub fn oidc_state_ttl_seconds() -> u64 {
    AppConfig::global().oidc_state_ttl_seconds
}
