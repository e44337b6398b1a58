//! Auth configuration (defaults + environment overrides).

use std::time::Duration;

use thiserror::Error;

const DEV_SECRET: &str = "dev-secret";

/// Ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
pub const MAX_LEEWAY_SECS: u64 = 60 * 60;
pub const MAX_LOOKUP_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Settings for credential issuance and identity lookup.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// HS256 signing secret. Read-only after start.
    pub secret: Vec<u8>,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Clock skew tolerated on both ends of a token's validity window.
    pub leeway: Duration,
    /// Deadline applied to every identity lookup.
    pub lookup_timeout: Duration,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be at most {max}, got {value}")]
    OutOfRange { var: &'static str, value: u64, max: u64 },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl AuthConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "gatehouse".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            leeway: Duration::ZERO,
            lookup_timeout: Duration::from_secs(2),
        }
    }

    /// Build from `GATEHOUSE_*` environment variables.
    ///
    /// A missing secret falls back to an insecure dev default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match lookup("GATEHOUSE_JWT_SECRET") {
            Some(s) if s.is_empty() => return Err(ConfigError::Empty("GATEHOUSE_JWT_SECRET")),
            Some(s) => s,
            None => {
                tracing::warn!("GATEHOUSE_JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
        };

        let mut config = Self::new(secret.into_bytes());

        if let Some(issuer) = lookup("GATEHOUSE_ISSUER") {
            if issuer.is_empty() {
                return Err(ConfigError::Empty("GATEHOUSE_ISSUER"));
            }
            config.issuer = issuer;
        }
        if let Some(secs) = number(&lookup, "GATEHOUSE_ACCESS_TTL_SECS", MAX_TTL_SECS)? {
            config.access_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&lookup, "GATEHOUSE_REFRESH_TTL_SECS", MAX_TTL_SECS)? {
            config.refresh_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&lookup, "GATEHOUSE_LEEWAY_SECS", MAX_LEEWAY_SECS)? {
            config.leeway = Duration::from_secs(secs);
        }
        if let Some(ms) = number(&lookup, "GATEHOUSE_LOOKUP_TIMEOUT_MS", MAX_LOOKUP_TIMEOUT_MS)? {
            config.lookup_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

/// Positive integer no greater than `max`.
fn number<F>(lookup: &F, var: &'static str, max: u64) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > max => Err(ConfigError::OutOfRange { var, value: n, max }),
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.leeway)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}
