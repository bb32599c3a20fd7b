use std::fmt;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    /// Allowed cross-origin source. `None` means permissive CORS.
    pub cors_origin: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret = get("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "userauth".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "userauth-users".into()),
            ttl_minutes: match get("JWT_TTL_MINUTES") {
                None => 60 * 24,
                Some(v) => v
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|m| (1..=MAX_TTL_MINUTES).contains(m))
                    .with_context(|| {
                        format!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}")
                    })?,
            },
        };

        Ok(Self {
            database_url,
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            cors_origin: get("CORS_ORIGIN").filter(|v| !v.trim().is_empty()),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3001),
        })
    }
}
