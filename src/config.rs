//! Environment-driven configuration for the server and the guard stack.
//!
//! All knobs come from `ROSTERD_*` variables with working defaults so a bare
//! `rosterd` starts locally. The signing-secret fallback is deliberately kept
//! (it mirrors what deployments already rely on) but is flagged loudly at
//! startup as unsafe for production.

use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Development-only fallback used when `ROSTERD_JWT_SECRET` is unset.
pub const DEFAULT_SIGNING_SECRET: &str = "default-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub signing_secret: String,
    /// True when no secret was configured and the development default is live.
    pub default_secret_in_use: bool,
    pub token_ttl: Duration,
    pub max_query_cost: u64,
    pub hash_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 7878,
            signing_secret: DEFAULT_SIGNING_SECRET.to_string(),
            default_secret_in_use: true,
            token_ttl: Duration::from_secs(3600),
            max_query_cost: 1000,
            hash_cost: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let http_port = match std::env::var("ROSTERD_HTTP_PORT") {
            Ok(s) => s
                .parse::<u16>()
                .map_err(|_| AppError::validation(format!("ROSTERD_HTTP_PORT is not a port: {}", s)))?,
            Err(_) => 7878,
        };
        let (signing_secret, default_secret_in_use) = match std::env::var("ROSTERD_JWT_SECRET") {
            Ok(s) if !s.is_empty() => (s, false),
            _ => (DEFAULT_SIGNING_SECRET.to_string(), true),
        };
        let token_ttl = match std::env::var("ROSTERD_JWT_EXPIRATION") {
            Ok(s) => parse_duration(&s)?,
            Err(_) => Duration::from_secs(3600),
        };
        let max_query_cost = match std::env::var("ROSTERD_MAX_QUERY_COST") {
            Ok(s) => s
                .parse::<u64>()
                .map_err(|_| AppError::validation(format!("ROSTERD_MAX_QUERY_COST is not an integer: {}", s)))?,
            Err(_) => 1000,
        };
        let hash_cost = match std::env::var("ROSTERD_HASH_COST") {
            Ok(s) => s
                .parse::<u32>()
                .map_err(|_| AppError::validation(format!("ROSTERD_HASH_COST is not an integer: {}", s)))?,
            Err(_) => 10,
        };
        Ok(Self { http_port, signing_secret, default_secret_in_use, token_ttl, max_query_cost, hash_cost })
    }

    /// Emit the startup warning when the development secret is live. Kept as a
    /// separate call so main can log it after tracing is initialised.
    pub fn warn_if_default_secret(&self) {
        if self.default_secret_in_use {
            tracing::warn!(
                target: "startup",
                "ROSTERD_JWT_SECRET is not set; using the built-in development secret. \
                 Tokens signed with it are forgeable. DO NOT run production like this."
            );
        }
    }
}

/// Parse a duration string of the form "3600s", "60m" or "1h" (bare integers
/// are seconds). Matches the expiry strings the config accepts for tokens.
pub fn parse_duration(s: &str) -> AppResult<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AppError::validation("empty duration"));
    }
    let (num, mult) = match s.as_bytes()[s.len() - 1] {
        b's' => (&s[..s.len() - 1], 1u64),
        b'm' => (&s[..s.len() - 1], 60),
        b'h' => (&s[..s.len() - 1], 3600),
        b'd' => (&s[..s.len() - 1], 86400),
        _ => (s, 1),
    };
    let n = num
        .parse::<u64>()
        .map_err(|_| AppError::validation(format!("bad duration: {}", s)))?;
    Ok(Duration::from_secs(n * mult))
}
