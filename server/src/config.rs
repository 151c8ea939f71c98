//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// `PostgreSQL` connection URL. When unset the in-memory store is used.
    pub database_url: Option<String>,

    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,

    /// Lifetime in seconds of tokens minted by `auth::jwt::issue_token` (default: 3600)
    pub jwt_expiry: i64,

    /// Cookie that carries the session token (default: "session")
    pub session_cookie_name: String,

    /// Accept unverified or synthesized identities when a token fails verification.
    ///
    /// Development only. Off unless `AUTH_DEV_FALLBACK` is set to a truthy value.
    pub dev_auth_fallback: bool,

    /// Subjects provisioned with the admin role on first sign-in
    pub bootstrap_admins: Vec<String>,

    /// Upper bound for `limit` query parameters (default: 100)
    pub max_page_size: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expiry: env::var("JWT_EXPIRY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "session".into()),
            dev_auth_fallback: env::var("AUTH_DEV_FALLBACK")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            bootstrap_admins: env::var("BOOTSTRAP_ADMINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(100),
        })
    }

    /// Check if the Postgres backend is configured.
    #[must_use]
    pub const fn has_database(&self) -> bool {
        self.database_url.is_some()
    }

    /// Whether `subject` is provisioned as an admin on first sign-in.
    #[must_use]
    pub fn is_bootstrap_admin(&self, subject: &str) -> bool {
        self.bootstrap_admins.iter().any(|s| s == subject)
    }

    /// Clamp a requested page size to `1..=max_page_size`.
    #[must_use]
    pub fn clamp_limit(&self, requested: i64) -> i64 {
        requested.clamp(1, self.max_page_size)
    }

    /// Create a default configuration for testing.
    ///
    /// Uses the in-memory store and a fixed signing secret.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            database_url: None,
            jwt_secret: "test-secret".into(),
            jwt_expiry: 3600,
            session_cookie_name: "session".into(),
            dev_auth_fallback: false,
            bootstrap_admins: Vec::new(),
            max_page_size: 100,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" ON "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn list_skips_blank_entries() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn clamp_limit_bounds_page_size() {
        let config = Config::default_for_test();
        assert_eq!(config.clamp_limit(0), 1);
        assert_eq!(config.clamp_limit(25), 25);
        assert_eq!(config.clamp_limit(10_000), 100);
    }

    #[test]
    fn test_config_uses_memory_store() {
        let config = Config::default_for_test();
        assert!(!config.has_database());
        assert!(!config.dev_auth_fallback);
    }
}
