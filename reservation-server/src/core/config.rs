//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | ENVIRONMENT | development | development / staging / production |
//! | HTTP_PORT | 3000 | HTTP listen port |
//! | WORK_DIR | ./data | Embedded database directory |
//! | DATABASE_URL | - | PostgreSQL URL; embedded redb when unset |
//! | REDIS_URL | - | Redis URL for handoff tokens; in-process when unset |
//! | RESTAURANT_TZ | Asia/Taipei | Restaurant local time zone |
//! | SLOT_TABLE_PATH | - | JSON slot table; built-in table when unset |
//! | TOKEN_TTL_SECS | 120 | Handoff token lifetime |
//! | PHONE_DENY_LIST | - | Comma separated phone numbers refused at submission |
//! | JWT_SECRET | (required outside development) | Admin session signing key |
//! | ADMIN_USERNAME | admin | Backstage login |
//! | ADMIN_PASSWORD_HASH | (required outside development) | argon2 PHC string |
//! | SES_ENABLED | false | Send receipts through AWS SES |
//! | SES_FROM_EMAIL | noreply@reservations.local | Receipt sender |
//! | LINE_CHANNEL_TOKEN | - | LINE Messaging API channel token |
//! | TRUST_FORWARDED_FOR | false | Rate limit by the proxy-appended X-Forwarded-For entry |
//! | LOG_DIR | - | Daily rolling log directory |
//! | LOG_LEVEL | info | Fallback level when RUST_LOG is unset |

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reservation server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    pub http_port: u16,
    /// Directory holding `reservations.redb` when no DATABASE_URL is set
    pub work_dir: PathBuf,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub timezone: Tz,
    pub slot_table_path: Option<PathBuf>,
    pub token_ttl: Duration,
    pub phone_deny_list: HashSet<String>,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub ses_enabled: bool,
    pub ses_from_email: String,
    pub line_channel_token: Option<String>,
    /// Only set behind a reverse proxy that appends to X-Forwarded-For
    pub trust_forwarded_for: bool,
    pub log_dir: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    /// Development defaults: embedded store, in-process tokens, no outbound messaging
    fn default() -> Self {
        Self {
            environment: "development".into(),
            http_port: 3000,
            work_dir: PathBuf::from("./data"),
            database_url: None,
            redis_url: None,
            timezone: chrono_tz::Asia::Taipei,
            slot_table_path: None,
            token_ttl: Duration::from_secs(120),
            phone_deny_list: HashSet::new(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            admin_username: "admin".into(),
            admin_password_hash: "dev-ADMIN_PASSWORD_HASH-not-for-production".into(),
            ses_enabled: false,
            ses_from_email: "noreply@reservations.local".into(),
            line_channel_token: None,
            trust_forwarded_for: false,
            log_dir: None,
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let timezone = match Self::optional("RESTAURANT_TZ") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| format!("RESTAURANT_TZ is not a valid time zone: {e}"))?,
            None => chrono_tz::Asia::Taipei,
        };

        let token_ttl_secs: u64 = match Self::optional("TOKEN_TTL_SECS") {
            Some(v) => v
                .parse()
                .map_err(|_| format!("TOKEN_TTL_SECS must be a positive integer, got {v}"))?,
            None => 120,
        };
        if token_ttl_secs == 0 {
            return Err("TOKEN_TTL_SECS must be greater than 0".into());
        }

        Ok(Self {
            environment: environment.clone(),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            work_dir: PathBuf::from(std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into())),
            database_url: Self::optional("DATABASE_URL"),
            redis_url: Self::optional("REDIS_URL"),
            timezone,
            slot_table_path: Self::optional("SLOT_TABLE_PATH").map(PathBuf::from),
            token_ttl: Duration::from_secs(token_ttl_secs),
            phone_deny_list: parse_deny_list(
                &std::env::var("PHONE_DENY_LIST").unwrap_or_default(),
            ),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password_hash: Self::require_secret("ADMIN_PASSWORD_HASH", &environment)?,
            ses_enabled: flag("SES_ENABLED"),
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@reservations.local".into()),
            line_channel_token: Self::optional("LINE_CHANNEL_TOKEN"),
            trust_forwarded_for: flag("TRUST_FORWARDED_FOR"),
            log_dir: Self::optional("LOG_DIR"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Embedded database file
    pub fn embedded_db_path(&self) -> PathBuf {
        self.work_dir.join("reservations.redb")
    }
}

fn flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_deny_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deny_list() {
        let list = parse_deny_list(" 0911111111, ,0922222222,");
        assert_eq!(list.len(), 2);
        assert!(list.contains("0911111111"));
        assert!(list.contains("0922222222"));
        assert!(parse_deny_list("").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_development());
        assert_eq!(config.token_ttl, Duration::from_secs(120));
        assert_eq!(config.timezone, chrono_tz::Asia::Taipei);
        assert!(!config.trust_forwarded_for);
        assert!(config.embedded_db_path().ends_with("reservations.redb"));
    }
}
