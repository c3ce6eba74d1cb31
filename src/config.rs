use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Where users, snippets and sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// Process-local; everything is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        }
    }
}

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_password_len: usize,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = match backend {
            StoreBackend::Postgres => {
                Some(std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?)
            }
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };
        let session = SessionConfig {
            ttl_minutes: clamp_ttl_minutes(parse_or("SESSION_TTL_MINUTES", 60 * 24)),
            cookie_secure: parse_or("COOKIE_SECURE", false),
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
            backend,
            database_url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            min_password_len: parse_or("MIN_PASSWORD_LEN", 6),
            session,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            min_password_len: 6,
            session: SessionConfig {
                ttl_minutes: 60 * 24,
                cookie_secure: false,
            },
        }
    }
}

fn clamp_ttl_minutes(minutes: i64) -> i64 {
    let clamped = minutes.clamp(1, MAX_SESSION_TTL_MINUTES);
    if clamped != minutes {
        tracing::warn!(minutes, clamped, "SESSION_TTL_MINUTES out of range");
    }
    clamped
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        assert_eq!(parse_or("SNIPSHARE_TEST_UNSET_VAR", 42u32), 42);
        std::env::set_var("SNIPSHARE_TEST_GARBAGE_VAR", "not-a-number");
        assert_eq!(parse_or("SNIPSHARE_TEST_GARBAGE_VAR", 7i64), 7);
        std::env::set_var("SNIPSHARE_TEST_BOOL_VAR", "true");
        assert!(parse_or("SNIPSHARE_TEST_BOOL_VAR", false));
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(clamp_ttl_minutes(90), 90);
        assert_eq!(clamp_ttl_minutes(0), 1);
        assert_eq!(clamp_ttl_minutes(-5), 1);
        assert_eq!(clamp_ttl_minutes(i64::MAX), MAX_SESSION_TTL_MINUTES);
        // the bound must survive conversion and date arithmetic
        let ttl = time::Duration::minutes(MAX_SESSION_TTL_MINUTES);
        assert!(time::OffsetDateTime::now_utc().checked_add(ttl).is_some());
    }

    #[test]
    fn socket_addr_from_host_and_port() {
        let config = AppConfig {
            host: "0.0.0.0".into(),
            port: 3000,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let config = AppConfig {
            host: "not a host".into(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn backend_names() {
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mysql".parse::<StoreBackend>().is_err());
    }
}
