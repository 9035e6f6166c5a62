use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub statement_timeout_secs: u64,
}

impl DbConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }

        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("APP_PORT is not a valid port")?;

        let config = Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            db: DbConfig {
                url,
                max_connections: env_or("DB_MAX_CONNECTIONS", 10),
                statement_timeout_secs: env_or("DB_TIMEOUT_SECS", 5),
            },
            jwt: JwtConfig {
                secret,
                ttl_hours: env_or("JWT_TTL_HOURS", 24),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would disable a bound instead of configuring one.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.db.statement_timeout_secs == 0 {
            anyhow::bail!("DB_TIMEOUT_SECS must be at least 1");
        }
        if self.db.max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
