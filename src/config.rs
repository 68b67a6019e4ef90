//! # Bot Configuration Module
//!
//! Runtime settings read from the environment (optionally through a `.env`
//! file loaded by `main`).

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Configuration structure for the storefront bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot API token
    pub bot_token: String,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Telegram user ids allowed to use the admin flow
    pub admin_ids: HashSet<u64>,
    /// Language used when a user has no language code
    pub default_language: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let admin_ids = match env::var("ADMIN_IDS") {
            Ok(raw) => parse_admin_ids(&raw).context("ADMIN_IDS must be a list of Telegram user ids")?,
            Err(_) => HashSet::new(),
        };

        let default_language =
            env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = env::var("LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            bot_token,
            database_url,
            admin_ids,
            default_language,
            max_connections,
            log_format,
        })
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parse a comma or whitespace separated list of Telegram user ids
pub fn parse_admin_ids(raw: &str) -> Result<HashSet<u64>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .with_context(|| format!("Invalid admin id: {part}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids("123, 456 789").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&123));
        assert!(ids.contains(&789));
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").unwrap().is_empty());
        assert!(parse_admin_ids(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_admin_ids_rejects_garbage() {
        assert!(parse_admin_ids("123,abc").is_err());
        assert!(parse_admin_ids("-5").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Text);
    }
}
