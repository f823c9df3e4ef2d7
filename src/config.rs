//! Environment-driven configuration

use crate::codec::DEFAULT_TITLE;
use crate::reply::DEFAULT_REPLY_DELAY;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the persisted session
    pub db_path: PathBuf,
    pub port: u16,
    /// Title written into exports
    pub title: String,
    /// Delay of the simulated reply provider
    pub reply_delay: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = var("CHAT_SESSION_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.chat-session/chat.db"))
            },
            PathBuf::from,
        );

        let port = var("CHAT_SESSION_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let title = var("CHAT_SESSION_TITLE")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let reply_delay = var("CHAT_SESSION_REPLY_DELAY_MS")
            .and_then(|ms| ms.parse().ok())
            .map_or(DEFAULT_REPLY_DELAY, Duration::from_millis);

        Self {
            db_path,
            port,
            title,
            reply_delay,
        }
    }
}
