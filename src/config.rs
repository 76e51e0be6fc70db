//! Environment-driven configuration.

use std::env;

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis/Valkey connection URL.
    pub redis_url: String,
    /// TCP port the HTTP server binds on.
    pub server_port: u16,
    /// Key prefix the target queues share. BullMQ's default is `bull`.
    pub queue_prefix: String,
    /// Interval of the background gauge-refresh poller, seconds.
    pub metrics_poll_seconds: u64,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Config {
    /// Read configuration from environment variables with defaults that
    /// work against a local Redis.
    pub fn from_env() -> Config {
        Config {
            redis_url: get_env("REDIS_URL", "redis://127.0.0.1:6379"),
            server_port: parse_port(env::var("SERVER_PORT").ok()),
            queue_prefix: get_env("QUEUE_PREFIX", "bull"),
            metrics_poll_seconds: parse_poll_seconds(env::var("METRICS_POLL_SECONDS").ok()),
            log_level: get_env("LOG_LEVEL", "info"),
        }
    }
}

fn get_env(key: &str, fallback: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => fallback.to_string(),
    }
}

fn parse_port(raw: Option<String>) -> u16 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(8080)
}

fn parse_poll_seconds(raw: Option<String>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok())
        .unwrap_or(10)
        .max(1)
}
