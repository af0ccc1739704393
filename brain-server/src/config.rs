//! Server configuration read from the environment.

use std::time::Duration;

use anyhow::{Context, bail};
use brain_rag::RetrievalConfig;

/// Port used when neither `BRAIN_PORT` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    pub retrieval: RetrievalConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            log_json: false,
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    ///
    /// | Variable                | Default     |
    /// |-------------------------|-------------|
    /// | `BRAIN_HOST`            | `127.0.0.1` |
    /// | `BRAIN_PORT` / `PORT`   | `3000`      |
    /// | `BRAIN_TOP_K`           | `6`         |
    /// | `BRAIN_FRAGMENT_SIZE`   | `500`       |
    /// | `BRAIN_CALL_TIMEOUT_MS` | `30000`     |
    /// | `BRAIN_LOG_JSON`        | `false`     |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = lookup("BRAIN_HOST").unwrap_or(defaults.host);
        let port = match lookup("BRAIN_PORT").or_else(|| lookup("PORT")) {
            Some(value) => value.parse::<u16>().with_context(|| format!("invalid port `{value}`"))?,
            None => defaults.port,
        };
        let log_json = match lookup("BRAIN_LOG_JSON") {
            Some(value) => parse_flag(&value)?,
            None => defaults.log_json,
        };

        let mut retrieval = RetrievalConfig::builder();
        if let Some(top_k) = parse_var::<usize>(&lookup, "BRAIN_TOP_K")? {
            retrieval = retrieval.top_k(top_k);
        }
        if let Some(size) = parse_var::<usize>(&lookup, "BRAIN_FRAGMENT_SIZE")? {
            retrieval = retrieval.fragment_size(size);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "BRAIN_CALL_TIMEOUT_MS")? {
            retrieval = retrieval.call_timeout(Duration::from_millis(ms));
        }
        let retrieval = retrieval.build().context("invalid retrieval configuration")?;

        Ok(Self { host, port, log_json, retrieval })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| value.parse::<T>().with_context(|| format!("invalid {key} `{value}`")))
        .transpose()
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid boolean `{other}`"),
    }
}
