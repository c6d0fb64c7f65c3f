#![cfg(feature = "server")]
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::poller::REFRESH_INTERVAL_MS;

pub const DEFAULT_OUTPUT: &str = "stats.html";

/// Settings for the headless `watch` command.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub base_url: String,
    pub output: PathBuf,
    pub interval: Duration,
}

impl WatchConfig {
    /// Reads `STATS_BASE_URL`, `STATS_OUTPUT` and `STATS_INTERVAL_MS`, after
    /// loading `.env` if there is one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = get("STATS_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("STATS_BASE_URL not set"))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow!(
                "STATS_BASE_URL must start with http:// or https:// (got {base_url})"
            ));
        }

        let output = get("STATS_OUTPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let interval_ms = match get("STATS_INTERVAL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("STATS_INTERVAL_MS is not a number: {raw}"))?,
            None => REFRESH_INTERVAL_MS as u64,
        };
        if interval_ms == 0 {
            return Err(anyhow!("STATS_INTERVAL_MS must be greater than zero"));
        }

        Ok(Self {
            base_url,
            output,
            interval: Duration::from_millis(interval_ms),
        })
    }
}
