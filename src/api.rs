use anyhow::{anyhow, Context, Result};
use dioxus::logger::tracing::{debug, warn};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::error::Error as _;

use crate::poller::StatsSource;
use crate::shared::types::StatsPayload;

pub const STATS_PATH: &str = "/stats";

#[cfg(not(target_arch = "wasm32"))]
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(std::time::Duration::from_secs(2))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

// the browser's fetch owns timeouts
#[cfg(target_arch = "wasm32")]
static CLIENT: Lazy<Client> = Lazy::new(Client::new);

pub fn stats_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), STATS_PATH)
}

/// `GET <base>/stats`.
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    url: String,
}

impl HttpStatsSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            url: stats_url(base_url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolves `/stats` against the page the app is served from.
    #[cfg(feature = "web")]
    pub fn from_page_origin() -> Result<Self> {
        use js_sys::Reflect;
        use wasm_bindgen::JsValue;

        let location = Reflect::get(&js_sys::global(), &JsValue::from_str("location"))
            .map_err(|_| anyhow!("window.location is not available"))?;
        let origin = Reflect::get(&location, &JsValue::from_str("origin"))
            .ok()
            .and_then(|v| v.as_string())
            .ok_or_else(|| anyhow!("window.location.origin is not a string"))?;
        Ok(Self::new(&origin))
    }
}

impl StatsSource for HttpStatsSource {
    async fn fetch(&self) -> Result<StatsPayload> {
        fetch_json(&self.url).await
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn is_connect(e: &reqwest::Error) -> bool {
    e.is_connect()
}

#[cfg(target_arch = "wasm32")]
fn is_connect(_e: &reqwest::Error) -> bool {
    false
}

pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    debug!("[stats] GET {}", url);
    let req = CLIENT
        .get(url)
        .header("Accept", "application/json")
        .header("Cache-Control", "no-store");
    let res = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("[stats] request error on GET {}: {}", url, e);
            if e.is_timeout() {
                warn!("[stats] hint: request timed out");
            }
            if is_connect(&e) {
                warn!("[stats] hint: connection failed (DNS/route/refused/TLS). Check STATS_BASE_URL and network reachability");
            }
            if e.is_builder() {
                warn!("[stats] hint: request build error (invalid URL)");
            }
            let mut chain = Vec::new();
            let mut src: Option<&dyn std::error::Error> = e.source();
            while let Some(s) = src {
                chain.push(s.to_string());
                src = s.source();
            }
            if !chain.is_empty() {
                warn!("[stats] error chain: {}", chain.join(" -> "));
            }
            return Err(anyhow!("sending GET {}: {}", url, e));
        }
    };
    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        let snip = text.chars().take(300).collect::<String>();
        warn!("[stats] request failed: status={} body=\n{}", status, snip);
        return Err(anyhow!("GET {} failed with status {}", url, status));
    }
    let bytes = res
        .bytes()
        .await
        .with_context(|| format!("reading body from GET {}", url))?;
    let data: T = serde_json::from_slice(&bytes).map_err(|e| {
        let snip = String::from_utf8_lossy(&bytes);
        let snip = snip.chars().take(300).collect::<String>();
        anyhow!(
            "decoding JSON from GET {} failed: {}\nBody snippet: {}",
            url,
            e,
            snip
        )
    })?;
    Ok(data)
}
