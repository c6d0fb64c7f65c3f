use anyhow::{Context, Result};
use askama::Template;

use crate::shared::types::{Miner, RenderModel, Upstream};
use crate::utils::format::{
    format_ago, format_count, format_countdown, format_hashrate, format_timestamp_ms,
};

pub struct SummaryItem {
    pub label: &'static str,
    pub value: String,
}

pub struct MinerRow {
    pub name: String,
    pub status_class: &'static str,
    pub hashrate: String,
    pub hashrate_24h: String,
    pub last_beat: String,
    pub shares: String,
    pub blocks: String,
    pub ip: String,
}

pub struct UpstreamRow {
    pub name: String,
    pub url: String,
    pub status_class: &'static str,
    pub status: &'static str,
}

/// Stats fragment placed into the display container. Only fields present in
/// the payload produce markup.
#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub summary: Vec<SummaryItem>,
    pub show_epoch: bool,
    pub next_epoch_at: String,
    pub epoch_countdown: String,
    pub show_miners: bool,
    pub miners: Vec<MinerRow>,
    pub show_upstreams: bool,
    pub upstreams: Vec<UpstreamRow>,
    pub pool_url: String,
}

impl StatsTemplate {
    pub fn from_model(model: &RenderModel) -> Self {
        let stats = &model.stats;
        let mut summary = Vec::new();
        let mut push = |label: &'static str, value: Option<String>| {
            if let Some(value) = value {
                summary.push(SummaryItem { label, value });
            }
        };
        push("Height", stats.height.map(|h| h.to_string()));
        push("Difficulty", stats.diff.as_ref().map(|d| d.to_string()));
        push("Hashrate", stats.hashrate.map(format_hashrate));
        push("Hashrate (24h)", stats.hashrate_24h.map(format_hashrate));
        push("Miners", stats.total_miners.map(format_count));
        push("Online", stats.total_online.map(format_count));
        push("Timed out", stats.timed_out.map(format_count));
        push("Valid blocks", stats.valid_blocks.map(format_count));
        push("Invalid blocks", stats.invalid_blocks.map(format_count));

        let (show_epoch, next_epoch_at, epoch_countdown) = match (model.next_epoch, stats.now) {
            (Some(next), Some(now)) => (
                true,
                format_timestamp_ms(next),
                format_countdown(next.saturating_sub(now)),
            ),
            _ => (false, String::new(), String::new()),
        };

        let now = stats.now;
        let miners = stats
            .miners
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|m| miner_row(m, now))
            .collect();

        let upstreams = stats
            .upstreams
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(upstream_row)
            .collect();

        Self {
            summary,
            show_epoch,
            next_epoch_at,
            epoch_countdown,
            show_miners: stats.miners.is_some(),
            miners,
            show_upstreams: stats.upstreams.is_some(),
            upstreams,
            pool_url: stats.url.clone().unwrap_or_default(),
        }
    }
}

fn miner_row(miner: &Miner, now: Option<i64>) -> MinerRow {
    let status_class = if miner.timeout {
        "miner timeout"
    } else if miner.warning {
        "miner warning"
    } else {
        "miner"
    };
    let last_beat = match (miner.last_beat, now) {
        (Some(beat), Some(now)) => format_ago(now, beat),
        (Some(beat), None) => format_timestamp_ms(beat),
        _ => "-".to_string(),
    };
    MinerRow {
        name: miner.name.clone(),
        status_class,
        hashrate: miner.hashrate.map(format_hashrate).unwrap_or_else(|| "-".into()),
        hashrate_24h: miner
            .hashrate_24h
            .map(format_hashrate)
            .unwrap_or_else(|| "-".into()),
        last_beat,
        shares: pair(miner.valid_shares, miner.invalid_shares),
        blocks: pair(miner.valid_blocks, miner.invalid_blocks),
        ip: miner.ip.clone().unwrap_or_else(|| "-".into()),
    }
}

fn upstream_row(upstream: &Upstream) -> UpstreamRow {
    let (status_class, status) = if upstream.sick {
        ("upstream sick", "sick")
    } else if upstream.current {
        ("upstream current", "active")
    } else {
        ("upstream", "standby")
    };
    UpstreamRow {
        name: upstream.name.clone(),
        url: upstream.url.clone(),
        status_class,
        status,
    }
}

// "valid / invalid"
fn pair(valid: Option<i64>, invalid: Option<i64>) -> String {
    match (valid, invalid) {
        (None, None) => "-".to_string(),
        (v, i) => format!(
            "{} / {}",
            format_count(v.unwrap_or(0)),
            format_count(i.unwrap_or(0))
        ),
    }
}

pub fn render(model: &RenderModel) -> Result<String> {
    StatsTemplate::from_model(model)
        .render()
        .context("rendering stats template")
}
