#![cfg(feature = "server")]
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::time::{interval_at, Instant};

use crate::api::HttpStatsSource;
use crate::backend::WatchConfig;
use crate::poller::{template, transform, StatsPoller, StatsView};
use crate::shared::types::StatsPayload;

/// Display container backed by a file. The alert is only logged, on change.
#[derive(Debug)]
pub struct FileView {
    path: PathBuf,
    alert_visible: bool,
}

impl FileView {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alert_visible: false,
        }
    }

    pub fn alert_visible(&self) -> bool {
        self.alert_visible
    }

    fn write(&self, html: &str) -> Result<()> {
        // write-then-rename so readers never see half a fragment
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, html).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} to {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

impl StatsView for FileView {
    fn set_alert_visible(&mut self, visible: bool) {
        if visible != self.alert_visible {
            if visible {
                eprintln!("[watch] stats unavailable; keeping last render in {}", self.path.display());
            } else {
                eprintln!("[watch] stats available again");
            }
        }
        self.alert_visible = visible;
    }

    fn replace_content(&mut self, html: String) -> Result<()> {
        self.write(&html)
    }
}

/// Polls `<base>/stats` forever, rendering into `cfg.output`.
pub async fn run_watch(cfg: WatchConfig) -> Result<()> {
    let source = HttpStatsSource::new(&cfg.base_url);
    eprintln!(
        "[watch] polling {} every {} ms into {}",
        source.url(),
        cfg.interval.as_millis(),
        cfg.output.display()
    );
    let period = cfg.interval;
    let timer = interval_at(Instant::now() + period, period);
    let ticks = futures::stream::unfold(timer, |mut timer| async move {
        timer.tick().await;
        Some(((), timer))
    });
    StatsPoller::new(source, FileView::new(cfg.output))
        .run(ticks)
        .await;
    Ok(())
}

/// One-shot render of a payload stored on disk.
pub fn render_file(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let stats: StatsPayload = serde_json::from_str(&raw)
        .with_context(|| format!("decoding stats payload from {}", path.display()))?;
    template::render(&transform::prepare(stats))
}
