// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the run series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("discovery_listings_total", "Listings returned by providers.");
        describe_counter!(
            "discovery_raw_postings_total",
            "Postings in board responses before filtering."
        );
        describe_counter!("discovery_notified_total", "Alerts sent for new listings.");
        describe_counter!(
            "discovery_watcher_errors_total",
            "Watchers that failed to fetch or notify."
        );
        describe_counter!(
            "workday_channel_total",
            "Workday channel attempts by channel and outcome."
        );
        describe_gauge!("discovery_last_run_ts", "Unix ts when the last run finished.");

        Ok(Self { handle })
    }

    /// Write the exposition text for a node-exporter textfile collector.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        gauge!("discovery_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        std::fs::write(path, self.handle.render())
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
