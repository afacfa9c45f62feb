// src/discovery/mod.rs
//! Discovery run: fetch every watcher, alert once per new fingerprint, record
//! what was seen. State is passed in and handed back; load/save happen at the
//! edges in [`run_with_state`].

pub mod config;
pub mod filter;
pub mod providers;
pub mod state;
pub mod types;

use anyhow::Result;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;

use crate::config::Settings;
use crate::discovery::config::WatcherConfig;
use crate::discovery::providers::workday::intercept::FeedInterceptor;
use crate::discovery::providers::ProviderContext;
use crate::discovery::state::{NotifiedSet, RunSnapshot, StatePaths};
use crate::discovery::types::JobProvider;
use crate::notify::{NotificationEvent, Notifier};

/// A named provider, live for one run.
pub struct Watcher {
    pub name: String,
    pub provider: Box<dyn JobProvider>,
}

impl Watcher {
    pub fn new(name: impl Into<String>, provider: Box<dyn JobProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Fetch,
    Notify,
}

#[derive(Debug)]
pub struct WatcherFailure {
    pub watcher: String,
    pub stage: FailureStage,
    pub error: anyhow::Error,
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Prior fingerprints plus the ones alerted on in this run.
    pub notified: NotifiedSet,
    /// Fresh snapshot; replaces the previous one wholesale.
    pub snapshot: RunSnapshot,
    pub new_alerts: usize,
    pub failures: Vec<WatcherFailure>,
}

/// Shared HTTP clients and the browser interceptor, per settings.
pub fn provider_context(settings: &Settings) -> Result<ProviderContext> {
    Ok(ProviderContext {
        board_client: crate::http::build_client(settings.http_timeout())?,
        workday_client: crate::http::build_client(settings.workday_timeout())?,
        interceptor: default_interceptor(settings),
    })
}

#[cfg(feature = "browser")]
fn default_interceptor(settings: &Settings) -> Option<Arc<dyn FeedInterceptor>> {
    use crate::discovery::providers::workday::intercept::ChromiumInterceptor;
    let icpt = ChromiumInterceptor::new(settings.nav_timeout(), settings.intercept_timeout())
        .with_chrome_path(settings.chrome_path.clone());
    Some(Arc::new(icpt))
}

#[cfg(not(feature = "browser"))]
fn default_interceptor(_settings: &Settings) -> Option<Arc<dyn FeedInterceptor>> {
    tracing::debug!("built without `browser`; Workday interception disabled");
    None
}

pub fn build_watchers(configs: &[WatcherConfig], ctx: &ProviderContext) -> Vec<Watcher> {
    configs
        .iter()
        .filter_map(|cfg| match cfg.spec() {
            Ok(spec) => Some(Watcher::new(cfg.name.clone(), spec.build(ctx))),
            Err(e) => {
                tracing::warn!(watcher = %cfg.name, error = %e, "watcher skipped");
                None
            }
        })
        .collect()
}

/// Process watchers sequentially. A failing watcher is logged and recorded in
/// `failures`; it never stops the others.
pub async fn run_once(
    watchers: &[Watcher],
    notifier: &dyn Notifier,
    mut notified: NotifiedSet,
) -> RunOutcome {
    let mut snapshot = RunSnapshot::default();
    let mut failures = Vec::new();
    let mut new_alerts = 0usize;

    for w in watchers {
        let listings = match w.provider.fetch().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(watcher = %w.name, provider = w.provider.name(), error = ?e, "watcher fetch failed");
                counter!("discovery_watcher_errors_total", "stage" => "fetch").increment(1);
                failures.push(WatcherFailure {
                    watcher: w.name.clone(),
                    stage: FailureStage::Fetch,
                    error: e,
                });
                continue;
            }
        };
        counter!("discovery_listings_total").increment(listings.len() as u64);

        let mut notify_error = None;
        for listing in &listings {
            let fp = w.provider.fingerprint(listing);
            if notified.contains(&fp) {
                continue;
            }
            let ev = NotificationEvent {
                watcher: w.name.clone(),
                title: listing.title.clone(),
                url: listing.url.clone(),
                ts: Utc::now(),
            };
            if let Err(e) = notifier.send(&ev).await {
                notify_error = Some(e);
                break;
            }
            tracing::info!(watcher = %w.name, title = %listing.title, url = %listing.url, "ALERT");
            counter!("discovery_notified_total").increment(1);
            notified.insert(fp);
            new_alerts += 1;
        }

        tracing::debug!(watcher = %w.name, listings = listings.len(), "watcher done");
        snapshot.record(w.name.clone(), listings);

        if let Some(e) = notify_error {
            tracing::warn!(watcher = %w.name, error = ?e, "watcher notification failed");
            counter!("discovery_watcher_errors_total", "stage" => "notify").increment(1);
            failures.push(WatcherFailure {
                watcher: w.name.clone(),
                stage: FailureStage::Notify,
                error: e,
            });
        }
    }

    RunOutcome {
        notified,
        snapshot,
        new_alerts,
        failures,
    }
}

/// Load the notified set, run, then persist both state files. Errors here are
/// state I/O only; watcher failures are in the returned outcome. Both files are
/// written even if the first write fails; the first error is returned.
pub async fn run_with_state(
    paths: &StatePaths,
    watchers: &[Watcher],
    notifier: &dyn Notifier,
) -> Result<RunOutcome> {
    let notified = state::load_notified(&paths.notified)?;
    let prior = notified.len();

    let outcome = run_once(watchers, notifier, notified).await;

    let saved_notified = state::save_notified(&paths.notified, &outcome.notified);
    let saved_snapshot = state::save_snapshot(&paths.snapshot, &outcome.snapshot);
    if let Err(e) = &saved_notified {
        tracing::error!(path = %paths.notified.display(), error = ?e, "notified set not saved");
    }
    if let Err(e) = &saved_snapshot {
        tracing::error!(path = %paths.snapshot.display(), error = ?e, "run snapshot not saved");
    }
    saved_notified?;
    saved_snapshot?;

    tracing::info!(
        watchers = watchers.len(),
        failed = outcome.failures.len(),
        new_alerts = outcome.new_alerts,
        notified_before = prior,
        notified_after = outcome.notified.len(),
        "discovery run complete"
    );
    Ok(outcome)
}
