// src/notify/mod.rs
//! Outbound alerts for newly discovered listings. Each transport is optional
//! and enabled by its env credentials; `NotifierMux` fans out to all of them.

pub mod discord;
pub mod email;
pub mod pushover;
pub mod slack;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// One alert per newly seen listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub watcher: String,
    pub title: String,
    pub url: String,
    pub ts: DateTime<Utc>,
}

impl NotificationEvent {
    /// Single-line text used by the plain-text transports.
    pub fn message(&self) -> String {
        format!("[{}] {} → {}", self.watcher, self.title, self.url)
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// `Err` means the alert was not delivered.
    async fn send(&self, ev: &NotificationEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans an event out to every configured transport. Delivery succeeds when at
/// least one transport accepted it. With no transport configured the alert is
/// only logged.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn from_env() -> Self {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(p) = pushover::PushoverNotifier::from_env() {
            channels.push(Box::new(p));
        }
        if let Some(s) = slack::SlackNotifier::from_env() {
            channels.push(Box::new(s));
        }
        if let Some(d) = discord::DiscordNotifier::from_env() {
            channels.push(Box::new(d));
        }
        match email::EmailSender::from_env() {
            Ok(Some(e)) => channels.push(Box::new(e)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "email notifier disabled"),
        }
        tracing::info!(
            channels = ?channels.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "notification channels"
        );
        Self { channels }
    }
}

#[async_trait::async_trait]
impl Notifier for NotifierMux {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        if self.channels.is_empty() {
            tracing::info!(target: "alert", "{}", ev.message());
            return Ok(());
        }

        let mut delivered = 0usize;
        let mut errors = Vec::new();
        for ch in &self.channels {
            match ch.send(ev).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(channel = ch.name(), error = %format!("{e:#}"), "notification failed");
                    errors.push(format!("{}: {e:#}", ch.name()));
                }
            }
        }
        if delivered == 0 {
            return Err(anyhow!("no channel delivered alert: {}", errors.join("; ")));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}
