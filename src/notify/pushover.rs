// src/notify/pushover.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{NotificationEvent, Notifier};

pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

pub struct PushoverNotifier {
    token: String,
    user: String,
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl PushoverNotifier {
    pub fn new(token: String, user: String) -> Self {
        Self {
            token,
            user,
            endpoint: PUSHOVER_ENDPOINT.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Enabled when both `PUSHOVER_APP_TOKEN` and `PUSHOVER_USER_KEY` are set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("PUSHOVER_APP_TOKEN").ok().filter(|s| !s.is_empty())?;
        let user = std::env::var("PUSHOVER_USER_KEY").ok().filter(|s| !s.is_empty())?;
        Some(Self::new(token, user))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let message = ev.message();
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", message.as_str()),
            ])
            .send()
            .await
            .context("pushover post")?
            .error_for_status()
            .context("pushover non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pushover"
    }
}
