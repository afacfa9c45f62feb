// src/http.rs
use anyhow::{Context, Result};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("internship-sentinel/", env!("CARGO_PKG_VERSION"));

/// Client used by the ATS adapters. Every request carries `timeout`; a
/// timed-out call surfaces as an ordinary error.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .timeout(timeout)
        .build()
        .context("building http client")
}
