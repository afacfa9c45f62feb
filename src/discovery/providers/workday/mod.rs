// src/discovery/providers/workday/mod.rs
//! Workday exposes the same posting feed three ways, in decreasing order of
//! reliability:
//!
//! 1. `GET  /wday/cxs/{tenant}/{site}/getJobs` (offset pagination)
//! 2. `POST /wday/cxs/{tenant}/{site}/jobs` (search body, optional facets)
//! 3. the rendered careers page, whose own XHR traffic is intercepted
//!
//! Channels are tried in that order. The first channel returning at least one
//! raw posting is authoritative, even when the title filter then keeps none.
//! A failing or empty channel is logged and the next one is tried.

pub mod intercept;
pub mod mapping;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::discovery::filter::is_internship_title;
use crate::discovery::types::{ExtraFilter, JobProvider, Listing};
use intercept::{FeedInterceptor, FeedMatcher};
use mapping::{job_url, parse_feed, read_posting};

pub const PAGE_SIZE: usize = 50;
/// Upper bound on pages drained per channel, for tenants that ignore offsets.
pub const MAX_PAGES: usize = 100;

/// Identifies one tenant's career site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkdayTarget {
    pub tenant: String,
    pub cluster: String,
    pub site: String,
    /// Empty means the page URL has no locale segment.
    pub locale: String,
}

impl WorkdayTarget {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            cluster: "wd5".to_string(),
            site: "External".to_string(),
            locale: "en-US".to_string(),
        }
    }

    pub fn origin(&self) -> String {
        format!("https://{}.{}.myworkdayjobs.com", self.tenant, self.cluster)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Get,
    Post,
    Intercept,
}

impl Channel {
    pub const TIERED: [Channel; 3] = [Channel::Get, Channel::Post, Channel::Intercept];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Get => "get",
            Channel::Post => "post",
            Channel::Intercept => "intercept",
        }
    }
}

/// Result of draining one channel.
#[derive(Debug)]
pub enum ChannelOutcome {
    /// `raw` counts postings before any filtering.
    Data { raw: usize, listings: Vec<Listing> },
    Empty,
    Failed(anyhow::Error),
}

impl ChannelOutcome {
    fn label(&self) -> &'static str {
        match self {
            ChannelOutcome::Data { .. } => "data",
            ChannelOutcome::Empty => "empty",
            ChannelOutcome::Failed(_) => "failed",
        }
    }
}

pub struct WorkdayProvider {
    target: WorkdayTarget,
    base_url: String,
    facets: BTreeMap<String, Vec<String>>,
    client: reqwest::Client,
    interceptor: Option<Arc<dyn FeedInterceptor>>,
    extra: Option<ExtraFilter>,
}

impl WorkdayProvider {
    pub fn new(target: WorkdayTarget, client: reqwest::Client) -> Self {
        let base_url = target.origin();
        Self {
            target,
            base_url,
            facets: BTreeMap::new(),
            client,
            interceptor: None,
            extra: None,
        }
    }

    /// Replace the tenant origin (test servers, proxies).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_facets(mut self, facets: BTreeMap<String, Vec<String>>) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn FeedInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn with_extra_filter(mut self, f: ExtraFilter) -> Self {
        self.extra = Some(f);
        self
    }

    fn cxs_root(&self) -> String {
        format!(
            "{}/wday/cxs/{}/{}",
            self.base_url, self.target.tenant, self.target.site
        )
    }

    pub fn get_url(&self, offset: usize) -> String {
        format!(
            "{}/getJobs?$top={PAGE_SIZE}&$skip={offset}&$searchText=Intern",
            self.cxs_root()
        )
    }

    pub fn post_url(&self) -> String {
        format!("{}/jobs", self.cxs_root())
    }

    fn site_root(&self) -> String {
        if self.target.locale.is_empty() {
            format!("{}/{}", self.base_url, self.target.site)
        } else {
            format!(
                "{}/{}/{}",
                self.base_url, self.target.locale, self.target.site
            )
        }
    }

    /// Careers page; the query makes the SPA request internship rows.
    pub fn page_url(&self) -> String {
        format!("{}?q=Internship", self.site_root())
    }

    /// Try `channels` in order and return the first authoritative result.
    /// Never fails: exhausting every channel yields an empty list.
    pub async fn fetch_channels(&self, channels: &[Channel]) -> Vec<Listing> {
        for &channel in channels {
            let outcome = self.run_channel(channel).await;
            counter!(
                "workday_channel_total",
                "channel" => channel.as_str(),
                "outcome" => outcome.label()
            )
            .increment(1);

            match outcome {
                ChannelOutcome::Data { raw, listings } => {
                    tracing::info!(
                        tenant = %self.target.tenant,
                        channel = channel.as_str(),
                        raw,
                        kept = listings.len(),
                        "workday channel produced postings"
                    );
                    return listings;
                }
                ChannelOutcome::Empty => {
                    tracing::info!(
                        tenant = %self.target.tenant,
                        channel = channel.as_str(),
                        "workday channel returned no postings"
                    );
                }
                ChannelOutcome::Failed(e) => {
                    tracing::warn!(
                        tenant = %self.target.tenant,
                        channel = channel.as_str(),
                        error = ?e,
                        "workday channel failed"
                    );
                }
            }
        }
        tracing::warn!(tenant = %self.target.tenant, "all workday channels exhausted without postings");
        Vec::new()
    }

    pub async fn run_channel(&self, channel: Channel) -> ChannelOutcome {
        match channel {
            Channel::Get | Channel::Post => self.drain_paginated(channel).await,
            Channel::Intercept => self.intercept().await,
        }
    }

    async fn drain_paginated(&self, channel: Channel) -> ChannelOutcome {
        let mut raw = Vec::new();
        let mut exhausted = false;
        for page in 0..MAX_PAGES {
            let offset = page * PAGE_SIZE;
            match self.fetch_page(channel, offset).await {
                Ok(postings) if postings.is_empty() => {
                    exhausted = true;
                    break;
                }
                Ok(mut postings) => raw.append(&mut postings),
                Err(e) => {
                    if !raw.is_empty() {
                        tracing::debug!(
                            tenant = %self.target.tenant,
                            channel = channel.as_str(),
                            discarded = raw.len(),
                            "dropping partial pages of failed channel"
                        );
                    }
                    return ChannelOutcome::Failed(e.context(format!("page at offset {offset}")));
                }
            }
        }
        if !exhausted {
            tracing::warn!(
                tenant = %self.target.tenant,
                channel = channel.as_str(),
                pages = MAX_PAGES,
                "pagination cap reached"
            );
        }
        self.outcome_from(raw)
    }

    async fn fetch_page(&self, channel: Channel, offset: usize) -> Result<Vec<Value>> {
        let body = match channel {
            Channel::Get => {
                let url = self.get_url(offset);
                self.client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("workday GET {url}"))?
                    .error_for_status()
                    .context("workday GET non-2xx")?
                    .text()
                    .await
                    .context("workday GET body")?
            }
            Channel::Post => {
                let url = self.post_url();
                let payload = json!({
                    "appliedFacets": self.facets,
                    "limit": PAGE_SIZE,
                    "offset": offset,
                    "searchText": "",
                });
                let resp = self
                    .client
                    .post(&url)
                    .json(&payload)
                    .send()
                    .await
                    .with_context(|| format!("workday POST {url}"))?;
                let status = resp.status();
                if status.is_client_error() || status.is_server_error() {
                    bail!("workday POST {url} returned {status}");
                }
                resp.text().await.context("workday POST body")?
            }
            Channel::Intercept => bail!("intercept channel is not paginated"),
        };
        parse_feed(&body)
    }

    async fn intercept(&self) -> ChannelOutcome {
        let Some(interceptor) = &self.interceptor else {
            return ChannelOutcome::Failed(anyhow!("no browser interceptor configured"));
        };
        let page_url = self.page_url();
        let matcher = match FeedMatcher::for_page(&page_url) {
            Ok(m) => m,
            Err(e) => return ChannelOutcome::Failed(e),
        };
        match interceptor.capture(&page_url, &matcher).await {
            Ok(None) => ChannelOutcome::Empty,
            Ok(Some(body)) => match parse_feed(&body) {
                Ok(raw) => self.outcome_from(raw),
                Err(e) => ChannelOutcome::Failed(e.context("intercepted feed")),
            },
            Err(e) => ChannelOutcome::Failed(e),
        }
    }

    fn outcome_from(&self, raw: Vec<Value>) -> ChannelOutcome {
        if raw.is_empty() {
            return ChannelOutcome::Empty;
        }
        ChannelOutcome::Data {
            raw: raw.len(),
            listings: self.to_listings(&raw),
        }
    }

    /// Shared by all three channels: field fallback, title filter, extra
    /// filter, id uniqueness.
    fn to_listings(&self, raw: &[Value]) -> Vec<Listing> {
        let site_root = self.site_root();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for value in raw {
            let Some(posting) = read_posting(value) else {
                tracing::debug!(tenant = %self.target.tenant, "posting without usable title/id");
                continue;
            };
            if !is_internship_title(&posting.title) {
                continue;
            }
            if let Some(extra) = &self.extra {
                if !extra(value) {
                    continue;
                }
            }
            if !seen.insert(posting.id.clone()) {
                continue;
            }
            out.push(Listing {
                url: job_url(&site_root, posting.external_path.as_deref()),
                id: posting.id,
                title: posting.title,
            });
        }
        out
    }
}

#[async_trait]
impl JobProvider for WorkdayProvider {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        Ok(self.fetch_channels(&Channel::TIERED).await)
    }

    fn name(&self) -> &'static str {
        "Workday"
    }
}

/// For tenants known to block the documented endpoints: goes straight to the
/// interception channel of a full [`WorkdayProvider`].
pub struct WorkdayInterceptProvider {
    inner: WorkdayProvider,
}

impl WorkdayInterceptProvider {
    pub fn new(inner: WorkdayProvider) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl JobProvider for WorkdayInterceptProvider {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        Ok(self.inner.fetch_channels(&[Channel::Intercept]).await)
    }

    fn fingerprint(&self, listing: &Listing) -> String {
        self.inner.fingerprint(listing)
    }

    fn name(&self) -> &'static str {
        "WorkdayIntercept"
    }
}
