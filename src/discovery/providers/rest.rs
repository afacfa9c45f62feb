// src/discovery/providers/rest.rs
//! Single-request job boards: Greenhouse, Lever and Ashby all expose a public
//! GET endpoint returning every open posting as JSON.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use std::collections::HashSet;

use crate::discovery::filter::{clean_title, is_internship_title};
use crate::discovery::providers::json_id;
use crate::discovery::types::{ExtraFilter, JobProvider, Listing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    Greenhouse,
    Lever,
    Ashby,
}

/// Where the postings live in the body and what the fields are called.
struct BoardShape {
    postings_key: Option<&'static str>,
    id: &'static str,
    title: &'static str,
    url: &'static str,
}

impl BoardKind {
    pub fn name(self) -> &'static str {
        match self {
            BoardKind::Greenhouse => "Greenhouse",
            BoardKind::Lever => "Lever",
            BoardKind::Ashby => "Ashby",
        }
    }

    fn default_base(self) -> &'static str {
        match self {
            BoardKind::Greenhouse => "https://boards-api.greenhouse.io",
            BoardKind::Lever => "https://api.lever.co",
            BoardKind::Ashby => "https://api.ashbyhq.com",
        }
    }

    fn path(self, slug: &str) -> String {
        match self {
            BoardKind::Greenhouse => format!("/v1/boards/{slug}/jobs?content=false"),
            BoardKind::Lever => format!("/v0/postings/{slug}?mode=json"),
            BoardKind::Ashby => format!("/posting-api/job-board/{slug}"),
        }
    }

    fn shape(self) -> BoardShape {
        match self {
            BoardKind::Greenhouse => BoardShape {
                postings_key: Some("jobs"),
                id: "id",
                title: "title",
                url: "absolute_url",
            },
            // Lever returns a bare array.
            BoardKind::Lever => BoardShape {
                postings_key: None,
                id: "id",
                title: "text",
                url: "hostedUrl",
            },
            BoardKind::Ashby => BoardShape {
                postings_key: Some("jobs"),
                id: "id",
                title: "title",
                url: "applyUrl",
            },
        }
    }
}

pub struct RestBoardProvider {
    kind: BoardKind,
    slug: String,
    base_url: String,
    client: reqwest::Client,
    extra: Option<ExtraFilter>,
}

impl RestBoardProvider {
    pub fn new(kind: BoardKind, slug: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            kind,
            slug: slug.into(),
            base_url: kind.default_base().to_string(),
            client,
            extra: None,
        }
    }

    /// Point the adapter at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_extra_filter(mut self, f: ExtraFilter) -> Self {
        self.extra = Some(f);
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.kind.path(&self.slug))
    }

    fn parse_body(&self, body: &str) -> Result<Vec<Listing>> {
        let doc: Value = serde_json::from_str(body)
            .with_context(|| format!("parsing {} response json", self.kind.name()))?;
        let shape = self.kind.shape();

        let postings = match shape.postings_key {
            Some(key) => doc.get(key),
            None => Some(&doc),
        }
        .and_then(Value::as_array)
        .ok_or_else(|| {
            anyhow!(
                "{} response has no postings array ({})",
                self.kind.name(),
                shape.postings_key.unwrap_or("top level")
            )
        })?;

        counter!("discovery_raw_postings_total", "provider" => self.kind.name())
            .increment(postings.len() as u64);

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for posting in postings {
            let (Some(id), Some(title)) = (
                posting.get(shape.id).and_then(json_id),
                posting.get(shape.title).and_then(Value::as_str),
            ) else {
                tracing::debug!(provider = self.kind.name(), slug = %self.slug, "posting without id/title skipped");
                continue;
            };
            let title = clean_title(title);
            if !is_internship_title(&title) {
                continue;
            }
            if let Some(extra) = &self.extra {
                if !extra(posting) {
                    continue;
                }
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            let url = posting
                .get(shape.url)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            out.push(Listing { id, title, url });
        }
        Ok(out)
    }
}

#[async_trait]
impl JobProvider for RestBoardProvider {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let url = self.endpoint();
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("{} GET {url}", self.kind.name()))?
            .error_for_status()
            .with_context(|| format!("{} non-2xx from {url}", self.kind.name()))?
            .text()
            .await
            .with_context(|| format!("{} reading body", self.kind.name()))?;
        self.parse_body(&body)
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }
}
