// src/discovery/types.rs
use anyhow::Result;
use std::sync::Arc;

/// Normalized job posting. `id` is ATS-native and stable across polls;
/// `title` and `url` are presentation-only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Adapter-level hook over the raw posting JSON. Returning `false` drops the
/// posting before it becomes a `Listing`.
pub type ExtraFilter = Arc<dyn Fn(&serde_json::Value) -> bool + Send + Sync>;

#[async_trait::async_trait]
pub trait JobProvider: Send + Sync {
    /// Performs all network I/O for one poll and returns the internship
    /// listings found. Empty boards are `Ok(vec![])`; only transport and
    /// protocol failures are errors.
    async fn fetch(&self) -> Result<Vec<Listing>>;

    /// Deduplication key. Pure; two fetches of the same posting agree.
    fn fingerprint(&self, listing: &Listing) -> String {
        listing.id.clone()
    }

    fn name(&self) -> &'static str;
}
