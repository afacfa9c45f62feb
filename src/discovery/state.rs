// src/discovery/state.rs
//! Persisted run state: the set of fingerprints already alerted on, and the
//! last run's listings per watcher. Both are read once before a run and
//! written once after it, as whole files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::types::Listing;

pub const NOTIFIED_FILE: &str = "notified.json";
pub const SNAPSHOT_FILE: &str = "jobs.json";

/// Fingerprints already notified. Only grows, except through [`reset_notified`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifiedSet(BTreeSet<String>);

impl NotifiedSet {
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.0.contains(fingerprint)
    }

    /// Returns `false` if the fingerprint was already present.
    pub fn insert(&mut self, fingerprint: String) -> bool {
        self.0.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Watcher name -> every listing seen for it in the latest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSnapshot(BTreeMap<String, Vec<Listing>>);

impl RunSnapshot {
    pub fn record(&mut self, watcher: impl Into<String>, listings: Vec<Listing>) {
        self.0.insert(watcher.into(), listings);
    }

    pub fn get(&self, watcher: &str) -> Option<&[Listing]> {
        self.0.get(watcher).map(Vec::as_slice)
    }

    pub fn watchers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Listing])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub notified: PathBuf,
    pub snapshot: PathBuf,
}

impl StatePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            notified: dir.join(NOTIFIED_FILE),
            snapshot: dir.join(SNAPSHOT_FILE),
        }
    }
}

/// Absent file is an empty set. A corrupt file is an error: silently starting
/// from empty would re-alert on every listing.
pub fn load_notified(path: &Path) -> Result<NotifiedSet> {
    if !path.exists() {
        return Ok(NotifiedSet::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading notified set from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing notified set {}", path.display()))
}

pub fn save_notified(path: &Path, notified: &NotifiedSet) -> Result<()> {
    let json = serde_json::to_vec(notified).context("serializing notified set")?;
    write_atomic(path, &json)
}

/// Empties the notified set on disk.
pub fn reset_notified(path: &Path) -> Result<()> {
    save_notified(path, &NotifiedSet::default())
}

/// The snapshot is display-only and overwritten each run, so an unreadable
/// file degrades to empty.
pub fn load_snapshot(path: &Path) -> RunSnapshot {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "snapshot unreadable, ignoring");
            RunSnapshot::default()
        }),
        Err(_) => RunSnapshot::default(),
    }
}

pub fn save_snapshot(path: &Path, snapshot: &RunSnapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).context("serializing run snapshot")?;
    write_atomic(path, &json)
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating state dir {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
