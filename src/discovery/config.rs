// src/discovery/config.rs
//! Watchers file: a JSON object keyed by watcher name, as written by the
//! configuration editor.
//!
//! ```json
//! {
//!   "Acme":    { "ats": "Greenhouse", "slug": "acme" },
//!   "Initech": { "ats": "Workday", "tenant": "initech", "cluster": "wd1",
//!                "site": "Careers", "locale": "en-US" }
//! }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::discovery::providers::rest::BoardKind;
use crate::discovery::providers::workday::WorkdayTarget;
use crate::discovery::providers::ProviderSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtsKind {
    Greenhouse,
    Lever,
    Ashby,
    Workday,
    WorkdayIntercept,
}

impl FromStr for AtsKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greenhouse" => Ok(AtsKind::Greenhouse),
            "lever" => Ok(AtsKind::Lever),
            "ashby" => Ok(AtsKind::Ashby),
            "workday" => Ok(AtsKind::Workday),
            "workdayintercept" | "workday_intercept" | "workday-intercept" => {
                Ok(AtsKind::WorkdayIntercept)
            }
            other => Err(anyhow!("unknown ATS kind {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub name: String,
    pub ats_kind: AtsKind,
    /// Organization slug, or the tenant/cluster/site/locale quadruple.
    pub params: BTreeMap<String, String>,
    /// Workday search facets (facet id -> values).
    pub applied_facets: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawWatcher {
    ats: String,
    #[serde(default)]
    applied_facets: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    params: BTreeMap<String, String>,
}

impl WatcherConfig {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.param(key)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("watcher {:?} is missing {key:?}", self.name))
    }

    /// Resolve into the provider variant to build. Fails on missing params.
    pub fn spec(&self) -> Result<ProviderSpec> {
        let board = |kind| -> Result<ProviderSpec> {
            Ok(ProviderSpec::Board {
                kind,
                slug: self.required("slug")?,
            })
        };
        match self.ats_kind {
            AtsKind::Greenhouse => board(BoardKind::Greenhouse),
            AtsKind::Lever => board(BoardKind::Lever),
            AtsKind::Ashby => board(BoardKind::Ashby),
            AtsKind::Workday | AtsKind::WorkdayIntercept => {
                let mut target = WorkdayTarget::new(self.required("tenant")?);
                if let Some(c) = self.param("cluster") {
                    target.cluster = c.to_string();
                }
                if let Some(s) = self.param("site") {
                    target.site = s.to_string();
                }
                // An explicitly empty locale drops the segment from page URLs.
                if let Some(l) = self.params.get("locale") {
                    target.locale = l.trim().to_string();
                }
                Ok(ProviderSpec::Workday {
                    target,
                    facets: self.applied_facets.clone(),
                    intercept_only: self.ats_kind == AtsKind::WorkdayIntercept,
                })
            }
        }
    }
}

/// Parse watchers JSON. Malformed JSON is an error; individual watchers with
/// an unknown kind or missing params are dropped with a warning.
pub fn parse_watchers(content: &str) -> Result<Vec<WatcherConfig>> {
    let raw: BTreeMap<String, RawWatcher> =
        serde_json::from_str(content).context("parsing watchers json")?;

    let mut out = Vec::with_capacity(raw.len());
    for (name, w) in raw {
        let ats_kind = match w.ats.parse::<AtsKind>() {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!(watcher = %name, error = %e, "watcher skipped");
                continue;
            }
        };
        let cfg = WatcherConfig {
            name,
            ats_kind,
            params: w.params,
            applied_facets: w.applied_facets,
        };
        if let Err(e) = cfg.spec() {
            tracing::warn!(watcher = %cfg.name, error = %e, "watcher skipped");
            continue;
        }
        out.push(cfg);
    }
    Ok(out)
}

/// Missing or unreadable file is a startup failure.
pub fn load_watchers_from(path: &Path) -> Result<Vec<WatcherConfig>> {
    if !path.exists() {
        bail!(
            "watchers file {} not found; create it with the configuration editor first",
            path.display()
        );
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watchers from {}", path.display()))?;
    parse_watchers(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("greenhouse".parse::<AtsKind>().unwrap(), AtsKind::Greenhouse);
        assert_eq!(
            "WorkdayIntercept".parse::<AtsKind>().unwrap(),
            AtsKind::WorkdayIntercept
        );
        assert!("SmartRecruiters".parse::<AtsKind>().is_err());
    }

    #[test]
    fn workday_defaults_and_overrides() {
        let cfgs = parse_watchers(
            r#"{
                "A": {"ats": "Workday", "tenant": "acme"},
                "B": {"ats": "WorkdayIntercept", "tenant": "beta", "cluster": "wd1",
                      "site": "Careers", "locale": "",
                      "applied_facets": {"jobFamilyGroup": ["f1", "f2"]}}
            }"#,
        )
        .unwrap();
        assert_eq!(cfgs.len(), 2);

        match cfgs[0].spec().unwrap() {
            ProviderSpec::Workday {
                target,
                intercept_only,
                ..
            } => {
                assert_eq!(target, WorkdayTarget::new("acme"));
                assert!(!intercept_only);
            }
            other => panic!("unexpected {other:?}"),
        }
        match cfgs[1].spec().unwrap() {
            ProviderSpec::Workday {
                target,
                facets,
                intercept_only,
            } => {
                assert_eq!(target.cluster, "wd1");
                assert_eq!(target.site, "Careers");
                assert_eq!(target.locale, "");
                assert_eq!(facets["jobFamilyGroup"], vec!["f1", "f2"]);
                assert!(intercept_only);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_watchers_are_dropped_not_fatal() {
        let cfgs = parse_watchers(
            r#"{
                "Good": {"ats": "Lever", "slug": "good"},
                "NoSlug": {"ats": "Ashby"},
                "Blank": {"ats": "Greenhouse", "slug": "  "},
                "Weird": {"ats": "Taleo", "slug": "x"},
                "NoTenant": {"ats": "Workday", "site": "External"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfgs.len(), 1);
        assert_eq!(cfgs[0].name, "Good");
        assert_eq!(
            cfgs[0].spec().unwrap(),
            ProviderSpec::Board {
                kind: BoardKind::Lever,
                slug: "good".into()
            }
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_watchers("[1, 2").is_err());
        assert!(parse_watchers(r#"{"A": {"slug": "no-kind"}}"#).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_watchers_from(&dir.path().join("watchers.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
