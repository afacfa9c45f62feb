// src/discovery/providers/mod.rs
pub mod rest;
pub mod workday;

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::discovery::types::JobProvider;
use rest::{BoardKind, RestBoardProvider};
use workday::intercept::FeedInterceptor;
use workday::{WorkdayInterceptProvider, WorkdayProvider, WorkdayTarget};

/// Validated provider variant for one watcher, resolved from its config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSpec {
    Board {
        kind: BoardKind,
        slug: String,
    },
    Workday {
        target: WorkdayTarget,
        facets: BTreeMap<String, Vec<String>>,
        intercept_only: bool,
    },
}

/// Shared resources handed to every provider built during a run.
#[derive(Clone)]
pub struct ProviderContext {
    /// Client for single-request boards.
    pub board_client: reqwest::Client,
    /// Client for Workday GET/POST pagination (longer timeout).
    pub workday_client: reqwest::Client,
    pub interceptor: Option<Arc<dyn FeedInterceptor>>,
}

impl ProviderSpec {
    pub fn build(&self, ctx: &ProviderContext) -> Box<dyn JobProvider> {
        match self {
            ProviderSpec::Board { kind, slug } => Box::new(RestBoardProvider::new(
                *kind,
                slug.clone(),
                ctx.board_client.clone(),
            )),
            ProviderSpec::Workday {
                target,
                facets,
                intercept_only,
            } => {
                let mut p = WorkdayProvider::new(target.clone(), ctx.workday_client.clone())
                    .with_facets(facets.clone());
                if let Some(icpt) = &ctx.interceptor {
                    p = p.with_interceptor(icpt.clone());
                }
                if *intercept_only {
                    Box::new(WorkdayInterceptProvider::new(p))
                } else {
                    Box::new(p)
                }
            }
        }
    }
}

/// ATS ids come back as strings or numbers depending on the vendor.
pub(crate) fn json_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ProviderContext {
        ProviderContext {
            board_client: reqwest::Client::new(),
            workday_client: reqwest::Client::new(),
            interceptor: None,
        }
    }

    #[test]
    fn spec_builds_matching_provider() {
        let lever = ProviderSpec::Board {
            kind: BoardKind::Lever,
            slug: "acme".into(),
        };
        assert_eq!(lever.build(&ctx()).name(), "Lever");

        let wd = ProviderSpec::Workday {
            target: WorkdayTarget::new("acme"),
            facets: BTreeMap::new(),
            intercept_only: false,
        };
        assert_eq!(wd.build(&ctx()).name(), "Workday");

        let wdi = ProviderSpec::Workday {
            target: WorkdayTarget::new("acme"),
            facets: BTreeMap::new(),
            intercept_only: true,
        };
        assert_eq!(wdi.build(&ctx()).name(), "WorkdayIntercept");
    }

    #[test]
    fn json_id_accepts_strings_and_numbers_only() {
        assert_eq!(json_id(&json!(42)), Some("42".into()));
        assert_eq!(json_id(&json!(" R-12 ")), Some("R-12".into()));
        assert_eq!(json_id(&json!("")), None);
        assert_eq!(json_id(&json!(null)), None);
        assert_eq!(json_id(&json!({"id": 1})), None);
    }
}
