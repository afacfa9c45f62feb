// src/discovery/providers/workday/mapping.rs
//! Workday tenants disagree on field names; each field is resolved through an
//! ordered list of candidates.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::discovery::filter::clean_title;
use crate::discovery::providers::json_id;

pub const TITLE_FIELDS: [&str; 2] = ["title", "titleText"];
pub const ID_FIELDS: [&str; 3] = ["jobPostingId", "id", "externalPath"];

/// A posting reduced to what the adapter needs. `external_path` is kept apart
/// from the id because it also builds the public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkdayPosting {
    pub id: String,
    pub title: String,
    pub external_path: Option<String>,
}

fn first_of(posting: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| posting.get(*f).and_then(json_id))
}

/// `None` when no title or id candidate is present.
pub fn read_posting(posting: &Value) -> Option<WorkdayPosting> {
    let title = TITLE_FIELDS.iter().find_map(|f| {
        posting
            .get(*f)
            .and_then(Value::as_str)
            .map(clean_title)
            .filter(|t| !t.is_empty())
    })?;
    let id = first_of(posting, &ID_FIELDS)?;
    let external_path = posting
        .get("externalPath")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(WorkdayPosting {
        id,
        title,
        external_path,
    })
}

/// Extracts `jobPostings` from a feed body. A missing or null key is an empty
/// page; anything that is not a JSON object is a protocol error.
pub fn parse_feed(body: &str) -> Result<Vec<Value>> {
    let doc: Value = serde_json::from_str(body).context("parsing workday feed json")?;
    let Value::Object(mut map) = doc else {
        bail!("workday feed is not a json object");
    };
    match map.remove("jobPostings") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(postings)) => Ok(postings),
        Some(other) => bail!("jobPostings is not an array (got {})", type_name(&other)),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `site_root` is `{origin}/{locale}/{site}`; `externalPath` normally starts
/// with `/job/` already.
pub fn job_url(site_root: &str, external_path: Option<&str>) -> String {
    match external_path.map(str::trim) {
        Some(p) if p.starts_with("/job/") => format!("{site_root}{p}"),
        Some(p) if p.starts_with("job/") => format!("{site_root}/{p}"),
        Some(p) if !p.is_empty() => format!("{site_root}/job/{}", p.trim_start_matches('/')),
        _ => site_root.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_falls_back_to_title_text() {
        let p = read_posting(&json!({"titleText": "Finance Intern", "id": "x"})).unwrap();
        assert_eq!(p.title, "Finance Intern");
    }

    #[test]
    fn id_prefers_posting_id_then_id_then_external_path() {
        let full = json!({
            "title": "t", "jobPostingId": 77, "id": "b", "externalPath": "/job/c"
        });
        assert_eq!(read_posting(&full).unwrap().id, "77");

        let no_posting_id = json!({"title": "t", "id": "b", "externalPath": "/job/c"});
        assert_eq!(read_posting(&no_posting_id).unwrap().id, "b");

        let path_only = json!({"title": "t", "externalPath": "/job/NYC/Intern_R1"});
        let p = read_posting(&path_only).unwrap();
        assert_eq!(p.id, "/job/NYC/Intern_R1");
        assert_eq!(p.external_path.as_deref(), Some("/job/NYC/Intern_R1"));
    }

    #[test]
    fn postings_without_title_or_id_are_dropped() {
        assert!(read_posting(&json!({"id": "1"})).is_none());
        assert!(read_posting(&json!({"title": "Intern"})).is_none());
        assert!(read_posting(&json!({"title": "  ", "id": "1"})).is_none());
    }

    #[test]
    fn parse_feed_shapes() {
        assert_eq!(parse_feed(r#"{"jobPostings":[{"a":1}]}"#).unwrap().len(), 1);
        assert!(parse_feed(r#"{"total":0}"#).unwrap().is_empty());
        assert!(parse_feed(r#"{"jobPostings":null}"#).unwrap().is_empty());
        assert!(parse_feed(r#"[1,2]"#).is_err());
        assert!(parse_feed(r#"{"jobPostings":"nope"}"#).is_err());
        assert!(parse_feed("<!doctype html>").is_err());
    }

    #[test]
    fn job_url_joins_external_path() {
        let root = "https://acme.wd5.myworkdayjobs.com/en-US/External";
        assert_eq!(
            job_url(root, Some("/job/NYC/Intern_R1")),
            "https://acme.wd5.myworkdayjobs.com/en-US/External/job/NYC/Intern_R1"
        );
        assert_eq!(
            job_url(root, Some("NYC/Intern_R1")),
            "https://acme.wd5.myworkdayjobs.com/en-US/External/job/NYC/Intern_R1"
        );
        assert_eq!(job_url(root, None), root);
    }
}
