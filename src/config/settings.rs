// src/config/settings.rs
//! Runtime settings. Resolution order: built-in defaults, then the TOML file
//! (`$SENTINEL_CONFIG` or `config/sentinel.toml` when present), then
//! individual env overrides.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discovery::state::StatePaths;

pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";

pub const ENV_WATCHERS_PATH: &str = "SENTINEL_WATCHERS_PATH";
pub const ENV_STATE_DIR: &str = "SENTINEL_STATE_DIR";
pub const ENV_HTTP_TIMEOUT: &str = "SENTINEL_HTTP_TIMEOUT_SECS";
pub const ENV_WORKDAY_TIMEOUT: &str = "SENTINEL_WORKDAY_TIMEOUT_SECS";
pub const ENV_NAV_TIMEOUT: &str = "SENTINEL_NAV_TIMEOUT_SECS";
pub const ENV_INTERCEPT_TIMEOUT: &str = "SENTINEL_INTERCEPT_TIMEOUT_SECS";
pub const ENV_CHROME_PATH: &str = "SENTINEL_CHROME_PATH";
pub const ENV_METRICS_PATH: &str = "SENTINEL_METRICS_PATH";

fn default_watchers_path() -> PathBuf {
    PathBuf::from("watchers.json")
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_http_timeout_secs() -> u64 {
    15
}
fn default_workday_timeout_secs() -> u64 {
    30
}
fn default_nav_timeout_secs() -> u64 {
    90
}
fn default_intercept_timeout_secs() -> u64 {
    150
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_watchers_path")]
    pub watchers_path: PathBuf,
    /// Directory holding `notified.json` and `jobs.json`.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Greenhouse / Lever / Ashby request timeout.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Per-page timeout of the Workday GET/POST channels.
    #[serde(default = "default_workday_timeout_secs")]
    pub workday_timeout_secs: u64,
    #[serde(default = "default_nav_timeout_secs")]
    pub nav_timeout_secs: u64,
    /// How long the interception channel waits for the feed response.
    #[serde(default = "default_intercept_timeout_secs")]
    pub intercept_timeout_secs: u64,
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    /// Prometheus textfile written after each run.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watchers_path: default_watchers_path(),
            state_dir: default_state_dir(),
            http_timeout_secs: default_http_timeout_secs(),
            workday_timeout_secs: default_workday_timeout_secs(),
            nav_timeout_secs: default_nav_timeout_secs(),
            intercept_timeout_secs: default_intercept_timeout_secs(),
            chrome_path: None,
            metrics_path: None,
        }
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// File (if any) plus env overrides.
    pub fn load() -> Result<Self> {
        let base = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from(&default)?
                } else {
                    Self::default()
                }
            }
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(p) = env_nonempty(ENV_WATCHERS_PATH) {
            self.watchers_path = PathBuf::from(p);
        }
        if let Some(p) = env_nonempty(ENV_STATE_DIR) {
            self.state_dir = PathBuf::from(p);
        }
        if let Some(v) = env_secs(ENV_HTTP_TIMEOUT)? {
            self.http_timeout_secs = v;
        }
        if let Some(v) = env_secs(ENV_WORKDAY_TIMEOUT)? {
            self.workday_timeout_secs = v;
        }
        if let Some(v) = env_secs(ENV_NAV_TIMEOUT)? {
            self.nav_timeout_secs = v;
        }
        if let Some(v) = env_secs(ENV_INTERCEPT_TIMEOUT)? {
            self.intercept_timeout_secs = v;
        }
        if let Some(p) = env_nonempty(ENV_CHROME_PATH) {
            self.chrome_path = Some(PathBuf::from(p));
        }
        if let Some(p) = env_nonempty(ENV_METRICS_PATH) {
            self.metrics_path = Some(PathBuf::from(p));
        }
        Ok(self)
    }

    pub fn state_paths(&self) -> StatePaths {
        StatePaths::in_dir(&self.state_dir)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn workday_timeout(&self) -> Duration {
        Duration::from_secs(self.workday_timeout_secs.max(1))
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs.max(1))
    }

    pub fn intercept_timeout(&self) -> Duration {
        Duration::from_secs(self.intercept_timeout_secs.max(1))
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(key: &str) -> Result<Option<u64>> {
    env_nonempty(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("{key} must be a whole number of seconds, got {v:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const ALL_ENV: [&str; 9] = [
        ENV_CONFIG_PATH,
        ENV_WATCHERS_PATH,
        ENV_STATE_DIR,
        ENV_HTTP_TIMEOUT,
        ENV_WORKDAY_TIMEOUT,
        ENV_NAV_TIMEOUT,
        ENV_INTERCEPT_TIMEOUT,
        ENV_CHROME_PATH,
        ENV_METRICS_PATH,
    ];

    fn clear_env() {
        for k in ALL_ENV {
            env::remove_var(k);
        }
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let s: Settings = toml::from_str(
            r#"
state_dir = "/var/lib/sentinel"
intercept_timeout_secs = 120
"#,
        )
        .unwrap();
        assert_eq!(s.state_dir, PathBuf::from("/var/lib/sentinel"));
        assert_eq!(s.intercept_timeout_secs, 120);
        assert_eq!(s.http_timeout_secs, 15);
        assert_eq!(s.watchers_path, PathBuf::from("watchers.json"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("watcher_path = \"x\"").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_values() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("sentinel.toml");
        fs::write(&p, "http_timeout_secs = 20\nstate_dir = \"from-file\"\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var(ENV_STATE_DIR, "from-env");
        let s = Settings::load().unwrap();
        assert_eq!(s.http_timeout_secs, 20);
        assert_eq!(s.state_dir, PathBuf::from("from-env"));
        assert_eq!(
            s.state_paths().notified,
            PathBuf::from("from-env").join("notified.json")
        );

        env::set_var(ENV_NAV_TIMEOUT, "soon");
        assert!(Settings::load().is_err());
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn missing_explicit_config_is_an_error() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(Settings::load().is_err());
        clear_env();
    }
}
