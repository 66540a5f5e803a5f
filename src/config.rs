use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::view::{Denylist, ViewOptions, DEFAULT_DENYLIST};

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings read from `config.json`, then overridden by environment variables
/// and finally by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub frontend_url: String,
    pub denylist: Vec<String>,
    pub honor_sort_by: bool,
    pub timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            honor_sort_by: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "applytrack") {
            proj_dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("applytrack.json")
        }
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("APPLYTRACK_API_URL").or_else(|| non_empty("REACT_APP_API_URL")) {
            self.api_url = Some(url);
        }
        if let Some(url) = non_empty("APPLYTRACK_FRONTEND_URL").or_else(|| non_empty("FRONTEND_URL")) {
            self.frontend_url = url;
        }
        if let Some(secs) = non_empty("APPLYTRACK_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(flag) = non_empty("APPLYTRACK_HONOR_SORT") {
            self.honor_sort_by = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Backend URL not configured. Set APPLYTRACK_API_URL, pass --api-url, or add \"api_url\" to {}",
                    Self::default_path().display()
                )
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::new(self.denylist.iter().cloned())
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            honor_sort_by: self.honor_sort_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.api_url.is_none());
        assert!(config.api_url().is_err());
        assert_eq!(config.denylist().len(), 6);
        assert!(!config.view_options().honor_sort_by);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("applytrack-test-does-not-exist.json");
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("applytrack-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "api_url": "http://localhost:5002", "denylist": ["Initech"], "honor_sort_by": true }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api_url().unwrap(), "http://localhost:5002");
        assert!(config.denylist().contains(Some("Initech")));
        assert!(!config.denylist().contains(Some("Tech Corp")));
        assert!(config.view_options().honor_sort_by);
        assert_eq!(config.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("applytrack-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Config::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("REACT_APP_API_URL", "https://abc.ngrok.app"),
            ("FRONTEND_URL", "https://tracker.example"),
            ("APPLYTRACK_TIMEOUT_SECS", "5"),
            ("APPLYTRACK_HONOR_SORT", "yes"),
        ]));
        assert_eq!(config.api_url().unwrap(), "https://abc.ngrok.app");
        assert_eq!(config.frontend_url, "https://tracker.example");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.honor_sort_by);
    }

    #[test]
    fn test_specific_env_var_wins_and_blank_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("APPLYTRACK_API_URL", "http://primary"),
            ("REACT_APP_API_URL", "http://fallback"),
            ("APPLYTRACK_FRONTEND_URL", "  "),
        ]));
        assert_eq!(config.api_url().unwrap(), "http://primary");
        assert_eq!(config.frontend_url, "http://localhost:3000");
    }
}
