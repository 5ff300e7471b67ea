use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".pulse-layout")
}
pub fn snapshot_file() -> PathBuf { data_dir().join("session.ron") }
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(data_dir)
        .join("pulse-layout")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// When false the remote store is never consulted and every read serves
    /// the built-in default layout.
    #[serde(default = "yes")]
    pub use_remote_layouts: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self { Self { use_remote_layouts: true } }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct RemoteSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteSettings {
    pub fn connect_timeout(&self) -> Duration { Duration::from_millis(self.connect_timeout_ms) }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if url.cannot_be_a_base() {
                    issues.push(format!("remote.base_url {:?} cannot be a base URL", self.base_url));
                }
            }
            Ok(url) => issues.push(format!(
                "remote.base_url must use http or https, got {:?}",
                url.scheme()
            )),
            Err(err) => issues.push(format!("remote.base_url {:?} is invalid: {err}", self.base_url)),
        }

        if self.connect_timeout_ms == 0 {
            issues.push("remote.connect_timeout_ms must be greater than 0".to_string());
        }
        if self.timeout_ms == 0 {
            issues.push("remote.timeout_ms must be greater than 0".to_string());
        }
        if self.timeout_ms < self.connect_timeout_ms {
            issues.push(format!(
                "remote.timeout_ms ({}) is shorter than remote.connect_timeout_ms ({})",
                self.timeout_ms, self.connect_timeout_ms
            ));
        }

        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: LayoutSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
}

fn yes() -> bool { true }
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_connect_timeout_ms() -> u64 { 2_000 }
fn default_timeout_ms() -> u64 { 10_000 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Reads `path` when it exists, otherwise returns the defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.settings.use_remote_layouts {
            issues.extend(self.remote.validate());
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn shipped_default_file_matches_defaults() {
        let cfg = Config::parse(include_str!("../../pulse-layout.default.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let cfg = Config::parse(
            r#"
            [settings]
            use_remote_layouts = false

            [remote]
            base_url = "https://budget.example.com/api/v1"
            "#,
        )
        .unwrap();
        assert!(!cfg.settings.use_remote_layouts);
        assert_eq!(cfg.remote.base_url, "https://budget.example.com/api/v1");
        assert_eq!(cfg.remote.timeout_ms, 10_000);
        assert_eq!(cfg.remote.connect_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::parse("[settings]\nuse_remote = true\n").unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validation_catches_bad_remote_settings() {
        let mut cfg = Config::default();
        cfg.remote.base_url = "ftp://example.com".into();
        cfg.remote.timeout_ms = 0;
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.contains("http or https")));
        assert!(issues.iter().any(|i| i.contains("timeout_ms must be greater than 0")));
    }

    #[test]
    fn remote_settings_are_ignored_when_remote_is_off() {
        let mut cfg = Config::default();
        cfg.settings.use_remote_layouts = false;
        cfg.remote.base_url = "not a url".into();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn save_then_read_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.settings.use_remote_layouts = false;
        cfg.remote.timeout_ms = 4_000;

        cfg.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::read_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
