//! Settings loaded from an optional TOML file with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "page-spec-bridge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub rules_dir: PathBuf,
    /// Seconds between rule file change checks; 0 loads the rules once.
    pub rules_poll_secs: u64,
    pub max_input_chars: usize,
    pub preview_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-3-5-haiku-20241022".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 2000,
            temperature: 0.3,
            rules_dir: PathBuf::from("rules"),
            rules_poll_secs: 60,
            max_input_chars: 1000,
            preview_width: 960,
        }
    }
}

impl Settings {
    /// Loads `explicit` if given, else `page-spec-bridge.toml` when it exists,
    /// then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = var("PAGESPEC_MODEL") {
            self.model = model;
        }
        if let Some(url) = var("PAGESPEC_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = var("PAGESPEC_RULES_DIR") {
            self.rules_dir = PathBuf::from(dir);
        }
    }

    pub fn rules_poll_interval(&self) -> Option<Duration> {
        (self.rules_poll_secs > 0).then(|| Duration::from_secs(self.rules_poll_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::from_toml("model = \"claude-test\"\nrules_poll_secs = 0\n").unwrap();
        assert_eq!(settings.model, "claude-test");
        assert_eq!(settings.max_tokens, 2000);
        assert_eq!(settings.rules_poll_interval(), None);
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("PAGESPEC_MODEL", "claude-env"),
            ("PAGESPEC_BASE_URL", "  "),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::from_toml("model = \"claude-file\"").unwrap();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.model, "claude-env");
        assert_eq!(settings.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "max_tokens = \"many\"").unwrap();
        assert!(matches!(Settings::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(Settings::from_file(&missing), Err(ConfigError::Read { .. })));
    }
}
