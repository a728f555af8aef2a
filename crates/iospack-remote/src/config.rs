use crate::RemoteError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Upper bound for a whole artifact lookup, connect through body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl RemoteConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load config from `~/.config/iospack/remote.json`.
    pub fn load_default() -> Result<Self, RemoteError> {
        let path = default_config_path()?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| RemoteError::Config(format!("invalid remote config: {e}")))?;
        if config.url.trim().is_empty() {
            return Err(RemoteError::Config("remote url must not be empty".to_owned()));
        }
        if config.timeout_secs == 0 {
            return Err(RemoteError::Config(
                "remote timeout_secs must be greater than zero".to_owned(),
            ));
        }
        config.url = config.url.trim_end_matches('/').to_owned();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), RemoteError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_config_path() -> Result<PathBuf, RemoteError> {
    let home = std::env::var("HOME").map_err(|_| RemoteError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/iospack/remote.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");

        let config = RemoteConfig::new("https://build.example.com/api")
            .with_token("secret123")
            .with_timeout_secs(5);
        config.save(&path).unwrap();

        let loaded = RemoteConfig::load(&path).unwrap();
        assert_eq!(loaded.url, "https://build.example.com/api");
        assert_eq!(loaded.auth_token.as_deref(), Some("secret123"));
        assert_eq!(loaded.timeout_secs, 5);
    }

    #[test]
    fn config_strips_trailing_slash() {
        let config = RemoteConfig::new("https://example.com/");
        assert_eq!(config.url, "https://example.com");
    }

    #[test]
    fn config_file_defaults_timeout_and_strips_slash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, r#"{"url": "https://example.com/"}"#).unwrap();

        let loaded = RemoteConfig::load(&path).unwrap();
        assert_eq!(loaded.url, "https://example.com");
        assert_eq!(loaded.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(loaded.auth_token.is_none());
    }

    #[test]
    fn config_rejects_empty_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, r#"{"url": ""}"#).unwrap();
        assert!(matches!(
            RemoteConfig::load(&path),
            Err(RemoteError::Config(_))
        ));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, r#"{"url": "https://example.com", "timeout_secs": 0}"#).unwrap();
        match RemoteConfig::load(&path) {
            Err(RemoteError::Config(msg)) => assert!(msg.contains("timeout_secs"), "{msg}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn config_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, "url = nope").unwrap();
        assert!(matches!(
            RemoteConfig::load(&path),
            Err(RemoteError::Config(_))
        ));
    }
}
