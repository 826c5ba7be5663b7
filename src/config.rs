//! Console configuration
//!
//! Loaded from `config.json` in the user config directory when present,
//! then overridden by environment variables.

use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::backend::error::Result;

pub const ORIGIN_ENV: &str = "INDEXER_CONSOLE_ORIGIN";
pub const DATA_DIR_ENV: &str = "INDEXER_CONSOLE_DATA_DIR";

const APP_DIR: &str = "indexer-console";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Origin the console addresses requests to
    pub origin: String,
    /// Origin of a frontend development server (host:port)
    pub dev_origin: String,
    /// Backend that requests are rewritten to when running from `dev_origin`
    pub dev_backend: String,
    /// Where the session store lives
    pub data_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            origin: "http://localhost:5060".to_string(),
            dev_origin: "localhost:3000".to_string(),
            dev_backend: "http://localhost:5060".to_string(),
            data_dir,
        }
    }
}

impl ConsoleConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// Load configuration from disk and environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                tracing::debug!("Loaded config from {:?}", path);
                serde_json::from_str(&content)?
            }
            _ => Self::default(),
        };

        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            config.origin = origin;
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Config pointing every request at `origin`
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Whether the console is being served from the development origin
    pub fn is_dev_origin(&self) -> bool {
        let Ok(url) = Url::parse(&self.origin) else {
            return false;
        };
        match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port) == self.dev_origin,
            _ => false,
        }
    }

    /// Absolute URL for a backend path such as `/xhr/indexers`
    pub fn resolve(&self, path: &str) -> String {
        let base = if self.is_dev_origin() {
            &self.dev_backend
        } else {
            &self.origin
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_same_origin() {
        let config = ConsoleConfig::with_origin("http://media.lan:5060/");
        assert_eq!(config.resolve("/xhr/indexers"), "http://media.lan:5060/xhr/indexers");
    }

    #[test]
    fn test_resolve_dev_origin_rewrites() {
        let config = ConsoleConfig::with_origin("http://localhost:3000");
        assert!(config.is_dev_origin());
        assert_eq!(config.resolve("/xhr/auth"), "http://localhost:5060/xhr/auth");
    }

    #[test]
    fn test_other_localhost_port_is_not_dev() {
        let config = ConsoleConfig::with_origin("http://localhost:8080");
        assert!(!config.is_dev_origin());
        assert_eq!(config.resolve("/xhr/auth"), "http://localhost:8080/xhr/auth");
    }
}
