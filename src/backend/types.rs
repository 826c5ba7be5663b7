//! Shared types for backend communication

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Config key carrying the indexer's base URL
pub const URL_KEY: &str = "url";

/// Config key carrying the enabled flag ("true"/"false")
pub const ENABLED_KEY: &str = "enabled";

/// An indexer known to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indexer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub settings: Vec<SettingDescriptor>,
    /// Feed kind (e.g. "torznab") to URL
    #[serde(default)]
    pub feeds: BTreeMap<String, String>,
    #[serde(default)]
    pub stats: Option<IndexerStats>,
}

impl Indexer {
    /// Whether the indexer declares a setting with this name
    pub fn has_setting(&self, name: &str) -> bool {
        self.settings.iter().any(|s| s.name == name)
    }

    pub fn torznab_feed(&self) -> Option<&str> {
        self.feeds.get("torznab").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerStats {
    pub source: String,
    pub modtime: String,
}

/// One configurable field of an indexer, as described by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: SettingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Input type of a setting. Types the console does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingKind {
    #[default]
    Text,
    Password,
    Email,
    Other(String),
}

impl SettingKind {
    pub fn as_str(&self) -> &str {
        match self {
            SettingKind::Text => "text",
            SettingKind::Password => "password",
            SettingKind::Email => "email",
            SettingKind::Other(kind) => kind,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, SettingKind::Password)
    }
}

impl From<String> for SettingKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => SettingKind::Text,
            "password" => SettingKind::Password,
            "email" => SettingKind::Email,
            _ => SettingKind::Other(value),
        }
    }
}

impl Serialize for SettingKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SettingKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SettingKind::from)
    }
}

/// Key/value settings of one indexer as stored by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, String>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn url(&self) -> Option<&str> {
        self.get(URL_KEY)
    }

    /// The enabled flag asserted by this config, if any
    pub fn enabled(&self) -> Option<bool> {
        match self.get(ENABLED_KEY)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.insert(ENABLED_KEY, if enabled { "true" } else { "false" });
    }

    /// Drop every key that is neither a setting of `indexer` nor reserved.
    /// Returns the dropped keys.
    pub fn retain_known(&mut self, indexer: &Indexer) -> Vec<String> {
        let mut dropped = Vec::new();
        self.0.retain(|key, _| {
            let known = key == URL_KEY || key == ENABLED_KEY || indexer.has_setting(key);
            if !known {
                dropped.push(key.clone());
            }
            known
        });
        dropped
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Config {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Search result from an indexer's torznab endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category: String,
    #[serde(default)]
    pub seeders: u64,
    #[serde(default)]
    pub peers: u64,
    #[serde(default)]
    pub site: String,
}

/// Backends report categories either as numeric ids or as names
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "Items", default)]
    pub items: Option<Vec<SearchResult>>,
}

/// Result of testing an indexer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub passphrase: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Error body returned by the backend on failures
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
