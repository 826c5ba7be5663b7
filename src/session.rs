//! Session token storage
//!
//! The token lives in memory for every outbound request and is mirrored to a
//! small JSON key/value file so it survives restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::backend::api::BackendClient;
use crate::backend::error::Result;

/// Storage key holding the API token
pub const API_KEY: &str = "apiKey";

/// Shared handle to the current session token
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    api_key: Arc<RwLock<Option<String>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Session that is never persisted
    pub fn in_memory(api_key: Option<String>) -> Self {
        Self {
            api_key: Arc::new(RwLock::new(api_key.filter(|k| !k.is_empty()))),
            path: None,
        }
    }

    /// Open the store at `path`, reading any previously saved token
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let api_key = read_storage(&path)?.remove(API_KEY).filter(|k| !k.is_empty());
        tracing::debug!(
            "Session store at {:?} ({})",
            path,
            if api_key.is_some() { "token present" } else { "no token" }
        );

        Ok(Self {
            api_key: Arc::new(RwLock::new(api_key)),
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.api_key.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the token and persist it
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.persist(Some(&token))?;
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        Ok(())
    }

    /// Forget the token (logout)
    pub fn clear(&self) -> Result<()> {
        self.persist(None)?;
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn persist(&self, token: Option<&str>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut storage = read_storage(path)?;
        match token {
            Some(token) => storage.insert(API_KEY.to_string(), token.to_string()),
            None => storage.remove(API_KEY),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&storage)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

fn read_storage(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Exchange a passphrase for a token and store it in `session`
pub async fn login(client: &BackendClient, session: &SessionStore, passphrase: &str) -> Result<()> {
    let token = client.authenticate(passphrase).await?;
    session.set_token(token)?;
    tracing::info!("Authenticated with backend");
    Ok(())
}
