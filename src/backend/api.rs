//! HTTP client for the indexer backend API

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::error::{ConsoleError, Result};
use super::types::{AuthRequest, AuthResponse, Config, ErrorBody, Indexer, TestOutcome};
use crate::config::ConsoleConfig;
use crate::session::SessionStore;

const JSON: &str = "application/json";

/// Client for communicating with the indexer backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: ConsoleConfig,
    session: SessionStore,
}

impl BackendClient {
    pub fn new(config: ConsoleConfig, session: SessionStore) -> Self {
        Self {
            client: Client::new(),
            config,
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build an authorized request for a backend path
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .session
            .token()
            .ok_or_else(|| ConsoleError::Auth("No session token".to_string()))?;
        let url = self.config.resolve(path);
        tracing::debug!("{} {}", method, path);

        Ok(self
            .client
            .request(method, url)
            .header(ACCEPT, JSON)
            .header(AUTHORIZATION, format!("apitoken {}", token)))
    }

    /// Exchange a passphrase for an API token
    pub async fn authenticate(&self, passphrase: &str) -> Result<String> {
        let url = self.config.resolve("/xhr/auth");
        tracing::debug!("POST /xhr/auth");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .json(&AuthRequest { passphrase })
            .send()
            .await?;

        let reply: AuthResponse = read_json(check(response).await?).await?;
        Ok(reply.token)
    }

    /// List every indexer the backend knows about
    pub async fn list_indexers(&self) -> Result<Vec<Indexer>> {
        let response = self.request(Method::GET, "/xhr/indexers")?.send().await?;
        read_json(check(response).await?).await
    }

    /// Fetch the current configuration of one indexer
    pub async fn fetch_config(&self, indexer_id: &str) -> Result<Config> {
        let path = format!("/xhr/indexers/{}/config", indexer_id);
        let response = self.request(Method::GET, &path)?.send().await?;
        read_json(check(response).await?).await
    }

    /// Patch the configuration of one indexer. The backend merges the keys.
    pub async fn patch_config(&self, indexer_id: &str, patch: &Config) -> Result<()> {
        let path = format!("/xhr/indexers/{}/config", indexer_id);
        let response = self
            .request(Method::PATCH, &path)?
            .header(CONTENT_TYPE, JSON)
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Ask the backend to run a test query against an indexer
    pub async fn test_indexer(&self, indexer_id: &str) -> Result<TestOutcome> {
        let path = format!("/xhr/indexers/{}/test", indexer_id);
        let response = self.request(Method::GET, &path)?.send().await?;
        read_json(check(response).await?).await
    }
}

/// Turn a non-2xx response into the matching error
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_text = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).ok().map(|b| b.error);
    tracing::warn!("Backend returned {}: {}", status, message.as_deref().unwrap_or(&status_text));

    Err(match (status.as_u16(), message) {
        (401, message) => ConsoleError::Auth(message.unwrap_or(status_text)),
        (_, Some(message)) => ConsoleError::Backend(message),
        (_, None) => ConsoleError::Network(status_text),
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_authenticate_returns_token() {
        let backend = FakeBackend::start().await;
        let client = BackendClient::new(backend.config(), SessionStore::in_memory(None));

        let token = client.authenticate("secret").await.unwrap();
        assert_eq!(token, "abc");

        let request = backend.requests().pop().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/xhr/auth");
        assert!(request.authorization.is_none());
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_wrong_passphrase_is_auth_error() {
        let backend = FakeBackend::start().await;
        let client = BackendClient::new(backend.config(), SessionStore::in_memory(None));

        match client.authenticate("nope").await {
            Err(ConsoleError::Auth(message)) => assert_eq!(message, "Incorrect passphrase"),
            other => panic!("Expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_requests_need_a_token() {
        let backend = FakeBackend::start().await;
        let client = BackendClient::new(backend.config(), SessionStore::in_memory(None));

        assert!(client.list_indexers().await.unwrap_err().is_auth());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_error_without_body_uses_status_text() {
        let backend = FakeBackend::start().await;
        let client = BackendClient::new(backend.config(), SessionStore::in_memory(Some("abc".into())));

        match client.fetch_config("broken").await {
            Err(ConsoleError::Network(message)) => assert_eq!(message, "Internal Server Error"),
            other => panic!("Expected network error, got {:?}", other),
        }
    }
}
