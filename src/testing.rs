//! In-process fake backend used by the async tests

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Notify;

use crate::backend::types::{Config, Indexer};
use crate::config::ConsoleConfig;

pub const PASSPHRASE: &str = "secret";
pub const TOKEN: &str = "abc";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct FakeState {
    indexers: Mutex<Vec<Indexer>>,
    configs: Mutex<BTreeMap<String, Config>>,
    requests: Mutex<Vec<RecordedRequest>>,
    patch_bodies: Mutex<Vec<Config>>,
    patch_gate: Mutex<Option<Arc<Notify>>>,
}

pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        *state.indexers.lock().unwrap() = seed_indexers();
        state.configs.lock().unwrap().insert(
            "example".to_string(),
            [("username", "bob"), ("url", "https://example.org/")].into_iter().collect(),
        );

        let app = Router::new()
            .route("/xhr/auth", axum::routing::post(auth))
            .route("/xhr/indexers", get(list_indexers))
            .route("/xhr/indexers/:id/config", get(get_config).patch(patch_config))
            .route("/xhr/indexers/:id/test", get(test_indexer))
            .route("/torznab/:id/api", get(torznab_api))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn config(&self) -> ConsoleConfig {
        ConsoleConfig::with_origin(format!("http://{}", self.addr))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn patch_bodies(&self) -> Vec<Config> {
        self.state.patch_bodies.lock().unwrap().clone()
    }

    /// Hold every PATCH until the returned gate is notified
    pub fn gate_patches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.state.patch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

fn seed_indexers() -> Vec<Indexer> {
    serde_json::from_value(json!([
        {
            "id": "example",
            "name": "Example",
            "enabled": false,
            "settings": [
                {"name": "username", "label": "Username", "type": "text"},
                {"name": "password", "label": "Password", "type": "password"}
            ],
            "feeds": {"torznab": "http://localhost:5060/torznab/example"}
        },
        {
            "id": "bithdtv",
            "name": "BIT-HDTV",
            "enabled": true,
            "settings": [{"name": "cookie", "label": "Cookie", "type": "text"}],
            "feeds": {"torznab": "http://localhost:5060/torznab/bithdtv"}
        },
        {
            "id": "flaky",
            "name": "Flaky",
            "enabled": true,
            "settings": [],
            "feeds": {}
        }
    ]))
    .unwrap()
}

async fn record(State(state): State<Arc<FakeState>>, request: Request, next: Next) -> Response {
    // Body is not Sync; no borrow of the request may live across the await
    let recorded = {
        let header = |name| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            authorization: header(AUTHORIZATION),
            accept: header(axum::http::header::ACCEPT),
            content_type: header(CONTENT_TYPE),
        }
    };
    state.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("apitoken {}", TOKEN))
        .unwrap_or(false)
}

async fn auth(Json(body): Json<serde_json::Value>) -> Response {
    if body["passphrase"] == PASSPHRASE {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Incorrect passphrase")
    }
}

async fn list_indexers(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }
    Json(state.indexers.lock().unwrap().clone()).into_response()
}

async fn get_config(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }
    if id == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let config = state.configs.lock().unwrap().get(&id).cloned().unwrap_or_default();
    Json(config).into_response()
}

async fn patch_config(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Config>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }

    let gate = state.patch_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    state.patch_bodies.lock().unwrap().push(patch.clone());
    if patch.url() == Some("http://unreachable") {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to reach indexer");
    }

    let mut configs = state.configs.lock().unwrap();
    let config = configs.entry(id.clone()).or_default();
    for (key, value) in patch.iter() {
        config.insert(key, value);
    }
    if let Some(enabled) = patch.enabled() {
        for indexer in state.indexers.lock().unwrap().iter_mut() {
            if indexer.id == id {
                indexer.enabled = enabled;
            }
        }
    }
    StatusCode::OK.into_response()
}

async fn test_indexer(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }
    if id == "flaky" {
        Json(json!({ "ok": false, "error": "timeout" })).into_response()
    } else {
        Json(json!({ "ok": true })).into_response()
    }
}

async fn torznab_api(
    Path(id): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    if !matches!(params.get("apikey").map(String::as_str), Some("k") | Some(TOKEN)) {
        return error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }
    if id == "missing" {
        return error(StatusCode::NOT_FOUND, "Unknown indexer");
    }

    let query = params.get("q").cloned().unwrap_or_default();
    Json(json!({
        "Items": [
            {"Title": format!("{} 1080p", query), "Link": "http://example.org/1.torrent",
             "Size": 1572864, "Category": 5040, "Seeders": 12, "Peers": 20, "Site": id},
            {"Title": format!("{} 720p", query), "Link": "magnet:?xt=urn:btih:abc",
             "Size": 1024, "Category": 5030, "Seeders": 3, "Peers": 4, "Site": id}
        ]
    }))
    .into_response()
}
