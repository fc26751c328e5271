//! [`FakeConsul`] HTTP agent for adapter and end-to-end tests.
//!
//! Serves the `/v1/kv` subset that `ConsulStore` speaks, on an ephemeral
//! localhost port, backed by a [`MemoryStore`]. The server runs on its own
//! thread with a single-threaded tokio runtime so blocking test code can
//! call it directly.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use kvsync_store::{KvStore, MemoryStore, ModifyIndex, StoreEntry};

const TOKEN_HEADER: &str = "x-consul-token";

/// One request as the agent saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone)]
struct AgentState {
    store: Arc<MemoryStore>,
    token: Option<String>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl AgentState {
    fn record(&self, request: AgentRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
    }
}

#[derive(Debug, Default, Deserialize)]
struct KvQuery {
    recurse: Option<String>,
    cas: Option<u64>,
}

/// A running fake agent. Stops serving when dropped.
pub struct FakeConsul {
    address: SocketAddr,
    state: AgentState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeConsul {
    /// Serve `store` without ACLs.
    ///
    /// # Panics
    /// Panics if no localhost port can be bound.
    pub fn start(store: MemoryStore) -> Self {
        Self::spawn(store, None)
    }

    /// Serve `store`, answering 403 to requests without `token`.
    pub fn with_token(store: MemoryStore, token: &str) -> Self {
        Self::spawn(store, Some(token.to_string()))
    }

    fn spawn(store: MemoryStore, token: Option<String>) -> Self {
        let state = AgentState {
            store: Arc::new(store),
            token,
            requests: Arc::default(),
        };

        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap_or_else(|e| panic!("FakeConsul: failed to bind: {e}"));
        listener
            .set_nonblocking(true)
            .unwrap_or_else(|e| panic!("FakeConsul: failed to set non-blocking: {e}"));
        let address = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("FakeConsul: no local address: {e}"));

        let app = Router::new()
            .route("/v1/kv/", any(kv_root))
            .route("/v1/kv/{*key}", any(kv_key))
            .with_state(state.clone());
        let (shutdown, signal) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap_or_else(|e| panic!("FakeConsul: failed to build runtime: {e}"));
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)
                    .unwrap_or_else(|e| panic!("FakeConsul: failed to adopt listener: {e}"));
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = signal.await;
                    })
                    .await;
            });
        });

        Self {
            address,
            state,
            shutdown: Some(shutdown),
        }
    }

    /// `host:port` to hand to a store config.
    pub fn address(&self) -> String {
        self.address.to_string()
    }

    /// The backing store, for seeding data or simulating other writers.
    pub fn store(&self) -> &MemoryStore {
        &self.state.store
    }

    /// Every request served so far, in arrival order.
    pub fn requests(&self) -> Vec<AgentRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Drop for FakeConsul {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn kv_root(
    State(state): State<AgentState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<KvQuery>,
    body: Bytes,
) -> Response {
    handle(&state, &method, "", &uri, &headers, &query, &body)
}

async fn kv_key(
    State(state): State<AgentState>,
    Path(key): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<KvQuery>,
    body: Bytes,
) -> Response {
    handle(&state, &method, &key, &uri, &headers, &query, &body)
}

fn handle(
    state: &AgentState,
    method: &Method,
    key: &str,
    uri: &Uri,
    headers: &HeaderMap,
    query: &KvQuery,
    body: &[u8],
) -> Response {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.record(AgentRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        token: token.clone(),
    });

    if let Some(expected) = &state.token {
        if token.as_deref() != Some(expected.as_str()) {
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
    }

    let store = state.store.as_ref();
    let result = match *method {
        Method::GET => read(store, key, query.recurse.is_some()),
        Method::PUT => write(store, key, body, query.cas),
        Method::DELETE => remove(store, key, query.cas),
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    result.unwrap_or_else(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response())
}

fn read(store: &MemoryStore, key: &str, recurse: bool) -> kvsync_store::Result<Response> {
    let entries: Vec<StoreEntry> = if recurse {
        store.list(key)?
    } else {
        store.get(key)?.into_iter().collect()
    };
    if entries.is_empty() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    let pairs: Vec<Value> = entries.iter().map(pair_json).collect();
    Ok(Json(pairs).into_response())
}

fn write(store: &MemoryStore, key: &str, body: &[u8], cas: Option<u64>) -> kvsync_store::Result<Response> {
    let written = match cas {
        Some(index) => store.compare_and_swap(key, body, ModifyIndex(index))?,
        None => {
            store.put(key, body)?;
            true
        }
    };
    Ok(Json(written).into_response())
}

fn remove(store: &MemoryStore, key: &str, cas: Option<u64>) -> kvsync_store::Result<Response> {
    let removed = match cas {
        Some(index) => store.compare_and_delete(key, ModifyIndex(index))?,
        None => match store.get(key)? {
            Some(entry) => store.compare_and_delete(key, entry.version)?,
            None => true,
        },
    };
    Ok(Json(removed).into_response())
}

/// Consul encodes values as base64 and empty values as `null`.
fn pair_json(entry: &StoreEntry) -> Value {
    let value = if entry.value.is_empty() {
        Value::Null
    } else {
        Value::String(STANDARD.encode(&entry.value))
    };
    json!({
        "Key": entry.key,
        "Value": value,
        "Flags": 0,
        "LockIndex": 0,
        "CreateIndex": entry.version.0,
        "ModifyIndex": entry.version.0,
    })
}
