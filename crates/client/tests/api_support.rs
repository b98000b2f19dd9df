// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock banking API for end-to-end client tests.
//!
//! Protected routes accept only bearer tokens in the valid set. The refresh
//! endpoint issues (or refuses) tokens per the configured behavior and counts
//! every call.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;

use coffer_client::cookie::MemoryCookieJar;
use coffer_client::kv::MemoryStore;
use coffer_client::loader::CountingLoader;
use coffer_client::terminate::MemoryNavigator;
use coffer_client::{AuthClient, ClientConfig};

/// What the refresh endpoint does with the next call.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    Issue { access: String, refresh: Option<String> },
    Reject(u16),
}

type Hook = Box<dyn FnOnce() + Send>;

pub struct ApiState {
    valid: Mutex<HashSet<String>>,
    refresh: Mutex<RefreshBehavior>,
    refresh_delay: Mutex<Duration>,
    refresh_calls: AtomicU32,
    /// `(path, bearer)` for every protected request.
    hits: Mutex<Vec<(String, Option<String>)>>,
    before_reply: Mutex<Option<Hook>>,
}

impl ApiState {
    pub fn accept(&self, token: &str) {
        self.valid.lock().insert(token.to_owned());
    }

    pub fn revoke(&self, token: &str) {
        self.valid.lock().remove(token);
    }

    pub fn on_refresh(&self, behavior: RefreshBehavior) {
        *self.refresh.lock() = behavior;
    }

    pub fn refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock() = delay;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens seen on `path`, in arrival order.
    pub fn hits(&self, path: &str) -> Vec<Option<String>> {
        self.hits.lock().iter().filter(|(p, _)| p == path).map(|(_, t)| t.clone()).collect()
    }

    /// Run `f` once, just before the next protected route answers.
    pub fn before_next_reply(&self, f: impl FnOnce() + Send + 'static) {
        *self.before_reply.lock() = Some(Box::new(f));
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn check(state: &ApiState, uri: &Uri, headers: &HeaderMap) -> bool {
    let token = bearer(headers);
    state.hits.lock().push((uri.path().to_owned(), token.clone()));
    let hook = state.before_reply.lock().take();
    if let Some(hook) = hook {
        hook();
    }
    token.is_some_and(|t| state.valid.lock().contains(&t))
}

async fn protected(
    State(state): State<Arc<ApiState>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    if check(&state, &uri, &headers) {
        (StatusCode::OK, Json(serde_json::json!({ "path": uri.path(), "ok": true })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": "invalid token" })))
    }
}

async fn always_unauthorized(
    State(state): State<Arc<ApiState>>,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    check(&state, &uri, &headers);
    StatusCode::UNAUTHORIZED
}

async fn refresh(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.refresh_delay.lock();
    tokio::time::sleep(delay).await;

    if body["refresh_token"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "missing" })));
    }
    let behavior = state.refresh.lock().clone();
    match behavior {
        RefreshBehavior::Issue { access, refresh } => {
            state.accept(&access);
            let mut out = serde_json::json!({ "access_token": access });
            if let Some(r) = refresh {
                out["refresh_token"] = serde_json::Value::String(r);
            }
            (StatusCode::OK, Json(out))
        }
        RefreshBehavior::Reject(status) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED),
            Json(serde_json::json!({ "error": "invalid_grant" })),
        ),
    }
}

/// Start the mock API. Refresh issues `renewed` until told otherwise.
pub async fn spawn_api() -> (SocketAddr, Arc<ApiState>) {
    let state = Arc::new(ApiState {
        valid: Mutex::new(HashSet::new()),
        refresh: Mutex::new(RefreshBehavior::Issue { access: "renewed".into(), refresh: None }),
        refresh_delay: Mutex::new(Duration::ZERO),
        refresh_calls: AtomicU32::new(0),
        hits: Mutex::new(Vec::new()),
        before_reply: Mutex::new(None),
    });

    let app = Router::new()
        .route("/api/v1/accounts", get(protected))
        .route("/api/v1/transfers", post(protected))
        .route("/api/v1/locked", get(always_unauthorized))
        .route("/api/v1/auth/login", post(always_unauthorized))
        .route("/auth/login", post(always_unauthorized))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/slow", get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "done"
        }))
        .route("/admin/users", get(protected))
        .route("/admin/auth/login", post(always_unauthorized))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (addr, state)
}

/// A client plus handles on its host seams.
pub struct Harness {
    pub client: AuthClient,
    pub kv: MemoryStore,
    pub cookies: MemoryCookieJar,
    pub nav: MemoryNavigator,
    pub loader: Arc<CountingLoader>,
}

pub fn harness(addr: SocketAddr, location: &str) -> anyhow::Result<Harness> {
    harness_with(ClientConfig::new(format!("http://{addr}")), location, MemoryStore::new())
}

/// Build a client on `kv`; pass a clone of another harness's store to model
/// a second context sharing persistent storage.
pub fn harness_with(
    config: ClientConfig,
    location: &str,
    kv: MemoryStore,
) -> anyhow::Result<Harness> {
    let cookies = MemoryCookieJar::new();
    let nav = MemoryNavigator::new(location);
    let loader = Arc::new(CountingLoader::new());
    let client = AuthClient::builder(config)
        .kv_store(Arc::new(kv.clone()))
        .cookie_jar(Arc::new(cookies.clone()))
        .navigator(Arc::new(nav.clone()))
        .loader(loader.clone())
        .build()?;
    Ok(Harness { client, kv, cookies, nav, loader })
}
