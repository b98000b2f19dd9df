// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authenticated client: one entry point for every API call.
//!
//! Each call runs decorate → send → classify, then carries out the decision:
//! adopt another context's token, renew through the [`RefreshCoordinator`],
//! terminate the session, or surface the failure. A logical request is
//! re-issued at most twice.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{after_refresh_failure, classify, Attempt, Decision, Outcome, RejectReason};
use crate::config::ClientConfig;
use crate::cookie::{CookieJar, MemoryCookieJar};
use crate::decorate::{decorate, DefaultCredentials, RequestConfig};
use crate::domain::SessionDomain;
use crate::error::ClientError;
use crate::kv::{KvStore, MemoryStore};
use crate::loader::{LoaderSignal, LoaderTicket, NoopLoader};
use crate::refresh::RefreshCoordinator;
use crate::store::{CredentialStore, TokenPair};
use crate::terminate::{MemoryNavigator, Navigator, Termination, TerminationPolicy};

/// A response with a 2xx status, fully read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn into_status_error(self) -> ClientError {
        ClientError::Status { status: self.status, body: self.text() }
    }
}

/// Wires the host environment into an [`AuthClient`].
///
/// Every seam defaults to an in-memory implementation.
pub struct AuthClientBuilder {
    config: ClientConfig,
    kv: Option<Arc<dyn KvStore>>,
    cookies: Option<Arc<dyn CookieJar>>,
    navigator: Option<Arc<dyn Navigator>>,
    loader: Option<Arc<dyn LoaderSignal>>,
    http: Option<reqwest::Client>,
}

impl AuthClientBuilder {
    pub fn kv_store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn cookie_jar(mut self, cookies: Arc<dyn CookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn LoaderSignal>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Use a preconfigured HTTP client instead of building one from the config.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<AuthClient, ClientError> {
        crate::ensure_crypto_provider();
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.config.timeout())
                .build()
                .map_err(|e| ClientError::InvalidRequest(format!("http client: {e}")))?,
        };

        let store = Arc::new(CredentialStore::new(
            self.kv.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            self.cookies.unwrap_or_else(|| Arc::new(MemoryCookieJar::new())),
            self.config.cookie_max_age(),
        ));
        let defaults = Arc::new(DefaultCredentials::new());
        let coordinator = RefreshCoordinator::new(
            http.clone(),
            self.config.url(&self.config.refresh_path),
            Arc::clone(&store),
            Arc::clone(&defaults),
        );
        let policy = TerminationPolicy::new(
            self.navigator.unwrap_or_else(|| Arc::new(MemoryNavigator::new("/"))),
            self.config.reason_max_len,
            self.config.refresh_path.clone(),
        );

        Ok(AuthClient {
            inner: Arc::new(Inner {
                config: self.config,
                http,
                store,
                defaults,
                coordinator,
                policy,
                loader: self.loader.unwrap_or_else(|| Arc::new(NoopLoader)),
            }),
        })
    }
}

struct Inner {
    config: ClientConfig,
    http: reqwest::Client,
    store: Arc<CredentialStore>,
    defaults: Arc<DefaultCredentials>,
    coordinator: RefreshCoordinator,
    policy: TerminationPolicy,
    loader: Arc<dyn LoaderSignal>,
}

/// Authenticated API client. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

impl AuthClient {
    pub fn builder(config: ClientConfig) -> AuthClientBuilder {
        AuthClientBuilder {
            config,
            kv: None,
            cookies: None,
            navigator: None,
            loader: None,
            http: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        self.inner.policy.navigator()
    }

    /// Persist a freshly issued token pair for `domain`, replacing any
    /// earlier session outright.
    pub fn login(&self, domain: SessionDomain, pair: &TokenPair) {
        self.inner.store.replace(domain, pair);
        self.inner.defaults.set(domain, pair.access_token.clone());
        debug!(%domain, "session established");
    }

    /// Drop `domain`'s credentials without navigating anywhere.
    pub fn logout(&self, domain: SessionDomain) {
        self.inner.store.clear(domain);
        self.inner.defaults.clear(domain);
        debug!(%domain, "session cleared by logout");
    }

    pub async fn get(&self, path: &str, config: RequestConfig) -> Result<ApiResponse, ClientError> {
        self.request(Method::GET, path, None, config).await
    }

    pub async fn delete(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse, ClientError> {
        self.request(Method::DELETE, path, None, config).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<ApiResponse, ClientError> {
        self.request(Method::POST, path, Some(encode(body)?), config).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<ApiResponse, ClientError> {
        self.request(Method::PUT, path, Some(encode(body)?), config).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: RequestConfig,
    ) -> Result<ApiResponse, ClientError> {
        self.request(Method::PATCH, path, Some(encode(body)?), config).await
    }

    /// Issue one logical request. `body` is a pre-encoded JSON payload,
    /// re-sent unchanged on retries.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        config: RequestConfig,
    ) -> Result<ApiResponse, ClientError> {
        let domain = SessionDomain::resolve(path);
        let loader = config.wants_loader().then(|| {
            LoaderTicket::start(Arc::clone(&self.inner.loader), self.inner.config.loader_timeout())
        });

        let result = self.execute(&method, path, body.as_ref(), &config, domain).await;

        if let Some(loader) = loader {
            loader.finish();
        }
        result
    }

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Bytes>,
        config: &RequestConfig,
        domain: SessionDomain,
    ) -> Result<ApiResponse, ClientError> {
        let inner = &self.inner;
        let mut attempt = Attempt::default();
        let mut override_token: Option<String> = None;

        loop {
            let decorated = decorate(
                config,
                domain,
                &inner.store,
                &inner.defaults,
                override_token.as_deref(),
            )?;
            let used = decorated.token;
            debug!(%method, path, %domain, retries = attempt.retries(), "sending request");

            // No response at all surfaces as a transport error.
            let response = self.send_once(method, path, body, config, decorated.headers).await?;
            if response.is_success() {
                return Ok(response);
            }

            let status = response.status;
            let mut outcome = Outcome {
                status: Some(status),
                path,
                refresh_path: &inner.config.refresh_path,
                domain,
                ui_domain: SessionDomain::resolve(&inner.policy.navigator().location()),
                attempt,
                fresher_token: self.fresher_token(domain, used.as_deref()),
            };

            match classify(&outcome) {
                Decision::PassThrough => return Err(response.into_status_error()),
                Decision::Reject(RejectReason::CrossDomain) => {
                    warn!(%domain, ui = %outcome.ui_domain, status, path, "auth failure outside the active context");
                    return Err(ClientError::CrossDomain { domain, status });
                }
                Decision::Adopt(token) => {
                    debug!(%domain, path, "adopting token renewed by another context");
                    attempt.adopted = true;
                    override_token = Some(token);
                }
                Decision::Refresh => {
                    attempt.refreshed = true;
                    match inner.coordinator.refresh(domain).await {
                        Ok(pair) => override_token = Some(pair.access_token),
                        Err(e) => {
                            outcome.attempt = attempt;
                            outcome.fresher_token = self.fresher_token(domain, used.as_deref());
                            match after_refresh_failure(&outcome, &e) {
                                Decision::Adopt(token) => {
                                    debug!(%domain, path, "renewal failed, adopting token from another context");
                                    attempt.adopted = true;
                                    override_token = Some(token);
                                }
                                Decision::PassThrough => {
                                    return Err(ClientError::Transport(e.to_string()));
                                }
                                _ => return Err(self.terminate(domain, status, path, &e.to_string())),
                            }
                        }
                    }
                }
                Decision::Terminate => {
                    let reason = if attempt.refreshed {
                        "authentication failed after token renewal"
                    } else {
                        "authentication failed"
                    };
                    return Err(self.terminate(domain, status, path, reason));
                }
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Bytes>,
        config: &RequestConfig,
        mut headers: HeaderMap,
    ) -> Result<ApiResponse, ClientError> {
        let inner = &self.inner;
        let mut url = reqwest::Url::parse(&inner.config.url(path))
            .map_err(|e| ClientError::InvalidRequest(format!("url for {path}: {e}")))?;
        if !config.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(config.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let mut req = inner.http.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            req = req.body(body.clone());
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(ApiResponse { status, headers, body })
    }

    fn fresher_token(&self, domain: SessionDomain, used: Option<&str>) -> Option<String> {
        self.inner.store.recent_token(domain, used, self.inner.config.recency_window())
    }

    fn terminate(
        &self,
        domain: SessionDomain,
        status: u16,
        path: &str,
        reason: &str,
    ) -> ClientError {
        self.inner.defaults.clear(domain);
        match self.inner.policy.terminate(&self.inner.store, domain, Some(reason), path) {
            Termination::Redirected(target) => ClientError::SessionExpired {
                domain,
                reason: reason.to_owned(),
                redirect: Some(target),
            },
            Termination::Suppressed => ClientError::LoopGuard { domain, status },
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes, ClientError> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|e| ClientError::InvalidRequest(format!("body: {e}")))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
