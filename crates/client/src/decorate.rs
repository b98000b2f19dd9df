// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound request decoration: bearer credentials and the loader opt-in.

use std::collections::HashMap;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use tracing::debug;

use crate::domain::SessionDomain;
use crate::error::ClientError;
use crate::store::CredentialStore;

/// Opt-in header for the loading indicator.
pub const SHOW_LOADER_HEADER: &str = "x-show-loader";

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub show_loader: bool,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_loader(mut self) -> Self {
        self.show_loader = true;
        self
    }

    /// Explicit `Authorization` header, if the caller set one.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(AUTHORIZATION.as_str()))
            .map(|(_, v)| v.as_str())
    }

    /// Tagged for the loader by flag or by an explicit `X-Show-Loader: 1`.
    pub fn wants_loader(&self) -> bool {
        self.show_loader
            || self
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case(SHOW_LOADER_HEADER) && v.trim() == "1")
    }
}

/// Last access token propagated by a successful refresh, per domain.
///
/// Used only when the credential store has nothing for the domain.
#[derive(Debug, Default)]
pub struct DefaultCredentials {
    tokens: RwLock<HashMap<SessionDomain, String>>,
}

impl DefaultCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: SessionDomain) -> Option<String> {
        self.tokens.read().get(&domain).cloned()
    }

    pub fn set(&self, domain: SessionDomain, token: String) {
        self.tokens.write().insert(domain, token);
    }

    pub fn clear(&self, domain: SessionDomain) {
        self.tokens.write().remove(&domain);
    }
}

/// Headers for one attempt, plus the access token that went out with them.
#[derive(Debug)]
pub struct Decorated {
    pub headers: HeaderMap,
    /// Bearer token attached by the decorator (`None` when the caller set
    /// its own `Authorization` or no credential was found).
    pub token: Option<String>,
}

/// Build the headers for one attempt.
///
/// `override_token` replaces any other credential (including an explicit
/// `Authorization`) on retries, so the retry carries exactly the token the
/// renewal produced.
pub fn decorate(
    config: &RequestConfig,
    domain: SessionDomain,
    store: &CredentialStore,
    defaults: &DefaultCredentials,
    override_token: Option<&str>,
) -> Result<Decorated, ClientError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("header {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("header {name}: {e}")))?;
        headers.append(name, value);
    }

    if config.wants_loader() && !headers.contains_key(SHOW_LOADER_HEADER) {
        headers.insert(SHOW_LOADER_HEADER, HeaderValue::from_static("1"));
    }

    let token = match override_token {
        Some(t) => Some(t.to_owned()),
        None if config.authorization().is_some() => return Ok(Decorated { headers, token: None }),
        None => store.get(domain).map(|p| p.access_token).or_else(|| defaults.get(domain)),
    };
    if let Some(ref t) = token {
        let value = HeaderValue::from_str(&format!("Bearer {t}"))
            .map_err(|e| ClientError::InvalidRequest(format!("bearer token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    } else {
        debug!(%domain, "no credential available, sending unauthenticated");
    }
    Ok(Decorated { headers, token })
}

#[cfg(test)]
#[path = "decorate_tests.rs"]
mod tests;
