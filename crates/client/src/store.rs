// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential store: per-domain token pairs in persistent storage and cookies.
//!
//! Never fails. Storage errors are logged and read as "no credential".

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cookie::{Cookie, CookieJar};
use crate::domain::{SessionDomain, COMPOSITE_SESSION_KEY};
use crate::kv::KvStore;

/// Access token plus (optionally) the refresh token that renews it.
///
/// Also the body of a successful refresh response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: Some(refresh_token.into()) }
    }

    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: None }
    }
}

/// Composite persisted session object, `{"state": {...}}`.
#[derive(Debug, Deserialize)]
struct CompositeSession {
    state: CompositeState,
}

#[derive(Debug, Deserialize)]
struct CompositeState {
    #[serde(default, alias = "accessToken")]
    access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
}

/// Reads and writes credentials for both session domains.
pub struct CredentialStore {
    kv: Arc<dyn KvStore>,
    cookies: Arc<dyn CookieJar>,
    cookie_max_age: Duration,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KvStore>, cookies: Arc<dyn CookieJar>, cookie_max_age: Duration) -> Self {
        Self { kv, cookies, cookie_max_age }
    }

    /// Current credential for `domain`.
    ///
    /// Falls back through the domain's storage keys, the composite session
    /// object (user domain only), then the domain cookie.
    pub fn get(&self, domain: SessionDomain) -> Option<TokenPair> {
        if let Some(access_token) = self.read(&domain.access_token_key()) {
            let refresh_token = self.refresh_token(domain);
            return Some(TokenPair { access_token, refresh_token });
        }
        if let Some(composite) = self.composite(domain) {
            if let Some(access_token) = non_empty(composite.access_token) {
                let refresh_token = non_empty(composite.refresh_token);
                return Some(TokenPair { access_token, refresh_token });
            }
        }
        let access_token = non_empty(self.cookies.get(domain.cookie_name()))?;
        debug!(%domain, "credential resolved from cookie");
        Some(TokenPair::access_only(access_token))
    }

    /// Refresh token for `domain`: storage key first, then the composite object.
    pub fn refresh_token(&self, domain: SessionDomain) -> Option<String> {
        self.read(&domain.refresh_token_key())
            .or_else(|| self.composite(domain).and_then(|c| non_empty(c.refresh_token)))
    }

    /// Store a pair, refresh the cookie and stamp the refresh time.
    ///
    /// A pair without a refresh token keeps the stored refresh token.
    pub fn set(&self, domain: SessionDomain, pair: &TokenPair) {
        self.write(&domain.access_token_key(), &pair.access_token);
        if let Some(ref refresh) = pair.refresh_token {
            self.write(&domain.refresh_token_key(), refresh);
        }
        self.cookies.set(Cookie::new(
            domain.cookie_name(),
            pair.access_token.clone(),
            self.cookie_max_age,
        ));
        self.write(&domain.updated_at_key(), &epoch_ms(SystemTime::now()).to_string());
    }

    /// Store a pair in place of whatever `domain` held, including any
    /// refresh token or composite session left by an earlier login.
    pub fn replace(&self, domain: SessionDomain, pair: &TokenPair) {
        self.clear(domain);
        self.set(domain, pair);
    }

    /// Remove every trace of `domain`'s credentials. The other domain is untouched.
    pub fn clear(&self, domain: SessionDomain) {
        let mut keys =
            vec![domain.access_token_key(), domain.refresh_token_key(), domain.updated_at_key()];
        if domain == SessionDomain::User {
            keys.push(COMPOSITE_SESSION_KEY.to_owned());
        }
        for key in &keys {
            if let Err(e) = self.kv.remove(key) {
                warn!(%domain, key, "failed to clear credential: {e:#}");
            }
        }
        self.cookies.set(Cookie::expired(domain.cookie_name()));
    }

    /// When `domain`'s credentials were last written by any context.
    pub fn last_refreshed(&self, domain: SessionDomain) -> Option<SystemTime> {
        let raw = self.read(&domain.updated_at_key())?;
        let ms = raw.parse::<u64>().ok()?;
        Some(UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// A stored access token newer than `used`, written within `window`.
    ///
    /// This is how a context notices that another context already refreshed.
    pub fn recent_token(
        &self,
        domain: SessionDomain,
        used: Option<&str>,
        window: Duration,
    ) -> Option<String> {
        let updated = self.last_refreshed(domain)?;
        let age = SystemTime::now().duration_since(updated).unwrap_or_default();
        if age > window {
            return None;
        }
        let stored = self.read(&domain.access_token_key())?;
        if used == Some(stored.as_str()) {
            return None;
        }
        Some(stored)
    }

    fn composite(&self, domain: SessionDomain) -> Option<CompositeState> {
        if domain != SessionDomain::User {
            return None;
        }
        let raw = self.read(COMPOSITE_SESSION_KEY)?;
        match serde_json::from_str::<CompositeSession>(&raw) {
            Ok(session) => Some(session.state),
            Err(e) => {
                warn!(key = COMPOSITE_SESSION_KEY, "unreadable persisted session: {e}");
                None
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => non_empty(value),
            Err(e) => {
                warn!(key, "credential storage unavailable: {e:#}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.kv.set(key, value) {
            warn!(key, "failed to persist credential: {e:#}");
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
