// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session termination: clear a domain's credentials and send the user to
//! that domain's login page, without redirect loops.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::domain::SessionDomain;
use crate::store::CredentialStore;

/// The UI's current location and router.
pub trait Navigator: Send + Sync {
    /// Current location: path plus optional query (e.g. `/transfers?page=2`).
    fn location(&self) -> String;
    fn navigate(&self, target: &str);
}

/// Navigator backed by a string; records every navigation.
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    inner: Arc<Mutex<NavState>>,
}

#[derive(Debug)]
struct NavState {
    location: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NavState { location: location.into(), history: vec![] })),
        }
    }

    /// Move without recording a navigation (simulates the user browsing).
    pub fn set_location(&self, location: impl Into<String>) {
        self.inner.lock().location = location.into();
    }

    /// Every target passed to `navigate`, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.inner.lock().history.clone()
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> String {
        self.inner.lock().location.clone()
    }

    fn navigate(&self, target: &str) {
        let mut state = self.inner.lock();
        state.location = target.to_owned();
        state.history.push(target.to_owned());
    }
}

/// What the policy did after clearing credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Navigation was sent to the login route.
    Redirected(String),
    /// Already on the auth page, or the auth endpoint itself failed.
    Suppressed,
}

pub struct TerminationPolicy {
    navigator: Arc<dyn Navigator>,
    reason_max_len: usize,
    refresh_path: String,
}

impl TerminationPolicy {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        reason_max_len: usize,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self { navigator, reason_max_len, refresh_path: refresh_path.into() }
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Clear `domain` and redirect to its login page unless that would loop.
    pub fn terminate(
        &self,
        store: &CredentialStore,
        domain: SessionDomain,
        reason: Option<&str>,
        failing_path: &str,
    ) -> Termination {
        store.clear(domain);

        let location = self.navigator.location();
        if domain.is_auth_page(&location) || domain.is_auth_endpoint(failing_path, &self.refresh_path) {
            info!(%domain, %location, path = failing_path, "session cleared, redirect suppressed");
            return Termination::Suppressed;
        }

        let target = login_url(domain, &location, reason, self.reason_max_len);
        info!(%domain, %location, target = %target, "session terminated, redirecting to login");
        self.navigator.navigate(&target);
        Termination::Redirected(target)
    }
}

/// `<login_route>?next=<location>[&reason=<reason>]`, with the reason cut to
/// `max_len` characters.
pub fn login_url(
    domain: SessionDomain,
    location: &str,
    reason: Option<&str>,
    max_len: usize,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("next", location);
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        let truncated: String = reason.chars().take(max_len).collect();
        query.append_pair("reason", &truncated);
    }
    format!("{}?{}", domain.login_route(), query.finish())
}

#[cfg(test)]
#[path = "terminate_tests.rs"]
mod tests;
