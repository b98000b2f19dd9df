// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token renewal.
//!
//! At most one refresh call per session domain is in flight. Callers that
//! need a renewal while one is running join its [`Ticket`] instead of
//! issuing another network call; everyone observes the same outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::decorate::DefaultCredentials;
use crate::domain::SessionDomain;
use crate::error::RefreshError;
use crate::store::{CredentialStore, TokenPair};

/// A renewal in flight. Cloning joins it.
pub type Ticket = Shared<BoxFuture<'static, Result<TokenPair, RefreshError>>>;

struct Slot {
    id: u64,
    ticket: Ticket,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

struct Inner {
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<CredentialStore>,
    defaults: Arc<DefaultCredentials>,
    tickets: Mutex<HashMap<SessionDomain, Slot>>,
    next_id: AtomicU64,
    calls: AtomicU32,
}

/// Owns the per-domain ticket map.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        refresh_url: String,
        store: Arc<CredentialStore>,
        defaults: Arc<DefaultCredentials>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                refresh_url,
                store,
                defaults,
                tickets: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                calls: AtomicU32::new(0),
            }),
        }
    }

    /// Renew `domain`'s access token, joining an in-flight renewal if any.
    pub async fn refresh(&self, domain: SessionDomain) -> Result<TokenPair, RefreshError> {
        let ticket = self.ticket(domain)?;
        ticket.await
    }

    /// Join the current ticket or register a new one.
    ///
    /// Registration happens under the lock before anything is awaited, so
    /// callers failing at the same moment can never start two calls. The
    /// network call runs in its own task: the ticket settles and is removed
    /// even if every waiter is cancelled.
    pub fn ticket(&self, domain: SessionDomain) -> Result<Ticket, RefreshError> {
        let mut tickets = self.inner.tickets.lock();
        if let Some(slot) = tickets.get(&domain) {
            debug!(%domain, "joining in-flight refresh");
            return Ok(slot.ticket.clone());
        }

        let refresh_token = self.inner.store.refresh_token(domain).ok_or_else(|| {
            debug!(%domain, "no refresh token, renewal unavailable");
            RefreshError::Unavailable
        })?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run(domain, id, refresh_token).await });
        let ticket = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(RefreshError::Transport(format!("refresh task failed: {e}"))),
            }
        }
        .boxed()
        .shared();

        tickets.insert(domain, Slot { id, ticket: ticket.clone() });
        Ok(ticket)
    }

    /// Whether a renewal is currently in flight for `domain`.
    pub fn in_flight(&self, domain: SessionDomain) -> bool {
        self.inner.tickets.lock().contains_key(&domain)
    }

    /// Refresh network calls issued so far (all domains).
    pub fn refresh_calls(&self) -> u32 {
        self.inner.calls.load(Ordering::Relaxed)
    }
}

impl Inner {
    async fn run(
        &self,
        domain: SessionDomain,
        id: u64,
        refresh_token: String,
    ) -> Result<TokenPair, RefreshError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let result = do_refresh(&self.http, &self.refresh_url, &refresh_token).await;

        let result = match result {
            Ok(mut pair) => {
                self.store.set(domain, &pair);
                self.defaults.set(domain, pair.access_token.clone());
                if pair.refresh_token.is_none() {
                    pair.refresh_token = Some(refresh_token);
                }
                info!(%domain, "access token renewed");
                Ok(pair)
            }
            Err(e) => {
                warn!(%domain, err = %e, "token renewal failed");
                Err(e)
            }
        };

        // Settled: a later failure must be able to start a fresh renewal.
        let mut tickets = self.tickets.lock();
        if tickets.get(&domain).is_some_and(|slot| slot.id == id) {
            tickets.remove(&domain);
        }
        result
    }
}

/// Perform one refresh request.
pub async fn do_refresh(
    client: &reqwest::Client,
    refresh_url: &str,
    refresh_token: &str,
) -> Result<TokenPair, RefreshError> {
    let resp = client
        .post(refresh_url)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %text, "refresh endpoint rejected token");
        return Err(RefreshError::Rejected { status: status.as_u16() });
    }

    let pair: TokenPair = resp.json().await.map_err(|e| {
        warn!(status = status.as_u16(), "unreadable refresh response: {e}");
        RefreshError::Rejected { status: status.as_u16() }
    })?;
    if pair.access_token.is_empty() {
        return Err(RefreshError::Rejected { status: status.as_u16() });
    }
    Ok(pair)
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
