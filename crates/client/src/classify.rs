// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failed-response classification.
//!
//! Pure decisions: the client gathers the facts into an [`Outcome`], asks
//! what to do, and carries it out.

use crate::domain::SessionDomain;
use crate::error::RefreshError;

/// Retry flags carried by one logical request. Each is set at most once,
/// so a request is retried at most twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attempt {
    /// Retried after this context's own refresh.
    pub refreshed: bool,
    /// Retried with a token another context stored.
    pub adopted: bool,
}

impl Attempt {
    pub fn retries(&self) -> u8 {
        u8::from(self.refreshed) + u8::from(self.adopted)
    }
}

/// Facts about one failed attempt.
#[derive(Debug, Clone)]
pub struct Outcome<'a> {
    /// Response status; `None` when no response arrived.
    pub status: Option<u16>,
    pub path: &'a str,
    /// Configured refresh endpoint; failures there never trigger a renewal.
    pub refresh_path: &'a str,
    /// Domain of the failing request.
    pub domain: SessionDomain,
    /// Domain of the current UI location.
    pub ui_domain: SessionDomain,
    pub attempt: Attempt,
    /// Access token another context stored recently, if it differs from the
    /// one this attempt used.
    pub fresher_token: Option<String>,
}

/// Why an authentication failure ends without a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    CrossDomain,
}

/// What to do with a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Not an authentication failure: surface as-is.
    PassThrough,
    /// Authentication failure outside the active context: reject, touch nothing.
    Reject(RejectReason),
    /// Retry once with a token another context already obtained.
    Adopt(String),
    /// Renew through the refresh coordinator, then retry once.
    Refresh,
    /// Give up on the session.
    Terminate,
}

pub fn is_auth_failure(status: Option<u16>) -> bool {
    matches!(status, Some(401) | Some(403))
}

/// Decide how to handle a failed attempt.
pub fn classify(outcome: &Outcome<'_>) -> Decision {
    if !is_auth_failure(outcome.status) {
        return Decision::PassThrough;
    }
    if outcome.domain != outcome.ui_domain {
        return Decision::Reject(RejectReason::CrossDomain);
    }
    if outcome.domain.is_auth_endpoint(outcome.path, outcome.refresh_path) {
        return Decision::Terminate;
    }
    if let Some(token) = adoptable(outcome) {
        return Decision::Adopt(token);
    }
    if !outcome.attempt.refreshed {
        return Decision::Refresh;
    }
    Decision::Terminate
}

/// Decide what to do after the coordinator failed to renew.
///
/// `outcome.fresher_token` must be re-read after the failure: another
/// context may have refreshed in the meantime.
pub fn after_refresh_failure(outcome: &Outcome<'_>, error: &RefreshError) -> Decision {
    if let Some(token) = adoptable(outcome) {
        return Decision::Adopt(token);
    }
    match error {
        RefreshError::Transport(_) => Decision::PassThrough,
        RefreshError::Unavailable | RefreshError::Rejected { .. } => Decision::Terminate,
    }
}

fn adoptable(outcome: &Outcome<'_>) -> Option<String> {
    if outcome.attempt.adopted {
        return None;
    }
    outcome.fresher_token.clone()
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
