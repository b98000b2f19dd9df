// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::domain::SessionDomain;

/// Failure surfaced to callers of [`AuthClient`](crate::client::AuthClient).
///
/// Callers only ever see a successful response or one of these; whether a
/// silent refresh happened along the way is invisible.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// No response: connection failure, timeout, or an unreadable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response that is not an authentication failure.
    #[error("server returned {status}")]
    Status { status: u16, body: String },

    /// The session could not be recovered and was terminated.
    #[error("{domain} session expired: {reason}")]
    SessionExpired { domain: SessionDomain, reason: String, redirect: Option<String> },

    /// Authentication failure from a domain other than the active UI context.
    #[error("{domain} request rejected with {status} outside the {domain} context")]
    CrossDomain { domain: SessionDomain, status: u16 },

    /// Authentication failure on an auth page or auth endpoint; no redirect issued.
    #[error("{domain} authentication failed with {status}")]
    LoopGuard { domain: SessionDomain, status: u16 },

    /// The request could not be built (bad URL, header or body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response body did not match the expected shape.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Status { .. } => "STATUS",
            Self::SessionExpired { .. } => "SESSION_EXPIRED",
            Self::CrossDomain { .. } => "CROSS_DOMAIN",
            Self::LoopGuard { .. } => "LOOP_GUARD",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Decode(_) => "DECODE",
        }
    }

    /// HTTP status that caused the failure, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. }
            | Self::CrossDomain { status, .. }
            | Self::LoopGuard { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this failure is transient (network or server side).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Failure of a token renewal.
///
/// `Clone` because one outcome is shared by every waiter on a refresh ticket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// No refresh token is stored for the domain.
    #[error("no refresh token available")]
    Unavailable,

    /// The refresh endpoint rejected the refresh token (or returned garbage).
    #[error("refresh rejected ({status})")]
    Rejected { status: u16 },

    /// The refresh call never got a response.
    #[error("refresh transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
